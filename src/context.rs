use log::debug;

use crate::error::{Error, Result};
use crate::target::TargetInfo;

pub use rusb::{Context, UsbContext};

/// Vendor and product IDs of EZ-USB devices still running from their boot ROM: the FX2LP
/// development board and the AN21xx.
pub const KNOWN_DEVICES: &[(u16, u16)] = &[(0x04b4, 0x8613), (0x0547, 0x2131)];

/// Selects which attached devices are considered targets. Fields left as `None` match anything.
/// If neither IDs nor a bus location are given, only [`KNOWN_DEVICES`] match.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DeviceFilter {
    pub vendor_id: Option<u16>,
    pub product_id: Option<u16>,
    pub bus_number: Option<u8>,
    pub address: Option<u8>,
}

impl DeviceFilter {
    /// Matches a device by vendor and product ID.
    pub fn by_id(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id: Some(vendor_id),
            product_id: Some(product_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, target: &TargetInfo) -> bool {
        let ids = if self.vendor_id.is_none() && self.product_id.is_none() {
            self.bus_number.is_some()
                || self.address.is_some()
                || KNOWN_DEVICES.contains(&(target.vendor_id, target.product_id))
        } else {
            self.vendor_id.map_or(true, |id| id == target.vendor_id)
                && self.product_id.map_or(true, |id| id == target.product_id)
        };

        ids && self.bus_number.map_or(true, |bus| bus == target.bus_number)
            && self.address.map_or(true, |address| address == target.address)
    }
}

/// Target discovery on a USB context.
pub trait TargetFinder: UsbContext {
    /// Lists all attached devices matching the filter.
    fn find_targets(&self, filter: &DeviceFilter) -> Result<Vec<TargetInfo>> {
        let mut targets = Vec::new();

        for device in self.devices()?.iter() {
            // Devices whose descriptor cannot be read are not ours to flash
            let descriptor = match device.device_descriptor() {
                Ok(descriptor) => descriptor,
                Err(_) => continue,
            };
            let target = TargetInfo {
                bus_number: device.bus_number(),
                address: device.address(),
                vendor_id: descriptor.vendor_id(),
                product_id: descriptor.product_id(),
            };
            if filter.matches(&target) {
                debug!("Found target {}", target);
                targets.push(target);
            }
        }

        Ok(targets)
    }

    /// Returns the single device matching the filter.
    fn pick_target(&self, filter: &DeviceFilter) -> Result<TargetInfo> {
        let mut targets = self.find_targets(filter)?;
        match targets.len() {
            0 => Err(Error::TargetNotFound),
            1 => Ok(targets.remove(0)),
            // More than one target and nothing to tell them apart
            count => Err(Error::TooManyMatches(count)),
        }
    }
}

impl<T: UsbContext> TargetFinder for T {}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(vendor_id: u16, product_id: u16) -> TargetInfo {
        TargetInfo {
            bus_number: 1,
            address: 4,
            vendor_id,
            product_id,
        }
    }

    #[test]
    fn default_filter_matches_known_devices() {
        let filter = DeviceFilter::default();
        assert!(filter.matches(&target(0x04b4, 0x8613)));
        assert!(filter.matches(&target(0x0547, 0x2131)));
        assert!(!filter.matches(&target(0x1d6b, 0x0002)));
    }

    #[test]
    fn id_filter() {
        let filter = DeviceFilter::by_id(0x1d50, 0x608c);
        assert!(filter.matches(&target(0x1d50, 0x608c)));
        assert!(!filter.matches(&target(0x04b4, 0x8613)));

        let vendor_only = DeviceFilter {
            vendor_id: Some(0x04b4),
            ..DeviceFilter::default()
        };
        assert!(vendor_only.matches(&target(0x04b4, 0x1004)));
    }

    #[test]
    fn location_filter() {
        let filter = DeviceFilter {
            bus_number: Some(1),
            address: Some(4),
            ..DeviceFilter::default()
        };
        assert!(filter.matches(&target(0x1d6b, 0x0002)));

        let elsewhere = DeviceFilter {
            address: Some(5),
            ..filter.clone()
        };
        assert!(!elsewhere.matches(&target(0x04b4, 0x8613)));
    }
}
