use std::fmt;

use crate::context::UsbContext;
use crate::error::{Error, Result};
use crate::target_handle::TargetHandle;

/// Contains necessary information to connect to a target via USB.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TargetInfo {
    /// USB bus ID the target is connected to.
    pub bus_number: u8,

    /// USB device address of the target.
    pub address: u8,

    /// Vendor ID the target reported via its USB descriptor.
    pub vendor_id: u16,

    /// Product ID the target reported via its USB descriptor.
    pub product_id: u16,
}

impl TargetInfo {
    /// Connects to a target.
    pub fn open<T: UsbContext>(&self, context: &T) -> Result<TargetHandle<T>> {
        for device in context.devices()?.iter() {
            if device.bus_number() == self.bus_number && device.address() == self.address {
                // Addresses are reused after a reenumeration, so make sure this is still the
                // device that was found before.
                let descriptor = device.device_descriptor()?;
                if descriptor.vendor_id() != self.vendor_id
                    || descriptor.product_id() != self.product_id
                {
                    return Err(Error::TargetNotFound);
                }
                return Ok(TargetHandle::new(device.open()?));
            }
        }
        Err(Error::TargetNotFound)
    }
}

impl fmt::Display for TargetInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Bus {:03} Device {:03}: ID {:04x}:{:04x}",
            self.bus_number, self.address, self.vendor_id, self.product_id
        )
    }
}
