use rusb::{DeviceHandle, UsbContext};
use std::time::Duration;

use crate::chip::{Chip, FIRMWARE_LOAD_REQUEST};
use crate::error::{DecodeError, Result, TransportError};
use crate::loader::{Loader, Transport};
use crate::record::Record;
use crate::TIMEOUT;

/// Largest payload sent in a single control transfer. The boot ROM accepts up to 4 KiB per
/// request.
pub const MAX_CONTROL_CHUNK: usize = 4096;

/// Splits a write into chunks no larger than [`MAX_CONTROL_CHUNK`], paired with their start
/// addresses. An empty write still yields one (empty) chunk.
fn chunks_at(address: u16, data: &[u8]) -> impl Iterator<Item = (u16, &[u8])> {
    let count = std::cmp::max(1, (data.len() + MAX_CONTROL_CHUNK - 1) / MAX_CONTROL_CHUNK);
    (0..count).map(move |i| {
        let start = i * MAX_CONTROL_CHUNK;
        let end = std::cmp::min(start + MAX_CONTROL_CHUNK, data.len());
        (address.wrapping_add(start as u16), &data[start..end])
    })
}

/// An opened EZ-USB device, accepting firmware load requests.
pub struct TargetHandle<T: UsbContext> {
    // USB device handle for the raw communication.
    usb_device_handle: DeviceHandle<T>,

    /// Upper bound for each control transfer.
    timeout: Duration,
}

impl<T: UsbContext> TargetHandle<T> {
    pub(crate) fn new(usb_device_handle: DeviceHandle<T>) -> Self {
        Self {
            usb_device_handle,
            timeout: TIMEOUT,
        }
    }

    /// Changes the time each control transfer may take before it fails with a timeout.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Gives access to the underlying USB device handle.
    pub fn usb_device_handle(&self) -> &DeviceHandle<T> {
        &self.usb_device_handle
    }

    /// Loads a firmware image and starts it. See [`Loader::load`].
    pub fn load<I>(&mut self, chip: Chip, records: I) -> Result<()>
    where
        I: IntoIterator<Item = std::result::Result<Record, DecodeError>>,
    {
        Loader::new(chip).load(self, records)?;
        Ok(())
    }

    /// Sends a single firmware load request.
    fn write_chunk(&mut self, address: u16, data: &[u8]) -> std::result::Result<(), TransportError> {
        let written = self.usb_device_handle.write_control(
            rusb::request_type(
                rusb::Direction::Out,
                rusb::RequestType::Vendor,
                rusb::Recipient::Device,
            ),
            FIRMWARE_LOAD_REQUEST,
            address,
            0,
            data,
            self.timeout,
        )?;

        if written == data.len() {
            Ok(())
        } else {
            Err(TransportError::ShortWrite {
                address,
                expected: data.len(),
                written,
            })
        }
    }
}

impl<T: UsbContext> Transport for TargetHandle<T> {
    fn write(&mut self, address: u16, data: &[u8]) -> std::result::Result<(), TransportError> {
        for (address, chunk) in chunks_at(address, data) {
            self.write_chunk(address, chunk)?;
        }
        Ok(())
    }
}
