//! This crate downloads firmware into the RAM of Cypress EZ-USB microcontrollers (AN21xx, FX,
//! FX2 and FX2LP) via the firmware load vendor request (0xA0) of their boot ROM.
//!
//! Loading halts the 8051 core through its CPUCS register, writes every data record of an Intel
//! HEX image in file order, and finally releases the core again. If anything goes wrong along
//! the way, the core is left halted rather than running a partially written image.
//!
//! # Example: Loading a firmware image
//! ```rust, no_run
//! use fxload::{Chip, Context, DeviceFilter, TargetFinder, records};
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Open the hex image
//! let image = BufReader::new(File::open("firmware.ihx")?);
//!
//! // Find an FX2LP development board
//! let context = Context::new()?;
//! let mut target_handle = context
//!     .pick_target(&DeviceFilter::by_id(0x04b4, 0x8613))?
//!     .open(&context)?;
//!
//! // Halt the CPU, write the image and start it
//! target_handle.load(Chip::Fx2, records(image))?;
//!
//! println!("Done!");
//! # Ok(())
//! # }
//! ```
//!
//! The load sequence itself only needs something implementing [`Transport`], so it can be driven
//! over other connections as well. For progress feedback, [`Loader::start`] returns the load as
//! an [`Operation`] yielding each completed write.

mod chip;
mod context;
mod decoder;
mod error;
mod loader;
mod operation;
mod record;
mod target;
mod target_handle;

pub use chip::{Chip, UnknownChip, CPU_HALT, CPU_RUN, FIRMWARE_LOAD_REQUEST};
pub use context::{Context, DeviceFilter, TargetFinder, UsbContext, KNOWN_DEVICES};
pub use decoder::{records, DecoderConfig, Records};
pub use error::{DecodeError, Error, LoadError, Result, TransportError};
pub use loader::{load, Loader, Transport};
pub use operation::{Load, Operation, Step};
pub use record::{checksum, Record, RecordKind};
pub use target::TargetInfo;
pub use target_handle::{TargetHandle, MAX_CONTROL_CHUNK};

/// Default timeout for each USB control transfer.
const TIMEOUT: std::time::Duration = std::time::Duration::from_secs(1);
