use crate::chip::Chip;
use crate::error::{DecodeError, LoadError, TransportError};
use crate::operation::{Load, Operation};
use crate::record::Record;

/// A connection able to write the target's memory with the firmware load request.
///
/// Each call blocks until the target acknowledged the write or the transfer failed. Timeouts
/// are the transport's business and surface as errors.
pub trait Transport {
    /// Writes `data` to the target's memory starting at `address`.
    fn write(&mut self, address: u16, data: &[u8]) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write(&mut self, address: u16, data: &[u8]) -> Result<(), TransportError> {
        (**self).write(address, data)
    }
}

/// Drives firmware loads for one chip family.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Loader {
    chip: Chip,
}

impl Loader {
    pub fn new(chip: Chip) -> Self {
        Self { chip }
    }

    pub fn chip(&self) -> Chip {
        self.chip
    }

    /// Prepares a load which can be stepped through for progress feedback. Nothing is written
    /// before the first call to `next`.
    pub fn start<'t, T, I>(&self, transport: &'t mut T, records: I) -> Load<'t, T, I::IntoIter>
    where
        T: Transport + ?Sized,
        I: IntoIterator<Item = Result<Record, DecodeError>>,
    {
        Load::new(transport, records.into_iter(), self.chip.cpucs())
    }

    /// Halts the processor, writes every data record in order and resumes the processor. On
    /// error, the processor is left halted.
    pub fn load<T, I>(&self, transport: &mut T, records: I) -> Result<(), LoadError>
    where
        T: Transport + ?Sized,
        I: IntoIterator<Item = Result<Record, DecodeError>>,
    {
        self.start(transport, records).execute()
    }
}

/// Loads a firmware image into an FX2 or FX2LP. See [`Loader::load`].
pub fn load<T, I>(transport: &mut T, records: I) -> Result<(), LoadError>
where
    T: Transport + ?Sized,
    I: IntoIterator<Item = Result<Record, DecodeError>>,
{
    Loader::default().load(transport, records)
}
