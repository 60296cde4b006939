use log::{debug, info, trace};
use std::iter::Fuse;

use super::chip::{CPU_HALT, CPU_RUN};
use super::error::{DecodeError, LoadError};
use super::loader::Transport;
use super::record::{Record, RecordKind};

/// Size of the target's address space.
const ADDRESS_SPACE: u64 = 0x1_0000;

/// A multi-step operation on a target, reporting each completed step. The iterator is fused
/// after the first error.
pub trait Operation: Iterator<Item = Result<Step, LoadError>> {
    /// Runs the operation to completion.
    fn execute(&mut self) -> Result<(), LoadError> {
        if let Some(Err(error)) = self.last() {
            Err(error)
        } else {
            Ok(())
        }
    }
}

/// A single completed transport write.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Step {
    /// The processor has been halted.
    Halt,

    /// A data record has been written.
    Write { address: u16, length: usize },

    /// The processor has been released and runs the new firmware.
    Resume,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum State {
    Start,
    Writing,
    Done,
}

/// Loads a firmware image into a halted processor and resumes it. Created by
/// [`Loader::start`](crate::Loader::start).
///
/// The first record is pulled before the processor is halted, so an image which fails to decode
/// right away leaves the target untouched. Any later failure stops the operation with the
/// processor still halted.
pub struct Load<'t, T: ?Sized, I> {
    transport: &'t mut T,
    records: Fuse<I>,
    cpucs: u16,
    pending: Option<Record>,
    state: State,
}

impl<'t, T, I> Load<'t, T, I>
where
    T: Transport + ?Sized,
    I: Iterator<Item = Result<Record, DecodeError>>,
{
    pub(crate) fn new(transport: &'t mut T, records: I, cpucs: u16) -> Self {
        Self {
            transport,
            records: records.fuse(),
            cpucs,
            pending: None,
            state: State::Start,
        }
    }

    fn halt(&mut self) -> Result<Step, LoadError> {
        if let Some(Err(error)) = self.next_record() {
            return Err(error.into());
        }

        info!("Halting CPU (CPUCS at 0x{:04x})", self.cpucs);
        self.transport.write(self.cpucs, &[CPU_HALT])?;
        Ok(Step::Halt)
    }

    /// Pulls the next record, putting a successfully decoded one aside as pending.
    fn next_record(&mut self) -> Option<Result<(), DecodeError>> {
        match self.records.next()? {
            Ok(record) => {
                self.pending = Some(record);
                Some(Ok(()))
            }
            Err(error) => Some(Err(error)),
        }
    }

    fn write_next(&mut self) -> Result<Step, LoadError> {
        loop {
            if self.pending.is_none() {
                if let Some(Err(error)) = self.next_record() {
                    return Err(error.into());
                }
            }

            let record = match self.pending.take() {
                Some(record) if record.kind != RecordKind::EndOfFile => record,
                _ => return self.resume(),
            };

            if record.kind != RecordKind::Data {
                trace!("Skipping {:?} record", record.kind);
                continue;
            }

            let address = record.absolute_address();
            let length = record.payload.len();
            if u64::from(address) + length as u64 > ADDRESS_SPACE {
                return Err(LoadError::AddressOutOfRange { address, length });
            }

            debug!("Writing {} bytes at 0x{:04x}", length, address);
            self.transport.write(address as u16, &record.payload)?;
            return Ok(Step::Write {
                address: address as u16,
                length,
            });
        }
    }

    fn resume(&mut self) -> Result<Step, LoadError> {
        self.state = State::Done;
        info!("Releasing CPU");
        self.transport.write(self.cpucs, &[CPU_RUN])?;
        Ok(Step::Resume)
    }
}

impl<T, I> Operation for Load<'_, T, I>
where
    T: Transport + ?Sized,
    I: Iterator<Item = Result<Record, DecodeError>>,
{
}

impl<T, I> Iterator for Load<'_, T, I>
where
    T: Transport + ?Sized,
    I: Iterator<Item = Result<Record, DecodeError>>,
{
    type Item = Result<Step, LoadError>;

    fn next(&mut self) -> Option<Self::Item> {
        let step = match self.state {
            State::Done => return None,
            State::Start => {
                self.state = State::Writing;
                self.halt()
            }
            State::Writing => self.write_next(),
        };

        if step.is_err() {
            // Ensure that the iterator is fused after an error occurs
            self.state = State::Done;
        }
        Some(step)
    }
}
