//! Turns a hex image stream into a lazy sequence of records.

use crate::error::DecodeError;
use crate::record::{Record, RecordKind};
use log::{trace, warn};
use std::io::BufRead;

/// Options for decoding a hex image.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DecoderConfig {
    /// Whether reaching the end of the input without an end-of-file record is an error. Images
    /// in the wild do not always carry one.
    pub strict_eof: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self { strict_eof: true }
    }
}

/// Iterator over the records of a hex image, reading one line per record.
///
/// The iterator ends after the end-of-file record and is fused after the first error. Address
/// records are yielded as well; they update the segment base applied to all following records.
pub struct Records<R> {
    reader: R,
    config: DecoderConfig,
    line: Vec<u8>,
    line_number: usize,
    base: u32,
    done: bool,
}

impl<R: BufRead> Records<R> {
    /// Decodes `reader` with the default (strict) configuration.
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, DecoderConfig::default())
    }

    pub fn with_config(reader: R, config: DecoderConfig) -> Self {
        Self {
            reader,
            config,
            line: Vec::new(),
            line_number: 0,
            base: 0,
            done: false,
        }
    }

    /// Reads lines until one holds a record. Returns `Ok(None)` once the input is exhausted.
    fn next_record(&mut self) -> Result<Option<Record>, DecodeError> {
        loop {
            self.line.clear();
            if self.reader.read_until(b'\n', &mut self.line)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            if let Some(record) = Record::parse(&self.line, self.line_number)? {
                return Ok(Some(record.with_base(self.base)));
            }
        }
    }
}

impl<R: BufRead> Iterator for Records<R> {
    type Item = Result<Record, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.next_record() {
            Ok(Some(record)) => {
                match record.kind {
                    RecordKind::EndOfFile => self.done = true,
                    RecordKind::ExtendedSegmentAddress | RecordKind::ExtendedLinearAddress => {
                        if let Some(base) = record.segment_base() {
                            trace!("line {}: segment base 0x{:x}", self.line_number, base);
                            self.base = base;
                        }
                    }
                    _ => (),
                }
                Some(Ok(record))
            }
            Ok(None) => {
                self.done = true;
                if self.config.strict_eof {
                    Some(Err(DecodeError::UnexpectedEndOfStream))
                } else {
                    warn!(
                        "image ended after {} lines without an end-of-file record",
                        self.line_number
                    );
                    None
                }
            }
            Err(error) => {
                // Ensure that the iterator is fused after an error occurs
                self.done = true;
                Some(Err(error))
            }
        }
    }
}

/// Decodes the records of a hex image with the default (strict) configuration.
pub fn records<R: BufRead>(reader: R) -> Records<R> {
    Records::new(reader)
}
