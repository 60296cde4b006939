//! Single-line codec for the Intel HEX records firmware images are shipped in.

use crate::error::DecodeError;
use std::fmt;

/// Marker every record line starts with.
pub const START_CODE: u8 = b':';

/// Bytes on a record line besides the payload: length, address (2), type and checksum.
const OVERHEAD: usize = 5;

/// The type of a record, as given by its type byte.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RecordKind {
    /// Payload bytes to be placed at the record's address.
    Data,

    /// Marks the end of the image. Nothing after it is read.
    EndOfFile,

    /// Sets the segment base to the payload value times 16.
    ExtendedSegmentAddress,

    /// 80x86 start address (CS:IP). Carries no data to be loaded.
    StartSegmentAddress,

    /// Sets the segment base to the payload value times 65536.
    ExtendedLinearAddress,

    /// 32 bit start address. Carries no data to be loaded.
    StartLinearAddress,

    /// Any type byte without a defined meaning, passed on for forward compatibility.
    Other(u8),
}

impl From<u8> for RecordKind {
    fn from(code: u8) -> Self {
        match code {
            0x00 => RecordKind::Data,
            0x01 => RecordKind::EndOfFile,
            0x02 => RecordKind::ExtendedSegmentAddress,
            0x03 => RecordKind::StartSegmentAddress,
            0x04 => RecordKind::ExtendedLinearAddress,
            0x05 => RecordKind::StartLinearAddress,
            other => RecordKind::Other(other),
        }
    }
}

impl From<RecordKind> for u8 {
    fn from(kind: RecordKind) -> Self {
        match kind {
            RecordKind::Data => 0x00,
            RecordKind::EndOfFile => 0x01,
            RecordKind::ExtendedSegmentAddress => 0x02,
            RecordKind::StartSegmentAddress => 0x03,
            RecordKind::ExtendedLinearAddress => 0x04,
            RecordKind::StartLinearAddress => 0x05,
            RecordKind::Other(code) => code,
        }
    }
}

/// One decoded line of a hex image.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
    /// What the record describes.
    pub kind: RecordKind,

    /// The 16 bit address field exactly as given on the line.
    pub address: u16,

    /// The record's data bytes. For data records, these are the bytes to be loaded.
    pub payload: Vec<u8>,

    // Segment base in effect when the record was decoded.
    base: u32,
}

impl Record {
    /// Creates a record with a segment base of zero.
    pub fn new(kind: RecordKind, address: u16, payload: Vec<u8>) -> Self {
        Self {
            kind,
            address,
            payload,
            base: 0,
        }
    }

    /// Decodes a single line. Returns `Ok(None)` for a line which is blank after stripping
    /// whitespace. `line_number` is only used to annotate errors.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use fxload::{Record, RecordKind};
    ///
    /// let record = Record::parse(":03000000020000FB", 1).unwrap().unwrap();
    /// assert_eq!(record.kind, RecordKind::Data);
    /// assert_eq!(record.address, 0);
    /// assert_eq!(record.payload, vec![0x02, 0x00, 0x00]);
    /// ```
    pub fn parse<L: AsRef<[u8]>>(
        line: L,
        line_number: usize,
    ) -> Result<Option<Self>, DecodeError> {
        let line = line.as_ref().trim_ascii();
        if line.is_empty() {
            return Ok(None);
        }

        let body = match line.split_first() {
            Some((&START_CODE, body)) => body,
            _ => return Err(DecodeError::MalformedRecord { line: line_number }),
        };

        let raw =
            hex::decode(body).map_err(|_| DecodeError::InvalidEncoding { line: line_number })?;

        let declared = raw.first().copied().unwrap_or(0) as usize;
        if raw.len() != OVERHEAD + declared {
            return Err(DecodeError::LengthMismatch {
                line: line_number,
                expected: OVERHEAD + declared,
                actual: raw.len(),
            });
        }

        let sum = raw.iter().fold(0u8, |acc, byte| acc.wrapping_add(*byte));
        if sum != 0 {
            return Err(DecodeError::ChecksumMismatch {
                line: line_number,
                sum,
            });
        }

        let kind = RecordKind::from(raw[3]);
        let payload = raw[4..raw.len() - 1].to_vec();

        if matches!(
            kind,
            RecordKind::ExtendedSegmentAddress | RecordKind::ExtendedLinearAddress
        ) && payload.len() != 2
        {
            return Err(DecodeError::BadAddressRecord {
                line: line_number,
                actual: payload.len(),
            });
        }

        Ok(Some(Self::new(
            kind,
            u16::from_be_bytes([raw[1], raw[2]]),
            payload,
        )))
    }

    /// Encodes the record into its canonical line form (upper case, without line ending).
    pub fn encode(&self) -> String {
        let mut raw = Vec::with_capacity(OVERHEAD + self.payload.len());
        raw.push(self.payload.len() as u8);
        raw.extend_from_slice(&self.address.to_be_bytes());
        raw.push(self.kind.into());
        raw.extend_from_slice(&self.payload);
        raw.push(checksum(&raw));

        format!(":{}", hex::encode_upper(raw))
    }

    /// The effective memory address of the record's first payload byte: the segment base active
    /// when the record was decoded plus the address field.
    pub fn absolute_address(&self) -> u32 {
        self.base + u32::from(self.address)
    }

    /// Segment base in effect when the record was decoded.
    pub fn base(&self) -> u32 {
        self.base
    }

    pub(crate) fn with_base(mut self, base: u32) -> Self {
        self.base = base;
        self
    }

    /// For address records, the new segment base they establish.
    pub(crate) fn segment_base(&self) -> Option<u32> {
        let value = match self.payload.as_slice() {
            [high, low] => u32::from(u16::from_be_bytes([*high, *low])),
            _ => return None,
        };
        match self.kind {
            RecordKind::ExtendedSegmentAddress => Some(value << 4),
            RecordKind::ExtendedLinearAddress => Some(value << 16),
            _ => None,
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Calculates the two's complement checksum over a record's bytes, which makes the sum of all
/// bytes including the checksum zero.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes
        .iter()
        .fold(0u8, |acc, byte| acc.wrapping_add(*byte))
        .wrapping_neg()
}
