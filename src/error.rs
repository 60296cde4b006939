use std::result::Result as StdResult;
use thiserror::Error as ThisError;

/// Errors which can occur while decoding a hex firmware image. Line numbers start at 1.
#[derive(Debug, ThisError)]
pub enum DecodeError {
    /// A non-blank line did not begin with the `:` start marker.
    #[error("line {line}: missing record start marker")]
    MalformedRecord { line: usize },

    /// The record body contained an odd number of hex digits or a non-hex character.
    #[error("line {line}: invalid hex encoding")]
    InvalidEncoding { line: usize },

    /// The number of bytes on the line does not match the declared payload length.
    #[error("line {line}: expected {expected} record bytes, found {actual}")]
    LengthMismatch {
        line: usize,
        expected: usize,
        actual: usize,
    },

    /// The bytes of the record did not sum to zero.
    #[error("line {line}: checksum mismatch (byte sum is 0x{sum:02x})")]
    ChecksumMismatch { line: usize, sum: u8 },

    /// An address record carried a payload of the wrong size.
    #[error("line {line}: address record must carry 2 data bytes, got {actual}")]
    BadAddressRecord { line: usize, actual: usize },

    /// The input ended without an end-of-file record.
    #[error("unexpected end of stream (no end-of-file record)")]
    UnexpectedEndOfStream,

    /// Reading from the underlying stream failed.
    #[error("failed to read firmware image")]
    Io(#[from] std::io::Error),
}

/// Errors reported by a [`Transport`](crate::Transport) while writing to the target.
#[derive(Debug, ThisError)]
pub enum TransportError {
    /// An error occurred during the raw USB communication (stall, timeout, disconnect, ...).
    #[error("USB transfer failed: {0}")]
    Usb(#[from] rusb::Error),

    /// The device accepted fewer bytes than were sent.
    #[error("short write at 0x{address:04x}: {written} of {expected} bytes")]
    ShortWrite {
        address: u16,
        expected: usize,
        written: usize,
    },
}

/// Errors which abort a firmware load.
#[derive(Debug, ThisError)]
pub enum LoadError {
    /// The firmware image could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A write to the target failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A data record does not fit into the 16 bit address space of the target.
    #[error("data record at 0x{address:x} ({length} bytes) exceeds the 16 bit address space")]
    AddressOutOfRange { address: u32, length: usize },
}

/// Errors which can occur during target setup and firmware loading.
#[derive(Debug, ThisError)]
pub enum Error {
    /// No device matched the given filter.
    #[error("target not found")]
    TargetNotFound,

    /// The filter was not specific enough and matched multiple devices where only a single one
    /// is supported.
    #[error("too many matches ({0} devices)")]
    TooManyMatches(usize),

    /// An error occurred during the raw USB communication.
    #[error("USB error: {0}")]
    IoError(#[from] rusb::Error),

    /// Loading the firmware failed.
    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Shorthand for a Result with the crate's own Error type.
pub type Result<T> = StdResult<T, Error>;
