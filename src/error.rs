use std::{fmt, str::Utf8Error};

/// A decoding error from this library.
///
/// Decoding a malformed packet fails with one of these; each aborts the
/// current decode and surfaces to the caller. Unknown OPCODE, RCODE, class
/// and RR type values are deliberately *not* errors: they are kept as
/// integers and round-tripped, so protocol extensions do not break callers.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The buffer is shorter than the 12-byte message header.
    InvalidMessageSize(usize),

    /// A label would run past the end of the buffer, or its length byte
    /// carries the reserved 0x40/0x80 tag bits.
    InvalidLabelSize(u8),

    /// A name pointer target is out of range or does not aim strictly
    /// backward.
    InvalidLabelOffset(usize),

    /// Label bytes are not valid UTF-8.
    UnicodeDecodingError(Utf8Error),

    /// A fixed-width integer read would run past the end of the buffer.
    InvalidIntegerSize(usize),

    /// An A/AAAA record whose RDATA is not 4/16 bytes.
    InvalidIPAddress(usize),

    /// Record data did not end exactly at the declared RDLENGTH boundary.
    InvalidDataSize(usize),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidMessageSize(len) => {
                write!(f, "message too short for a DNS header: {} bytes", len)
            }
            Error::InvalidLabelSize(byte) => write!(f, "bad label length byte 0x{:02x}", byte),
            Error::InvalidLabelOffset(offset) => {
                write!(f, "bad name pointer to offset {}", offset)
            }
            Error::UnicodeDecodingError(e) => write!(f, "label is not valid UTF-8: {}", e),
            Error::InvalidIntegerSize(offset) => {
                write!(f, "integer read past the end of the buffer at offset {}", offset)
            }
            Error::InvalidIPAddress(len) => {
                write!(f, "address record with {} bytes of RDATA", len)
            }
            Error::InvalidDataSize(offset) => write!(
                f,
                "record data ended at offset {}, not on the declared boundary",
                offset
            ),
        }
    }
}

impl std::error::Error for Error {}

/// One and only `Result` type from this library crate.
pub type Result<T> = core::result::Result<T, Error>;
