use std::io;

use super::define::Amf0Marker;

/// Errors that can occur when decoding AMF0 data.
#[derive(Debug, thiserror::Error)]
pub enum Amf0ReadError {
    /// The input ended inside a length-prefixed field.
    #[error("unexpected end of data: needed {needed} bytes")]
    UnexpectedEof {
        /// Size of the field that did not fit.
        needed: usize,
    },
    /// An IO error occurred.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// A value of the wrong type was found where a specific type is required.
    #[error("wrong type: expected {expected:?}, got {got:?}")]
    WrongType {
        /// The marker that was required.
        expected: Amf0Marker,
        /// The marker that was found.
        got: Amf0Marker,
    },
}

/// Errors that can occur when encoding AMF0 data.
#[derive(Debug, thiserror::Error)]
pub enum Amf0WriteError {
    /// A string or property name does not fit a 16-bit length.
    #[error("string of {0} bytes needs a long string")]
    StringTooLong(usize),
    /// An IO error occurred.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// The value has no standalone encoding.
    #[error("cannot encode a bare {0:?}")]
    UnsupportedType(Amf0Marker),
}
