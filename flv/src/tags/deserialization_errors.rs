use std::io;
use thiserror::Error;

/// An enumeration defining all the possible errors that could occur while reading FLV data
#[derive(Debug, Error)]
pub enum FlvDeserializationError {
    /// The data did not begin with the `FLV` signature
    #[error("Data does not start with an FLV signature")]
    InvalidSignature,

    #[error("Unsupported FLV version {0}")]
    UnsupportedVersion(u8),

    /// The header's data offset points inside the header itself
    #[error("FLV header declared a data offset of {0}, which is smaller than the header")]
    InvalidDataOffset(u32),

    /// A `PreviousTagSize` field did not match the size of the tag before it
    #[error("PreviousTagSize was {actual} but the previous tag was {expected} bytes")]
    InvalidPreviousTagSize { expected: u32, actual: u32 },

    /// The tag type is not audio, video or script data (or the tag is encrypted)
    #[error("Unknown FLV tag type {0}")]
    UnknownTagType(u8),

    /// A script data value used a marker that is not supported
    #[error("Unknown script data marker {0}")]
    UnknownScriptDataMarker(u8),

    /// Script data objects were nested deeper than the reader accepts
    #[error("Script data is nested deeper than {0} levels")]
    ScriptDataTooDeep(usize),

    /// The tag's body ended before all the data its headers describe
    #[error("Hit end of the tag data but was expecting more data")]
    UnexpectedEof,

    #[error("{0}")]
    FromUtf8Error(#[from] std::string::FromUtf8Error),

    /// An I/O error occurred while reading the input buffer
    #[error("{0}")]
    Io(#[from] io::Error),
}
