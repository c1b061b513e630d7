use crate::avc::AvcError;
use std::io;
use thiserror::Error;

/// An enumeration defining all the possible errors that could occur while serializing
/// FLV tags or writing them to an output sink.
#[derive(Debug, Error)]
pub enum FlvSerializationError {
    /// The tag's data does not fit in the 24 bit `DataSize` field
    #[error("The tag has a data size of {size} bytes, which is over the allowed size of 16777215 bytes")]
    TagTooLarge { size: usize },

    /// The composition time offset does not fit in the signed 24 bit field of a video tag
    #[error("Composition time offset of {0}ms does not fit in 24 bits")]
    CompositionTimeOutOfRange(i64),

    /// A script data string is longer than the 16 bit length field allows
    #[error("Script data string of {length} bytes is longer than 65535 bytes")]
    StringTooLong { length: usize },

    /// The H.264 configuration data or frame could not be framed for FLV
    #[error("Invalid H.264 data: {0}")]
    Avc(#[from] AvcError),

    /// The writer was asked to write before its sink was opened
    #[error("The output sink has not been opened")]
    SinkNotOpen,

    /// An I/O error occurred while writing to the output sink
    #[error("{0}")]
    Io(#[from] io::Error),
}
