use super::errors::{ErrorCategory, MuxerSessionError};
use super::registry::StreamKind;

/// Numeric outcome of a session operation, for hosts that can only pass integers across
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum MuxResultCode {
    Success,
    ConfigurationError,
    SinkError,
    MalformedBitstream,
    NotReady,
    AlreadyFinalized,
}

impl MuxResultCode {
    pub fn from_result<T>(result: &Result<T, MuxerSessionError>) -> MuxResultCode {
        match result {
            Ok(_) => MuxResultCode::Success,
            Err(error) => MuxResultCode::from_error(error),
        }
    }

    pub fn from_error(error: &MuxerSessionError) -> MuxResultCode {
        match error.category() {
            ErrorCategory::Configuration => MuxResultCode::ConfigurationError,
            ErrorCategory::NotReady => MuxResultCode::NotReady,
            ErrorCategory::Sink | ErrorCategory::HeaderWrite | ErrorCategory::TrailerWrite => {
                MuxResultCode::SinkError
            }

            ErrorCategory::MalformedBitstream | ErrorCategory::SizeMismatch => MuxResultCode::MalformedBitstream,
            ErrorCategory::Closed => MuxResultCode::AlreadyFinalized,
        }
    }

    pub fn code(&self) -> i32 {
        match *self {
            MuxResultCode::Success => 0,
            MuxResultCode::ConfigurationError => -1,
            MuxResultCode::SinkError => -2,
            MuxResultCode::MalformedBitstream => -3,
            MuxResultCode::NotReady => -4,
            MuxResultCode::AlreadyFinalized => -5,
        }
    }
}

/// Summary of a packet that made it into the container
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct WrittenPacket {
    pub kind: StreamKind,
    pub stream_index: usize,

    /// Position of the packet among all packets submitted for its stream, starting at 0
    pub sequence: u64,

    /// The tag timestamp, in milliseconds
    pub timestamp_ms: i64,
    pub composition_time_ms: i64,

    /// Bytes handed to the sink, including a sequence header written along with the packet
    pub bytes_written: usize,
}
