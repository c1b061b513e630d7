use super::registry::StreamKind;
use super::state::SessionState;
use crate::aac::AdtsError;
use crate::tags::FlvSerializationError;
use std::io;
use thiserror::Error;

/// The broad kinds of failure a muxer session reports
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ErrorCategory {
    /// Bad stream parameters or configuration data
    Configuration,

    /// The operation was called out of lifecycle order
    NotReady,

    /// The output could not be opened, written or closed
    Sink,

    /// A single packet's payload or timing was invalid and the packet was dropped
    MalformedBitstream,

    /// A packet's declared size disagreed with its framing and the packet was dropped
    SizeMismatch,

    /// The container header could not be encoded
    HeaderWrite,

    /// The container trailer could not be written
    TrailerWrite,

    /// The session was already finalized
    Closed,
}

/// Errors a muxer session can return
#[derive(Debug, Error)]
pub enum MuxerSessionError {
    /// A stream or session parameter is out of range
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Only the FLV container can be muxed
    #[error("The output format '{0}' is not supported")]
    UnsupportedFormat(String),

    #[error("A {0} stream has already been registered")]
    DuplicateStream(StreamKind),

    #[error("No {0} stream has been registered")]
    StreamNotRegistered(StreamKind),

    /// Configuration data can only be supplied once per stream
    #[error("Configuration data for the {0} stream has already been set")]
    ConfigurationDataAlreadySet(StreamKind),

    /// The header was requested without the configuration data it must carry
    #[error("No configuration data was supplied for the {0} stream")]
    MissingConfigurationData(StreamKind),

    /// Configuration is frozen once the header has been written
    #[error("Stream configuration can no longer change, the session is in the {current_state:?} state")]
    AlreadyFinalized { current_state: SessionState },

    /// The operation is not valid in the session's current state
    #[error("The operation cannot be performed while the session is in the {current_state:?} state")]
    NotReady { current_state: SessionState },

    #[error("The container header has already been written")]
    AlreadyWritten,

    #[error("The session has been finalized")]
    SessionClosed,

    #[error("The output sink could not be opened or written: {0}")]
    SinkUnavailable(#[source] io::Error),

    #[error("The container header could not be written: {0}")]
    HeaderWriteFailed(#[source] FlvSerializationError),

    /// An audio packet did not carry a valid ADTS frame
    #[error("Malformed {kind} packet #{sequence}: {source}")]
    MalformedBitstream {
        kind: StreamKind,
        sequence: u64,
        #[source]
        source: AdtsError,
    },

    /// A packet's declared size disagreed with the buffer or with its ADTS frame length
    #[error("{kind} packet #{sequence} declared {declared} bytes but {actual} were present")]
    SizeMismatch {
        kind: StreamKind,
        sequence: u64,
        declared: usize,
        actual: usize,
    },

    #[error("{kind} packet #{sequence} has no payload")]
    EmptyPacket { kind: StreamKind, sequence: u64 },

    /// The packet's timestamps would break decode order
    #[error("{kind} packet #{sequence} has invalid timestamps (pts {pts}, dts {dts}): {reason}")]
    InvalidTimestamp {
        kind: StreamKind,
        sequence: u64,
        pts: i64,
        dts: i64,
        reason: &'static str,
    },

    /// The packet could not be written to the container.  The session keeps streaming.
    #[error("Writing {kind} packet #{sequence} ({size} bytes) failed: {source}")]
    PacketWriteFailed {
        kind: StreamKind,
        sequence: u64,
        size: usize,
        #[source]
        source: FlvSerializationError,
    },

    #[error("The container trailer could not be written: {0}")]
    TrailerWriteFailed(#[source] FlvSerializationError),

    #[error("The output sink could not be closed: {0}")]
    SinkCloseFailed(#[source] io::Error),
}

impl MuxerSessionError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MuxerSessionError::InvalidConfig { .. }
            | MuxerSessionError::UnsupportedFormat(_)
            | MuxerSessionError::DuplicateStream(_)
            | MuxerSessionError::ConfigurationDataAlreadySet(_)
            | MuxerSessionError::MissingConfigurationData(_) => ErrorCategory::Configuration,

            MuxerSessionError::StreamNotRegistered(_)
            | MuxerSessionError::NotReady { .. }
            | MuxerSessionError::AlreadyWritten => ErrorCategory::NotReady,

            MuxerSessionError::AlreadyFinalized { .. } | MuxerSessionError::SessionClosed => ErrorCategory::Closed,

            MuxerSessionError::SinkUnavailable(_)
            | MuxerSessionError::PacketWriteFailed { .. }
            | MuxerSessionError::SinkCloseFailed(_) => ErrorCategory::Sink,

            MuxerSessionError::HeaderWriteFailed(_) => ErrorCategory::HeaderWrite,
            MuxerSessionError::TrailerWriteFailed(_) => ErrorCategory::TrailerWrite,

            MuxerSessionError::MalformedBitstream { .. }
            | MuxerSessionError::EmptyPacket { .. }
            | MuxerSessionError::InvalidTimestamp { .. } => ErrorCategory::MalformedBitstream,

            MuxerSessionError::SizeMismatch { .. } => ErrorCategory::SizeMismatch,
        }
    }

    /// True for errors confined to a single packet.  The packet was dropped and the session
    /// keeps accepting packets.
    pub fn is_recoverable(&self) -> bool {
        match self {
            MuxerSessionError::MalformedBitstream { .. }
            | MuxerSessionError::SizeMismatch { .. }
            | MuxerSessionError::EmptyPacket { .. }
            | MuxerSessionError::InvalidTimestamp { .. }
            | MuxerSessionError::PacketWriteFailed { .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_packet_errors_are_recoverable() {
        let malformed = MuxerSessionError::MalformedBitstream {
            kind: StreamKind::Audio,
            sequence: 3,
            source: AdtsError::MissingSyncWord,
        };

        let write_failure = MuxerSessionError::PacketWriteFailed {
            kind: StreamKind::Video,
            sequence: 7,
            size: 100,
            source: FlvSerializationError::Io(io::Error::new(io::ErrorKind::BrokenPipe, "closed")),
        };

        assert!(malformed.is_recoverable());
        assert_eq!(malformed.category(), ErrorCategory::MalformedBitstream);
        assert!(write_failure.is_recoverable());
        assert_eq!(write_failure.category(), ErrorCategory::Sink);
    }

    #[test]
    fn session_level_errors_are_fatal() {
        let header = MuxerSessionError::HeaderWriteFailed(FlvSerializationError::SinkNotOpen);

        assert!(!header.is_recoverable());
        assert!(!MuxerSessionError::SessionClosed.is_recoverable());
        assert_eq!(
            MuxerSessionError::MissingConfigurationData(StreamKind::Video).category(),
            ErrorCategory::Configuration
        );
    }

    #[test]
    fn packet_errors_name_stream_and_sequence() {
        let error = MuxerSessionError::SizeMismatch {
            kind: StreamKind::Audio,
            sequence: 12,
            declared: 30,
            actual: 20,
        };

        assert_eq!(error.to_string(), "audio packet #12 declared 30 bytes but 20 were present");
    }
}
