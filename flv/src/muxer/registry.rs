use super::config::{AudioStreamConfig, VideoStreamConfig};
use super::errors::MuxerSessionError;
use crate::aac::AudioSpecificConfig;
use crate::time::Rational;
use bytes::Bytes;
use std::fmt;

/// The two kinds of streams a session muxes
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum StreamKind {
    Video,
    Audio,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            StreamKind::Video => write!(f, "video"),
            StreamKind::Audio => write!(f, "audio"),
        }
    }
}

/// Identifies a registered stream within the session that registered it
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct StreamHandle {
    index: usize,
    kind: StreamKind,
}

impl StreamHandle {
    /// The container stream index assigned at registration
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn kind(&self) -> StreamKind {
        self.kind
    }
}

/// The codec parameters a stream was registered with
#[derive(PartialEq, Debug, Clone)]
pub enum StreamParameters {
    Video(VideoStreamConfig),
    Audio(AudioStreamConfig),
}

/// Runtime record of a registered stream
#[derive(Debug, Clone)]
pub struct StreamState {
    pub(super) handle: StreamHandle,
    pub(super) parameters: StreamParameters,
    pub(super) codec_time_base: Rational,
    pub(super) time_base: Rational,
    pub(super) configuration_data: Option<Bytes>,
    pub(super) packets_submitted: u64,
    pub(super) packets_written: u64,
    pub(super) last_decode_timestamp: Option<i64>,
}

impl StreamState {
    pub fn handle(&self) -> StreamHandle {
        self.handle
    }

    pub fn index(&self) -> usize {
        self.handle.index
    }

    pub fn kind(&self) -> StreamKind {
        self.handle.kind
    }

    pub fn parameters(&self) -> &StreamParameters {
        &self.parameters
    }

    /// The unit the codec works in, `1/frame_rate` for video
    pub fn codec_time_base(&self) -> Rational {
        self.codec_time_base
    }

    /// The unit timestamps are rescaled into before they reach the container
    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    pub fn configuration_data(&self) -> Option<&Bytes> {
        self.configuration_data.as_ref()
    }

    /// Number of packets that made it into the container
    pub fn packets_written(&self) -> u64 {
        self.packets_written
    }

    /// Number of packets handed to the session for this stream, including rejected ones
    pub fn packets_submitted(&self) -> u64 {
        self.packets_submitted
    }

    /// The last decode timestamp written, in `time_base()` units
    pub fn last_decode_timestamp(&self) -> Option<i64> {
        self.last_decode_timestamp
    }
}

/// Holds the video and audio stream of a session and hands out their container indices in
/// registration order
#[derive(Debug, Default)]
pub struct StreamRegistry {
    streams: Vec<StreamState>,
}

impl StreamRegistry {
    pub fn new() -> StreamRegistry {
        StreamRegistry::default()
    }

    pub fn register_video(&mut self, config: VideoStreamConfig) -> Result<StreamHandle, MuxerSessionError> {
        if config.width == 0 || config.height == 0 {
            return Err(MuxerSessionError::InvalidConfig {
                reason: format!("video dimensions must be positive, got {}x{}", config.width, config.height),
            });
        }

        let time_base = Rational::new(1, config.frame_rate).ok_or_else(|| MuxerSessionError::InvalidConfig {
            reason: "video frame rate must be positive".to_string(),
        })?;

        self.register(StreamKind::Video, StreamParameters::Video(config), time_base)
    }

    /// Audio timestamps are kept in milliseconds rather than `1/sample_rate`, as that is all FLV
    /// tags can carry.
    pub fn register_audio(&mut self, config: AudioStreamConfig) -> Result<StreamHandle, MuxerSessionError> {
        if config.sample_rate == 0 {
            return Err(MuxerSessionError::InvalidConfig {
                reason: "audio sample rate must be positive".to_string(),
            });
        }

        if config.channels == 0 {
            return Err(MuxerSessionError::InvalidConfig {
                reason: "audio channel count must be positive".to_string(),
            });
        }

        self.register(StreamKind::Audio, StreamParameters::Audio(config), Rational::MILLISECONDS)
    }

    /// Stores the codec configuration of a stream.  It can only be set once.  Audio
    /// configuration must be a readable AudioSpecificConfig.
    pub fn set_configuration_data(&mut self, handle: StreamHandle, data: &[u8]) -> Result<(), MuxerSessionError> {
        if data.is_empty() {
            return Err(MuxerSessionError::InvalidConfig {
                reason: format!("{} configuration data is empty", handle.kind),
            });
        }

        if handle.kind == StreamKind::Audio && AudioSpecificConfig::from_bytes(data).is_none() {
            return Err(MuxerSessionError::InvalidConfig {
                reason: format!("audio configuration data {:02x?} is not a valid AudioSpecificConfig", data),
            });
        }

        let stream = self.get_by_handle_mut(handle)?;
        if stream.configuration_data.is_some() {
            return Err(MuxerSessionError::ConfigurationDataAlreadySet(handle.kind));
        }

        stream.configuration_data = Some(Bytes::copy_from_slice(data));
        Ok(())
    }

    /// True once both a video and an audio stream are registered
    pub fn is_complete(&self) -> bool {
        self.get(StreamKind::Video).is_some() && self.get(StreamKind::Audio).is_some()
    }

    pub fn handle(&self, kind: StreamKind) -> Option<StreamHandle> {
        self.get(kind).map(|stream| stream.handle)
    }

    pub fn get(&self, kind: StreamKind) -> Option<&StreamState> {
        self.streams.iter().find(|stream| stream.handle.kind == kind)
    }

    pub fn get_mut(&mut self, kind: StreamKind) -> Option<&mut StreamState> {
        self.streams.iter_mut().find(|stream| stream.handle.kind == kind)
    }

    /// Switches every stream over to the unit the container stores timestamps in
    pub fn set_output_time_base(&mut self, time_base: Rational) {
        for stream in self.streams.iter_mut() {
            stream.time_base = time_base;
        }
    }

    pub fn clear(&mut self) {
        self.streams.clear();
    }

    fn register(
        &mut self,
        kind: StreamKind,
        parameters: StreamParameters,
        time_base: Rational,
    ) -> Result<StreamHandle, MuxerSessionError> {
        if self.get(kind).is_some() {
            return Err(MuxerSessionError::DuplicateStream(kind));
        }

        let handle = StreamHandle {
            index: self.streams.len(),
            kind,
        };

        self.streams.push(StreamState {
            handle,
            parameters,
            codec_time_base: time_base,
            time_base,
            configuration_data: None,
            packets_submitted: 0,
            packets_written: 0,
            last_decode_timestamp: None,
        });

        Ok(handle)
    }

    fn get_by_handle_mut(&mut self, handle: StreamHandle) -> Result<&mut StreamState, MuxerSessionError> {
        match self.streams.get_mut(handle.index) {
            Some(stream) if stream.handle == handle => Ok(stream),
            _ => Err(MuxerSessionError::StreamNotRegistered(handle.kind)),
        }
    }
}
