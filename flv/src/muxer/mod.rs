/*!
This module contains the muxer session, which turns encoded H.264 and AAC packets into an FLV
stream.

A session goes through a fixed lifecycle: both streams are registered, codec configuration data
is supplied, the container header is written, packets are written one at a time, and finally the
session is finalized to write the trailer and release the output sink.

```
use rml_flv::muxer::{MuxerSession, MuxerSessionConfig, Packet, SessionState};
use rml_flv::sink::MemorySink;

let sink = MemorySink::new();
let config = MuxerSessionConfig::new("unused.flv");
let mut session = MuxerSession::prepare_with_sink(config, sink.clone()).unwrap();

let sps_pps = [0, 0, 0, 1, 0x67, 0x42, 0xC0, 0x1F, 0xDA, 0, 0, 0, 1, 0x68, 0xCE, 0x3C, 0x80];
session.set_video_configuration_data(&sps_pps).unwrap();
session.write_header().unwrap();

let frame = [0, 0, 0, 1, 0x65, 0x88, 0x84, 0x00];
let written = session.write_packet(&Packet::video(&frame, 33_333, true)).unwrap();
assert_eq!(written.timestamp_ms, 33);

session.finalize().unwrap();
assert_eq!(session.state(), SessionState::Finalized);
assert_eq!(&sink.contents()[..3], b"FLV");
```
*/

mod config;
mod errors;
mod packet;
mod registry;
mod result;
mod shared;
mod state;
mod statistics;


pub use self::config::{AudioCodec, AudioStreamConfig, MuxerOptions, MuxerSessionConfig};
pub use self::config::{PixelFormat, SampleFormat, VideoCodec, VideoStreamConfig};
pub use self::errors::{ErrorCategory, MuxerSessionError};
pub use self::packet::Packet;
pub use self::registry::{StreamHandle, StreamKind, StreamParameters, StreamRegistry, StreamState};
pub use self::result::{MuxResultCode, WrittenPacket};
pub use self::shared::SharedMuxerSession;
pub use self::state::SessionState;
pub use self::statistics::MuxerStatistics;

use crate::aac::{normalize_adts, AacFrame, AdtsError, AudioSpecificConfig};
use crate::sink::{FileSink, OutputSink};
use crate::tags::{FlvMetadata, FlvSerializationError, FlvWriter, TAG_TIME_BASE};
use crate::time::rescale_rounded;
use bytes::Bytes;
use tracing::{debug, info, warn};

const SUPPORTED_FORMAT: &str = "flv";

/// Muxes one H.264 video stream and one AAC audio stream into FLV.
///
/// The session writes synchronously into its output sink and never holds on to packet buffers
/// past the `write_packet()` call they were passed to.  Packets that cannot be muxed (bad ADTS
/// framing, out of order timestamps, a failed sink write) are rejected individually and the
/// session keeps accepting the packets after them.
pub struct MuxerSession<S: OutputSink> {
    state: SessionState,
    registry: StreamRegistry,
    writer: FlvWriter<S>,
    options: MuxerOptions,
    statistics: MuxerStatistics,
}

impl MuxerSession<FileSink> {
    /// Creates a session writing to the file at `config.output_target`, with both streams
    /// registered from the configuration.  The file is created when the header is written.
    pub fn prepare(config: MuxerSessionConfig) -> Result<MuxerSession<FileSink>, MuxerSessionError> {
        let sink = FileSink::new(&config.output_target);
        MuxerSession::prepare_with_sink(config, sink)
    }
}

impl<S: OutputSink> MuxerSession<S> {
    /// Creates a session with no streams registered yet
    pub fn new(sink: S, options: MuxerOptions) -> MuxerSession<S> {
        MuxerSession {
            state: SessionState::Created,
            registry: StreamRegistry::new(),
            writer: FlvWriter::new(sink),
            options,
            statistics: MuxerStatistics::default(),
        }
    }

    /// Creates a session writing into `sink`, with both streams registered from the configuration
    pub fn prepare_with_sink(config: MuxerSessionConfig, sink: S) -> Result<MuxerSession<S>, MuxerSessionError> {
        if !config.output_format_name.eq_ignore_ascii_case(SUPPORTED_FORMAT) {
            return Err(MuxerSessionError::UnsupportedFormat(config.output_format_name));
        }

        let mut session = MuxerSession::new(sink, config.options.clone());
        session.register_video_stream(config.video_stream_config())?;
        session.register_audio_stream(config.audio_stream_config())?;

        debug!(
            width = config.video_width,
            height = config.video_height,
            fps = config.video_fps,
            sample_rate = config.audio_sample_rate,
            channels = config.audio_channels,
            "Muxer session prepared"
        );

        Ok(session)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn statistics(&self) -> &MuxerStatistics {
        &self.statistics
    }

    pub fn options(&self) -> &MuxerOptions {
        &self.options
    }

    pub fn stream(&self, kind: StreamKind) -> Option<&StreamState> {
        self.registry.get(kind)
    }

    pub fn stream_handle(&self, kind: StreamKind) -> Option<StreamHandle> {
        self.registry.handle(kind)
    }

    pub fn sink(&self) -> &S {
        self.writer.sink()
    }

    pub fn register_video_stream(&mut self, config: VideoStreamConfig) -> Result<StreamHandle, MuxerSessionError> {
        self.ensure_registration_open()?;
        let handle = self.registry.register_video(config)?;
        self.update_configured_state();
        Ok(handle)
    }

    pub fn register_audio_stream(&mut self, config: AudioStreamConfig) -> Result<StreamHandle, MuxerSessionError> {
        self.ensure_registration_open()?;
        let handle = self.registry.register_audio(config)?;
        self.update_configured_state();
        Ok(handle)
    }

    /// Stores codec configuration data for a stream: the SPS and PPS (Annex-B or as an
    /// AVCDecoderConfigurationRecord) for video, an AudioSpecificConfig for audio.  The bytes
    /// are copied.
    pub fn set_configuration_data(&mut self, handle: StreamHandle, data: &[u8]) -> Result<(), MuxerSessionError> {
        match self.state {
            SessionState::Created | SessionState::Configured => (),
            SessionState::Finalized => return Err(MuxerSessionError::SessionClosed),
            SessionState::Faulted => {
                return Err(MuxerSessionError::NotReady {
                    current_state: self.state,
                })
            }

            SessionState::HeaderWritten | SessionState::Streaming => {
                return Err(MuxerSessionError::AlreadyFinalized {
                    current_state: self.state,
                })
            }
        }

        self.registry.set_configuration_data(handle, data)?;
        debug!(stream = %handle.kind(), size = data.len(), "Configuration data set");
        Ok(())
    }

    pub fn set_video_configuration_data(&mut self, data: &[u8]) -> Result<(), MuxerSessionError> {
        let handle = self.required_handle(StreamKind::Video)?;
        self.set_configuration_data(handle, data)
    }

    /// Optional, the AudioSpecificConfig is otherwise derived from the first ADTS frame
    pub fn set_audio_configuration_data(&mut self, data: &[u8]) -> Result<(), MuxerSessionError> {
        let handle = self.required_handle(StreamKind::Audio)?;
        self.set_configuration_data(handle, data)
    }

    /// Opens the sink and writes the container header along with the codec sequence headers.
    ///
    /// Any failure here leaves the session faulted, and only `finalize()` remains valid.
    pub fn write_header(&mut self) -> Result<(), MuxerSessionError> {
        match self.state {
            SessionState::Configured => (),
            SessionState::HeaderWritten | SessionState::Streaming => return Err(MuxerSessionError::AlreadyWritten),
            SessionState::Finalized => return Err(MuxerSessionError::SessionClosed),
            SessionState::Created | SessionState::Faulted => {
                return Err(MuxerSessionError::NotReady {
                    current_state: self.state,
                })
            }
        }

        if let Err(error) = self.write_container_header() {
            warn!(error = %error, "Writing the container header failed");
            self.state = SessionState::Faulted;
            return Err(error);
        }

        self.registry.set_output_time_base(TAG_TIME_BASE);
        self.statistics.bytes_written = self.writer.bytes_written();
        self.state = SessionState::HeaderWritten;

        info!(bytes = self.writer.bytes_written(), "Container header written");
        Ok(())
    }

    /// Writes one packet into the container.
    ///
    /// Audio packets must carry ADTS framing, which is stripped.  Timestamps are rescaled from
    /// the device clock into milliseconds.  Errors for which `is_recoverable()` is true only
    /// affect this packet.
    pub fn write_packet(&mut self, packet: &Packet) -> Result<WrittenPacket, MuxerSessionError> {
        if !self.state.accepts_packets() {
            return Err(match self.state {
                SessionState::Finalized => MuxerSessionError::SessionClosed,
                current_state => MuxerSessionError::NotReady { current_state },
            });
        }

        let result = self.mux_packet(packet);
        match &result {
            Ok(written) => {
                self.statistics.record_written(packet.kind);
                self.statistics.bytes_written = self.writer.bytes_written();
                self.state = SessionState::Streaming;

                debug!(
                    stream = %written.kind,
                    sequence = written.sequence,
                    timestamp = written.timestamp_ms,
                    bytes = written.bytes_written,
                    "Packet written"
                );
            }

            Err(error) => {
                self.record_rejection(error);
                warn!(error = %error, "Packet dropped");
            }
        }

        result
    }

    /// Writes the trailer when a header was written, closes the sink and releases the streams.
    ///
    /// Resources are released even if the trailer could not be written, in which case the
    /// trailer error is returned.  The session is finalized either way.
    pub fn finalize(&mut self) -> Result<(), MuxerSessionError> {
        if self.state == SessionState::Finalized {
            return Err(MuxerSessionError::SessionClosed);
        }

        let trailer_result = if self.state.accepts_packets() {
            self.writer
                .write_trailer()
                .map_err(MuxerSessionError::TrailerWriteFailed)
        } else {
            Ok(())
        };

        if let Err(error) = &trailer_result {
            warn!(error = %error, "Writing the container trailer failed");
        }

        let close_result = self.writer.close().map_err(MuxerSessionError::SinkCloseFailed);
        if let Err(error) = &close_result {
            warn!(error = %error, "Closing the output sink failed");
        }

        self.statistics.bytes_written = self.writer.bytes_written();
        self.registry.clear();
        self.state = SessionState::Finalized;

        info!(
            video_packets = self.statistics.video_packets_written,
            audio_packets = self.statistics.audio_packets_written,
            rejected = self.statistics.packets_rejected(),
            write_failures = self.statistics.write_failures,
            bytes = self.statistics.bytes_written,
            "Muxer session finalized"
        );

        trailer_result.and(close_result)
    }

    fn write_container_header(&mut self) -> Result<(), MuxerSessionError> {
        let (video, audio) = match (self.registry.get(StreamKind::Video), self.registry.get(StreamKind::Audio)) {
            (Some(video), Some(audio)) => (video, audio),
            (None, _) => return Err(MuxerSessionError::StreamNotRegistered(StreamKind::Video)),
            (_, None) => return Err(MuxerSessionError::StreamNotRegistered(StreamKind::Audio)),
        };

        let video_configuration = video
            .configuration_data
            .clone()
            .ok_or(MuxerSessionError::MissingConfigurationData(StreamKind::Video))?;

        let audio_configuration = audio.configuration_data.clone();
        let metadata = self.metadata(video, audio);

        self.writer.open_sink().map_err(MuxerSessionError::SinkUnavailable)?;
        self.writer
            .write_header(&metadata, &video_configuration, audio_configuration.as_deref())
            .map_err(|error| match error {
                FlvSerializationError::Io(error) => MuxerSessionError::SinkUnavailable(error),
                error => MuxerSessionError::HeaderWriteFailed(error),
            })
    }

    fn metadata(&self, video: &StreamState, audio: &StreamState) -> FlvMetadata {
        let mut metadata = FlvMetadata {
            video_width: 0,
            video_height: 0,
            video_frame_rate: video.codec_time_base.rate(),
            video_bitrate_kbps: 0,
            audio_sample_rate: 0,
            audio_channels: 0,
            audio_bitrate_kbps: 0,
            encoder: self.options.encoder_name.clone(),
        };

        if let StreamParameters::Video(config) = &video.parameters {
            metadata.video_width = config.width;
            metadata.video_height = config.height;
            metadata.video_bitrate_kbps = config.bit_rate / 1000;
        }

        if let StreamParameters::Audio(config) = &audio.parameters {
            metadata.audio_sample_rate = config.sample_rate;
            metadata.audio_channels = config.channels;
            metadata.audio_bitrate_kbps = config.bit_rate / 1000;
        }

        metadata
    }

    fn mux_packet(&mut self, packet: &Packet) -> Result<WrittenPacket, MuxerSessionError> {
        let kind = packet.kind;
        let device_time_base = self.options.device_time_base;
        let rounding = self.options.rounding;

        let stream = self
            .registry
            .get_mut(kind)
            .ok_or(MuxerSessionError::StreamNotRegistered(kind))?;

        let sequence = stream.packets_submitted;
        stream.packets_submitted += 1;

        let payload = match packet.payload() {
            Some(payload) if !payload.is_empty() => payload,
            Some(_) => return Err(MuxerSessionError::EmptyPacket { kind, sequence }),
            None => {
                return Err(MuxerSessionError::SizeMismatch {
                    kind,
                    sequence,
                    declared: packet.size,
                    actual: packet.data.len(),
                })
            }
        };

        let pts = rescale_rounded(packet.pts, device_time_base, stream.time_base, rounding);
        let dts = match packet.dts {
            Some(dts) => rescale_rounded(dts, device_time_base, stream.time_base, rounding),
            None => pts,
        };

        let invalid_timestamp = |reason: &'static str| MuxerSessionError::InvalidTimestamp {
            kind,
            sequence,
            pts,
            dts,
            reason,
        };

        if dts < 0 {
            return Err(invalid_timestamp("decode timestamp is negative"));
        }

        if let Some(last) = stream.last_decode_timestamp {
            if dts < last {
                return Err(invalid_timestamp("decode timestamp went backwards"));
            }
        }

        if pts < dts {
            return Err(invalid_timestamp("presentation timestamp precedes decode timestamp"));
        }

        // Stream time bases are the tag time base once the header is written
        let write_result = match kind {
            StreamKind::Video => self
                .writer
                .write_video(dts, pts - dts, packet.is_key_frame, payload),

            StreamKind::Audio => {
                let frame = normalize_adts(payload).map_err(|error| adts_error(kind, sequence, error))?;
                match stream.configuration_data.clone() {
                    None => {
                        let config = frame.audio_specific_config().to_bytes();
                        stream.configuration_data = Some(Bytes::copy_from_slice(&config));
                        debug!(
                            sample_rate = frame.header.sample_rate(),
                            channels = frame.header.channel_configuration,
                            "Derived AudioSpecificConfig from ADTS header"
                        );
                    }

                    Some(configuration) if stream.packets_written == 0 => {
                        warn_on_configuration_mismatch(&configuration, &frame)
                    }

                    Some(_) => (),
                }

                self.writer
                    .write_audio(dts, frame.payload, stream.configuration_data.as_deref())
            }
        };

        let bytes_written = write_result.map_err(|source| MuxerSessionError::PacketWriteFailed {
            kind,
            sequence,
            size: payload.len(),
            source,
        })?;

        stream.packets_written += 1;
        stream.last_decode_timestamp = Some(dts);

        Ok(WrittenPacket {
            kind,
            stream_index: stream.index(),
            sequence,
            timestamp_ms: dts,
            composition_time_ms: pts - dts,
            bytes_written,
        })
    }

    fn record_rejection(&mut self, error: &MuxerSessionError) {
        match error {
            MuxerSessionError::MalformedBitstream { .. } | MuxerSessionError::EmptyPacket { .. } => {
                self.statistics.malformed_packets += 1
            }

            MuxerSessionError::SizeMismatch { .. } => self.statistics.size_mismatches += 1,
            MuxerSessionError::InvalidTimestamp { .. } => self.statistics.timestamp_rejections += 1,
            MuxerSessionError::PacketWriteFailed { .. } => self.statistics.write_failures += 1,
            _ => (),
        }
    }

    fn ensure_registration_open(&self) -> Result<(), MuxerSessionError> {
        match self.state {
            SessionState::Created | SessionState::Configured => Ok(()),
            SessionState::Finalized => Err(MuxerSessionError::SessionClosed),
            current_state => Err(MuxerSessionError::NotReady { current_state }),
        }
    }

    fn update_configured_state(&mut self) {
        if self.state == SessionState::Created && self.registry.is_complete() {
            self.state = SessionState::Configured;
        }
    }

    fn required_handle(&self, kind: StreamKind) -> Result<StreamHandle, MuxerSessionError> {
        if self.state == SessionState::Finalized {
            return Err(MuxerSessionError::SessionClosed);
        }

        self.registry
            .handle(kind)
            .ok_or(MuxerSessionError::StreamNotRegistered(kind))
    }
}

fn adts_error(kind: StreamKind, sequence: u64, error: AdtsError) -> MuxerSessionError {
    match error {
        AdtsError::SizeMismatch {
            frame_length,
            packet_size,
        } => MuxerSessionError::SizeMismatch {
            kind,
            sequence,
            declared: frame_length,
            actual: packet_size,
        },

        source => MuxerSessionError::MalformedBitstream { kind, sequence, source },
    }
}

fn warn_on_configuration_mismatch(configuration: &[u8], frame: &AacFrame) {
    let supplied = match AudioSpecificConfig::from_bytes(configuration) {
        Some(supplied) => supplied,
        None => return,
    };

    let actual = frame.audio_specific_config();
    if supplied.sampling_frequency_index != actual.sampling_frequency_index
        || supplied.channel_configuration != actual.channel_configuration
    {
        warn!(
            configured_sample_rate = ?supplied.sample_rate(),
            configured_channels = supplied.channel_configuration,
            sample_rate = frame.header.sample_rate(),
            channels = frame.header.channel_configuration,
            "Audio configuration data disagrees with the first ADTS header"
        );
    }
}
