use crate::time::{Rational, Rounding};
use std::path::PathBuf;

/// Codecs a video stream can carry
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum VideoCodec {
    H264,
}

/// Pixel layout the encoder was fed with.  Only advertised, never interpreted.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum PixelFormat {
    Yuv420p,
    Nv12,
}

/// Codecs an audio stream can carry
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum AudioCodec {
    Aac,
}

/// Sample layout the encoder was fed with.  Only advertised, never interpreted.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum SampleFormat {
    S16,
    FloatPlanar,
}

/// Parameters of the video stream, fixed once the stream is registered
#[derive(PartialEq, Debug, Clone)]
pub struct VideoStreamConfig {
    pub codec: VideoCodec,
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,

    /// Target bit rate in bits per second
    pub bit_rate: u32,
    pub pixel_format: PixelFormat,
}

impl VideoStreamConfig {
    pub fn new(width: u32, height: u32, frame_rate: u32) -> VideoStreamConfig {
        VideoStreamConfig {
            codec: VideoCodec::H264,
            width,
            height,
            frame_rate,
            bit_rate: 1_500_000,
            pixel_format: PixelFormat::Yuv420p,
        }
    }
}

/// Parameters of the audio stream, fixed once the stream is registered
#[derive(PartialEq, Debug, Clone)]
pub struct AudioStreamConfig {
    pub codec: AudioCodec,
    pub sample_rate: u32,
    pub channels: u32,
    pub sample_format: SampleFormat,

    /// Target bit rate in bits per second
    pub bit_rate: u32,
}

impl AudioStreamConfig {
    pub fn new(sample_rate: u32, channels: u32) -> AudioStreamConfig {
        AudioStreamConfig {
            codec: AudioCodec::Aac,
            sample_rate,
            channels,
            sample_format: SampleFormat::S16,
            bit_rate: 128_000,
        }
    }
}

/// Options that govern how a muxer session treats its input
#[derive(PartialEq, Debug, Clone)]
pub struct MuxerOptions {
    /// The unit packet timestamps are supplied in
    pub device_time_base: Rational,

    /// How timestamps are rounded when rescaled into the container's unit.  Applied to both
    /// presentation and decode timestamps.
    pub rounding: Rounding,

    /// Written as the `encoder` metadata property
    pub encoder_name: String,
}

impl MuxerOptions {
    pub fn new() -> MuxerOptions {
        MuxerOptions {
            device_time_base: Rational::MICROSECONDS,
            rounding: Rounding::Zero,
            encoder_name: format!("rml_flv {}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for MuxerOptions {
    fn default() -> Self {
        MuxerOptions::new()
    }
}

/// Everything a capture pipeline supplies to prepare a muxer session
#[derive(PartialEq, Debug, Clone)]
pub struct MuxerSessionConfig {
    pub video_width: u32,
    pub video_height: u32,
    pub video_fps: u32,
    pub video_bit_rate: u32,
    pub audio_sample_rate: u32,
    pub audio_channels: u32,
    pub audio_bit_rate: u32,

    /// Name of the container format, only `flv` is supported
    pub output_format_name: String,

    /// Where `MuxerSession::prepare()` writes the stream to
    pub output_target: PathBuf,
    pub options: MuxerOptions,
}

impl MuxerSessionConfig {
    /// Creates a new configuration object with default values
    pub fn new<P: Into<PathBuf>>(output_target: P) -> MuxerSessionConfig {
        MuxerSessionConfig {
            video_width: 1280,
            video_height: 720,
            video_fps: 30,
            video_bit_rate: 1_500_000,
            audio_sample_rate: 44_100,
            audio_channels: 1,
            audio_bit_rate: 128_000,
            output_format_name: "flv".to_string(),
            output_target: output_target.into(),
            options: MuxerOptions::new(),
        }
    }

    pub fn video_stream_config(&self) -> VideoStreamConfig {
        VideoStreamConfig {
            bit_rate: self.video_bit_rate,
            ..VideoStreamConfig::new(self.video_width, self.video_height, self.video_fps)
        }
    }

    pub fn audio_stream_config(&self) -> AudioStreamConfig {
        AudioStreamConfig {
            bit_rate: self.audio_bit_rate,
            ..AudioStreamConfig::new(self.audio_sample_rate, self.audio_channels)
        }
    }
}
