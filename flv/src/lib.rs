//! This crate multiplexes encoded H.264 video and AAC audio into the FLV container, as used for
//! RTMP delivery and `.flv` recordings.  The format is described in Adobe's Video File Format
//! Specification version 10, Annex E.
//!
//! Hardware encoders hand out H.264 access units as Annex-B byte streams and AAC frames wrapped
//! in ADTS headers.  The `MuxerSession` turns those into FLV tags: the AVC and AAC sequence
//! headers are derived from the configuration data, ADTS framing is stripped, Annex-B start codes
//! are replaced with length prefixes, and device timestamps are rescaled into the millisecond
//! timestamps FLV tags carry.
//!
//! # Examples
//! ```
//! use rml_flv::muxer::{MuxerSession, MuxerSessionConfig, Packet};
//! use rml_flv::sink::MemorySink;
//! use rml_flv::tags::FlvDeserializer;
//!
//! let sink = MemorySink::new();
//! let mut config = MuxerSessionConfig::new("unused.flv");
//! config.audio_sample_rate = 48000;
//! config.audio_channels = 2;
//!
//! let mut session = MuxerSession::prepare_with_sink(config, sink.clone()).unwrap();
//! session.set_video_configuration_data(&[
//!     0, 0, 0, 1, 0x67, 0x42, 0xC0, 0x1F, 0xDA, 0x01, 0x40, 0x16, 0xEC, 0x04, 0x40,
//!     0, 0, 0, 1, 0x68, 0xCE, 0x3C, 0x80,
//! ]).unwrap();
//!
//! session.write_header().unwrap();
//! session.write_packet(&Packet::video(&[0, 0, 0, 1, 0x65, 0x88, 0x84], 0, true)).unwrap();
//!
//! // 48 kHz stereo AAC-LC frame with a 2 byte payload
//! let adts = [0xFF, 0xF1, 0x4C, 0x80, 0x01, 0x3F, 0xFC, 0x21, 0x10];
//! session.write_packet(&Packet::audio(&adts, 21_333)).unwrap();
//! session.finalize().unwrap();
//!
//! let mut deserializer = FlvDeserializer::new();
//! let first_tag = deserializer.get_next_tag(&sink.contents()).unwrap().unwrap();
//! assert_eq!(first_tag.script_data().unwrap().unwrap().0, "onMetaData");
//! ```

pub mod aac;
pub mod avc;
pub mod muxer;
pub mod sink;
pub mod tags;
pub mod time;

#[cfg(test)]
mod test_utils;
