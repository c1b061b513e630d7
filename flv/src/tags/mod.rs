/*!
This module contains the FLV container format: serializing the file header and tags that make up
an FLV stream, driving an output sink with them (`FlvWriter`), and reading them back
(`FlvDeserializer`).

An FLV stream is a 9 byte file header followed by a sequence of tags.  Every tag is preceded by a
4 byte `PreviousTagSize` field holding the total size of the tag before it (0 for the first tag),
and carries an 11 byte header with its type, data size and a millisecond timestamp.
*/

mod deserialization_errors;
mod deserializer;
mod metadata;
mod script_data;
mod serialization_errors;
mod serializer;
mod tag;
mod writer;

pub use self::deserialization_errors::FlvDeserializationError;
pub use self::deserializer::FlvDeserializer;
pub use self::metadata::FlvMetadata;
pub use self::script_data::{deserialize_script_data, serialize_script_data, ScriptDataValue};
pub use self::serialization_errors::FlvSerializationError;
pub use self::serializer::FlvTagSerializer;
pub use self::tag::{AacPacketType, AudioTagHeader, AvcPacketType, FlvTag, VideoTagHeader};
pub use self::writer::FlvWriter;

use crate::time::Rational;

/// The unit every FLV tag timestamp is expressed in
pub const TAG_TIME_BASE: Rational = Rational::MILLISECONDS;

pub const FILE_HEADER_SIZE: usize = 9;
pub const TAG_HEADER_SIZE: usize = 11;
pub const PREVIOUS_TAG_SIZE_LENGTH: usize = 4;

/// Largest data size the 24 bit `DataSize` field can describe
pub const MAX_TAG_DATA_SIZE: usize = 0x00FF_FFFF;

pub const VIDEO_CODEC_ID_AVC: u8 = 7;
pub const SOUND_FORMAT_AAC: u8 = 10;
pub const VIDEO_FRAME_TYPE_KEY: u8 = 1;
pub const VIDEO_FRAME_TYPE_INTER: u8 = 2;

/// AAC audio tags always advertise 44 kHz, 16 bit, stereo.  Decoders take the real values from
/// the AudioSpecificConfig.
pub const AAC_SOUND_FLAGS: u8 = (SOUND_FORMAT_AAC << 4) | (3 << 2) | (1 << 1) | 1;

/// The kind of data a tag carries
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum FlvTagType {
    Audio,
    Video,
    ScriptData,
}

impl FlvTagType {
    pub fn type_id(&self) -> u8 {
        match *self {
            FlvTagType::Audio => 8,
            FlvTagType::Video => 9,
            FlvTagType::ScriptData => 18,
        }
    }

    pub fn from_type_id(type_id: u8) -> Option<FlvTagType> {
        match type_id {
            8 => Some(FlvTagType::Audio),
            9 => Some(FlvTagType::Video),
            18 => Some(FlvTagType::ScriptData),
            _ => None,
        }
    }
}

/// The flags of the FLV file header
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct FlvHeader {
    pub version: u8,
    pub has_audio: bool,
    pub has_video: bool,
}

impl FlvHeader {
    pub fn new(has_audio: bool, has_video: bool) -> FlvHeader {
        FlvHeader {
            version: 1,
            has_audio,
            has_video,
        }
    }

    pub fn flags(&self) -> u8 {
        let audio = if self.has_audio { 0x04 } else { 0 };
        let video = if self.has_video { 0x01 } else { 0 };
        audio | video
    }
}
