use super::script_data::{deserialize_script_data, ScriptDataValue};
use super::{FlvDeserializationError, FlvTagType};
use crate::time::FlvTimestamp;
use bytes::Bytes;

/// What an AVC video tag carries
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum AvcPacketType {
    SequenceHeader,
    Nalu,
    EndOfSequence,
}

impl AvcPacketType {
    pub fn from_u8(value: u8) -> Option<AvcPacketType> {
        match value {
            0 => Some(AvcPacketType::SequenceHeader),
            1 => Some(AvcPacketType::Nalu),
            2 => Some(AvcPacketType::EndOfSequence),
            _ => None,
        }
    }
}

/// What an AAC audio tag carries
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum AacPacketType {
    SequenceHeader,
    Raw,
}

impl AacPacketType {
    pub fn from_u8(value: u8) -> Option<AacPacketType> {
        match value {
            0 => Some(AacPacketType::SequenceHeader),
            1 => Some(AacPacketType::Raw),
            _ => None,
        }
    }
}

/// The header in front of the data of an AVC video tag
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct VideoTagHeader {
    pub frame_type: u8,
    pub codec_id: u8,
    pub avc_packet_type: AvcPacketType,

    /// Difference between presentation and decode time, in milliseconds
    pub composition_time: i32,
}

/// The header in front of the data of an AAC audio tag
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct AudioTagHeader {
    pub sound_format: u8,
    pub sound_rate: u8,
    pub sound_size: u8,
    pub sound_type: u8,
    pub aac_packet_type: AacPacketType,
}

const VIDEO_TAG_HEADER_LENGTH: usize = 5;
const AUDIO_TAG_HEADER_LENGTH: usize = 2;

/// A single tag read out of an FLV stream
#[derive(PartialEq, Debug, Clone)]
pub struct FlvTag {
    pub tag_type: FlvTagType,
    pub timestamp: FlvTimestamp,
    pub stream_id: u32,

    /// The tag's data, including the audio or video tag header
    pub data: Bytes,
}

impl FlvTag {
    /// Parses the AVC video tag header, if this is a video tag with a complete one
    pub fn video_header(&self) -> Option<VideoTagHeader> {
        if self.tag_type != FlvTagType::Video || self.data.len() < VIDEO_TAG_HEADER_LENGTH {
            return None;
        }

        let composition_time = i32::from_be_bytes([0, self.data[2], self.data[3], self.data[4]]);
        // sign extend from 24 bits
        let composition_time = (composition_time << 8) >> 8;

        Some(VideoTagHeader {
            frame_type: self.data[0] >> 4,
            codec_id: self.data[0] & 0x0F,
            avc_packet_type: AvcPacketType::from_u8(self.data[1])?,
            composition_time,
        })
    }

    /// Parses the AAC audio tag header, if this is an audio tag with a complete one
    pub fn audio_header(&self) -> Option<AudioTagHeader> {
        if self.tag_type != FlvTagType::Audio || self.data.len() < AUDIO_TAG_HEADER_LENGTH {
            return None;
        }

        let flags = self.data[0];
        Some(AudioTagHeader {
            sound_format: flags >> 4,
            sound_rate: (flags >> 2) & 0x03,
            sound_size: (flags >> 1) & 0x01,
            sound_type: flags & 0x01,
            aac_packet_type: AacPacketType::from_u8(self.data[1])?,
        })
    }

    /// The tag's payload past its audio or video tag header
    pub fn body(&self) -> Bytes {
        let offset = match self.tag_type {
            FlvTagType::Video => VIDEO_TAG_HEADER_LENGTH,
            FlvTagType::Audio => AUDIO_TAG_HEADER_LENGTH,
            FlvTagType::ScriptData => 0,
        };

        self.data.slice(offset.min(self.data.len())..)
    }

    /// Decodes the name and value of a script data tag
    pub fn script_data(&self) -> Option<Result<(String, ScriptDataValue), FlvDeserializationError>> {
        match self.tag_type {
            FlvTagType::ScriptData => Some(deserialize_script_data(&self.data)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(tag_type: FlvTagType, data: &'static [u8]) -> FlvTag {
        FlvTag {
            tag_type,
            timestamp: FlvTimestamp::new(0),
            stream_id: 0,
            data: Bytes::from_static(data),
        }
    }

    #[test]
    fn reads_video_tag_header() {
        let tag = tag(FlvTagType::Video, &[0x27, 1, 0xFF, 0xFF, 0xFE, 0, 0, 0, 1, 0x41]);
        let header = tag.video_header().unwrap();

        assert_eq!(header.frame_type, 2);
        assert_eq!(header.codec_id, 7);
        assert_eq!(header.avc_packet_type, AvcPacketType::Nalu);
        assert_eq!(header.composition_time, -2);
        assert_eq!(&tag.body()[..], &[0, 0, 0, 1, 0x41]);
    }

    #[test]
    fn reads_audio_tag_header() {
        let tag = tag(FlvTagType::Audio, &[0xAF, 0, 0x12, 0x08]);
        let header = tag.audio_header().unwrap();

        assert_eq!(header.sound_format, 10);
        assert_eq!(header.sound_rate, 3);
        assert_eq!(header.sound_size, 1);
        assert_eq!(header.sound_type, 1);
        assert_eq!(header.aac_packet_type, AacPacketType::SequenceHeader);
        assert_eq!(&tag.body()[..], &[0x12, 0x08]);
    }

    #[test]
    fn headers_are_only_read_from_matching_tag_types() {
        let tag = tag(FlvTagType::Audio, &[0xAF, 1, 0, 0, 0]);

        assert_eq!(tag.video_header(), None);
        assert!(tag.script_data().is_none());
    }
}
