use super::script_data::{serialize_script_data, ScriptDataValue};
use super::{FlvHeader, FlvSerializationError, FlvTagType};
use super::{AAC_SOUND_FLAGS, FILE_HEADER_SIZE, MAX_TAG_DATA_SIZE, TAG_HEADER_SIZE};
use super::{VIDEO_CODEC_ID_AVC, VIDEO_FRAME_TYPE_INTER, VIDEO_FRAME_TYPE_KEY};
use crate::avc::write_length_prefixed;
use crate::time::FlvTimestamp;
use byteorder::{BigEndian, WriteBytesExt};
use std::collections::HashMap;

const AVC_PACKET_TYPE_SEQUENCE_HEADER: u8 = 0;
const AVC_PACKET_TYPE_NALU: u8 = 1;
const AVC_PACKET_TYPE_END_OF_SEQUENCE: u8 = 2;
const AAC_PACKET_TYPE_SEQUENCE_HEADER: u8 = 0;
const AAC_PACKET_TYPE_RAW: u8 = 1;
const MIN_COMPOSITION_TIME: i64 = -(1 << 23);
const MAX_COMPOSITION_TIME: i64 = (1 << 23) - 1;

/// Assembles FLV tags into a byte buffer.
///
/// Each tag is written in full (tag header, data and the trailing `PreviousTagSize`) so the
/// buffer can be handed to an output sink in a single write.  The serializer does not track
/// anything between tags; call `clear()` before assembling the next batch.
pub struct FlvTagSerializer {
    bytes: Vec<u8>,
}

impl FlvTagSerializer {
    pub fn new() -> FlvTagSerializer {
        FlvTagSerializer { bytes: Vec::new() }
    }

    /// The bytes assembled since the last `clear()`
    pub fn bytes(&self) -> &[u8] {
        &self.bytes[..]
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    /// Writes the 9 byte file header followed by the first `PreviousTagSize` of 0
    pub fn serialize_file_header(&mut self, header: &FlvHeader) -> Result<(), FlvSerializationError> {
        self.bytes.extend(b"FLV");
        self.bytes.push(header.version);
        self.bytes.push(header.flags());
        self.bytes.write_u32::<BigEndian>(FILE_HEADER_SIZE as u32)?;
        self.bytes.write_u32::<BigEndian>(0)?;
        Ok(())
    }

    /// Writes a script data tag and returns the buffer positions of its top level numeric
    /// properties
    pub fn serialize_script_tag(
        &mut self,
        name: &str,
        value: &ScriptDataValue,
    ) -> Result<HashMap<String, usize>, FlvSerializationError> {
        let start = self.begin_tag(FlvTagType::ScriptData, FlvTimestamp::new(0))?;
        let positions = serialize_script_data(name, value, &mut self.bytes)?;
        self.finish_tag(start)?;

        Ok(positions)
    }

    /// Writes the AVC sequence header carrying an AVCDecoderConfigurationRecord
    pub fn serialize_avc_sequence_header(&mut self, record: &[u8]) -> Result<(), FlvSerializationError> {
        let start = self.begin_tag(FlvTagType::Video, FlvTimestamp::new(0))?;
        self.write_video_tag_header(true, AVC_PACKET_TYPE_SEQUENCE_HEADER, 0)?;
        self.bytes.extend_from_slice(record);
        self.finish_tag(start)
    }

    /// Writes a single H.264 frame.  When the stream was configured with Annex-B parameter sets
    /// the frame's NAL units are converted to length prefixed ones, otherwise it is copied as-is.
    pub fn serialize_avc_frame(
        &mut self,
        timestamp: FlvTimestamp,
        composition_time: i64,
        is_key_frame: bool,
        frame: &[u8],
        annex_b: bool,
    ) -> Result<(), FlvSerializationError> {
        if composition_time < MIN_COMPOSITION_TIME || composition_time > MAX_COMPOSITION_TIME {
            return Err(FlvSerializationError::CompositionTimeOutOfRange(composition_time));
        }

        let start = self.begin_tag(FlvTagType::Video, timestamp)?;
        self.write_video_tag_header(is_key_frame, AVC_PACKET_TYPE_NALU, composition_time as i32)?;
        if !annex_b {
            self.bytes.extend_from_slice(frame);
        } else if let Err(error) = write_length_prefixed(frame, &mut self.bytes) {
            self.bytes.truncate(start);
            return Err(error.into());
        }

        self.finish_tag(start)
    }

    /// Writes the AVC end of sequence marker
    pub fn serialize_avc_end_of_sequence(&mut self, timestamp: FlvTimestamp) -> Result<(), FlvSerializationError> {
        let start = self.begin_tag(FlvTagType::Video, timestamp)?;
        self.write_video_tag_header(true, AVC_PACKET_TYPE_END_OF_SEQUENCE, 0)?;
        self.finish_tag(start)
    }

    /// Writes the AAC sequence header carrying an AudioSpecificConfig
    pub fn serialize_aac_sequence_header(
        &mut self,
        timestamp: FlvTimestamp,
        audio_specific_config: &[u8],
    ) -> Result<(), FlvSerializationError> {
        let start = self.begin_tag(FlvTagType::Audio, timestamp)?;
        self.bytes.push(AAC_SOUND_FLAGS);
        self.bytes.push(AAC_PACKET_TYPE_SEQUENCE_HEADER);
        self.bytes.extend_from_slice(audio_specific_config);
        self.finish_tag(start)
    }

    /// Writes a single raw AAC frame
    pub fn serialize_aac_frame(&mut self, timestamp: FlvTimestamp, frame: &[u8]) -> Result<(), FlvSerializationError> {
        let start = self.begin_tag(FlvTagType::Audio, timestamp)?;
        self.bytes.push(AAC_SOUND_FLAGS);
        self.bytes.push(AAC_PACKET_TYPE_RAW);
        self.bytes.extend_from_slice(frame);
        self.finish_tag(start)
    }

    fn write_video_tag_header(
        &mut self,
        is_key_frame: bool,
        packet_type: u8,
        composition_time: i32,
    ) -> Result<(), FlvSerializationError> {
        let frame_type = if is_key_frame {
            VIDEO_FRAME_TYPE_KEY
        } else {
            VIDEO_FRAME_TYPE_INTER
        };

        self.bytes.push((frame_type << 4) | VIDEO_CODEC_ID_AVC);
        self.bytes.push(packet_type);
        self.bytes.write_i24::<BigEndian>(composition_time)?;
        Ok(())
    }

    /// Writes the tag header with a placeholder data size and returns where the tag starts
    fn begin_tag(&mut self, tag_type: FlvTagType, timestamp: FlvTimestamp) -> Result<usize, FlvSerializationError> {
        let start = self.bytes.len();
        self.bytes.push(tag_type.type_id());
        self.bytes.write_u24::<BigEndian>(0)?;
        self.bytes.write_u24::<BigEndian>(timestamp.lower_bits())?;
        self.bytes.push(timestamp.extended_bits());
        self.bytes.write_u24::<BigEndian>(0)?; // stream id
        Ok(start)
    }

    /// Fills in the data size of the tag starting at `start` and appends its `PreviousTagSize`
    fn finish_tag(&mut self, start: usize) -> Result<(), FlvSerializationError> {
        let data_size = self.bytes.len() - start - TAG_HEADER_SIZE;
        if data_size > MAX_TAG_DATA_SIZE {
            self.bytes.truncate(start);
            return Err(FlvSerializationError::TagTooLarge { size: data_size });
        }

        let size_bytes = (data_size as u32).to_be_bytes();
        self.bytes[start + 1..start + 4].copy_from_slice(&size_bytes[1..]);
        self.bytes
            .write_u32::<BigEndian>((TAG_HEADER_SIZE + data_size) as u32)?;

        Ok(())
    }
}
