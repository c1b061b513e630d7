use super::tag::FlvTag;
use super::{FlvDeserializationError, FlvHeader, FlvTagType};
use super::{FILE_HEADER_SIZE, PREVIOUS_TAG_SIZE_LENGTH, TAG_HEADER_SIZE};
use crate::time::FlvTimestamp;
use byteorder::{BigEndian, ByteOrder};
use bytes::{Buf, BytesMut};

const SUPPORTED_VERSION: u8 = 1;

/// Nothing precedes the first tag
const FIRST_PREVIOUS_TAG_SIZE: u32 = 0;

/// Reads FLV tags out of a byte stream.
///
/// Bytes can be handed over in arbitrarily sized pieces.  Anything that does not yet form a
/// complete tag (including its trailing `PreviousTagSize`) is buffered until the next call, so
/// every byte of the stream must go through the same deserializer exactly once.
///
/// ## Examples
///
/// ```
/// # use rml_flv::tags::{FlvDeserializer, FlvHeader, FlvTagSerializer, FlvTagType};
/// # use rml_flv::time::FlvTimestamp;
/// let mut serializer = FlvTagSerializer::new();
/// serializer.serialize_file_header(&FlvHeader::new(true, false)).unwrap();
/// serializer.serialize_aac_frame(FlvTimestamp::new(23), &[1, 2, 3]).unwrap();
///
/// let mut deserializer = FlvDeserializer::new();
/// let bytes = serializer.bytes();
/// assert!(deserializer.get_next_tag(&bytes[..10]).unwrap().is_none());
///
/// let tag = deserializer.get_next_tag(&bytes[10..]).unwrap().unwrap();
/// assert_eq!(tag.tag_type, FlvTagType::Audio);
/// assert_eq!(tag.timestamp, FlvTimestamp::new(23));
/// assert!(deserializer.get_next_tag(&[]).unwrap().is_none());
/// ```
pub struct FlvDeserializer {
    buffer: BytesMut,
    header: Option<FlvHeader>,
}

impl FlvDeserializer {
    pub fn new() -> FlvDeserializer {
        FlvDeserializer {
            buffer: BytesMut::with_capacity(4096),
            header: None,
        }
    }

    /// The file header, once enough bytes have been received to read it
    pub fn header(&self) -> Option<&FlvHeader> {
        self.header.as_ref()
    }

    /// Attempts to read the next complete tag.
    ///
    /// Returns `Ok(None)` when the buffered bytes do not hold a complete tag yet.  When they hold
    /// more than one tag only the first is returned; call again with an empty slice until `None`
    /// comes back to drain the rest.
    pub fn get_next_tag(&mut self, bytes: &[u8]) -> Result<Option<FlvTag>, FlvDeserializationError> {
        self.buffer.extend_from_slice(bytes);

        if self.header.is_none() && !self.read_file_header()? {
            return Ok(None);
        }

        if self.buffer.len() < TAG_HEADER_SIZE {
            return Ok(None);
        }

        let data_size = BigEndian::read_u24(&self.buffer[1..4]) as usize;
        let total_size = TAG_HEADER_SIZE + data_size + PREVIOUS_TAG_SIZE_LENGTH;
        if self.buffer.len() < total_size {
            return Ok(None);
        }

        let type_id = self.buffer[0];
        let tag_type = FlvTagType::from_type_id(type_id).ok_or(FlvDeserializationError::UnknownTagType(type_id))?;

        let mut tag_bytes = self.buffer.split_to(total_size);
        let timestamp = FlvTimestamp::from_parts(BigEndian::read_u24(&tag_bytes[4..7]), tag_bytes[7]);
        let stream_id = BigEndian::read_u24(&tag_bytes[8..11]);
        tag_bytes.advance(TAG_HEADER_SIZE);

        let data = tag_bytes.split_to(data_size).freeze();
        let previous_tag_size = BigEndian::read_u32(&tag_bytes[..]);
        let expected = (TAG_HEADER_SIZE + data_size) as u32;
        if previous_tag_size != expected {
            return Err(FlvDeserializationError::InvalidPreviousTagSize {
                expected,
                actual: previous_tag_size,
            });
        }

        Ok(Some(FlvTag {
            tag_type,
            timestamp,
            stream_id,
            data,
        }))
    }

    /// Reads the file header and the `PreviousTagSize` of 0 after it, returning false if there
    /// are not enough bytes yet
    fn read_file_header(&mut self) -> Result<bool, FlvDeserializationError> {
        if self.buffer.len() < 3 {
            return Ok(false);
        }

        if &self.buffer[..3] != b"FLV" {
            return Err(FlvDeserializationError::InvalidSignature);
        }

        if self.buffer.len() < FILE_HEADER_SIZE {
            return Ok(false);
        }

        let version = self.buffer[3];
        if version != SUPPORTED_VERSION {
            return Err(FlvDeserializationError::UnsupportedVersion(version));
        }

        let data_offset = BigEndian::read_u32(&self.buffer[5..9]);
        if (data_offset as usize) < FILE_HEADER_SIZE {
            return Err(FlvDeserializationError::InvalidDataOffset(data_offset));
        }

        let required = data_offset as usize + PREVIOUS_TAG_SIZE_LENGTH;
        if self.buffer.len() < required {
            return Ok(false);
        }

        let previous_tag_size = BigEndian::read_u32(&self.buffer[data_offset as usize..required]);
        if previous_tag_size != FIRST_PREVIOUS_TAG_SIZE {
            return Err(FlvDeserializationError::InvalidPreviousTagSize {
                expected: FIRST_PREVIOUS_TAG_SIZE,
                actual: previous_tag_size,
            });
        }

        let flags = self.buffer[4];
        self.header = Some(FlvHeader {
            version,
            has_audio: flags & 0x04 != 0,
            has_video: flags & 0x01 != 0,
        });

        self.buffer.advance(required);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::super::FlvTagSerializer;
    use super::*;

    fn serialized_stream() -> Vec<u8> {
        let mut serializer = FlvTagSerializer::new();
        serializer.serialize_file_header(&FlvHeader::new(true, true)).unwrap();
        serializer.serialize_avc_sequence_header(&[1, 0x42, 0, 0x1F]).unwrap();
        serializer.serialize_aac_frame(FlvTimestamp::new(0x0100_0000), &[5, 6]).unwrap();
        serializer.serialize_avc_end_of_sequence(FlvTimestamp::new(40)).unwrap();
        serializer.bytes().to_vec()
    }

    #[test]
    fn reads_all_tags_from_a_single_buffer() {
        let bytes = serialized_stream();
        let mut deserializer = FlvDeserializer::new();

        let first = deserializer.get_next_tag(&bytes).unwrap().unwrap();
        let second = deserializer.get_next_tag(&[]).unwrap().unwrap();
        let third = deserializer.get_next_tag(&[]).unwrap().unwrap();

        assert_eq!(deserializer.header(), Some(&FlvHeader::new(true, true)));
        assert_eq!(first.tag_type, FlvTagType::Video);
        assert_eq!(&first.body()[..], &[1, 0x42, 0, 0x1F]);
        assert_eq!(second.tag_type, FlvTagType::Audio);
        assert_eq!(second.timestamp, FlvTimestamp::new(0x0100_0000), "Extended timestamp bits were lost");
        assert_eq!(third.timestamp, FlvTimestamp::new(40));
        assert!(deserializer.get_next_tag(&[]).unwrap().is_none());
    }

    #[test]
    fn reads_tags_fed_one_byte_at_a_time() {
        let bytes = serialized_stream();
        let mut deserializer = FlvDeserializer::new();
        let mut tags = Vec::new();

        for byte in bytes.iter() {
            if let Some(tag) = deserializer.get_next_tag(&[*byte]).unwrap() {
                tags.push(tag);
            }
        }

        assert_eq!(tags.len(), 3);
    }

    #[test]
    fn invalid_signature_is_rejected() {
        let mut deserializer = FlvDeserializer::new();
        match deserializer.get_next_tag(b"FLX\x01\x05\x00\x00\x00\x09") {
            Err(FlvDeserializationError::InvalidSignature) => (),
            x => panic!("Unexpected result: {:?}", x),
        }
    }

    #[test]
    fn non_zero_size_before_first_tag_is_rejected() {
        let mut bytes = serialized_stream();
        bytes[12] = 7;

        let mut deserializer = FlvDeserializer::new();
        match deserializer.get_next_tag(&bytes) {
            Err(FlvDeserializationError::InvalidPreviousTagSize { expected: 0, actual: 7 }) => (),
            x => panic!("Unexpected result: {:?}", x),
        }
    }

    #[test]
    fn mismatched_previous_tag_size_is_rejected() {
        let mut bytes = serialized_stream();
        let index = 13 + TAG_HEADER_SIZE + 5 + 4 + 3;
        bytes[index] = 0xFF;

        let mut deserializer = FlvDeserializer::new();
        match deserializer.get_next_tag(&bytes) {
            Err(FlvDeserializationError::InvalidPreviousTagSize { expected: 20, actual: 0xFF }) => (),
            x => panic!("Unexpected result: {:?}", x),
        }
    }

    #[test]
    fn unknown_tag_type_is_rejected() {
        let mut bytes = serialized_stream();
        bytes[13] = 7;

        let mut deserializer = FlvDeserializer::new();
        match deserializer.get_next_tag(&bytes) {
            Err(FlvDeserializationError::UnknownTagType(7)) => (),
            x => panic!("Unexpected result: {:?}", x),
        }
    }
}
