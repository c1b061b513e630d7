use super::{AdtsError, AudioSpecificConfig, SAMPLING_FREQUENCIES};

const SYNC_WORD: u16 = 0xFFF;
const HEADER_LENGTH: usize = 7;
const HEADER_LENGTH_WITH_CRC: usize = 9;

/// The fields of an ADTS header that matter when unwrapping a frame
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct AdtsHeader {
    /// `true` when the header is not followed by a 16 bit CRC
    pub protection_absent: bool,

    /// The ADTS profile field, which is the MPEG-4 object type minus one
    pub profile: u8,
    pub sampling_frequency_index: u8,
    pub channel_configuration: u8,

    /// Length of the whole frame, header included
    pub frame_length: usize,

    /// Number of raw data blocks in the frame, minus one
    pub raw_data_blocks: u8,
}

impl AdtsHeader {
    /// Parses the ADTS header at the start of `bytes`
    pub fn parse(bytes: &[u8]) -> Result<AdtsHeader, AdtsError> {
        if bytes.len() < 2 {
            return Err(AdtsError::HeaderTooShort {
                size: bytes.len(),
                required: HEADER_LENGTH,
            });
        }

        if (u16::from_be_bytes([bytes[0], bytes[1]]) >> 4) != SYNC_WORD {
            return Err(AdtsError::MissingSyncWord);
        }

        let protection_absent = bytes[1] & 0x01 == 1;
        let required = if protection_absent {
            HEADER_LENGTH
        } else {
            HEADER_LENGTH_WITH_CRC
        };

        if bytes.len() < required {
            return Err(AdtsError::HeaderTooShort {
                size: bytes.len(),
                required,
            });
        }

        let header = AdtsHeader {
            protection_absent,
            profile: bytes[2] >> 6,
            sampling_frequency_index: (bytes[2] >> 2) & 0x0F,
            channel_configuration: ((bytes[2] & 0x01) << 2) | (bytes[3] >> 6),
            frame_length: (((bytes[3] & 0x03) as usize) << 11)
                | ((bytes[4] as usize) << 3)
                | ((bytes[5] >> 5) as usize),
            raw_data_blocks: bytes[6] & 0x03,
        };

        if header.sampling_frequency_index as usize >= SAMPLING_FREQUENCIES.len() {
            return Err(AdtsError::UnsupportedSamplingFrequencyIndex(
                header.sampling_frequency_index,
            ));
        }

        if header.channel_configuration == 0 {
            return Err(AdtsError::UnsupportedChannelConfiguration(0));
        }

        if header.frame_length < header.header_length() {
            return Err(AdtsError::InvalidFrameLength {
                frame_length: header.frame_length,
                header_length: header.header_length(),
            });
        }

        if !header.protection_absent && header.raw_data_blocks > 0 {
            return Err(AdtsError::MultipleRawDataBlocks(header.raw_data_blocks + 1));
        }

        Ok(header)
    }

    /// Size of the header itself, 9 bytes when a CRC follows the fixed fields
    pub fn header_length(&self) -> usize {
        if self.protection_absent {
            HEADER_LENGTH
        } else {
            HEADER_LENGTH_WITH_CRC
        }
    }

    pub fn sample_rate(&self) -> u32 {
        SAMPLING_FREQUENCIES[self.sampling_frequency_index as usize]
    }

    /// The configuration this header describes, as FLV's AAC sequence header carries it
    pub fn audio_specific_config(&self) -> AudioSpecificConfig {
        AudioSpecificConfig {
            object_type: self.profile + 1,
            sampling_frequency_index: self.sampling_frequency_index,
            channel_configuration: self.channel_configuration,
        }
    }
}

/// A raw AAC frame unwrapped from its ADTS framing.  The payload borrows from the packet
/// that was normalized and lives no longer than it.
#[derive(Debug, PartialEq, Eq)]
pub struct AacFrame<'a> {
    pub header: AdtsHeader,
    pub payload: &'a [u8],
}

impl<'a> AacFrame<'a> {
    pub fn audio_specific_config(&self) -> AudioSpecificConfig {
        self.header.audio_specific_config()
    }
}

/// Validates the ADTS header at the start of `packet` and returns the raw frame behind it.
///
/// The ADTS frame length field is trusted over the packet length for locating the end of the
/// frame.  Trailing bytes are tolerated as long as they could not hold another ADTS header,
/// anything beyond that means the packet and its framing disagree.
pub fn normalize_adts(packet: &[u8]) -> Result<AacFrame, AdtsError> {
    let header = AdtsHeader::parse(packet)?;

    if header.frame_length > packet.len() {
        return Err(AdtsError::FrameLengthExceedsPacket {
            frame_length: header.frame_length,
            packet_size: packet.len(),
        });
    }

    if packet.len() - header.frame_length > header.header_length() {
        return Err(AdtsError::SizeMismatch {
            frame_length: header.frame_length,
            packet_size: packet.len(),
        });
    }

    Ok(AacFrame {
        header,
        payload: &packet[header.header_length()..header.frame_length],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::adts_frame;

    #[test]
    fn strips_header_from_frame_without_crc() {
        let packet = adts_frame(4, 1, &[1, 2, 3, 4, 5]);
        let frame = normalize_adts(&packet).unwrap();

        assert_eq!(frame.payload, &[1, 2, 3, 4, 5]);
        assert_eq!(frame.header.frame_length, 12);
        assert_eq!(frame.header.header_length(), 7);
        assert_eq!(frame.header.sample_rate(), 44100);
    }

    #[test]
    fn strips_header_and_crc_from_protected_frame() {
        let mut packet = adts_frame(3, 2, &[0xAA, 0xBB, 1, 2, 3]);
        packet[1] &= 0xFE;

        let frame = normalize_adts(&packet).unwrap();
        assert_eq!(frame.payload, &[1, 2, 3]);
        assert_eq!(frame.payload.len(), frame.header.frame_length - 9);
    }

    #[test]
    fn derives_audio_specific_config() {
        let packet = adts_frame(4, 1, &[0; 16]);
        let frame = normalize_adts(&packet).unwrap();

        assert_eq!(frame.audio_specific_config().to_bytes(), [0x12, 0x08]);
    }

    #[test]
    fn missing_sync_word_is_rejected() {
        let mut packet = adts_frame(4, 1, &[0; 16]);
        packet[1] = 0x0F;

        assert_eq!(normalize_adts(&packet), Err(AdtsError::MissingSyncWord));
        assert_eq!(normalize_adts(&[0x21, 0x10, 0x05]), Err(AdtsError::MissingSyncWord));
    }

    #[test]
    fn truncated_header_is_rejected() {
        let packet = adts_frame(4, 1, &[0; 16]);

        match normalize_adts(&packet[..5]) {
            Err(AdtsError::HeaderTooShort { size: 5, required: 7 }) => (),
            x => panic!("Unexpected result: {:?}", x),
        }
    }

    #[test]
    fn frame_length_past_packet_end_is_rejected() {
        let packet = adts_frame(4, 1, &[0; 16]);

        match normalize_adts(&packet[..20]) {
            Err(AdtsError::FrameLengthExceedsPacket { frame_length: 23, packet_size: 20 }) => (),
            x => panic!("Unexpected result: {:?}", x),
        }
    }

    #[test]
    fn trailing_bytes_within_a_header_length_are_tolerated() {
        let mut packet = adts_frame(4, 1, &[9; 10]);
        packet.extend_from_slice(&[0; 7]);

        let frame = normalize_adts(&packet).unwrap();
        assert_eq!(frame.payload, &[9; 10]);
    }

    #[test]
    fn trailing_bytes_beyond_a_header_length_are_a_size_mismatch() {
        let mut packet = adts_frame(4, 1, &[9; 10]);
        packet.extend_from_slice(&[0; 8]);

        match normalize_adts(&packet) {
            Err(AdtsError::SizeMismatch { frame_length: 17, packet_size: 25 }) => (),
            x => panic!("Unexpected result: {:?}", x),
        }
    }

    #[test]
    fn reserved_sampling_frequency_is_rejected() {
        let packet = adts_frame(13, 1, &[0; 4]);
        assert_eq!(
            normalize_adts(&packet),
            Err(AdtsError::UnsupportedSamplingFrequencyIndex(13))
        );
    }

    #[test]
    fn program_config_element_layouts_are_rejected() {
        let packet = adts_frame(4, 0, &[0; 4]);
        assert_eq!(
            normalize_adts(&packet),
            Err(AdtsError::UnsupportedChannelConfiguration(0))
        );
    }

    #[test]
    fn frame_length_shorter_than_header_is_rejected() {
        let mut packet = adts_frame(4, 1, &[0; 4]);
        // frame length of 3
        packet[3] &= 0xFC;
        packet[4] = 0;
        packet[5] = (packet[5] & 0x1F) | (3 << 5);

        match normalize_adts(&packet) {
            Err(AdtsError::InvalidFrameLength { frame_length: 3, header_length: 7 }) => (),
            x => panic!("Unexpected result: {:?}", x),
        }
    }

    #[test]
    fn multiple_raw_data_blocks_with_crc_are_rejected() {
        let mut packet = adts_frame(4, 1, &[0; 8]);
        packet[1] &= 0xFE;
        packet[6] |= 0x01;

        assert_eq!(normalize_adts(&packet), Err(AdtsError::MultipleRawDataBlocks(2)));
    }
}
