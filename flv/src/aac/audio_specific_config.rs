use super::SAMPLING_FREQUENCIES;

/// The 2 byte AAC `AudioSpecificConfig` descriptor carried in FLV's AAC sequence header
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct AudioSpecificConfig {
    /// MPEG-4 audio object type (2 for AAC LC)
    pub object_type: u8,
    pub sampling_frequency_index: u8,
    pub channel_configuration: u8,
}

impl AudioSpecificConfig {
    /// Encodes the descriptor as `object_type(5) | frequency_index(4) | channels(4) | 000`
    pub fn to_bytes(&self) -> [u8; 2] {
        let value = ((self.object_type as u16 & 0x1F) << 11)
            | ((self.sampling_frequency_index as u16 & 0x0F) << 7)
            | ((self.channel_configuration as u16 & 0x0F) << 3);

        value.to_be_bytes()
    }

    /// Reads the leading fields of an AudioSpecificConfig.  Escaped object types and explicit
    /// frequencies are not supported and return `None`.
    pub fn from_bytes(bytes: &[u8]) -> Option<AudioSpecificConfig> {
        if bytes.len() < 2 {
            return None;
        }

        let value = u16::from_be_bytes([bytes[0], bytes[1]]);
        let config = AudioSpecificConfig {
            object_type: (value >> 11) as u8,
            sampling_frequency_index: ((value >> 7) & 0x0F) as u8,
            channel_configuration: ((value >> 3) & 0x0F) as u8,
        };

        if config.object_type == 0 || config.object_type == 31 {
            return None;
        }

        config.sample_rate().map(|_| config)
    }

    pub fn sample_rate(&self) -> Option<u32> {
        SAMPLING_FREQUENCIES
            .get(self.sampling_frequency_index as usize)
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::AudioSpecificConfig;

    #[test]
    fn aac_lc_44100_mono_encodes_to_known_bytes() {
        let config = AudioSpecificConfig {
            object_type: 2,
            sampling_frequency_index: 4,
            channel_configuration: 1,
        };

        assert_eq!(config.to_bytes(), [0x12, 0x08]);
        assert_eq!(config.sample_rate(), Some(44100));
    }

    #[test]
    fn aac_lc_48000_stereo_encodes_to_known_bytes() {
        let config = AudioSpecificConfig {
            object_type: 2,
            sampling_frequency_index: 3,
            channel_configuration: 2,
        };

        assert_eq!(config.to_bytes(), [0x11, 0x90]);
        assert_eq!(AudioSpecificConfig::from_bytes(&[0x11, 0x90]), Some(config));
    }

    #[test]
    fn reserved_frequency_index_is_not_readable() {
        // object type 2, frequency index 13
        assert_eq!(AudioSpecificConfig::from_bytes(&[0x16, 0x88]), None);
        assert_eq!(AudioSpecificConfig::from_bytes(&[0x12]), None);
    }
}
