use super::{is_annex_b, nal_unit_type, AnnexBNalUnits, AvcError};
use super::{NAL_UNIT_TYPE_PPS, NAL_UNIT_TYPE_SPS};
use bytes::Bytes;
use std::convert::TryFrom;

const CONFIGURATION_VERSION: u8 = 1;
const MAX_SPS_COUNT: usize = 31;
const NAL_LENGTH_SIZE: u8 = 4;

/// The `AVCDecoderConfigurationRecord` (ISO/IEC 14496-15) carried in the AVC sequence header tag
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct DecoderConfigurationRecord {
    pub profile_indication: u8,
    pub profile_compatibility: u8,
    pub level_indication: u8,

    /// How many bytes prefix each NAL unit in the frames that follow
    pub nal_length_size: u8,
    pub sequence_parameter_sets: Vec<Bytes>,
    pub picture_parameter_sets: Vec<Bytes>,
}

impl DecoderConfigurationRecord {
    /// Builds a record from the configuration data an encoder hands out, which is either a
    /// complete record already or the Annex-B SPS and PPS NAL units.
    pub fn from_configuration_data(data: &[u8]) -> Result<DecoderConfigurationRecord, AvcError> {
        match data.first() {
            None => Err(AvcError::EmptyConfiguration),
            Some(&CONFIGURATION_VERSION) => DecoderConfigurationRecord::parse(data),
            Some(_) if is_annex_b(data) => DecoderConfigurationRecord::from_annex_b(data),
            Some(_) => Err(AvcError::UnrecognizedConfiguration),
        }
    }

    /// Collects the parameter sets out of Annex-B NAL units
    pub fn from_annex_b(data: &[u8]) -> Result<DecoderConfigurationRecord, AvcError> {
        let mut sequence_parameter_sets = Vec::new();
        let mut picture_parameter_sets = Vec::new();
        for nal_unit in AnnexBNalUnits::new(data) {
            match nal_unit_type(nal_unit) {
                Some(NAL_UNIT_TYPE_SPS) => sequence_parameter_sets.push(Bytes::copy_from_slice(nal_unit)),
                Some(NAL_UNIT_TYPE_PPS) => picture_parameter_sets.push(Bytes::copy_from_slice(nal_unit)),
                _ => (),
            }
        }

        let sps = match sequence_parameter_sets.first() {
            Some(sps) => sps,
            None => return Err(AvcError::MissingSps),
        };

        if sps.len() < 4 {
            return Err(AvcError::TruncatedSps(sps.len()));
        }

        if picture_parameter_sets.is_empty() {
            return Err(AvcError::MissingPps);
        }

        let (profile_indication, profile_compatibility, level_indication) = (sps[1], sps[2], sps[3]);
        Ok(DecoderConfigurationRecord {
            profile_indication,
            profile_compatibility,
            level_indication,
            nal_length_size: NAL_LENGTH_SIZE,
            sequence_parameter_sets,
            picture_parameter_sets,
        })
    }

    /// Reads a serialized record
    pub fn parse(data: &[u8]) -> Result<DecoderConfigurationRecord, AvcError> {
        if data.len() < 7 {
            return Err(AvcError::TruncatedRecord);
        }

        let mut position = 5;
        let sps_count = (data[position] & 0x1F) as usize;
        position += 1;
        let sequence_parameter_sets = read_parameter_sets(data, &mut position, sps_count)?;

        let pps_count = *data.get(position).ok_or(AvcError::TruncatedRecord)? as usize;
        position += 1;
        let picture_parameter_sets = read_parameter_sets(data, &mut position, pps_count)?;

        Ok(DecoderConfigurationRecord {
            profile_indication: data[1],
            profile_compatibility: data[2],
            level_indication: data[3],
            nal_length_size: (data[4] & 0x03) + 1,
            sequence_parameter_sets,
            picture_parameter_sets,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, AvcError> {
        if self.sequence_parameter_sets.len() > MAX_SPS_COUNT {
            return Err(AvcError::TooManyParameterSets {
                count: self.sequence_parameter_sets.len(),
            });
        }

        let pps_count = u8::try_from(self.picture_parameter_sets.len()).map_err(|_| {
            AvcError::TooManyParameterSets {
                count: self.picture_parameter_sets.len(),
            }
        })?;

        let mut bytes = vec![
            CONFIGURATION_VERSION,
            self.profile_indication,
            self.profile_compatibility,
            self.level_indication,
            0xFC | ((self.nal_length_size.max(1) - 1) & 0x03),
            0xE0 | self.sequence_parameter_sets.len() as u8,
        ];

        write_parameter_sets(&self.sequence_parameter_sets, &mut bytes)?;
        bytes.push(pps_count);
        write_parameter_sets(&self.picture_parameter_sets, &mut bytes)?;

        Ok(bytes)
    }
}

fn read_parameter_sets(data: &[u8], position: &mut usize, count: usize) -> Result<Vec<Bytes>, AvcError> {
    let mut sets = Vec::with_capacity(count);
    for _ in 0..count {
        if *position + 2 > data.len() {
            return Err(AvcError::TruncatedRecord);
        }

        let length = u16::from_be_bytes([data[*position], data[*position + 1]]) as usize;
        *position += 2;
        if *position + length > data.len() {
            return Err(AvcError::TruncatedRecord);
        }

        sets.push(Bytes::copy_from_slice(&data[*position..*position + length]));
        *position += length;
    }

    Ok(sets)
}

fn write_parameter_sets(sets: &[Bytes], bytes: &mut Vec<u8>) -> Result<(), AvcError> {
    for set in sets {
        let length = u16::try_from(set.len()).map_err(|_| AvcError::NalUnitTooLarge { size: set.len() })?;
        bytes.extend_from_slice(&length.to_be_bytes());
        bytes.extend_from_slice(set);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{annex_b_parameter_sets, TEST_PPS, TEST_SPS};

    #[test]
    fn builds_record_from_annex_b_parameter_sets() {
        let record = DecoderConfigurationRecord::from_configuration_data(&annex_b_parameter_sets()).unwrap();

        assert_eq!(record.profile_indication, TEST_SPS[1]);
        assert_eq!(record.profile_compatibility, TEST_SPS[2]);
        assert_eq!(record.level_indication, TEST_SPS[3]);
        assert_eq!(record.nal_length_size, 4);
        assert_eq!(record.sequence_parameter_sets, vec![Bytes::from_static(TEST_SPS)]);
        assert_eq!(record.picture_parameter_sets, vec![Bytes::from_static(TEST_PPS)]);
    }

    #[test]
    fn serialized_record_has_expected_layout() {
        let record = DecoderConfigurationRecord::from_annex_b(&annex_b_parameter_sets()).unwrap();
        let bytes = record.to_bytes().unwrap();

        let mut expected = vec![1, TEST_SPS[1], TEST_SPS[2], TEST_SPS[3], 0xFF, 0xE1];
        expected.extend_from_slice(&(TEST_SPS.len() as u16).to_be_bytes());
        expected.extend_from_slice(TEST_SPS);
        expected.push(1);
        expected.extend_from_slice(&(TEST_PPS.len() as u16).to_be_bytes());
        expected.extend_from_slice(TEST_PPS);

        assert_eq!(bytes, expected);
    }

    #[test]
    fn existing_record_is_parsed_back() {
        let record = DecoderConfigurationRecord::from_annex_b(&annex_b_parameter_sets()).unwrap();
        let bytes = record.to_bytes().unwrap();

        assert_eq!(DecoderConfigurationRecord::from_configuration_data(&bytes), Ok(record));
    }

    #[test]
    fn missing_pps_is_rejected() {
        let mut data = vec![0, 0, 0, 1];
        data.extend_from_slice(TEST_SPS);

        assert_eq!(DecoderConfigurationRecord::from_annex_b(&data), Err(AvcError::MissingPps));
    }

    #[test]
    fn missing_sps_is_rejected() {
        let mut data = vec![0, 0, 0, 1];
        data.extend_from_slice(TEST_PPS);

        assert_eq!(DecoderConfigurationRecord::from_annex_b(&data), Err(AvcError::MissingSps));
    }

    #[test]
    fn unrecognized_data_is_rejected() {
        assert_eq!(
            DecoderConfigurationRecord::from_configuration_data(&[0x67, 0x42]),
            Err(AvcError::UnrecognizedConfiguration)
        );
        assert_eq!(
            DecoderConfigurationRecord::from_configuration_data(&[]),
            Err(AvcError::EmptyConfiguration)
        );
    }

    #[test]
    fn truncated_record_is_rejected() {
        assert_eq!(
            DecoderConfigurationRecord::parse(&[1, 0x42, 0, 0x1F, 0xFF, 0xE1, 0, 10, 0x67]),
            Err(AvcError::TruncatedRecord)
        );
    }
}
