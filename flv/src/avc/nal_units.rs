use super::AvcError;
use std::convert::TryFrom;

const START_CODE: [u8; 3] = [0, 0, 1];

/// Returns true if the data starts with a 3 or 4 byte Annex-B start code
pub fn is_annex_b(data: &[u8]) -> bool {
    data.starts_with(&START_CODE) || data.starts_with(&[0, 0, 0, 1])
}

/// Iterates over the NAL units of an Annex-B byte stream, without their start codes
pub struct AnnexBNalUnits<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> AnnexBNalUnits<'a> {
    pub fn new(data: &'a [u8]) -> AnnexBNalUnits<'a> {
        let position = match find_start_code(data, 0) {
            Some(index) => index + START_CODE.len(),
            None => data.len(),
        };

        AnnexBNalUnits { data, position }
    }
}

impl<'a> Iterator for AnnexBNalUnits<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        while self.position < self.data.len() {
            let start = self.position;
            let next_code = find_start_code(self.data, start);
            let end = match next_code {
                // The zero in front of a 4 byte start code belongs to the code, not the NAL unit
                Some(index) if index > start && self.data[index - 1] == 0 => index - 1,
                Some(index) => index,
                None => self.data.len(),
            };

            self.position = match next_code {
                Some(index) => index + START_CODE.len(),
                None => self.data.len(),
            };

            if end > start {
                return Some(&self.data[start..end]);
            }
        }

        None
    }
}

/// Appends an Annex-B frame to `output` with every NAL unit prefixed by its 4 byte length.
///
/// Whether a stream is Annex-B is decided by its configuration data, never by sniffing frames:
/// a length prefixed NAL unit of 256 to 511 bytes starts with `00 00 01` too.
pub fn write_length_prefixed(frame: &[u8], output: &mut Vec<u8>) -> Result<(), AvcError> {
    let mut found = false;
    for nal_unit in AnnexBNalUnits::new(frame) {
        let length = u32::try_from(nal_unit.len())
            .map_err(|_| AvcError::NalUnitTooLarge { size: nal_unit.len() })?;

        output.extend_from_slice(&length.to_be_bytes());
        output.extend_from_slice(nal_unit);
        found = true;
    }

    if !found {
        return Err(AvcError::MissingStartCode);
    }

    Ok(())
}

fn find_start_code(data: &[u8], from: usize) -> Option<usize> {
    if from >= data.len() {
        return None;
    }

    data[from..]
        .windows(START_CODE.len())
        .position(|window| window == START_CODE)
        .map(|index| index + from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_both_start_code_lengths() {
        assert!(is_annex_b(&[0, 0, 1, 0x65]));
        assert!(is_annex_b(&[0, 0, 0, 1, 0x65]));
        assert!(!is_annex_b(&[0, 0, 0, 4, 0x65, 1, 2, 3]));
    }

    #[test]
    fn splits_nal_units_on_mixed_start_codes() {
        let data = [0, 0, 0, 1, 0x67, 1, 2, 0, 0, 1, 0x68, 3, 0, 0, 0, 1, 0x65, 4, 5];
        let units: Vec<&[u8]> = AnnexBNalUnits::new(&data).collect();

        assert_eq!(units, vec![&[0x67, 1, 2][..], &[0x68, 3][..], &[0x65, 4, 5][..]]);
    }

    #[test]
    fn empty_nal_units_are_skipped() {
        let data = [0, 0, 1, 0, 0, 1, 0x65, 9];
        let units: Vec<&[u8]> = AnnexBNalUnits::new(&data).collect();

        assert_eq!(units, vec![&[0x65, 9][..]]);
    }

    #[test]
    fn annex_b_frame_is_length_prefixed() {
        let frame = [0, 0, 0, 1, 0x06, 7, 0, 0, 1, 0x65, 1, 2, 3];
        let mut output = Vec::new();
        write_length_prefixed(&frame, &mut output).unwrap();

        assert_eq!(output, vec![0, 0, 0, 2, 0x06, 7, 0, 0, 0, 4, 0x65, 1, 2, 3]);
    }

    #[test]
    fn frame_without_start_code_is_rejected() {
        let frame = [0, 0, 0, 2, 0x65, 1];
        let mut output = vec![0xFF];

        assert_eq!(write_length_prefixed(&frame, &mut output), Err(AvcError::MissingStartCode));
        assert_eq!(output, vec![0xFF]);
    }
}
