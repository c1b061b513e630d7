/*!
This module contains the H.264 handling needed to carry AVC in FLV.

FLV carries H.264 as an `AVCDecoderConfigurationRecord` in the stream's sequence header, followed
by frames whose NAL units are each prefixed with their length.  Hardware encoders commonly emit
both the parameter sets and the frames in Annex-B form (NAL units separated by `00 00 01` start
codes), so this module converts between the two.
*/

mod decoder_configuration_record;
mod errors;
mod nal_units;

pub use self::decoder_configuration_record::DecoderConfigurationRecord;
pub use self::errors::AvcError;
pub use self::nal_units::{is_annex_b, write_length_prefixed, AnnexBNalUnits};

pub const NAL_UNIT_TYPE_SPS: u8 = 7;
pub const NAL_UNIT_TYPE_PPS: u8 = 8;

/// Returns the `nal_unit_type` of a NAL unit
pub fn nal_unit_type(nal_unit: &[u8]) -> Option<u8> {
    nal_unit.first().map(|header| header & 0x1F)
}
