/*!
This module contains the AAC bitstream handling needed to carry AAC in FLV.

Hardware encoders frequently emit AAC framed as ADTS, where every frame carries its own header
describing the codec configuration.  FLV (and RTMP) instead expect raw AAC frames, with the
configuration sent once as an `AudioSpecificConfig` in the stream's sequence header.
`normalize_adts()` validates and strips the ADTS header of a single packet and exposes the
configuration it describes.
*/

mod adts;
mod audio_specific_config;
mod errors;

pub use self::adts::{normalize_adts, AacFrame, AdtsHeader};
pub use self::audio_specific_config::AudioSpecificConfig;
pub use self::errors::AdtsError;

/// Sample rates addressed by the 4 bit sampling frequency index
pub const SAMPLING_FREQUENCIES: [u32; 13] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350,
];
