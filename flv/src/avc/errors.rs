use thiserror::Error;

/// Errors raised while turning H.264 configuration data or frames into their FLV framing
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum AvcError {
    #[error("No H.264 configuration data was provided")]
    EmptyConfiguration,

    /// The data is neither an AVCDecoderConfigurationRecord nor Annex-B NAL units
    #[error("Configuration data is not an AVCDecoderConfigurationRecord or Annex-B NAL units")]
    UnrecognizedConfiguration,

    #[error("Annex-B configuration data did not contain a sequence parameter set")]
    MissingSps,

    #[error("Annex-B configuration data did not contain a picture parameter set")]
    MissingPps,

    /// A sequence parameter set must carry at least the profile, constraint and level bytes
    #[error("Sequence parameter set of {0} bytes is too short")]
    TruncatedSps(usize),

    #[error("AVCDecoderConfigurationRecord ended unexpectedly")]
    TruncatedRecord,

    #[error("Too many parameter sets ({count}) to fit an AVCDecoderConfigurationRecord")]
    TooManyParameterSets { count: usize },

    /// A frame of an Annex-B stream did not contain a single start code
    #[error("Frame of an Annex-B stream has no start code")]
    MissingStartCode,

    #[error("NAL unit of {size} bytes is too large for its length field")]
    NalUnitTooLarge { size: usize },
}
