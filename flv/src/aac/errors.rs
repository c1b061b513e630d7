use thiserror::Error;

/// An enumeration defining all the ways an ADTS framed packet can fail normalization
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum AdtsError {
    /// The packet does not start with the 12 bit ADTS sync word (`0xFFF`)
    #[error("Packet does not start with an ADTS sync word")]
    MissingSyncWord,

    /// The packet ended before a complete ADTS header could be read
    #[error("Packet of {size} bytes is too short for a {required} byte ADTS header")]
    HeaderTooShort { size: usize, required: usize },

    /// The frame length field declared a frame smaller than its own header
    #[error("ADTS frame length of {frame_length} bytes is smaller than its {header_length} byte header")]
    InvalidFrameLength {
        frame_length: usize,
        header_length: usize,
    },

    /// The frame length field points past the end of the packet
    #[error("ADTS frame length of {frame_length} bytes exceeds the {packet_size} byte packet")]
    FrameLengthExceedsPacket {
        frame_length: usize,
        packet_size: usize,
    },

    /// The packet carries more trailing data after the frame than an ADTS header could account
    /// for, so the packet size and the ADTS framing disagree
    #[error("Packet size of {packet_size} bytes disagrees with the ADTS frame length of {frame_length} bytes")]
    SizeMismatch {
        frame_length: usize,
        packet_size: usize,
    },

    /// Sampling frequency indexes 13 and up are reserved or escape values
    #[error("Sampling frequency index {0} is not supported")]
    UnsupportedSamplingFrequencyIndex(u8),

    /// Channel configuration 0 means the layout is signalled in a program config element,
    /// which cannot be expressed in a 2 byte AudioSpecificConfig
    #[error("Channel configuration {0} is not supported")]
    UnsupportedChannelConfiguration(u8),

    /// More than one raw data block with CRC protection present cannot be unpacked into a
    /// single raw frame
    #[error("ADTS frames with {0} raw data blocks and CRC protection are not supported")]
    MultipleRawDataBlocks(u8),
}
