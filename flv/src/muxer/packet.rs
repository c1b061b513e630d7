use super::registry::StreamKind;

/// An encoded access unit handed to the session.
///
/// The payload is borrowed from the caller and is only read during the `write_packet()` call
/// it is passed to.
#[derive(Debug, Clone, Copy)]
pub struct Packet<'a> {
    pub kind: StreamKind,
    pub data: &'a [u8],

    /// How many bytes of `data` the encoder filled in
    pub size: usize,

    /// Presentation timestamp in device clock units
    pub pts: i64,

    /// Decode timestamp in device clock units.  When absent the rescaled presentation timestamp
    /// is used.
    pub dts: Option<i64>,
    pub is_key_frame: bool,
}

impl<'a> Packet<'a> {
    pub fn video(data: &'a [u8], pts: i64, is_key_frame: bool) -> Packet<'a> {
        Packet {
            kind: StreamKind::Video,
            data,
            size: data.len(),
            pts,
            dts: None,
            is_key_frame,
        }
    }

    /// Audio packets are all treated as key frames
    pub fn audio(data: &'a [u8], pts: i64) -> Packet<'a> {
        Packet {
            kind: StreamKind::Audio,
            data,
            size: data.len(),
            pts,
            dts: None,
            is_key_frame: true,
        }
    }

    pub fn with_dts(self, dts: i64) -> Packet<'a> {
        Packet { dts: Some(dts), ..self }
    }

    pub fn with_size(self, size: usize) -> Packet<'a> {
        Packet { size, ..self }
    }

    /// The filled in part of the buffer, or `None` when `size` exceeds it
    pub fn payload(&self) -> Option<&'a [u8]> {
        self.data.get(..self.size)
    }
}
