use super::script_data::ScriptDataValue;
use super::{SOUND_FORMAT_AAC, VIDEO_CODEC_ID_AVC};

/// Contains the metadata information advertised in the `onMetaData` script tag
#[derive(PartialEq, Debug, Clone)]
pub struct FlvMetadata {
    pub video_width: u32,
    pub video_height: u32,
    pub video_frame_rate: f64,
    pub video_bitrate_kbps: u32,
    pub audio_sample_rate: u32,
    pub audio_channels: u32,
    pub audio_bitrate_kbps: u32,
    pub encoder: String,
}

impl FlvMetadata {
    /// The properties written into the `onMetaData` ECMA array.  `duration` and `filesize` are
    /// unknown while streaming and written as 0, to be patched on seekable sinks.
    pub fn to_properties(&self) -> Vec<(String, ScriptDataValue)> {
        let number = |value: f64| ScriptDataValue::Number(value);

        vec![
            ("duration".to_string(), number(0.0)),
            ("width".to_string(), number(self.video_width as f64)),
            ("height".to_string(), number(self.video_height as f64)),
            ("videodatarate".to_string(), number(self.video_bitrate_kbps as f64)),
            ("framerate".to_string(), number(self.video_frame_rate)),
            ("videocodecid".to_string(), number(VIDEO_CODEC_ID_AVC as f64)),
            ("audiodatarate".to_string(), number(self.audio_bitrate_kbps as f64)),
            ("audiosamplerate".to_string(), number(self.audio_sample_rate as f64)),
            ("audiosamplesize".to_string(), number(16.0)),
            ("stereo".to_string(), ScriptDataValue::Boolean(self.audio_channels == 2)),
            ("audiocodecid".to_string(), number(SOUND_FORMAT_AAC as f64)),
            ("encoder".to_string(), ScriptDataValue::String(self.encoder.clone())),
            ("filesize".to_string(), number(0.0)),
        ]
    }
}
