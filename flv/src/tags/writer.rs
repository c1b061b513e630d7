use super::metadata::FlvMetadata;
use super::script_data::ScriptDataValue;
use super::serializer::FlvTagSerializer;
use super::{FlvHeader, FlvSerializationError};
use crate::avc::{is_annex_b, DecoderConfigurationRecord};
use crate::sink::OutputSink;
use crate::time::FlvTimestamp;
use std::collections::HashMap;
use std::io;
use tracing::{debug, warn};

const METADATA_NAME: &str = "onMetaData";
const DURATION_PROPERTY: &str = "duration";
const FILE_SIZE_PROPERTY: &str = "filesize";

/// Drives an output sink with a complete FLV stream.
///
/// The writer owns the sink and keeps the little bit of state the container needs across tags:
/// whether frames must be converted from Annex-B, whether the AAC sequence header went out yet,
/// the last video timestamp for the end of sequence tag, and where the metadata values that get
/// patched at the end were written.
pub struct FlvWriter<S: OutputSink> {
    sink: S,
    serializer: FlvTagSerializer,
    sink_open: bool,
    header_written: bool,
    annex_b: bool,
    audio_sequence_header_written: bool,
    last_video_timestamp: FlvTimestamp,
    max_timestamp: u32,
    bytes_written: u64,
    metadata_positions: HashMap<String, u64>,
}

impl<S: OutputSink> FlvWriter<S> {
    pub fn new(sink: S) -> FlvWriter<S> {
        FlvWriter {
            sink,
            serializer: FlvTagSerializer::new(),
            sink_open: false,
            header_written: false,
            annex_b: false,
            audio_sequence_header_written: false,
            last_video_timestamp: FlvTimestamp::new(0),
            max_timestamp: 0,
            bytes_written: 0,
            metadata_positions: HashMap::new(),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Total bytes handed to the sink so far
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn header_written(&self) -> bool {
        self.header_written
    }

    pub fn open_sink(&mut self) -> io::Result<()> {
        self.sink.open()?;
        self.sink_open = true;
        Ok(())
    }

    /// Writes the file header, the `onMetaData` tag and the codec sequence headers.
    ///
    /// The video configuration is required and may either be an AVCDecoderConfigurationRecord
    /// or Annex-B parameter sets.  The AAC sequence header is only written here when audio
    /// configuration is known up front, otherwise it goes out with the first audio frame.
    pub fn write_header(
        &mut self,
        metadata: &FlvMetadata,
        video_configuration: &[u8],
        audio_configuration: Option<&[u8]>,
    ) -> Result<(), FlvSerializationError> {
        if !self.sink_open {
            return Err(FlvSerializationError::SinkNotOpen);
        }

        let record = DecoderConfigurationRecord::from_configuration_data(video_configuration)?;
        let record_bytes = record.to_bytes()?;
        let annex_b = is_annex_b(video_configuration);

        self.serializer.clear();
        self.serializer.serialize_file_header(&FlvHeader::new(true, true))?;
        let positions = self
            .serializer
            .serialize_script_tag(METADATA_NAME, &ScriptDataValue::EcmaArray(metadata.to_properties()))?;

        self.serializer.serialize_avc_sequence_header(&record_bytes)?;
        if let Some(configuration) = audio_configuration {
            self.serializer
                .serialize_aac_sequence_header(FlvTimestamp::new(0), configuration)?;
        }

        let start = self.bytes_written;
        self.flush_serializer()?;

        self.metadata_positions = positions
            .into_iter()
            .map(|(name, position)| (name, start + position as u64))
            .collect();

        self.annex_b = annex_b;
        self.audio_sequence_header_written = audio_configuration.is_some();
        self.header_written = true;

        debug!(
            annex_b,
            profile = record.profile_indication,
            level = record.level_indication,
            bytes = self.bytes_written,
            "FLV header written"
        );

        Ok(())
    }

    /// Writes one H.264 frame and returns how many bytes went to the sink
    pub fn write_video(
        &mut self,
        timestamp_ms: i64,
        composition_time_ms: i64,
        is_key_frame: bool,
        frame: &[u8],
    ) -> Result<usize, FlvSerializationError> {
        self.ensure_header_written()?;

        let timestamp = FlvTimestamp::from_millis(timestamp_ms);
        self.serializer.clear();
        self.serializer.serialize_avc_frame(
            timestamp,
            composition_time_ms,
            is_key_frame,
            frame,
            self.annex_b,
        )?;

        let written = self.flush_serializer()?;
        self.last_video_timestamp = timestamp;
        self.track_timestamp(timestamp);
        Ok(written)
    }

    /// Writes one raw AAC frame and returns how many bytes went to the sink.  If no AAC sequence
    /// header was written yet, `configuration` is written as one in front of the frame.
    pub fn write_audio(
        &mut self,
        timestamp_ms: i64,
        frame: &[u8],
        configuration: Option<&[u8]>,
    ) -> Result<usize, FlvSerializationError> {
        self.ensure_header_written()?;

        let timestamp = FlvTimestamp::from_millis(timestamp_ms);
        self.serializer.clear();

        let mut writes_sequence_header = false;
        if !self.audio_sequence_header_written {
            if let Some(configuration) = configuration {
                self.serializer
                    .serialize_aac_sequence_header(timestamp, configuration)?;
                writes_sequence_header = true;
            }
        }

        self.serializer.serialize_aac_frame(timestamp, frame)?;

        let written = self.flush_serializer()?;
        if writes_sequence_header {
            self.audio_sequence_header_written = true;
            debug!(timestamp = timestamp.value, "AAC sequence header written");
        }

        self.track_timestamp(timestamp);
        Ok(written)
    }

    /// Ends the stream with an AVC end of sequence tag, patches `duration` and `filesize` when
    /// the sink can seek back, and flushes.
    pub fn write_trailer(&mut self) -> Result<(), FlvSerializationError> {
        self.ensure_header_written()?;

        self.serializer.clear();
        self.serializer
            .serialize_avc_end_of_sequence(self.last_video_timestamp)?;
        self.flush_serializer()?;

        let duration = self.max_timestamp as f64 / 1000.0;
        let file_size = self.bytes_written as f64;
        let patched = self.patch_metadata(DURATION_PROPERTY, duration)?
            && self.patch_metadata(FILE_SIZE_PROPERTY, file_size)?;

        if !patched {
            debug!("Sink does not support seeking, duration and filesize left unset");
        }

        self.sink.flush()?;
        Ok(())
    }

    /// Releases the sink
    pub fn close(&mut self) -> io::Result<()> {
        if !self.sink_open {
            return Ok(());
        }

        self.sink_open = false;
        self.sink.close()
    }

    fn patch_metadata(&mut self, name: &str, value: f64) -> Result<bool, FlvSerializationError> {
        let position = match self.metadata_positions.get(name) {
            Some(position) => *position,
            None => {
                warn!(property = name, "Metadata property position unknown, cannot patch it");
                return Ok(false);
            }
        };

        Ok(self.sink.overwrite_at(position, &value.to_be_bytes())?)
    }

    fn ensure_header_written(&self) -> Result<(), FlvSerializationError> {
        if !self.sink_open || !self.header_written {
            return Err(FlvSerializationError::SinkNotOpen);
        }

        Ok(())
    }

    fn track_timestamp(&mut self, timestamp: FlvTimestamp) {
        if timestamp > self.max_timestamp {
            self.max_timestamp = timestamp.value;
        }
    }

    fn flush_serializer(&mut self) -> Result<usize, FlvSerializationError> {
        let length = self.serializer.len();
        self.sink.write_all(self.serializer.bytes())?;
        self.bytes_written += length as u64;
        self.serializer.clear();
        Ok(length)
    }
}

#[cfg(test)]
mod tests {
    use super::super::{FlvDeserializer, FlvTagType};
    use super::*;
    use crate::avc::AvcError;
    use crate::sink::{MemorySink, StreamSink};
    use crate::test_utils::{annex_b_parameter_sets, read_tags};

    fn metadata() -> FlvMetadata {
        FlvMetadata {
            video_width: 1280,
            video_height: 720,
            video_frame_rate: 30.0,
            video_bitrate_kbps: 2500,
            audio_sample_rate: 44100,
            audio_channels: 1,
            audio_bitrate_kbps: 128,
            encoder: "test".to_string(),
        }
    }

    fn open_writer(sink: MemorySink) -> FlvWriter<MemorySink> {
        let mut writer = FlvWriter::new(sink);
        writer.open_sink().unwrap();
        writer
    }

    #[test]
    fn header_is_written_with_metadata_and_sequence_headers() {
        let sink = MemorySink::new();
        let mut writer = open_writer(sink.clone());
        writer
            .write_header(&metadata(), &annex_b_parameter_sets(), Some(&[0x12, 0x08]))
            .unwrap();

        let (header, tags) = read_tags(&sink.contents());
        assert!(header.has_audio && header.has_video);
        assert_eq!(tags.len(), 3);
        assert_eq!(tags[0].tag_type, FlvTagType::ScriptData);
        assert_eq!(tags[1].tag_type, FlvTagType::Video);
        assert_eq!(tags[1].body()[0], 1, "Video sequence header should be a decoder configuration record");
        assert_eq!(&tags[2].body()[..], &[0x12, 0x08]);
        assert_eq!(writer.bytes_written(), sink.contents().len() as u64);
    }

    #[test]
    fn header_requires_open_sink() {
        let mut writer = FlvWriter::new(MemorySink::new());
        match writer.write_header(&metadata(), &annex_b_parameter_sets(), None) {
            Err(FlvSerializationError::SinkNotOpen) => (),
            x => panic!("Unexpected result: {:?}", x),
        }
    }

    #[test]
    fn audio_sequence_header_is_written_once_before_first_frame() {
        let sink = MemorySink::new();
        let mut writer = open_writer(sink.clone());
        writer.write_header(&metadata(), &annex_b_parameter_sets(), None).unwrap();
        writer.write_audio(0, &[1, 2], Some(&[0x12, 0x08])).unwrap();
        writer.write_audio(23, &[3, 4], Some(&[0x12, 0x08])).unwrap();

        let (_, tags) = read_tags(&sink.contents());
        let audio: Vec<_> = tags.iter().filter(|t| t.tag_type == FlvTagType::Audio).collect();
        assert_eq!(audio.len(), 3);
        assert_eq!(&audio[0].body()[..], &[0x12, 0x08]);
        assert_eq!(&audio[1].body()[..], &[1, 2]);
        assert_eq!(&audio[2].body()[..], &[3, 4]);
        assert_eq!(audio[2].timestamp, FlvTimestamp::new(23));
    }

    #[test]
    fn annex_b_frames_are_length_prefixed() {
        let sink = MemorySink::new();
        let mut writer = open_writer(sink.clone());
        writer.write_header(&metadata(), &annex_b_parameter_sets(), None).unwrap();
        writer.write_video(33, 0, true, &[0, 0, 0, 1, 0x65, 0x88, 0x84]).unwrap();

        let (_, tags) = read_tags(&sink.contents());
        let frame = tags.last().unwrap();
        assert_eq!(frame.timestamp, FlvTimestamp::new(33));
        assert_eq!(frame.video_header().unwrap().frame_type, 1);
        assert_eq!(&frame.body()[..], &[0, 0, 0, 3, 0x65, 0x88, 0x84]);
    }

    #[test]
    fn frames_of_record_configured_stream_are_never_converted() {
        let record = DecoderConfigurationRecord::from_annex_b(&annex_b_parameter_sets())
            .unwrap()
            .to_bytes()
            .unwrap();

        let sink = MemorySink::new();
        let mut writer = open_writer(sink.clone());
        writer.write_header(&metadata(), &record, None).unwrap();

        // A 256 byte NAL unit, whose length prefix looks like a 3 byte start code
        let mut frame = vec![0, 0, 1, 0, 0x65];
        frame.extend_from_slice(&[0xAB; 255]);
        writer.write_video(0, 0, true, &frame).unwrap();

        let (_, tags) = read_tags(&sink.contents());
        assert_eq!(&tags.last().unwrap().body()[..], &frame[..]);
    }

    #[test]
    fn annex_b_stream_rejects_frame_without_start_code() {
        let sink = MemorySink::new();
        let mut writer = open_writer(sink.clone());
        writer.write_header(&metadata(), &annex_b_parameter_sets(), None).unwrap();
        let length = sink.contents().len();

        match writer.write_video(0, 0, true, &[0, 0, 0, 2, 0x65, 1]) {
            Err(FlvSerializationError::Avc(AvcError::MissingStartCode)) => (),
            x => panic!("Unexpected result: {:?}", x),
        }

        assert_eq!(sink.contents().len(), length, "Nothing should reach the sink");
    }

    #[test]
    fn trailer_patches_duration_and_file_size() {
        let sink = MemorySink::new();
        let mut writer = open_writer(sink.clone());
        writer.write_header(&metadata(), &annex_b_parameter_sets(), None).unwrap();
        writer.write_video(0, 0, true, &[0, 0, 0, 1, 0x65, 1]).unwrap();
        writer.write_video(1500, 0, false, &[0, 0, 0, 1, 0x41, 2]).unwrap();
        writer.write_trailer().unwrap();

        let contents = sink.contents();
        let (_, tags) = read_tags(&contents);
        let (_, value) = tags[0].script_data().unwrap().unwrap();
        assert_eq!(value.get_property("duration").and_then(|v| v.get_number()), Some(1.5));
        assert_eq!(
            value.get_property("filesize").and_then(|v| v.get_number()),
            Some(contents.len() as f64)
        );

        let end = tags.last().unwrap();
        assert_eq!(end.timestamp, FlvTimestamp::new(1500));
        assert_eq!(end.video_header().unwrap().avc_packet_type, super::super::AvcPacketType::EndOfSequence);
    }

    #[test]
    fn trailer_on_unseekable_sink_leaves_metadata_alone() {
        let mut writer = FlvWriter::new(StreamSink::new(Vec::new()));
        writer.open_sink().unwrap();
        writer.write_header(&metadata(), &annex_b_parameter_sets(), None).unwrap();
        writer.write_video(40, 0, true, &[0, 0, 0, 1, 0x65, 1]).unwrap();
        writer.write_trailer().unwrap();

        let bytes = writer.sink().get_ref().clone();
        let mut deserializer = FlvDeserializer::new();
        let tag = deserializer.get_next_tag(&bytes).unwrap().unwrap();
        let (_, value) = tag.script_data().unwrap().unwrap();
        assert_eq!(value.get_property("duration").and_then(|v| v.get_number()), Some(0.0));
    }
}
