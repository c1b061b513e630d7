use super::registry::StreamKind;

/// Counters describing what a session did with the packets it was handed
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct MuxerStatistics {
    pub video_packets_written: u64,
    pub audio_packets_written: u64,

    /// Packets without a valid ADTS frame or with an empty payload
    pub malformed_packets: u64,
    pub size_mismatches: u64,
    pub timestamp_rejections: u64,

    /// Packets that were valid but could not be written to the sink
    pub write_failures: u64,

    /// Everything handed to the sink, header and trailer included
    pub bytes_written: u64,
}

impl MuxerStatistics {
    pub fn packets_written(&self, kind: StreamKind) -> u64 {
        match kind {
            StreamKind::Video => self.video_packets_written,
            StreamKind::Audio => self.audio_packets_written,
        }
    }

    /// Packets that were dropped before reaching the container
    pub fn packets_rejected(&self) -> u64 {
        self.malformed_packets + self.size_mismatches + self.timestamp_rejections
    }

    pub(super) fn record_written(&mut self, kind: StreamKind) {
        match kind {
            StreamKind::Video => self.video_packets_written += 1,
            StreamKind::Audio => self.audio_packets_written += 1,
        }
    }
}
