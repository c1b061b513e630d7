use crate::sink::{MemorySink, OutputSink};
use crate::tags::{FlvDeserializer, FlvHeader, FlvTag};
use std::io;
use std::sync::{Arc, Mutex};

/// Baseline profile, level 3.1 sequence parameter set
pub const TEST_SPS: &[u8] = &[0x67, 0x42, 0xC0, 0x1F, 0xDA, 0x01, 0x40, 0x16, 0xEC, 0x04, 0x40];
pub const TEST_PPS: &[u8] = &[0x68, 0xCE, 0x3C, 0x80];

/// The SPS and PPS as a hardware encoder hands them out, each behind a 4 byte start code
pub fn annex_b_parameter_sets() -> Vec<u8> {
    let mut bytes = vec![0, 0, 0, 1];
    bytes.extend_from_slice(TEST_SPS);
    bytes.extend_from_slice(&[0, 0, 0, 1]);
    bytes.extend_from_slice(TEST_PPS);
    bytes
}

/// An AAC-LC frame behind an ADTS header without CRC
pub fn adts_frame(sampling_frequency_index: u8, channels: u8, payload: &[u8]) -> Vec<u8> {
    let length = 7 + payload.len();
    let mut bytes = vec![
        0xFF,
        0xF1,
        (1 << 6) | (sampling_frequency_index << 2) | ((channels >> 2) & 0x01),
        ((channels & 0x03) << 6) | ((length >> 11) & 0x03) as u8,
        ((length >> 3) & 0xFF) as u8,
        (((length & 0x07) << 5) as u8) | 0x1F,
        0xFC,
    ];

    bytes.extend_from_slice(payload);
    bytes
}

/// Reads back everything a sink received
pub fn read_tags(bytes: &[u8]) -> (FlvHeader, Vec<FlvTag>) {
    let mut deserializer = FlvDeserializer::new();
    let mut tags = Vec::new();
    let mut input = bytes;
    while let Some(tag) = deserializer.get_next_tag(input).unwrap() {
        tags.push(tag);
        input = &[];
    }

    let header = *deserializer.header().unwrap();
    (header, tags)
}

#[derive(Default)]
struct Faults {
    fail_open: bool,
    failing_writes: usize,
    write_attempts: usize,
    closed: bool,
}

/// A memory backed sink that can be told to fail.  Clones share the same faults and contents.
#[derive(Clone, Default)]
pub struct FaultySink {
    inner: MemorySink,
    faults: Arc<Mutex<Faults>>,
}

impl FaultySink {
    pub fn new() -> FaultySink {
        FaultySink::default()
    }

    pub fn fail_open(&self) {
        self.faults.lock().unwrap().fail_open = true;
    }

    /// The next `count` writes fail without writing anything
    pub fn fail_next_writes(&self, count: usize) {
        self.faults.lock().unwrap().failing_writes = count;
    }

    pub fn contents(&self) -> Vec<u8> {
        self.inner.contents()
    }

    pub fn write_attempts(&self) -> usize {
        self.faults.lock().unwrap().write_attempts
    }

    pub fn closed(&self) -> bool {
        self.faults.lock().unwrap().closed
    }
}

impl OutputSink for FaultySink {
    fn open(&mut self) -> io::Result<()> {
        if self.faults.lock().unwrap().fail_open {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "test open failure"));
        }

        Ok(())
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        {
            let mut faults = self.faults.lock().unwrap();
            faults.write_attempts += 1;
            if faults.failing_writes > 0 {
                faults.failing_writes -= 1;
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "test write failure"));
            }
        }

        self.inner.write_all(bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn overwrite_at(&mut self, position: u64, bytes: &[u8]) -> io::Result<bool> {
        self.inner.overwrite_at(position, bytes)
    }

    fn close(&mut self) -> io::Result<()> {
        self.faults.lock().unwrap().closed = true;
        Ok(())
    }
}
