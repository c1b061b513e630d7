use super::{MuxerSession, MuxerSessionError, MuxerStatistics, Packet, SessionState, WrittenPacket};
use crate::sink::OutputSink;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A muxer session that can be shared between producer threads, such as one thread per encoder.
///
/// Every operation locks the whole session for its duration, so packets from different threads
/// are written one after the other and never interleave within a tag.
pub struct SharedMuxerSession<S: OutputSink> {
    inner: Arc<Mutex<MuxerSession<S>>>,
}

impl<S: OutputSink> Clone for SharedMuxerSession<S> {
    fn clone(&self) -> Self {
        SharedMuxerSession {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: OutputSink> SharedMuxerSession<S> {
    pub fn new(session: MuxerSession<S>) -> SharedMuxerSession<S> {
        SharedMuxerSession {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    pub fn set_video_configuration_data(&self, data: &[u8]) -> Result<(), MuxerSessionError> {
        self.lock().set_video_configuration_data(data)
    }

    pub fn set_audio_configuration_data(&self, data: &[u8]) -> Result<(), MuxerSessionError> {
        self.lock().set_audio_configuration_data(data)
    }

    pub fn write_header(&self) -> Result<(), MuxerSessionError> {
        self.lock().write_header()
    }

    pub fn write_packet(&self, packet: &Packet) -> Result<WrittenPacket, MuxerSessionError> {
        self.lock().write_packet(packet)
    }

    pub fn finalize(&self) -> Result<(), MuxerSessionError> {
        self.lock().finalize()
    }

    pub fn state(&self) -> SessionState {
        self.lock().state()
    }

    pub fn statistics(&self) -> MuxerStatistics {
        self.lock().statistics().clone()
    }

    /// Runs `action` with exclusive access to the session
    pub fn with_session<T, F: FnOnce(&mut MuxerSession<S>) -> T>(&self, action: F) -> T {
        action(&mut self.lock())
    }

    // Tags reach the sink in a single write, so a poisoned session is still consistent
    fn lock(&self) -> MutexGuard<MuxerSession<S>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
