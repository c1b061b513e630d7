//! Destinations the muxed FLV bytes are written to.
//!
//! A sink only has to accept bytes in order.  Sinks that can also rewrite bytes they already
//! accepted (files, in memory buffers) let the writer patch the `duration` and `filesize`
//! metadata once the stream is finished.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Receives the bytes of an FLV stream
pub trait OutputSink {
    /// Acquires whatever the sink writes into.  Called once before the first write.
    fn open(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()>;

    /// Replaces already written bytes starting at `position`, leaving the write position at the
    /// end of the stream.  Returns `Ok(false)` if the sink cannot seek back.
    fn overwrite_at(&mut self, _position: u64, _bytes: &[u8]) -> io::Result<bool> {
        Ok(false)
    }

    /// Releases the sink.  Writing after closing is an error.
    fn close(&mut self) -> io::Result<()> {
        self.flush()
    }
}

/// Writes the stream to a file, which is created (or truncated) when the sink is opened
pub struct FileSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl FileSink {
    pub fn new<P: AsRef<Path>>(path: P) -> FileSink {
        FileSink {
            path: path.as_ref().to_path_buf(),
            writer: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn writer(&mut self) -> io::Result<&mut BufWriter<File>> {
        self.writer
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "file sink is not open"))
    }
}

impl OutputSink for FileSink {
    fn open(&mut self) -> io::Result<()> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)?;

        self.writer = Some(BufWriter::new(file));
        Ok(())
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.writer()?.write_all(bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer()?.flush()
    }

    fn overwrite_at(&mut self, position: u64, bytes: &[u8]) -> io::Result<bool> {
        let writer = self.writer()?;
        writer.flush()?;

        let file = writer.get_mut();
        file.seek(SeekFrom::Start(position))?;
        file.write_all(bytes)?;
        file.seek(SeekFrom::End(0))?;
        Ok(true)
    }

    fn close(&mut self) -> io::Result<()> {
        match self.writer.take() {
            Some(mut writer) => {
                writer.flush()?;
                writer.get_ref().sync_all()
            }

            None => Ok(()),
        }
    }
}

/// Keeps the stream in memory.  Clones share the same buffer, so a clone kept outside of a
/// muxer can inspect what was written.
#[derive(Clone, Default)]
pub struct MemorySink {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> MemorySink {
        MemorySink::default()
    }

    /// A copy of everything written so far
    pub fn contents(&self) -> Vec<u8> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl OutputSink for MemorySink {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        buffer.extend_from_slice(bytes);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn overwrite_at(&mut self, position: u64, bytes: &[u8]) -> io::Result<bool> {
        let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        let start = position as usize;
        let end = start + bytes.len();
        if end > buffer.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "overwrite extends past the end of the written data",
            ));
        }

        buffer[start..end].copy_from_slice(bytes);
        Ok(true)
    }
}

/// Forwards the stream to any writer that cannot seek, such as a socket or a pipe
pub struct StreamSink<W: Write> {
    writer: W,
}

impl<W: Write> StreamSink<W> {
    pub fn new(writer: W) -> StreamSink<W> {
        StreamSink { writer }
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> OutputSink for StreamSink<W> {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.writer.write_all(bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl<S: OutputSink + ?Sized> OutputSink for Box<S> {
    fn open(&mut self) -> io::Result<()> {
        (**self).open()
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).write_all(bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }

    fn overwrite_at(&mut self, position: u64, bytes: &[u8]) -> io::Result<bool> {
        (**self).overwrite_at(position, bytes)
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}
