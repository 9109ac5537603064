//! Output sink for encoded COPY streams.
//!
//! The encoder appends to a `CopySink` and hands it back once finalized.
//! A sink either lives in memory or spools to a temporary file:
//! - unkept spool files are unlinked at creation and vanish when dropped
//! - kept spool files (`skip_cleanup`) stay on disk until [`CopySink::remove`]

use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use bytes::BytesMut;

/// Prefix of spooled file names.
const SPOOL_PREFIX: &str = "copy_binary";

/// Append-only byte sink with read-back.
#[derive(Debug)]
pub enum CopySink {
    Memory {
        buf: BytesMut,
        /// Read position
        pos: usize,
    },
    Spooled {
        file: File,
        /// Set when the file is kept on disk.
        path: Option<PathBuf>,
        len: u64,
    },
}

impl CopySink {
    /// In-memory sink.
    pub fn memory() -> Self {
        Self::with_capacity(0)
    }

    /// In-memory sink with preallocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        CopySink::Memory {
            buf: BytesMut::with_capacity(capacity),
            pos: 0,
        }
    }

    /// Sink backed by a temporary file. With `keep`, the file survives the
    /// sink until [`CopySink::remove`] is called.
    pub fn spooled(keep: bool) -> io::Result<Self> {
        let (file, path) = if keep {
            let tmp = tempfile::Builder::new()
                .prefix(SPOOL_PREFIX)
                .suffix(".bin")
                .tempfile()?;
            let (file, path) = tmp.keep().map_err(|e| e.error)?;
            tracing::debug!("Spooling COPY stream to {}", path.display());
            (file, Some(path))
        } else {
            // Already unlinked; the open handle keeps the data alive.
            let file = tempfile::tempfile()?;
            tracing::debug!("Spooling COPY stream to an unlinked temporary file");
            (file, None)
        };
        Ok(CopySink::Spooled { file, path, len: 0 })
    }

    /// Create the sink described by the encoder options.
    pub fn for_options(use_spooled_sink: bool, skip_cleanup: bool) -> io::Result<Self> {
        if use_spooled_sink {
            Self::spooled(skip_cleanup)
        } else {
            Ok(Self::memory())
        }
    }

    /// Total bytes written.
    pub fn len(&self) -> u64 {
        match self {
            CopySink::Memory { buf, .. } => buf.len() as u64,
            CopySink::Spooled { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_spooled(&self) -> bool {
        matches!(self, CopySink::Spooled { .. })
    }

    /// Path of a kept spool file.
    pub fn path(&self) -> Option<&Path> {
        match self {
            CopySink::Spooled { path, .. } => path.as_deref(),
            CopySink::Memory { .. } => None,
        }
    }

    /// Move the read position back to the start.
    pub fn rewind(&mut self) -> io::Result<()> {
        match self {
            CopySink::Memory { pos, .. } => {
                *pos = 0;
                Ok(())
            }
            CopySink::Spooled { file, .. } => file.seek(SeekFrom::Start(0)).map(|_| ()),
        }
    }

    /// Whole contents, independent of the read position.
    pub fn to_vec(&mut self) -> io::Result<Vec<u8>> {
        match self {
            CopySink::Memory { buf, .. } => Ok(buf.to_vec()),
            CopySink::Spooled { file, len, .. } => {
                let resume = file.stream_position()?;
                file.seek(SeekFrom::Start(0))?;
                let mut out = Vec::with_capacity(*len as usize);
                file.read_to_end(&mut out)?;
                file.seek(SeekFrom::Start(resume))?;
                Ok(out)
            }
        }
    }

    /// Dispose of the sink, deleting a kept spool file.
    pub fn remove(self) -> io::Result<()> {
        if let CopySink::Spooled {
            file,
            path: Some(path),
            ..
        } = self
        {
            drop(file);
            fs::remove_file(&path)?;
            tracing::debug!("Removed spool file {}", path.display());
        }
        Ok(())
    }
}

impl Default for CopySink {
    fn default() -> Self {
        Self::memory()
    }
}

impl Write for CopySink {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        match self {
            CopySink::Memory { buf, .. } => {
                buf.extend_from_slice(data);
                Ok(data.len())
            }
            CopySink::Spooled { file, len, .. } => {
                // Appends always land at the end, even after a read-back.
                let end = file.seek(SeekFrom::Start(*len))?;
                let written = file.write(data)?;
                *len = end + written as u64;
                Ok(written)
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            CopySink::Memory { .. } => Ok(()),
            CopySink::Spooled { file, .. } => file.flush(),
        }
    }
}

impl Read for CopySink {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        match self {
            CopySink::Memory { buf, pos } => {
                let remaining = &buf[(*pos).min(buf.len())..];
                let n = remaining.len().min(out.len());
                out[..n].copy_from_slice(&remaining[..n]);
                *pos += n;
                Ok(n)
            }
            CopySink::Spooled { file, .. } => file.read(out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_write_and_read_back() {
        let mut sink = CopySink::memory();
        sink.write_all(b"hello ").unwrap();
        sink.write_all(b"world").unwrap();
        assert_eq!(sink.len(), 11);

        let mut out = String::new();
        sink.rewind().unwrap();
        sink.read_to_string(&mut out).unwrap();
        assert_eq!(out, "hello world");
        assert_eq!(sink.to_vec().unwrap(), b"hello world");
    }

    #[test]
    fn test_spooled_matches_memory() {
        let mut memory = CopySink::memory();
        let mut spooled = CopySink::spooled(false).unwrap();
        for sink in [&mut memory, &mut spooled] {
            sink.write_all(&[1, 2, 3]).unwrap();
            sink.write_all(&[4, 5]).unwrap();
        }
        assert!(spooled.is_spooled());
        assert_eq!(spooled.path(), None);
        assert_eq!(spooled.len(), 5);
        assert_eq!(spooled.to_vec().unwrap(), memory.to_vec().unwrap());

        let mut out = Vec::new();
        spooled.rewind().unwrap();
        spooled.read_to_end(&mut out).unwrap();
        assert_eq!(out, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_spooled_append_after_read() {
        let mut sink = CopySink::spooled(false).unwrap();
        sink.write_all(b"ab").unwrap();
        sink.rewind().unwrap();
        let mut first = [0u8; 1];
        sink.read_exact(&mut first).unwrap();
        sink.write_all(b"cd").unwrap();
        assert_eq!(sink.to_vec().unwrap(), b"abcd");
    }

    #[test]
    fn test_kept_spool_file_until_remove() {
        let mut sink = CopySink::spooled(true).unwrap();
        sink.write_all(b"data").unwrap();
        let path = sink.path().unwrap().to_path_buf();
        assert!(path.exists());
        assert_eq!(fs::read(&path).unwrap(), b"data");

        sink.remove().unwrap();
        assert!(!path.exists());
    }
}
