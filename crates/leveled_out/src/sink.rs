//! Shared, thread-safe write destinations.

use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkKind {
    Stdout,
    Stderr,
    Discard,
    File,
    Custom,
}

/// A cloneable write handle. Clones share the underlying writer, so one log
/// file can back every channel.
#[derive(Clone)]
pub struct Sink {
    kind: SinkKind,
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink").field("kind", &self.kind).finish_non_exhaustive()
    }
}

impl Sink {
    fn with_kind(kind: SinkKind, writer: Box<dyn Write + Send>) -> Self {
        Self {
            kind,
            writer: Arc::new(Mutex::new(writer)),
        }
    }

    /// Standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::with_kind(SinkKind::Stdout, Box::new(io::stdout()))
    }

    /// Standard error.
    #[must_use]
    pub fn stderr() -> Self {
        Self::with_kind(SinkKind::Stderr, Box::new(io::stderr()))
    }

    /// Drops everything written to it.
    #[must_use]
    pub fn discard() -> Self {
        Self::with_kind(SinkKind::Discard, Box::new(io::sink()))
    }

    /// An open file.
    #[must_use]
    pub fn file(file: File) -> Self {
        Self::with_kind(SinkKind::File, Box::new(file))
    }

    /// Any other writer.
    pub fn from_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self::with_kind(SinkKind::Custom, Box::new(writer))
    }

    /// True for [`Sink::discard`] handles.
    #[must_use]
    pub fn is_discard(&self) -> bool {
        self.kind == SinkKind::Discard
    }

    /// True when both handles share one writer.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.writer, &other.writer)
    }

    /// Writes the whole payload and flushes it under the sink lock, so
    /// concurrent payloads never interleave.
    pub fn write_all(&self, bytes: &[u8]) -> io::Result<()> {
        if self.is_discard() || bytes.is_empty() {
            return Ok(());
        }
        let mut writer = self.writer.lock();
        writer.write_all(bytes)?;
        writer.flush()
    }
}

/// In-memory writer, mostly for tests and capture.
///
/// ```rust
/// use leveled_out::Buffer;
///
/// let buf = Buffer::new();
/// buf.sink().write_all(b"hello\n").unwrap();
/// assert_eq!(buf.contents(), "hello\n");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Buffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl Buffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink writing into this buffer.
    #[must_use]
    pub fn sink(&self) -> Sink {
        Sink::from_writer(self.clone())
    }

    /// Everything written so far, decoded lossily.
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock()).into_owned()
    }

    /// Returns the contents and empties the buffer.
    #[must_use]
    pub fn take(&self) -> String {
        let bytes = std::mem::take(&mut *self.bytes.lock());
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// True when nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.lock().is_empty()
    }
}

impl Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
