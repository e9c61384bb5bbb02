//! A log file that can be rotated on demand.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local, SecondsFormat};
use parking_lot::Mutex;

#[derive(Debug)]
struct RotateState {
    path: PathBuf,
    file: Option<File>,
}

/// A log file writer with explicit rotation.
///
/// [`rotate`](Self::rotate) renames the current file to
/// `<name>.<RFC 3339 timestamp>` and starts a fresh one. When to rotate is
/// up to the caller. Clones share the same file.
#[derive(Debug, Clone)]
pub struct RotatingFile {
    state: Arc<Mutex<RotateState>>,
}

impl RotatingFile {
    /// Opens `path`, first rotating away any existing file there.
    ///
    /// # Errors
    ///
    /// Returns the I/O error from renaming or creating the file.
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let file = Self {
            state: Arc::new(Mutex::new(RotateState {
                path: path.into(),
                file: None,
            })),
        };
        file.rotate()?;
        Ok(file)
    }

    /// The path being written.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.state.lock().path.clone()
    }

    /// Closes the current file, renames it aside if it exists, and creates
    /// a new one. Returns the name the old file was moved to.
    ///
    /// # Errors
    ///
    /// Returns the I/O error from renaming or creating the file. After a
    /// failure, writes fail until a later rotation succeeds.
    pub fn rotate(&self) -> io::Result<Option<PathBuf>> {
        let mut state = self.state.lock();
        if let Some(mut old) = state.file.take() {
            old.flush()?;
        }

        let moved = if state.path.exists() {
            let target = rotated_name(&state.path, &Local::now());
            fs::rename(&state.path, &target)?;
            Some(target)
        } else {
            None
        };
        state.file = Some(File::create(&state.path)?);
        tracing::debug!(
            path = %state.path.display(),
            rotated_to = ?moved,
            "log file rotated"
        );
        Ok(moved)
    }
}

/// `app.log` becomes `app.log.2024-01-23T01:23:23+02:00`.
fn rotated_name(path: &Path, now: &DateTime<Local>) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(now.to_rfc3339_opts(SecondsFormat::Secs, true));
    PathBuf::from(name)
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.lock();
        match state.file.as_mut() {
            Some(file) => file.write(buf),
            None => Err(io::Error::other("log file is not open")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = self.state.lock();
        match state.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}
