//! Per-level output channels.

use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

use chrono::Local;
use parking_lot::Mutex;

use crate::flags::{Flags, InsertCtrl, Target};
use crate::formatter::Formatter;
use crate::level::Level;
use crate::prefix::{Padding, format_leader, insert_prefix, scope_suppresses};
use crate::registry::{Registry, Request};
use crate::sink::Sink;
use crate::stack::CallerInfo;

/// Inputs to metadata insertion that come from registry settings.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MetaContext<'a> {
    pub flags_override: Option<Flags>,
    pub debug_scope: Option<&'a str>,
    pub caller_skip: usize,
    pub padding: Padding,
    pub smart_off: bool,
}

/// Mutable channel state, guarded by the channel lock.
struct ChannelState {
    prefix: String,
    screen: Sink,
    logfile: Sink,
    screen_flags: Flags,
    logfile_flags: Flags,
    formatter: Option<Arc<dyn Formatter>>,
    /// Reused buffer for the metadata leader.
    scratch: String,
}

impl ChannelState {
    fn new(level: Level) -> Self {
        let prefix = match level {
            Level::Trace => "Trace: ",
            Level::Debug => "Debug: ",
            Level::Note => "Note: ",
            Level::Issue => "Issue: ",
            Level::Error => "Error: ",
            Level::Fatal => "Fatal: ",
            _ => "",
        };
        let screen = if level >= Level::Error {
            Sink::stderr()
        } else {
            Sink::stdout()
        };
        let screen_flags = if level <= Level::Debug {
            Flags::SCREEN_DEFAULT
        } else {
            Flags::empty()
        };
        Self {
            prefix: prefix.to_string(),
            screen,
            logfile: Sink::discard(),
            screen_flags,
            logfile_flags: Flags::LOGFILE_DEFAULT,
            formatter: None,
            scratch: String::with_capacity(96),
        }
    }
}

/// The output channel for one concrete level.
pub(crate) struct Channel {
    level: Level,
    state: Mutex<ChannelState>,
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Channel")
            .field("level", &self.level)
            .field("prefix", &state.prefix)
            .field("screen", &state.screen)
            .field("logfile", &state.logfile)
            .field("screen_flags", &state.screen_flags)
            .field("logfile_flags", &state.logfile_flags)
            .field("formatter", &state.formatter.is_some())
            .finish()
    }
}

impl Channel {
    pub(crate) fn new(level: Level) -> Self {
        Self {
            level,
            state: Mutex::new(ChannelState::new(level)),
        }
    }

    /// Sink for a single target.
    pub(crate) fn sink(&self, target: Target) -> Sink {
        let state = self.state.lock();
        if target == Target::LOGFILE {
            state.logfile.clone()
        } else {
            state.screen.clone()
        }
    }

    pub(crate) fn set_sink(&self, targets: Target, sink: &Sink) {
        let mut state = self.state.lock();
        if targets.contains(Target::SCREEN) {
            state.screen = sink.clone();
        }
        if targets.contains(Target::LOGFILE) {
            state.logfile = sink.clone();
        }
    }

    /// Flags for a single target.
    pub(crate) fn flags(&self, target: Target) -> Flags {
        let state = self.state.lock();
        if target == Target::LOGFILE {
            state.logfile_flags
        } else {
            state.screen_flags
        }
    }

    pub(crate) fn set_flags(&self, targets: Target, flags: Flags) {
        let mut state = self.state.lock();
        if targets.contains(Target::SCREEN) {
            state.screen_flags = flags;
        }
        if targets.contains(Target::LOGFILE) {
            state.logfile_flags = flags;
        }
    }

    pub(crate) fn prefix(&self) -> String {
        self.state.lock().prefix.clone()
    }

    pub(crate) fn set_prefix(&self, prefix: &str) {
        prefix.clone_into(&mut self.state.lock().prefix);
    }

    pub(crate) fn set_formatter(&self, formatter: Option<Arc<dyn Formatter>>) {
        self.state.lock().formatter = formatter;
    }

    pub(crate) fn has_formatter(&self) -> bool {
        self.state.lock().formatter.is_some()
    }

    /// Prefix and formatter, read under one lock.
    pub(crate) fn prefix_and_formatter(&self) -> (String, Option<Arc<dyn Formatter>>) {
        let state = self.state.lock();
        (state.prefix.clone(), state.formatter.clone())
    }

    /// Places the metadata leader for `target` in front of `s`.
    ///
    /// Returns the prefixed text and whether debug-scope filtering hides
    /// it. The channel lock is released while the caller is identified and
    /// re-taken to build the leader in the scratch buffer.
    pub(crate) fn insert_metadata(
        &self,
        s: &str,
        target: Target,
        ctrl: InsertCtrl,
        meta: &MetaContext<'_>,
    ) -> (String, bool) {
        let flags = meta.flags_override.unwrap_or_else(|| self.flags(target));
        if flags.is_empty() && meta.debug_scope.is_none() {
            return (s.to_string(), false);
        }

        let caller = if flags.needs_caller() || meta.debug_scope.is_some() {
            CallerInfo::capture(meta.caller_skip)
        } else {
            CallerInfo::unknown()
        };
        let suppressed = scope_suppresses(self.level, meta.debug_scope, &caller);
        let ctrl = if meta.smart_off { InsertCtrl::ALWAYS } else { ctrl };
        let now = Local::now();

        let mut state = self.state.lock();
        let scratch = &mut state.scratch;
        format_leader(scratch, flags, self.level, &caller, &now, &meta.padding);
        (insert_prefix(s, scratch, ctrl), suppressed)
    }
}

/// An [`io::Write`] that emits everything written to it at one level.
///
/// Each `write` call is one emission. `write!` may split a message into
/// several writes; newline continuity keeps the pieces on one prefixed
/// line. Writing to a [`Level::Fatal`] writer terminates the process unless
/// no-exit is set, even when the write itself fails.
///
/// ```rust
/// use std::io::Write;
/// use leveled_out::{Buffer, Level, Registry, Target};
///
/// let registry = Registry::new();
/// let screen = Buffer::new();
/// registry.set_sink(Level::All, &screen.sink(), Target::SCREEN).unwrap();
///
/// let mut notes = registry.writer(Level::Note).unwrap();
/// writeln!(notes, "disk is {}% full", 91).unwrap();
/// assert_eq!(screen.contents(), "Note: disk is 91% full\n");
/// ```
#[derive(Debug, Clone)]
pub struct LevelWriter {
    registry: Registry,
    level: Level,
}

impl LevelWriter {
    pub(crate) fn new(registry: Registry, level: Level) -> Self {
        Self { registry, level }
    }

    /// The level this writer emits at.
    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }
}

impl Write for LevelWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let text = String::from_utf8_lossy(buf);
        match self.registry.emit(self.level, Request::text(text)) {
            Ok(emission) => {
                self.registry.conclude(&emission);
                Ok(buf.len())
            }
            Err(err) => {
                self.registry.conclude_failure(&err);
                Err(io::Error::other(err))
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
