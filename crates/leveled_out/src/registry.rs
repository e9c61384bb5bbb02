//! The output registry: eight level channels plus shared settings.
//!
//! A [`Registry`] is a cheap, cloneable handle. Independent registries do
//! not share any state, which keeps tests and embedded uses isolated; the
//! free functions in [`global`](crate::global) forward to one
//! process-default registry.
//!
//! Emission is split from termination: [`Registry::emit`] writes and
//! returns an [`Emission`] carrying the exit code of terminating calls, and
//! [`Registry::conclude`] acts on it.

use std::borrow::Cow;
use std::fmt;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::channel::{Channel, LevelWriter, MetaContext};
use crate::config::Overrides;
use crate::continuity::Continuity;
use crate::detailed::{self, ChannelRef, DetailedError};
use crate::error::{OutError, Result};
use crate::flags::{Flags, InsertCtrl, StackTraceConfig, Target};
use crate::formatter::{Formatted, Formatter};
use crate::level::Level;
use crate::prefix::{Padding, insert_prefix_with_code};
use crate::rotate::RotatingFile;
use crate::sink::Sink;
use crate::stack;

/// Default error code; codes equal to it count as unset.
pub const DEFAULT_CODE: i32 = 100;

/// Registry options.
#[derive(Debug, Clone)]
pub struct Options {
    /// Minimum level written to the screen.
    pub screen_threshold: Level,
    /// Minimum level written to the logfile.
    pub logfile_threshold: Level,
    /// When stack traces are appended.
    pub stack_trace: StackTraceConfig,
    /// Code that means "no particular code". Must not be zero.
    pub default_code: i32,
    /// Extra frames to skip when identifying the caller, for applications
    /// that wrap output calls in helpers of their own.
    pub caller_skip: usize,
    /// Exit code for fatal calls that do not name one.
    pub error_exit: i32,
    /// Metadata column widths.
    pub padding: Padding,
    /// Environment overrides.
    pub overrides: Overrides,
    /// Terminating calls return instead of exiting.
    pub no_exit: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            screen_threshold: Level::Info,
            logfile_threshold: Level::Discard,
            stack_trace: StackTraceConfig::default(),
            default_code: DEFAULT_CODE,
            caller_skip: 0,
            error_exit: 1,
            padding: Padding::default(),
            overrides: Overrides::default(),
            no_exit: false,
        }
    }
}

/// Settings shared by every channel, guarded by the settings lock.
#[derive(Debug)]
struct Settings {
    screen_threshold: Level,
    logfile_threshold: Level,
    log_file: Option<PathBuf>,
    continuity: Continuity,
    stack_trace: StackTraceConfig,
    default_code: i32,
    caller_skip: usize,
    error_exit: i32,
    padding: Padding,
    overrides: Overrides,
    no_exit: bool,
}

impl Settings {
    fn threshold(&self, target: Target) -> Level {
        if target == Target::LOGFILE {
            self.logfile_threshold
        } else {
            self.screen_threshold
        }
    }

    fn no_exit(&self) -> bool {
        self.no_exit || self.overrides.no_exit
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            screen_threshold: self.screen_threshold,
            logfile_threshold: self.logfile_threshold,
            stack_trace: self.overrides.stack_trace_config(self.stack_trace),
            default_code: self.default_code,
            caller_skip: self.caller_skip,
            error_exit: self.error_exit,
            padding: self.padding,
            overrides: self.overrides.clone(),
        }
    }
}

/// Settings copied out for one emission.
struct Snapshot {
    screen_threshold: Level,
    logfile_threshold: Level,
    stack_trace: StackTraceConfig,
    default_code: i32,
    caller_skip: usize,
    error_exit: i32,
    padding: Padding,
    overrides: Overrides,
}

impl Snapshot {
    fn threshold(&self, target: Target) -> Level {
        if target == Target::LOGFILE {
            self.logfile_threshold
        } else {
            self.screen_threshold
        }
    }

    fn meta(&self, target: Target) -> MetaContext<'_> {
        MetaContext {
            flags_override: self.overrides.flags(target),
            debug_scope: self.overrides.debug_scope.as_deref(),
            caller_skip: self.caller_skip,
            padding: self.padding,
            smart_off: self.overrides.smart_prefix_off,
        }
    }
}

/// What to emit.
#[derive(Debug)]
pub struct Request<'a> {
    message: Cow<'a, str>,
    error: Option<&'a (dyn DetailedError + 'static)>,
    exit: Option<i32>,
}

impl<'a> Request<'a> {
    /// Plain text.
    pub fn text(message: impl Into<Cow<'a, str>>) -> Self {
        Self {
            message: message.into(),
            error: None,
            exit: None,
        }
    }

    /// A detailed error: its messages (ending in a newline), its code and
    /// its stack.
    #[must_use]
    pub fn error(err: &'a (dyn DetailedError + 'static)) -> Self {
        let mut message = detailed::message(err);
        if !message.ends_with('\n') {
            message.push('\n');
        }
        Self {
            message: Cow::Owned(message),
            error: Some(err),
            exit: None,
        }
    }

    /// Makes the call terminating with `code`.
    #[must_use]
    pub fn with_exit(mut self, code: i32) -> Self {
        self.exit = Some(code);
        self
    }
}

/// Outcome of one emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct Emission {
    /// The level emitted at.
    pub level: Level,
    /// Bytes written across both targets.
    pub written: usize,
    /// Exit code, for terminating calls.
    pub exit: Option<i32>,
}

/// One call's state while it is written to each target.
struct Pending<'a> {
    level: Level,
    prefix: &'a str,
    formatted: &'a Formatted,
    code: i32,
    stack: &'a str,
    exit: Option<i32>,
    snap: &'a Snapshot,
}

struct RegistryInner {
    channels: [Channel; 8],
    settings: Mutex<Settings>,
}

/// Leveled dual-target output.
///
/// # Example
///
/// ```rust
/// use leveled_out::{Buffer, Level, Registry, Request, Target};
///
/// let registry = Registry::new();
/// let screen = Buffer::new();
/// let logfile = Buffer::new();
/// registry.set_sink(Level::All, &screen.sink(), Target::SCREEN).unwrap();
/// registry.set_sink(Level::All, &logfile.sink(), Target::LOGFILE).unwrap();
/// registry.set_flags(Level::All, leveled_out::Flags::LEVEL, Target::LOGFILE).unwrap();
/// registry.set_threshold(Level::Note, Target::LOGFILE).unwrap();
///
/// let emission = registry.emit(Level::Note, Request::text("low disk space\n")).unwrap();
/// assert_eq!(emission.exit, None);
/// assert_eq!(screen.contents(), "Note: low disk space\n");
/// assert_eq!(logfile.contents(), "NOTE    Note: low disk space\n");
/// ```
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let settings = self.settings();
        f.debug_struct("Registry")
            .field("screen_threshold", &settings.screen_threshold)
            .field("logfile_threshold", &settings.logfile_threshold)
            .field("log_file", &settings.log_file)
            .field("stack_trace", &settings.stack_trace)
            .field("default_code", &settings.default_code)
            .finish_non_exhaustive()
    }
}

impl Registry {
    /// Creates a registry with default settings and no overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(Options::default())
    }

    /// Creates a registry with the given options. A zero default code is
    /// replaced by [`DEFAULT_CODE`].
    #[must_use]
    pub fn with_options(opts: Options) -> Self {
        let settings = Settings {
            screen_threshold: opts.screen_threshold,
            logfile_threshold: opts.logfile_threshold,
            log_file: None,
            continuity: Continuity::default(),
            stack_trace: opts.stack_trace,
            default_code: if opts.default_code == 0 {
                DEFAULT_CODE
            } else {
                opts.default_code
            },
            caller_skip: opts.caller_skip,
            error_exit: opts.error_exit,
            padding: opts.padding,
            overrides: opts.overrides,
            no_exit: opts.no_exit,
        };
        Self {
            inner: Arc::new(RegistryInner {
                channels: Level::CONCRETE.map(Channel::new),
                settings: Mutex::new(settings),
            }),
        }
    }

    /// Creates a registry with default settings and the process
    /// environment's overrides.
    #[must_use]
    pub fn from_env() -> Self {
        Self::with_options(Options {
            overrides: Overrides::from_env(),
            ..Options::default()
        })
    }

    fn settings(&self) -> MutexGuard<'_, Settings> {
        self.inner.settings.lock()
    }

    fn channel(&self, level: Level) -> Result<&Channel> {
        if level.is_concrete() {
            Ok(&self.inner.channels[level.index()])
        } else {
            Err(OutError::InvalidLevel(level))
        }
    }

    /// The channels `level` addresses: all of them for [`Level::All`].
    fn channels(&self, level: Level) -> Result<&[Channel]> {
        if level == Level::All {
            Ok(&self.inner.channels)
        } else {
            self.channel(level).map(std::slice::from_ref)
        }
    }

    // =========================================================================
    // Emission
    // =========================================================================

    /// Writes `request` at `level` to each target that accepts it.
    ///
    /// Screen output is written before logfile output. A detailed error is
    /// bound to this registry's channel for `level` ([`Level::Error`] below
    /// [`Level::Issue`]). Fatal calls are always terminating.
    ///
    /// # Errors
    ///
    /// [`OutError::InvalidLevel`] for `All` or `Discard`, and
    /// [`OutError::Write`] when a target rejects a write; nothing further is
    /// written for the call after a failure. A write failure of a
    /// terminating call carries its exit code (see [`Registry::conclude_failure`]).
    pub fn emit(&self, level: Level, request: Request<'_>) -> Result<Emission> {
        let channel = self.channel(level)?;
        let snap = self.settings().snapshot();
        let exit = if level == Level::Fatal {
            Some(request.exit.unwrap_or(snap.error_exit))
        } else {
            request.exit
        };

        if let Some(err) = request.error {
            let bound = if level < Level::Issue { Level::Error } else { level };
            err.set_channel(ChannelRef::new(self.clone(), bound));
        }
        let code = request
            .error
            .map_or(snap.default_code, |err| detailed::resolve_code(err, snap.default_code));
        let stack = if level.is_severe() {
            request
                .error
                .and_then(|err| detailed::innermost_stack(err))
                .map_or_else(|| stack::capture(snap.caller_skip).0, str::to_string)
        } else {
            String::new()
        };

        let (prefix, formatter) = channel.prefix_and_formatter();
        let formatted = match formatter {
            Some(f) => f.format_message(&request.message, level, code, &stack, exit.is_some()),
            None => Formatted::passthrough(request.message.as_ref()),
        };

        let pending = Pending {
            level,
            prefix: &prefix,
            formatted: &formatted,
            code,
            stack: &stack,
            exit,
            snap: &snap,
        };
        let mut written = 0;
        for target in [Target::SCREEN, Target::LOGFILE] {
            if formatted.suppress.contains(target) {
                continue;
            }
            written += self
                .emit_to(channel, target, &pending)
                .map_err(|err| err.with_exit(exit))?;
        }
        Ok(Emission {
            level,
            written,
            exit,
        })
    }

    fn emit_to(&self, channel: &Channel, target: Target, p: &Pending<'_>) -> Result<usize> {
        let threshold = p.snap.threshold(target);
        if threshold == Level::Discard || p.level < threshold {
            return Ok(0);
        }
        let sink = channel.sink(target);
        let meta = p.snap.meta(target);

        let text = if p.formatted.skip_native_prefix {
            Some(p.formatted.message.clone())
        } else {
            let (text, suppressed) = self.prefixed(channel, target, p, &p.formatted.message, &meta);
            (!suppressed).then_some(text)
        };
        let Some(text) = text else {
            return Ok(0);
        };

        let mut written = self.commit(&sink, target, p.level, &text)?;
        let trace = p.snap.stack_trace.warrants(target, p.level, p.exit);
        if p.exit.is_some() || trace {
            written += self.finish_line(&sink, target, p.level)?;
        }
        if trace {
            let captured;
            let stack = if p.stack.is_empty() {
                captured = stack::capture(p.snap.caller_skip).0;
                captured.as_str()
            } else {
                p.stack
            };
            let body = format!("Stack Trace: {stack}\n");
            let (text, _) = self.prefixed(channel, target, p, &body, &meta);
            written += self.commit(&sink, target, p.level, &text)?;
        }
        Ok(written)
    }

    /// Applies the severity prefix (with code) and the metadata leader,
    /// continuing the target's current line when it is mid line.
    fn prefixed(
        &self,
        channel: &Channel,
        target: Target,
        p: &Pending<'_>,
        message: &str,
        meta: &MetaContext<'_>,
    ) -> (String, bool) {
        let ctrl = self.settings().continuity.resolve(target, InsertCtrl::SMART);
        let body = insert_prefix_with_code(message, p.prefix, ctrl, p.code, p.snap.default_code);
        channel.insert_metadata(&body, target, ctrl, meta)
    }

    /// Writes `text` and records continuity for `target`.
    fn commit(&self, sink: &Sink, target: Target, level: Level, text: &str) -> Result<usize> {
        if text.is_empty() {
            return Ok(0);
        }
        if let Err(source) = sink.write_all(text.as_bytes()) {
            tracing::warn!(
                level = %level,
                target = target.name(),
                error = %source,
                "output write failed"
            );
            return Err(OutError::Write {
                level,
                target,
                exit: None,
                source,
            });
        }
        self.settings().continuity.record(target, text.as_bytes());
        Ok(text.len())
    }

    fn finish_line(&self, sink: &Sink, target: Target, level: Level) -> Result<usize> {
        if self.settings().continuity.at_line_start(target) {
            return Ok(0);
        }
        self.commit(sink, target, level, "\n")
    }

    /// Terminating call with no message. Traces follow the stack trace
    /// policy as for any fatal call.
    ///
    /// # Errors
    ///
    /// See [`Registry::emit`].
    pub fn exit(&self, code: i32) -> Result<Emission> {
        self.emit(Level::Fatal, Request::text("").with_exit(code))
    }

    /// Emits a detailed error at `level`.
    ///
    /// # Errors
    ///
    /// See [`Registry::emit`].
    pub fn report(&self, level: Level, err: &(dyn DetailedError + 'static)) -> Result<Emission> {
        self.emit(level, Request::error(err))
    }

    /// Exits the process for terminating emissions, unless no-exit is set.
    pub fn conclude(&self, emission: &Emission) {
        let Some(code) = emission.exit else {
            return;
        };
        if self.no_exit() {
            tracing::debug!(code, level = %emission.level, "exit suppressed");
            return;
        }
        std::process::exit(code);
    }

    /// Exits the process after a failed terminating emission, unless
    /// no-exit is set. Failures of other calls are left to the caller.
    pub fn conclude_failure(&self, err: &OutError) {
        if let OutError::Write { level, exit, .. } = err {
            self.conclude(&Emission {
                level: *level,
                written: 0,
                exit: *exit,
            });
        }
    }

    /// An [`io::Write`](std::io::Write) emitting at `level`.
    ///
    /// # Errors
    ///
    /// [`OutError::InvalidLevel`] for `All` or `Discard`.
    pub fn writer(&self, level: Level) -> Result<LevelWriter> {
        self.channel(level)?;
        Ok(LevelWriter::new(self.clone(), level))
    }

    // =========================================================================
    // Channel configuration
    // =========================================================================

    /// Points `targets` of `level` (or every level) at `sink`.
    ///
    /// # Errors
    ///
    /// [`OutError::InvalidLevel`] for `Discard`, [`OutError::InvalidTarget`]
    /// when `targets` is empty.
    pub fn set_sink(&self, level: Level, sink: &Sink, targets: Target) -> Result<()> {
        let targets = any_target(targets)?;
        for channel in self.channels(level)? {
            channel.set_sink(targets, sink);
        }
        Ok(())
    }

    /// The sink `level` writes to on `target`.
    ///
    /// # Errors
    ///
    /// [`OutError::InvalidLevel`] for non-concrete levels,
    /// [`OutError::InvalidTarget`] unless `target` is exactly one target.
    pub fn sink(&self, level: Level, target: Target) -> Result<Sink> {
        let target = single_target(target)?;
        Ok(self.channel(level)?.sink(target))
    }

    /// Sets the metadata flags of `targets` for `level` (or every level).
    ///
    /// # Errors
    ///
    /// As for [`Registry::set_sink`].
    pub fn set_flags(&self, level: Level, flags: Flags, targets: Target) -> Result<()> {
        let targets = any_target(targets)?;
        for channel in self.channels(level)? {
            channel.set_flags(targets, flags);
        }
        Ok(())
    }

    /// The metadata flags of `level` on `target`, ignoring overrides.
    ///
    /// # Errors
    ///
    /// As for [`Registry::sink`].
    pub fn flags(&self, level: Level, target: Target) -> Result<Flags> {
        let target = single_target(target)?;
        Ok(self.channel(level)?.flags(target))
    }

    /// Sets the severity prefix of `level` (or every level).
    ///
    /// # Errors
    ///
    /// [`OutError::InvalidLevel`] for `Discard`.
    pub fn set_prefix(&self, level: Level, prefix: &str) -> Result<()> {
        for channel in self.channels(level)? {
            channel.set_prefix(prefix);
        }
        Ok(())
    }

    /// The severity prefix of `level`.
    ///
    /// # Errors
    ///
    /// [`OutError::InvalidLevel`] for non-concrete levels.
    pub fn prefix(&self, level: Level) -> Result<String> {
        Ok(self.channel(level)?.prefix())
    }

    /// Installs a formatter on `level` (or every level, sharing one
    /// instance).
    ///
    /// # Errors
    ///
    /// [`OutError::InvalidLevel`] for `Discard`.
    pub fn set_formatter<F: Formatter + 'static>(&self, level: Level, formatter: F) -> Result<()> {
        let formatter: Arc<dyn Formatter> = Arc::new(formatter);
        for channel in self.channels(level)? {
            channel.set_formatter(Some(Arc::clone(&formatter)));
        }
        Ok(())
    }

    /// Removes the formatter from `level` (or every level).
    ///
    /// # Errors
    ///
    /// [`OutError::InvalidLevel`] for `Discard`.
    pub fn clear_formatter(&self, level: Level) -> Result<()> {
        for channel in self.channels(level)? {
            channel.set_formatter(None);
        }
        Ok(())
    }

    /// True when `level` has a formatter.
    ///
    /// # Errors
    ///
    /// [`OutError::InvalidLevel`] for non-concrete levels.
    pub fn has_formatter(&self, level: Level) -> Result<bool> {
        Ok(self.channel(level)?.has_formatter())
    }

    // =========================================================================
    // Shared settings
    // =========================================================================

    /// Sets the threshold of `targets`. `Discard` turns a target off.
    ///
    /// # Errors
    ///
    /// [`OutError::InvalidLevel`] for `All`, [`OutError::InvalidTarget`] when
    /// `targets` is empty.
    pub fn set_threshold(&self, level: Level, targets: Target) -> Result<()> {
        let targets = any_target(targets)?;
        if level == Level::All {
            return Err(OutError::InvalidLevel(level));
        }
        let mut settings = self.settings();
        if targets.contains(Target::SCREEN) {
            settings.screen_threshold = level;
        }
        if targets.contains(Target::LOGFILE) {
            settings.logfile_threshold = level;
        }
        Ok(())
    }

    /// The threshold of a single target.
    ///
    /// # Errors
    ///
    /// [`OutError::InvalidTarget`] unless `target` is exactly one target.
    pub fn threshold(&self, target: Target) -> Result<Level> {
        let target = single_target(target)?;
        Ok(self.settings().threshold(target))
    }

    /// The screen threshold.
    #[must_use]
    pub fn screen_threshold(&self) -> Level {
        self.settings().screen_threshold
    }

    /// The logfile threshold.
    #[must_use]
    pub fn logfile_threshold(&self) -> Level {
        self.settings().logfile_threshold
    }

    /// Turns `targets` off by setting their threshold to `Discard`.
    ///
    /// # Errors
    ///
    /// [`OutError::InvalidTarget`] when `targets` is empty.
    pub fn discard(&self, targets: Target) -> Result<()> {
        self.set_threshold(Level::Discard, targets)
    }

    /// Replaces the stack trace policy.
    pub fn set_stack_trace_config(&self, config: StackTraceConfig) {
        self.settings().stack_trace = config;
    }

    /// The stack trace policy in effect, overrides applied.
    #[must_use]
    pub fn stack_trace_config(&self) -> StackTraceConfig {
        let settings = self.settings();
        settings.overrides.stack_trace_config(settings.stack_trace)
    }

    /// Sets the default error code.
    ///
    /// # Errors
    ///
    /// [`OutError::InvalidCode`] for zero.
    pub fn set_default_code(&self, code: i32) -> Result<()> {
        if code == 0 {
            return Err(OutError::InvalidCode(code));
        }
        self.settings().default_code = code;
        Ok(())
    }

    /// The default error code.
    #[must_use]
    pub fn default_code(&self) -> i32 {
        self.settings().default_code
    }

    /// Sets how many extra frames caller identification skips.
    pub fn set_caller_skip(&self, skip: usize) {
        self.settings().caller_skip = skip;
    }

    /// Extra frames skipped by caller identification.
    #[must_use]
    pub fn caller_skip(&self) -> usize {
        self.settings().caller_skip
    }

    /// Sets the exit code of fatal calls that do not name one.
    pub fn set_error_exit(&self, code: i32) {
        self.settings().error_exit = code;
    }

    /// Exit code of fatal calls that do not name one.
    #[must_use]
    pub fn error_exit(&self) -> i32 {
        self.settings().error_exit
    }

    /// Sets the metadata column widths.
    pub fn set_padding(&self, padding: Padding) {
        self.settings().padding = padding;
    }

    /// Metadata column widths.
    #[must_use]
    pub fn padding(&self) -> Padding {
        self.settings().padding
    }

    /// Declares whether `targets` sit at the start of a line, after I/O
    /// this registry did not see.
    pub fn reset_newline(&self, at_line_start: bool, targets: Target) {
        self.settings().continuity.reset(at_line_start, targets);
    }

    /// True when `target` sits at the start of a line.
    #[must_use]
    pub fn at_line_start(&self, target: Target) -> bool {
        self.settings().continuity.at_line_start(target)
    }

    /// Keeps terminating calls from exiting.
    pub fn set_no_exit(&self, no_exit: bool) {
        self.settings().no_exit = no_exit;
    }

    /// True when terminating calls return instead of exiting.
    #[must_use]
    pub fn no_exit(&self) -> bool {
        self.settings().no_exit()
    }

    /// The environment overrides in effect.
    #[must_use]
    pub fn overrides(&self) -> Overrides {
        self.settings().overrides.clone()
    }

    /// Replaces the overrides.
    pub fn set_overrides(&self, overrides: Overrides) {
        self.settings().overrides = overrides;
    }

    /// Re-reads overrides from the process environment.
    pub fn reload_env(&self) {
        self.set_overrides(Overrides::from_env());
    }

    // =========================================================================
    // Log files
    // =========================================================================

    fn use_log_sink(&self, sink: &Sink, path: PathBuf) {
        for channel in &self.inner.channels {
            channel.set_sink(Target::LOGFILE, sink);
        }
        tracing::debug!(path = %path.display(), "log file in use");
        self.settings().log_file = Some(path);
    }

    /// Appends logfile output of every level to `path`, creating it if
    /// needed. The logfile threshold is left alone.
    ///
    /// # Errors
    ///
    /// [`OutError::LogFile`] when the file cannot be opened.
    pub fn set_log_file(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .map_err(|e| OutError::log_file(path, e))?;
        self.use_log_sink(&Sink::file(file), path.to_path_buf());
        Ok(path.to_path_buf())
    }

    /// Creates a temporary log file named after `prefix`, keeps it after
    /// the process ends, and sends logfile output there.
    ///
    /// # Errors
    ///
    /// [`OutError::LogFile`] when the file cannot be created.
    pub fn use_temp_log_file(&self, prefix: &str) -> Result<PathBuf> {
        let temp = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(".log")
            .tempfile()
            .map_err(|e| OutError::log_file(std::env::temp_dir(), e))?;
        let temp_path = temp.path().to_path_buf();
        let (file, path) = temp
            .keep()
            .map_err(|e| OutError::log_file(temp_path, e.error))?;
        self.use_log_sink(&Sink::file(file), path.clone());
        Ok(path)
    }

    /// Sends logfile output to a [`RotatingFile`] at `path`, returning the
    /// handle used to rotate it.
    ///
    /// # Errors
    ///
    /// [`OutError::LogFile`] when the file cannot be created.
    pub fn set_rotating_log_file(&self, path: impl AsRef<Path>) -> Result<RotatingFile> {
        let path = path.as_ref();
        let file = RotatingFile::open(path).map_err(|e| OutError::log_file(path, e))?;
        self.use_log_sink(&Sink::from_writer(file.clone()), path.to_path_buf());
        Ok(file)
    }

    /// Path of the log file set through this registry, if any.
    #[must_use]
    pub fn log_file_name(&self) -> Option<PathBuf> {
        self.settings().log_file.clone()
    }
}

fn any_target(targets: Target) -> Result<Target> {
    if targets.is_empty() {
        Err(OutError::InvalidTarget(targets))
    } else {
        Ok(targets)
    }
}

fn single_target(target: Target) -> Result<Target> {
    if target == Target::SCREEN || target == Target::LOGFILE {
        Ok(target)
    } else {
        Err(OutError::InvalidTarget(target))
    }
}
