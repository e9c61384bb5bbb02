//! Free functions over the process-default registry.
//!
//! The default registry is built from the environment on first use. Every
//! function here forwards to it and then acts on the result. Terminating
//! calls exit with their code, even when a write fails. Other write
//! failures are reported on stderr and exit with `-1`. Configuration
//! mistakes are reported as fatal output. Setting no-exit
//! (see [`set_no_exit`] or `LEVELED_OUT_NO_EXIT=1`) turns every exit into a
//! return.
//!
//! ```rust,no_run
//! use leveled_out::{global, notef};
//!
//! global::info("starting up\n");
//! notef!("{} files skipped\n", 3);
//! global::issue_exit(2, "missing argument: --target\n");
//! ```

use std::fmt::{self, Display};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::channel::LevelWriter;
use crate::detailed::DetailedError;
use crate::error::{OutError, Result};
use crate::flags::{Flags, StackTraceConfig, Target};
use crate::formatter::Formatter;
use crate::level::Level;
use crate::registry::{Registry, Request};
use crate::sink::Sink;

static DEFAULT: LazyLock<Registry> = LazyLock::new(Registry::from_env);

/// The process-default registry.
#[must_use]
pub fn registry() -> &'static Registry {
    &DEFAULT
}

fn run(level: Level, request: Request<'_>) {
    let registry = registry();
    match registry.emit(level, request) {
        Ok(emission) => registry.conclude(&emission),
        Err(err) if err.is_config() => config_failure(&err),
        Err(err) => write_failure(registry, &err),
    }
}

/// Reports a failed write on stderr. A terminating call still exits with
/// its own code; any other call exits with `-1`.
fn write_failure(registry: &Registry, err: &OutError) {
    let _ = writeln!(io::stderr(), "leveled_out: {err}");
    if !registry.no_exit() {
        std::process::exit(err.exit_code().unwrap_or(-1));
    }
}

/// Reports a configuration mistake as fatal output.
fn config_failure(err: &OutError) {
    let registry = registry();
    let message = format!("invalid output configuration: {err}\n");
    match registry.emit(Level::Fatal, Request::text(message)) {
        Ok(emission) => registry.conclude(&emission),
        Err(write_err) => write_failure(registry, &write_err),
    }
}

/// Unwraps a configuration result, treating errors as fatal.
fn ensure<T: Default>(result: Result<T>) -> T {
    result.unwrap_or_else(|err| {
        config_failure(&err);
        T::default()
    })
}

macro_rules! level_fns {
    ($( $level:ident => $plain:ident, $line:ident; )*) => {
        $(
            #[doc = concat!("Writes `msg` at [`Level::", stringify!($level), "`].")]
            pub fn $plain(msg: impl Display) {
                run(Level::$level, Request::text(msg.to_string()));
            }

            #[doc = concat!("Writes `msg` and a newline at [`Level::", stringify!($level), "`].")]
            pub fn $line(msg: impl Display) {
                run(Level::$level, Request::text(format!("{msg}\n")));
            }
        )*
    };
}

level_fns! {
    Trace => trace, traceln;
    Debug => debug, debugln;
    Verbose => verbose, verboseln;
    Info => info, infoln;
    Note => note, noteln;
    Issue => issue, issueln;
    Error => error, errorln;
    Fatal => fatal, fatalln;
    Info => print, println;
}

/// Writes `msg` at [`Level::Issue`] and exits with `code`.
pub fn issue_exit(code: i32, msg: impl Display) {
    run(Level::Issue, Request::text(msg.to_string()).with_exit(code));
}

/// Writes `msg` at [`Level::Error`] and exits with `code`.
pub fn error_exit(code: i32, msg: impl Display) {
    run(Level::Error, Request::text(msg.to_string()).with_exit(code));
}

/// Writes `msg` at [`Level::Fatal`] and exits with `code` instead of the
/// error exit value.
pub fn fatal_exit(code: i32, msg: impl Display) {
    run(Level::Fatal, Request::text(msg.to_string()).with_exit(code));
}

/// Exits with `code`, finishing any partial line and adding a stack trace
/// when the policy asks for one.
pub fn exit(code: i32) {
    let registry = registry();
    match registry.exit(code) {
        Ok(emission) => registry.conclude(&emission),
        Err(err) => write_failure(registry, &err),
    }
}

/// Writes a detailed error at `level`, prefixing its code when meaningful.
pub fn report(level: Level, err: &(dyn DetailedError + 'static)) {
    run(level, Request::error(err));
}

/// Writes a detailed error at `level` and exits with `code`.
pub fn report_exit(level: Level, err: &(dyn DetailedError + 'static), code: i32) {
    run(level, Request::error(err).with_exit(code));
}

/// Formats and writes at `level`. Used by the formatting macros.
#[doc(hidden)]
pub fn write_fmt(level: Level, args: fmt::Arguments<'_>) {
    let message = args
        .as_str()
        .map_or_else(|| fmt::format(args), str::to_string);
    run(level, Request::text(message));
}

/// An [`io::Write`] emitting at `level`. An invalid level is reported as
/// fatal and yields a writer at [`Level::Fatal`].
#[must_use]
pub fn writer(level: Level) -> LevelWriter {
    ensure(registry().writer(level).map(Some))
        .unwrap_or_else(|| LevelWriter::new(registry().clone(), Level::Fatal))
}

/// Points `targets` of `level` (or every level) at `sink`.
pub fn set_sink(level: Level, sink: &Sink, targets: Target) {
    ensure(registry().set_sink(level, sink, targets));
}

/// Sets the threshold of `targets`.
pub fn set_threshold(level: Level, targets: Target) {
    ensure(registry().set_threshold(level, targets));
}

/// Turns `targets` off.
pub fn discard(targets: Target) {
    ensure(registry().discard(targets));
}

/// Sets the metadata flags of `targets` for `level` (or every level).
pub fn set_flags(level: Level, flags: Flags, targets: Target) {
    ensure(registry().set_flags(level, flags, targets));
}

/// Sets the severity prefix of `level` (or every level).
pub fn set_prefix(level: Level, prefix: &str) {
    ensure(registry().set_prefix(level, prefix));
}

/// Installs a formatter on `level` (or every level).
pub fn set_formatter<F: Formatter + 'static>(level: Level, formatter: F) {
    ensure(registry().set_formatter(level, formatter));
}

/// Removes the formatter from `level` (or every level).
pub fn clear_formatter(level: Level) {
    ensure(registry().clear_formatter(level));
}

/// Replaces the stack trace policy.
pub fn set_stack_trace_config(config: StackTraceConfig) {
    registry().set_stack_trace_config(config);
}

/// Sets the default error code.
pub fn set_default_code(code: i32) {
    ensure(registry().set_default_code(code));
}

/// Declares whether `targets` sit at the start of a line.
pub fn reset_newline(at_line_start: bool, targets: Target) {
    registry().reset_newline(at_line_start, targets);
}

/// Keeps terminating calls from exiting.
pub fn set_no_exit(no_exit: bool) {
    registry().set_no_exit(no_exit);
}

/// Appends logfile output to `path`.
pub fn set_log_file(path: impl AsRef<Path>) -> PathBuf {
    ensure(registry().set_log_file(path))
}

/// Sends logfile output to a kept temporary file and returns its path.
pub fn use_temp_log_file(prefix: &str) -> PathBuf {
    ensure(registry().use_temp_log_file(prefix))
}

/// Path of the current log file, if one was set.
#[must_use]
pub fn log_file_name() -> Option<PathBuf> {
    registry().log_file_name()
}

/// Formats and writes at [`Level::Trace`].
#[macro_export]
macro_rules! tracef {
    ($($arg:tt)*) => { $crate::global::write_fmt($crate::Level::Trace, format_args!($($arg)*)) };
}

/// Formats and writes at [`Level::Debug`].
#[macro_export]
macro_rules! debugf {
    ($($arg:tt)*) => { $crate::global::write_fmt($crate::Level::Debug, format_args!($($arg)*)) };
}

/// Formats and writes at [`Level::Verbose`].
#[macro_export]
macro_rules! verbosef {
    ($($arg:tt)*) => { $crate::global::write_fmt($crate::Level::Verbose, format_args!($($arg)*)) };
}

/// Formats and writes at [`Level::Info`].
#[macro_export]
macro_rules! infof {
    ($($arg:tt)*) => { $crate::global::write_fmt($crate::Level::Info, format_args!($($arg)*)) };
}

/// Formats and writes at [`Level::Note`].
#[macro_export]
macro_rules! notef {
    ($($arg:tt)*) => { $crate::global::write_fmt($crate::Level::Note, format_args!($($arg)*)) };
}

/// Formats and writes at [`Level::Issue`].
#[macro_export]
macro_rules! issuef {
    ($($arg:tt)*) => { $crate::global::write_fmt($crate::Level::Issue, format_args!($($arg)*)) };
}

/// Formats and writes at [`Level::Error`].
#[macro_export]
macro_rules! errorf {
    ($($arg:tt)*) => { $crate::global::write_fmt($crate::Level::Error, format_args!($($arg)*)) };
}

/// Formats and writes at [`Level::Fatal`], then exits.
#[macro_export]
macro_rules! fatalf {
    ($($arg:tt)*) => { $crate::global::write_fmt($crate::Level::Fatal, format_args!($($arg)*)) };
}

/// Formats and writes at [`Level::Info`].
#[macro_export]
macro_rules! printf {
    ($($arg:tt)*) => { $crate::global::write_fmt($crate::Level::Info, format_args!($($arg)*)) };
}
