#![forbid(unsafe_code)]
// Allow pedantic lints for early-stage API ergonomics.
#![allow(clippy::nursery)]
#![allow(clippy::pedantic)]

//! # Leveled Out
//!
//! Leveled output for command line tools, written to two targets at once:
//! the screen (stdout/stderr) and a log file.
//!
//! Leveled Out provides:
//! - Eight levels, from `Trace` up to `Fatal`, each with its own prefix,
//!   sinks, metadata flags and optional formatter
//! - Independent screen and logfile thresholds
//! - Metadata leaders (time, level, caller, pid) per line, with newline
//!   continuity so a line written in pieces is only prefixed once
//! - Detailed errors that carry a code, a stack and an inner cause
//! - Stack traces on severe output, driven by a configurable policy
//!
//! ## Example
//!
//! ```rust
//! use leveled_out::{BaseError, Buffer, Level, Registry, Request, Target};
//!
//! let registry = Registry::new();
//! let screen = Buffer::new();
//! registry.set_sink(Level::All, &screen.sink(), Target::SCREEN).unwrap();
//!
//! let _ = registry.emit(Level::Info, Request::text("copying files\n")).unwrap();
//! let _ = registry.emit(Level::Verbose, Request::text("hidden below the threshold\n")).unwrap();
//!
//! let err = BaseError::with_code("no space left on device", 28);
//! let _ = registry.report(Level::Issue, &err).unwrap();
//!
//! assert_eq!(
//!     screen.contents(),
//!     "copying files\nIssue #28: no space left on device\n"
//! );
//! ```
//!
//! ## Process-default output
//!
//! The [`global`] module forwards to one registry configured from the
//! environment, with terminating calls that exit the process:
//!
//! ```rust,no_run
//! use leveled_out::{Level, global, infof};
//!
//! global::set_threshold(Level::Verbose, leveled_out::Target::SCREEN);
//! infof!("{} of {} done\n", 3, 4);
//! global::error_exit(2, "aborting\n");
//! ```

mod channel;
pub mod config;
mod continuity;
pub mod detailed;
mod error;
mod flags;
mod formatter;
pub mod global;
pub mod json;
mod level;
mod prefix;
mod registry;
mod rotate;
mod sink;
pub mod stack;

pub use channel::LevelWriter;
pub use config::Overrides;
pub use continuity::Continuity;
pub use detailed::{
    BaseError, ChannelRef, DetailedError, ErrorRef, Inner, RenderOptions, is_error, root_error,
};
pub use error::{OutError, Result};
pub use flags::{Flags, InsertCtrl, StackTraceConfig, Target, TraceTrigger};
pub use formatter::{Formatted, Formatter};
pub use json::{JsonOptions, pretty_json};
pub use level::{Level, ParseLevelError, ParseResult};
pub use prefix::{Padding, insert_prefix, insert_prefix_with_code, splice_code};
pub use registry::{DEFAULT_CODE, Emission, Options, Registry, Request};
pub use rotate::RotatingFile;
pub use sink::{Buffer, Sink};
pub use stack::CallerInfo;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{
        BaseError, Buffer, DetailedError, Flags, Formatted, Formatter, Level, OutError, Registry,
        Request, Sink, StackTraceConfig, Target,
    };
}
