//! Stack trace capture and caller identification.
//!
//! Both walk the current thread's backtrace, drop the frames that belong to
//! the capture machinery and this crate's emission code, and start at the
//! first frame of user code. Capturing and resolving a backtrace is the most
//! expensive step on the output path (~100μs or more), so callers only do it
//! when metadata or a trace actually needs it.

use std::fmt::Write as _;
use std::thread;

use backtrace::Backtrace;

/// Crate path prefix used to recognize this library's own frames.
const CRATE_PATH: &str = "leveled_out::";

/// Symbols that mark the bottom of a thread's user stack.
const THREAD_ENTRY_MARKERS: [&str; 3] = ["__rust_begin_short_backtrace", "lang_start", "thread_start"];

/// Fallback used when a frame cannot be resolved.
const UNKNOWN: &str = "???";

/// One resolved symbol of a backtrace frame.
#[derive(Debug, Clone)]
struct FrameLine {
    function: String,
    file: String,
    line: u32,
}

/// Resolves the current backtrace into one entry per symbol (inlined frames
/// included), innermost first.
fn resolved_frames() -> Vec<FrameLine> {
    let bt = Backtrace::new();
    let mut lines = Vec::with_capacity(bt.frames().len());
    for frame in bt.frames() {
        for symbol in frame.symbols() {
            let function = symbol
                .name()
                .map(|n| format!("{n:#}"))
                .unwrap_or_else(|| "<unknown>".to_string());
            let file = symbol
                .filename()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<unknown>".to_string());
            lines.push(FrameLine {
                function,
                file,
                line: symbol.lineno().unwrap_or(0),
            });
        }
    }
    lines
}

fn trimmed(function: &str) -> &str {
    function.trim_start_matches('<')
}

/// Frames from the backtrace crate or from this crate's non-test code.
fn is_machinery(function: &str) -> bool {
    let name = trimmed(function);
    name.starts_with("backtrace::")
        || (name.starts_with(CRATE_PATH) && !name.contains("::tests::"))
}

/// Standard library frames, which can sit between user code and ours when
/// output goes through `io::Write` or `fmt` adapters.
fn is_runtime(function: &str) -> bool {
    let name = trimmed(function);
    name.starts_with("std::") || name.starts_with("core::") || name.starts_with("alloc::")
}

fn is_thread_entry(function: &str) -> bool {
    THREAD_ENTRY_MARKERS.iter().any(|m| function.contains(m))
}

/// Index of the first user frame after skipping `skip` extra frames.
fn user_start(frames: &[FrameLine], skip: usize) -> usize {
    let first = frames
        .iter()
        .position(|f| !is_machinery(&f.function) && !is_runtime(&f.function))
        .unwrap_or(frames.len());
    (first + skip).min(frames.len())
}

fn render_frames(frames: &[FrameLine], out: &mut String) {
    for frame in frames {
        if !out.is_empty() {
            out.push('\n');
        }
        let _ = write!(out, "{}\n\t{}:{}", frame.function, frame.file, frame.line);
    }
}

/// Captures the current thread's stack.
///
/// Returns `(current, context)`: `current` is a header naming the thread
/// followed by one function/location pair per frame, from the first user
/// frame (plus `skip` extra frames) down to the thread's entry point;
/// `context` holds whatever frames lie beyond that point, usually runtime
/// start-up code. Capture never fails; unresolvable frames render as
/// `<unknown>`.
#[must_use]
pub fn capture(skip: usize) -> (String, String) {
    let frames = resolved_frames();
    let start = user_start(&frames, skip);
    let end = frames[start..]
        .iter()
        .position(|f| is_thread_entry(&f.function))
        .map_or(frames.len(), |offset| start + offset);

    let thread = thread::current();
    let mut current = format!("thread '{}' [running]:", thread.name().unwrap_or("<unnamed>"));
    render_frames(&frames[start..end], &mut current);

    let mut context = String::new();
    render_frames(&frames[end..], &mut context);

    tracing::trace!(frames = end - start, skip, "captured stack");
    (current, context)
}

/// Caller information extracted from the call stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerInfo {
    /// Source file path.
    pub file: String,
    /// Line number.
    pub line: u32,
    /// Fully qualified function name.
    pub function: String,
}

impl CallerInfo {
    /// Placeholder used when the caller cannot be identified.
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            file: UNKNOWN.to_string(),
            line: 0,
            function: UNKNOWN.to_string(),
        }
    }

    /// True when the function name was resolved.
    #[must_use]
    pub fn is_known(&self) -> bool {
        self.function != UNKNOWN
    }

    /// Identifies the first frame of user code, skipping `skip` extra frames
    /// for callers that wrap this library in their own helpers.
    ///
    /// # Performance Warning
    ///
    /// This captures and symbolizes a full backtrace. Metadata insertion only
    /// calls it when file or function flags are on, or a debug scope is set.
    #[must_use]
    pub fn capture(skip: usize) -> Self {
        let frames = resolved_frames();
        let start = user_start(&frames, skip);
        frames
            .get(start)
            .filter(|f| !is_thread_entry(&f.function))
            .map(|f| Self {
                file: f.file.clone(),
                line: f.line,
                function: f.function.clone(),
            })
            .unwrap_or_else(Self::unknown)
    }

    /// File name without its directories.
    #[must_use]
    pub fn short_file(&self) -> &str {
        trim_caller_path(&self.file, 1)
    }

    /// Final segment of the function path, ignoring closure segments.
    #[must_use]
    pub fn short_function(&self) -> &str {
        self.function
            .rsplit("::")
            .find(|segment| !segment.starts_with("{{closure"))
            .unwrap_or(&self.function)
    }
}

/// Trims a path to its last `n` segments.
fn trim_caller_path(path: &str, n: usize) -> &str {
    if n == 0 {
        return path;
    }

    let mut last_idx = path.len();
    for _ in 0..n {
        if let Some(idx) = path[..last_idx].rfind(['/', '\\']) {
            last_idx = idx;
        } else {
            return path;
        }
    }

    &path[last_idx + 1..]
}
