//! The prefix engine.
//!
//! Prefixing happens in two passes. The first places the literal severity
//! prefix (`"Issue: "`, optionally carrying an error code) on each line; the
//! second places a metadata leader (pid, level, date, time, caller) in front
//! of that. Keeping the passes separate keeps the severity prefix next to the
//! message text and lets a formatter suppress both.

use std::borrow::Cow;
use std::fmt::Write as _;

use chrono::{DateTime, Local};

use crate::flags::{Flags, InsertCtrl};
use crate::level::Level;
use crate::stack::CallerInfo;

/// Column widths used to align the file and function metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Padding {
    /// Width reserved for `file.rs:line`.
    pub short_file: usize,
    /// Width reserved for `/full/path/file.rs:line`.
    pub long_file: usize,
    /// Width reserved for a short function name.
    pub short_func: usize,
    /// Width reserved for a full function path.
    pub long_func: usize,
}

impl Default for Padding {
    fn default() -> Self {
        Self {
            short_file: 16,
            long_file: 55,
            short_func: 14,
            long_func: 30,
        }
    }
}

/// Places " #<code>" just before the only colon of `prefix`.
///
/// Nothing is spliced when the code is 0 or the default code, or when the
/// prefix does not contain exactly one colon.
#[must_use]
pub fn splice_code(prefix: &str, code: i32, default_code: i32) -> Cow<'_, str> {
    if code == 0 || code == default_code || prefix.matches(':').count() != 1 {
        return Cow::Borrowed(prefix);
    }
    match prefix.split_once(':') {
        Some((head, tail)) => Cow::Owned(format!("{head} #{code}:{tail}")),
        None => Cow::Borrowed(prefix),
    }
}

/// Places `prefix` in front of each line of `s` according to `ctrl`.
///
/// * [`InsertCtrl::ALWAYS`] prefixes every line and disables the other bits.
/// * [`InsertCtrl::SKIP_FIRST_LINE`] leaves the first line bare.
/// * [`InsertCtrl::BLANK`] inserts spaces as wide as the prefix instead.
///
/// A trailing empty line (the text after a final newline) is never
/// prefixed, so `"a\n"` becomes `"P: a\n"`. [`InsertCtrl::SMART`] must be
/// resolved by the caller into `SKIP_FIRST_LINE` before calling this.
///
/// ```rust
/// use leveled_out::{InsertCtrl, insert_prefix};
///
/// assert_eq!(insert_prefix("a\nb\n", "Note: ", InsertCtrl::empty()), "Note: a\nNote: b\n");
/// assert_eq!(insert_prefix("a\nb", "Note: ", InsertCtrl::SKIP_FIRST_LINE), "a\nNote: b");
/// ```
#[must_use]
pub fn insert_prefix(s: &str, prefix: &str, ctrl: InsertCtrl) -> String {
    if prefix.is_empty() {
        return s.to_string();
    }
    let ctrl = if ctrl.contains(InsertCtrl::ALWAYS) {
        InsertCtrl::empty()
    } else {
        ctrl
    };
    let blank;
    let pfx = if ctrl.contains(InsertCtrl::BLANK) {
        blank = " ".repeat(prefix.chars().count());
        blank.as_str()
    } else {
        prefix
    };

    let lines: Vec<&str> = s.split('\n').collect();
    let last = lines.len() - 1;
    let mut out = String::with_capacity(s.len() + lines.len() * pfx.len());
    for (idx, line) in lines.iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        let bare =
            (idx == last && line.is_empty()) || (idx == 0 && ctrl.contains(InsertCtrl::SKIP_FIRST_LINE));
        if !bare {
            out.push_str(pfx);
        }
        out.push_str(line);
    }
    out
}

/// Like [`insert_prefix`], splicing a meaningful error code into the prefix
/// first (see [`splice_code`]).
#[must_use]
pub fn insert_prefix_with_code(
    s: &str,
    prefix: &str,
    ctrl: InsertCtrl,
    code: i32,
    default_code: i32,
) -> String {
    insert_prefix(s, &splice_code(prefix, code, default_code), ctrl)
}

/// Writes the metadata leader selected by `flags` into `buf`.
///
/// `buf` is cleared first so a channel can reuse one scratch buffer.
pub fn format_leader(
    buf: &mut String,
    flags: Flags,
    level: Level,
    caller: &CallerInfo,
    now: &DateTime<Local>,
    padding: &Padding,
) {
    buf.clear();
    if flags.contains(Flags::PID) {
        let _ = write!(buf, "[{}] ", std::process::id());
    }
    if flags.contains(Flags::LEVEL) {
        let _ = write!(buf, "{:<8}", level.as_str());
    }
    if flags.contains(Flags::DATE) {
        let _ = write!(buf, "{} ", now.format("%Y/%m/%d"));
    }
    if flags.intersects(Flags::TIME | Flags::MICROSECONDS) {
        let _ = write!(buf, "{}", now.format("%H:%M:%S"));
        if flags.contains(Flags::MICROSECONDS) {
            let _ = write!(buf, ".{:06}", now.timestamp_subsec_micros());
        }
        buf.push(' ');
    }

    let file = if flags.contains(Flags::SHORTFILE) {
        Some((caller.short_file(), padding.short_file))
    } else if flags.contains(Flags::LONGFILE) {
        Some((caller.file.as_str(), padding.long_file))
    } else {
        None
    };
    let func = if flags.contains(Flags::SHORTFUNC) {
        Some((caller.short_function(), padding.short_func))
    } else if flags.contains(Flags::LONGFUNC) {
        Some((caller.function.as_str(), padding.long_func))
    } else {
        None
    };

    // The location is padded as a whole and closed with ": ".
    let (location, width) = match (file, func) {
        (Some((f, fw)), Some((func, cw))) => (format!("{f}:{}:{func}", caller.line), fw + cw),
        (Some((f, fw)), None) => (format!("{f}:{} ", caller.line), fw),
        (None, Some((func, cw))) => (func.to_string(), cw),
        (None, None) => return,
    };
    let _ = write!(buf, "{location:<width$}: ");
}

/// Decides whether debug-scope filtering hides this output.
///
/// Only [`Level::Debug`] and [`Level::Trace`] are filtered, and only when
/// the caller's function was resolved. Output survives when the function
/// name contains any of the comma separated `scope` substrings.
#[must_use]
pub fn scope_suppresses(level: Level, scope: Option<&str>, caller: &CallerInfo) -> bool {
    let Some(scope) = scope.filter(|s| !s.is_empty()) else {
        return false;
    };
    if !matches!(level, Level::Debug | Level::Trace) || !caller.is_known() {
        return false;
    }
    !scope
        .split(',')
        .filter(|part| !part.is_empty())
        .any(|part| caller.function.contains(part))
}
