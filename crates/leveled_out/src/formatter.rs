//! Message formatting hook.

use crate::flags::Target;
use crate::level::Level;

/// Result of running a [`Formatter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formatted {
    /// Replacement message.
    pub message: String,
    /// Targets whose output is dropped entirely for this call.
    pub suppress: Target,
    /// Use `message` verbatim, without severity prefix or metadata.
    pub skip_native_prefix: bool,
}

impl Formatted {
    /// Leaves the message untouched with native prefixing on.
    #[must_use]
    pub fn passthrough(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suppress: Target::empty(),
            skip_native_prefix: false,
        }
    }
}

/// Rewrites messages for a level before they are prefixed and written.
///
/// Called once per emission, not once per target. `code` is the resolved
/// error code (the default when none was attached), `stack` is only filled
/// at [`Level::Issue`] and above, and `dying` is true when the call
/// terminates the process.
///
/// Any `Fn(&str, Level, i32, &str, bool) -> Formatted` closure is a formatter:
///
/// ```rust
/// use leveled_out::{Formatted, Level, Registry, Target};
///
/// let registry = Registry::new();
/// registry
///     .set_formatter(Level::Note, |msg: &str, _: Level, _: i32, _: &str, _: bool| Formatted {
///         message: msg.to_uppercase(),
///         suppress: Target::empty(),
///         skip_native_prefix: false,
///     })
///     .unwrap();
/// ```
pub trait Formatter: Send + Sync {
    /// Produces the message and suppression decision for one emission.
    fn format_message(
        &self,
        message: &str,
        level: Level,
        code: i32,
        stack: &str,
        dying: bool,
    ) -> Formatted;
}

impl<F> Formatter for F
where
    F: Fn(&str, Level, i32, &str, bool) -> Formatted + Send + Sync,
{
    fn format_message(
        &self,
        message: &str,
        level: Level,
        code: i32,
        stack: &str,
        dying: bool,
    ) -> Formatted {
        self(message, level, code, stack, dying)
    }
}
