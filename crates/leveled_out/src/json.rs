//! Pretty-printing for JSON text destined for output.

use std::sync::LazyLock;

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::error::Result;

/// JSON pretty-printing options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonOptions {
    /// Spaces per nesting level.
    pub indent: usize,
    /// Text placed at the start of every line after the first.
    pub prefix: String,
    /// Return the input untouched.
    pub raw: bool,
}

impl Default for JsonOptions {
    fn default() -> Self {
        Self {
            indent: 2,
            prefix: String::new(),
            raw: false,
        }
    }
}

static OPTIONS: LazyLock<RwLock<JsonOptions>> = LazyLock::new(|| RwLock::new(JsonOptions::default()));

/// The process-wide options used by [`pretty_json`].
#[must_use]
pub fn json_options() -> JsonOptions {
    OPTIONS.read().clone()
}

/// Replaces the process-wide options used by [`pretty_json`].
pub fn set_json_options(options: JsonOptions) {
    *OPTIONS.write() = options;
}

/// Pretty-prints `input` with the process-wide options.
///
/// # Errors
///
/// [`OutError::Json`](crate::OutError::Json) when `input` is not JSON.
pub fn pretty_json(input: &[u8]) -> Result<String> {
    pretty_json_with(input, &json_options())
}

/// Pretty-prints `input`. Object keys keep their order.
///
/// ```rust
/// use leveled_out::json::{JsonOptions, pretty_json_with};
///
/// let out = pretty_json_with(br#"{"b":1,"a":[true]}"#, &JsonOptions::default()).unwrap();
/// assert_eq!(out, "{\n  \"b\": 1,\n  \"a\": [\n    true\n  ]\n}");
/// ```
///
/// # Errors
///
/// [`OutError::Json`](crate::OutError::Json) when `input` is not JSON.
pub fn pretty_json_with(input: &[u8], options: &JsonOptions) -> Result<String> {
    if options.raw {
        return Ok(String::from_utf8_lossy(input).into_owned());
    }
    let value: serde_json::Value = serde_json::from_slice(input)?;
    let indent = " ".repeat(options.indent);
    let mut out = Vec::with_capacity(input.len() * 2);
    let mut ser = serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(indent.as_bytes()));
    value.serialize(&mut ser)?;
    let text = String::from_utf8_lossy(&out).into_owned();
    if options.prefix.is_empty() {
        Ok(text)
    } else {
        Ok(text.replace('\n', &format!("\n{}", options.prefix)))
    }
}
