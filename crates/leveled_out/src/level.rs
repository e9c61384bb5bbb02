//! Output levels and their names.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Output level for filtering and routing messages.
///
/// Levels are ordered from most verbose ([`Level::Trace`]) to
/// [`Level::Discard`], which never produces output. [`Level::All`] is a
/// wildcard accepted only by bulk configuration calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Level {
    /// Very detailed debug output.
    Trace = 0,
    /// Standard debug output.
    Debug = 1,
    /// Verbose user output.
    Verbose = 2,
    /// Normal user output (the default screen threshold).
    Info = 3,
    /// Something the user should pay attention to.
    Note = 4,
    /// An expected usage problem, such as a bad flag value.
    Issue = 5,
    /// An unexpected or system error.
    Error = 6,
    /// A fatal error; output at this level terminates.
    Fatal = 7,
    /// Threshold meaning "emit nothing".
    Discard = 8,
    /// Wildcard for bulk configuration calls.
    All = 9,
}

impl Level {
    /// The eight levels that own an output channel, in order.
    pub const CONCRETE: [Self; 8] = [
        Self::Trace,
        Self::Debug,
        Self::Verbose,
        Self::Info,
        Self::Note,
        Self::Issue,
        Self::Error,
        Self::Fatal,
    ];

    /// Returns the upper-case name used in metadata and configuration.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Verbose => "VERBOSE",
            Self::Info => "INFO",
            Self::Note => "NOTE",
            Self::Issue => "ISSUE",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
            Self::Discard => "DISCARD",
            Self::All => "ALL",
        }
    }

    /// Maps a raw index to a level, clamping out-of-range values to
    /// [`Level::Trace`] or [`Level::Discard`].
    #[must_use]
    pub fn clamp_index(index: i64) -> Self {
        match index {
            i64::MIN..=0 => Self::Trace,
            1 => Self::Debug,
            2 => Self::Verbose,
            3 => Self::Info,
            4 => Self::Note,
            5 => Self::Issue,
            6 => Self::Error,
            7 => Self::Fatal,
            _ => Self::Discard,
        }
    }

    /// Returns true for levels that own a channel.
    #[must_use]
    pub fn is_concrete(&self) -> bool {
        !matches!(self, Self::Discard | Self::All)
    }

    /// Returns true at or above [`Level::Issue`], where stack traces apply.
    #[must_use]
    pub fn is_severe(&self) -> bool {
        self.is_concrete() && *self >= Self::Issue
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl PartialOrd for Level {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Level {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (*self as u8).cmp(&(*other as u8))
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TRACE" => Ok(Self::Trace),
            "DEBUG" => Ok(Self::Debug),
            "VERBOSE" => Ok(Self::Verbose),
            "INFO" | "PRINT" => Ok(Self::Info),
            "NOTE" => Ok(Self::Note),
            "ISSUE" => Ok(Self::Issue),
            "ERROR" => Ok(Self::Error),
            "FATAL" => Ok(Self::Fatal),
            "DISCARD" => Ok(Self::Discard),
            "ALL" => Ok(Self::All),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown level name.
///
/// Accepted names are the upper-case level names (case-insensitive), plus
/// `print` as an alias for `info`.
///
/// ```rust
/// use leveled_out::Level;
///
/// assert_eq!("note".parse::<Level>().unwrap(), Level::Note);
/// assert!("warn".parse::<Level>().is_err());
/// ```
#[derive(Error, Debug, Clone)]
#[error("invalid level: {0:?}")]
pub struct ParseLevelError(String);

/// A specialized [`Result`] type for level parsing operations.
pub type ParseResult<T> = std::result::Result<T, ParseLevelError>;
