//! Detailed errors: nested, stack-carrying errors that know which output
//! channel they belong to.
//!
//! A [`BaseError`] records a message, an optional numeric code and the stack
//! at the point it was created, and may wrap an inner error. The inner error
//! is either another detailed error or any foreign [`std::error::Error`].
//! Free functions in this module walk such chains:
//!
//! * [`message`] joins the messages from the outermost error inwards.
//! * [`resolve_code`] picks the outermost meaningful code.
//! * [`root_error`] unwraps to the innermost cause.
//! * [`is_error`] matches by identity, code membership or root text.
//!
//! # Example
//!
//! ```rust
//! use leveled_out::detailed::{self, BaseError};
//! use std::io;
//!
//! let refused = io::Error::from(io::ErrorKind::ConnectionRefused);
//! let err = BaseError::wrap_with_code(refused, "cannot reach the build server", 210);
//!
//! assert_eq!(detailed::resolve_code(&err, 100), 210);
//! assert!(detailed::message(&err).starts_with("cannot reach the build server\n"));
//! let root = detailed::root_error(&err);
//! assert!(root.as_std().downcast_ref::<io::Error>().is_some());
//! ```

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;
use std::io;

use parking_lot::Mutex;

use crate::flags::InsertCtrl;
use crate::level::Level;
use crate::prefix::insert_prefix_with_code;
use crate::registry::Registry;
use crate::stack;

/// Upper bound on chain walks, guarding against cyclic `source()` chains.
pub const MAX_UNWRAP_DEPTH: usize = 500;

/// A thread-safe foreign error.
pub type DynError = dyn StdError + Send + Sync + 'static;

/// The output channel an error renders its prefix with.
#[derive(Debug, Clone)]
pub struct ChannelRef {
    registry: Registry,
    level: Level,
}

impl ChannelRef {
    /// Binds to `level`'s channel of `registry`.
    #[must_use]
    pub fn new(registry: Registry, level: Level) -> Self {
        Self { registry, level }
    }

    /// The [`Level::Error`] channel of the process-default registry.
    #[must_use]
    pub fn default_error() -> Self {
        Self::new(crate::global::registry().clone(), Level::Error)
    }

    /// The registry owning the channel.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The channel's level.
    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }
}

/// Behaviour shared by every detailed error, built in or custom.
///
/// Implementors supply their own message and stack; the remaining methods
/// have defaults suitable for errors that carry no code, context or inner
/// error. [`channel`](Self::channel) and [`set_channel`](Self::set_channel)
/// take `&self` because output binds an error to the channel it was
/// reported on.
pub trait DetailedError: StdError + Send + Sync + 'static {
    /// This error's own message, excluding inner errors.
    fn message(&self) -> Cow<'_, str>;

    /// Stack captured when the error was created.
    fn stack(&self) -> &str;

    /// Frames beyond the stack's thread entry point.
    fn context(&self) -> &str {
        ""
    }

    /// Raw error code; 0 means unset.
    fn code(&self) -> i32 {
        0
    }

    /// The wrapped error, if any.
    fn inner(&self) -> Option<&Inner> {
        None
    }

    /// Channel used when rendering with a prefix.
    fn channel(&self) -> ChannelRef {
        ChannelRef::default_error()
    }

    /// Rebinds the error to another channel.
    fn set_channel(&self, _channel: ChannelRef) {}
}

/// An error wrapped by a detailed error.
#[derive(Debug)]
pub enum Inner {
    /// Another detailed error.
    Detailed(Box<dyn DetailedError>),
    /// Any other error.
    Foreign(Box<DynError>),
}

impl Inner {
    /// Wraps a detailed error.
    pub fn detailed<E: DetailedError>(err: E) -> Self {
        Self::Detailed(Box::new(err))
    }

    /// Wraps a foreign error.
    pub fn foreign<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::Foreign(Box::new(err))
    }

    /// Borrows the wrapped error as a chain node.
    #[must_use]
    pub fn as_node(&self) -> ErrorRef<'_> {
        match self {
            Self::Detailed(d) => ErrorRef::Detailed(&**d),
            Self::Foreign(f) => ErrorRef::from_dyn(&**f),
        }
    }

    fn as_std(&self) -> &(dyn StdError + 'static) {
        match self {
            Self::Detailed(d) => &**d,
            Self::Foreign(f) => &**f,
        }
    }
}

impl From<BaseError> for Inner {
    fn from(err: BaseError) -> Self {
        Self::detailed(err)
    }
}

impl From<io::Error> for Inner {
    fn from(err: io::Error) -> Self {
        Self::foreign(err)
    }
}

impl From<Box<DynError>> for Inner {
    fn from(err: Box<DynError>) -> Self {
        match err.downcast::<BaseError>() {
            Ok(base) => Self::Detailed(base),
            Err(other) => Self::Foreign(other),
        }
    }
}

impl From<String> for Inner {
    fn from(msg: String) -> Self {
        Self::Foreign(msg.into())
    }
}

impl From<&str> for Inner {
    fn from(msg: &str) -> Self {
        Self::Foreign(msg.into())
    }
}

/// One node of an error chain.
#[derive(Debug, Clone, Copy)]
pub enum ErrorRef<'a> {
    /// A detailed error.
    Detailed(&'a (dyn DetailedError + 'static)),
    /// Any other error.
    Foreign(&'a (dyn StdError + 'static)),
}

impl<'a> ErrorRef<'a> {
    /// Classifies an arbitrary error, recognizing [`BaseError`].
    #[must_use]
    pub fn from_dyn(err: &'a (dyn StdError + 'static)) -> Self {
        match err.downcast_ref::<BaseError>() {
            Some(base) => Self::Detailed(base),
            None => Self::Foreign(err),
        }
    }

    /// The node as a standard error, for downcasting.
    #[must_use]
    pub fn as_std(self) -> &'a (dyn StdError + 'static) {
        match self {
            Self::Detailed(d) => d,
            Self::Foreign(f) => f,
        }
    }

    /// The detailed error, if this node is one.
    #[must_use]
    pub fn as_detailed(self) -> Option<&'a (dyn DetailedError + 'static)> {
        match self {
            Self::Detailed(d) => Some(d),
            Self::Foreign(_) => None,
        }
    }

    /// The next node inwards: [`DetailedError::inner`] for detailed nodes,
    /// [`std::error::Error::source`] for foreign ones.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Detailed(d) => d.inner().map(Inner::as_node),
            Self::Foreign(f) => f.source().map(Self::from_dyn),
        }
    }

    /// Iterates this node and everything it wraps, at most
    /// [`MAX_UNWRAP_DEPTH`] nodes.
    #[must_use]
    pub fn chain(self) -> Chain<'a> {
        Chain {
            next: Some(self),
            remaining: MAX_UNWRAP_DEPTH,
        }
    }

    /// True when both refer to the same error value.
    #[must_use]
    pub fn same_as(self, other: ErrorRef<'_>) -> bool {
        std::ptr::addr_eq(
            self.as_std() as *const dyn StdError,
            other.as_std() as *const dyn StdError,
        )
    }

    /// Default code of the registry this node reports to.
    fn default_code(self) -> i32 {
        match self {
            Self::Detailed(d) => d.channel().registry().default_code(),
            Self::Foreign(_) => crate::global::registry().default_code(),
        }
    }
}

impl fmt::Display for ErrorRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.as_std(), f)
    }
}

impl<'a> From<&'a BaseError> for ErrorRef<'a> {
    fn from(err: &'a BaseError) -> Self {
        Self::Detailed(err)
    }
}

impl<'a> From<&'a (dyn DetailedError + 'static)> for ErrorRef<'a> {
    fn from(err: &'a (dyn DetailedError + 'static)) -> Self {
        Self::Detailed(err)
    }
}

impl<'a> From<&'a (dyn StdError + 'static)> for ErrorRef<'a> {
    fn from(err: &'a (dyn StdError + 'static)) -> Self {
        Self::from_dyn(err)
    }
}

impl<'a> From<&'a DynError> for ErrorRef<'a> {
    fn from(err: &'a DynError) -> Self {
        Self::from_dyn(err)
    }
}

impl<'a> From<&'a io::Error> for ErrorRef<'a> {
    fn from(err: &'a io::Error) -> Self {
        Self::Foreign(err)
    }
}

impl<'a> From<&'a Inner> for ErrorRef<'a> {
    fn from(inner: &'a Inner) -> Self {
        inner.as_node()
    }
}

/// Iterator over an error chain, outermost first.
#[derive(Debug, Clone)]
pub struct Chain<'a> {
    next: Option<ErrorRef<'a>>,
    remaining: usize,
}

impl<'a> Iterator for Chain<'a> {
    type Item = ErrorRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let current = self.next.take()?;
        self.next = current.next();
        Some(current)
    }
}

/// The built-in detailed error.
///
/// Wrapping never changes the inner error; only the bound channel is
/// mutable after construction.
#[derive(Debug)]
pub struct BaseError {
    message: String,
    code: i32,
    stack: String,
    context: String,
    inner: Option<Inner>,
    channel: Mutex<Option<ChannelRef>>,
}

impl BaseError {
    fn build(message: String, code: i32, inner: Option<Inner>) -> Self {
        let (stack, context) = stack::capture(0);
        Self {
            message,
            code,
            stack,
            context,
            inner,
            channel: Mutex::new(None),
        }
    }

    /// A new error without a code.
    pub fn new(message: impl Into<String>) -> Self {
        Self::build(message.into(), 0, None)
    }

    /// A new error with a code.
    pub fn with_code(message: impl Into<String>, code: i32) -> Self {
        Self::build(message.into(), code, None)
    }

    /// Wraps `inner` with a message.
    pub fn wrap(inner: impl Into<Inner>, message: impl Into<String>) -> Self {
        Self::build(message.into(), 0, Some(inner.into()))
    }

    /// Wraps `inner` with a message and a code.
    pub fn wrap_with_code(inner: impl Into<Inner>, message: impl Into<String>, code: i32) -> Self {
        Self::build(message.into(), code, Some(inner.into()))
    }

    /// A new error from format arguments: `BaseError::from_fmt(format_args!(..))`.
    #[must_use]
    pub fn from_fmt(args: fmt::Arguments<'_>) -> Self {
        Self::new(fmt::format(args))
    }

    /// Wraps `inner` with a message built from format arguments.
    pub fn wrap_fmt(inner: impl Into<Inner>, args: fmt::Arguments<'_>) -> Self {
        Self::wrap(inner, fmt::format(args))
    }
}

impl fmt::Display for BaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&message(self))
    }
}

impl StdError for BaseError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.as_ref().map(Inner::as_std)
    }
}

impl DetailedError for BaseError {
    fn message(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.message)
    }

    fn stack(&self) -> &str {
        &self.stack
    }

    fn context(&self) -> &str {
        &self.context
    }

    fn code(&self) -> i32 {
        self.code
    }

    fn inner(&self) -> Option<&Inner> {
        self.inner.as_ref()
    }

    fn channel(&self) -> ChannelRef {
        self.channel.lock().clone().unwrap_or_else(ChannelRef::default_error)
    }

    fn set_channel(&self, channel: ChannelRef) {
        *self.channel.lock() = Some(channel);
    }
}

/// Joins the chain's messages, outermost first, one per line. The walk
/// ends at the first foreign error, whose display text is the last line.
/// A node with an empty message still takes a line.
pub fn message<'a>(err: impl Into<ErrorRef<'a>>) -> String {
    let mut parts: Vec<Cow<'a, str>> = Vec::new();
    for node in err.into().chain() {
        match node {
            ErrorRef::Detailed(d) => parts.push(d.message()),
            ErrorRef::Foreign(f) => {
                parts.push(Cow::Owned(f.to_string()));
                break;
            }
        }
    }
    parts.join("\n")
}

/// The outermost code that is neither 0 nor `default_code`, else
/// `default_code`.
pub fn resolve_code<'a>(err: impl Into<ErrorRef<'a>>, default_code: i32) -> i32 {
    err.into()
        .chain()
        .filter_map(ErrorRef::as_detailed)
        .map(|d| d.code())
        .find(|&code| code != 0 && code != default_code)
        .unwrap_or(default_code)
}

/// Like [`resolve_code`], using the default code of the registry the error
/// is bound to.
pub fn code<'a>(err: impl Into<ErrorRef<'a>>) -> i32 {
    let err = err.into();
    resolve_code(err, err.default_code())
}

/// Stack of the innermost detailed error, the one closest to the fault.
pub fn innermost_stack<'a>(err: impl Into<ErrorRef<'a>>) -> Option<&'a str> {
    err.into()
        .chain()
        .filter_map(ErrorRef::as_detailed)
        .last()
        .map(|d| d.stack())
        .filter(|s| !s.is_empty())
}

/// Unwraps to the innermost error. An error with nothing to unwrap is its
/// own root.
pub fn root_error<'a>(err: impl Into<ErrorRef<'a>>) -> ErrorRef<'a> {
    let mut current = err.into();
    for _ in 0..MAX_UNWRAP_DEPTH {
        match current.next() {
            Some(next) => current = next,
            None => return current,
        }
    }
    tracing::warn!(
        depth = MAX_UNWRAP_DEPTH,
        error = %current,
        "error chain too deep, stopping unwrap"
    );
    current
}

/// Tests whether `err` matches.
///
/// With neither a target nor codes nothing matches. Otherwise `err` matches
/// when it is the target itself, when any detailed error in its chain
/// carries one of `codes` (0 and the default code never match), or when its
/// root error displays the same text as the target.
pub fn is_error<'a>(
    err: impl Into<ErrorRef<'a>>,
    target: Option<ErrorRef<'_>>,
    codes: &[i32],
) -> bool {
    let err = err.into();
    if target.is_none() && codes.is_empty() {
        return false;
    }
    if target.is_some_and(|t| err.same_as(t)) {
        return true;
    }
    if !codes.is_empty() {
        let default_code = err.default_code();
        let hit = err
            .chain()
            .filter_map(ErrorRef::as_detailed)
            .map(|d| d.code())
            .any(|c| c != 0 && c != default_code && codes.contains(&c));
        if hit {
            return true;
        }
    }
    target.is_some_and(|t| root_error(err).to_string() == t.to_string())
}

/// Options for [`render`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Append a blank line and the innermost stack trace.
    pub stack_trace: bool,
    /// Only the outermost message.
    pub shallow: bool,
    /// Prefix every line with the bound channel's prefix and code.
    pub prefix: bool,
}

/// Renders a detailed error as text.
///
/// With every option off this is [`message`]. The prefix comes from the
/// error's bound channel, with the resolved code spliced in when it is
/// meaningful, so a bound [`Level::Error`] channel yields lines like
/// `Error #1233: ...`.
pub fn render(err: &(dyn DetailedError + 'static), options: RenderOptions) -> String {
    let node = ErrorRef::Detailed(err);
    let mut text = if options.shallow {
        err.message().into_owned()
    } else {
        message(node)
    };
    if options.stack_trace {
        if let Some(stack) = innermost_stack(node) {
            text.push_str("\n\nStack Trace: ");
            text.push_str(stack);
        }
    }
    if options.prefix {
        let channel = err.channel();
        let registry = channel.registry();
        let default_code = registry.default_code();
        let code = resolve_code(node, default_code);
        if let Ok(prefix) = registry.prefix(channel.level()) {
            text = insert_prefix_with_code(&text, &prefix, InsertCtrl::ALWAYS, code, default_code);
        }
    }
    text
}
