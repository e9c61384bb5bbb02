//! Environment overrides.
//!
//! Overrides are read once when a registry is built from the environment
//! (and again on [`Registry::reload_env`](crate::Registry::reload_env)),
//! never on the output path.

use crate::flags::{Flags, StackTraceConfig, Target};

/// Replaces the screen metadata flags of every level, e.g. `"debug"`.
pub const SCREEN_FLAGS_VAR: &str = "LEVELED_OUT_SCREEN_FLAGS";
/// Replaces the logfile metadata flags of every level.
pub const LOGFILE_FLAGS_VAR: &str = "LEVELED_OUT_LOGFILE_FLAGS";
/// Comma separated function-name substrings that keep debug output.
pub const DEBUG_SCOPE_VAR: &str = "LEVELED_OUT_DEBUG_SCOPE";
/// Replaces the stack trace policy, e.g. `"both,allissues"`.
pub const STACK_TRACE_CONFIG_VAR: &str = "LEVELED_OUT_STACK_TRACE_CONFIG";
/// `off` makes metadata prefix every line regardless of continuity.
pub const SMART_FLAGS_PREFIX_VAR: &str = "LEVELED_OUT_SMART_FLAGS_PREFIX";
/// `1` keeps terminating calls from exiting.
pub const NO_EXIT_VAR: &str = "LEVELED_OUT_NO_EXIT";
/// `1` adds stack traces on non-zero exits for both targets.
pub const NONZERO_EXIT_STACKTRACE_VAR: &str = "LEVELED_OUT_NONZERO_EXIT_STACKTRACE";

/// Overrides resolved from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// Screen flags used instead of each channel's own.
    pub screen_flags: Option<Flags>,
    /// Logfile flags used instead of each channel's own.
    pub logfile_flags: Option<Flags>,
    /// Debug scope filter.
    pub debug_scope: Option<String>,
    /// Stack trace policy used instead of the configured one.
    pub stack_trace: Option<StackTraceConfig>,
    /// Metadata always prefixes the first line.
    pub smart_prefix_off: bool,
    /// Terminating calls return instead of exiting.
    pub no_exit: bool,
    /// Non-zero exits trace on both targets.
    pub nonzero_exit_stacktrace: bool,
}

impl Overrides {
    /// Reads the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads overrides through `lookup`, which maps a variable name to its
    /// value. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            screen_flags: get(SCREEN_FLAGS_VAR).map(|v| Flags::parse_list(&v)),
            logfile_flags: get(LOGFILE_FLAGS_VAR).map(|v| Flags::parse_list(&v)),
            debug_scope: get(DEBUG_SCOPE_VAR),
            stack_trace: get(STACK_TRACE_CONFIG_VAR).map(|v| StackTraceConfig::parse(&v)),
            smart_prefix_off: get(SMART_FLAGS_PREFIX_VAR)
                .is_some_and(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "off" | "0" | "false")),
            no_exit: get(NO_EXIT_VAR).is_some_and(|v| truthy(&v)),
            nonzero_exit_stacktrace: get(NONZERO_EXIT_STACKTRACE_VAR).is_some_and(|v| truthy(&v)),
        }
    }

    /// The flag override for a single target.
    #[must_use]
    pub fn flags(&self, target: Target) -> Option<Flags> {
        if target == Target::SCREEN {
            self.screen_flags
        } else if target == Target::LOGFILE {
            self.logfile_flags
        } else {
            None
        }
    }

    /// Applies the stack trace overrides to `configured`.
    #[must_use]
    pub fn stack_trace_config(&self, configured: StackTraceConfig) -> StackTraceConfig {
        let config = self.stack_trace.unwrap_or(configured);
        if self.nonzero_exit_stacktrace {
            config.with_nonzero_exit_everywhere()
        } else {
            config
        }
    }
}

fn truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::TraceTrigger;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> Overrides {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Overrides::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_empty_environment() {
        assert_eq!(lookup(&[]), Overrides::default());
    }

    #[test]
    fn test_all_overrides() {
        let o = lookup(&[
            (SCREEN_FLAGS_VAR, "debug"),
            (LOGFILE_FLAGS_VAR, "off"),
            (DEBUG_SCOPE_VAR, "app::db,app::net"),
            (STACK_TRACE_CONFIG_VAR, "both,never"),
            (SMART_FLAGS_PREFIX_VAR, "off"),
            (NO_EXIT_VAR, "1"),
            (NONZERO_EXIT_STACKTRACE_VAR, "1"),
        ]);
        assert!(o.screen_flags.is_some_and(|f| f.contains(Flags::SHORTFUNC)));
        assert_eq!(o.flags(Target::LOGFILE), Some(Flags::empty()));
        assert_eq!(o.debug_scope.as_deref(), Some("app::db,app::net"));
        assert!(o.smart_prefix_off);
        assert!(o.no_exit);

        let config = o.stack_trace_config(StackTraceConfig::default());
        assert_eq!(config.targets, Target::BOTH);
        assert_eq!(config.triggers, TraceTrigger::NONZERO_EXIT);
    }

    #[test]
    fn test_blank_values_are_unset() {
        let o = lookup(&[(DEBUG_SCOPE_VAR, "  "), (NO_EXIT_VAR, "0")]);
        assert!(o.debug_scope.is_none());
        assert!(!o.no_exit);
    }

    #[test]
    fn test_configured_policy_kept_without_override() {
        let configured = StackTraceConfig::new(Target::SCREEN, TraceTrigger::ALL_ISSUES);
        assert_eq!(Overrides::default().stack_trace_config(configured), configured);
    }
}
