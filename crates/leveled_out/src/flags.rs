//! Bit sets used across the pipeline: output targets, metadata flags,
//! prefix insertion control and stack trace triggers.

use bitflags::bitflags;

use crate::level::Level;

bitflags! {
    /// Output targets a call applies to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Target: u8 {
        /// The interactive screen stream.
        const SCREEN = 1 << 0;
        /// The logfile stream.
        const LOGFILE = 1 << 1;
        /// Both streams.
        const BOTH = Self::SCREEN.bits() | Self::LOGFILE.bits();
    }
}

impl Target {
    /// Short lowercase name for a single target, used in diagnostics.
    #[must_use]
    pub fn name(self) -> &'static str {
        if self == Self::SCREEN {
            "screen"
        } else if self == Self::LOGFILE {
            "logfile"
        } else if self == Self::BOTH {
            "both"
        } else {
            "none"
        }
    }
}

bitflags! {
    /// Metadata inserted in front of each output line.
    ///
    /// With every flag on, a line looks like:
    ///
    /// ```text
    /// [4242] NOTE    2024/01/23 01:23:23.123123 main.rs:23:run:      Note: message
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Flags: u16 {
        /// The date: `2009/01/23`.
        const DATE = 1 << 0;
        /// The time: `01:23:23`.
        const TIME = 1 << 1;
        /// Microsecond resolution: `01:23:23.123123`. Implies `TIME`.
        const MICROSECONDS = 1 << 2;
        /// Full file path and line number.
        const LONGFILE = 1 << 3;
        /// Final file name element and line number; overrides `LONGFILE`.
        const SHORTFILE = 1 << 4;
        /// Full function path.
        const LONGFUNC = 1 << 5;
        /// Final function name segment; overrides `LONGFUNC`.
        const SHORTFUNC = 1 << 6;
        /// Process id.
        const PID = 1 << 7;
        /// Level name, padded to eight columns.
        const LEVEL = 1 << 8;

        /// Date and time, as the classic logger does.
        const STD = Self::DATE.bits() | Self::TIME.bits();
        /// Default screen flags for the trace and debug channels.
        const SCREEN_DEFAULT = Self::TIME.bits() | Self::MICROSECONDS.bits();
        /// Default logfile flags for every channel.
        const LOGFILE_DEFAULT = Self::PID.bits()
            | Self::LEVEL.bits()
            | Self::DATE.bits()
            | Self::TIME.bits()
            | Self::MICROSECONDS.bits()
            | Self::SHORTFILE.bits()
            | Self::SHORTFUNC.bits();
    }
}

impl Flags {
    /// Parses a comma separated flag list such as `"pid,level,time"`.
    ///
    /// Recognized tokens: `debug`, `all`, `longall`, `pid`, `level`, `date`,
    /// `time`, `micro`/`microseconds`, `file`/`shortfile`, `longfile`,
    /// `func`/`shortfunc`, `longfunc` and `off`, which clears everything
    /// gathered so far. Unknown tokens are ignored.
    #[must_use]
    pub fn parse_list(list: &str) -> Self {
        let mut flags = Self::empty();
        for token in list.split(',').map(str::trim) {
            match token {
                "debug" => {
                    flags |= Self::LEVEL
                        | Self::TIME
                        | Self::MICROSECONDS
                        | Self::SHORTFILE
                        | Self::SHORTFUNC;
                }
                "all" => flags |= Self::LOGFILE_DEFAULT,
                "longall" => {
                    flags |= Self::PID
                        | Self::LEVEL
                        | Self::DATE
                        | Self::TIME
                        | Self::MICROSECONDS
                        | Self::LONGFILE
                        | Self::LONGFUNC;
                }
                "pid" => flags |= Self::PID,
                "level" => flags |= Self::LEVEL,
                "date" => flags |= Self::DATE,
                "time" => flags |= Self::TIME,
                "micro" | "microseconds" => flags |= Self::MICROSECONDS,
                "file" | "shortfile" => flags |= Self::SHORTFILE,
                "longfile" => flags |= Self::LONGFILE,
                "func" | "shortfunc" => flags |= Self::SHORTFUNC,
                "longfunc" => flags |= Self::LONGFUNC,
                "off" => flags = Self::empty(),
                _ => {}
            }
        }
        flags
    }

    /// True when rendering needs the caller's file, line or function.
    #[must_use]
    pub fn needs_caller(self) -> bool {
        self.intersects(Self::SHORTFILE | Self::LONGFILE | Self::SHORTFUNC | Self::LONGFUNC)
    }
}

bitflags! {
    /// Controls how [`insert_prefix`](crate::prefix::insert_prefix) places a
    /// prefix on each line.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct InsertCtrl: u8 {
        /// Prefix every line; disables every other control bit.
        const ALWAYS = 1 << 0;
        /// Let newline continuity decide whether the first line is prefixed.
        const SMART = 1 << 1;
        /// Insert spaces the width of the prefix instead of the prefix.
        const BLANK = 1 << 2;
        /// Leave the first line bare.
        const SKIP_FIRST_LINE = 1 << 3;
    }
}

bitflags! {
    /// Conditions under which a stack trace is appended to output.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct TraceTrigger: u8 {
        /// Any terminating call, whatever its exit code.
        const ANY_EXIT = 1 << 0;
        /// Terminating calls with a non-zero exit code.
        const NONZERO_EXIT = 1 << 1;
        /// Every message at [`Level::Issue`] or above.
        const ALL_ISSUES = 1 << 2;
    }
}

/// Which targets get stack traces, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StackTraceConfig {
    /// Targets that receive traces.
    pub targets: Target,
    /// Conditions that produce a trace.
    pub triggers: TraceTrigger,
}

impl Default for StackTraceConfig {
    fn default() -> Self {
        Self {
            targets: Target::LOGFILE,
            triggers: TraceTrigger::NONZERO_EXIT,
        }
    }
}

impl StackTraceConfig {
    /// Creates a config for the given targets and triggers.
    #[must_use]
    pub fn new(targets: Target, triggers: TraceTrigger) -> Self {
        Self { targets, triggers }
    }

    /// Config that never produces a stack trace.
    #[must_use]
    pub fn never() -> Self {
        Self::new(Target::empty(), TraceTrigger::empty())
    }

    /// Parses a comma separated override such as `"both,allissues"`.
    ///
    /// Target tokens: `screen`, `logfile`, `both`. Trigger tokens:
    /// `exit`/`anyexit`, `nonzero`/`errorexit`, `issues`/`allissues`, and
    /// `never`/`off` which clears triggers. Unknown tokens are ignored.
    #[must_use]
    pub fn parse(spec: &str) -> Self {
        let mut config = Self::never();
        for token in spec.split(',').map(str::trim) {
            match token {
                "screen" => config.targets |= Target::SCREEN,
                "logfile" => config.targets |= Target::LOGFILE,
                "both" => config.targets |= Target::BOTH,
                "exit" | "anyexit" => config.triggers |= TraceTrigger::ANY_EXIT,
                "nonzero" | "errorexit" => config.triggers |= TraceTrigger::NONZERO_EXIT,
                "issues" | "allissues" => config.triggers |= TraceTrigger::ALL_ISSUES,
                "never" | "off" => config.triggers = TraceTrigger::empty(),
                _ => {}
            }
        }
        config
    }

    /// Decides whether `target` gets a trace for a call at `level`.
    ///
    /// `exit` is `Some(code)` for terminating calls.
    #[must_use]
    pub fn warrants(&self, target: Target, level: Level, exit: Option<i32>) -> bool {
        if !self.targets.contains(target) {
            return false;
        }
        let t = self.triggers;
        (t.contains(TraceTrigger::ALL_ISSUES) && level.is_severe())
            || (t.contains(TraceTrigger::ANY_EXIT) && exit.is_some())
            || (t.contains(TraceTrigger::NONZERO_EXIT) && exit.is_some_and(|code| code != 0))
    }

    /// Adds non-zero exit traces on both targets.
    #[must_use]
    pub fn with_nonzero_exit_everywhere(mut self) -> Self {
        self.targets |= Target::BOTH;
        self.triggers |= TraceTrigger::NONZERO_EXIT;
        self
    }
}
