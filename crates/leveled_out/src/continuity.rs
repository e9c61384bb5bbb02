//! Newline continuity tracking for the two output targets.

use crate::flags::{InsertCtrl, Target};

/// Whether the last committed write to each target ended a line.
///
/// Both targets start at the beginning of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Continuity {
    screen: bool,
    logfile: bool,
}

impl Default for Continuity {
    fn default() -> Self {
        Self {
            screen: true,
            logfile: true,
        }
    }
}

impl Continuity {
    /// True when `target` sits at the start of a line. With several targets,
    /// all of them must.
    #[must_use]
    pub fn at_line_start(&self, target: Target) -> bool {
        (!target.contains(Target::SCREEN) || self.screen)
            && (!target.contains(Target::LOGFILE) || self.logfile)
    }

    /// Records committed bytes for `target`. Empty writes change nothing.
    pub fn record(&mut self, target: Target, bytes: &[u8]) {
        if let Some(&last) = bytes.last() {
            self.reset(last == b'\n', target);
        }
    }

    /// Declares the cursor position for `targets` after I/O this crate did
    /// not see, such as reading a line of user input.
    pub fn reset(&mut self, at_line_start: bool, targets: Target) {
        if targets.contains(Target::SCREEN) {
            self.screen = at_line_start;
        }
        if targets.contains(Target::LOGFILE) {
            self.logfile = at_line_start;
        }
    }

    /// Resolves [`InsertCtrl::SMART`] for `target`: when the target is mid
    /// line the first line of the next write continues it unprefixed.
    #[must_use]
    pub fn resolve(&self, target: Target, ctrl: InsertCtrl) -> InsertCtrl {
        if ctrl.contains(InsertCtrl::SMART) && !self.at_line_start(target) {
            ctrl | InsertCtrl::SKIP_FIRST_LINE
        } else {
            ctrl
        }
    }
}
