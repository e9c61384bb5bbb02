//! End-to-end tests for leveled output through a `Registry`.
//!
//! Tests cover:
//! - Screen and logfile thresholds
//! - Prefixes, codes and metadata leaders
//! - Newline continuity across calls
//! - Formatters and target suppression
//! - Terminating calls and stack traces
//! - Log files, rotation and write failures
//! - Routing of every level and concurrent emission

#![allow(clippy::uninlined_format_args)]

use leveled_out::prelude::*;
use leveled_out::{InsertCtrl, Overrides, RenderOptions, TraceTrigger, detailed, insert_prefix};
use std::io::{self, Write};

/// A registry with both targets captured and a bare logfile leader.
fn captured() -> (Registry, Buffer, Buffer) {
    let registry = Registry::new();
    let screen = Buffer::new();
    let logfile = Buffer::new();
    registry.set_sink(Level::All, &screen.sink(), Target::SCREEN).unwrap();
    registry.set_sink(Level::All, &logfile.sink(), Target::LOGFILE).unwrap();
    registry.set_flags(Level::All, Flags::LEVEL, Target::LOGFILE).unwrap();
    registry.set_flags(Level::All, Flags::empty(), Target::SCREEN).unwrap();
    registry.set_stack_trace_config(StackTraceConfig::never());
    registry.set_no_exit(true);
    (registry, screen, logfile)
}

// ===========================================================================
// 1. Thresholds
// ===========================================================================

#[test]
fn thresholds_route_each_level() {
    let (registry, screen, logfile) = captured();
    registry.set_threshold(Level::Info, Target::SCREEN).unwrap();
    registry.set_threshold(Level::Note, Target::LOGFILE).unwrap();

    let _ = registry.emit(Level::Verbose, Request::text("chatter\n")).unwrap();
    let _ = registry.emit(Level::Info, Request::text("building\n")).unwrap();
    let _ = registry.emit(Level::Note, Request::text("cache cold\n")).unwrap();

    assert_eq!(screen.contents(), "building\nNote: cache cold\n");
    assert_eq!(logfile.contents(), "NOTE    Note: cache cold\n");
}

#[test]
fn default_code_is_not_shown() {
    let (registry, screen, _) = captured();
    let plain = BaseError::new("plain failure");
    let coded = BaseError::with_code("coded failure", 42);
    let default = BaseError::with_code("default failure", leveled_out::DEFAULT_CODE);

    let _ = registry.report(Level::Issue, &plain).unwrap();
    let _ = registry.report(Level::Issue, &coded).unwrap();
    let _ = registry.report(Level::Issue, &default).unwrap();

    assert_eq!(
        screen.contents(),
        "Issue: plain failure\nIssue #42: coded failure\nIssue: default failure\n"
    );
}

#[test]
fn discard_silences_a_target() {
    let (registry, screen, logfile) = captured();
    registry.set_threshold(Level::Trace, Target::BOTH).unwrap();
    registry.discard(Target::SCREEN).unwrap();

    let emission = registry.emit(Level::Fatal, Request::text("gone\n")).unwrap();
    assert!(screen.is_empty());
    assert_eq!(logfile.contents(), "FATAL   Fatal: gone\n");
    assert_eq!(emission.exit, Some(1));
}

#[test]
fn invalid_levels_are_rejected() {
    let registry = Registry::new();
    for level in [Level::All, Level::Discard] {
        let err = registry.emit(level, Request::text("x")).unwrap_err();
        assert!(matches!(err, OutError::InvalidLevel(l) if l == level));
        assert!(err.is_config());
    }
    assert!(registry.set_threshold(Level::Note, Target::empty()).is_err());
    assert!(registry.set_default_code(0).is_err());
}

// ===========================================================================
// 2. Newline continuity
// ===========================================================================

#[test]
fn partial_lines_are_continued_without_prefix() {
    let (registry, screen, _) = captured();
    let _ = registry.emit(Level::Note, Request::text("checking ")).unwrap();
    let _ = registry.emit(Level::Note, Request::text("ok\nsecond line\n")).unwrap();
    assert_eq!(screen.contents(), "Note: checking ok\nNote: second line\n");
}

#[test]
fn reset_newline_restores_prefixing() {
    let (registry, screen, _) = captured();
    let _ = registry.emit(Level::Info, Request::text("Continue? [y/n] ")).unwrap();
    assert!(!registry.at_line_start(Target::SCREEN));

    // The user's answer and its newline were echoed by the terminal.
    registry.reset_newline(true, Target::SCREEN);
    let _ = registry.emit(Level::Note, Request::text("proceeding\n")).unwrap();

    assert_eq!(screen.contents(), "Continue? [y/n] Note: proceeding\n");
    assert!(registry.at_line_start(Target::SCREEN));
}

#[test]
fn targets_track_continuity_independently() {
    let (registry, screen, logfile) = captured();
    registry.set_threshold(Level::Info, Target::LOGFILE).unwrap();
    registry.set_threshold(Level::Note, Target::SCREEN).unwrap();

    let _ = registry.emit(Level::Info, Request::text("log only ")).unwrap();
    let _ = registry.emit(Level::Note, Request::text("both\n")).unwrap();

    assert_eq!(screen.contents(), "Note: both\n");
    assert_eq!(logfile.contents(), "INFO    log only both\n");
}

#[test]
fn terminating_call_finishes_partial_line() {
    let (registry, screen, _) = captured();
    let _ = registry.emit(Level::Info, Request::text("working...")).unwrap();
    let emission = registry.exit(3).unwrap();
    assert_eq!(emission.exit, Some(3));
    assert_eq!(screen.contents(), "working...\n");
}

// ===========================================================================
// 3. Metadata
// ===========================================================================

#[test]
fn blank_insertion_aligns_continuation_lines() {
    let out = insert_prefix("a\nb\n", "Note: ", InsertCtrl::BLANK);
    assert_eq!(out, "      a\n      b\n");
}

#[test]
fn flag_override_replaces_channel_flags() {
    let (registry, _, logfile) = captured();
    registry.set_threshold(Level::Info, Target::LOGFILE).unwrap();
    registry.set_overrides(Overrides {
        logfile_flags: Some(Flags::empty()),
        ..Overrides::default()
    });
    let _ = registry.emit(Level::Note, Request::text("bare\n")).unwrap();
    assert_eq!(logfile.contents(), "Note: bare\n");
}

#[test]
fn caller_metadata_names_the_test() {
    let (registry, screen, _) = captured();
    registry.set_flags(Level::Note, Flags::SHORTFUNC, Target::SCREEN).unwrap();
    let _ = registry.emit(Level::Note, Request::text("here\n")).unwrap();
    let out = screen.contents();
    assert!(
        out.starts_with("caller_metadata_names_the_test:") || out.starts_with("???"),
        "{:?}",
        out
    );
    assert!(out.ends_with("Note: here\n"), "{:?}", out);
}

#[test]
fn debug_scope_filters_debug_output() {
    let (registry, screen, _) = captured();
    registry.set_threshold(Level::Trace, Target::SCREEN).unwrap();
    registry.set_overrides(Overrides {
        debug_scope: Some("no_such_function".to_string()),
        ..Overrides::default()
    });

    let _ = registry.emit(Level::Debug, Request::text("filtered\n")).unwrap();
    let _ = registry.emit(Level::Note, Request::text("kept\n")).unwrap();

    assert_eq!(screen.contents(), "Note: kept\n");

    registry.set_overrides(Overrides {
        debug_scope: Some("debug_scope_filters".to_string()),
        ..Overrides::default()
    });
    let _ = registry.emit(Level::Debug, Request::text("in scope\n")).unwrap();
    assert_eq!(screen.contents(), "Note: kept\nDebug: in scope\n");
}

// ===========================================================================
// 4. Formatters
// ===========================================================================

#[test]
fn formatter_rewrites_and_suppresses() {
    let (registry, screen, logfile) = captured();
    registry.set_threshold(Level::Note, Target::LOGFILE).unwrap();
    registry
        .set_formatter(Level::Note, |msg: &str, _: Level, _: i32, _: &str, _: bool| Formatted {
            message: msg.to_uppercase(),
            suppress: Target::LOGFILE,
            skip_native_prefix: false,
        })
        .unwrap();

    let _ = registry.emit(Level::Note, Request::text("quiet please\n")).unwrap();
    assert_eq!(screen.contents(), "Note: QUIET PLEASE\n");
    assert!(logfile.is_empty());

    registry.clear_formatter(Level::Note).unwrap();
    let _ = registry.emit(Level::Note, Request::text("normal\n")).unwrap();
    assert_eq!(logfile.contents(), "NOTE    Note: normal\n");
}

#[test]
fn formatter_can_skip_native_prefix() {
    let (registry, screen, _) = captured();
    registry
        .set_formatter(Level::All, |msg: &str, level: Level, code: i32, _: &str, dying: bool| {
            Formatted {
                message: format!("<{} {} {}> {}", level.as_str(), code, dying, msg),
                suppress: Target::empty(),
                skip_native_prefix: true,
            }
        })
        .unwrap();

    let err = BaseError::with_code("bad input", 7);
    let _ = registry.report(Level::Error, &err).unwrap();
    assert_eq!(screen.contents(), "<ERROR 7 false> bad input\n");
}

// ===========================================================================
// 5. Stack traces and exits
// ===========================================================================

#[test]
fn nonzero_exit_traces_to_logfile() {
    let (registry, screen, logfile) = captured();
    registry.set_threshold(Level::Trace, Target::LOGFILE).unwrap();
    registry.set_flags(Level::All, Flags::empty(), Target::LOGFILE).unwrap();
    registry.set_stack_trace_config(StackTraceConfig::default());

    let emission = registry.emit(Level::Fatal, Request::text("shutting down")).unwrap();
    assert_eq!(emission.exit, Some(1));
    registry.conclude(&emission);

    assert_eq!(screen.contents(), "Fatal: shutting down\n");
    let log = logfile.contents();
    assert!(
        log.starts_with("Fatal: shutting down\nFatal: Stack Trace: thread '"),
        "{}",
        log
    );
    assert!(log.lines().all(|line| line.starts_with("Fatal: ")), "{}", log);
}

#[test]
fn zero_exit_has_no_trace_by_default() {
    let (registry, _, logfile) = captured();
    registry.set_threshold(Level::Trace, Target::LOGFILE).unwrap();
    registry.set_stack_trace_config(StackTraceConfig::default());

    let _ = registry.exit(0).unwrap();
    assert!(!logfile.contents().contains("Stack Trace"));

    registry.set_stack_trace_config(StackTraceConfig::new(Target::LOGFILE, TraceTrigger::ANY_EXIT));
    let _ = registry.exit(0).unwrap();
    assert!(logfile.contents().contains("Stack Trace: thread '"));
}

#[test]
fn issue_exit_carries_requested_code() {
    let (registry, screen, _) = captured();
    let emission = registry
        .emit(Level::Issue, Request::text("missing --input\n").with_exit(2))
        .unwrap();
    assert_eq!(emission.exit, Some(2));
    assert_eq!(screen.contents(), "Issue: missing --input\n");
}

// ===========================================================================
// 6. Rendering bound errors
// ===========================================================================

#[test]
fn reported_error_renders_with_its_channel_prefix() {
    let (registry, _, _) = captured();
    let err = BaseError::with_code("disk on fire", 1233);
    let _ = registry.report(Level::Note, &err).unwrap();

    let text = detailed::render(
        &err,
        RenderOptions {
            prefix: true,
            ..RenderOptions::default()
        },
    );
    assert_eq!(text, "Error #1233: disk on fire");

    let text = detailed::render(
        &err,
        RenderOptions {
            prefix: true,
            stack_trace: true,
            ..RenderOptions::default()
        },
    );
    assert!(text.contains("Error #1233: Stack Trace: thread '"), "{}", text);
}

// ===========================================================================
// 7. Writers, log files and failures
// ===========================================================================

#[test]
fn level_writer_emits_at_its_level() {
    let (registry, screen, _) = captured();
    let mut w = registry.writer(Level::Issue).unwrap();
    write!(w, "{} retries left", 2).unwrap();
    writeln!(w).unwrap();
    assert_eq!(screen.contents(), "Issue: 2 retries left\n");
    assert!(registry.writer(Level::All).is_err());
}

#[test]
fn log_file_receives_logfile_output() {
    let dir = tempfile::tempdir().unwrap();
    let (registry, _, _) = captured();
    registry.set_threshold(Level::Info, Target::LOGFILE).unwrap();
    let path = registry.set_log_file(dir.path().join("run.log")).unwrap();
    assert_eq!(registry.log_file_name().as_deref(), Some(path.as_path()));

    let _ = registry.emit(Level::Info, Request::text("started\n")).unwrap();
    let _ = registry.emit(Level::Verbose, Request::text("skipped\n")).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents, "INFO    started\n");
}

#[test]
fn rotating_log_file_starts_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let (registry, _, _) = captured();
    registry.set_threshold(Level::Info, Target::LOGFILE).unwrap();
    let file = registry.set_rotating_log_file(dir.path().join("app.log")).unwrap();

    let _ = registry.emit(Level::Info, Request::text("before\n")).unwrap();
    let moved = file.rotate().unwrap().expect("existing file is moved aside");
    let _ = registry.emit(Level::Info, Request::text("after\n")).unwrap();

    assert_eq!(std::fs::read_to_string(&moved).unwrap(), "INFO    before\n");
    assert_eq!(std::fs::read_to_string(file.path()).unwrap(), "INFO    after\n");
}

struct BrokenPipe;

impl Write for BrokenPipe {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn write_failure_is_returned_and_logged() {
    let (registry, _, logfile) = captured();
    registry.set_threshold(Level::Info, Target::LOGFILE).unwrap();
    registry
        .set_sink(Level::All, &Sink::from_writer(BrokenPipe), Target::SCREEN)
        .unwrap();

    let events = Buffer::new();
    let writer = events.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();

    let result = tracing::subscriber::with_default(subscriber, || {
        registry.emit(Level::Note, Request::text("lost\n"))
    });

    let err = result.unwrap_err();
    assert!(matches!(err, OutError::Write { target, .. } if target == Target::SCREEN));
    assert!(!err.is_config());
    // Screen goes first; the failed call writes nothing to the logfile.
    assert!(logfile.is_empty());
    assert!(events.contents().contains("output write failed"), "{}", events.contents());
}

#[test]
fn failed_terminating_write_keeps_exit_code() {
    let (registry, _, _) = captured();
    registry
        .set_sink(Level::All, &Sink::from_writer(BrokenPipe), Target::SCREEN)
        .unwrap();

    let err = registry
        .emit(Level::Fatal, Request::text("fatal boom\n").with_exit(7))
        .unwrap_err();
    assert_eq!(err.exit_code(), Some(7));

    let err = registry.emit(Level::Note, Request::text("lost\n")).unwrap_err();
    assert_eq!(err.exit_code(), None);

    // With no-exit set, concluding the failure returns.
    let err = registry
        .emit(Level::Error, Request::text("failed\n").with_exit(3))
        .unwrap_err();
    registry.conclude_failure(&err);
    assert_eq!(err.exit_code(), Some(3));
}

#[test]
fn failed_fatal_writer_reports_exit_code() {
    let (registry, _, _) = captured();
    registry
        .set_sink(Level::All, &Sink::from_writer(BrokenPipe), Target::SCREEN)
        .unwrap();

    let mut w = registry.writer(Level::Fatal).unwrap();
    let io_err = w.write(b"fatal boom\n").unwrap_err();
    let err = io_err
        .get_ref()
        .and_then(|e| e.downcast_ref::<OutError>())
        .expect("write error wraps the output error");
    assert_eq!(err.exit_code(), Some(1));
}

// ===========================================================================
// 8. Full routing and concurrency
// ===========================================================================

#[test]
fn every_level_routes_by_target_threshold() {
    let (registry, screen, logfile) = captured();
    registry.set_threshold(Level::Info, Target::SCREEN).unwrap();
    registry.set_threshold(Level::Note, Target::LOGFILE).unwrap();

    for (level, text) in [
        (Level::Trace, "trace\n"),
        (Level::Debug, "debug\n"),
        (Level::Verbose, "verbose\n"),
        (Level::Info, "info\n"),
        (Level::Note, "note\n"),
    ] {
        let _ = registry.emit(level, Request::text(text)).unwrap();
    }
    for (level, name) in [(Level::Issue, "issue"), (Level::Error, "error"), (Level::Fatal, "fatal")] {
        let coded = BaseError::with_code(format!("{name} coded"), 42);
        let plain = BaseError::with_code(format!("{name} plain"), leveled_out::DEFAULT_CODE);
        let _ = registry.report(level, &coded).unwrap();
        let _ = registry.report(level, &plain).unwrap();
    }

    assert_eq!(
        screen.contents(),
        "info\n\
         Note: note\n\
         Issue #42: issue coded\n\
         Issue: issue plain\n\
         Error #42: error coded\n\
         Error: error plain\n\
         Fatal #42: fatal coded\n\
         Fatal: fatal plain\n"
    );
    assert_eq!(
        logfile.contents(),
        "NOTE    Note: note\n\
         ISSUE   Issue #42: issue coded\n\
         ISSUE   Issue: issue plain\n\
         ERROR   Error #42: error coded\n\
         ERROR   Error: error plain\n\
         FATAL   Fatal #42: fatal coded\n\
         FATAL   Fatal: fatal plain\n"
    );
    assert!(!screen.contents().contains(&format!("#{}", leveled_out::DEFAULT_CODE)));
}

#[test]
fn concurrent_emits_keep_lines_whole() {
    const THREADS: usize = 8;
    const LINES: usize = 200;

    let (registry, screen, logfile) = captured();
    std::thread::scope(|scope| {
        for t in 0..THREADS {
            let registry = registry.clone();
            scope.spawn(move || {
                for i in 0..LINES {
                    let _ = registry
                        .emit(Level::Note, Request::text(format!("worker {t} line {i}\n")))
                        .unwrap();
                }
            });
        }
    });

    for (contents, leader) in [(screen.contents(), "Note: "), (logfile.contents(), "NOTE    Note: ")] {
        let mut seen = std::collections::HashSet::new();
        for line in contents.lines() {
            let rest = line
                .strip_prefix(leader)
                .and_then(|l| l.strip_prefix("worker "))
                .unwrap_or_else(|| panic!("malformed line {line:?}"));
            let (t, i) = rest
                .split_once(" line ")
                .unwrap_or_else(|| panic!("malformed line {line:?}"));
            let key: (usize, usize) = (t.parse().unwrap(), i.parse().unwrap());
            assert!(key.0 < THREADS && key.1 < LINES, "{line:?}");
            assert!(seen.insert(key), "duplicate line {line:?}");
        }
        assert_eq!(seen.len(), THREADS * LINES);
        assert!(contents.ends_with('\n'));
    }
}
