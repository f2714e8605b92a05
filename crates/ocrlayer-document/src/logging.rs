// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Run-scoped progress logging on top of `tracing`.
//
// Progress lines are often built in pieces ("page 2:" ... "8.50x11.00in").
// `RunLog` buffers such fragments and emits them as a single event.

use tracing::Level;

/// Verbosity tier selected on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
    VeryVerbose,
}

impl Verbosity {
    /// `-q` wins over any number of `-v`.
    pub fn from_flags(quiet: bool, verbose: u8) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, 0) => Self::Normal,
            (false, 1) => Self::Verbose,
            (false, _) => Self::VeryVerbose,
        }
    }

    /// `EnvFilter` directive for this verbosity.
    pub fn filter_directive(&self) -> &'static str {
        match self {
            Self::Quiet => "warn",
            Self::Normal => "info",
            Self::Verbose => "debug",
            Self::VeryVerbose => "trace",
        }
    }
}

/// Logger owned by one conversion run.
///
/// [`log_partial`](Self::log_partial) fragments accumulate until the next
/// [`log`](Self::log) call, which emits them together with its own message.
/// Whatever is still pending when the logger is dropped is emitted then.
#[derive(Debug, Default)]
pub struct RunLog {
    pending: Option<(Level, String)>,
}

impl RunLog {
    /// Logger with nothing pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit `message`, preceded by any pending fragments, at the more severe
    /// of `level` and the pending level.
    pub fn log(&mut self, level: Level, message: impl AsRef<str>) {
        let message = message.as_ref();
        match self.pending.take() {
            Some((pending_level, mut line)) => {
                if !message.is_empty() {
                    line.push(' ');
                    line.push_str(message);
                }
                emit(level.min(pending_level), &line);
            }
            None => emit(level, message),
        }
    }

    /// Start or extend the pending line. Fragments at a disabled level are
    /// dropped.
    pub fn log_partial(&mut self, level: Level, fragment: impl AsRef<str>) {
        if !is_enabled(level) {
            return;
        }
        let fragment = fragment.as_ref();
        match &mut self.pending {
            Some((pending_level, line)) => {
                line.push(' ');
                line.push_str(fragment);
                // Keep the most severe level seen.
                if level < *pending_level {
                    *pending_level = level;
                }
            }
            None => self.pending = Some((level, fragment.to_owned())),
        }
    }

    /// Pending fragments, joined.
    pub fn pending(&self) -> Option<&str> {
        self.pending.as_ref().map(|(_, line)| line.as_str())
    }

    /// Emit pending fragments on their own.
    pub fn flush(&mut self) {
        if let Some((level, line)) = self.pending.take() {
            emit(level, &line);
        }
    }
}

impl Drop for RunLog {
    fn drop(&mut self) {
        self.flush();
    }
}

fn is_enabled(level: Level) -> bool {
    match level {
        Level::ERROR => tracing::enabled!(Level::ERROR),
        Level::WARN => tracing::enabled!(Level::WARN),
        Level::INFO => tracing::enabled!(Level::INFO),
        Level::DEBUG => tracing::enabled!(Level::DEBUG),
        _ => tracing::enabled!(Level::TRACE),
    }
}

fn emit(level: Level, message: &str) {
    match level {
        Level::ERROR => tracing::error!("{message}"),
        Level::WARN => tracing::warn!("{message}"),
        Level::INFO => tracing::info!("{message}"),
        Level::DEBUG => tracing::debug!("{message}"),
        _ => tracing::trace!("{message}"),
    }
}

/// Run `f` under a subscriber at `max` and return what it logged, one event
/// per line, without ANSI colours.
#[cfg(test)]
pub(crate) fn capture_events<R>(max: Level, f: impl FnOnce() -> R) -> (R, String) {
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(max)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    let output = String::from_utf8_lossy(&captured.0.lock().unwrap()).into_owned();
    (result, output)
}
