// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Hooks that run around traced calls.

use tracing::Level;

use crate::pointcut::JoinPoint;

/// Code run before and after each traced call whose join point matches the advice's pointcut.
///
/// `before` runs ahead of the timing, `after` once the record has been emitted, so neither adds to
/// the measured duration. `after` also runs when the traced call panics.
pub trait Advice {
    /// Runs before the operation
    fn before(&self, join_point: &JoinPoint<'_>) {
        let _ = join_point;
    }

    /// Runs after the operation
    fn after(&self, join_point: &JoinPoint<'_>) {
        let _ = join_point;
    }
}

/// Logs `"<operation> is begin ."` and `"<operation> is end ."` through `tracing`.
///
/// Events use the `gintonic` target and carry the owner as a field. The default level is `ERROR`,
/// the same as [`TracingSink`](crate::writer::sink::TracingSink).
///
/// ```
/// # use gintonic::{Tracer, advice::LogAdvice, pointcut::Pointcut};
/// let tracer: Tracer<&str> = Tracer::builder()
///     .advice(Pointcut::lifecycle(), LogAdvice::new().with_level(tracing::Level::INFO))
///     .build();
/// ```
#[derive(Debug, Clone, Copy)]
pub struct LogAdvice {
    level: Level,
}

impl Default for LogAdvice {
    fn default() -> Self {
        Self { level: Level::ERROR }
    }
}

impl LogAdvice {
    /// Advice logging at `ERROR`
    pub fn new() -> Self {
        Self::default()
    }

    /// Log at `level` instead
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// The level the advice logs at
    pub fn level(&self) -> Level {
        self.level
    }
}

macro_rules! advice_event {
    ($level:expr, $join_point:expr, $phase:literal) => {
        tracing::event!(
            target: "gintonic",
            $level,
            owner = $join_point.owner,
            "{} is {} .",
            $join_point.operation,
            $phase
        )
    };
}

macro_rules! log_at {
    ($level:expr, $join_point:expr, $phase:literal) => {
        // `tracing::event!` needs a constant level
        match $level {
            Level::ERROR => advice_event!(Level::ERROR, $join_point, $phase),
            Level::WARN => advice_event!(Level::WARN, $join_point, $phase),
            Level::INFO => advice_event!(Level::INFO, $join_point, $phase),
            Level::DEBUG => advice_event!(Level::DEBUG, $join_point, $phase),
            _ => advice_event!(Level::TRACE, $join_point, $phase),
        }
    };
}

impl Advice for LogAdvice {
    fn before(&self, join_point: &JoinPoint<'_>) {
        log_at!(self.level, join_point, "begin");
    }

    fn after(&self, join_point: &JoinPoint<'_>) {
        log_at!(self.level, join_point, "end");
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io,
        sync::{Arc, Mutex},
    };

    use tracing_subscriber::fmt::MakeWriter;

    use super::*;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn captured_output(advice: LogAdvice) -> String {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(captured.clone())
            .with_max_level(Level::TRACE)
            .with_ansi(false)
            .without_time()
            .finish();
        let join_point = JoinPoint::new("MainActivity", "onCreate");
        tracing::subscriber::with_default(subscriber, || {
            advice.before(&join_point);
            advice.after(&join_point);
        });
        let bytes = captured.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn logs_at_error_by_default() {
        assert_eq!(LogAdvice::new().level(), Level::ERROR);
        let out = captured_output(LogAdvice::new());
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 2, "{out}");
        assert!(lines.iter().all(|line| line.contains("ERROR")), "{out}");
        assert!(lines[0].contains("gintonic: onCreate is begin ."), "{out}");
        assert!(lines[1].contains("gintonic: onCreate is end ."), "{out}");
        assert!(lines[0].contains("owner=\"MainActivity\""), "{out}");
    }

    #[test]
    fn logs_at_configured_level() {
        let out = captured_output(LogAdvice::new().with_level(Level::INFO));
        assert_eq!(out.lines().count(), 2, "{out}");
        assert!(
            out.lines()
                .all(|line| line.contains("INFO") && !line.contains("ERROR")),
            "{out}"
        );
    }
}
