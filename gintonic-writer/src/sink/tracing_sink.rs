// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use tracing::Level;

use crate::{MethodTraceRecord, TraceSink};

/// A [`TraceSink`] that forwards every record to the `tracing` log.
///
/// Events use the `gintonic` target and carry the owner, the duration value and its unit as fields.
/// The event message is the record message, byte for byte. The default level is
/// `ERROR`, so trace output is visible under the strictest log filters.
///
/// ```
/// # use gintonic_writer::{sink::TracingSink, TraceSink, MethodTraceRecord, Accuracy};
/// # use std::time::Duration;
/// let sink = TracingSink::new().with_level(tracing::Level::INFO);
/// sink.emit(MethodTraceRecord::lifecycle("MainActivity", "onCreate", Duration::from_millis(3), Accuracy::Millis));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TracingSink {
    level: Level,
}

impl Default for TracingSink {
    fn default() -> Self {
        Self { level: Level::ERROR }
    }
}

impl TracingSink {
    /// Create a sink logging at `ERROR`
    pub fn new() -> Self {
        Self::default()
    }

    /// Log records at `level` instead
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// The level records are logged at
    pub fn level(&self) -> Level {
        self.level
    }
}

macro_rules! record_event {
    ($level:expr, $record:expr) => {{
        let record = $record;
        tracing::event!(
            target: "gintonic",
            $level,
            owner = record.owner(),
            duration = record.duration_value(),
            unit = record.accuracy().suffix(),
            "{}",
            record.message()
        )
    }};
}

impl TraceSink for TracingSink {
    fn emit(&self, record: MethodTraceRecord) {
        // `tracing::event!` needs a constant level
        match self.level {
            Level::ERROR => record_event!(Level::ERROR, &record),
            Level::WARN => record_event!(Level::WARN, &record),
            Level::INFO => record_event!(Level::INFO, &record),
            Level::DEBUG => record_event!(Level::DEBUG, &record),
            _ => record_event!(Level::TRACE, &record),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io,
        sync::{Arc, Mutex},
        time::Duration,
    };

    use tracing_subscriber::fmt::MakeWriter;

    use super::*;
    use crate::Accuracy;

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

    fn captured_output(level: Level, record: MethodTraceRecord) -> String {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(captured.clone())
            .with_max_level(Level::TRACE)
            .with_ansi(false)
            .without_time()
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            TracingSink::new().with_level(level).emit(record)
        });
        let bytes = captured.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn logs_record_at_error_by_default() {
        assert_eq!(TracingSink::new().level(), Level::ERROR);
        let out = captured_output(
            Level::ERROR,
            MethodTraceRecord::lifecycle(
                "MainActivity",
                "onCreate",
                Duration::from_millis(5),
                Accuracy::Millis,
            ),
        );
        assert!(out.contains("ERROR"), "{out}");
        assert!(out.contains("gintonic"), "{out}");
        assert!(out.contains("onCreate --> [5.0ms]"), "{out}");
        assert!(out.contains("owner=\"MainActivity\""), "{out}");
    }

    #[test]
    fn logs_message_verbatim() {
        let record = MethodTraceRecord::lifecycle(
            "MainActivity",
            "onCreate",
            Duration::from_millis(5),
            Accuracy::Millis,
        );
        let message = record.message().to_owned();
        let out = captured_output(Level::ERROR, record);
        // padding and line terminator included
        assert!(out.contains(&message), "{out:?}");
        assert!(out.contains("onCreate --> [5.0ms]      \n"), "{out:?}");
    }

    #[test]
    fn logs_at_configured_level() {
        let out = captured_output(
            Level::DEBUG,
            MethodTraceRecord::new("Layout", "onLayout", 1.0, Accuracy::Micros),
        );
        assert!(out.contains("DEBUG"), "{out}");
        assert!(out.contains("unit=\"mic\""), "{out}");
    }
}
