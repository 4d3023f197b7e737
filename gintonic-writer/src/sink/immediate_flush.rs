// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::sync::{Arc, Mutex, PoisonError};

use crate::{MethodTraceRecord, TraceSink, TraceStream};

/// A sink that writes every record to its stream and flushes straight away.
///
/// Unlike [`BackgroundQueue`](super::BackgroundQueue), there is no buffering and no background
/// thread: [`emit`](TraceSink::emit) holds a lock while the record is written. That is the right
/// trade-off for short-lived processes and tests, not for hot paths.
///
/// Write and flush errors are logged with `tracing` and otherwise ignored.
///
/// ```
/// use gintonic_writer::{sink::FlushImmediately, stream::LineStream, TraceSink, MethodTraceRecord, Accuracy};
/// use std::{io, time::Duration};
///
/// let sink = FlushImmediately::new(LineStream::new(io::stderr()));
/// sink.emit(MethodTraceRecord::lifecycle("MainActivity", "onCreate", Duration::from_millis(1), Accuracy::Millis));
/// ```
pub struct FlushImmediately<S> {
    stream: Arc<Mutex<S>>,
}

impl<S> Clone for FlushImmediately<S> {
    fn clone(&self) -> Self {
        Self {
            stream: Arc::clone(&self.stream),
        }
    }
}

impl<S: TraceStream> FlushImmediately<S> {
    /// Write records to `stream`
    pub fn new(stream: S) -> Self {
        Self {
            stream: Arc::new(Mutex::new(stream)),
        }
    }
}

impl<S: TraceStream> TraceSink for FlushImmediately<S> {
    fn emit(&self, record: MethodTraceRecord) {
        let mut stream = self.stream.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = stream.next(&record) {
            tracing::error!(?err, "couldn't append to trace stream");
        }
        if let Err(err) = stream.flush() {
            tracing::warn!(?err, "couldn't flush trace stream");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{io, time::Duration};

    use super::*;
    use crate::{Accuracy, test_util::TestStream};

    #[test]
    fn writes_and_flushes_each_record() {
        let output: Arc<Mutex<TestStream>> = Default::default();
        let sink = FlushImmediately::new(Arc::clone(&output));
        sink.emit(MethodTraceRecord::lifecycle(
            "MainActivity",
            "onCreate",
            Duration::from_millis(1),
            Accuracy::Millis,
        ));
        sink.clone().emit(MethodTraceRecord::lifecycle(
            "MainActivity",
            "onStart",
            Duration::from_millis(2),
            Accuracy::Millis,
        ));

        let output = output.lock().unwrap();
        assert_eq!(
            output.messages(),
            ["onCreate --> [1.0ms]      \n", "onStart --> [2.0ms]      \n"]
        );
        assert_eq!(output.flushes, 2);
    }

    #[test]
    fn stream_errors_do_not_reach_the_caller() {
        let output: Arc<Mutex<TestStream>> = Default::default();
        output.lock().unwrap().error = Some(io::ErrorKind::BrokenPipe);
        let sink = FlushImmediately::new(Arc::clone(&output));
        sink.emit(MethodTraceRecord::new("A", "a", 0.0, Accuracy::Millis));
        sink.emit(MethodTraceRecord::new("B", "b", 0.0, Accuracy::Millis));
        // the first write failed, the second one went through
        assert_eq!(output.lock().unwrap().messages(), ["b"]);
    }
}
