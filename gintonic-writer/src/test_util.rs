// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Utilities for asserting on the records an application emits.
//!
//! This requires that the `test-util` feature be enabled.

use std::{
    io,
    sync::{Arc, Mutex, PoisonError},
};

use crate::{BoxTraceSink, MethodTraceRecord, TraceSink, TraceStream};

/// A test sink and the [`Inspector`] connected to it.
///
/// This requires that the `test-util` feature be enabled.
pub struct TestTraceSink {
    /// The inspector for examining captured records.
    pub inspector: Inspector,
    /// The sink to hand to the code under test.
    pub sink: BoxTraceSink,
}

/// Create a [`TestTraceSink`]
///
/// # Examples
/// ```
/// use gintonic_writer::test_util::{test_trace_sink, TestTraceSink};
/// use gintonic_writer::{TraceSink, MethodTraceRecord, Accuracy};
/// use std::time::Duration;
///
/// let TestTraceSink { inspector, sink } = test_trace_sink();
/// sink.emit(MethodTraceRecord::lifecycle("MainActivity", "onCreate", Duration::from_millis(5), Accuracy::Millis));
///
/// let records = inspector.records();
/// assert_eq!(records[0].owner(), "MainActivity");
/// assert_eq!(inspector.messages(), ["onCreate --> [5.0ms]      \n"]);
/// ```
pub fn test_trace_sink() -> TestTraceSink {
    let inspector = Inspector::default();
    TestTraceSink {
        inspector: inspector.clone(),
        sink: BoxTraceSink::new(inspector),
    }
}

/// `Inspector` is a sink that makes it easy to read back the records that have been emitted
///
/// See [`test_trace_sink`] for usage examples.
#[derive(Default, Clone, Debug)]
pub struct Inspector {
    records: Arc<Mutex<Vec<MethodTraceRecord>>>,
}

impl Inspector {
    /// Return all the records emitted so far, in emission order
    ///
    /// Note: this does not drain or otherwise modify the contained records
    pub fn records(&self) -> Vec<MethodTraceRecord> {
        self.lock().clone()
    }

    /// Returns the record at a specific index
    #[track_caller]
    pub fn get(&self, index: usize) -> MethodTraceRecord {
        self.lock()[index].clone()
    }

    /// Return the messages of all records emitted so far
    pub fn messages(&self) -> Vec<String> {
        self.lock().iter().map(|r| r.message().to_owned()).collect()
    }

    /// Number of records emitted so far
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing has been emitted yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<MethodTraceRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TraceSink for Inspector {
    fn emit(&self, record: MethodTraceRecord) {
        self.lock().push(record);
    }
}

/// A [`TraceStream`] that keeps everything written to it, for testing the sinks that drive streams.
///
/// Share it between the test and the sink as an `Arc<Mutex<TestStream>>`.
#[derive(Debug, Default)]
pub struct TestStream {
    /// Records written so far
    pub records: Vec<MethodTraceRecord>,
    /// When set, the next write fails with this error kind and the record is discarded
    pub error: Option<io::ErrorKind>,
    /// Number of flush calls
    pub flushes: u64,
    /// Number of records that had been written at the last flush
    pub records_flushed: usize,
}

impl TestStream {
    /// Messages of the written records
    pub fn messages(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.message()).collect()
    }
}

impl TraceStream for TestStream {
    fn next(&mut self, record: &MethodTraceRecord) -> io::Result<()> {
        match self.error.take() {
            Some(kind) => Err(io::Error::from(kind)),
            None => {
                self.records.push(record.clone());
                Ok(())
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flushes += 1;
        self.records_flushed = self.records.len();
        Ok(())
    }
}
