// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Contains the [`TraceSink`] trait, which receives completed [`MethodTraceRecord`]s, and the
//! sinks shipped with gintonic.

use std::{
    fmt::Debug,
    pin::Pin,
    sync::{Arc, Mutex, PoisonError},
};

use crate::MethodTraceRecord;

#[cfg(feature = "background_queue")]
mod background;
mod immediate_flush;
mod tracing_sink;

#[cfg(feature = "background_queue")]
pub use background::{BackgroundQueue, BackgroundQueueBuilder, BackgroundQueueJoinHandle};
pub use immediate_flush::FlushImmediately;
pub use tracing_sink::TracingSink;

/// Destination for completed trace records.
///
/// `emit` runs on the caller's thread right after the traced operation finishes, so it must be cheap.
/// Unless this is explicitly a test sink, `emit` must never block on a failing destination and must
/// never panic. Failures are logged with `tracing` and the record is dropped.
pub trait TraceSink {
    /// Deliver one record.
    fn emit(&self, record: MethodTraceRecord);

    /// Request the sink to flush buffered records to their destination. The returned [`FlushWait`]
    /// resolves once they are written.
    ///
    /// In synchronous code, use `futures::executor::block_on` to wait for it.
    fn flush_async(&self) -> FlushWait {
        FlushWait::ready()
    }

    /// Returns a [`BoxTraceSink`] that is a type-erased version of this sink
    fn boxed(self) -> BoxTraceSink
    where
        Self: Sized + Send + Sync + 'static,
    {
        BoxTraceSink::new(self)
    }
}

impl<T: TraceSink + ?Sized> TraceSink for Arc<T> {
    fn emit(&self, record: MethodTraceRecord) {
        (**self).emit(record)
    }

    fn flush_async(&self) -> FlushWait {
        (**self).flush_async()
    }
}

/// A type-erased [`TraceSink`]. Cloning gives another handle to the same sink.
#[derive(Clone)]
pub struct BoxTraceSink(Arc<dyn TraceSink + Send + Sync + 'static>);

impl Debug for BoxTraceSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("BoxTraceSink").finish()
    }
}

impl BoxTraceSink {
    /// Create a new [`BoxTraceSink`]
    pub fn new(sink: impl TraceSink + Send + Sync + 'static) -> Self {
        Self(Arc::new(sink))
    }
}

impl TraceSink for BoxTraceSink {
    fn emit(&self, record: MethodTraceRecord) {
        self.0.emit(record)
    }

    fn flush_async(&self) -> FlushWait {
        self.0.flush_async()
    }

    fn boxed(self) -> BoxTraceSink {
        self
    }
}

/// This struct contains a future that can be used to wait for flushing to complete
#[must_use = "future does nothing unless polled"]
pub struct FlushWait(Pin<Box<dyn std::future::Future<Output = ()> + 'static>>);

impl Future for FlushWait {
    type Output = ();

    fn poll(
        mut self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Self::Output> {
        self.0.as_mut().poll(cx)
    }
}

impl FlushWait {
    /// Return a FlushWait that is ready immediately
    pub fn ready() -> Self {
        Self(Box::pin(std::future::ready(())))
    }

    /// Create a FlushWait that returns when a future is ready
    pub fn from_future(f: impl std::future::Future<Output = ()> + 'static) -> Self {
        Self(Box::pin(f))
    }
}

/// In-memory sink backed by a [`Vec`].
///
/// Cloning will provide another reference to the same underlying buffer.
///
/// # Example
/// ```
/// # use gintonic_writer::{MethodTraceRecord, Accuracy, TraceSink, sink::VecTraceSink};
/// let sink = VecTraceSink::default();
/// sink.emit(MethodTraceRecord::new("MainActivity", "onCreate", 1.0, Accuracy::Millis));
/// sink.emit(MethodTraceRecord::new("MainActivity", "onStart", 2.0, Accuracy::Millis));
/// let records = sink.drain();
/// assert_eq!(records.len(), 2);
/// assert_eq!(records[1].message(), "onStart");
/// ```
#[derive(Debug, Default, Clone)]
pub struct VecTraceSink(Arc<Mutex<Vec<MethodTraceRecord>>>);

impl VecTraceSink {
    /// Create a new, empty [`VecTraceSink`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new [`VecTraceSink`] with room for `capacity` records before reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self(Arc::new(Mutex::new(Vec::with_capacity(capacity))))
    }

    /// Drains all currently emitted records and returns them in emission order.
    ///
    /// The sink can still be used afterwards.
    pub fn drain(&self) -> Vec<MethodTraceRecord> {
        std::mem::take(&mut *self.lock())
    }

    /// Returns true if this sink holds a record matching the predicate.
    pub fn contains_record<F>(&self, predicate: F) -> bool
    where
        F: FnMut(&MethodTraceRecord) -> bool,
    {
        self.lock().iter().any(predicate)
    }

    /// Number of records currently held
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the sink currently holds no records
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // records can arrive while a panicking traced call unwinds, so a poisoned lock is still usable
    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<MethodTraceRecord>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TraceSink for VecTraceSink {
    fn emit(&self, record: MethodTraceRecord) {
        self.lock().push(record);
    }
}

/// A [`TraceSink`] that drops all records.
#[derive(Debug, Copy, Clone, Default)]
#[non_exhaustive]
pub struct DevNullSink;

impl DevNullSink {
    /// Return a new [`DevNullSink`]
    pub const fn new() -> Self {
        DevNullSink
    }
}

impl TraceSink for DevNullSink {
    fn emit(&self, _record: MethodTraceRecord) {}
}
