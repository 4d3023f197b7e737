// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc,
    },
    thread,
    time::{Duration, Instant},
};

use crossbeam_queue::ArrayQueue;
use crossbeam_utils::sync::{Parker, Unparker};

use crate::{MethodTraceRecord, TraceSink, TraceStream, rate_limit::rate_limited};

use super::FlushWait;

/// Builder for [`BackgroundQueue`]
pub struct BackgroundQueueBuilder {
    capacity: usize,
    thread_name: String,
    flush_interval: Duration,
    shutdown_timeout: Duration,
}

impl Default for BackgroundQueueBuilder {
    fn default() -> Self {
        Self {
            capacity: 16 * 1024,
            thread_name: "gintonic-trace-queue".into(),
            flush_interval: Duration::from_secs(1),
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

impl BackgroundQueueBuilder {
    /// Create a builder with the default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of records that can wait in the queue before the oldest start being dropped.
    ///
    /// Defaults to `16*1024`.
    ///
    /// The most recent timings are the most useful ones, so a full queue drops its oldest record
    /// rather than the one being emitted. A `tracing` error is logged periodically while records
    /// are being dropped.
    pub fn capacity(mut self, capacity: usize) -> Self {
        assert!(capacity > 0);
        self.capacity = capacity;
        self
    }

    /// Thread name assigned to the background thread that reads from the queue.
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        assert!(!name.is_empty());
        self.thread_name = name;
        self
    }

    /// Sets approximately how frequently the stream is flushed. Defaults to every second.
    ///
    /// The stream is flushed periodically even when no records arrive.
    pub fn flush_interval(mut self, flush_interval: Duration) -> Self {
        assert!(
            Duration::ZERO < flush_interval && flush_interval < Duration::from_secs(60),
            "flush_interval must be in the range (0, 1 minute), not {flush_interval:?}"
        );
        self.flush_interval = flush_interval;
        self
    }

    /// Sets how long the background thread keeps draining records once shutting down.
    ///
    /// Defaults to 30 seconds.
    pub fn shutdown_timeout(mut self, shutdown_timeout: Duration) -> Self {
        assert!(
            shutdown_timeout > Duration::ZERO,
            "shutdown_timeout must not be zero"
        );
        self.shutdown_timeout = shutdown_timeout;
        self
    }

    /// Build a [`BackgroundQueue`] writing to `stream`.
    ///
    /// Returns both the queue and a [`BackgroundQueueJoinHandle`] that writes out every queued
    /// record when dropped.
    ///
    /// # Panics
    /// Panics if the background thread cannot be spawned.
    pub fn build(
        self,
        stream: impl TraceStream + Send + 'static,
    ) -> (BackgroundQueue, BackgroundQueueJoinHandle) {
        let parker = Parker::default();
        let unparker = parker.unparker().clone();
        let (flush_sender, flush_receiver) = mpsc::channel();
        let inner = Arc::new(Inner {
            queue: ArrayQueue::new(self.capacity),
            unparker: unparker.clone(),
            flush_sender,
        });
        let shutdown_signal = Arc::new(AtomicBool::new(false));

        let writer = Writer {
            name: self.thread_name.clone(),
            stream,
            records_written: 0,
            io_errors: 0,
            inner: Arc::clone(&inner),
            flush_interval: self.flush_interval,
            shutdown_timeout: self.shutdown_timeout,
            shutdown_signal: Arc::clone(&shutdown_signal),
            parker,
        };

        let handle = thread::Builder::new()
            .name(self.thread_name)
            .spawn(move || writer.run(flush_receiver))
            .expect("failed to spawn the trace queue thread");

        (
            BackgroundQueue(inner),
            BackgroundQueueJoinHandle {
                handle: Some(handle),
                shutdown_signal,
                unparker,
            },
        )
    }
}

/// A [`TraceSink`] that hands records to a background thread.
///
/// [`emit`](TraceSink::emit) only pushes onto a bounded lock-free queue, so the traced call pays a
/// constant cost regardless of how slow the stream is. Cloning is cheap and still appends to the
/// same queue.
///
/// ```
/// use gintonic_writer::{sink::BackgroundQueue, stream::LineStream, TraceSink, MethodTraceRecord, Accuracy};
/// use std::{io, time::Duration};
///
/// let (queue, handle) = BackgroundQueue::new(LineStream::new(io::stdout()));
/// queue.emit(MethodTraceRecord::lifecycle("MainActivity", "onCreate", Duration::from_millis(1), Accuracy::Millis));
/// // dropping the handle writes out everything still queued
/// drop(handle);
/// ```
#[derive(Clone)]
pub struct BackgroundQueue(Arc<Inner>);

impl BackgroundQueue {
    /// Create a new background queue using the [`BackgroundQueueBuilder`] defaults.
    pub fn new(stream: impl TraceStream + Send + 'static) -> (Self, BackgroundQueueJoinHandle) {
        BackgroundQueueBuilder::new().build(stream)
    }
}

impl TraceSink for BackgroundQueue {
    fn emit(&self, record: MethodTraceRecord) {
        self.0.push(record)
    }

    fn flush_async(&self) -> FlushWait {
        self.0.flush_async()
    }
}

struct FlushSignal {
    // dropped once the records queued before it have been written and flushed
    #[allow(unused)]
    channel: tokio::sync::oneshot::Sender<()>,
}

struct Inner {
    // ArrayQueue rather than a channel: when full, the oldest records are the ones dropped
    queue: ArrayQueue<MethodTraceRecord>,
    flush_sender: mpsc::Sender<FlushSignal>,
    unparker: Unparker,
}

impl Inner {
    fn push(&self, record: MethodTraceRecord) {
        if self.queue.force_push(record).is_some() {
            rate_limited!(
                Duration::from_secs(1),
                |suppressed| tracing::error!(
                    suppressed,
                    "trace queue has fallen behind, trace records will be missing"
                )
            );
        }
        self.unparker.unpark();
    }

    fn flush_async(&self) -> FlushWait {
        let (channel, receiver) = tokio::sync::oneshot::channel();
        self.flush_sender.send(FlushSignal { channel }).ok();
        self.unparker.unpark();
        FlushWait::from_future(async move {
            let _ = receiver.await;
        })
    }
}

/// Guard handle that, when dropped, blocks until every already emitted record is written.
pub struct BackgroundQueueJoinHandle {
    handle: Option<thread::JoinHandle<()>>,
    shutdown_signal: Arc<AtomicBool>,
    unparker: Unparker,
}

impl BackgroundQueueJoinHandle {
    /// Drop the handle but let the background thread keep running until no [`BackgroundQueue`]s exist.
    pub fn forget(mut self) {
        self.handle = None;
    }

    /// Alias for `drop(handle)`.
    pub fn shut_down(self) {}
}

impl Drop for BackgroundQueueJoinHandle {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.shutdown_signal.store(true, Ordering::Relaxed);
            self.unparker.unpark();
            tracing::info!("awaiting trace queue shutdown");
            if handle.join().is_err() {
                tracing::error!("trace queue thread panicked");
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum DrainResult {
    Drained,
    HitDeadline,
}

// Tracks flush requests.
//
// A flush request is answered once every record that was in the queue when the request was
// collected has been written. Rather than tagging records, we count: after `capacity` pops, or
// after observing an empty queue, every such record is gone.
struct PendingFlushes {
    waiting: Vec<FlushSignal>,
    records_before_wake: usize,
    receiver: mpsc::Receiver<FlushSignal>,
}

impl PendingFlushes {
    fn new(receiver: mpsc::Receiver<FlushSignal>) -> Self {
        Self {
            waiting: vec![],
            records_before_wake: 0,
            receiver,
        }
    }

    fn update(
        &mut self,
        capacity: usize,
        flush_stream: impl FnOnce(),
        status: DrainResult,
        written: usize,
    ) {
        if !self.waiting.is_empty() {
            self.records_before_wake = self.records_before_wake.saturating_sub(written);
            if self.records_before_wake == 0 || status == DrainResult::Drained {
                flush_stream();
                self.records_before_wake = 0;
                self.waiting.clear();
            }
        }
        if self.waiting.is_empty() {
            self.waiting.extend(self.receiver.try_iter());
            if !self.waiting.is_empty() {
                self.records_before_wake = capacity;
            }
        }
    }

    fn has_waiting(&self) -> bool {
        !self.waiting.is_empty()
    }
}

struct Writer<S> {
    name: String,
    stream: S,
    records_written: u64,
    io_errors: u64,
    inner: Arc<Inner>,
    flush_interval: Duration,
    shutdown_timeout: Duration,
    shutdown_signal: Arc<AtomicBool>,
    parker: Parker,
}

impl<S: TraceStream> Writer<S> {
    fn run(mut self, flush_receiver: mpsc::Receiver<FlushSignal>) {
        let span = tracing::span!(tracing::Level::TRACE, "gintonic trace queue", queue = %self.name);
        let _enter = span.enter();
        let mut flushes = PendingFlushes::new(flush_receiver);
        let capacity = self.inner.queue.capacity();

        loop {
            let next_flush = Instant::now() + self.flush_interval;
            loop {
                let (status, written) = self.drain_until_deadline(next_flush);
                flushes.update(capacity, || self.flush_stream(), status, written);

                if status == DrainResult::HitDeadline
                    || self.shutdown_signal.load(Ordering::Relaxed)
                {
                    break;
                }
                if !flushes.has_waiting() {
                    self.parker.park_deadline(next_flush);
                }
                if Instant::now() >= next_flush {
                    break;
                }
            }

            self.flush_stream();
            if self.shutdown_signal.load(Ordering::Relaxed) {
                tracing::info!("caught shutdown signal, shutting down trace queue");
                return self.shut_down();
            }
            if Arc::strong_count(&self.inner) == 1 {
                tracing::info!("no emitters left, shutting down trace queue");
                return self.shut_down();
            }
        }
        // flush waiters still pending are woken when `flushes` drops
    }

    fn drain_until_deadline(&mut self, deadline: Instant) -> (DrainResult, usize) {
        // check the clock every 32 records, a single write is normally far below a microsecond
        let mut count = 0;
        while let Some(record) = self.inner.queue.pop() {
            self.write(record);
            count += 1;
            if count % 32 == 0 && Instant::now() >= deadline {
                return (DrainResult::HitDeadline, count);
            }
        }
        (DrainResult::Drained, count)
    }

    fn write(&mut self, record: MethodTraceRecord) {
        match self.stream.next(&record) {
            Ok(()) => self.records_written += 1,
            Err(err) => {
                self.io_errors += 1;
                rate_limited!(
                    Duration::from_secs(1),
                    |suppressed| tracing::error!(?err, suppressed, "couldn't append to trace stream")
                )
            }
        }
    }

    fn flush_stream(&mut self) {
        if let Err(err) = self.stream.flush() {
            self.io_errors += 1;
            rate_limited!(
                Duration::from_secs(1),
                |suppressed| tracing::warn!(?err, suppressed, "couldn't flush trace stream")
            )
        }
    }

    fn shut_down(mut self) {
        let deadline = Instant::now() + self.shutdown_timeout;
        let (status, _) = self.drain_until_deadline(deadline);
        if status == DrainResult::HitDeadline {
            tracing::warn!("unable to drain trace queue while shutting down");
        }
        self.flush_stream();
        tracing::info!(
            records_written = self.records_written,
            io_errors = self.io_errors,
            "trace queue has shut down"
        );
    }
}
