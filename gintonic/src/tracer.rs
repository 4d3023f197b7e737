// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The invocation interceptor: times wrapped calls and forwards one record per call to a sink.

use std::{
    marker::PhantomData,
    sync::{Mutex, MutexGuard, PoisonError},
};

use gintonic_timesource::{TimeSource, get_time_source};
use gintonic_writer::{Accuracy, BoxTraceSink, MethodTraceRecord, TraceSink, sink::TracingSink};

use crate::{
    advice::Advice,
    config,
    pointcut::{JoinPoint, Pointcut},
    stopwatch::Stopwatch,
};

type BoxAdvice = Box<dyn Advice + Send + Sync>;

/// Times wrapped calls and emits a [`MethodTraceRecord`] for each of them.
///
/// A `Tracer` also remembers the identity (`I`) of the last object it traced. The identity is claimed
/// by the first traced call and reassigned whenever a call runs on a different object. Every traced
/// call emits exactly one record either way.
///
/// ```
/// use gintonic::{Tracer, writer::sink::VecTraceSink};
///
/// let sink = VecTraceSink::new();
/// let tracer = Tracer::builder().sink(sink.clone()).build();
///
/// let answer = tracer.wrap("obj1", "MainActivity", "onCreate", || 42);
/// assert_eq!(answer, 42);
/// assert_eq!(tracer.current_target(), Some("obj1"));
///
/// let records = sink.drain();
/// assert_eq!(records[0].owner(), "MainActivity");
/// assert!(records[0].message().starts_with("onCreate --> ["));
/// ```
pub struct Tracer<I> {
    sink: BoxTraceSink,
    accuracy: Option<Accuracy>,
    pointcut: Pointcut,
    advice: Vec<(Pointcut, BoxAdvice)>,
    time_source: Option<TimeSource>,
    current: Mutex<Option<I>>,
}

impl<I> std::fmt::Debug for Tracer<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracer")
            .field("sink", &self.sink)
            .field("accuracy", &self.accuracy)
            .field("pointcut", &self.pointcut)
            .field("advice", &self.advice.len())
            .field("time_source", &self.time_source)
            .finish_non_exhaustive()
    }
}

impl<I: PartialEq + Clone> Default for Tracer<I> {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl<I: PartialEq + Clone> Tracer<I> {
    /// Start building a tracer
    pub fn builder() -> TracerBuilder<I> {
        TracerBuilder::default()
    }

    /// A tracer with default settings, emitting to `sink`
    pub fn new(sink: impl TraceSink + Send + Sync + 'static) -> Self {
        Self::builder().sink(sink).build()
    }

    /// Run `work`, timing it if `owner`/`operation` matches the tracer's pointcut.
    ///
    /// Whatever `work` returns, `Err` included, is handed back unchanged. If `work` panics, the
    /// record is still emitted while the panic unwinds.
    pub fn wrap<T>(
        &self,
        target: I,
        owner: &str,
        operation: &str,
        work: impl FnOnce() -> T,
    ) -> T {
        let join_point = JoinPoint::new(owner, operation);
        if !self.pointcut.matches(&join_point) {
            return work();
        }
        let _pending = self.begin(Some(target), join_point);
        work()
    }

    /// Await `future`, timing it the same way [`wrap`](Self::wrap) times a closure.
    ///
    /// The time spent suspended counts towards the duration. If the returned future is dropped
    /// before completing, the record is emitted at that point.
    pub async fn wrap_async<F: Future>(
        &self,
        target: I,
        owner: &str,
        operation: &str,
        future: F,
    ) -> F::Output {
        let join_point = JoinPoint::new(owner, operation);
        if !self.pointcut.matches(&join_point) {
            return future.await;
        }
        let _pending = self.begin(Some(target), join_point);
        future.await
    }

    /// Time an explicitly annotated operation, such as a constructor or a method singled out for
    /// debugging.
    ///
    /// The record reads `"Gintonic --> <operation> --> [<millis>ms]"` and carries the duration in whole
    /// microseconds. The pointcut and advice do not apply, and the tracked identity is left alone.
    pub fn trace_annotated<T>(&self, owner: &str, operation: &str, work: impl FnOnce() -> T) -> T {
        let _pending = PendingTrace {
            tracer: self,
            target: None,
            join_point: JoinPoint::new(owner, operation),
            advised: false,
            stopwatch: self.started_stopwatch(),
        };
        work()
    }

    /// Wrap `f` so that every call through the returned closure is traced.
    ///
    /// ```
    /// use gintonic::{Tracer, writer::sink::VecTraceSink};
    ///
    /// let sink = VecTraceSink::new();
    /// let tracer = Tracer::new(sink.clone());
    /// let measure = tracer.decorate("MyFrameLayout", "onMeasure", |size: u32| size * 2);
    ///
    /// assert_eq!(measure("layout-a", 4), 8);
    /// assert_eq!(measure("layout-b", 5), 10);
    /// assert_eq!(sink.len(), 2);
    /// assert_eq!(tracer.current_target(), Some("layout-b"));
    /// ```
    pub fn decorate<'a, A, R>(
        &'a self,
        owner: &'a str,
        operation: &'a str,
        f: impl Fn(A) -> R + 'a,
    ) -> impl Fn(I, A) -> R {
        move |target, arg| self.wrap(target, owner, operation, || f(arg))
    }

    /// The identity of the last traced target, if any call has been traced since the last reset
    pub fn current_target(&self) -> Option<I> {
        self.lock_current().clone()
    }

    /// Forget the tracked identity. The next traced call claims it again.
    pub fn reset_target(&self) {
        *self.lock_current() = None;
    }

    /// The sink records are emitted to
    pub fn sink(&self) -> &BoxTraceSink {
        &self.sink
    }

    fn begin<'a>(&'a self, target: Option<I>, join_point: JoinPoint<'a>) -> PendingTrace<'a, I> {
        if let Some(target) = &target {
            let mut current = self.lock_current();
            if current.is_none() {
                *current = Some(target.clone());
            }
        }
        for (pointcut, advice) in &self.advice {
            if pointcut.matches(&join_point) {
                advice.before(&join_point);
            }
        }
        PendingTrace {
            tracer: self,
            target,
            join_point,
            advised: true,
            stopwatch: self.started_stopwatch(),
        }
    }

    fn started_stopwatch(&self) -> Stopwatch {
        let time_source = get_time_source(self.time_source.clone());
        let mut stopwatch = Stopwatch::new_from_timesource(time_source);
        stopwatch.start();
        stopwatch
    }

    fn observe(&self, target: I, join_point: &JoinPoint<'_>) {
        let mut current = self.lock_current();
        match &*current {
            Some(existing) if *existing == target => {}
            Some(_) => {
                tracing::trace!(
                    target: "gintonic",
                    owner = join_point.owner,
                    operation = join_point.operation,
                    "traced target changed"
                );
                *current = Some(target);
            }
            None => *current = Some(target),
        }
    }

    // a panicking advice or sink must not disable identity tracking for good
    fn lock_current(&self) -> MutexGuard<'_, Option<I>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// Holds the running stopwatch of one traced call. Dropping it, on return or while unwinding,
// stops the stopwatch and emits the record.
struct PendingTrace<'a, I: PartialEq + Clone> {
    tracer: &'a Tracer<I>,
    // None for annotated calls, which are not identity tracked
    target: Option<I>,
    join_point: JoinPoint<'a>,
    advised: bool,
    stopwatch: Stopwatch,
}

impl<I: PartialEq + Clone> Drop for PendingTrace<'_, I> {
    fn drop(&mut self) {
        self.stopwatch.stop();
        let elapsed = self.stopwatch.elapsed_duration().unwrap_or_default();
        let tracer = self.tracer;
        let JoinPoint { owner, operation } = self.join_point;

        let record = match self.target.take() {
            Some(target) => {
                let accuracy = tracer.accuracy.unwrap_or_else(config::accuracy);
                let record = MethodTraceRecord::lifecycle(owner, operation, elapsed, accuracy);
                tracer.observe(target, &self.join_point);
                record
            }
            None => MethodTraceRecord::annotated(owner, operation, elapsed),
        };
        tracer.sink.emit(record);

        if self.advised {
            for (pointcut, advice) in &tracer.advice {
                if pointcut.matches(&self.join_point) {
                    advice.after(&self.join_point);
                }
            }
        }
    }
}

/// Builder for [`Tracer`]
pub struct TracerBuilder<I> {
    sink: Option<BoxTraceSink>,
    accuracy: Option<Accuracy>,
    pointcut: Pointcut,
    advice: Vec<(Pointcut, BoxAdvice)>,
    time_source: Option<TimeSource>,
    _identity: PhantomData<fn() -> I>,
}

impl<I> Default for TracerBuilder<I> {
    fn default() -> Self {
        Self {
            sink: None,
            accuracy: None,
            pointcut: Pointcut::All,
            advice: vec![],
            time_source: None,
            _identity: PhantomData,
        }
    }
}

impl<I: PartialEq + Clone> TracerBuilder<I> {
    /// Where records go. Defaults to [`TracingSink`].
    pub fn sink(mut self, sink: impl TraceSink + Send + Sync + 'static) -> Self {
        self.sink = Some(sink.boxed());
        self
    }

    /// Fix the accuracy of lifecycle records.
    ///
    /// Without this, every call reads the process-wide [`config::accuracy`].
    pub fn accuracy(mut self, accuracy: Accuracy) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    /// Only time calls matching `pointcut`. Defaults to [`Pointcut::All`].
    pub fn pointcut(mut self, pointcut: Pointcut) -> Self {
        self.pointcut = pointcut;
        self
    }

    /// Run `advice` around traced calls matching `pointcut`.
    ///
    /// Advice runs in the order it was added.
    pub fn advice(
        mut self,
        pointcut: Pointcut,
        advice: impl Advice + Send + Sync + 'static,
    ) -> Self {
        self.advice.push((pointcut, Box::new(advice)));
        self
    }

    /// Read time from `time_source` instead of the ambient one
    pub fn time_source(mut self, time_source: TimeSource) -> Self {
        self.time_source = Some(time_source);
        self
    }

    /// Build the tracer, with no identity tracked yet
    pub fn build(self) -> Tracer<I> {
        Tracer {
            sink: self.sink.unwrap_or_else(|| TracingSink::default().boxed()),
            accuracy: self.accuracy,
            pointcut: self.pointcut,
            advice: self.advice,
            time_source: self.time_source,
            current: Mutex::new(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use gintonic_timesource::{TimeSource, fakes::ManuallyAdvancedTimeSource};
    use gintonic_writer::{Accuracy, test_util::test_trace_sink};

    use super::*;

    #[derive(Default, Clone)]
    struct Journal(Arc<Mutex<Vec<String>>>);

    impl Advice for Journal {
        fn before(&self, join_point: &JoinPoint<'_>) {
            self.0.lock().unwrap().push(format!("before {}", join_point.operation));
        }

        fn after(&self, join_point: &JoinPoint<'_>) {
            self.0.lock().unwrap().push(format!("after {}", join_point.operation));
        }
    }

    #[test]
    fn identity_claimed_before_work_runs() {
        let tracer: Tracer<u32> = Tracer::new(gintonic_writer::sink::DevNullSink::new());
        tracer.wrap(7, "MainActivity", "onCreate", || {
            assert_eq!(tracer.current_target(), Some(7));
        });
        // a different target is only recorded once its call completes
        tracer.wrap(8, "MainActivity", "onStart", || {
            assert_eq!(tracer.current_target(), Some(7));
        });
        assert_eq!(tracer.current_target(), Some(8));
        tracer.reset_target();
        assert_eq!(tracer.current_target(), None);
    }

    #[test]
    fn advice_runs_outside_timing() {
        let clock = ManuallyAdvancedTimeSource::new();
        let journal = Journal::default();
        let test_sink = test_trace_sink();
        let tracer = Tracer::builder()
            .sink(test_sink.sink)
            .accuracy(Accuracy::Millis)
            .time_source(TimeSource::custom(clock.clone()))
            .advice(Pointcut::lifecycle(), journal.clone())
            .advice(Pointcut::operation("never"), journal.clone())
            .build();

        tracer.wrap("obj1", "MainActivity", "onResume", || {
            clock.advance(Duration::from_millis(3));
        });

        assert_eq!(
            *journal.0.lock().unwrap(),
            ["before onResume", "after onResume"]
        );
        assert_eq!(
            test_sink.inspector.messages(),
            ["onResume --> [3.0ms]      \n"]
        );
    }

    #[test]
    fn annotated_calls_skip_identity_and_advice() {
        let journal = Journal::default();
        let test_sink = test_trace_sink();
        let tracer: Tracer<&str> = Tracer::builder()
            .sink(test_sink.sink)
            .pointcut(Pointcut::lifecycle())
            .advice(Pointcut::All, journal.clone())
            .time_source(TimeSource::custom(ManuallyAdvancedTimeSource::new()))
            .build();

        let value = tracer.trace_annotated("Parser", "new", || "parsed");
        assert_eq!(value, "parsed");
        assert_eq!(tracer.current_target(), None);
        assert!(journal.0.lock().unwrap().is_empty());
        assert_eq!(
            test_sink.inspector.messages(),
            ["Gintonic --> new --> [0ms]"]
        );
    }
}
