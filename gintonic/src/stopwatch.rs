// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! A manually controlled timer measuring one `start`..`stop` interval.

use std::time::Duration;

use gintonic_timesource::{Instant, TimeSource, time_source};
use gintonic_writer::Accuracy;

/// Measures the elapsed time between a call to [`start`](Stopwatch::start) and a call to
/// [`stop`](Stopwatch::stop).
///
/// The measurement is stored once, as a [`Duration`], and converted to the requested [`Accuracy`]
/// when read, so the millisecond and microsecond readings always agree.
///
/// A `Stopwatch` is meant for a single measurement at a time. Concurrent invocations each need their
/// own instance.
///
/// # Example
/// ```
/// use gintonic::{Stopwatch, writer::Accuracy};
///
/// let mut stopwatch = Stopwatch::new();
/// stopwatch.start();
/// // Do some work...
/// stopwatch.stop();
/// let millis = stopwatch.elapsed(Accuracy::Millis);
/// assert!(millis >= 0.0);
/// ```
#[derive(Debug)]
pub struct Stopwatch {
    time_source: TimeSource,
    start: Option<Instant>,
    end: Option<Instant>,
    elapsed: Option<Duration>,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new_from_timesource(time_source())
    }
}

impl Stopwatch {
    /// Creates a stopwatch reading the ambient time source.
    ///
    /// The stopwatch measures nothing until [`start`](Self::start) is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a stopwatch from an explicit timesource
    pub fn new_from_timesource(time_source: TimeSource) -> Self {
        Self {
            time_source,
            start: None,
            end: None,
            elapsed: None,
        }
    }

    /// Discards any previous measurement and starts timing from now.
    pub fn start(&mut self) {
        self.end = None;
        self.elapsed = None;
        self.start = Some(self.time_source.instant());
    }

    /// Stops timing and records the elapsed time since the last [`start`](Self::start).
    ///
    /// Stopping a stopwatch that was never started leaves it in the zero state. Stopping it again
    /// measures again against the same start.
    pub fn stop(&mut self) {
        match &self.start {
            Some(start) => {
                let end = self.time_source.instant();
                self.elapsed = Some(end.duration_since(start));
                self.end = Some(end);
            }
            None => self.reset(),
        }
    }

    /// Starts the stopwatch and returns a guard that stops it when dropped.
    ///
    /// The guard also stops the stopwatch when the current thread unwinds from a panic.
    ///
    /// ```
    /// # use gintonic::Stopwatch;
    /// let mut stopwatch = Stopwatch::new();
    /// let guard = stopwatch.start_scoped();
    /// // Do some work...
    /// let elapsed = guard.stop();
    /// assert_eq!(stopwatch.elapsed_duration(), Some(elapsed));
    /// ```
    pub fn start_scoped(&mut self) -> StopwatchGuard<'_> {
        self.start();
        StopwatchGuard { stopwatch: self }
    }

    /// The elapsed time in `accuracy`, or `0.0` if there is no completed measurement.
    pub fn elapsed(&self, accuracy: Accuracy) -> f64 {
        self.elapsed.map_or(0.0, |elapsed| accuracy.convert(elapsed))
    }

    /// The measured duration, if a `start`..`stop` interval has completed
    pub fn elapsed_duration(&self) -> Option<Duration> {
        self.elapsed
    }

    /// Whether the stopwatch has been started but not stopped yet
    pub fn is_running(&self) -> bool {
        self.start.is_some() && self.end.is_none()
    }

    /// Clears the start, the end, and the measurement.
    pub fn reset(&mut self) {
        self.start = None;
        self.end = None;
        self.elapsed = None;
    }
}

/// Stops its [`Stopwatch`] when dropped. Created by [`Stopwatch::start_scoped`].
#[must_use = "if unused the stopwatch stops immediately"]
#[derive(Debug)]
pub struct StopwatchGuard<'a> {
    stopwatch: &'a mut Stopwatch,
}

impl StopwatchGuard<'_> {
    /// Stops the stopwatch and returns the measured duration
    pub fn stop(self) -> Duration {
        // skip Drop, which would stop a second time
        let mut this = std::mem::ManuallyDrop::new(self);
        this.stopwatch.stop();
        this.stopwatch.elapsed.unwrap_or_default()
    }
}

impl Drop for StopwatchGuard<'_> {
    fn drop(&mut self) {
        self.stopwatch.stop();
    }
}
