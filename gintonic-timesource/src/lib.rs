// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Monotonic time sources for gintonic.
//!
//! Everything gintonic measures is measured against an [`Instant`] produced by a [`TimeSource`].
//! By default that is the system monotonic clock. Tests can replace it with a fake clock, either
//! explicitly or through a thread-local override, so elapsed-time assertions are exact.

#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

use std::{cell::RefCell, fmt::Debug, time::Duration, time::Instant as StdInstant};

/// Fake time sources for testing
///
/// To enable this module, you must enable the `test-util` feature.
#[cfg(feature = "test-util")]
pub mod fakes;

/// A monotonic clock.
///
/// Implementors must never go backwards between two calls made from the same thread.
pub trait Time: Send + Sync + Debug {
    /// Get the current instant
    fn instant(&self) -> StdInstant;
}

/// Tokio-backed time source
///
/// Reads the clock through [`tokio::time::Instant`], so it follows `tokio::time::pause` and
/// `tokio::time::advance`. This requires that the `tokio` feature be enabled.
#[cfg(feature = "tokio")]
pub mod tokio {
    use std::time::Instant as StdInstant;

    use tokio::time::Instant as TokioInstant;

    use crate::{Time, TimeSource};

    impl TimeSource {
        /// Create a new TimeSource that reads tokio's clock
        ///
        /// # Examples
        ///
        /// ```
        /// # #[tokio::main(flavor = "current_thread")]
        /// # async fn main() {
        /// use std::time::Duration;
        /// use gintonic_timesource::TimeSource;
        ///
        /// tokio::time::pause();
        /// let ts = TimeSource::tokio();
        /// let start = ts.instant();
        ///
        /// tokio::time::advance(Duration::from_millis(5)).await;
        /// assert_eq!(start.elapsed(), Duration::from_millis(5));
        /// # }
        /// ```
        pub fn tokio() -> Self {
            TimeSource::custom(TokioTime)
        }
    }

    /// A [`Time`] implementation reading [`tokio::time::Instant::now`]
    #[derive(Copy, Clone, Debug, Default)]
    pub struct TokioTime;

    impl Time for TokioTime {
        fn instant(&self) -> StdInstant {
            TokioInstant::now().into_std()
        }
    }

    #[cfg(test)]
    mod test {
        use std::time::Duration;

        use crate::{TimeSource, set_time_source, time_source};

        #[tokio::test(start_paused = true)]
        async fn tokio_time_source() {
            let ts = TimeSource::tokio();
            let start = ts.instant();
            tokio::time::advance(Duration::from_millis(7)).await;
            assert_eq!(start.elapsed(), Duration::from_millis(7));
            assert_eq!(ts.instant().duration_since(&start), Duration::from_millis(7));
        }

        #[tokio::test(start_paused = true)]
        async fn tokio_time_source_as_override() {
            let _guard = set_time_source(TimeSource::tokio());
            let start = time_source().instant();
            tokio::time::advance(Duration::from_secs(2)).await;
            assert_eq!(start.elapsed(), Duration::from_secs(2));
        }
    }
}

/// Where instants come from
///
/// `TimeSource` is cheap to clone. Clones of a custom time source share the same clock.
#[derive(Clone, Default)]
pub enum TimeSource {
    /// Use the system monotonic clock
    #[default]
    System,
    #[cfg(feature = "custom-timesource")]
    /// Use a custom clock
    Custom(std::sync::Arc<dyn Time + Send + Sync>),
}

impl std::fmt::Debug for TimeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "TimeSource::System"),
            #[cfg(feature = "custom-timesource")]
            Self::Custom(_) => write!(f, "TimeSource::Custom(...)"),
        }
    }
}

impl TimeSource {
    /// Get the current instant from this time source
    ///
    /// # Examples
    ///
    /// ```
    /// use gintonic_timesource::TimeSource;
    ///
    /// let ts = TimeSource::System;
    /// let start = ts.instant();
    /// // Do some work
    /// let elapsed = start.elapsed();
    /// ```
    pub fn instant(&self) -> Instant {
        match self {
            Self::System => Instant::new(StdInstant::now(), self),
            #[cfg(feature = "custom-timesource")]
            Self::Custom(ts) => Instant::new(ts.instant(), self),
        }
    }

    /// Create a new TimeSource with a custom clock
    ///
    /// This method is only available when the `custom-timesource` feature is enabled.
    #[cfg(feature = "custom-timesource")]
    pub fn custom(custom: impl Time + 'static) -> TimeSource {
        Self::Custom(std::sync::Arc::new(custom))
    }
}

thread_local! {
    static THREAD_LOCAL_TIME_SOURCE: RefCell<Option<TimeSource>> = const { RefCell::new(None) };
}

/// Guard for a thread-local time source override
///
/// Restores the previous override when dropped.
#[must_use]
pub struct ThreadLocalTimeSourceGuard {
    previous: Option<TimeSource>,
}

impl Drop for ThreadLocalTimeSourceGuard {
    fn drop(&mut self) {
        THREAD_LOCAL_TIME_SOURCE.with(|cell| {
            *cell.borrow_mut() = self.previous.take();
        });
    }
}

#[cfg(feature = "custom-timesource")]
/// Set a thread-local time source override and return a guard
///
/// # Examples
/// ```
/// use gintonic_timesource::{TimeSource, fakes::ManuallyAdvancedTimeSource, time_source, set_time_source};
/// use std::time::Duration;
///
/// let clock = ManuallyAdvancedTimeSource::new();
/// let _guard = set_time_source(TimeSource::custom(clock.clone()));
///
/// let start = time_source().instant();
/// clock.advance(Duration::from_millis(3));
/// assert_eq!(start.elapsed(), Duration::from_millis(3));
/// ```
pub fn set_time_source(time_source: TimeSource) -> ThreadLocalTimeSourceGuard {
    let previous = THREAD_LOCAL_TIME_SOURCE.with(|cell| cell.borrow_mut().replace(time_source));
    ThreadLocalTimeSourceGuard { previous }
}

#[cfg(feature = "custom-timesource")]
/// Run a closure with a thread-local time source override
pub fn with_time_source<F, R>(time_source: TimeSource, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = set_time_source(time_source);
    f()
}

/// Get the current time source, following the priority order:
/// 1. Explicitly provided time source
/// 2. Thread-local override
/// 3. System default
#[inline]
pub fn get_time_source(ts: Option<TimeSource>) -> TimeSource {
    if let Some(ts) = ts {
        return ts;
    }

    #[cfg(feature = "custom-timesource")]
    {
        let thread_local = THREAD_LOCAL_TIME_SOURCE.with(|cell| cell.borrow().clone());
        if let Some(ts) = thread_local {
            return ts;
        }
    }

    TimeSource::System
}

/// Get the ambient time source
///
/// This is the thread-local override if one is set, otherwise the system clock.
#[inline]
pub fn time_source() -> TimeSource {
    get_time_source(None)
}

/// `Instant` wrapper
///
/// When `custom-timesource` is not enabled, this is exactly the same size as `std::time::Instant`.
/// When it _is_ enabled, the instant keeps a handle to the time source it came from so that
/// [`Instant::elapsed`] reads the same clock.
#[derive(Clone)]
#[cfg_attr(not(feature = "custom-timesource"), derive(Copy), repr(transparent))]
pub struct Instant {
    value: StdInstant,
    #[cfg(feature = "custom-timesource")]
    time_source: TimeSource,
}

impl From<Instant> for StdInstant {
    fn from(instant: Instant) -> std::time::Instant {
        instant.as_std()
    }
}

impl std::fmt::Debug for Instant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.value.fmt(f)
    }
}

impl PartialEq for Instant {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Instant {}

impl PartialOrd for Instant {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Instant {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.value.cmp(&other.value)
    }
}

impl Instant {
    /// Read the current instant from the given TimeSource
    pub fn now(ts: &TimeSource) -> Self {
        ts.instant()
    }

    /// Returns the amount of time elapsed since this instant was read
    ///
    /// # Examples
    ///
    /// ```
    /// use gintonic_timesource::time_source;
    /// use std::thread;
    /// use std::time::Duration;
    ///
    /// let start = time_source().instant();
    /// thread::sleep(Duration::from_millis(10));
    /// assert!(start.elapsed() >= Duration::from_millis(10));
    /// ```
    pub fn elapsed(&self) -> Duration {
        #[cfg(not(feature = "custom-timesource"))]
        let ts = TimeSource::System;
        #[cfg(feature = "custom-timesource")]
        let ts = &self.time_source;

        ts.instant().duration_since(self)
    }

    /// Returns the amount of time between `earlier` and this instant
    ///
    /// Saturates to zero if `earlier` is later than `self`, so a measurement can never be negative.
    pub fn duration_since(&self, earlier: &Instant) -> Duration {
        self.value.saturating_duration_since(earlier.value)
    }

    /// Convert this Instant to a std::time::Instant
    ///
    /// After conversion, `elapsed()` will no longer respect custom time sources.
    pub fn as_std(&self) -> StdInstant {
        self.value
    }

    fn new(std: StdInstant, ts: &TimeSource) -> Self {
        #[cfg(not(feature = "custom-timesource"))]
        let _ = ts;
        Self {
            value: std,
            #[cfg(feature = "custom-timesource")]
            time_source: ts.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::{
        TimeSource, fakes::ManuallyAdvancedTimeSource, get_time_source, set_time_source,
        time_source, with_time_source,
    };

    #[test]
    fn test_default_time_source() {
        match time_source() {
            TimeSource::System => {}
            _ => panic!("Expected default time source to be System"),
        }
    }

    #[test]
    fn test_explicit_time_source() {
        let ts = TimeSource::custom(ManuallyAdvancedTimeSource::new());
        match get_time_source(Some(ts)) {
            TimeSource::Custom(_) => {}
            _ => panic!("Expected explicit time source to be used"),
        }
    }

    #[test]
    fn test_thread_local_time_source() {
        let clock = ManuallyAdvancedTimeSource::new();

        {
            let _guard = set_time_source(TimeSource::custom(clock.clone()));
            let start = get_time_source(None).instant();
            clock.advance(Duration::from_micros(250));
            assert_eq!(start.elapsed(), Duration::from_micros(250));
        }

        // After guard is dropped, should go back to default
        match get_time_source(None) {
            TimeSource::System => {}
            _ => panic!("Expected default time source after guard is dropped"),
        }
    }

    #[test]
    fn test_nested_overrides_restore_previous() {
        let outer = ManuallyAdvancedTimeSource::new();
        let inner = ManuallyAdvancedTimeSource::new();
        let _outer = set_time_source(TimeSource::custom(outer.clone()));
        with_time_source(TimeSource::custom(inner.clone()), || {
            let start = time_source().instant();
            inner.advance(Duration::from_millis(1));
            outer.advance(Duration::from_millis(100));
            assert_eq!(start.elapsed(), Duration::from_millis(1));
        });
        let start = time_source().instant();
        outer.advance(Duration::from_millis(2));
        assert_eq!(start.elapsed(), Duration::from_millis(2));
    }

    #[test]
    fn duration_since_saturates() {
        let clock = ManuallyAdvancedTimeSource::new();
        let ts = TimeSource::custom(clock.clone());
        let earlier = ts.instant();
        clock.advance(Duration::from_millis(4));
        let later = ts.instant();
        assert_eq!(later.duration_since(&earlier), Duration::from_millis(4));
        assert_eq!(earlier.duration_since(&later), Duration::ZERO);
        assert!(earlier < later);
    }
}
