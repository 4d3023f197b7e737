// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant},
};

use crate::Time;

/// A clock that never moves
///
/// Every measurement taken against it is zero.
#[derive(Debug)]
pub struct StaticTimeSource {
    now_instant: Instant,
}

impl StaticTimeSource {
    /// Create a new StaticTimeSource frozen at the given instant
    ///
    /// # Examples
    ///
    /// ```
    /// use gintonic_timesource::{TimeSource, fakes::StaticTimeSource};
    /// use std::time::{Duration, Instant};
    ///
    /// let ts = TimeSource::custom(StaticTimeSource::at_instant(Instant::now()));
    /// let start = ts.instant();
    /// assert_eq!(start.elapsed(), Duration::ZERO);
    /// ```
    pub fn at_instant(instant: Instant) -> Self {
        Self {
            now_instant: instant,
        }
    }
}

impl Default for StaticTimeSource {
    fn default() -> Self {
        Self::at_instant(Instant::now())
    }
}

impl Time for StaticTimeSource {
    fn instant(&self) -> Instant {
        self.now_instant
    }
}

/// A clock that only moves when told to
///
/// Clones share the same clock, so a test can keep one handle and give another to the code under test.
#[derive(Debug, Clone, Default)]
pub struct ManuallyAdvancedTimeSource(Arc<Mutex<StaticTimeSource>>);

impl ManuallyAdvancedTimeSource {
    /// Create a new clock frozen at the current instant
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new clock frozen at the given instant
    pub fn at_instant(instant: Instant) -> Self {
        Self(Arc::new(Mutex::new(StaticTimeSource::at_instant(instant))))
    }

    /// Move the clock forward by `elapsed`.
    ///
    /// # Examples
    ///
    /// ```
    /// use gintonic_timesource::{TimeSource, fakes::ManuallyAdvancedTimeSource};
    /// use std::time::Duration;
    ///
    /// let clock = ManuallyAdvancedTimeSource::new();
    /// let ts = TimeSource::custom(clock.clone());
    /// let instant = ts.instant();
    ///
    /// clock.advance(Duration::from_millis(5));
    /// assert_eq!(instant.elapsed(), Duration::from_millis(5));
    /// ```
    pub fn advance(&self, elapsed: Duration) {
        let mut guard = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        guard.now_instant += elapsed;
    }
}

impl Time for ManuallyAdvancedTimeSource {
    fn instant(&self) -> Instant {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .now_instant
    }
}
