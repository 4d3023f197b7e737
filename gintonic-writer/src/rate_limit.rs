// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::{sync::OnceLock, time::Instant};

#[doc(hidden)]
pub(crate) fn millis_since_start() -> u64 {
    static START: OnceLock<Instant> = OnceLock::new();
    let start = *START.get_or_init(Instant::now);
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// `rate_limited!(interval, |suppressed| expr)` evaluates `expr` at most once per `interval` for each
/// call site, across all threads.
///
/// `suppressed` is bound to the number of evaluations skipped at this call site since the last one
/// that ran, so a persistent failure is logged once with a running count instead of flooding the log.
macro_rules! rate_limited {
    ($interval:expr, |$suppressed:ident| $call:expr) => {{
        use std::sync::atomic::{AtomicU64, Ordering};
        static NEXT_DUE_MILLIS: AtomicU64 = AtomicU64::new(0);
        static SUPPRESSED: AtomicU64 = AtomicU64::new(0);

        let interval: std::time::Duration = $interval;
        let now = $crate::rate_limit::millis_since_start();
        let due = NEXT_DUE_MILLIS.load(Ordering::Relaxed);
        let next_due = now.saturating_add(u64::try_from(interval.as_millis()).unwrap_or(u64::MAX));
        if due <= now
            && NEXT_DUE_MILLIS
                .compare_exchange(due, next_due, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
        {
            let $suppressed = SUPPRESSED.swap(0, Ordering::Relaxed);
            $call;
        } else {
            SUPPRESSED.fetch_add(1, Ordering::Relaxed);
        }
    }};
}
pub(crate) use rate_limited;
