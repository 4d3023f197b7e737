// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Process-wide accuracy setting.
//!
//! Tracers built without an explicit [`accuracy`](crate::TracerBuilder::accuracy) read this value
//! on every traced call, so changing it takes effect immediately.

use std::sync::atomic::{AtomicU8, Ordering};

use gintonic_writer::{Accuracy, InvalidAccuracy};

/// Environment variable read by [`init_from_env`]
pub const ACCURACY_ENV_VAR: &str = "GINTONIC_ACCURACY";

static ACCURACY: AtomicU8 = AtomicU8::new(Accuracy::Millis.code());

/// Set the process-wide accuracy
pub fn set_accuracy(accuracy: Accuracy) {
    ACCURACY.store(accuracy.code(), Ordering::Relaxed);
}

/// The process-wide accuracy. Defaults to [`Accuracy::Millis`].
pub fn accuracy() -> Accuracy {
    Accuracy::from_code(ACCURACY.load(Ordering::Relaxed)).unwrap_or_default()
}

/// Set the process-wide accuracy from its numeric code: `1` for milliseconds, `2` for microseconds.
///
/// ```
/// # use gintonic::{config, writer::Accuracy};
/// config::set_accuracy_code(2).unwrap();
/// assert_eq!(config::accuracy(), Accuracy::Micros);
/// assert!(config::set_accuracy_code(3).is_err());
/// # config::set_accuracy(Accuracy::Millis);
/// ```
pub fn set_accuracy_code(code: u8) -> Result<(), InvalidAccuracy> {
    set_accuracy(Accuracy::try_from(code)?);
    Ok(())
}

/// Set the process-wide accuracy from the `GINTONIC_ACCURACY` environment variable.
///
/// An unset variable leaves the current setting alone. Any value accepted by
/// [`Accuracy`'s `FromStr`](Accuracy#impl-FromStr-for-Accuracy) works, such as `1`, `2`, `ms` or `mic`.
pub fn init_from_env() -> Result<(), InvalidAccuracy> {
    match std::env::var(ACCURACY_ENV_VAR) {
        Ok(value) => match value.parse::<Accuracy>() {
            Ok(accuracy) => {
                set_accuracy(accuracy);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(%err, "ignoring {ACCURACY_ENV_VAR}");
                Err(err)
            }
        },
        Err(_) => Ok(()),
    }
}
