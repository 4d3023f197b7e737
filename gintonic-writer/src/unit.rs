// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The [`Accuracy`] a duration is reported in.
//!
//! Durations are always stored as a single [`Duration`]. [`Accuracy::convert`] is the only place
//! they are turned into a number, so millisecond and microsecond readings of the same measurement
//! can never disagree.
//!
//! ```
//! # use gintonic_writer::unit::Accuracy;
//! # use std::time::Duration;
//! let elapsed = Duration::from_nanos(5_250_000);
//! assert_eq!(Accuracy::Millis.convert(elapsed), 5.25);
//! assert_eq!(Accuracy::Micros.convert(elapsed), 5250.0);
//! assert_eq!(Accuracy::Micros.suffix(), "mic");
//! ```

use std::{
    fmt::{self, Display},
    str::FromStr,
    time::Duration,
};

/// Time unit used when reporting a measured duration
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u8)]
pub enum Accuracy {
    /// Milliseconds, reported with the `ms` suffix
    #[default]
    Millis = 1,
    /// Microseconds, reported with the `mic` suffix
    Micros = 2,
}

const NANOS_PER_MILLI: f64 = 1_000_000.0;
const NANOS_PER_MICRO: f64 = 1_000.0;

impl Accuracy {
    /// The numeric configuration code of this accuracy (`1` for millis, `2` for micros)
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// The suffix appended to durations in trace messages
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Millis => "ms",
            Self::Micros => "mic",
        }
    }

    /// Convert `elapsed` into this unit.
    pub fn convert(self, elapsed: Duration) -> f64 {
        let nanos = elapsed.as_nanos() as f64;
        match self {
            Self::Millis => nanos / NANOS_PER_MILLI,
            Self::Micros => nanos / NANOS_PER_MICRO,
        }
    }

    /// Look up an accuracy by its numeric code, returning `None` for unknown codes
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Millis),
            2 => Some(Self::Micros),
            _ => None,
        }
    }
}

impl Display for Accuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl TryFrom<u8> for Accuracy {
    type Error = InvalidAccuracy;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| InvalidAccuracy(code.to_string()))
    }
}

impl FromStr for Accuracy {
    type Err = InvalidAccuracy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "ms" | "millis" | "millisecond" | "milliseconds" => Ok(Self::Millis),
            "2" | "mic" | "micros" | "microsecond" | "microseconds" => Ok(Self::Micros),
            _ => Err(InvalidAccuracy(s.to_owned())),
        }
    }
}

/// Returned when a configuration value does not name a known [`Accuracy`]
#[derive(Clone, PartialEq, Eq)]
pub struct InvalidAccuracy(String);

impl InvalidAccuracy {
    /// The rejected input
    pub fn input(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for InvalidAccuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for InvalidAccuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid accuracy `{}`, expected 1 (millisecond) or 2 (microsecond)",
            self.0
        )
    }
}

impl std::error::Error for InvalidAccuracy {}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use assert_approx_eq::assert_approx_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(999)]
    #[case(5_000_000)]
    #[case(1_234_567_891)]
    #[case(86_400_000_000_123)]
    fn micros_are_a_thousand_millis(#[case] nanos: u64) {
        let elapsed = Duration::from_nanos(nanos);
        let millis = Accuracy::Millis.convert(elapsed);
        let micros = Accuracy::Micros.convert(elapsed);
        assert_approx_eq!(micros, millis * 1000.0, micros.abs() * 1e-12 + 1e-9);
    }

    #[test]
    fn conversions_keep_sub_unit_precision() {
        let elapsed = Duration::from_nanos(1_500);
        assert_eq!(Accuracy::Micros.convert(elapsed), 1.5);
        assert_eq!(Accuracy::Millis.convert(elapsed), 0.0015);
    }

    #[rstest]
    #[case("1", Accuracy::Millis)]
    #[case("ms", Accuracy::Millis)]
    #[case(" Millis ", Accuracy::Millis)]
    #[case("2", Accuracy::Micros)]
    #[case("MIC", Accuracy::Micros)]
    #[case("microsecond", Accuracy::Micros)]
    fn parses_config_values(#[case] input: &str, #[case] expected: Accuracy) {
        assert_eq!(input.parse::<Accuracy>().unwrap(), expected);
    }

    #[test]
    fn rejects_unknown_codes() {
        assert_eq!(Accuracy::try_from(1).unwrap(), Accuracy::Millis);
        assert_eq!(Accuracy::try_from(2).unwrap(), Accuracy::Micros);
        let err = Accuracy::try_from(3).unwrap_err();
        assert_eq!(err.input(), "3");
        assert_eq!(
            err.to_string(),
            "invalid accuracy `3`, expected 1 (millisecond) or 2 (microsecond)"
        );
        assert!("seconds".parse::<Accuracy>().is_err());
    }

    #[test]
    fn codes_and_suffixes() {
        assert_eq!(Accuracy::default(), Accuracy::Millis);
        assert_eq!(Accuracy::Millis.code(), 1);
        assert_eq!(Accuracy::Micros.code(), 2);
        assert_eq!(Accuracy::Millis.to_string(), "ms");
        assert_eq!(Accuracy::Micros.to_string(), "mic");
    }
}
