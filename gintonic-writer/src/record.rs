// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Contains [`MethodTraceRecord`], the value handed to a [`TraceSink`](crate::TraceSink) after each
//! timed invocation.

use std::time::Duration;

use crate::unit::Accuracy;

/// Prefix of messages produced for explicitly annotated operations
pub const ANNOTATED_PREFIX: &str = "Gintonic --> ";

/// One observed invocation: who ran it, the rendered log message, and how long it took.
///
/// Records are immutable. Build them with [`MethodTraceRecord::lifecycle`] or
/// [`MethodTraceRecord::annotated`] so the message and the duration value always agree.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MethodTraceRecord {
    owner: String,
    message: String,
    duration_value: f64,
    accuracy: Accuracy,
}

impl MethodTraceRecord {
    /// Construct a record from already rendered parts.
    pub fn new(
        owner: impl Into<String>,
        message: impl Into<String>,
        duration_value: f64,
        accuracy: Accuracy,
    ) -> Self {
        Self {
            owner: owner.into(),
            message: message.into(),
            duration_value,
            accuracy,
        }
    }

    /// Record for a traced lifecycle operation.
    ///
    /// The message has the form `"<operation> --> [<duration><suffix>]      \n"`, where the duration
    /// is `elapsed` converted to `accuracy` and the suffix is `ms` or `mic`. The duration is always
    /// written as a plain decimal with at least one fractional digit, never in exponent form.
    ///
    /// ```
    /// # use gintonic_writer::{MethodTraceRecord, Accuracy};
    /// # use std::time::Duration;
    /// let record = MethodTraceRecord::lifecycle(
    ///     "MainActivity",
    ///     "onCreate",
    ///     Duration::from_micros(5_500),
    ///     Accuracy::Millis,
    /// );
    /// assert_eq!(record.message(), "onCreate --> [5.5ms]      \n");
    /// assert_eq!(record.duration_value(), 5.5);
    /// ```
    pub fn lifecycle(
        owner: impl Into<String>,
        operation: &str,
        elapsed: Duration,
        accuracy: Accuracy,
    ) -> Self {
        let value = accuracy.convert(elapsed);
        let mut message = String::with_capacity(operation.len() + 32);
        message.push_str(operation);
        message.push_str(" --> [");
        push_plain_decimal(&mut message, value);
        message.push_str(accuracy.suffix());
        message.push_str("]      \n");
        Self::new(owner, message, value, accuracy)
    }

    /// Record for an explicitly annotated operation.
    ///
    /// The message reports whole milliseconds as `"Gintonic --> <operation> --> [<millis>ms]"`, while
    /// the duration value keeps whole microseconds.
    ///
    /// ```
    /// # use gintonic_writer::{MethodTraceRecord, Accuracy};
    /// # use std::time::Duration;
    /// let record = MethodTraceRecord::annotated("Parser", "new", Duration::from_micros(12_345));
    /// assert_eq!(record.message(), "Gintonic --> new --> [12ms]");
    /// assert_eq!(record.duration_value(), 12345.0);
    /// assert_eq!(record.accuracy(), Accuracy::Micros);
    /// ```
    pub fn annotated(owner: impl Into<String>, operation: &str, elapsed: Duration) -> Self {
        let mut buffer = itoa::Buffer::new();
        let message = format!(
            "{ANNOTATED_PREFIX}{operation} --> [{}{}]",
            buffer.format(elapsed.as_millis()),
            Accuracy::Millis.suffix()
        );
        Self::new(
            owner,
            message,
            elapsed.as_micros() as f64,
            Accuracy::Micros,
        )
    }

    /// Name of the type (or component) that owns the traced operation
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// The rendered log message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The measured duration, expressed in [`Self::accuracy`]
    pub fn duration_value(&self) -> f64 {
        self.duration_value
    }

    /// Unit of [`Self::duration_value`]
    pub fn accuracy(&self) -> Accuracy {
        self.accuracy
    }
}

// Shortest round-trip digits from ryu, with any exponent expanded into a plain decimal.
fn push_plain_decimal(out: &mut String, value: f64) {
    let mut buffer = ryu::Buffer::new();
    let formatted = buffer.format(value);
    let Some((mantissa, exponent)) = formatted.split_once('e') else {
        out.push_str(formatted);
        return;
    };
    let Ok(exponent) = exponent.parse::<isize>() else {
        out.push_str(formatted);
        return;
    };
    let mantissa = match mantissa.strip_prefix('-') {
        Some(rest) => {
            out.push('-');
            rest
        }
        None => mantissa,
    };
    let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let digits = [whole, fraction].concat();
    // index in `digits` the decimal point lands on
    let point = whole.len() as isize + exponent;
    if point <= 0 {
        out.push_str("0.");
        out.extend(std::iter::repeat_n('0', point.unsigned_abs()));
        out.push_str(&digits);
    } else if point as usize >= digits.len() {
        out.push_str(&digits);
        out.extend(std::iter::repeat_n('0', point as usize - digits.len()));
        out.push_str(".0");
    } else {
        let (whole, fraction) = digits.split_at(point as usize);
        out.push_str(whole);
        out.push('.');
        out.push_str(fraction);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn whole_durations_keep_a_decimal_point() {
        let record = MethodTraceRecord::lifecycle(
            "MainActivity",
            "onCreate",
            Duration::from_millis(5),
            Accuracy::Millis,
        );
        assert_eq!(record.owner(), "MainActivity");
        assert_eq!(record.message(), "onCreate --> [5.0ms]      \n");
        assert_eq!(record.duration_value(), 5.0);
        assert_eq!(record.accuracy(), Accuracy::Millis);
    }

    #[test]
    fn micro_accuracy_uses_mic_suffix() {
        let record = MethodTraceRecord::lifecycle(
            "MyFrameLayout",
            "onMeasure",
            Duration::from_nanos(42_500),
            Accuracy::Micros,
        );
        assert_eq!(record.message(), "onMeasure --> [42.5mic]      \n");
        assert_eq!(record.duration_value(), 42.5);
    }

    #[test]
    fn zero_duration() {
        let record =
            MethodTraceRecord::lifecycle("A", "onResume", Duration::ZERO, Accuracy::Millis);
        assert_eq!(record.message(), "onResume --> [0.0ms]      \n");
    }

    #[test]
    fn tiny_durations_are_not_in_exponent_form() {
        let record =
            MethodTraceRecord::lifecycle("A", "op", Duration::from_nanos(1), Accuracy::Millis);
        assert_eq!(record.message(), "op --> [0.000001ms]      \n");
        let record =
            MethodTraceRecord::lifecycle("A", "op", Duration::from_nanos(150), Accuracy::Millis);
        assert_eq!(record.message(), "op --> [0.00015ms]      \n");
    }

    #[test]
    fn huge_durations_are_not_in_exponent_form() {
        let record = MethodTraceRecord::lifecycle(
            "A",
            "op",
            Duration::from_secs(20_000),
            Accuracy::Micros,
        );
        assert_eq!(record.message(), "op --> [20000000000.0mic]      \n");

        // beyond 1e16 ryu itself switches to exponents
        let record = MethodTraceRecord::lifecycle(
            "A",
            "op",
            Duration::from_secs(200_000_000_000),
            Accuracy::Micros,
        );
        assert_eq!(record.message(), "op --> [200000000000000000.0mic]      \n");
        assert_eq!(record.duration_value(), 2e17);
    }

    #[test]
    fn plain_decimal_expansion() {
        let expand = |value: f64| {
            let mut out = String::new();
            push_plain_decimal(&mut out, value);
            out
        };
        assert_eq!(expand(0.0), "0.0");
        assert_eq!(expand(5.0), "5.0");
        assert_eq!(expand(1.5e-7), "0.00000015");
        assert_eq!(expand(2.5e20), "250000000000000000000.0");
        assert_eq!(expand(-1e-3), "-0.001");
        assert_eq!(expand(1.2345e17), "123450000000000000.0");
    }

    #[test]
    fn annotated_truncates_millis() {
        let record = MethodTraceRecord::annotated("Widget", "layout", Duration::from_micros(999));
        assert_eq!(record.message(), "Gintonic --> layout --> [0ms]");
        assert_eq!(record.duration_value(), 999.0);
    }
}
