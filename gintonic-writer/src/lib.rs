// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Writer side of gintonic: trace records and the sinks that receive them.
//!
//! A [`MethodTraceRecord`] describes one timed invocation. Records are handed to a [`TraceSink`],
//! which decides where they go: the `tracing` log ([`sink::TracingSink`]), an in-memory buffer
//! ([`sink::VecTraceSink`]), or an output stream written either synchronously
//! ([`sink::FlushImmediately`]) or from a background thread (`sink::BackgroundQueue`).
//!
//! Sinks never hand errors back to the caller. Instrumentation must not change the outcome of the
//! instrumented code, so failed writes are logged and dropped.

#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub use record::MethodTraceRecord;
pub use sink::{BoxTraceSink, FlushWait, TraceSink};
pub use stream::TraceStream;
pub use unit::{Accuracy, InvalidAccuracy};

#[cfg(feature = "background_queue")]
pub(crate) mod rate_limit;
pub mod record;
pub mod sink;
pub mod stream;
#[cfg(feature = "test-util")]
pub mod test_util;
pub mod unit;
