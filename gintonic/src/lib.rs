// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

#![deny(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod advice;
pub mod config;
pub mod global;
pub mod pointcut;
pub mod registry;
pub mod stopwatch;
mod target;
pub mod tracer;

pub use stopwatch::{Stopwatch, StopwatchGuard};
pub use target::TargetId;
pub use tracer::{Tracer, TracerBuilder};

/// Re-export of [`gintonic_writer`]: records, sinks and streams
pub mod writer {
    pub use gintonic_writer::*;
}

/// Re-export of [`gintonic_timesource`]
pub mod timesource {
    pub use gintonic_timesource::*;
}
