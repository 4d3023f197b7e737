// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! A process-wide [`Tracer`], for code that has no tracer of its own to pass around.
//!
//! The process-wide tracer tracks a single current [`TargetId`] for the whole process. Prefer an
//! explicit [`Tracer`] per trace session when calls from several threads interleave.

use std::{fmt, sync::OnceLock};

use crate::{TargetId, Tracer};

static TRACER: OnceLock<Tracer<TargetId>> = OnceLock::new();

/// Install `tracer` as the process-wide tracer.
///
/// Fails if a tracer is already installed, including the default one installed by an earlier call to
/// [`tracer`].
pub fn install(tracer: Tracer<TargetId>) -> Result<(), AlreadyInstalled> {
    let mut tracer = Some(tracer);
    TRACER.get_or_init(|| tracer.take().unwrap_or_default());
    match tracer {
        // ours was not used
        Some(_) => Err(AlreadyInstalled(())),
        None => Ok(()),
    }
}

/// The process-wide tracer. If none is installed, a default tracer logging through
/// [`TracingSink`](crate::writer::sink::TracingSink) is installed first.
pub fn tracer() -> &'static Tracer<TargetId> {
    TRACER.get_or_init(Tracer::default)
}

/// [`Tracer::wrap`] through the process-wide tracer
pub fn wrap<T>(
    target: impl Into<TargetId>,
    owner: &str,
    operation: &str,
    work: impl FnOnce() -> T,
) -> T {
    tracer().wrap(target.into(), owner, operation, work)
}

/// [`Tracer::wrap_async`] through the process-wide tracer
pub async fn wrap_async<F: Future>(
    target: impl Into<TargetId>,
    owner: &str,
    operation: &str,
    future: F,
) -> F::Output {
    tracer()
        .wrap_async(target.into(), owner, operation, future)
        .await
}

/// Returned by [`install`] when a process-wide tracer already exists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlreadyInstalled(());

impl fmt::Display for AlreadyInstalled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a global tracer is already installed")
    }
}

impl std::error::Error for AlreadyInstalled {}
