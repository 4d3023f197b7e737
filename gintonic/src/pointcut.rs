// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Selecting which operations a [`Tracer`](crate::Tracer) times.

use std::borrow::Cow;

/// The operation a traced call runs: the owning type and the operation name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JoinPoint<'a> {
    /// Name of the type that owns the operation, for example `MainActivity`
    pub owner: &'a str,
    /// Name of the operation, for example `onCreate`
    pub operation: &'a str,
}

impl<'a> JoinPoint<'a> {
    /// Create a join point
    pub const fn new(owner: &'a str, operation: &'a str) -> Self {
        Self { owner, operation }
    }
}

/// A predicate over [`JoinPoint`]s.
///
/// Calls whose join point does not match still run, but are not timed and emit nothing.
///
/// ```
/// # use gintonic::pointcut::{JoinPoint, Pointcut};
/// let lifecycle = Pointcut::lifecycle();
/// assert!(lifecycle.matches(&JoinPoint::new("MainActivity", "onCreate")));
/// assert!(lifecycle.matches(&JoinPoint::new("MyLinearLayout", "onMeasure")));
/// assert!(!lifecycle.matches(&JoinPoint::new("Parser", "parse")));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Pointcut {
    /// Every join point
    #[default]
    All,
    /// Join points whose owner ends with one of the suffixes
    OwnerSuffix(Vec<Cow<'static, str>>),
    /// One operation, optionally restricted to an owner
    Operation {
        /// When set, the owner must match exactly
        owner: Option<Cow<'static, str>>,
        /// The operation name
        operation: Cow<'static, str>,
    },
    /// Join points matched by any of the inner pointcuts
    AnyOf(Vec<Pointcut>),
}

impl Pointcut {
    /// Lifecycle methods of activities and layouts: owners ending in `Activity` or `Layout`.
    pub fn lifecycle() -> Self {
        Pointcut::OwnerSuffix(vec![Cow::Borrowed("Activity"), Cow::Borrowed("Layout")])
    }

    /// Every operation named `operation`, whatever its owner
    pub fn operation(operation: impl Into<Cow<'static, str>>) -> Self {
        Pointcut::Operation {
            owner: None,
            operation: operation.into(),
        }
    }

    /// Whether `join_point` is selected
    pub fn matches(&self, join_point: &JoinPoint<'_>) -> bool {
        match self {
            Pointcut::All => true,
            Pointcut::OwnerSuffix(suffixes) => suffixes
                .iter()
                .any(|suffix| join_point.owner.ends_with(suffix.as_ref())),
            Pointcut::Operation { owner, operation } => {
                operation == join_point.operation
                    && owner.as_deref().is_none_or(|owner| owner == join_point.owner)
            }
            Pointcut::AnyOf(pointcuts) => pointcuts.iter().any(|p| p.matches(join_point)),
        }
    }
}
