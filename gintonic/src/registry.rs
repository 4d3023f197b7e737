// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! A table of named operations whose every invocation is traced.

use std::{collections::HashMap, fmt};

use crate::Tracer;

type Operation<A, R> = Box<dyn Fn(A) -> R + Send + Sync>;

/// Maps `(owner, operation)` to an implementation, and traces each call made through the table.
///
/// This is the table-driven alternative to calling [`Tracer::wrap`] at every call site.
///
/// ```
/// use gintonic::{Tracer, registry::OperationTable, writer::sink::VecTraceSink};
///
/// let sink = VecTraceSink::new();
/// let tracer = Tracer::new(sink.clone());
///
/// let mut table = OperationTable::new();
/// table.register("MyFrameLayout", "onMeasure", |(w, h): (u32, u32)| w * h);
///
/// let area = table.invoke(&tracer, "frame", "MyFrameLayout", "onMeasure", (3, 4));
/// assert_eq!(area, Ok(12));
/// assert!(table.invoke(&tracer, "frame", "MyFrameLayout", "onDraw", (3, 4)).is_err());
/// assert_eq!(sink.len(), 1);
/// ```
pub struct OperationTable<A, R> {
    operations: HashMap<(String, String), Operation<A, R>>,
}

impl<A, R> Default for OperationTable<A, R> {
    fn default() -> Self {
        Self {
            operations: HashMap::new(),
        }
    }
}

impl<A, R> fmt::Debug for OperationTable<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.operations.keys()).finish()
    }
}

impl<A, R> OperationTable<A, R> {
    /// An empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `implementation` under `owner`/`operation`, replacing any previous entry
    pub fn register(
        &mut self,
        owner: impl Into<String>,
        operation: impl Into<String>,
        implementation: impl Fn(A) -> R + Send + Sync + 'static,
    ) -> &mut Self {
        self.operations
            .insert((owner.into(), operation.into()), Box::new(implementation));
        self
    }

    /// Whether an implementation is registered under `owner`/`operation`
    pub fn contains(&self, owner: &str, operation: &str) -> bool {
        self.operations
            .contains_key(&(owner.to_owned(), operation.to_owned()))
    }

    /// Number of registered operations
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Call the implementation registered under `owner`/`operation` with `arg`, through `tracer`.
    pub fn invoke<I: PartialEq + Clone>(
        &self,
        tracer: &Tracer<I>,
        target: I,
        owner: &str,
        operation: &str,
        arg: A,
    ) -> Result<R, UnknownOperation> {
        let implementation = self
            .operations
            .get(&(owner.to_owned(), operation.to_owned()))
            .ok_or_else(|| UnknownOperation {
                owner: owner.to_owned(),
                operation: operation.to_owned(),
            })?;
        Ok(tracer.wrap(target, owner, operation, || implementation(arg)))
    }
}

/// Returned by [`OperationTable::invoke`] when nothing is registered under the requested name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOperation {
    owner: String,
    operation: String,
}

impl UnknownOperation {
    /// The owner that was looked up
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// The operation that was looked up
    pub fn operation(&self) -> &str {
        &self.operation
    }
}

impl fmt::Display for UnknownOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no operation `{}` registered for `{}`",
            self.operation, self.owner
        )
    }
}

impl std::error::Error for UnknownOperation {}
