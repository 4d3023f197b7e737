// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::{borrow::Cow, fmt};

/// A ready-made identity for the object a traced call runs on.
///
/// [`Tracer`](crate::Tracer) accepts any `PartialEq + Clone` identity; `TargetId` covers the two
/// common cases. [`TargetId::of`] compares objects by address, the way reference equality works.
/// [`TargetId::Named`] compares by a caller-chosen name.
///
/// ```
/// # use gintonic::TargetId;
/// let activity = String::from("main");
/// let other = String::from("main");
/// assert_eq!(TargetId::of(&activity), TargetId::of(&activity));
/// assert_ne!(TargetId::of(&activity), TargetId::of(&other));
/// assert_eq!(TargetId::from("obj1"), TargetId::Named("obj1".into()));
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum TargetId {
    /// Identity by memory address
    Address(usize),
    /// Identity by name
    Named(Cow<'static, str>),
}

impl TargetId {
    /// Identity of the value behind `target`, by address.
    ///
    /// Only meaningful while `target` is alive and not moved.
    pub fn of<T: ?Sized>(target: &T) -> Self {
        TargetId::Address((target as *const T).cast::<()>() as usize)
    }
}

impl fmt::Debug for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetId::Address(address) => write!(f, "Address({address:#x})"),
            TargetId::Named(name) => f.debug_tuple("Named").field(name).finish(),
        }
    }
}

impl From<&'static str> for TargetId {
    fn from(name: &'static str) -> Self {
        TargetId::Named(Cow::Borrowed(name))
    }
}

impl From<String> for TargetId {
    fn from(name: String) -> Self {
        TargetId::Named(Cow::Owned(name))
    }
}
