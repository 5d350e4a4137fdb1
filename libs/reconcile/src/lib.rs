//! Deletion guard primitives.
//!
//! This library provides the building blocks for level-triggered teardown
//! of a record that owns other resources. Key concepts:
//!
//! - **Finalizer**: a guard token naming a subsystem that must acknowledge
//!   cleanup before the record may be removed.
//! - **Finalizer set**: the guards currently attached to a record. Treated as
//!   an immutable snapshot; every change produces a new set.
//! - **Progress**: whether a teardown step is finished for this pass or still
//!   waiting for an external system to converge.
//!
//! # Invariants
//!
//! - A record may only be removed once its finalizer set is empty
//! - Adding or removing a finalizer is idempotent
//! - Decisions are deterministic given the same inputs

use std::borrow::Cow;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A deletion guard token.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Finalizer(Cow<'static, str>);

impl Finalizer {
    /// Create a finalizer from a static token, usable in `const` items.
    pub const fn from_static(token: &'static str) -> Self {
        Self(Cow::Borrowed(token))
    }

    /// Create a finalizer from an owned token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(Cow::Owned(token.into()))
    }

    /// Get the token string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Finalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Snapshot of the finalizers attached to a record.
///
/// Ordered so that logs and serialized records are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FinalizerSet(BTreeSet<Finalizer>);

impl FinalizerSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `finalizer` is present.
    pub fn contains(&self, finalizer: &Finalizer) -> bool {
        self.0.contains(finalizer)
    }

    /// Returns true if no finalizers remain.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of finalizers in the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over the finalizers in token order.
    pub fn iter(&self) -> impl Iterator<Item = &Finalizer> {
        self.0.iter()
    }

    /// Returns a new set that also contains `finalizer`.
    #[must_use]
    pub fn with(&self, finalizer: &Finalizer) -> Self {
        let mut next = self.0.clone();
        next.insert(finalizer.clone());
        Self(next)
    }

    /// Returns a new set without `finalizer`.
    #[must_use]
    pub fn without(&self, finalizer: &Finalizer) -> Self {
        let mut next = self.0.clone();
        next.remove(finalizer);
        Self(next)
    }
}

impl std::fmt::Display for FinalizerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[")?;
        for (i, finalizer) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(finalizer.as_str())?;
        }
        f.write_str("]")
    }
}

impl FromIterator<Finalizer> for FinalizerSet {
    fn from_iter<I: IntoIterator<Item = Finalizer>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a FinalizerSet {
    type Item = &'a Finalizer;
    type IntoIter = std::collections::btree_set::Iter<'a, Finalizer>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Progress of a teardown step within a single pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Nothing left to do in this pass; later steps may run.
    Done,

    /// Work was started that an external system still has to finish.
    Pending,
}

impl Progress {
    /// Returns true if the step is still waiting on external convergence.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Result of one teardown step: the next finalizer snapshot and its progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseOutcome {
    /// Finalizers after the step ran.
    pub finalizers: FinalizerSet,

    /// Whether later steps may run in this pass.
    pub progress: Progress,
}

impl PhaseOutcome {
    /// The step finished; continue with `finalizers`.
    pub fn done(finalizers: FinalizerSet) -> Self {
        Self {
            finalizers,
            progress: Progress::Done,
        }
    }

    /// The step is waiting on external convergence.
    pub fn pending(finalizers: FinalizerSet) -> Self {
        Self {
            finalizers,
            progress: Progress::Pending,
        }
    }
}
