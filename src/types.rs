//! Core identifier types shared across the engine.
//!
//! These are the domain concepts every other module speaks in: job
//! identifiers assigned during graph construction, the argument payload a
//! whole materialization request shares, and the dependency-output map handed
//! to policies and creation routines.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one job inside a [`JobGraph`](crate::graphs::JobGraph).
///
/// Ids are assigned monotonically from 0 at the first visit of each distinct
/// asset during a graph walk; the root asset always receives id 0. Ids are
/// only meaningful within the graph that produced them.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct JobId(pub u32);

impl JobId {
    /// Index into the graph's job list.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Argument payload common to one whole materialization request.
///
/// The same payload is stamped onto every job in a graph and onto every node
/// of the composed flow — all jobs in one materialization share one argument
/// context, identical by value.
pub type MaterializeArgs = Vec<String>;

/// Dependency outputs handed to an asset's policy and creation routine,
/// keyed by the dependency asset's name.
pub type DepsData = FxHashMap<String, serde_json::Value>;

/// Queue assets land on when they do not declare one of their own.
pub const DEFAULT_QUEUE: &str = "assets";
