//! Job graph construction from a root asset.
//!
//! Walking an asset's transitive dependencies is a DAG traversal, not a tree
//! walk: several ancestors may depend on the same asset, and that asset must
//! become exactly one job no matter how many edges point at it.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::asset::Asset;
use crate::types::{JobId, MaterializeArgs};

/// One scheduled unit of materialization work, corresponding to exactly one
/// distinct asset reached during the graph walk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConfig {
    /// Assigned at first visit, monotonically increasing from 0. The root
    /// asset always gets id 0.
    pub id: JobId,
    /// Asset name; resolves back to the asset through the registry at
    /// execution time.
    pub name: String,
    /// Logical execution lane.
    pub queue: String,
    /// Argument payload shared by the whole materialization request.
    pub args: MaterializeArgs,
}

/// Directed dependency edge: `job` cannot run until `depends_on` completes.
///
/// Several jobs sharing one dependency produce several edges into the same
/// `depends_on` (fan-in); a job with several dependencies produces several
/// edges out (fan-out).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobEdge {
    pub job: JobId,
    pub depends_on: JobId,
}

/// The complete materialized DAG for one root asset.
///
/// `jobs[0]` is the root by construction. Instances are created per
/// materialization request and discarded after dispatch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobGraph {
    pub jobs: Vec<JobConfig>,
    pub dependencies: Vec<JobEdge>,
}

impl JobGraph {
    /// Walk `root` and its transitive dependencies into a flat job list plus
    /// dependency edges.
    ///
    /// The walk is iterative over an explicit visit stack. Each distinct
    /// asset (by name) is assigned a [`JobId`] at first visit and expanded —
    /// its dependency edges traversed — exactly once; the set of parents
    /// already recorded for each dependency ("visited-from") suppresses
    /// duplicate edges for the same parent→child pair. After the traversal
    /// the visited-from map is flattened into the edge list: one edge per
    /// (dependency, distinct parent) pair.
    ///
    /// A root with no dependencies yields a single job and no edges.
    #[must_use]
    pub fn build(root: Arc<dyn Asset>, args: &MaterializeArgs) -> Self {
        let mut jobs: Vec<JobConfig> = Vec::new();
        let mut ids: FxHashMap<String, JobId> = FxHashMap::default();
        // child -> parents that already traversed an edge into it
        let mut visited_from: FxHashMap<JobId, Vec<JobId>> = FxHashMap::default();
        // children in first-discovery order, for deterministic edge output
        let mut child_order: Vec<JobId> = Vec::new();
        let mut expanded: FxHashSet<JobId> = FxHashSet::default();

        let root_id = JobId(0);
        ids.insert(root.name().to_string(), root_id);
        jobs.push(JobConfig {
            id: root_id,
            name: root.name().to_string(),
            queue: root.queue().to_string(),
            args: args.clone(),
        });

        let mut stack: Vec<Arc<dyn Asset>> = vec![root];
        while let Some(asset) = stack.pop() {
            let parent_id = ids[asset.name()];
            if !expanded.insert(parent_id) {
                continue; // already expanded via another ancestor
            }
            for dep in asset.deps() {
                let dep_id = match ids.get(dep.name()) {
                    Some(id) => *id,
                    None => {
                        let id = JobId(jobs.len() as u32);
                        ids.insert(dep.name().to_string(), id);
                        jobs.push(JobConfig {
                            id,
                            name: dep.name().to_string(),
                            queue: dep.queue().to_string(),
                            args: args.clone(),
                        });
                        id
                    }
                };

                let parents = visited_from.entry(dep_id).or_insert_with(|| {
                    child_order.push(dep_id);
                    Vec::new()
                });
                if !parents.contains(&parent_id) {
                    parents.push(parent_id);
                }
                if !expanded.contains(&dep_id) {
                    stack.push(dep);
                }
            }
        }

        let mut dependencies = Vec::new();
        for child in child_order {
            if let Some(parents) = visited_from.get(&child) {
                for parent in parents {
                    dependencies.push(JobEdge {
                        job: *parent,
                        depends_on: child,
                    });
                }
            }
        }

        JobGraph { jobs, dependencies }
    }

    /// Direct dependencies of `job`, in edge order.
    #[must_use]
    pub fn deps_of(&self, job: JobId) -> Vec<JobId> {
        self.dependencies
            .iter()
            .filter(|edge| edge.job == job)
            .map(|edge| edge.depends_on)
            .collect()
    }

    /// Jobs that depend on `job`, in edge order.
    #[must_use]
    pub fn dependents_of(&self, job: JobId) -> Vec<JobId> {
        self.dependencies
            .iter()
            .filter(|edge| edge.depends_on == job)
            .map(|edge| edge.job)
            .collect()
    }

    /// Job config by id. Ids always index into `jobs` by construction.
    #[must_use]
    pub fn job(&self, id: JobId) -> &JobConfig {
        &self.jobs[id.index()]
    }
}
