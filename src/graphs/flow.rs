//! Flow composition: nesting sorted jobs into a parent/child descriptor.

use serde::{Deserialize, Serialize};

use super::builder::JobGraph;
use crate::types::{JobId, MaterializeArgs};

/// Nested execution descriptor consumable by an external queue/worker
/// runtime: a job's `children` are its dependencies, and the queue runs a
/// parent only after all of its children complete.
///
/// The same `data` payload is attached to the root and to every descendant,
/// unmodified — all jobs in one materialization share one argument context,
/// identical by value. Consumers rely on that, so it is a structural
/// requirement rather than a convenience.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowJob {
    pub name: String,
    pub queue_name: String,
    pub data: MaterializeArgs,
    pub children: Vec<FlowJob>,
}

/// Convert a job graph plus its topological order into a [`FlowJob`] tree
/// rooted at the last-sorted job (the originally requested root).
///
/// Every edge in the graph corresponds to a parent-child relationship
/// reachable by descending `children`. A dependency shared by several parents
/// appears once per parent in the tree — the flat graph, not the tree, is the
/// source of truth for deduplication.
#[must_use]
pub fn compose_flow(graph: &JobGraph, order: &[JobId], args: &MaterializeArgs) -> FlowJob {
    let root = order.last().copied().unwrap_or(JobId(0));
    descend(graph, root, args)
}

fn descend(graph: &JobGraph, id: JobId, args: &MaterializeArgs) -> FlowJob {
    let config = graph.job(id);
    let children = graph
        .deps_of(id)
        .into_iter()
        .map(|dep| descend(graph, dep, args))
        .collect();
    FlowJob {
        name: config.name.clone(),
        queue_name: config.queue.clone(),
        data: args.clone(),
        children,
    }
}
