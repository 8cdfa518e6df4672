//! Job graph construction, topological ordering, and flow composition.
//!
//! The pipeline runs `Asset → JobGraph → topological order → FlowJob tree`:
//! the builder walks a root asset's transitive dependencies into a flat job
//! list plus edges (a DAG walk — shared dependencies collapse into one job),
//! the sorter orders jobs so every dependency precedes its dependents and
//! fails on cycles, and the composer nests the result into the parent/child
//! descriptor an external queue runtime consumes.

mod builder;
mod flow;
mod topo;

pub use builder::{JobConfig, JobEdge, JobGraph};
pub use flow::{FlowJob, compose_flow};
pub use topo::topological_sort;

use miette::Diagnostic;
use thiserror::Error;

/// Graph-construction failures. These abort the entire materialization
/// request before any job dispatch and propagate to the invoking caller
/// directly — unlike job-level failures, which are captured as results.
#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    /// A back-edge was found during ordering: the asset registry declares a
    /// dependency cycle.
    #[error("dependency cycle detected at asset '{asset}'")]
    #[diagnostic(
        code(assetgraph::graphs::cycle),
        help("Asset deps must form a DAG; check the registry for mutual or self references.")
    )]
    CycleDetected { asset: String },

    /// A job names an asset the registry does not know.
    #[error("unknown asset: {name}")]
    #[diagnostic(
        code(assetgraph::graphs::unknown_asset),
        help("Register the asset before materializing anything that depends on it.")
    )]
    UnknownAsset { name: String },
}
