//! In-process execution of a job graph with bounded concurrency.
//!
//! [`FlowRunner`] is the local stand-in for the external queue/worker
//! runtime: it draws ready jobs from a shared work list, runs up to
//! `concurrency` of them at once, and never dispatches a job before every
//! job it depends on has completed. Dependents of a failed job are reported
//! as skipped rather than run against missing inputs.
//!
//! No particular concurrency level is load-bearing; the bound is a knob.
//! Request cadence is enforced by the rate limiter inside asset fetch paths,
//! not by this pool, so any bound here remains correct by construction.

use miette::Diagnostic;
use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::{JoinError, JoinSet};
use tracing::instrument;
use uuid::Uuid;

use crate::asset::{Asset, AssetContext};
use crate::event_bus::{Event, EventBus};
use crate::executor::{JobFailure, JobOutcome, JobResult, run_job};
use crate::graphs::{FlowJob, GraphError, JobGraph, compose_flow, topological_sort};
use crate::registry::AssetRegistry;
use crate::types::{JobId, MaterializeArgs};

/// Default worker-pool bound. Tunable; nothing in the engine depends on it.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Errors that abort a materialization before or during dispatch.
#[derive(Debug, Error, Diagnostic)]
pub enum RunnerError {
    /// Cycle or unknown asset found while constructing the graph. Nothing
    /// was dispatched.
    #[error(transparent)]
    #[diagnostic(code(assetgraph::runner::graph))]
    Graph(#[from] GraphError),

    /// A worker task panicked or was aborted.
    #[error("worker task join error: {0}")]
    #[diagnostic(code(assetgraph::runner::join))]
    Join(#[from] JoinError),
}

/// Terminal state of one job within a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobStatus {
    /// Finished with a terminal outcome.
    Done(JobOutcome),
    /// Captured a structured failure.
    Failed(JobFailure),
    /// Never dispatched because an upstream dependency failed.
    Skipped,
}

/// Per-job result record in a [`MaterializeReport`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobRecord {
    pub job: JobId,
    pub asset: String,
    pub status: JobStatus,
}

/// Result of one materialization run.
#[derive(Clone, Debug)]
pub struct MaterializeReport {
    /// Unique id of this run, stamped into lifecycle events.
    pub run_id: String,
    /// Root asset name.
    pub root: String,
    /// Topological order the run followed.
    pub order: Vec<JobId>,
    /// Records in job-id order.
    pub jobs: Vec<JobRecord>,
}

impl MaterializeReport {
    /// Whether every job finished with a terminal outcome.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.jobs
            .iter()
            .all(|record| matches!(record.status, JobStatus::Done(_)))
    }

    /// Status of the job materializing `asset`, if it was part of the run.
    #[must_use]
    pub fn status_of(&self, asset: &str) -> Option<&JobStatus> {
        self.jobs
            .iter()
            .find(|record| record.asset == asset)
            .map(|record| &record.status)
    }
}

/// Bounded-concurrency worker pool over one asset registry.
///
/// Every asset reachable from a materialized root must be registered, since
/// jobs carry names and workers resolve them through the registry — the same
/// contract an external queue worker would follow.
pub struct FlowRunner {
    registry: Arc<AssetRegistry>,
    event_bus: EventBus,
    concurrency: usize,
}

impl FlowRunner {
    #[must_use]
    pub fn new(registry: Arc<AssetRegistry>) -> Self {
        Self {
            registry,
            event_bus: EventBus::default(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Replace the default stdout event bus, e.g. with channel sinks for a
    /// progress UI.
    #[must_use]
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = event_bus;
        self
    }

    /// Bound on concurrently running jobs. Clamped to at least 1.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Build the flow descriptor for `root` without executing anything —
    /// the handoff shape for an external queue runtime.
    pub fn compose(&self, root: &str, args: &MaterializeArgs) -> Result<FlowJob, RunnerError> {
        let asset = self.registry.get(root)?;
        let graph = JobGraph::build(asset, args);
        let order = topological_sort(&graph)?;
        Ok(compose_flow(&graph, &order, args))
    }

    /// Materialize `root` and everything it transitively depends on.
    ///
    /// Graph-construction failures (cycles, unknown assets) abort before any
    /// job is dispatched. Job-level failures are captured in the report;
    /// their dependents are skipped, independent branches keep running.
    #[instrument(skip(self, args))]
    pub async fn materialize(
        &self,
        root: &str,
        args: &MaterializeArgs,
    ) -> Result<MaterializeReport, RunnerError> {
        let root_asset = self.registry.get(root)?;
        let graph = JobGraph::build(root_asset, args);
        let order = topological_sort(&graph)?;

        // Resolve every job up front so an unregistered dependency aborts
        // before dispatch, not mid-run.
        let assets: Vec<Arc<dyn Asset>> = graph
            .jobs
            .iter()
            .map(|job| self.registry.get(&job.name))
            .collect::<Result<_, _>>()?;

        let run_id = Uuid::new_v4().to_string();
        self.event_bus.listen();
        let sender = self.event_bus.sender();
        let _ = sender.send(Event::diagnostic(
            "run",
            format!("run {run_id}: materializing '{root}' ({} jobs)", graph.jobs.len()),
        ));

        let n = graph.jobs.len();
        let mut remaining = vec![0usize; n];
        let mut dependents: Vec<Vec<JobId>> = vec![Vec::new(); n];
        for edge in &graph.dependencies {
            remaining[edge.job.index()] += 1;
            dependents[edge.depends_on.index()].push(edge.job);
        }

        let mut statuses: Vec<Option<JobStatus>> = vec![None; n];
        let mut ready: VecDeque<JobId> = order
            .iter()
            .copied()
            .filter(|id| remaining[id.index()] == 0)
            .collect();
        let mut pool: JoinSet<(JobId, JobResult)> = JoinSet::new();
        let mut active = 0usize;

        loop {
            while active < self.concurrency {
                let Some(id) = ready.pop_front() else { break };
                let asset = assets[id.index()].clone();
                let job_args = graph.job(id).args.clone();
                let ctx = AssetContext::new(asset.name(), id, sender.clone());
                let _ = ctx.emit("job", "started");
                pool.spawn(async move {
                    let result = run_job(&asset, &job_args, &ctx).await;
                    (id, result)
                });
                active += 1;
            }

            if active == 0 {
                break;
            }
            let Some(joined) = pool.join_next().await else {
                break;
            };
            let (id, result) = joined?;
            active -= 1;

            let name = graph.job(id).name.clone();
            match result {
                Ok(outcome) => {
                    let _ = sender.send(Event::job_message_with_meta(
                        name,
                        id,
                        "job",
                        format!("done ({outcome})"),
                    ));
                    statuses[id.index()] = Some(JobStatus::Done(outcome));
                    // A dependent becomes ready only once all of its
                    // dependencies completed successfully.
                    for dependent in &dependents[id.index()] {
                        remaining[dependent.index()] -= 1;
                        if remaining[dependent.index()] == 0 {
                            ready.push_back(*dependent);
                        }
                    }
                }
                Err(failure) => {
                    let _ = sender.send(Event::job_message_with_meta(
                        name,
                        id,
                        "job",
                        format!("failed: {}", failure.data),
                    ));
                    statuses[id.index()] = Some(JobStatus::Failed(failure));
                }
            }
        }

        let jobs = graph
            .jobs
            .iter()
            .map(|job| JobRecord {
                job: job.id,
                asset: job.name.clone(),
                status: statuses[job.id.index()]
                    .take()
                    .unwrap_or(JobStatus::Skipped),
            })
            .collect();

        Ok(MaterializeReport {
            run_id,
            root: root.to_string(),
            order,
            jobs,
        })
    }
}
