//! Per-job materialization state machine.
//!
//! One job runs one asset through a fixed sequence: read dependency outputs,
//! evaluate the asset's policy against them, then either read the existing
//! cache (`DONE(read)`) or run the creation routine (`DONE(created)`).
//! Whatever goes wrong inside that sequence is caught at the job boundary
//! and converted into a structured failure result — the surrounding queue
//! infrastructure observes failure through the return value, never through
//! an exception crossing the worker.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::asset::{Asset, AssetContext, AssetError};
use crate::types::{DepsData, MaterializeArgs};

/// Terminal outcome of a successful job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobOutcome {
    /// The policy accepted cached data; the artifact was read as-is.
    Read,
    /// The policy rejected cached data; the creation routine ran.
    Created,
}

impl std::fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobOutcome::Read => write!(f, "read"),
            JobOutcome::Created => write!(f, "created"),
        }
    }
}

/// Structured failure result returned across the worker boundary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFailure {
    /// Fixed marker consumed by queue observers.
    pub message: String,
    /// The underlying error rendered for the job's result record.
    pub data: String,
}

impl JobFailure {
    fn from_error(error: &AssetError) -> Self {
        Self {
            message: "Asset failed".to_string(),
            data: error.to_string(),
        }
    }
}

/// What one worker hands back to the queue for one job.
pub type JobResult = Result<JobOutcome, JobFailure>;

/// Run one job to a terminal outcome.
///
/// Dependency reads, policy evaluation, cache read, and creation all happen
/// inside the captured section; any [`AssetError`] becomes a [`JobFailure`]
/// instead of propagating. Progress events emitted through `ctx` during
/// `create` are fire-and-forget and play no part in the outcome.
pub async fn run_job(
    asset: &Arc<dyn Asset>,
    args: &MaterializeArgs,
    ctx: &AssetContext,
) -> JobResult {
    match materialize(asset, args, ctx).await {
        Ok(outcome) => {
            tracing::debug!(asset = asset.name(), %outcome, "job done");
            Ok(outcome)
        }
        Err(error) => {
            tracing::warn!(asset = asset.name(), error = %error, "job failed");
            Err(JobFailure::from_error(&error))
        }
    }
}

async fn materialize(
    asset: &Arc<dyn Asset>,
    args: &MaterializeArgs,
    ctx: &AssetContext,
) -> Result<JobOutcome, AssetError> {
    let mut deps_data = DepsData::default();
    for dep in asset.deps() {
        let value = dep.read(args).await?;
        deps_data.insert(dep.name().to_string(), value);
    }

    if asset.policy(args, &deps_data).await? {
        asset.read(args).await?;
        Ok(JobOutcome::Read)
    } else {
        asset.create(ctx, args, &deps_data).await?;
        Ok(JobOutcome::Created)
    }
}
