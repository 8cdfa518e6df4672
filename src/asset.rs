//! Asset descriptors and the per-job execution context.
//!
//! An [`Asset`] is a declarative description of one named, cacheable
//! artifact: how to check whether cached data is still valid, how to read it,
//! how to create it from dependency data, and how to introspect its progress
//! metadata. No control flow lives here — the engine decides when each piece
//! runs.

use async_trait::async_trait;
use miette::Diagnostic;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::client::ClientError;
use crate::event_bus::Event;
use crate::limiter::LimiterError;
use crate::storage::StorageError;
use crate::types::{DEFAULT_QUEUE, DepsData, JobId, MaterializeArgs};

/// A named, cacheable derived artifact with a validity policy and a creation
/// routine.
///
/// # Contract
///
/// - [`name`](Self::name) must be unique within a registry; it is the asset's
///   identity during graph construction, so two assets with the same name
///   collapse into one job.
/// - [`deps`](Self::deps) must not contain cycles transitively. The engine
///   detects cycles rather than assuming their absence, but a cyclic registry
///   is a configuration bug and aborts the whole materialization.
/// - [`create`](Self::create) must be safe to re-run after partial failure:
///   on re-entry it recomputes which sub-items are still missing from
///   persisted metadata instead of assuming a clean slate.
///
/// # Examples
///
/// ```
/// use assetgraph::asset::{Asset, AssetContext, AssetError};
/// use assetgraph::types::{DepsData, MaterializeArgs};
/// use async_trait::async_trait;
///
/// struct MembersCount;
///
/// #[async_trait]
/// impl Asset for MembersCount {
///     fn name(&self) -> &str {
///         "members_count"
///     }
///
///     async fn policy(&self, _: &MaterializeArgs, _: &DepsData) -> Result<bool, AssetError> {
///         // Cached count never goes stale in this toy example.
///         Ok(true)
///     }
///
///     async fn read(&self, _: &MaterializeArgs) -> Result<serde_json::Value, AssetError> {
///         Ok(serde_json::json!(535))
///     }
/// }
/// ```
#[async_trait]
pub trait Asset: Send + Sync {
    /// Unique identifier within the registry.
    fn name(&self) -> &str;

    /// Logical execution lane for jobs of this asset.
    fn queue(&self) -> &str {
        DEFAULT_QUEUE
    }

    /// Direct dependencies, in declaration order. Dependencies form the edges
    /// of the job graph; shared dependencies are deduplicated during the
    /// graph walk.
    fn deps(&self) -> Vec<Arc<dyn Asset>> {
        Vec::new()
    }

    /// Returns `true` when cached data is still valid and no (re)creation is
    /// needed, judged against the outputs of this asset's dependencies.
    async fn policy(&self, args: &MaterializeArgs, deps_data: &DepsData)
    -> Result<bool, AssetError>;

    /// Load the artifact, assuming it exists and is valid.
    async fn read(&self, args: &MaterializeArgs) -> Result<Value, AssetError>;

    /// Produce and persist the artifact from dependency data, emitting
    /// progress events through `ctx` as it goes.
    ///
    /// The default is a no-op for assets whose policy never fails over to
    /// creation (e.g. static lookups).
    async fn create(
        &self,
        ctx: &AssetContext,
        args: &MaterializeArgs,
        deps_data: &DepsData,
    ) -> Result<(), AssetError> {
        let _ = (ctx, args, deps_data);
        Ok(())
    }

    /// Cache-introspection state (page statuses, missing-item lists) persisted
    /// alongside the artifact, independent of the full data.
    async fn read_metadata(&self, args: &MaterializeArgs) -> Result<Option<Value>, AssetError> {
        let _ = args;
        Ok(None)
    }
}

/// Execution context passed to an asset's `create` routine.
///
/// Carries the job identity and a handle to the run's event channel so long
/// creation loops can report progress (fire-and-forget).
#[derive(Clone, Debug)]
pub struct AssetContext {
    /// Name of the asset being materialized.
    pub asset: String,
    /// Job id within the current graph.
    pub job: JobId,
    /// Channel for emitting events to the run's event bus.
    pub event_sender: flume::Sender<Event>,
}

impl AssetContext {
    pub fn new(asset: impl Into<String>, job: JobId, event_sender: flume::Sender<Event>) -> Self {
        Self {
            asset: asset.into(),
            job,
            event_sender,
        }
    }

    /// Emit a job-scoped message enriched with this context's metadata.
    pub fn emit(
        &self,
        scope: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<(), AssetContextError> {
        self.event_sender
            .send(Event::job_message_with_meta(
                self.asset.clone(),
                self.job,
                scope,
                message,
            ))
            .map_err(|_| AssetContextError::EventBusUnavailable)
    }

    /// Emit a structured progress payload (page counters, missing-item
    /// tallies) for UI consumption.
    pub fn emit_progress(&self, payload: Value) -> Result<(), AssetContextError> {
        self.event_sender
            .send(Event::job_progress(self.asset.clone(), self.job, payload))
            .map_err(|_| AssetContextError::EventBusUnavailable)
    }
}

/// Errors that can occur when using AssetContext methods.
#[derive(Debug, Error, Diagnostic)]
pub enum AssetContextError {
    /// Event could not be sent due to event bus disconnection.
    #[error("failed to emit event: event bus unavailable")]
    #[diagnostic(
        code(assetgraph::asset::event_bus_unavailable),
        help("The event bus may be disconnected. Progress events are optional; this is non-fatal.")
    )]
    EventBusUnavailable,
}

/// Errors raised by asset lifecycle methods.
///
/// Every variant is fatal for the job it occurs in; the executor converts it
/// into a structured failure result at the job boundary instead of letting it
/// cross the worker.
#[derive(Debug, Error, Diagnostic)]
pub enum AssetError {
    /// A fetched payload does not match the expected shape. Never silently
    /// coerced.
    #[error("validation failed: {0}")]
    #[diagnostic(
        code(assetgraph::asset::validation),
        help("Check the fetched payload shape against the asset's parser.")
    )]
    ValidationFailed(String),

    /// Expected dependency output is missing.
    #[error("missing expected dependency data: {what}")]
    #[diagnostic(
        code(assetgraph::asset::missing_dep),
        help("Check that the dependency asset produced the required data.")
    )]
    MissingDep { what: &'static str },

    /// External provider or service error.
    #[error("provider error ({provider}): {message}")]
    #[diagnostic(code(assetgraph::asset::provider))]
    Provider {
        provider: &'static str,
        message: String,
    },

    /// JSON serialization/deserialization error.
    #[error(transparent)]
    #[diagnostic(code(assetgraph::asset::serde_json))]
    Serde(#[from] serde_json::Error),

    /// Cache or metadata storage failure.
    #[error(transparent)]
    #[diagnostic(code(assetgraph::asset::storage))]
    Storage(#[from] StorageError),

    /// Transport failure below the throttled fetch client.
    #[error(transparent)]
    #[diagnostic(code(assetgraph::asset::client))]
    Client(#[from] ClientError),

    /// Rate limiter misconfiguration surfaced during a fetch.
    #[error(transparent)]
    #[diagnostic(code(assetgraph::asset::limiter))]
    Limiter(#[from] LimiterError),

    /// Event bus communication error.
    #[error("event bus error: {0}")]
    #[diagnostic(code(assetgraph::asset::event_bus))]
    EventBus(#[from] AssetContextError),
}
