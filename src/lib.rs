//! # Assetgraph: Incremental Asset Materialization Engine
//!
//! Assetgraph materializes derived data artifacts ("assets") fetched from a
//! rate-limited external API. Each asset declares its dependencies, a validity
//! policy over cached data, and a creation routine; the engine builds a job
//! graph from the declarations, orders it topologically, and executes it so
//! that every artifact is fetched exactly when needed — never redundantly,
//! never out of dependency order.
//!
//! ## Core Concepts
//!
//! - **Assets**: Declarative descriptors of cacheable artifacts with a
//!   `policy`/`read`/`create` lifecycle
//! - **Job Graph**: Flat job list plus dependency edges built from one root
//!   asset's transitive dependencies (a DAG — shared dependencies are
//!   deduplicated into a single job)
//! - **Topological Sort**: Cycle-safe ordering so every dependency precedes
//!   its dependents
//! - **Flow**: Nested parent/child execution descriptor consumable by an
//!   external queue runtime
//! - **Rate Limiter**: Round-robin credential rotation with a globally shared
//!   minimum spacing between outbound requests
//!
//! ## Quick Start
//!
//! ```
//! use assetgraph::graphs::{JobGraph, topological_sort};
//! use assetgraph::types::JobId;
//! # use assetgraph::asset::{Asset, AssetError};
//! # use assetgraph::types::{DepsData, MaterializeArgs};
//! # use async_trait::async_trait;
//! # use std::sync::Arc;
//! # struct Leaf;
//! # #[async_trait]
//! # impl Asset for Leaf {
//! #     fn name(&self) -> &str { "members_count" }
//! #     async fn policy(&self, _: &MaterializeArgs, _: &DepsData) -> Result<bool, AssetError> {
//! #         Ok(true)
//! #     }
//! #     async fn read(&self, _: &MaterializeArgs) -> Result<serde_json::Value, AssetError> {
//! #         Ok(serde_json::json!(1))
//! #     }
//! # }
//!
//! let root: Arc<dyn Asset> = Arc::new(Leaf);
//! let graph = JobGraph::build(root, &vec!["house".to_string()]);
//! assert_eq!(graph.jobs.len(), 1);
//! assert!(graph.dependencies.is_empty());
//!
//! let order = topological_sort(&graph).unwrap();
//! assert_eq!(order, vec![JobId(0)]);
//! ```
//!
//! ## Module Guide
//!
//! - [`asset`] - The [`Asset`](asset::Asset) trait and per-job context
//! - [`registry`] - Process-wide asset lookup by name
//! - [`graphs`] - Job graph construction, topological sort, flow composition
//! - [`executor`] - Per-job materialization state machine
//! - [`runner`] - Bounded-concurrency in-process execution of a job graph
//! - [`limiter`] - Credential rotation and global request spacing
//! - [`client`] - Throttled fetch wrapper with backoff-and-retry
//! - [`storage`] - Cache and metadata storage substrate
//! - [`meta`] - Shallow-merge metadata contract
//! - [`event_bus`] - Progress event broadcasting to pluggable sinks

pub mod asset;
pub mod client;
pub mod event_bus;
pub mod executor;
pub mod graphs;
pub mod limiter;
pub mod meta;
pub mod registry;
pub mod runner;
pub mod storage;
pub mod types;
