//! Process-wide asset registry.
//!
//! The registry of all assets is static configuration: built once at
//! startup, read-only thereafter. Jobs carry asset *names*; workers resolve
//! them back to implementations here.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::asset::Asset;
use crate::graphs::GraphError;

/// Name-keyed lookup of asset implementations.
///
/// # Examples
///
/// ```
/// use assetgraph::registry::AssetRegistry;
/// # use assetgraph::asset::{Asset, AssetError};
/// # use assetgraph::types::{DepsData, MaterializeArgs};
/// # use async_trait::async_trait;
/// # use std::sync::Arc;
/// # struct MembersCount;
/// # #[async_trait]
/// # impl Asset for MembersCount {
/// #     fn name(&self) -> &str { "members_count" }
/// #     async fn policy(&self, _: &MaterializeArgs, _: &DepsData) -> Result<bool, AssetError> {
/// #         Ok(true)
/// #     }
/// #     async fn read(&self, _: &MaterializeArgs) -> Result<serde_json::Value, AssetError> {
/// #         Ok(serde_json::json!(535))
/// #     }
/// # }
///
/// let registry = AssetRegistry::new().register(Arc::new(MembersCount));
/// assert!(registry.get("members_count").is_ok());
/// assert!(registry.get("bills").is_err());
/// ```
#[derive(Default)]
pub struct AssetRegistry {
    assets: FxHashMap<String, Arc<dyn Asset>>,
}

impl AssetRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an asset under its own name. Re-registering a name replaces
    /// the previous entry with a warning; two live assets must never share a
    /// name, since names are job identity during graph walks.
    #[must_use]
    pub fn register(mut self, asset: Arc<dyn Asset>) -> Self {
        let name = asset.name().to_string();
        if self.assets.insert(name.clone(), asset).is_some() {
            tracing::warn!(asset = %name, "replacing previously registered asset");
        }
        self
    }

    /// Resolve an asset by name.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownAsset`] — a graph-construction failure that
    /// aborts the request before any dispatch.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Asset>, GraphError> {
        self.assets
            .get(name)
            .cloned()
            .ok_or_else(|| GraphError::UnknownAsset {
                name: name.to_string(),
            })
    }

    /// Registered asset names, unordered.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.assets.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}
