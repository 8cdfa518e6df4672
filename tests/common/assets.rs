use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use assetgraph::asset::{Asset, AssetContext, AssetError};
use assetgraph::types::{DepsData, MaterializeArgs};

/// Scripted asset whose validity flag flips to true after a successful
/// create, matching the real lifecycle: first run creates, reruns read.
pub struct ScriptedAsset {
    name: &'static str,
    queue: &'static str,
    deps: Vec<Arc<dyn Asset>>,
    valid: AtomicBool,
    pub reads: AtomicUsize,
    pub creates: AtomicUsize,
    fail_create: AtomicBool,
}

impl ScriptedAsset {
    pub fn new(name: &'static str, deps: Vec<Arc<dyn Asset>>) -> Arc<Self> {
        Arc::new(Self {
            name,
            queue: "assets",
            deps,
            valid: AtomicBool::new(false),
            reads: AtomicUsize::new(0),
            creates: AtomicUsize::new(0),
            fail_create: AtomicBool::new(false),
        })
    }

    /// Start out already valid: policy passes, create never runs.
    pub fn valid(name: &'static str, deps: Vec<Arc<dyn Asset>>) -> Arc<Self> {
        let asset = Self::new(name, deps);
        asset.valid.store(true, Ordering::SeqCst);
        asset
    }

    /// Make every create attempt fail.
    pub fn failing(name: &'static str, deps: Vec<Arc<dyn Asset>>) -> Arc<Self> {
        let asset = Self::new(name, deps);
        asset.fail_create.store(true, Ordering::SeqCst);
        asset
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Asset for ScriptedAsset {
    fn name(&self) -> &str {
        self.name
    }

    fn queue(&self) -> &str {
        self.queue
    }

    fn deps(&self) -> Vec<Arc<dyn Asset>> {
        self.deps.clone()
    }

    async fn policy(&self, _: &MaterializeArgs, _: &DepsData) -> Result<bool, AssetError> {
        Ok(self.valid.load(Ordering::SeqCst))
    }

    async fn read(&self, _: &MaterializeArgs) -> Result<serde_json::Value, AssetError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(json!({ "asset": self.name }))
    }

    async fn create(
        &self,
        ctx: &AssetContext,
        _: &MaterializeArgs,
        _: &DepsData,
    ) -> Result<(), AssetError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(AssetError::Provider {
                provider: "congress",
                message: "scripted failure".to_string(),
            });
        }
        let _ = ctx.emit_progress(json!({ "asset": self.name, "items": 1 }));
        self.valid.store(true, Ordering::SeqCst);
        Ok(())
    }
}
