use async_trait::async_trait;
use serde_json::json;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use assetgraph::client::{ApiClient, ApiResponse, ClientError, FetchParams};
use assetgraph::limiter::Credential;

/// Fake API that replays a scripted sequence of status codes, then settles on
/// the final one. Records every credential it was called with.
pub struct ScriptedApi {
    statuses: Mutex<Vec<u16>>,
    pub calls: AtomicUsize,
    pub credentials: Mutex<Vec<String>>,
}

impl ScriptedApi {
    pub fn new(statuses: Vec<u16>) -> Self {
        Self {
            statuses: Mutex::new(statuses),
            calls: AtomicUsize::new(0),
            credentials: Mutex::new(Vec::new()),
        }
    }

    pub fn always_ok() -> Self {
        Self::new(vec![200])
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen_credentials(&self) -> Vec<String> {
        self.credentials.lock().unwrap().clone()
    }
}

#[async_trait]
impl ApiClient for ScriptedApi {
    async fn fetch(
        &self,
        route: &str,
        _params: &FetchParams,
        credential: &Credential,
    ) -> Result<ApiResponse, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.credentials
            .lock()
            .unwrap()
            .push(credential.key().to_string());
        let status = {
            let mut statuses = self.statuses.lock().unwrap();
            if statuses.len() > 1 {
                statuses.remove(0)
            } else {
                *statuses.first().unwrap_or(&200)
            }
        };
        if status == 200 {
            Ok(ApiResponse::ok(json!({ "route": route })))
        } else {
            Ok(ApiResponse::status_only(status))
        }
    }
}
