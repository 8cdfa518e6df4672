use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::types::JobId;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum Event {
    Job(JobEvent),
    Diagnostic(DiagnosticEvent),
}

impl Event {
    pub fn job_message(scope: impl Into<String>, message: impl Into<String>) -> Self {
        Event::Job(JobEvent::new(None, None, scope.into(), message.into(), None))
    }

    pub fn job_message_with_meta(
        asset: impl Into<String>,
        job: JobId,
        scope: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Event::Job(JobEvent::new(
            Some(asset.into()),
            Some(job),
            scope.into(),
            message.into(),
            None,
        ))
    }

    /// Structured progress payload from inside an asset's `create` loop,
    /// e.g. page counters or missing-item tallies.
    pub fn job_progress(asset: impl Into<String>, job: JobId, payload: Value) -> Self {
        Event::Job(JobEvent::new(
            Some(asset.into()),
            Some(job),
            "progress".to_string(),
            String::new(),
            Some(payload),
        ))
    }

    pub fn diagnostic(scope: impl Into<String>, message: impl Into<String>) -> Self {
        Event::Diagnostic(DiagnosticEvent {
            scope: scope.into(),
            message: message.into(),
        })
    }

    pub fn scope_label(&self) -> &str {
        match self {
            Event::Job(job) => job.scope(),
            Event::Diagnostic(diag) => diag.scope(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Event::Job(job) => job.message(),
            Event::Diagnostic(diag) => diag.message(),
        }
    }

    /// Normalized JSON form consumed by external observers.
    pub fn to_json_value(&self) -> Value {
        let (event_type, metadata) = match self {
            Event::Job(job) => {
                let mut meta = serde_json::Map::new();
                if let Some(asset) = job.asset() {
                    meta.insert("asset".to_string(), json!(asset));
                }
                if let Some(id) = job.job() {
                    meta.insert("job".to_string(), json!(id.0));
                }
                if let Some(payload) = job.payload() {
                    meta.insert("payload".to_string(), payload.clone());
                }
                ("job", Value::Object(meta))
            }
            Event::Diagnostic(_) => ("diagnostic", Value::Object(serde_json::Map::new())),
        };

        json!({
            "type": event_type,
            "scope": self.scope_label(),
            "message": self.message(),
            "timestamp": Utc::now().to_rfc3339(),
            "metadata": metadata,
        })
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Job(job) => match (job.asset(), job.job()) {
                (Some(asset), Some(id)) => write!(f, "[{asset}{id}] {}", job.describe()),
                (Some(asset), None) => write!(f, "[{asset}] {}", job.describe()),
                _ => write!(f, "{}", job.describe()),
            },
            Event::Diagnostic(diag) => write!(f, "{}", diag.message()),
        }
    }
}

/// Event scoped to one materialization job.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct JobEvent {
    asset: Option<String>,
    job: Option<JobId>,
    scope: String,
    message: String,
    payload: Option<Value>,
}

impl JobEvent {
    pub fn new(
        asset: Option<String>,
        job: Option<JobId>,
        scope: String,
        message: String,
        payload: Option<Value>,
    ) -> Self {
        Self {
            asset,
            job,
            scope,
            message,
            payload,
        }
    }

    pub fn asset(&self) -> Option<&str> {
        self.asset.as_deref()
    }

    pub fn job(&self) -> Option<JobId> {
        self.job
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    fn describe(&self) -> String {
        match &self.payload {
            Some(payload) if self.message.is_empty() => payload.to_string(),
            Some(payload) => format!("{} {payload}", self.message),
            None => self.message.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DiagnosticEvent {
    scope: String,
    message: String,
}

impl DiagnosticEvent {
    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
