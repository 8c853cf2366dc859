use serde::{Deserialize, Serialize};

use crate::error::AcquireError;
use crate::model::{NormalizedJob, SourceDescriptor};
use crate::stats::types::BatchStatistics;

// Input shapes
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub max_results: Option<usize>,
    pub sources: Vec<SourceDescriptor>,
}

/// A bare descriptor array or a full request object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SourcesInput {
    List(Vec<SourceDescriptor>),
    Request(DispatchRequest),
}

impl SourcesInput {
    pub fn into_request(self) -> DispatchRequest {
        match self {
            SourcesInput::List(sources) => DispatchRequest { query: None, max_results: None, sources },
            SourcesInput::Request(req) => req,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeRequest {
    pub source: SourceDescriptor,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub max_results: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ProbeInput {
    Request(ProbeRequest),
    Single(SourceDescriptor),
}

// Per-source accounting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus { Ok, Failed, Skipped }

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceReport {
    pub name: String,
    pub kind: String,
    pub status: SourceStatus,
    pub jobs: usize,
    pub elapsed_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SourceReport {
    pub fn ok(source: &SourceDescriptor, jobs: usize, elapsed_ms: u128) -> Self {
        Self { name: source.name.clone(), kind: source.kind.as_str().to_string(), status: SourceStatus::Ok, jobs, elapsed_ms, error: None }
    }

    pub fn failed(source: &SourceDescriptor, err: &AcquireError, elapsed_ms: u128) -> Self {
        Self { name: source.name.clone(), kind: source.kind.as_str().to_string(), status: SourceStatus::Failed, jobs: 0, elapsed_ms, error: Some(err.to_string()) }
    }

    pub fn skipped(source: &SourceDescriptor, reason: &str) -> Self {
        Self { name: source.name.clone(), kind: source.kind.as_str().to_string(), status: SourceStatus::Skipped, jobs: 0, elapsed_ms: 0, error: Some(reason.to_string()) }
    }
}

/// Result of one dispatch: merged jobs plus how each source fared.
#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub jobs: Vec<NormalizedJob>,
    pub sources: Vec<SourceReport>,
}

// Output shapes
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchOutput {
    pub query: String,
    pub total_jobs: usize,
    pub jobs: Vec<NormalizedJob>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<BatchStatistics>,
    pub sources: Vec<SourceReport>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeReport {
    pub success: bool,
    pub source_name: String,
    pub total_fetched: usize,
    pub jobs: Vec<NormalizedJob>,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sources_file_accepts_both_shapes() {
        let list = r#"[{"name": "Remotive", "endpoint": "", "type": "api"}]"#;
        let req = serde_json::from_str::<SourcesInput>(list).unwrap().into_request();
        assert_eq!(req.sources.len(), 1);
        assert!(req.query.is_none());

        let full = r#"{"query": "php", "maxResults": 12, "sources": [{"name": "W", "endpoint": "https://w.test", "type": "html"}]}"#;
        let req = serde_json::from_str::<SourcesInput>(full).unwrap().into_request();
        assert_eq!(req.query.as_deref(), Some("php"));
        assert_eq!(req.max_results, Some(12));
    }

    #[test]
    fn probe_input_accepts_bare_descriptor() {
        let bare = r#"{"name": "Remotive", "type": "api"}"#;
        assert!(matches!(serde_json::from_str::<ProbeInput>(bare).unwrap(), ProbeInput::Single(_)));
        let wrapped = r#"{"source": {"name": "Remotive", "type": "api"}, "maxResults": 3}"#;
        match serde_json::from_str::<ProbeInput>(wrapped).unwrap() {
            ProbeInput::Request(r) => assert_eq!(r.max_results, Some(3)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn probe_report_wire_names() {
        let r = ProbeReport { success: false, source_name: "X".into(), total_fetched: 0, jobs: vec![], message: "m".into() };
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["sourceName"], "X");
        assert_eq!(v["totalFetched"], 0);
    }
}
