use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde_json::{Map, Value};
use tracing::Instrument;

use crate::acquire::html::fetch::merge_headers;
use crate::acquire::pacing::USER_AGENTS;
use crate::acquire::{param_to_string, AcquireContext};
use crate::error::AcquireError;
use crate::model::{NormalizedJob, SourceDescriptor};
use crate::telemetry::{self};
use crate::telemetry::ops::dispatch::Phase as DispatchPhase;

pub mod providers;

use providers::{FieldMap, ProviderId, ProviderSpec};

// Probed after the provider's own container key.
const CONTAINER_KEYS: &[&str] = &["jobs", "results", "data"];

/// REST strategy: one bounded GET per source, then per-record mapping.
pub struct ApiFetcher<'a> {
    ctx: &'a AcquireContext,
}

impl<'a> ApiFetcher<'a> {
    pub fn new(ctx: &'a AcquireContext) -> Self { Self { ctx } }

    /// Provider failures are logged at warn level and yield no jobs.
    pub async fn fetch(&self, source: &SourceDescriptor, query: &str, max_results: usize) -> Vec<NormalizedJob> {
        let log = telemetry::dispatch();
        match self.try_fetch(source, query, max_results).await {
            Ok(jobs) => jobs,
            Err(e @ AcquireError::CredentialsMissing(_)) => {
                log.warn_kv(&format!("🔑 Skipping '{}': {e}", source.name), [("source", source.name.clone())]);
                Vec::new()
            }
            Err(e) => {
                log.warn_kv(&format!("⚠️ '{}' request failed: {e}", source.name), [("source", source.name.clone()), ("error", e.to_string())]);
                Vec::new()
            }
        }
    }

    /// Same request, with the failure handed back to the caller.
    pub async fn try_fetch(&self, source: &SourceDescriptor, query: &str, max_results: usize) -> Result<Vec<NormalizedJob>, AcquireError> {
        let provider = ProviderId::select(source);
        let log = telemetry::dispatch();
        let span = log.span_kv(&DispatchPhase::FetchApi, [("provider", provider.as_str().to_string()), ("source", source.name.clone())]);
        self.request(source, provider.spec(), query, max_results).instrument(span).await
    }

    async fn request(&self, source: &SourceDescriptor, spec: &ProviderSpec, query: &str, max_results: usize) -> Result<Vec<NormalizedJob>, AcquireError> {
        let log = telemetry::dispatch();
        let endpoint = resolve_endpoint(source, spec)?;
        let credentials = resolve_credentials(spec, &source.params, |k| std::env::var(k).ok())?;
        let pairs = build_query(spec, &source.params, query, max_results, &credentials);

        let mut headers = HeaderMap::new();
        if spec.browser_headers {
            headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENTS[0]));
            headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        }
        merge_headers(&mut headers, &source.headers);

        log.debug_kv("api request", [("url", endpoint.clone()), ("params", pairs.len().to_string())]);
        let resp = self.ctx.http
            .get(&endpoint)
            .query(&pairs)
            .headers(headers)
            .timeout(self.ctx.config.api_timeout)
            .send()
            .await
            .map_err(AcquireError::from_reqwest)?
            .error_for_status()
            .map_err(AcquireError::from_reqwest)?;
        let body: Value = resp.json().await.map_err(|e| AcquireError::Parse(format!("{endpoint}: {e}")))?;

        let records = job_records(&body, spec);
        log.info(format!("📥 {} returned {} raw record(s)", source.name, records.len()));

        let tag = spec.tag.unwrap_or(source.name.as_str());
        let threshold = self.ctx.config.api_fuzzy_threshold;
        let mut jobs = Vec::new();
        for raw in records.into_iter().take(max_results) {
            match map_record(raw, &spec.fields, tag, |text| self.ctx.skills.extract_with_fallback(text, threshold)) {
                Ok(job) => jobs.push(job),
                Err(e) => log.debug(format!("↩️ skip record: {e}")),
            }
        }
        Ok(jobs)
    }
}

fn resolve_endpoint(source: &SourceDescriptor, spec: &ProviderSpec) -> Result<String, AcquireError> {
    let endpoint = source.endpoint.trim();
    if !endpoint.is_empty() { return Ok(endpoint.to_string()); }
    spec.base_url
        .map(str::to_string)
        .ok_or_else(|| AcquireError::InvalidSource(format!("'{}' has no endpoint", source.name)))
}

/// Each credential from the source params, else the environment.
pub fn resolve_credentials<F>(spec: &ProviderSpec, params: &Map<String, Value>, env: F) -> Result<Vec<(&'static str, String)>, AcquireError>
where
    F: Fn(&str) -> Option<String>,
{
    spec.credentials
        .iter()
        .map(|c| {
            params.get(c.param)
                .and_then(param_to_string)
                .or_else(|| env(c.env))
                .filter(|v| !v.trim().is_empty())
                .map(|v| (c.param, v))
                .ok_or_else(|| AcquireError::CredentialsMissing(format!("{} (param '{}' or env {})", c.param, c.param, c.env)))
        })
        .collect()
}

/// Search and limit keys first, then credentials, then any caller params
/// that do not collide with those.
pub fn build_query(
    spec: &ProviderSpec,
    params: &Map<String, Value>,
    query: &str,
    max_results: usize,
    credentials: &[(&'static str, String)],
) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = spec.search_keys.iter().map(|k| (k.to_string(), query.to_string())).collect();
    pairs.push((spec.limit_key.to_string(), spec.limit_for(max_results).to_string()));
    pairs.extend(credentials.iter().map(|(k, v)| (k.to_string(), v.clone())));

    let reserved: Vec<&str> = spec.reserved_keys().collect();
    for (k, v) in params {
        if reserved.contains(&k.as_str()) { continue; }
        if let Some(v) = param_to_string(v) { pairs.push((k.clone(), v)); }
    }
    pairs
}

/// The provider's container, then the common keys, then a bare array body.
/// Empty arrays fall through to the next candidate.
pub fn job_records<'v>(body: &'v Value, spec: &ProviderSpec) -> Vec<&'v Value> {
    let keys = spec.container_key.into_iter().chain(CONTAINER_KEYS.iter().copied());
    for key in keys {
        if let Some(items) = body.get(key).and_then(Value::as_array) {
            if !items.is_empty() { return items.iter().collect(); }
        }
    }
    body.as_array().map(|a| a.iter().collect()).unwrap_or_default()
}

fn lookup<'v>(record: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.').try_fold(record, |node, key| node.get(key))
}

/// First alias holding a non-empty string (numbers are stringified).
pub fn field(record: &Value, aliases: &[&str]) -> Option<String> {
    aliases.iter().find_map(|path| {
        let v = lookup(record, path)?;
        let s = match v {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        (!s.is_empty()).then_some(s)
    })
}

pub fn map_record<F>(raw: &Value, fields: &FieldMap, tag: &str, extract: F) -> Result<NormalizedJob, AcquireError>
where
    F: Fn(&str) -> crate::model::SkillSet,
{
    if !raw.is_object() { return Err(AcquireError::MalformedRecord(format!("not an object: {raw}"))); }
    let title = field(raw, fields.title).unwrap_or_default();
    let company = field(raw, fields.company);
    let description = field(raw, fields.description);
    let url = field(raw, fields.url);
    if title.trim().is_empty() {
        return NormalizedJob::build(&title, None, None, None, tag, Default::default());
    }
    let skills = extract(&format!("{} {}", title, description.as_deref().unwrap_or("")));
    NormalizedJob::build(&title, company.as_deref(), description.as_deref(), url.as_deref(), tag, skills)
}
