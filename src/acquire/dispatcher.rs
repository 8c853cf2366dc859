use futures::StreamExt;
use tokio::time::Instant;
use tracing::Instrument;

use crate::error::AcquireError;
use crate::model::{NormalizedJob, SourceDescriptor, SourceKind};
use crate::telemetry::{self};
use crate::telemetry::ops::dispatch::Phase as DispatchPhase;

use super::api::ApiFetcher;
use super::html::HtmlScraper;
use super::types::{DispatchReport, SourceReport};
use super::AcquireContext;

/// Routes each descriptor to its strategy and merges what comes back.
///
/// Sources are attempted in list order on an ordered pool of
/// `concurrency` slots (one by default). A source that fails, for any
/// reason, contributes nothing and the batch carries on.
pub struct SourceDispatcher<'a> {
    ctx: &'a AcquireContext,
    concurrency: usize,
}

impl<'a> SourceDispatcher<'a> {
    pub fn new(ctx: &'a AcquireContext) -> Self {
        Self { ctx, concurrency: ctx.config.concurrency.max(1) }
    }

    pub fn with_concurrency(mut self, n: usize) -> Self { self.concurrency = n.max(1); self }

    pub async fn dispatch(&self, sources: &[SourceDescriptor], query: &str, max_results: usize) -> Vec<NormalizedJob> {
        self.dispatch_report(sources, query, max_results).await.jobs
    }

    pub async fn dispatch_report(&self, sources: &[SourceDescriptor], query: &str, max_results: usize) -> DispatchReport {
        let log = telemetry::dispatch();
        let deadline = Instant::now() + self.ctx.config.dispatch_deadline;
        let mut reports: Vec<SourceReport> = Vec::with_capacity(sources.len());
        let mut jobs: Vec<NormalizedJob> = Vec::new();

        if max_results > 0 {
            let mut attempts = futures::stream::iter(sources.iter().map(|s| self.attempt(s, query, max_results, deadline)))
                .buffered(self.concurrency);
            while let Some((report, found)) = attempts.next().await {
                log.source_summary(&report);
                jobs.extend(found);
                reports.push(report);
                if jobs.len() >= max_results { break; }
            }
        }

        if reports.len() < sources.len() {
            log.info(format!("✋ Result cap of {} reached; skipping {} source(s)", max_results, sources.len() - reports.len()));
            for source in &sources[reports.len()..] {
                let report = SourceReport::skipped(source, "result cap reached");
                log.source_summary(&report);
                reports.push(report);
            }
        }

        jobs.truncate(max_results);
        log.totals(&reports, jobs.len());
        DispatchReport { jobs, sources: reports }
    }

    async fn attempt(&self, source: &SourceDescriptor, query: &str, max_results: usize, deadline: Instant) -> (SourceReport, Vec<NormalizedJob>) {
        let log = telemetry::dispatch();
        if Instant::now() >= deadline {
            return (SourceReport::skipped(source, "dispatch deadline passed"), Vec::new());
        }
        let span = log.span_kv(&DispatchPhase::Source, [("source", source.name.clone()), ("kind", source.kind.as_str().to_string())]);
        let started = Instant::now();
        let result = tokio::time::timeout_at(deadline, self.fetch_source(source, query, max_results))
            .instrument(span)
            .await
            .unwrap_or(Err(AcquireError::Timeout(self.ctx.config.dispatch_deadline)));
        let elapsed = started.elapsed().as_millis();

        match result {
            Ok(found) => (SourceReport::ok(source, found.len(), elapsed), found),
            Err(e) => {
                log.error_kv(&format!("❌ Source '{}' failed: {e}", source.name), [("source", source.name.clone()), ("error", e.to_string())]);
                (SourceReport::failed(source, &e, elapsed), Vec::new())
            }
        }
    }

    /// One source through its strategy. API providers log their own
    /// failures and come back empty.
    async fn fetch_source(&self, source: &SourceDescriptor, query: &str, max_results: usize) -> Result<Vec<NormalizedJob>, AcquireError> {
        match &source.kind {
            SourceKind::Api => Ok(ApiFetcher::new(self.ctx).fetch(source, query, max_results).await),
            SourceKind::Html => HtmlScraper::new(self.ctx).scrape(source, query, max_results).await,
            SourceKind::Unknown(kind) => Err(AcquireError::UnknownKind(kind.clone())),
        }
    }

    /// Same routing, with provider errors handed back instead of logged.
    pub async fn try_source(&self, source: &SourceDescriptor, query: &str, max_results: usize) -> Result<Vec<NormalizedJob>, AcquireError> {
        match &source.kind {
            SourceKind::Api => ApiFetcher::new(self.ctx).try_fetch(source, query, max_results).await,
            _ => self.fetch_source(source, query, max_results).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::test_context;
    use crate::acquire::types::SourceStatus;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source(name: &str, kind: &str, endpoint: String) -> SourceDescriptor {
        serde_json::from_value(json!({"name": name, "type": kind, "endpoint": endpoint})).unwrap()
    }

    fn remotive_body(n: usize, prefix: &str) -> serde_json::Value {
        let jobs: Vec<_> = (0..n).map(|i| json!({"title": format!("{prefix} {i}"), "company_name": "Co"})).collect();
        json!({"jobs": jobs})
    }

    async fn mount(server: &MockServer, route: &str, resp: ResponseTemplate, expect: u64) {
        Mock::given(method("GET")).and(path(route)).respond_with(resp).expect(expect).mount(server).await;
    }

    #[tokio::test]
    async fn failing_source_does_not_affect_others() {
        let server = MockServer::start().await;
        mount(&server, "/a", ResponseTemplate::new(200).set_body_json(remotive_body(2, "A")), 1).await;
        mount(&server, "/down", ResponseTemplate::new(503), 1).await;
        mount(&server, "/b", ResponseTemplate::new(200).set_body_json(remotive_body(2, "B")), 1).await;

        let sources = vec![
            source("remotive-a", "api", format!("{}/a", server.uri())),
            source("remotive-down", "api", format!("{}/down", server.uri())),
            source("feed", "rss", "https://x.test/rss".into()),
            source("remotive-b", "api", format!("{}/b", server.uri())),
        ];
        let ctx = test_context();
        let report = SourceDispatcher::new(&ctx).dispatch_report(&sources, "dev", 50).await;

        let titles: Vec<&str> = report.jobs.iter().map(|j| j.title.as_str()).collect();
        assert_eq!(titles, vec!["A 0", "A 1", "B 0", "B 1"]);
        let statuses: Vec<SourceStatus> = report.sources.iter().map(|r| r.status).collect();
        assert_eq!(statuses, vec![SourceStatus::Ok, SourceStatus::Ok, SourceStatus::Failed, SourceStatus::Ok]);
        assert_eq!(report.sources[1].jobs, 0);
        assert!(report.sources[2].error.as_deref().unwrap().contains("unknown source type 'rss'"));
    }

    #[tokio::test]
    async fn result_cap_truncates_and_skips_remaining() {
        let server = MockServer::start().await;
        mount(&server, "/a", ResponseTemplate::new(200).set_body_json(remotive_body(3, "A")), 1).await;
        mount(&server, "/b", ResponseTemplate::new(200).set_body_json(remotive_body(3, "B")), 1).await;
        mount(&server, "/c", ResponseTemplate::new(200).set_body_json(remotive_body(3, "C")), 0).await;

        let sources = vec![
            source("remotive-a", "api", format!("{}/a", server.uri())),
            source("remotive-b", "api", format!("{}/b", server.uri())),
            source("remotive-c", "api", format!("{}/c", server.uri())),
        ];
        let ctx = test_context();
        let report = SourceDispatcher::new(&ctx).dispatch_report(&sources, "dev", 5).await;
        assert_eq!(report.jobs.len(), 5);
        assert_eq!(report.jobs[4].title, "B 1");
        assert_eq!(report.sources[2].status, SourceStatus::Skipped);
    }

    #[tokio::test]
    async fn ordered_pool_keeps_source_order() {
        let server = MockServer::start().await;
        mount(&server, "/slow", ResponseTemplate::new(200).set_body_json(remotive_body(1, "Slow")).set_delay(Duration::from_millis(300)), 1).await;
        mount(&server, "/fast", ResponseTemplate::new(200).set_body_json(remotive_body(1, "Fast")), 1).await;
        let sources = vec![
            source("remotive-slow", "api", format!("{}/slow", server.uri())),
            source("remotive-fast", "api", format!("{}/fast", server.uri())),
        ];
        let ctx = test_context();
        let jobs = SourceDispatcher::new(&ctx).with_concurrency(4).dispatch(&sources, "dev", 10).await;
        assert_eq!(jobs.iter().map(|j| j.title.as_str()).collect::<Vec<_>>(), vec!["Slow 0", "Fast 0"]);
    }

    #[tokio::test]
    async fn deadline_abandons_slow_source() {
        let server = MockServer::start().await;
        mount(&server, "/slow", ResponseTemplate::new(200).set_body_json(remotive_body(1, "Slow")).set_delay(Duration::from_secs(5)), 1).await;
        let mut ctx = test_context();
        ctx.config.dispatch_deadline = Duration::from_millis(200);
        let sources = vec![
            source("remotive-slow", "api", format!("{}/slow", server.uri())),
            source("remotive-never", "api", format!("{}/never", server.uri())),
        ];
        let report = SourceDispatcher::new(&ctx).dispatch_report(&sources, "dev", 10).await;
        assert!(report.jobs.is_empty());
        assert_eq!(report.sources[0].status, SourceStatus::Failed);
        assert_eq!(report.sources[1].status, SourceStatus::Skipped);
    }

    #[tokio::test]
    async fn zero_cap_attempts_nothing() {
        let ctx = test_context();
        let sources = vec![source("feed", "rss", String::new())];
        let report = SourceDispatcher::new(&ctx).dispatch_report(&sources, "dev", 0).await;
        assert!(report.jobs.is_empty());
        assert_eq!(report.sources[0].status, SourceStatus::Skipped);
    }
}
