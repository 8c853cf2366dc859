use std::path::Path;

use rand::rngs::StdRng;
use serde_json::{Map, Value};
use tracing::Instrument;
use url::Url;

use crate::acquire::pacing::{jittered_sleep, random_user_agent, rng_for};
use crate::acquire::{param_to_string, AcquireContext};
use crate::error::AcquireError;
use crate::model::{NormalizedJob, SkillKind, SkillSet, SourceDescriptor};
use crate::telemetry::{self};
use crate::telemetry::ops::dispatch::Phase as DispatchPhase;

pub mod browser;
pub mod fetch;
pub mod parse;

use browser::BrowserSession;
use parse::{ParseTier, ParsedPage, RawCard};

// Query keys the page loop owns.
const QUERY_KEY: &str = "q";
const PAGE_KEY: &str = "page";

/// HTML strategy: tiered fetch, tiered parse, paginated with jitter.
pub struct HtmlScraper<'a> {
    ctx: &'a AcquireContext,
}

impl<'a> HtmlScraper<'a> {
    pub fn new(ctx: &'a AcquireContext) -> Self { Self { ctx } }

    /// Pages until one comes back empty, `max_pages` is reached or
    /// `max_results` jobs are held. Page failures end pagination but keep
    /// what earlier pages produced.
    pub async fn scrape(&self, source: &SourceDescriptor, query: &str, max_results: usize) -> Result<Vec<NormalizedJob>, AcquireError> {
        let base = Url::parse(source.endpoint.trim())
            .map_err(|e| AcquireError::InvalidSource(format!("'{}' endpoint {:?}: {e}", source.name, source.endpoint)))?;
        let cfg = &self.ctx.config;
        let log = telemetry::dispatch();
        let mut rng = rng_for(cfg.seed);
        let mut jobs: Vec<NormalizedJob> = Vec::new();

        for page in 1..=cfg.max_pages {
            if jobs.len() >= max_results { break; }
            let url = page_url(&base, &source.params, query, page);
            let span = log.span_kv(&DispatchPhase::Paginate, [("page", page.to_string()), ("url", url.to_string())]);
            let Some(page_jobs) = self.scrape_page(source, &base, &url, page, &mut rng).instrument(span).await else { break };
            jobs.extend(page_jobs);

            if page < cfg.max_pages && jobs.len() < max_results {
                let slept = jittered_sleep(&cfg.page_delay, &mut rng).await;
                log.debug(format!("💤 slept {:?} before next page", slept));
            }
        }

        jobs.truncate(max_results);
        Ok(jobs)
    }

    /// One page fetched and parsed; `None` ends pagination.
    async fn scrape_page(&self, source: &SourceDescriptor, base: &Url, url: &Url, page: u32, rng: &mut StdRng) -> Option<Vec<NormalizedJob>> {
        let log = telemetry::dispatch();
        let Some(html) = self.fetch_markup(source, url.as_str(), rng).await else {
            log.warn(format!("⚠️ No markup for page {} of '{}'; stopping", page, source.name));
            return None;
        };

        let parsed = { let _s = log.span(&DispatchPhase::Parse).entered(); parse::parse_page(source, &html, base) };
        let tier = parsed.tier;
        let page_jobs = self.to_jobs(source, parsed);
        if page_jobs.is_empty() {
            log.info(format!("🛑 No jobs on page {} of '{}'; stopping", page, source.name));
            return None;
        }
        log.info_kv(
            &format!("📄 Page {} of '{}': {} job(s)", page, source.name, page_jobs.len()),
            [("page", page.to_string()), ("jobs", page_jobs.len().to_string()), ("parser", tier.as_str().to_string())],
        );
        Some(page_jobs)
    }

    /// Browser tier when available, plain HTTP otherwise or after it fails.
    async fn fetch_markup(&self, source: &SourceDescriptor, url: &str, rng: &mut StdRng) -> Option<String> {
        let log = telemetry::dispatch();
        let caps = &self.ctx.capabilities;

        if let Some(chromium) = caps.chromium.as_deref().filter(|_| caps.browser) {
            let span = log.span_kv(&DispatchPhase::FetchBrowser, [("url", url.to_string())]);
            if let Some(html) = self.fetch_rendered(chromium, url, rng).instrument(span).await {
                return Some(html);
            }
        }

        let span = log.span_kv(&DispatchPhase::FetchHttp, [("url", url.to_string())]);
        let fetched = fetch::fetch_page(&self.ctx.http, url, &source.headers, self.ctx.config.page_timeout, rng)
            .instrument(span)
            .await;
        match fetched {
            Ok(html) if !html.trim().is_empty() => Some(html),
            Ok(_) => None,
            Err(e) if e.is_blocking() => {
                log.warn_kv(&format!("🚫 '{}' is blocking automated access: {e}", source.name), [("source", source.name.clone())]);
                None
            }
            Err(e) => { log.warn(format!("⚠️ {e}")); None }
        }
    }

    async fn fetch_rendered(&self, chromium: &Path, url: &str, rng: &mut StdRng) -> Option<String> {
        let log = telemetry::dispatch();
        let settings = &self.ctx.config.browser;
        let ua = random_user_agent(rng);
        match BrowserSession::launch(chromium, ua, settings).await {
            Ok(session) => {
                let rendered = session.render(url, settings, rng).await;
                session.release().await;
                match rendered {
                    Ok(html) if !html.trim().is_empty() => return Some(html),
                    Ok(_) => log.warn("⚠️ browser returned empty markup; trying plain HTTP"),
                    Err(e) => log.warn(format!("⚠️ browser fetch failed: {e}; trying plain HTTP")),
                }
            }
            Err(e) => log.warn(format!("⚠️ {e}; trying plain HTTP")),
        }
        None
    }

    fn to_jobs(&self, source: &SourceDescriptor, page: ParsedPage) -> Vec<NormalizedJob> {
        let log = telemetry::dispatch();
        let threshold = self.ctx.config.html_fuzzy_threshold;
        page.cards
            .into_iter()
            .filter_map(|card| {
                let skills = self.card_skills(&card, page.tier, threshold);
                let built = NormalizedJob::build(
                    &card.title,
                    card.company.as_deref(),
                    card.description.as_deref(),
                    card.url.as_deref(),
                    &source.name,
                    skills,
                );
                built.map_err(|e| log.debug(format!("↩️ skip card: {e}"))).ok()
            })
            .collect()
    }

    fn card_skills(&self, card: &RawCard, tier: ParseTier, threshold: u8) -> SkillSet {
        let skills = &self.ctx.skills;
        if tier == ParseTier::Structural && !card.tags.is_empty() {
            let mut set = SkillSet::new();
            for tag in &card.tags {
                let kind = skills.taxonomy().lookup(tag).map_or(SkillKind::Technical, |(_, k)| k);
                set.insert(tag.trim(), kind);
            }
            return set;
        }
        let text = format!("{} {}", card.title, card.description.as_deref().unwrap_or(""));
        skills.extract_fuzzy(&text, threshold)
    }
}

/// Endpoint with its own query, plus non-reserved descriptor params, plus
/// `q` and the 1-based `page`.
pub fn page_url(base: &Url, params: &Map<String, Value>, query: &str, page: u32) -> Url {
    let mut url = base.clone();
    let own: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != QUERY_KEY && k != PAGE_KEY)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    {
        let mut q = url.query_pairs_mut();
        q.clear();
        for (k, v) in &own { q.append_pair(k, v); }
        for (k, v) in params {
            if k == QUERY_KEY || k == PAGE_KEY || own.iter().any(|(o, _)| o == k) { continue; }
            if let Some(v) = param_to_string(v) { q.append_pair(k, &v); }
        }
        q.append_pair(QUERY_KEY, query);
        q.append_pair(PAGE_KEY, &page.to_string());
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::test_context;
    use crate::model::SourceKind;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn html_source(name: &str, endpoint: String) -> SourceDescriptor {
        SourceDescriptor {
            id: Some(1),
            name: name.into(),
            endpoint,
            kind: SourceKind::Html,
            headers: Default::default(),
            params: Default::default(),
        }
    }

    fn cards(titles: &[&str]) -> String {
        let items: String = titles
            .iter()
            .enumerate()
            .map(|(i, t)| format!(r#"<article class="job"><h2>{t}</h2><p>Docker and Kubernetes</p><a href="/j/{i}">apply</a></article>"#))
            .collect();
        format!("<html><body>{items}</body></html>")
    }

    #[test]
    fn page_url_merges_params() {
        let base = Url::parse("https://board.test/search/jobs/?a=hpb&page=9").unwrap();
        let params = json!({"filters[country][0]": "Egypt", "a": "override", "q": "hijack", "n": 3});
        let url = page_url(&base, params.as_object().unwrap(), "php developer", 2);
        let pairs: Vec<(String, String)> = url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect();
        assert_eq!(pairs.iter().filter(|(k, _)| k == "a").count(), 1);
        assert!(pairs.contains(&("a".into(), "hpb".into())));
        assert!(pairs.contains(&("filters[country][0]".into(), "Egypt".into())));
        assert!(pairs.contains(&("n".into(), "3".into())));
        assert_eq!(pairs[pairs.len() - 2], ("q".into(), "php developer".into()));
        assert_eq!(pairs[pairs.len() - 1], ("page".into(), "2".into()));
    }

    #[tokio::test]
    async fn empty_second_page_stops_pagination() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).and(path("/jobs")).and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(cards(&["DevOps Engineer", "SRE"])))
            .expect(1).mount(&server).await;
        Mock::given(method("GET")).and(path("/jobs")).and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body><p>No results</p></body></html>"))
            .expect(1).mount(&server).await;
        Mock::given(method("GET")).and(path("/jobs")).and(query_param("page", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_string(cards(&["Never Seen"])))
            .expect(0).mount(&server).await;

        let ctx = test_context();
        let jobs = HtmlScraper::new(&ctx)
            .scrape(&html_source("Board", format!("{}/jobs", server.uri())), "devops", 30)
            .await
            .unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].source, "Board");
        assert_eq!(jobs[0].url.as_deref(), Some(format!("{}/j/0", server.uri()).as_str()));
        assert!(jobs[0].skills.iter().any(|s| s.name == "Docker"));
        assert!(jobs[0].skills.iter().any(|s| s.name == "Kubernetes"));
    }

    #[tokio::test]
    async fn blocked_first_page_yields_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;
        let ctx = test_context();
        let jobs = HtmlScraper::new(&ctx).scrape(&html_source("Board", server.uri()), "x", 30).await.unwrap();
        assert!(jobs.is_empty());
    }

    #[tokio::test]
    async fn stops_once_max_results_held() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(cards(&["A1", "A2", "A3"])))
            .expect(1).mount(&server).await;
        Mock::given(method("GET")).and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_string(cards(&["B1"])))
            .expect(0).mount(&server).await;
        let ctx = test_context();
        let jobs = HtmlScraper::new(&ctx).scrape(&html_source("Board", server.uri()), "x", 2).await.unwrap();
        assert_eq!(jobs.iter().map(|j| j.title.as_str()).collect::<Vec<_>>(), vec!["A1", "A2"]);
    }

    #[tokio::test]
    async fn structural_tags_become_skills() {
        let server = MockServer::start().await;
        let page = r#"
            <div><div><h2><a href="/jobs/p/1-php">PHP Developer</a></h2></div>
              <div><a href="/jobs/company/nile">Nile Soft -</a><span>Cairo, Egypt, full time role</span></div>
              <div><a href="/a/Laravel-Jobs">laravel</a><a href="/a/Stakeholder">Stakeholder Management</a></div>
            </div>"#;
        Mock::given(method("GET")).and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page))
            .mount(&server).await;
        Mock::given(method("GET")).and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_string(""))
            .mount(&server).await;
        let ctx = test_context();
        let jobs = HtmlScraper::new(&ctx)
            .scrape(&html_source("Wuzzuf PHP", format!("{}/search/jobs/", server.uri())), "php", 10)
            .await
            .unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].company, "Nile Soft");
        let skills: Vec<(&str, SkillKind)> = jobs[0].skills.iter().map(|s| (s.name.as_str(), s.kind)).collect();
        assert!(skills.contains(&("laravel", SkillKind::Technical)));
        assert!(skills.contains(&("Stakeholder Management", SkillKind::Technical)));
    }

    #[tokio::test]
    async fn bad_endpoint_is_an_invalid_source() {
        let ctx = test_context();
        let err = HtmlScraper::new(&ctx).scrape(&html_source("Board", "not a url".into()), "x", 5).await.unwrap_err();
        assert!(matches!(err, AcquireError::InvalidSource(_)));
    }
}
