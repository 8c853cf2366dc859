//! Wuzzuf listing pages: job links carry `/jobs/p/`, the card around them
//! holds a company link and `/a/` skill tags.

use std::collections::HashSet;

use scraper::{ElementRef, Html};
use url::Url;

use crate::model::{SourceDescriptor, UNKNOWN_COMPANY};
use crate::util::text::truncate_chars;

use super::{element_text, resolve_href, selector, RawCard};

const JOB_HREF: &str = "/jobs/p/";
const TAG_HREF: &str = "/a/";
const MIN_CONTAINER_CHARS: usize = 50;
const MAX_EXTRA_CLIMBS: usize = 2;
const PREVIEW_CHARS: usize = 200;

pub fn recognizes(source: &SourceDescriptor) -> bool { source.mentions("wuzzuf") }

fn is_company_href(href: &str) -> bool { href.contains("/jobs/company/") || href.contains("/company/") }

pub fn parse(html: &str, base: &Url) -> Vec<RawCard> {
    let doc = Html::parse_document(html);
    let Some(anchors) = selector("a[href]") else { return Vec::new() };

    let mut seen: HashSet<&str> = HashSet::new();
    let mut cards = Vec::new();
    for link in doc.select(&anchors) {
        let Some(href) = link.value().attr("href") else { continue };
        if !href.contains(JOB_HREF) || !seen.insert(href) { continue; }

        let title = element_text(&link, " ");
        if title.is_empty() { continue; }
        let Some(container) = find_container(&link, &title) else { continue };

        let company_link = container
            .select(&anchors)
            .find(|a| a.value().attr("href").is_some_and(is_company_href));
        let company_href = company_link.and_then(|a| a.value().attr("href"));
        let company = company_link
            .map(|a| element_text(&a, " ").trim_end_matches([' ', '-']).to_string())
            .filter(|c| !c.is_empty());

        let tags: Vec<String> = container
            .select(&anchors)
            .filter(|a| a.value().attr("href").is_some_and(|h| h.contains(TAG_HREF) && Some(h) != company_href))
            .map(|a| element_text(&a, " "))
            .filter(|t| t.chars().count() > 1)
            .collect();

        let text = element_text(&container, " | ");
        let description = format!(
            "{title} at {}. {}...",
            company.as_deref().unwrap_or(UNKNOWN_COMPANY),
            truncate_chars(&text, PREVIEW_CHARS)
        );

        cards.push(RawCard { url: resolve_href(base, href), title, company, description: Some(description), tags });
    }
    cards
}

// Nearest div, climbing while it is too small to be a whole card.
fn find_container<'a>(link: &ElementRef<'a>, title: &str) -> Option<ElementRef<'a>> {
    let mut divs = link
        .ancestors()
        .filter_map(ElementRef::wrap)
        .filter(|e| e.value().name() == "div");
    let mut container = divs.next()?;
    let min_len = (title.chars().count() + 5).max(MIN_CONTAINER_CHARS);
    for _ in 0..MAX_EXTRA_CLIMBS {
        if element_text(&container, "").chars().count() >= min_len { break; }
        match divs.next() {
            Some(parent) => container = parent,
            None => break,
        }
    }
    Some(container)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <div class="card">
            <div class="header"><h2><a href="/jobs/p/123-laravel-developer">Laravel Developer</a></h2></div>
            <div><a href="/jobs/company/acme">Acme Corp -</a> <span>Cairo, Egypt</span></div>
            <div><a href="/a/PHP-Jobs-in-Egypt">PHP</a> <a href="/a/Laravel-Jobs">Laravel</a> <a href="/a/x">x</a></div>
            <a href="/jobs/p/123-laravel-developer">Laravel Developer</a>
          </div>
          <div class="card">
            <div class="header"><h2><a href="https://wuzzuf.net/jobs/p/456-support">Support Specialist</a></h2></div>
            <div><span>Giza, Egypt</span> <span>Full Time</span> <span>Entry level, 0-2 years</span></div>
          </div>
        </body></html>
    "#;

    #[test]
    fn duplicate_links_yield_one_card() {
        let base = Url::parse("https://wuzzuf.net/search/jobs/").unwrap();
        let cards = parse(PAGE, &base);
        assert_eq!(cards.len(), 2);
        assert_eq!(cards.iter().filter(|c| c.title == "Laravel Developer").count(), 1);
    }

    #[test]
    fn card_fields_come_from_container() {
        let base = Url::parse("https://wuzzuf.net/search/jobs/").unwrap();
        let cards = parse(PAGE, &base);
        let first = &cards[0];
        assert_eq!(first.url.as_deref(), Some("https://wuzzuf.net/jobs/p/123-laravel-developer"));
        assert_eq!(first.company.as_deref(), Some("Acme Corp"));
        assert_eq!(first.tags, vec!["PHP".to_string(), "Laravel".to_string()]);
        let desc = first.description.as_deref().unwrap();
        assert!(desc.starts_with("Laravel Developer at Acme Corp. Laravel Developer | Acme Corp -"), "{desc}");
        assert!(desc.ends_with("..."));

        let second = &cards[1];
        assert_eq!(second.company, None);
        assert!(second.tags.is_empty());
        assert!(second.description.as_deref().unwrap().starts_with("Support Specialist at Unknown Company."));
    }

    #[test]
    fn page_without_job_links_is_empty() {
        let base = Url::parse("https://wuzzuf.net/").unwrap();
        assert!(parse("<div><a href='/about'>About</a></div>", &base).is_empty());
    }
}
