use scraper::{ElementRef, Selector};
use url::Url;

use crate::model::SourceDescriptor;

pub mod generic;
pub mod structural;

/// One listing as lifted from markup, before defaults and skills are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCard {
    pub title: String,
    pub company: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    /// Skill tags printed on the card itself (structural parser only).
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseTier {
    Structural,
    Generic,
}

impl ParseTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseTier::Structural => "structural",
            ParseTier::Generic => "generic",
        }
    }
}

#[derive(Debug)]
pub struct ParsedPage {
    pub tier: ParseTier,
    pub cards: Vec<RawCard>,
}

/// Structural parser for boards we recognize; its output is used alone
/// when it finds anything. Otherwise the generic rule cascade.
pub fn parse_page(source: &SourceDescriptor, html: &str, base: &Url) -> ParsedPage {
    if structural::recognizes(source) {
        let cards = structural::parse(html, base);
        if !cards.is_empty() { return ParsedPage { tier: ParseTier::Structural, cards }; }
    }
    ParsedPage { tier: ParseTier::Generic, cards: generic::parse(html, base) }
}

// Static selectors; a parse failure just means "no matches".
pub(crate) fn selector(css: &str) -> Option<Selector> { Selector::parse(css).ok() }

/// Whitespace-normalized text of an element, text nodes joined by `sep`.
pub(crate) fn element_text(el: &ElementRef, sep: &str) -> String {
    el.text().map(str::trim).filter(|t| !t.is_empty()).collect::<Vec<_>>().join(sep)
}

/// Absolute http(s) URL for `href`, resolved against the page.
pub(crate) fn resolve_href(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() { return None; }
    let url = base.join(href).ok()?;
    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}

pub(crate) fn class_contains(el: &ElementRef, needle: &str) -> bool {
    el.value().attr("class").is_some_and(|c| c.to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SourceKind;

    fn source(name: &str) -> SourceDescriptor {
        SourceDescriptor {
            id: None,
            name: name.into(),
            endpoint: "https://board.test/jobs".into(),
            kind: SourceKind::Html,
            headers: Default::default(),
            params: Default::default(),
        }
    }

    #[test]
    fn resolves_relative_and_drops_other_schemes() {
        let base = Url::parse("https://board.test/search/jobs/").unwrap();
        assert_eq!(resolve_href(&base, "/jobs/p/1").as_deref(), Some("https://board.test/jobs/p/1"));
        assert_eq!(resolve_href(&base, "view?id=2").as_deref(), Some("https://board.test/search/jobs/view?id=2"));
        assert_eq!(resolve_href(&base, "mailto:hr@board.test"), None);
        assert_eq!(resolve_href(&base, "javascript:void(0)"), None);
        assert_eq!(resolve_href(&base, "  "), None);
    }

    #[test]
    fn unrecognized_board_goes_straight_to_generic() {
        let html = r#"<article class="job-item"><h2>QA Engineer</h2></article>"#;
        let base = Url::parse("https://board.test/").unwrap();
        let page = parse_page(&source("Other Board"), html, &base);
        assert_eq!(page.tier, ParseTier::Generic);
        assert_eq!(page.cards.len(), 1);
    }

    #[test]
    fn structural_falls_back_to_generic_when_empty() {
        let html = r#"<li class="JobListing"><h3>Support Agent</h3><span class="company-name">Desk</span></li>"#;
        let base = Url::parse("https://wuzzuf.net/").unwrap();
        let page = parse_page(&source("Wuzzuf"), html, &base);
        assert_eq!(page.tier, ParseTier::Generic);
        assert_eq!(page.cards[0].company.as_deref(), Some("Desk"));
    }
}
