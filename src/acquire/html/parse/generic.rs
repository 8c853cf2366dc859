use scraper::{ElementRef, Html};
use tracing::debug;
use url::Url;

use super::{class_contains, element_text, resolve_href, selector, RawCard};

/// `{tag, predicate}` card rule; the first rule that matches any element wins.
pub struct CardRule {
    pub name: &'static str,
    pub tag: &'static str,
    pub matches: fn(&ElementRef) -> bool,
}

pub const CARD_RULES: &[CardRule] = &[
    CardRule { name: "div[data-test=job-card]", tag: "div", matches: |e| e.value().attr("data-test") == Some("job-card") },
    CardRule { name: "article.*job*", tag: "article", matches: |e| class_contains(e, "job") },
    CardRule { name: "li.*job*", tag: "li", matches: |e| class_contains(e, "job") },
    CardRule { name: "div.*job-card*", tag: "div", matches: |e| class_contains(e, "job-card") },
];

pub fn parse(html: &str, base: &Url) -> Vec<RawCard> {
    let doc = Html::parse_document(html);
    for rule in CARD_RULES {
        let Some(sel) = selector(rule.tag) else { continue };
        let cards: Vec<ElementRef> = doc.select(&sel).filter(|e| (rule.matches)(e)).collect();
        if cards.is_empty() { continue; }
        debug!(rule = rule.name, cards = cards.len(), "card rule matched");
        return cards.iter().filter_map(|card| read_card(card, base)).collect();
    }
    Vec::new()
}

fn first_match<'a>(card: &ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let sel = selector(css)?;
    card.select(&sel).next()
}

fn first_with_class<'a>(card: &ElementRef<'a>, needle: &str) -> Option<ElementRef<'a>> {
    card.descendants().filter_map(ElementRef::wrap).skip(1).find(|e| class_contains(e, needle))
}

fn non_empty(el: Option<ElementRef>) -> Option<String> {
    el.map(|e| element_text(&e, " ")).filter(|t| !t.is_empty())
}

fn read_card(card: &ElementRef, base: &Url) -> Option<RawCard> {
    let title = non_empty(first_match(card, "h1, h2, h3").or_else(|| first_match(card, "a")))?;
    let company = non_empty(first_with_class(card, "company"));
    let description = non_empty(first_match(card, "p").or_else(|| first_with_class(card, "desc")));
    let url = first_match(card, "a[href]")
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| resolve_href(base, href));
    Some(RawCard { title, company, description, url, tags: Vec::new() })
}
