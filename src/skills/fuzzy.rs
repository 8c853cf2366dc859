use std::collections::HashSet;

use crate::model::SkillSet;
use crate::util::text::collapse_whitespace;

use super::taxonomy::Taxonomy;

pub const DEFAULT_THRESHOLD: u8 = 80;

// Entries and tokens shorter than this never go through similarity scoring.
const MIN_FUZZY_LEN: usize = 3;

pub(crate) const EDGE_PUNCT: &[char] = &['.', ',', '!', '?', ';', ':', '(', ')', '[', ']', '{', '}', '"', '\'', '/', '\\'];

/// Lowercased words with edge punctuation stripped, in text order.
pub fn clean_tokens(normalized: &str) -> Vec<String> {
    normalized
        .split_whitespace()
        .map(|w| w.trim_matches(EDGE_PUNCT))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Indel similarity on chars, 0-100: `2 * LCS / (|a| + |b|)`.
pub fn similarity(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 { return 100; }
    let lcs = lcs_len(&a, &b);
    ((200 * lcs) as f64 / total as f64).round() as u8
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            cur[j + 1] = if ca == cb { prev[j] + 1 } else { cur[j].max(prev[j + 1]) };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

pub fn extract(text: &str, taxonomy: &Taxonomy, threshold: u8) -> SkillSet {
    let mut found = SkillSet::new();
    if text.trim().is_empty() || taxonomy.is_empty() { return found; }

    let normalized = collapse_whitespace(&text.to_lowercase());
    let tokens = clean_tokens(&normalized);
    let token_set: HashSet<&str> = tokens.iter().map(String::as_str).collect();

    for (entry, kind) in taxonomy.entries() {
        if found.contains(entry) { continue; }
        let needle = entry.to_lowercase();

        if needle.split_whitespace().nth(1).is_some() {
            if normalized.contains(&needle) { found.insert(entry, kind); }
            continue;
        }

        if token_set.contains(needle.as_str()) {
            found.insert(entry, kind);
            continue;
        }

        if needle.chars().count() < MIN_FUZZY_LEN { continue; }
        let close = tokens
            .iter()
            .filter(|t| t.chars().count() >= MIN_FUZZY_LEN)
            .any(|t| similarity(&needle, t) >= threshold);
        if close { found.insert(entry, kind); }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SkillKind;

    fn names(set: &SkillSet) -> Vec<&str> { set.iter().map(|(n, _)| n).collect() }

    #[test]
    fn laravel_scenario() {
        let tax = Taxonomy::builtin();
        let got = extract("I love Laravel framework", &tax, DEFAULT_THRESHOLD);
        assert!(got.iter().any(|(n, k)| n == "Laravel" && k == SkillKind::Technical));

        let none = extract("I love Laravel framework", &Taxonomy::empty(), DEFAULT_THRESHOLD);
        assert!(none.is_empty());
    }

    #[test]
    fn typos_match_fuzzily() {
        let tax = Taxonomy::builtin();
        let got = extract("Skilled in Pythno and Djanog", &tax, 80);
        let n = names(&got);
        assert!(n.contains(&"Python"), "{n:?}");
        assert!(n.contains(&"Django"), "{n:?}");
    }

    #[test]
    fn punctuation_is_stripped_from_tokens() {
        let tax = Taxonomy::builtin();
        let got = extract("Expert in C++, C# and (Docker).", &tax, 80);
        let n = names(&got);
        assert!(n.contains(&"C++"));
        assert!(n.contains(&"C#"));
        assert!(n.contains(&"Docker"));
    }

    #[test]
    fn short_entries_need_exact_tokens() {
        let tax = Taxonomy { technical: vec!["Go".into(), "R".into()], soft: vec![] };
        // "good" and "are" would be close to nothing under 3 chars; no fuzzy pass
        assert!(extract("good things are coming", &tax, 50).is_empty());
        let got = extract("We write Go and R daily", &tax, 80);
        assert_eq!(got.len(), 2);
    }

    #[test]
    fn multi_word_entries_match_by_substring() {
        let tax = Taxonomy::builtin();
        let got = extract("Strong   problem\nsolving and Spring Boot", &tax, 95);
        let n = names(&got);
        assert!(n.contains(&"Problem Solving"));
        assert!(n.contains(&"Spring Boot"));
        assert_eq!(got.iter().find(|(n, _)| *n == "Problem Solving").map(|(_, k)| k), Some(SkillKind::Soft));
    }

    #[test]
    fn extraction_is_deterministic() {
        let tax = Taxonomy::builtin();
        let text = "Senior PHP developer with Laravel, MySQL, Docker and Git. Good communication skills.";
        assert_eq!(extract(text, &tax, 80), extract(text, &tax, 80));
    }

    #[test]
    fn similarity_scale() {
        assert_eq!(similarity("python", "python"), 100);
        assert_eq!(similarity("python", "pythno"), 83);
        assert!(similarity("java", "javascript") < 80);
        assert_eq!(similarity("", ""), 100);
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert!(extract("   ", &Taxonomy::builtin(), 80).is_empty());
    }
}
