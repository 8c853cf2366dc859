use std::path::Path;

use tokenizers::Tokenizer;

use crate::error::AcquireError;
use crate::model::SkillSet;

use super::fuzzy::EDGE_PUNCT;
use super::taxonomy::Taxonomy;

// Words that never belong to a skill phrase; they split candidate runs.
const STOPWORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "nor", "with", "without", "in", "on", "of", "for",
    "to", "at", "by", "from", "as", "into", "about", "is", "are", "was", "were", "be", "been",
    "being", "we", "you", "they", "i", "our", "your", "their", "my", "it", "its", "this",
    "that", "these", "those", "who", "which", "will", "would", "should", "can", "must", "have",
    "has", "had", "do", "does", "using", "use", "plus", "strong", "good", "great", "love",
    "knowledge", "experience", "years", "year", "skills", "skill", "ability", "team",
];

const CLAUSE_PUNCT: &[char] = &[',', ';', ':', '.', '!', '?', '(', ')', '|', '/'];

/// Tokenizer-backed phrase extractor.
pub struct NlpModel {
    tokenizer: Tokenizer,
}

impl NlpModel {
    /// `source` is either a local `tokenizer.json` or a hub model id.
    pub fn load(source: &str) -> Result<Self, AcquireError> {
        let unavailable = |e: tokenizers::Error| AcquireError::CapabilityUnavailable(format!("nlp model '{source}': {e}"));
        let tokenizer = if Path::new(source).exists() {
            Tokenizer::from_file(source).map_err(unavailable)?
        } else {
            Tokenizer::from_pretrained(source, None).map_err(unavailable)?
        };
        Ok(Self { tokenizer })
    }

    /// Surface words as they appear in `text`, rebuilt from subword offsets.
    pub fn surface_tokens<'t>(&self, text: &'t str) -> Result<Vec<&'t str>, AcquireError> {
        let encoding = self.tokenizer
            .encode(text, false)
            .map_err(|e| AcquireError::Parse(format!("tokenize: {e}")))?;
        let spans: Vec<(usize, usize)> = encoding
            .get_word_ids()
            .iter()
            .zip(encoding.get_offsets())
            .filter(|(word, _)| word.is_some())
            .map(|(_, span)| *span)
            .collect();
        Ok(merge_spans(spans).into_iter().filter_map(|(s, e)| text.get(s..e)).collect())
    }

    pub fn extract(&self, text: &str, taxonomy: &Taxonomy) -> Result<SkillSet, AcquireError> {
        if text.trim().is_empty() || taxonomy.is_empty() { return Ok(SkillSet::new()); }
        let tokens = self.surface_tokens(text)?;
        let phrases = chunk_phrases(&tokens);
        Ok(match_spans(&phrases, &tokens, taxonomy))
    }
}

/// Sorts spans and joins those that touch or overlap, so `C`, `+`, `+`
/// come back as one `C++` word.
pub fn merge_spans(mut spans: Vec<(usize, usize)>) -> Vec<(usize, usize)> {
    spans.sort_unstable();
    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(spans.len());
    for (start, end) in spans {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

/// Maximal runs of content words, lowercased. Stopwords and clause
/// punctuation end a run.
pub fn chunk_phrases(tokens: &[&str]) -> Vec<String> {
    let mut phrases = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut flush = |current: &mut Vec<String>| {
        if !current.is_empty() { phrases.push(current.join(" ")); current.clear(); }
    };

    for raw in tokens {
        let word = raw.trim_matches(EDGE_PUNCT).to_lowercase();
        if raw.starts_with(CLAUSE_PUNCT) { flush(&mut current); }
        if !word.chars().any(char::is_alphanumeric) || STOPWORDS.contains(&word.as_str()) {
            flush(&mut current);
            continue;
        }
        current.push(word);
        if raw.ends_with(CLAUSE_PUNCT) { flush(&mut current); }
    }
    flush(&mut current);
    phrases
}

/// Multi-word entries must sit inside one phrase; single words must equal
/// a token. Entries that carry a stopword themselves ("Ruby on Rails") are
/// matched against the whole word stream instead.
pub fn match_spans(phrases: &[String], tokens: &[&str], taxonomy: &Taxonomy) -> SkillSet {
    let words: Vec<String> = tokens
        .iter()
        .map(|t| t.trim_matches(EDGE_PUNCT).to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    let stream = format!(" {} ", words.join(" "));

    let mut found = SkillSet::new();
    for (entry, kind) in taxonomy.entries() {
        let needle = entry.to_lowercase();
        let hit = if needle.split(' ').any(|w| STOPWORDS.contains(&w)) {
            stream.contains(&format!(" {needle} "))
        } else if needle.contains(' ') {
            phrases.iter().any(|p| p.contains(&needle))
        } else {
            words.iter().any(|w| *w == needle)
        };
        if hit { found.insert(entry, kind); }
    }
    found
}

/// Whitespace-split word-level tokenizer written to a temp file. `[UNK]`
/// is in the vocabulary only when `with_unk` is set.
#[cfg(test)]
pub(crate) fn word_level_tokenizer(vocab: &[&str], with_unk: bool) -> tempfile::NamedTempFile {
    let mut ids = serde_json::Map::new();
    let words = with_unk.then_some("[UNK]").into_iter().chain(vocab.iter().copied());
    for (i, word) in words.enumerate() { ids.insert(word.to_string(), serde_json::json!(i)); }
    let spec = serde_json::json!({
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": null,
        "pre_tokenizer": {"type": "Whitespace"},
        "post_processor": null,
        "decoder": null,
        "model": {"type": "WordLevel", "vocab": ids, "unk_token": "[UNK]"}
    });
    let mut f = tempfile::NamedTempFile::new().unwrap();
    std::io::Write::write_all(&mut f, spec.to_string().as_bytes()).unwrap();
    f
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SkillKind;

    #[test]
    fn tokenizer_file_loads_and_rebuilds_words() {
        let file = word_level_tokenizer(&["Expert", "in", "C", "++", "and", "Node", ".", "js"], true);
        let model = NlpModel::load(file.path().to_str().unwrap()).unwrap();
        let tokens = model.surface_tokens("Expert in C++ and Node.js, plus Kotlin").unwrap();
        // trailing comma touches the word, so it rides along until match time
        assert_eq!(tokens, vec!["Expert", "in", "C++", "and", "Node.js,", "plus", "Kotlin"]);

        let got = model.extract("Expert in C++ and Node.js, plus Kotlin", &Taxonomy::builtin()).unwrap();
        assert!(got.contains("C++"));
        assert!(got.contains("Node.js"));
        assert!(!got.contains("C#"));
    }

    #[test]
    fn touching_spans_merge() {
        let spans = vec![(4, 5), (0, 3), (5, 6), (6, 7), (9, 12)];
        assert_eq!(merge_spans(spans), vec![(0, 3), (4, 7), (9, 12)]);
    }

    #[test]
    fn phrases_break_on_stopwords_and_commas() {
        let tokens = ["Senior", "engineer", "with", "Spring", "Boot,", "Ruby", "on", "Rails", "and", "problem", "solving."];
        let phrases = chunk_phrases(&tokens);
        assert_eq!(phrases, vec!["senior engineer", "spring boot", "ruby", "rails", "problem solving"]);
    }

    #[test]
    fn standalone_punctuation_is_a_boundary() {
        let tokens = ["React", "-", "Native", ";", "Docker"];
        let phrases = chunk_phrases(&tokens);
        assert_eq!(phrases, vec!["react", "native", "docker"]);
    }

    #[test]
    fn matches_tokens_and_phrases() {
        let tax = Taxonomy::builtin();
        let tokens = ["Expert", "in", "C++,", "Node.js", "and", "Spring", "Boot.", "Strong", "Leadership"];
        let phrases = chunk_phrases(&tokens);
        let got = match_spans(&phrases, &tokens, &tax);
        let names: Vec<(&str, SkillKind)> = got.iter().collect();
        assert!(names.contains(&("C++", SkillKind::Technical)));
        assert!(names.contains(&("Node.js", SkillKind::Technical)));
        assert!(names.contains(&("Spring Boot", SkillKind::Technical)));
        assert!(names.contains(&("Leadership", SkillKind::Soft)));
        assert!(!got.contains("Ruby on Rails"));
        // no fuzzy tolerance here
        assert!(!got.contains("Java"));
    }

    #[test]
    fn entries_with_stopwords_match_the_word_stream() {
        let tax = Taxonomy::builtin();
        let tokens = ["Ruby", "on", "Rails", "developer"];
        let phrases = chunk_phrases(&tokens);
        let got = match_spans(&phrases, &tokens, &tax);
        assert!(got.contains("Ruby on Rails"));
        assert!(got.contains("Ruby"));
    }

    #[test]
    fn multi_word_entries_do_not_cross_phrases() {
        let tax = Taxonomy { technical: vec!["Spring Boot".into()], soft: vec![] };
        let tokens = ["Spring,", "Boot"];
        let phrases = chunk_phrases(&tokens);
        assert!(match_spans(&phrases, &tokens, &tax).is_empty());
    }

    #[test]
    fn missing_model_is_unavailable() {
        // not a file and not a valid hub id
        let err = NlpModel::load("not a model id").err();
        assert!(matches!(err, Some(AcquireError::CapabilityUnavailable(_))));
    }
}
