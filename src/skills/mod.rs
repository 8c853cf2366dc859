use std::sync::OnceLock;

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::HarvestConfig;
use crate::error::AcquireError;
use crate::model::{Skill, SkillSet};
use crate::telemetry::{self};
use crate::telemetry::ops::skills::Phase as SkillsPhase;

pub mod fuzzy;
pub mod nlp;
pub mod taxonomy;

use nlp::NlpModel;
use taxonomy::Taxonomy;

/// Text-to-taxonomy matcher shared by every fetch strategy.
///
/// The NLP model is loaded on first use and at most once; a model that
/// fails to load stays unavailable for the life of the extractor and
/// every caller falls back to fuzzy matching.
pub struct SkillExtractor {
    taxonomy: Taxonomy,
    nlp_source: Option<String>,
    nlp: OnceLock<Option<NlpModel>>,
}

impl SkillExtractor {
    pub fn new(taxonomy: Taxonomy, nlp_source: Option<String>) -> Self {
        Self { taxonomy, nlp_source, nlp: OnceLock::new() }
    }

    pub fn from_config(cfg: &HarvestConfig) -> Result<Self> {
        let taxonomy = match &cfg.taxonomy_path {
            Some(path) => Taxonomy::from_file(path)?,
            None => Taxonomy::builtin(),
        };
        Ok(Self::new(taxonomy, cfg.nlp_model.clone()))
    }

    pub fn taxonomy(&self) -> &Taxonomy { &self.taxonomy }

    fn model(&self) -> Option<&NlpModel> {
        self.nlp
            .get_or_init(|| {
                let source = self.nlp_source.as_deref()?;
                match NlpModel::load(source) {
                    Ok(m) => Some(m),
                    Err(e) => { warn!("{e}; falling back to fuzzy matching"); None }
                }
            })
            .as_ref()
    }

    pub fn extract_fuzzy(&self, text: &str, threshold: u8) -> SkillSet {
        fuzzy::extract(text, &self.taxonomy, threshold)
    }

    pub fn extract_nlp(&self, text: &str) -> Result<SkillSet, AcquireError> {
        let model = self.model().ok_or_else(|| AcquireError::CapabilityUnavailable("nlp model".into()))?;
        model.extract(text, &self.taxonomy)
    }

    /// NLP when a model is available, fuzzy at `threshold` otherwise.
    pub fn extract_with_fallback(&self, text: &str, threshold: u8) -> SkillSet {
        match self.extract_nlp(text) {
            Ok(found) => found,
            Err(AcquireError::CapabilityUnavailable(_)) => self.extract_fuzzy(text, threshold),
            Err(e) => { debug!("nlp extraction failed: {e}"); self.extract_fuzzy(text, threshold) }
        }
    }
}

/// harvest skills ls/extract
#[derive(Args, Debug)]
pub struct SkillsCmd {
    #[command(subcommand)]
    pub cmd: SkillsSub,
}

#[derive(Subcommand, Debug)]
pub enum SkillsSub {
    // list the taxonomy in use
    Ls,
    // run extraction over a piece of text
    Extract {
        text: String,
        /// Use the NLP strategy (falls back to fuzzy when no model is available)
        #[arg(long, default_value_t = false)]
        nlp: bool,
        #[arg(long, default_value_t = fuzzy::DEFAULT_THRESHOLD)]
        threshold: u8,
    },
}

#[derive(Serialize)]
struct ExtractResult { strategy: &'static str, skills: Vec<Skill> }

pub async fn run(extractor: &SkillExtractor, args: SkillsCmd) -> Result<()> {
    let log = telemetry::skills();
    let _g = log.root_span().entered();
    match args.cmd {
        SkillsSub::Ls => {
            let _s = log.span(&SkillsPhase::List).entered();
            let tax = extractor.taxonomy();
            if telemetry::config::json_mode() { log.result(tax)?; }
            else {
                log.info(format!("🧰 Technical ({}): {}", tax.technical.len(), tax.technical.join(", ")));
                log.info(format!("🤝 Soft ({}): {}", tax.soft.len(), tax.soft.join(", ")));
            }
        }
        SkillsSub::Extract { text, nlp, threshold } => {
            let _s = log.span_kv(&SkillsPhase::Extract, [("nlp", nlp.to_string()), ("threshold", threshold.to_string())]).entered();
            let (strategy, found) = if nlp {
                match extractor.extract_nlp(&text) {
                    Ok(found) => ("nlp", found),
                    Err(e) => { log.warn(format!("⚠️ {e}; using fuzzy")); ("fuzzy", extractor.extract_fuzzy(&text, threshold)) }
                }
            } else {
                ("fuzzy", extractor.extract_fuzzy(&text, threshold))
            };
            if telemetry::config::json_mode() {
                log.result(&ExtractResult { strategy, skills: found.into_vec() })?;
            } else {
                log.info(format!("🔎 {} skill(s) via {}", found.len(), strategy));
                for (name, kind) in found.iter() { log.info(format!("  {:24} {:?}", name, kind)); }
            }
        }
    }
    Ok(())
}
