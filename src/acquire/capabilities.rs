use std::path::PathBuf;

use serde::Serialize;

use crate::config::HarvestConfig;

use super::html::browser::find_chromium;

/// What the host can do, probed once at startup and handed to every
/// strategy instead of being rediscovered per call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Capabilities {
    pub browser: bool,
    pub nlp: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chromium: Option<PathBuf>,
}

impl Capabilities {
    pub fn detect(cfg: &HarvestConfig) -> Self {
        let chromium = if cfg.browser.disabled { None } else { find_chromium(cfg.browser.chromium_path.as_deref()) };
        Capabilities { browser: chromium.is_some(), nlp: cfg.nlp_model.is_some(), chromium }
    }
}
