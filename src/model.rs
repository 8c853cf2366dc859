use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AcquireError;

pub const UNKNOWN_COMPANY: &str = "Unknown Company";

/// How a source is reached. Anything other than `api`/`html` is kept
/// verbatim so the dispatcher can reject it per source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SourceKind {
    Api,
    Html,
    Unknown(String),
}

impl From<String> for SourceKind {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "api" => SourceKind::Api,
            "html" => SourceKind::Html,
            _ => SourceKind::Unknown(s),
        }
    }
}

impl From<SourceKind> for String {
    fn from(k: SourceKind) -> Self {
        match k {
            SourceKind::Api => "api".to_string(),
            SourceKind::Html => "html".to_string(),
            SourceKind::Unknown(s) => s,
        }
    }
}

impl SourceKind {
    pub fn as_str(&self) -> &str {
        match self {
            SourceKind::Api => "api",
            SourceKind::Html => "html",
            SourceKind::Unknown(s) => s,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub endpoint: String,
    #[serde(rename = "type")]
    pub kind: SourceKind,
    #[serde(default, deserialize_with = "null_as_default")]
    pub headers: HashMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub params: Map<String, Value>,
}

impl SourceDescriptor {
    /// Case-insensitive substring match against name or endpoint.
    pub fn mentions(&self, needle: &str) -> bool {
        let needle = needle.to_ascii_lowercase();
        self.name.to_ascii_lowercase().contains(&needle)
            || self.endpoint.to_ascii_lowercase().contains(&needle)
    }
}

// The backend serializes empty JSON columns as `null`.
fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillKind {
    Technical,
    Soft,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SkillKind,
}

/// Skills keyed by name; the first kind recorded for a name wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillSet {
    inner: BTreeMap<String, SkillKind>,
}

impl SkillSet {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, name: impl Into<String>, kind: SkillKind) -> bool {
        let name = name.into();
        if self.inner.contains_key(&name) { return false; }
        self.inner.insert(name, kind);
        true
    }

    pub fn contains(&self, name: &str) -> bool { self.inner.contains_key(name) }
    pub fn len(&self) -> usize { self.inner.len() }
    pub fn is_empty(&self) -> bool { self.inner.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&str, SkillKind)> {
        self.inner.iter().map(|(n, k)| (n.as_str(), *k))
    }

    pub fn into_vec(self) -> Vec<Skill> {
        self.inner.into_iter().map(|(name, kind)| Skill { name, kind }).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedJob {
    pub title: String,
    pub company: String,
    pub description: String,
    pub url: Option<String>,
    pub source: String,
    #[serde(default)]
    pub skills: Vec<Skill>,
}

impl NormalizedJob {
    /// Single entry point for every strategy: trims fields, applies the
    /// company/description defaults and refuses blank titles.
    pub fn build(
        title: &str,
        company: Option<&str>,
        description: Option<&str>,
        url: Option<&str>,
        source: &str,
        skills: SkillSet,
    ) -> Result<Self, AcquireError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AcquireError::MalformedRecord(format!("record from '{source}' has no title")));
        }
        let company = company.map(str::trim).filter(|c| !c.is_empty()).unwrap_or(UNKNOWN_COMPANY);
        let description = description.map(str::trim).filter(|d| !d.is_empty()).unwrap_or(title);
        let url = url.map(str::trim).filter(|u| !u.is_empty()).map(str::to_string);
        Ok(NormalizedJob {
            title: title.to_string(),
            company: company.to_string(),
            description: description.to_string(),
            url,
            source: source.to_string(),
            skills: skills.into_vec(),
        })
    }
}
