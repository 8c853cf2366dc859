use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::model::SkillKind;
use crate::skills::taxonomy::DemandCategory;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillFrequencyStat {
    pub count: usize,
    pub percentage: f64,
    pub importance: DemandCategory,
    #[serde(rename = "type")]
    pub kind: SkillKind,
}

/// Skill name -> stat, kept in ranking order and serialized as a JSON
/// object in that same order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkillFrequencies(pub Vec<(String, SkillFrequencyStat)>);

impl SkillFrequencies {
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl Serialize for SkillFrequencies {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, stat) in &self.0 { map.serialize_entry(name, stat)?; }
        map.end()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStatistics {
    pub skills: SkillFrequencies,
    pub total_unique_skills: usize,
    pub average_skills_per_job: f64,
}
