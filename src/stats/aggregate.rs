use std::collections::{HashMap, HashSet};

use crate::model::{NormalizedJob, SkillKind};
use crate::skills::taxonomy::categorize_by_demand;

use super::types::{BatchStatistics, SkillFrequencies, SkillFrequencyStat};

fn round2(v: f64) -> f64 { (v * 100.0).round() / 100.0 }

/// Per-skill demand over a batch. Each job counts a skill name once; ties
/// keep the order in which skills were first seen.
pub fn aggregate(jobs: &[NormalizedJob]) -> SkillFrequencies {
    if jobs.is_empty() { return SkillFrequencies::default(); }

    let mut order: Vec<(String, SkillKind)> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for job in jobs {
        let mut seen: HashSet<&str> = HashSet::new();
        for skill in &job.skills {
            if !seen.insert(skill.name.as_str()) { continue; }
            let count = counts.entry(skill.name.clone()).or_insert(0);
            if *count == 0 { order.push((skill.name.clone(), skill.kind)); }
            *count += 1;
        }
    }

    let total = jobs.len() as f64;
    let mut ranked: Vec<(String, SkillFrequencyStat)> = order
        .into_iter()
        .map(|(name, kind)| {
            let count = counts.get(&name).copied().unwrap_or(0);
            let raw = count as f64 / total * 100.0;
            let stat = SkillFrequencyStat { count, percentage: round2(raw), importance: categorize_by_demand(raw), kind };
            (name, stat)
        })
        .collect();
    // stable: equal percentages stay in discovery order
    ranked.sort_by(|a, b| b.1.percentage.total_cmp(&a.1.percentage));
    SkillFrequencies(ranked)
}

pub fn batch_statistics(jobs: &[NormalizedJob]) -> BatchStatistics {
    let skills = aggregate(jobs);
    let average = if jobs.is_empty() {
        0.0
    } else {
        round2(jobs.iter().map(|j| j.skills.len()).sum::<usize>() as f64 / jobs.len() as f64)
    };
    BatchStatistics { total_unique_skills: skills.len(), skills, average_skills_per_job: average }
}
