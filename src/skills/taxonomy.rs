use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::SkillKind;

const TECHNICAL: &[&str] = &[
    // languages
    "PHP", "Python", "JavaScript", "Java", "C++", "C#", "Ruby", "Go", "Rust",
    "TypeScript", "Swift", "Kotlin", "Scala", "R", "MATLAB",
    // web frameworks
    "Laravel", "Django", "Flask", "FastAPI", "React", "Vue.js", "Angular",
    "Node.js", "Express.js", "Spring Boot", "ASP.NET", "Ruby on Rails",
    // databases
    "MySQL", "PostgreSQL", "MongoDB", "Redis", "SQLite", "Oracle",
    "SQL Server", "MariaDB", "Cassandra", "DynamoDB",
    // devops and tooling
    "Docker", "Kubernetes", "Git", "GitHub", "GitLab", "Jenkins", "CI/CD",
    "AWS", "Azure", "Google Cloud", "Terraform", "Ansible",
    // frontend
    "HTML", "CSS", "SASS", "LESS", "Bootstrap", "Tailwind CSS", "jQuery",
    "Webpack", "Vite", "Next.js", "Nuxt.js",
    // mobile
    "React Native", "Flutter", "iOS", "Android", "Xamarin",
    // other
    "REST API", "GraphQL", "WebSockets", "Microservices", "OAuth",
    "JWT", "Testing", "Unit Testing", "TDD", "Agile", "Scrum",
];

const SOFT: &[&str] = &[
    "Communication", "Teamwork", "Leadership", "Problem Solving",
    "Time Management", "Critical Thinking", "Creativity", "Adaptability",
    "Work Ethic", "Attention to Detail", "Collaboration", "Interpersonal Skills",
    "Organizational Skills", "Decision Making", "Conflict Resolution",
    "Presentation Skills", "Analytical Skills", "Self-Motivation",
];

/// The controlled vocabulary skills are matched against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    #[serde(default)]
    pub technical: Vec<String>,
    #[serde(default)]
    pub soft: Vec<String>,
}

impl Taxonomy {
    pub fn builtin() -> Self {
        Taxonomy {
            technical: TECHNICAL.iter().map(|s| s.to_string()).collect(),
            soft: SOFT.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn empty() -> Self { Self::default() }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read taxonomy {}", path.display()))?;
        let tax: Taxonomy = serde_json::from_str(&raw)
            .with_context(|| format!("parse taxonomy {}", path.display()))?;
        Ok(tax)
    }

    pub fn is_empty(&self) -> bool { self.technical.is_empty() && self.soft.is_empty() }

    /// Every entry with the kind its list assigns, technical first.
    pub fn entries(&self) -> impl Iterator<Item = (&str, SkillKind)> {
        self.technical.iter().map(|s| (s.as_str(), SkillKind::Technical))
            .chain(self.soft.iter().map(|s| (s.as_str(), SkillKind::Soft)))
    }

    /// Case-insensitive lookup returning the canonical spelling.
    pub fn lookup(&self, name: &str) -> Option<(&str, SkillKind)> {
        let needle = name.trim().to_lowercase();
        self.entries().find(|(entry, _)| entry.to_lowercase() == needle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandCategory {
    Essential,
    Important,
    NiceToHave,
}

impl DemandCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DemandCategory::Essential => "essential",
            DemandCategory::Important => "important",
            DemandCategory::NiceToHave => "nice_to_have",
        }
    }
}

/// `> 70` essential, `40..=70` important, anything lower nice to have.
pub fn categorize_by_demand(percentage: f64) -> DemandCategory {
    if percentage > 70.0 {
        DemandCategory::Essential
    } else if percentage >= 40.0 {
        DemandCategory::Important
    } else {
        DemandCategory::NiceToHave
    }
}
