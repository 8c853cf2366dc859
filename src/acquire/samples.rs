//! Canned job listings for exercising the pipeline without network access.

use crate::model::{NormalizedJob, SkillKind, SkillSet};
use crate::skills::taxonomy::Taxonomy;

pub const SAMPLE_SOURCE: &str = "samples";

struct Template {
    title: &'static str,
    company: &'static str,
    description: &'static str,
    skills: &'static [&'static str],
}

const TEMPLATES: &[Template] = &[
    Template {
        title: "Senior PHP Developer",
        company: "TechCorp Egypt",
        description: "We are looking for a Senior PHP Developer with Laravel experience. Must have strong knowledge of MySQL, Docker, and Git. Good communication skills required.",
        skills: &["PHP", "Laravel", "MySQL", "Docker", "Git", "Communication"],
    },
    Template {
        title: "Full Stack Developer",
        company: "Digital Solutions",
        description: "Full stack position requiring React, Node.js, and MongoDB experience. FastAPI knowledge is a plus. Teamwork and problem solving essential.",
        skills: &["React", "Node.js", "MongoDB", "FastAPI", "Teamwork", "Problem Solving"],
    },
    Template {
        title: "Python Backend Developer",
        company: "AI Innovations",
        description: "Python developer needed for microservices development. Experience with FastAPI, PostgreSQL, and AWS required. Leadership qualities valued.",
        skills: &["Python", "FastAPI", "PostgreSQL", "AWS", "Microservices", "Leadership"],
    },
    Template {
        title: "DevOps Engineer",
        company: "Cloud Systems",
        description: "DevOps role focusing on Kubernetes, Docker, and CI/CD pipelines. Jenkins and Terraform experience required.",
        skills: &["Kubernetes", "Docker", "CI/CD", "Jenkins", "Terraform", "AWS"],
    },
    Template {
        title: "Frontend Developer",
        company: "WebDev Studio",
        description: "Frontend developer with Vue.js and React expertise. HTML, CSS, and JavaScript fundamentals required. Creativity important.",
        skills: &["Vue.js", "React", "HTML", "CSS", "JavaScript", "Creativity"],
    },
];

/// Up to `count` listings cycled from the templates, at most two rounds.
/// Skill kinds come from `taxonomy`; names it does not know count as technical.
pub fn sample_jobs(count: usize, taxonomy: &Taxonomy) -> Vec<NormalizedJob> {
    let n = count.min(TEMPLATES.len() * 2);
    (0..n)
        .filter_map(|i| {
            let t = &TEMPLATES[i % TEMPLATES.len()];
            let mut skills = SkillSet::new();
            for &name in t.skills {
                let kind = taxonomy.lookup(name).map(|(_, k)| k).unwrap_or(SkillKind::Technical);
                skills.insert(name, kind);
            }
            let company = format!("{} #{}", t.company, i / TEMPLATES.len() + 1);
            let url = format!("https://wuzzuf.net/jobs/sample-{i}");
            NormalizedJob::build(t.title, Some(&company), Some(t.description), Some(&url), SAMPLE_SOURCE, skills).ok()
        })
        .collect()
}
