//! One-page limiter: caps per-section entry counts so the rendered resume fits one page.
//!
//! Caps: 5 skill lines, 2 experience entries, 3 project entries. Projects are
//! deduplicated on their first bullet before truncation so the kept entries are
//! distinct.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::resume::sections::{ExperienceEntry, ProjectEntry, SkillLine};

pub const MAX_SKILL_LINES: usize = 5;
pub const MAX_EXPERIENCE_ENTRIES: usize = 2;
pub const MAX_PROJECT_ENTRIES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnePageLimits {
    pub skill_lines: usize,
    pub experience_entries: usize,
    pub project_entries: usize,
}

impl Default for OnePageLimits {
    fn default() -> Self {
        Self {
            skill_lines: MAX_SKILL_LINES,
            experience_entries: MAX_EXPERIENCE_ENTRIES,
            project_entries: MAX_PROJECT_ENTRIES,
        }
    }
}

impl OnePageLimits {
    pub fn limit_skills(&self, mut lines: Vec<SkillLine>) -> Vec<SkillLine> {
        lines.truncate(self.skill_lines);
        lines
    }

    pub fn limit_experience(&self, mut entries: Vec<ExperienceEntry>) -> Vec<ExperienceEntry> {
        entries.truncate(self.experience_entries);
        entries
    }

    /// Drops later projects whose first bullet repeats an earlier one, then truncates.
    pub fn limit_projects(&self, entries: Vec<ProjectEntry>) -> Vec<ProjectEntry> {
        let mut seen: HashSet<String> = HashSet::new();
        entries
            .into_iter()
            .filter(|entry| match entry.dedupe_key() {
                Some(key) => seen.insert(key),
                None => true,
            })
            .take(self.project_entries)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(name: &str, first_bullet: Option<&str>) -> ProjectEntry {
        ProjectEntry {
            name: name.to_string(),
            bullets: first_bullet.map(|b| vec![b.to_string()]).unwrap_or_default(),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_caps() {
        let limits = OnePageLimits::default();
        assert_eq!(limits.skill_lines, 5);
        assert_eq!(limits.experience_entries, 2);
        assert_eq!(limits.project_entries, 3);
    }

    #[test]
    fn test_skills_capped_at_five() {
        let lines: Vec<SkillLine> = (0..8).map(|i| SkillLine::Item(format!("skill {i}"))).collect();
        let kept = OnePageLimits::default().limit_skills(lines);
        assert_eq!(kept.len(), 5);
        assert_eq!(kept[4], SkillLine::Item("skill 4".to_string()));
    }

    #[test]
    fn test_short_lists_untouched() {
        let limits = OnePageLimits::default();
        let lines = vec![SkillLine::Item("Rust".to_string())];
        assert_eq!(limits.limit_skills(lines.clone()), lines);
        assert!(limits.limit_experience(Vec::new()).is_empty());
    }

    #[test]
    fn test_experience_keeps_first_two() {
        let entries: Vec<ExperienceEntry> = ["A", "B", "C"]
            .iter()
            .map(|c| ExperienceEntry {
                company: c.to_string(),
                ..Default::default()
            })
            .collect();
        let kept = OnePageLimits::default().limit_experience(entries);
        let companies: Vec<_> = kept.iter().map(|e| e.company.as_str()).collect();
        assert_eq!(companies, vec!["A", "B"]);
    }

    #[test]
    fn test_projects_deduped_before_truncation() {
        let entries = vec![
            project("One", Some("Built a CLI")),
            project("One again", Some("  built a cli ")),
            project("Two", Some("Wrote a parser")),
            project("Three", Some("Shipped a server")),
            project("Four", Some("Trained a model")),
        ];
        let kept = OnePageLimits::default().limit_projects(entries);
        let names: Vec<_> = kept.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["One", "Two", "Three"]);
    }

    #[test]
    fn test_projects_without_bullets_are_not_duplicates() {
        let entries = vec![project("A", None), project("B", None)];
        assert_eq!(OnePageLimits::default().limit_projects(entries).len(), 2);
    }
}
