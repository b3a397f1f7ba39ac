//! Resume Parser: turns free-form resume text into a `ParsedResume`.
//!
//! Extraction is best-effort: the parser never fails, an input it cannot make
//! sense of yields a sparsely populated record.
//!
//! Section detection is a fold over the lines with `SectionFold` as the state:
//! a header line switches the current section, every other non-empty line is
//! appended to the current section's buffer (or dropped when there is none).

use std::collections::BTreeMap;

use chrono::{Datelike, Local};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::resume::limiter::OnePageLimits;
use crate::resume::sections::{
    format_summary, parse_education, parse_experience, parse_projects, parse_skills,
    render_education, render_experience, render_projects, render_skills, strip_bullet,
};

/// Contact fields are only looked for in this many lines after the name.
const CONTACT_SCAN_LINES: usize = 10;
/// Shortest text accepted as a location.
const MIN_LOCATION_LEN: usize = 4;
/// Longer lines are treated as content even if they mention a section keyword.
const MAX_HEADER_WORDS: usize = 5;

// ────────────────────────────────────────────────────────────────────────────
// Section keys and header table
// ────────────────────────────────────────────────────────────────────────────

/// Canonical resume category used to bucket parsed lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKey {
    Education,
    Skills,
    /// "TECHNICAL ..." headers; fallback buffer for skills.
    Technical,
    /// "PROGRAMMING ..." headers; second fallback buffer for skills.
    Programming,
    Experience,
    Projects,
    Summary,
    Certifications,
    Awards,
    Volunteer,
}

struct HeaderRule {
    keyword: &'static str,
    key: SectionKey,
}

const fn rule(keyword: &'static str, key: SectionKey) -> HeaderRule {
    HeaderRule { keyword, key }
}

/// Tested in order; the first keyword found in the upper-cased line wins.
/// Order: education > skills > experience > projects > summary >
/// certifications > awards > volunteer.
const SECTION_HEADERS: &[HeaderRule] = &[
    rule("EDUCATION", SectionKey::Education),
    rule("ACADEMIC", SectionKey::Education),
    rule("SKILLS", SectionKey::Skills),
    rule("TECHNICAL", SectionKey::Technical),
    rule("PROGRAMMING", SectionKey::Programming),
    rule("LANGUAGES", SectionKey::Skills),
    rule("COMPETENCIES", SectionKey::Skills),
    rule("EXPERIENCE", SectionKey::Experience),
    rule("EMPLOYMENT", SectionKey::Experience),
    rule("WORK HISTORY", SectionKey::Experience),
    rule("PROJECTS", SectionKey::Projects),
    rule("SUMMARY", SectionKey::Summary),
    rule("PROFILE", SectionKey::Summary),
    rule("OBJECTIVE", SectionKey::Summary),
    rule("CERTIFICATION", SectionKey::Certifications),
    rule("AWARDS", SectionKey::Awards),
    rule("HONORS", SectionKey::Awards),
    rule("ACHIEVEMENTS", SectionKey::Awards),
    rule("VOLUNTEER", SectionKey::Volunteer),
];

/// Returns the section a header line opens, or `None` for a content line.
///
/// Header lines are short, carry no `:`/`|` and are not bullets, so that
/// `Languages: Rust, Go` or `Engineer | Acme` stay content.
pub fn detect_section_header(line: &str) -> Option<SectionKey> {
    let line = line.trim();
    if line.is_empty()
        || line.contains(':')
        || line.contains('|')
        || strip_bullet(line).is_some()
        || line.split_whitespace().count() > MAX_HEADER_WORDS
    {
        return None;
    }
    let upper = line.to_uppercase();
    SECTION_HEADERS
        .iter()
        .find(|rule| upper.contains(rule.keyword))
        .map(|rule| rule.key)
}

// ────────────────────────────────────────────────────────────────────────────
// Section fold
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SectionFold {
    pub current: Option<SectionKey>,
    pub buffers: BTreeMap<SectionKey, String>,
}

impl SectionFold {
    /// Consumes one line and returns the next state.
    pub fn step(mut self, line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return self;
        }
        if let Some(key) = detect_section_header(line) {
            self.current = Some(key);
            return self;
        }
        if let Some(key) = self.current {
            let buffer = self.buffers.entry(key).or_default();
            if !buffer.is_empty() {
                buffer.push('\n');
            }
            buffer.push_str(line);
        }
        self
    }
}

/// Buckets every line of `text` into its section buffer.
pub fn split_sections(text: &str) -> BTreeMap<SectionKey, String> {
    text.lines()
        .fold(SectionFold::default(), SectionFold::step)
        .buffers
}

// ────────────────────────────────────────────────────────────────────────────
// Contact block
// ────────────────────────────────────────────────────────────────────────────

static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(\s*\+?\d{1,4}\s*\)\s*\d[\d\s.\-]{4,}\d|^\+?\d[\d\s.\-]{8,}\d$")
        .expect("phone pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContactField {
    Email,
    Phone,
    Linkedin,
    Github,
    Website,
}

struct ContactPattern {
    field: ContactField,
    matches: fn(&str) -> bool,
}

fn is_email(piece: &str) -> bool {
    piece.contains('@')
}

fn is_phone(piece: &str) -> bool {
    PHONE_RE.is_match(piece)
}

fn is_linkedin(piece: &str) -> bool {
    piece.to_lowercase().contains("linkedin.com")
}

fn is_github(piece: &str) -> bool {
    piece.to_lowercase().contains("github.com")
}

fn is_website(piece: &str) -> bool {
    let lower = piece.to_lowercase();
    lower.contains("www.") || lower.starts_with("http://") || lower.starts_with("https://")
}

/// Tested in order against each piece of a contact line.
const CONTACT_PATTERNS: &[ContactPattern] = &[
    ContactPattern { field: ContactField::Email, matches: is_email },
    ContactPattern { field: ContactField::Phone, matches: is_phone },
    ContactPattern { field: ContactField::Linkedin, matches: is_linkedin },
    ContactPattern { field: ContactField::Github, matches: is_github },
    ContactPattern { field: ContactField::Website, matches: is_website },
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: String,
    pub phone: String,
    pub location: String,
    pub linkedin: String,
    pub github: String,
    pub website: String,
}

impl ContactInfo {
    fn slot(&mut self, field: ContactField) -> &mut String {
        match field {
            ContactField::Email => &mut self.email,
            ContactField::Phone => &mut self.phone,
            ContactField::Linkedin => &mut self.linkedin,
            ContactField::Github => &mut self.github,
            ContactField::Website => &mut self.website,
        }
    }

    /// First match wins per field; a filled field is never overwritten.
    fn absorb(&mut self, piece: &str) {
        if let Some(pattern) = CONTACT_PATTERNS.iter().find(|p| (p.matches)(piece)) {
            let slot = self.slot(pattern.field);
            if slot.is_empty() {
                *slot = piece.to_string();
            }
            return;
        }
        if self.location.is_empty() && piece.chars().count() >= MIN_LOCATION_LEN {
            self.location = piece.to_string();
        }
    }
}

/// Scans the lines following the name for contact details.
/// Stops at the first section header; bullet lines are skipped.
/// A line such as `jane@x.com | (555) 123-4567` is split on `|` and each piece
/// is classified on its own.
fn extract_contact(lines: &[&str]) -> ContactInfo {
    let mut contact = ContactInfo::default();
    let end = lines.len().min(CONTACT_SCAN_LINES);

    for line in lines.iter().take(end).skip(1) {
        let line = line.trim();
        if line.is_empty() || strip_bullet(line).is_some() {
            continue;
        }
        if detect_section_header(line).is_some() {
            break;
        }
        for piece in line.split('|').map(str::trim).filter(|p| !p.is_empty()) {
            contact.absorb(piece);
        }
    }

    contact
}

// ────────────────────────────────────────────────────────────────────────────
// ParsedResume
// ────────────────────────────────────────────────────────────────────────────

/// Structured view of one resume, produced per request and consumed once by the renderer.
///
/// `summary`, `education`, `skills`, `experience` and `projects` are LaTeX
/// fragments with the one-page limiter already applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedResume {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub linkedin: String,
    pub github: String,
    pub website: String,
    pub sections: BTreeMap<SectionKey, String>,
    pub summary: String,
    pub education: String,
    pub skills: String,
    pub experience: String,
    pub projects: String,
}

impl ParsedResume {
    /// Raw text of a section, or "" when the resume has none.
    pub fn section(&self, key: SectionKey) -> &str {
        self.sections.get(&key).map(String::as_str).unwrap_or("")
    }

    /// First non-empty buffer among `keys`.
    fn first_section(&self, keys: &[SectionKey]) -> &str {
        keys.iter()
            .map(|key| self.section(*key))
            .find(|text| !text.trim().is_empty())
            .unwrap_or("")
    }
}

/// Parses `text` with the default one-page limits and today's year.
pub fn parse(text: &str) -> ParsedResume {
    parse_with(text, &OnePageLimits::default(), Local::now().year())
}

/// Parses `text`; `current_year` drives the project-date rule.
pub fn parse_with(text: &str, limits: &OnePageLimits, current_year: i32) -> ParsedResume {
    let lines: Vec<&str> = text.lines().collect();
    let name = lines.first().map(|l| l.trim().to_string()).unwrap_or_default();
    let contact = extract_contact(&lines);

    let mut resume = ParsedResume {
        name,
        email: contact.email,
        phone: contact.phone,
        location: contact.location,
        linkedin: contact.linkedin,
        github: contact.github,
        website: contact.website,
        sections: split_sections(text),
        ..Default::default()
    };

    let summary_raw = resume.section(SectionKey::Summary).to_string();
    let education_raw = resume.section(SectionKey::Education).to_string();
    let skills_raw = resume
        .first_section(&[SectionKey::Skills, SectionKey::Technical, SectionKey::Programming])
        .to_string();
    let experience_raw = resume.section(SectionKey::Experience).to_string();
    let projects_raw = resume.section(SectionKey::Projects).to_string();

    resume.summary = format_summary(&summary_raw);
    resume.education = render_education(&parse_education(&education_raw));
    resume.skills = render_skills(&limits.limit_skills(parse_skills(&skills_raw)));
    resume.experience = render_experience(&limits.limit_experience(parse_experience(&experience_raw)));
    resume.projects = render_projects(&limits.limit_projects(parse_projects(&projects_raw, current_year)));

    resume
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const JANE: &str = "Jane Doe\njane@x.com\n(555) 123-4567\nSan Francisco, CA\nEDUCATION\nMIT University\nSKILLS\n• Python\n• Go\nEXPERIENCE\nEngineer | Acme | 2020-2022\n• Built things\n";

    #[test]
    fn test_scenario_contact_and_sections() {
        let resume = parse_with(JANE, &OnePageLimits::default(), 2026);
        assert_eq!(resume.name, "Jane Doe");
        assert_eq!(resume.email, "jane@x.com");
        assert_eq!(resume.phone, "(555) 123-4567");
        assert_eq!(resume.location, "San Francisco, CA");
        assert_eq!(resume.skills.matches(r"\item").count(), 2);
        assert_eq!(resume.experience.matches(r"\textbf{Acme}").count(), 1);
        assert!(resume.experience.contains(r"\item Built things"));
        assert!(resume.education.contains(r"\textbf{MIT University}"));
    }

    #[test]
    fn test_empty_input_yields_blank_record() {
        let resume = parse("");
        assert_eq!(resume, ParsedResume::default());
    }

    #[test]
    fn test_parse_is_deterministic() {
        let a = parse_with(JANE, &OnePageLimits::default(), 2026);
        let b = parse_with(JANE, &OnePageLimits::default(), 2026);
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_header_detection() {
        assert_eq!(detect_section_header("EDUCATION"), Some(SectionKey::Education));
        assert_eq!(detect_section_header("Technical Skills"), Some(SectionKey::Skills));
        assert_eq!(detect_section_header("TECHNICAL"), Some(SectionKey::Technical));
        assert_eq!(
            detect_section_header("Programming Languages"),
            Some(SectionKey::Programming)
        );
        assert_eq!(
            detect_section_header("Professional Experience"),
            Some(SectionKey::Experience)
        );
        assert_eq!(detect_section_header("Personal Projects"), Some(SectionKey::Projects));
        assert_eq!(detect_section_header("Volunteer Work"), Some(SectionKey::Volunteer));
    }

    #[test]
    fn test_header_priority_prefers_education() {
        assert_eq!(
            detect_section_header("Education & Skills"),
            Some(SectionKey::Education)
        );
        assert_eq!(
            detect_section_header("Projects and Experience"),
            Some(SectionKey::Experience)
        );
    }

    #[test]
    fn test_content_lines_are_not_headers() {
        assert_eq!(detect_section_header("Languages: Rust, Go"), None);
        assert_eq!(detect_section_header("Engineer | Acme | 2020"), None);
        assert_eq!(detect_section_header("• Led education outreach"), None);
        assert_eq!(
            detect_section_header("Built an education platform for rural schools"),
            None
        );
    }

    #[test]
    fn test_fold_step_by_step() {
        let state = SectionFold::default()
            .step("stray line")
            .step("SKILLS")
            .step("• Rust")
            .step("")
            .step("• Go");
        assert_eq!(state.current, Some(SectionKey::Skills));
        assert_eq!(state.buffers.len(), 1);
        assert_eq!(state.buffers[&SectionKey::Skills], "• Rust\n• Go");
    }

    #[test]
    fn test_lines_land_in_exactly_one_section() {
        let sections = split_sections("EDUCATION\nMIT University\nEXPERIENCE\nEngineer | Acme\nEDUCATION\nStanford University");
        assert_eq!(
            sections[&SectionKey::Education],
            "MIT University\nStanford University"
        );
        assert_eq!(sections[&SectionKey::Experience], "Engineer | Acme");
    }

    #[test]
    fn test_skills_fall_back_to_technical_then_programming() {
        let text = "Jane\nTECHNICAL\n• Rust\nPROGRAMMING\n• Go";
        let resume = parse_with(text, &OnePageLimits::default(), 2026);
        assert_eq!(resume.skills, r"\item Rust");

        let text = "Jane\nPROGRAMMING\n• Go";
        let resume = parse_with(text, &OnePageLimits::default(), 2026);
        assert_eq!(resume.skills, r"\item Go");
    }

    #[test]
    fn test_contact_first_match_wins_and_socials() {
        let text = "Jane Doe\njane@x.com | linkedin.com/in/jane\nother@y.com\ngithub.com/jane\nwww.jane.dev\nBerlin, Germany\nEXPERIENCE";
        let resume = parse(text);
        assert_eq!(resume.email, "jane@x.com");
        assert_eq!(resume.linkedin, "linkedin.com/in/jane");
        assert_eq!(resume.github, "github.com/jane");
        assert_eq!(resume.website, "www.jane.dev");
        assert_eq!(resume.location, "Berlin, Germany");
    }

    #[test]
    fn test_contact_scan_stops_at_first_header() {
        let text = "Jane Doe\nSUMMARY\nSeasoned engineer based in Austin";
        let resume = parse(text);
        assert!(resume.location.is_empty());
        assert_eq!(resume.summary, "Seasoned engineer based in Austin");
    }

    #[test]
    fn test_contact_scan_limited_to_first_lines() {
        let mut text = String::from("Jane Doe\n");
        for _ in 0..12 {
            text.push_str("--\n");
        }
        text.push_str("late@x.com\n");
        let resume = parse(&text);
        assert!(resume.email.is_empty());
    }

    #[test]
    fn test_limiter_applied_to_rendered_sections() {
        let text = "Jane\nSKILLS\n- a\n- b\n- c\n- d\n- e\n- f\n- g\nEXPERIENCE\nE1 | C1 | 2019\n- x\nE2 | C2 | 2020\n- y\nE3 | C3 | 2021\n- z\nPROJECTS\nP1 | 2020\n- same\nP2 | 2021\n- Same\nP3 | 2022\n- p3\nP4 | 2023\n- p4\nP5 | 2024\n- p5";
        let resume = parse_with(text, &OnePageLimits::default(), 2026);
        assert_eq!(resume.skills.matches(r"\item").count(), 5);
        assert_eq!(resume.experience.matches(r"\noindent").count(), 2);
        assert!(!resume.experience.contains("C3"));
        assert_eq!(resume.projects.matches(r"\noindent").count(), 3);
        assert!(resume.projects.contains(r"\textbf{P1}"));
        assert!(!resume.projects.contains(r"\textbf{P2}"));
        assert!(resume.projects.contains(r"\textbf{P4}"));
        assert!(!resume.projects.contains(r"\textbf{P5}"));
    }

    #[test]
    fn test_project_dates_never_future() {
        let text = "Jane\nPROJECTS\nTailor | Rust | 2024 - Present\n- shipped\nNext | 2031\n- planned";
        let resume = parse_with(text, &OnePageLimits::default(), 2026);
        assert_eq!(resume.projects.matches(r"\hfill 2025").count(), 2);
        assert!(!resume.projects.contains("Present"));
        assert!(!resume.projects.contains("2031"));
    }
}
