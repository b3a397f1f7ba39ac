//! Section Formatters: turn the raw text of one resume section into a LaTeX fragment.
//!
//! Every formatter is split in two halves: `parse_*` recognises entries with line
//! heuristics and returns typed entries, `render_*` turns entries into LaTeX. The
//! one-page limiter runs between the two. `format_*` chains both for callers that
//! only want the fragment.
//!
//! Formatters never fail. A line that matches no structural heuristic is either
//! attached to the entry in progress or dropped.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::latex::escape::escape_latex;

/// Leading characters that mark a line as a bullet.
const BULLET_MARKERS: &[char] = &['•', '-', '*', '–'];

/// Words that open a new education entry.
const INSTITUTION_KEYWORDS: &[&str] = &["university", "college", "institute", "school"];

/// Words that turn a `Name: ...` line into a skills category header.
const SKILL_CATEGORY_KEYWORDS: &[&str] = &[
    "languages",
    "technologies",
    "tools",
    "frameworks",
    "software",
    "systems",
];

const ITEMIZE_START: &str = r"\begin{itemize}[leftmargin=*, noitemsep, topsep=2pt]";
const ITEMIZE_END: &str = r"\end{itemize}";

static YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b((?:19|20)\d{2})\b").expect("year pattern is valid"));
static ONGOING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(present|current|ongoing)\b").expect("ongoing pattern is valid"));

// ────────────────────────────────────────────────────────────────────────────
// Line helpers
// ────────────────────────────────────────────────────────────────────────────

/// Returns the text after a leading bullet marker, or `None` for a non-bullet line.
pub fn strip_bullet(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    trimmed
        .strip_prefix(BULLET_MARKERS)
        .map(|rest| rest.trim())
}

/// A "title line" carries `|`-separated fields and is not itself a bullet.
fn is_title_line(line: &str) -> bool {
    line.contains('|') && strip_bullet(line).is_none()
}

fn split_fields(line: &str) -> Vec<String> {
    line.split('|').map(|part| part.trim().to_string()).collect()
}

fn non_empty_lines(raw: &str) -> impl Iterator<Item = &str> {
    raw.lines().map(str::trim).filter(|line| !line.is_empty())
}

/// True when the text reads as a date or date range.
pub fn looks_like_date(text: &str) -> bool {
    YEAR_RE.is_match(text) || ONGOING_RE.is_match(text)
}

fn render_bullets(out: &mut String, bullets: &[String]) {
    if bullets.is_empty() {
        return;
    }
    out.push('\n');
    out.push_str(ITEMIZE_START);
    for bullet in bullets {
        out.push_str("\n  \\item ");
        out.push_str(&escape_latex(bullet));
    }
    out.push('\n');
    out.push_str(ITEMIZE_END);
}

// ────────────────────────────────────────────────────────────────────────────
// Summary
// ────────────────────────────────────────────────────────────────────────────

/// Joins the summary lines into a single escaped paragraph.
pub fn format_summary(raw: &str) -> String {
    let joined = non_empty_lines(raw)
        .map(|line| strip_bullet(line).unwrap_or(line))
        .collect::<Vec<_>>()
        .join(" ");
    escape_latex(&joined)
}

// ────────────────────────────────────────────────────────────────────────────
// Education
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    pub institution: String,
    pub location: String,
    pub degree: String,
    pub date: String,
}

fn names_institution(line: &str) -> bool {
    let lower = line.to_lowercase();
    INSTITUTION_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Groups education lines into entries, one per institution line.
///
/// Lines after an institution line are pipe-joined into that entry's details
/// until the next institution line. Lines before the first institution are dropped.
pub fn parse_education(raw: &str) -> Vec<EducationEntry> {
    // (institution line, pipe-joined details)
    let mut groups: Vec<(String, String)> = Vec::new();

    for line in non_empty_lines(raw) {
        let text = strip_bullet(line).unwrap_or(line);
        if names_institution(text) {
            groups.push((text.to_string(), String::new()));
        } else if let Some((_, details)) = groups.last_mut() {
            if !details.is_empty() {
                details.push_str(" | ");
            }
            details.push_str(text);
        }
    }

    groups
        .into_iter()
        .map(|(head, details)| build_education_entry(&head, &details))
        .collect()
}

fn build_education_entry(head: &str, details: &str) -> EducationEntry {
    let mut head_fields = split_fields(head).into_iter();
    let mut entry = EducationEntry {
        institution: head_fields.next().unwrap_or_default(),
        ..Default::default()
    };
    let mut extras: Vec<String> = Vec::new();

    for field in head_fields {
        if field.is_empty() {
            continue;
        }
        if entry.date.is_empty() && looks_like_date(&field) {
            entry.date = field;
        } else if entry.location.is_empty() {
            entry.location = field;
        } else {
            extras.push(field);
        }
    }

    for field in details.split('|').map(str::trim).filter(|f| !f.is_empty()) {
        if entry.date.is_empty() && looks_like_date(field) {
            entry.date = field.to_string();
        } else if entry.degree.is_empty() {
            entry.degree = field.to_string();
        } else {
            extras.push(field.to_string());
        }
    }

    if !extras.is_empty() {
        let extras = extras.join("; ");
        if entry.degree.is_empty() {
            entry.degree = extras;
        } else {
            entry.degree = format!("{}; {}", entry.degree, extras);
        }
    }

    entry
}

impl EducationEntry {
    /// `\textbf{Institution} \hfill Location \\ Degree \hfill Date`
    pub fn to_latex(&self) -> String {
        let mut out = format!(
            "\\noindent\\textbf{{{}}} \\hfill {}",
            escape_latex(&self.institution),
            escape_latex(&self.location)
        );
        if !self.degree.is_empty() || !self.date.is_empty() {
            out.push_str(&format!(
                " \\\\ {} \\hfill {}",
                escape_latex(&self.degree),
                escape_latex(&self.date)
            ));
        }
        out
    }
}

pub fn render_education(entries: &[EducationEntry]) -> String {
    entries
        .iter()
        .map(EducationEntry::to_latex)
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn format_education(raw: &str) -> String {
    render_education(&parse_education(raw))
}

// ────────────────────────────────────────────────────────────────────────────
// Skills
// ────────────────────────────────────────────────────────────────────────────

/// One `\item` of the skills list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SkillLine {
    /// `\item \textbf{Name:} a, b, c`
    Category { name: String, items: Vec<String> },
    /// `\item text` for skills outside any category.
    Item(String),
}

/// Returns the category name and any inline items when `line` is a category header.
fn skill_category(line: &str) -> Option<(String, Vec<String>)> {
    let (head, tail) = line.split_once(':')?;
    let head_lower = head.to_lowercase();
    if !SKILL_CATEGORY_KEYWORDS.iter().any(|kw| head_lower.contains(kw)) {
        return None;
    }
    let items = tail
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect();
    Some((head.trim().to_string(), items))
}

pub fn parse_skills(raw: &str) -> Vec<SkillLine> {
    let mut lines: Vec<SkillLine> = Vec::new();
    // Index into `lines` of the active category.
    let mut active: Option<usize> = None;

    for line in non_empty_lines(raw) {
        let text = strip_bullet(line).unwrap_or(line);
        if let Some((name, items)) = skill_category(text) {
            lines.push(SkillLine::Category { name, items });
            active = Some(lines.len() - 1);
            continue;
        }
        match active.and_then(|idx| lines.get_mut(idx)) {
            Some(SkillLine::Category { items, .. }) => items.push(text.to_string()),
            _ => lines.push(SkillLine::Item(text.to_string())),
        }
    }

    lines
        .into_iter()
        .filter(|line| !matches!(line, SkillLine::Category { items, .. } if items.is_empty()))
        .collect()
}

impl SkillLine {
    pub fn to_latex(&self) -> String {
        match self {
            SkillLine::Category { name, items } => format!(
                "\\item \\textbf{{{}:}} {}",
                escape_latex(name),
                escape_latex(&items.join(", "))
            ),
            SkillLine::Item(text) => format!("\\item {}", escape_latex(text)),
        }
    }
}

pub fn render_skills(lines: &[SkillLine]) -> String {
    lines
        .iter()
        .map(SkillLine::to_latex)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_skills(raw: &str) -> String {
    render_skills(&parse_skills(raw))
}

// ────────────────────────────────────────────────────────────────────────────
// Experience
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub title: String,
    pub company: String,
    pub dates: String,
    pub location: String,
    /// Free text that was neither a title line nor a bullet.
    pub summary: String,
    pub bullets: Vec<String>,
}

fn append_free_text(target: &mut String, text: &str) {
    if !target.is_empty() {
        target.push(' ');
    }
    target.push_str(text);
}

/// Title lines open an entry: `Title | Company | Dates | Location`.
/// Bullets nest under the entry in progress; the entry is flushed at the next
/// title line or at end of input.
pub fn parse_experience(raw: &str) -> Vec<ExperienceEntry> {
    let mut entries: Vec<ExperienceEntry> = Vec::new();

    for line in non_empty_lines(raw) {
        if is_title_line(line) {
            let mut fields = split_fields(line).into_iter();
            entries.push(ExperienceEntry {
                title: fields.next().unwrap_or_default(),
                company: fields.next().unwrap_or_default(),
                dates: fields.next().unwrap_or_default(),
                location: fields.next().unwrap_or_default(),
                ..Default::default()
            });
            continue;
        }
        let Some(entry) = entries.last_mut() else {
            continue;
        };
        match strip_bullet(line) {
            Some(bullet) if !bullet.is_empty() => entry.bullets.push(bullet.to_string()),
            Some(_) => {}
            None => match entry.bullets.last_mut() {
                Some(last) => append_free_text(last, line),
                None => append_free_text(&mut entry.summary, line),
            },
        }
    }

    entries
}

impl ExperienceEntry {
    pub fn to_latex(&self) -> String {
        let mut out = if self.company.is_empty() {
            format!(
                "\\noindent\\textbf{{{}}} \\hfill {}",
                escape_latex(&self.title),
                escape_latex(&self.dates)
            )
        } else {
            format!(
                "\\noindent\\textbf{{{}}} \\hfill {} \\\\\n\\textit{{{}}} \\hfill {}",
                escape_latex(&self.company),
                escape_latex(&self.dates),
                escape_latex(&self.title),
                escape_latex(&self.location)
            )
        };
        if !self.summary.is_empty() {
            out.push_str(&format!(" \\\\\n{{\\small {}}}", escape_latex(&self.summary)));
        }
        render_bullets(&mut out, &self.bullets);
        out
    }
}

pub fn render_experience(entries: &[ExperienceEntry]) -> String {
    entries
        .iter()
        .map(ExperienceEntry::to_latex)
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn format_experience(raw: &str) -> String {
    render_experience(&parse_experience(raw))
}

// ────────────────────────────────────────────────────────────────────────────
// Projects
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectEntry {
    pub name: String,
    /// Non-date title fields (technologies, organisation), comma-joined.
    pub stack: String,
    pub date: String,
    pub summary: String,
    pub bullets: Vec<String>,
}

impl ProjectEntry {
    /// Key used to detect the same project listed twice.
    pub fn dedupe_key(&self) -> Option<String> {
        self.bullets.first().map(|b| b.trim().to_lowercase())
    }

    pub fn to_latex(&self) -> String {
        let mut out = format!("\\noindent\\textbf{{{}}}", escape_latex(&self.name));
        if !self.stack.is_empty() {
            out.push_str(&format!(" $|$ \\textit{{{}}}", escape_latex(&self.stack)));
        }
        out.push_str(&format!(" \\hfill {}", escape_latex(&self.date)));
        if !self.summary.is_empty() {
            out.push_str(&format!(" \\\\\n{{\\small {}}}", escape_latex(&self.summary)));
        }
        render_bullets(&mut out, &self.bullets);
        out
    }
}

/// Projects must read as completed: an ongoing date or a year past
/// `current_year` becomes `current_year - 1`.
pub fn coerce_project_date(date: &str, current_year: i32) -> String {
    let in_future = YEAR_RE
        .captures_iter(date)
        .filter_map(|caps| caps[1].parse::<i32>().ok())
        .any(|year| year > current_year);
    if in_future || ONGOING_RE.is_match(date) {
        (current_year - 1).to_string()
    } else {
        date.to_string()
    }
}

/// Same line grammar as experience, but title fields are `Name | Stack... | Date`
/// where the date may sit in any position after the name.
pub fn parse_projects(raw: &str, current_year: i32) -> Vec<ProjectEntry> {
    let mut entries: Vec<ProjectEntry> = Vec::new();

    for line in non_empty_lines(raw) {
        if is_title_line(line) {
            let mut fields = split_fields(line).into_iter();
            let mut entry = ProjectEntry {
                name: fields.next().unwrap_or_default(),
                ..Default::default()
            };
            let mut stack: Vec<String> = Vec::new();
            for field in fields.filter(|f| !f.is_empty()) {
                if entry.date.is_empty() && looks_like_date(&field) {
                    entry.date = coerce_project_date(&field, current_year);
                } else {
                    stack.push(field);
                }
            }
            entry.stack = stack.join(", ");
            entries.push(entry);
            continue;
        }
        let Some(entry) = entries.last_mut() else {
            continue;
        };
        match strip_bullet(line) {
            Some(bullet) if !bullet.is_empty() => entry.bullets.push(bullet.to_string()),
            Some(_) => {}
            None => match entry.bullets.last_mut() {
                Some(last) => append_free_text(last, line),
                None => append_free_text(&mut entry.summary, line),
            },
        }
    }

    entries
}

pub fn render_projects(entries: &[ProjectEntry]) -> String {
    entries
        .iter()
        .map(ProjectEntry::to_latex)
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn format_projects(raw: &str, current_year: i32) -> String {
    render_projects(&parse_projects(raw, current_year))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
