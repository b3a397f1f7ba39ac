//! Template Renderer: binds parsed resumes and cover letters into the fixed templates.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use crate::latex::escape::escape_latex;
use crate::latex::template::Template;
use crate::latex::templates::{COVER_LETTER_TEMPLATE, RESUME_TEMPLATE};
use crate::resume::{is_latex_content, parse, ParsedResume};

static RESUME: Lazy<Template> = Lazy::new(|| Template::compile(RESUME_TEMPLATE));
static COVER_LETTER: Lazy<Template> = Lazy::new(|| Template::compile(COVER_LETTER_TEMPLATE));

/// Cover letter text plus the addressee details.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverLetterRequest {
    pub content: String,
    pub company: String,
    #[serde(default)]
    pub hiring_manager: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Failed to extract text from PDF: {0}")]
    Extract(String),

    #[error("PDF contains no extractable text")]
    EmptyText,
}

// ────────────────────────────────────────────────────────────────────────────
// Resume
// ────────────────────────────────────────────────────────────────────────────

/// Non-empty contact fields, escaped and joined with ` $|$ `.
pub fn contact_line(resume: &ParsedResume) -> String {
    [
        &resume.email,
        &resume.phone,
        &resume.location,
        &resume.linkedin,
        &resume.github,
        &resume.website,
    ]
    .iter()
    .filter(|field| !field.trim().is_empty())
    .map(|field| escape_latex(field.trim()))
    .collect::<Vec<_>>()
    .join(" $|$ ")
}

fn resume_data(resume: &ParsedResume) -> Value {
    json!({
        "name": resume.name,
        "contact_line": contact_line(resume),
        "summary": resume.summary,
        "education": resume.education,
        "skills": resume.skills,
        "experience": resume.experience,
        "projects": resume.projects,
    })
}

pub fn render_resume(resume: &ParsedResume) -> String {
    RESUME.render(&resume_data(resume))
}

/// Parses plain resume text and renders it into the resume template.
pub fn generate_resume_latex(content: &str) -> String {
    render_resume(&parse(content))
}

/// LaTeX source for a resume: content that is already LaTeX passes through
/// untouched, plain text is parsed and rendered.
pub fn resume_latex(content: &str) -> String {
    if is_latex_content(content) {
        debug!("Resume content is already LaTeX, passing through");
        return content.to_string();
    }
    generate_resume_latex(content)
}

// ────────────────────────────────────────────────────────────────────────────
// Cover letter
// ────────────────────────────────────────────────────────────────────────────

/// Splits the letter on blank lines; each paragraph is trimmed and escaped.
pub fn format_cover_letter_body(content: &str) -> String {
    let normalized = content.replace("\r\n", "\n");
    normalized
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(escape_latex)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Renders the cover letter; the header reuses the contact block of `resume_content`.
pub fn generate_cover_letter_latex(letter: &CoverLetterRequest, resume_content: &str) -> String {
    let resume = parse(resume_content);
    let data = json!({
        "name": resume.name,
        "contact_line": contact_line(&resume),
        "company": letter.company,
        "hiring_manager": letter.hiring_manager.as_deref().unwrap_or("").trim(),
        "body": format_cover_letter_body(&letter.content),
    });
    COVER_LETTER.render(&data)
}

// ────────────────────────────────────────────────────────────────────────────
// PDF → LaTeX
// ────────────────────────────────────────────────────────────────────────────

/// Extracts the text of an uploaded PDF resume and renders it as LaTeX.
/// CPU-bound; callers on the async runtime should use `spawn_blocking`.
pub fn convert_pdf_to_latex(pdf: &[u8]) -> Result<String, ConversionError> {
    let text = pdf_extract::extract_text_from_mem(pdf)
        .map_err(|e| ConversionError::Extract(e.to_string()))?;
    let text = text.trim();
    if text.is_empty() {
        return Err(ConversionError::EmptyText);
    }
    Ok(generate_resume_latex(text))
}
