//! Validator / Metadata Extractor for LaTeX source.
//!
//! Validation never fails: every broken rule adds one human-readable error and
//! the caller decides whether to go on. Metadata fields absent from the source
//! stay `None`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static DOCUMENT_CLASS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\documentclass(?:\[([^\]]*)\])?\{([^}]+)\}").expect("documentclass pattern is valid")
});
static PACKAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\usepackage(?:\[[^\]]*\])?\{([^}]+)\}").expect("usepackage pattern is valid")
});
static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\title\{([^}]+)\}").expect("title pattern is valid"));

/// Required directives and the error reported when one is missing.
const REQUIRED_DIRECTIVES: &[(&str, &str)] = &[
    (r"\documentclass", r"Missing \documentclass declaration"),
    (r"\begin{document}", r"Missing \begin{document}"),
    (r"\end{document}", r"Missing \end{document}"),
];

pub const UNMATCHED_BRACES: &str = "Unmatched braces in LaTeX content";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatexMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packages: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Checks required directives and brace balance. Checks are independent.
pub fn validate(latex: &str) -> ValidationResult {
    let mut errors: Vec<String> = REQUIRED_DIRECTIVES
        .iter()
        .filter(|(directive, _)| !latex.contains(directive))
        .map(|(_, error)| error.to_string())
        .collect();

    let open = latex.matches('{').count();
    let close = latex.matches('}').count();
    if open != close {
        errors.push(UNMATCHED_BRACES.to_string());
    }

    ValidationResult {
        is_valid: errors.is_empty(),
        errors,
    }
}

pub fn extract_metadata(latex: &str) -> LatexMetadata {
    let mut metadata = LatexMetadata::default();

    if let Some(caps) = DOCUMENT_CLASS_RE.captures(latex) {
        metadata.document_class = caps.get(2).map(|m| m.as_str().to_string());
        metadata.options = caps.get(1).map(|m| m.as_str().to_string());
    }

    let packages: Vec<String> = PACKAGE_RE
        .captures_iter(latex)
        .map(|caps| caps[1].to_string())
        .collect();
    if !packages.is_empty() {
        metadata.packages = Some(packages);
    }

    metadata.title = TITLE_RE.captures(latex).map(|caps| caps[1].to_string());

    metadata
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = "\\documentclass[11pt,a4paper]{article}\n\\usepackage[utf8]{inputenc}\n\\usepackage{enumitem,xcolor}\n\\title{My Resume}\n\\begin{document}\nHello {world}\n\\end{document}";

    #[test]
    fn test_valid_document() {
        let result = validate(VALID);
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_each_failing_check_adds_exactly_one_error() {
        let cases = [
            (VALID.replace(r"\documentclass", r"\docclass"), r"Missing \documentclass declaration"),
            (VALID.replace(r"\begin{document}", r"\begin{doc}"), r"Missing \begin{document}"),
            (VALID.replace(r"\end{document}", r"\end{doc}"), r"Missing \end{document}"),
            (format!("{VALID}}}"), UNMATCHED_BRACES),
        ];
        for (source, expected) in cases {
            let result = validate(&source);
            assert!(!result.is_valid);
            assert_eq!(result.errors, vec![expected.to_string()]);
        }
    }

    #[test]
    fn test_empty_input_reports_all_directives() {
        let result = validate("");
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 3);
    }

    #[test]
    fn test_validation_result_serializes_camel_case() {
        let json = serde_json::to_value(validate(VALID)).unwrap();
        assert_eq!(json["isValid"], true);
        assert_eq!(json["errors"], serde_json::json!([]));
    }

    #[test]
    fn test_metadata_extraction() {
        let metadata = extract_metadata(VALID);
        assert_eq!(metadata.document_class.as_deref(), Some("article"));
        assert_eq!(metadata.options.as_deref(), Some("11pt,a4paper"));
        assert_eq!(
            metadata.packages,
            Some(vec!["inputenc".to_string(), "enumitem,xcolor".to_string()])
        );
        assert_eq!(metadata.title.as_deref(), Some("My Resume"));
    }

    #[test]
    fn test_metadata_without_options_or_title() {
        let metadata = extract_metadata("\\documentclass{report}\n\\begin{document}\\end{document}");
        assert_eq!(metadata.document_class.as_deref(), Some("report"));
        assert_eq!(metadata.options, None);
        assert_eq!(metadata.packages, None);
        assert_eq!(metadata.title, None);
    }

    #[test]
    fn test_absent_metadata_serializes_as_empty_object() {
        let json = serde_json::to_value(extract_metadata("plain text")).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }
}
