//! Content Classifier: decides whether a blob of resume text is already LaTeX source.

/// Control sequences whose presence marks text as LaTeX.
const LATEX_MARKERS: &[&str] = &[
    r"\documentclass",
    r"\begin{document}",
    r"\end{document}",
    r"\section",
    r"\subsection",
    r"\textbf",
    r"\textit",
    r"\item",
    r"\begin{itemize}",
    r"\begin{enumerate}",
];

/// Returns true if `text` contains at least one LaTeX marker.
/// Total over every input; absence of all markers means plain text.
pub fn is_latex_content(text: &str) -> bool {
    LATEX_MARKERS.iter().any(|marker| text.contains(marker))
}
