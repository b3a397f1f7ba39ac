//! Escaping of plain text before it is placed inside LaTeX source.

/// Escapes the characters LaTeX treats as special in running text.
///
/// Braces become `\textbraceleft{}`/`\textbraceright{}` rather than `\{`/`\}`,
/// so every replacement adds balanced `{}` pairs and escaped text never
/// changes the brace count of the document it lands in.
pub fn escape_latex(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 8);
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str(r"\textbackslash{}"),
            '&' => out.push_str(r"\&"),
            '%' => out.push_str(r"\%"),
            '$' => out.push_str(r"\$"),
            '#' => out.push_str(r"\#"),
            '_' => out.push_str(r"\_"),
            '{' => out.push_str(r"\textbraceleft{}"),
            '}' => out.push_str(r"\textbraceright{}"),
            '~' => out.push_str(r"\textasciitilde{}"),
            '^' => out.push_str(r"\textasciicircum{}"),
            _ => out.push(ch),
        }
    }
    out
}
