//! Logic-less template engine for the LaTeX templates.
//!
//! Supported tags:
//! - `{{field}}` inserts the field with LaTeX special characters escaped
//! - `{{{field}}}` inserts the field verbatim (for pre-rendered fragments)
//! - `{{#if field}} ... {{else}} ... {{/if}}` presence conditional
//!
//! Fields are looked up in a `serde_json::Value` by name or dotted path.
//! Unknown fields render as "". Anything that is not a well-formed tag,
//! including LaTeX's own `{`/`}` runs, is copied through untouched, so
//! rendering is total.

use serde_json::Value;

use crate::latex::escape::escape_latex;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Text(String),
    Var { name: String, raw: bool },
    If { name: String },
    Else { source: String },
    EndIf { source: String },
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Var { name: String, raw: bool },
    If {
        name: String,
        then: Vec<Node>,
        otherwise: Vec<Node>,
    },
}

/// A parsed template, reusable across renders.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    pub fn compile(source: &str) -> Self {
        let mut tokens = tokenize(source).into_iter();
        let (nodes, _) = parse_block(&mut tokens, false);
        Self { nodes }
    }

    pub fn render(&self, data: &Value) -> String {
        let mut out = String::new();
        render_nodes(&self.nodes, data, &mut out);
        out
    }
}

/// Compiles and renders `template` in one go.
pub fn render(template: &str, data: &Value) -> String {
    Template::compile(template).render(data)
}

// ────────────────────────────────────────────────────────────────────────────
// Tokenizer
// ────────────────────────────────────────────────────────────────────────────

fn is_ident(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// Tries to read one tag at the start of `input`. Returns the token and its byte length.
fn read_tag(input: &str) -> Option<(Token, usize)> {
    if let Some(rest) = input.strip_prefix("{{{") {
        if let Some(end) = rest.find("}}}") {
            let name = rest[..end].trim();
            if is_ident(name) {
                return Some((
                    Token::Var {
                        name: name.to_string(),
                        raw: true,
                    },
                    end + 6,
                ));
            }
        }
    }

    let rest = input.strip_prefix("{{")?;
    let end = rest.find("}}")?;
    let inner = rest[..end].trim();
    let len = end + 4;
    let source = input[..len].to_string();

    let token = if let Some(name) = inner.strip_prefix("#if ") {
        let name = name.trim();
        if !is_ident(name) {
            return None;
        }
        Token::If {
            name: name.to_string(),
        }
    } else if inner == "else" {
        Token::Else { source }
    } else if inner == "/if" {
        Token::EndIf { source }
    } else if is_ident(inner) {
        Token::Var {
            name: inner.to_string(),
            raw: false,
        }
    } else {
        return None;
    };
    Some((token, len))
}

fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut pos = 0;

    while pos < source.len() {
        let rest = &source[pos..];
        if rest.starts_with("{{") {
            if let Some((token, len)) = read_tag(rest) {
                if !text.is_empty() {
                    tokens.push(Token::Text(std::mem::take(&mut text)));
                }
                tokens.push(token);
                pos += len;
                continue;
            }
        }
        let ch = rest.chars().next().unwrap_or_default();
        text.push(ch);
        pos += ch.len_utf8();
    }

    if !text.is_empty() {
        tokens.push(Token::Text(text));
    }
    tokens
}

// ────────────────────────────────────────────────────────────────────────────
// Parser
// ────────────────────────────────────────────────────────────────────────────

enum BlockEnd {
    Else,
    EndIf,
    Eof,
}

/// Parses nodes until `{{else}}`, `{{/if}}` or end of input.
/// Outside a conditional, stray `{{else}}`/`{{/if}}` are kept as text.
/// An unclosed `{{#if}}` is closed at end of input.
fn parse_block(tokens: &mut impl Iterator<Item = Token>, in_if: bool) -> (Vec<Node>, BlockEnd) {
    let mut nodes = Vec::new();

    while let Some(token) = tokens.next() {
        match token {
            Token::Text(text) => nodes.push(Node::Text(text)),
            Token::Var { name, raw } => nodes.push(Node::Var { name, raw }),
            Token::If { name } => {
                let (then, end) = parse_block(tokens, true);
                let otherwise = match end {
                    BlockEnd::Else => parse_else(tokens),
                    BlockEnd::EndIf | BlockEnd::Eof => Vec::new(),
                };
                nodes.push(Node::If {
                    name,
                    then,
                    otherwise,
                });
            }
            Token::Else { .. } if in_if => return (nodes, BlockEnd::Else),
            Token::EndIf { .. } if in_if => return (nodes, BlockEnd::EndIf),
            Token::Else { source } | Token::EndIf { source } => nodes.push(Node::Text(source)),
        }
    }

    (nodes, BlockEnd::Eof)
}

/// Parses an else-branch; a second `{{else}}` inside it is literal text.
fn parse_else(tokens: &mut impl Iterator<Item = Token>) -> Vec<Node> {
    let mut nodes = Vec::new();
    loop {
        let (mut chunk, end) = parse_block(tokens, true);
        nodes.append(&mut chunk);
        match end {
            BlockEnd::Else => nodes.push(Node::Text("{{else}}".to_string())),
            BlockEnd::EndIf | BlockEnd::Eof => return nodes,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Rendering
// ────────────────────────────────────────────────────────────────────────────

fn lookup<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(data, |value, key| value.get(key))
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
    }
}

fn scalar_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn render_nodes(nodes: &[Node], data: &Value, out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Var { name, raw: true } => out.push_str(&scalar_text(lookup(data, name))),
            Node::Var { name, raw: false } => {
                out.push_str(&escape_latex(&scalar_text(lookup(data, name))))
            }
            Node::If {
                name,
                then,
                otherwise,
            } => {
                let branch = if is_truthy(lookup(data, name)) {
                    then
                } else {
                    otherwise
                };
                render_nodes(branch, data, out);
            }
        }
    }
}
