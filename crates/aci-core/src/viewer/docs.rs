//! Structured documentation from Python docstrings, JSDoc and Javadoc.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tree_sitter::Node;

use crate::lang::{node_text, walk_tree, Language};
use crate::text::{expand_tabs, TAB_SIZE};

pub const MODULE_DOC_KEY: &str = "__module__";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocString {
    pub summary: String,
    pub description: Option<String>,
    pub params: BTreeMap<String, String>,
    pub returns: Option<String>,
    pub raises: Vec<String>,
    pub examples: Vec<String>,
}

impl DocString {
    fn append_description(&mut self, line: &str) {
        match &mut self.description {
            Some(desc) => {
                desc.push('\n');
                desc.push_str(line);
            }
            None => self.description = Some(line.to_string()),
        }
    }

    fn append_returns(&mut self, line: &str) {
        match &mut self.returns {
            Some(ret) => {
                ret.push(' ');
                ret.push_str(line);
            }
            None => self.returns = Some(line.to_string()),
        }
    }

    fn append_param(&mut self, param: &str, line: &str) {
        if let Some(text) = self.params.get_mut(param) {
            text.push(' ');
            text.push_str(line);
        }
    }
}

#[derive(Debug, Default)]
pub struct DocumentationExtractor {
    cache: HashMap<PathBuf, HashMap<String, DocString>>,
}

impl DocumentationExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Documentation per symbol name, computed once per path.
    pub fn extract_docs(&mut self, path: &Path, content: &str) -> &HashMap<String, DocString> {
        self.cache
            .entry(path.to_path_buf())
            .or_insert_with(|| match Language::from_path(path) {
                Some(Language::Python) => extract_python_docs(content),
                Some(lang) if lang.is_js_family() => extract_block_docs(content, parse_jsdoc),
                Some(Language::Java) => extract_block_docs(content, parse_javadoc),
                _ => HashMap::new(),
            })
    }

    pub fn documentation(&self, path: &Path, symbol: &str) -> Option<&DocString> {
        self.cache.get(path)?.get(symbol)
    }

    pub fn invalidate(&mut self, path: &Path) {
        self.cache.remove(path);
    }
}

// ---------------------------------------------------------------------------
// Python
// ---------------------------------------------------------------------------

static PY_PARAM_RE: OnceLock<Regex> = OnceLock::new();
static PY_RAISES_RE: OnceLock<Regex> = OnceLock::new();

fn py_param_re() -> &'static Regex {
    PY_PARAM_RE.get_or_init(|| {
        Regex::new(r"^(\*{0,2}\w+)\s*(?:\(([^)]*)\))?\s*:\s*(.+)$").unwrap()
    })
}

fn py_raises_re() -> &'static Regex {
    PY_RAISES_RE.get_or_init(|| Regex::new(r"^([\w.]+)\s*:\s*(.+)$").unwrap())
}

fn extract_python_docs(content: &str) -> HashMap<String, DocString> {
    let mut docs = HashMap::new();
    let Ok(tree) = Language::Python.parse(content) else {
        return docs;
    };
    let root = tree.root_node();

    if let Some(doc) = leading_docstring(root, content) {
        docs.insert(MODULE_DOC_KEY.to_string(), parse_docstring(&doc));
    }

    walk_tree(root, |node| {
        if !matches!(node.kind(), "function_definition" | "class_definition") {
            return;
        }
        let (Some(name), Some(body)) = (
            node.child_by_field_name("name"),
            node.child_by_field_name("body"),
        ) else {
            return;
        };
        if let Some(doc) = leading_docstring(body, content) {
            docs.insert(node_text(name, content).to_string(), parse_docstring(&doc));
        }
    });
    docs
}

/// The cleaned docstring opening a module or block, if any.
fn leading_docstring(container: Node<'_>, content: &str) -> Option<String> {
    let mut cursor = container.walk();
    let first = container
        .named_children(&mut cursor)
        .find(|n| n.kind() != "comment")?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let string = first.named_child(0).filter(|n| n.kind() == "string")?;
    Some(clean_docstring(strip_string_quotes(node_text(string, content))))
}

fn strip_string_quotes(literal: &str) -> &str {
    let body = literal.trim_start_matches(|c: char| "rRuUbBfF".contains(c));
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if let Some(inner) = body
            .strip_prefix(quote)
            .and_then(|b| b.strip_suffix(quote))
        {
            return inner;
        }
    }
    body
}

/// Dedent like `inspect.cleandoc`: the first line is stripped, the rest
/// lose their common indentation, and blank edges are dropped.
fn clean_docstring(doc: &str) -> String {
    let expanded = expand_tabs(doc, TAB_SIZE);
    let lines: Vec<&str> = expanded.split('\n').collect();
    let margin = lines
        .iter()
        .skip(1)
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut cleaned: Vec<String> = Vec::with_capacity(lines.len());
    for (i, line) in lines.iter().enumerate() {
        let line = if i == 0 {
            line.trim_start()
        } else {
            line.get(margin..).unwrap_or("")
        };
        cleaned.push(line.trim_end().to_string());
    }
    while cleaned.first().is_some_and(|l| l.is_empty()) {
        cleaned.remove(0);
    }
    while cleaned.last().is_some_and(|l| l.is_empty()) {
        cleaned.pop();
    }
    cleaned.join("\n")
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Summary,
    Description,
    Params,
    Returns,
    Raises,
    Examples,
}

/// Parse a Google-style docstring.
pub fn parse_docstring(doc: &str) -> DocString {
    let mut lines = doc.split('\n');
    let mut out = DocString {
        summary: lines.next().unwrap_or("").trim().to_string(),
        ..DocString::default()
    };
    let mut section = Section::Description;
    let mut current_param: Option<String> = None;

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let header = [
            ("Args:", Section::Params),
            ("Arguments:", Section::Params),
            ("Parameters:", Section::Params),
            ("Returns:", Section::Returns),
            ("Yields:", Section::Returns),
            ("Raises:", Section::Raises),
            ("Examples:", Section::Examples),
            ("Example:", Section::Examples),
        ]
        .into_iter()
        .find(|(prefix, _)| line.starts_with(prefix));
        if let Some((_, next)) = header {
            section = next;
            continue;
        }

        match section {
            Section::Summary | Section::Description => out.append_description(line),
            Section::Params => match py_param_re().captures(line) {
                Some(caps) => {
                    let name = caps[1].to_string();
                    let text = match caps.get(2) {
                        Some(ty) => format!("{}: {}", ty.as_str(), &caps[3]),
                        None => caps[3].to_string(),
                    };
                    out.params.insert(name.clone(), text);
                    current_param = Some(name);
                }
                None => {
                    if let Some(param) = &current_param {
                        out.append_param(param, line);
                    }
                }
            },
            Section::Returns => out.append_returns(line),
            Section::Raises => match py_raises_re().captures(line) {
                Some(caps) => out.raises.push(format!("{}: {}", &caps[1], &caps[2])),
                None => out.raises.push(line.to_string()),
            },
            Section::Examples => out.examples.push(line.to_string()),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// JSDoc / Javadoc
// ---------------------------------------------------------------------------

static DOC_BLOCK_RE: OnceLock<Regex> = OnceLock::new();
static JS_DECL_RE: OnceLock<Regex> = OnceLock::new();
static TYPE_DECL_RE: OnceLock<Regex> = OnceLock::new();
static CALLABLE_DECL_RE: OnceLock<Regex> = OnceLock::new();
static JSDOC_PARAM_RE: OnceLock<Regex> = OnceLock::new();
static JSDOC_RETURNS_RE: OnceLock<Regex> = OnceLock::new();
static JSDOC_THROWS_RE: OnceLock<Regex> = OnceLock::new();
static JAVADOC_PARAM_RE: OnceLock<Regex> = OnceLock::new();
static JAVADOC_THROWS_RE: OnceLock<Regex> = OnceLock::new();

fn doc_block_re() -> &'static Regex {
    DOC_BLOCK_RE.get_or_init(|| Regex::new(r"(?s)/\*\*(.*?)\*/").unwrap())
}

fn js_decl_re() -> &'static Regex {
    JS_DECL_RE.get_or_init(|| {
        Regex::new(
            r"^(?:export\s+)?(?:default\s+)?(?:declare\s+)?(?:abstract\s+)?(?:async\s+)?(?:function\*?|class|const|let|var|interface|type|enum)\s+(\w+)",
        )
        .unwrap()
    })
}

fn type_decl_re() -> &'static Regex {
    TYPE_DECL_RE.get_or_init(|| Regex::new(r"\b(?:class|interface|enum|record)\s+(\w+)").unwrap())
}

fn callable_decl_re() -> &'static Regex {
    CALLABLE_DECL_RE.get_or_init(|| Regex::new(r"(\w+)\s*(?:<[^>]*>)?\s*\(").unwrap())
}

fn jsdoc_param_re() -> &'static Regex {
    JSDOC_PARAM_RE.get_or_init(|| {
        Regex::new(r"^@param\s+\{([^}]+)\}\s+\[?(\w+)\]?\s*(?:-\s*)?(.*)$").unwrap()
    })
}

fn jsdoc_returns_re() -> &'static Regex {
    JSDOC_RETURNS_RE.get_or_init(|| Regex::new(r"^@returns?\s+\{([^}]+)\}\s*(.*)$").unwrap())
}

fn jsdoc_throws_re() -> &'static Regex {
    JSDOC_THROWS_RE.get_or_init(|| Regex::new(r"^@throws\s+\{([^}]+)\}\s*(.*)$").unwrap())
}

fn javadoc_param_re() -> &'static Regex {
    JAVADOC_PARAM_RE.get_or_init(|| Regex::new(r"^@param\s+(\w+)\s*(.*)$").unwrap())
}

fn javadoc_throws_re() -> &'static Regex {
    JAVADOC_THROWS_RE.get_or_init(|| Regex::new(r"^@(?:throws|exception)\s+([\w.]+)\s*(.*)$").unwrap())
}

const NOT_CALLABLE: &[&str] = &["if", "for", "while", "switch", "catch", "return", "function"];

/// Name declared on the first code line after byte offset `pos`.
pub(crate) fn declaration_after(content: &str, pos: usize) -> Option<String> {
    let line = content
        .get(pos..)?
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with('@') && !l.starts_with("//"))?;

    if let Some(caps) = js_decl_re().captures(line) {
        return Some(caps[1].to_string());
    }
    if let Some(caps) = type_decl_re().captures(line) {
        return Some(caps[1].to_string());
    }
    callable_decl_re()
        .captures(line)
        .map(|caps| caps[1].to_string())
        .filter(|name| !NOT_CALLABLE.contains(&name.as_str()))
}

fn extract_block_docs(content: &str, parse: fn(&[&str]) -> DocString) -> HashMap<String, DocString> {
    let mut docs = HashMap::new();
    for caps in doc_block_re().captures_iter(content) {
        let Some(whole) = caps.get(0) else { continue };
        let Some(name) = declaration_after(content, whole.end()) else {
            continue;
        };
        let lines: Vec<&str> = caps[1]
            .split('\n')
            .map(|l| l.trim().trim_start_matches('*').trim())
            .collect();
        docs.insert(name, parse(&lines));
    }
    docs
}

fn parse_jsdoc(lines: &[&str]) -> DocString {
    let mut doc = DocString::default();
    let mut section = Section::Summary;
    let mut current_param: Option<String> = None;

    for &line in lines.iter().filter(|l| !l.is_empty()) {
        if line.starts_with("@param") {
            section = Section::Params;
            if let Some(caps) = jsdoc_param_re().captures(line) {
                let name = caps[2].to_string();
                doc.params
                    .insert(name.clone(), format!("{}: {}", &caps[1], &caps[3]).trim_end().to_string());
                current_param = Some(name);
            }
        } else if line.starts_with("@return") {
            section = Section::Returns;
            if let Some(caps) = jsdoc_returns_re().captures(line) {
                doc.returns = Some(format!("{}: {}", &caps[1], &caps[2]).trim_end().to_string());
            }
        } else if line.starts_with("@throws") {
            section = Section::Raises;
            if let Some(caps) = jsdoc_throws_re().captures(line) {
                doc.raises
                    .push(format!("{}: {}", &caps[1], &caps[2]).trim_end().to_string());
            }
        } else if let Some(rest) = line.strip_prefix("@example") {
            section = Section::Examples;
            if !rest.trim().is_empty() {
                doc.examples.push(rest.trim().to_string());
            }
        } else if line.starts_with('@') {
            section = Section::Description;
        } else {
            continue_section(&mut doc, section, current_param.as_deref(), line);
        }
    }
    doc
}

fn parse_javadoc(lines: &[&str]) -> DocString {
    let mut doc = DocString::default();
    let mut section = Section::Summary;
    let mut current_param: Option<String> = None;

    for &line in lines.iter().filter(|l| !l.is_empty()) {
        if line.starts_with("@param") {
            section = Section::Params;
            if let Some(caps) = javadoc_param_re().captures(line) {
                let name = caps[1].to_string();
                doc.params.insert(name.clone(), caps[2].to_string());
                current_param = Some(name);
            }
        } else if let Some(rest) = line.strip_prefix("@return") {
            section = Section::Returns;
            let rest = rest.strip_prefix('s').unwrap_or(rest).trim();
            doc.returns = Some(rest.to_string());
        } else if line.starts_with("@throws") || line.starts_with("@exception") {
            section = Section::Raises;
            if let Some(caps) = javadoc_throws_re().captures(line) {
                doc.raises
                    .push(format!("{}: {}", &caps[1], &caps[2]).trim_end().to_string());
            }
        } else if line.starts_with('@') {
            section = Section::Description;
        } else {
            continue_section(&mut doc, section, current_param.as_deref(), line);
        }
    }
    doc
}

/// An untagged line continues whatever tag came before it.
fn continue_section(doc: &mut DocString, section: Section, param: Option<&str>, line: &str) {
    match (section, param) {
        (Section::Summary, _) if doc.summary.is_empty() => doc.summary = line.to_string(),
        (Section::Params, Some(param)) => doc.append_param(param, line),
        (Section::Returns, _) if doc.returns.is_some() => doc.append_returns(line),
        (Section::Examples, _) => doc.examples.push(line.to_string()),
        _ => doc.append_description(line),
    }
}
