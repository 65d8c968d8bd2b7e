//! Compiled-in tree-sitter grammars and per-language metadata.

use std::fmt;
use std::path::Path;
use tree_sitter::{Node, Parser, Tree};

use crate::error::{AciError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Tsx,
    Rust,
    Go,
    Java,
}

impl Language {
    pub fn all() -> &'static [Language] {
        &[
            Language::Python,
            Language::JavaScript,
            Language::TypeScript,
            Language::Tsx,
            Language::Rust,
            Language::Go,
            Language::Java,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Tsx => "tsx",
            Language::Rust => "rust",
            Language::Go => "go",
            Language::Java => "java",
        }
    }

    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Language::Python => &["py", "pyi"],
            Language::JavaScript => &["js", "jsx", "mjs", "cjs"],
            Language::TypeScript => &["ts", "mts", "cts"],
            Language::Tsx => &["tsx"],
            Language::Rust => &["rs"],
            Language::Go => &["go"],
            Language::Java => &["java"],
        }
    }

    /// Keywords that open a new scope in this language.
    pub fn scope_markers(self) -> &'static [&'static str] {
        match self {
            Language::Python => &["def", "class", "with", "if", "for", "while"],
            Language::JavaScript | Language::TypeScript | Language::Tsx => {
                &["function", "class", "if", "for", "while"]
            }
            Language::Rust => &["fn", "struct", "impl", "if", "for", "while"],
            Language::Go => &["func", "type", "if", "for"],
            Language::Java => &["class", "interface", "if", "for", "while"],
        }
    }

    /// Both JavaScript flavours and TypeScript share JSDoc and import syntax.
    pub fn is_js_family(self) -> bool {
        matches!(
            self,
            Language::JavaScript | Language::TypeScript | Language::Tsx
        )
    }

    pub fn from_path(path: &Path) -> Option<Language> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        Language::all()
            .iter()
            .copied()
            .find(|lang| lang.extensions().contains(&ext.as_str()))
    }

    pub fn from_name(name: &str) -> Result<Language> {
        Language::all()
            .iter()
            .copied()
            .find(|lang| lang.as_str() == name)
            .ok_or_else(|| AciError::UnsupportedLanguage(name.to_string()))
    }

    pub fn grammar(self) -> tree_sitter::Language {
        match self {
            Language::Python => tree_sitter_python::LANGUAGE.into(),
            Language::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Language::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Language::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            Language::Rust => tree_sitter_rust::LANGUAGE.into(),
            Language::Go => tree_sitter_go::LANGUAGE.into(),
            Language::Java => tree_sitter_java::LANGUAGE.into(),
        }
    }

    pub fn parser(self) -> Result<Parser> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.grammar())
            .map_err(|e| AciError::Parse(format!("{}: {e}", self.as_str())))?;
        Ok(parser)
    }

    pub fn parse(self, source: &str) -> Result<Tree> {
        let mut parser = self.parser()?;
        parser
            .parse(source, None)
            .ok_or_else(|| AciError::Parse(format!("{}: parser returned no tree", self.as_str())))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Language {
    type Err = AciError;

    fn from_str(s: &str) -> Result<Self> {
        Language::from_name(s)
    }
}

/// Text of a node, or `""` when the range is not valid UTF-8.
pub fn node_text<'a>(node: Node<'_>, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

/// Visit `root` and all of its descendants in pre-order.
pub fn walk_tree<'t>(root: Node<'t>, mut visit: impl FnMut(Node<'t>)) {
    let mut cursor = root.walk();
    loop {
        visit(cursor.node());
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}
