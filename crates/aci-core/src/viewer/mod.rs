//! Read-only code browsing: paging through files, jumping to definitions
//! and references, and per-symbol summaries.

pub mod docs;
pub mod intel;
pub mod types;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::ViewerConfig;
use crate::error::Result;
use crate::paths::is_hidden;

pub use docs::{DocString, DocumentationExtractor};
pub use intel::{CallHierarchy, CodeIntelligence, SymbolInfo, SymbolLocation};
pub use types::{TypeAnalyzer, TypeInfo};

// ---------------------------------------------------------------------------
// Jump targets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JumpKind {
    Definition,
    Reference,
}

impl JumpKind {
    pub fn as_str(self) -> &'static str {
        match self {
            JumpKind::Definition => "definition",
            JumpKind::Reference => "reference",
        }
    }
}

impl fmt::Display for JumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JumpTarget {
    pub file_path: PathBuf,
    pub line: usize,
    pub column: usize,
    pub symbol: String,
    pub kind: JumpKind,
}

impl JumpTarget {
    fn from_location(location: SymbolLocation, symbol: &str, kind: JumpKind) -> Self {
        Self {
            file_path: location.file_path,
            line: location.line,
            column: location.column,
            symbol: symbol.to_string(),
            kind,
        }
    }
}

/// Directory tree as nested maps; files map to their path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DirNode {
    File(String),
    Dir(BTreeMap<String, DirNode>),
}

// ---------------------------------------------------------------------------
// Symbol summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSummary {
    pub type_hint: Option<String>,
    pub inferred_type: Option<String>,
    pub possible_types: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolDetails {
    pub symbol: String,
    #[serde(rename = "type")]
    pub type_info: Option<TypeSummary>,
    pub documentation: Option<DocString>,
    pub definition: Option<Position>,
    pub references: Vec<Position>,
}

// ---------------------------------------------------------------------------
// FileViewer
// ---------------------------------------------------------------------------

pub struct FileViewer {
    workspace: PathBuf,
    config: ViewerConfig,
    intel: CodeIntelligence,
    types: TypeAnalyzer,
    docs: DocumentationExtractor,
    current_file: Option<PathBuf>,
    lines: Vec<String>,
    position: usize,
}

impl FileViewer {
    /// Create a viewer and index every supported file under `workspace`.
    pub fn new(workspace: impl Into<PathBuf>, config: ViewerConfig) -> Self {
        let workspace = workspace.into();
        let mut intel = CodeIntelligence::new(&workspace);
        intel.index_workspace(&workspace);
        Self {
            workspace,
            config,
            intel,
            types: TypeAnalyzer::new(),
            docs: DocumentationExtractor::new(),
            current_file: None,
            lines: Vec::new(),
            position: 0,
        }
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub fn current_file(&self) -> Option<&Path> {
        self.current_file.as_deref()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn intel(&self) -> &CodeIntelligence {
        &self.intel
    }

    /// Make `path` the current file and analyse it.
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let path = path.canonicalize()?;
        let content = std::fs::read_to_string(&path)?;
        self.lines = content.lines().map(str::to_string).collect();
        self.position = 0;

        self.types.analyze_file(&path, &content);
        self.docs.extract_docs(&path, &content);
        if !self.intel.is_indexed(&path) {
            self.intel.index_file(&path)?;
        }
        self.current_file = Some(path);
        Ok(())
    }

    pub fn directory_structure(&self, path: Option<&Path>, max_depth: Option<usize>) -> Result<DirNode> {
        let path = path.unwrap_or(&self.workspace);
        if path.is_file() {
            return Ok(DirNode::File(path.display().to_string()));
        }
        dir_tree(path, 1, max_depth)
    }

    // -----------------------------------------------------------------------
    // Paging
    // -----------------------------------------------------------------------

    /// Lines `[start, end)` (0-based) as `{n:4} | {line}`. Defaults to one
    /// page from the current position.
    pub fn view_content(&self, start: Option<usize>, end: Option<usize>) -> Vec<String> {
        if self.lines.is_empty() {
            return vec!["No file loaded".to_string()];
        }
        let start = start.unwrap_or(self.position);
        let end = end
            .unwrap_or(start + self.config.page_size)
            .min(self.lines.len());
        if start >= end {
            return Vec::new();
        }
        self.lines[start..end]
            .iter()
            .enumerate()
            .map(|(i, line)| format!("{:4} | {line}", start + i + 1))
            .collect()
    }

    pub fn scroll_up(&mut self, lines: usize) -> Vec<String> {
        self.position = self.position.saturating_sub(lines);
        self.view_content(None, None)
    }

    pub fn scroll_down(&mut self, lines: usize) -> Vec<String> {
        self.position = (self.position + lines).min(self.lines.len().saturating_sub(1));
        self.view_content(None, None)
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    pub fn find_definition(&self, symbol: &str) -> Option<JumpTarget> {
        let current = self.current_file.as_deref()?;
        self.intel
            .find_definition(symbol, current)
            .map(|loc| JumpTarget::from_location(loc, symbol, JumpKind::Definition))
    }

    pub fn find_references(&self, symbol: &str) -> Vec<JumpTarget> {
        let Some(current) = self.current_file.as_deref() else {
            return Vec::new();
        };
        self.intel
            .find_references(symbol, current)
            .into_iter()
            .map(|loc| JumpTarget::from_location(loc, symbol, JumpKind::Reference))
            .collect()
    }

    pub fn call_hierarchy(&self, function: &str) -> Option<CallHierarchy> {
        let current = self.current_file.as_deref()?;
        Some(self.intel.call_hierarchy(function, current))
    }

    /// Open the target's file if needed and show the lines from its line on.
    pub fn jump_to_target(&mut self, target: &JumpTarget) -> Result<Vec<String>> {
        if self.current_file.as_deref() != Some(target.file_path.as_path()) {
            self.load_file(&target.file_path)?;
        }
        self.position = target.line.saturating_sub(1);
        let content = self.view_content(
            Some(self.position),
            Some(self.position + self.config.jump_context),
        );

        let header = format!(
            "Jumped to {} of '{}' in {}",
            target.kind,
            target.symbol,
            target.file_path.display()
        );
        let rule = "-".repeat(header.chars().count());
        let mut out = vec![header, rule];
        out.extend(content);
        Ok(out)
    }

    /// Type, documentation, definition and references of `symbol`, as seen
    /// from the current file.
    pub fn symbol_info(&self, symbol: &str) -> Option<SymbolDetails> {
        let current = self.current_file.as_deref()?;

        let type_info = self.types.type_info(current, symbol).map(|t| TypeSummary {
            type_hint: t.type_hint.clone(),
            inferred_type: t.inferred_type.clone(),
            possible_types: (!t.possible_types.is_empty())
                .then(|| t.possible_types.iter().cloned().collect()),
        });

        let definition = self.find_definition(symbol);
        let documentation = self
            .docs
            .documentation(current, symbol)
            .or_else(|| {
                let def = definition.as_ref()?;
                self.docs.documentation(&def.file_path, symbol)
            })
            .cloned();

        let position = |t: &JumpTarget| Position {
            file: t.file_path.clone(),
            line: t.line,
            column: t.column,
        };

        Some(SymbolDetails {
            symbol: symbol.to_string(),
            type_info,
            documentation,
            definition: definition.as_ref().map(position),
            references: self.find_references(symbol).iter().map(position).collect(),
        })
    }
}

fn dir_tree(dir: &Path, depth: usize, max_depth: Option<usize>) -> Result<DirNode> {
    let mut children = BTreeMap::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_hidden(&name) {
            continue;
        }
        let path = entry.path();
        if path.is_file() {
            children.insert(name, DirNode::File(path.display().to_string()));
        } else if path.is_dir() {
            if max_depth.is_some_and(|max| depth >= max) {
                children.insert(name, DirNode::Dir(BTreeMap::new()));
                continue;
            }
            match dir_tree(&path, depth + 1, max_depth) {
                Ok(node) => {
                    children.insert(name, node);
                }
                Err(e) => tracing::warn!(dir = %path.display(), error = %e, "skipping directory"),
            }
        }
    }
    Ok(DirNode::Dir(children))
}
