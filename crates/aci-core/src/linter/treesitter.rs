use std::collections::HashSet;
use std::path::Path;
use tree_sitter::Node;

use super::{LintResult, Linter};
use crate::error::Result;
use crate::lang::Language;

pub const SYNTAX_ERROR: &str = "Syntax error";

/// Reports tree-sitter ERROR and MISSING nodes as syntax errors.
pub struct TreesitterBasicLinter;

impl TreesitterBasicLinter {
    pub fn lint_source(&self, file: &str, source: &str, language: Language) -> Result<Vec<LintResult>> {
        let tree = language.parse(source)?;
        let root = tree.root_node();
        if !root.has_error() {
            return Ok(Vec::new());
        }

        let mut results = Vec::new();
        let mut lines_seen = HashSet::new();
        collect_errors(root, file, &mut results, &mut lines_seen);
        results.sort_by_key(|r| (r.line, r.column));
        Ok(results)
    }
}

fn collect_errors(
    node: Node<'_>,
    file: &str,
    results: &mut Vec<LintResult>,
    lines_seen: &mut HashSet<usize>,
) {
    if node.is_error() || node.is_missing() {
        let pos = node.start_position();
        let line = pos.row + 1;
        if lines_seen.insert(line) {
            results.push(LintResult {
                file: file.to_string(),
                line,
                column: pos.column + 1,
                message: SYNTAX_ERROR.to_string(),
            });
        }
        // Everything inside an ERROR node is part of the same problem.
        return;
    }
    if !node.has_error() {
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_errors(child, file, results, lines_seen);
    }
}

impl Linter for TreesitterBasicLinter {
    fn name(&self) -> &str {
        "treesitter"
    }

    fn supports(&self, _language: Language) -> bool {
        true
    }

    fn lint(&self, path: &Path) -> Result<Vec<LintResult>> {
        let Some(language) = Language::from_path(path) else {
            return Ok(Vec::new());
        };
        let source = std::fs::read_to_string(path)?;
        self.lint_source(&path.to_string_lossy(), &source, language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn clean_python_has_no_errors() {
        let results = TreesitterBasicLinter
            .lint_source("x.py", "def foo():\n    return 1\n", Language::Python)
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn broken_signature_is_reported_on_its_line() {
        let results = TreesitterBasicLinter
            .lint_source("x.py", "x = 1\ndef foo(:\n    pass\n", Language::Python)
            .unwrap();
        assert!(!results.is_empty());
        assert!(results.iter().all(|r| r.message == SYNTAX_ERROR));
        assert!(results.iter().any(|r| r.line == 2));
    }

    #[test]
    fn at_most_one_result_per_line() {
        let results = TreesitterBasicLinter
            .lint_source("x.js", "let a = ((((;\n", Language::JavaScript)
            .unwrap();
        let mut lines: Vec<usize> = results.iter().map(|r| r.line).collect();
        let before = lines.len();
        lines.dedup();
        assert_eq!(before, lines.len());
    }

    #[test]
    fn lints_files_by_extension() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("ok.rs");
        let bad = dir.path().join("bad.rs");
        std::fs::write(&good, "fn main() {}\n").unwrap();
        std::fs::write(&bad, "fn main( {\n").unwrap();

        assert!(TreesitterBasicLinter.lint(&good).unwrap().is_empty());
        let results = TreesitterBasicLinter.lint(&bad).unwrap();
        assert!(!results.is_empty());
        assert_eq!(results[0].file, bad.to_string_lossy());
    }
}
