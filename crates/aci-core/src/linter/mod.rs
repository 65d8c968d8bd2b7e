//! Linting for edited files.
//!
//! Results from several backends are normalised into [`LintResult`]. The
//! [`DefaultLinter`] picks the first backend that applies to a file and can
//! report only the issues an edit introduced.

pub mod flake8;
pub mod treesitter;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::config::{Config, LinterConfig};
use crate::error::Result;
use crate::lang::Language;

pub use flake8::Flake8Linter;
pub use treesitter::TreesitterBasicLinter;

const RED: &str = "\x1b[91m";
const RESET: &str = "\x1b[0m";

// ---------------------------------------------------------------------------
// LintResult
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintResult {
    pub file: String,
    /// 1-based.
    pub line: usize,
    /// 1-based.
    pub column: usize,
    pub message: String,
}

impl LintResult {
    /// Render the offending line with three lines of context each side,
    /// highlighted in red, and a caret under the reported column.
    pub fn visualize(&self) -> String {
        let content = std::fs::read_to_string(&self.file).unwrap_or_default();
        self.visualize_source(&content, 3)
    }

    pub fn visualize_source(&self, content: &str, half_window: usize) -> String {
        let lines: Vec<&str> = content.split('\n').collect();
        if lines.is_empty() || self.line == 0 {
            return format!("{}:{}: {}", self.line, self.column, self.message);
        }
        let first = self.line.saturating_sub(half_window).max(1);
        let last = (self.line + half_window).min(lines.len());

        let mut out = Vec::new();
        for n in first..=last {
            let text = lines.get(n - 1).copied().unwrap_or("");
            let prefix = format!("{n}|");
            if n == self.line {
                out.push(format!("{RED}{prefix}{text}{RESET}"));
                let pad = prefix.len() + self.column.saturating_sub(1);
                out.push(format!(
                    "{}^ ERROR HERE: {}",
                    " ".repeat(pad),
                    self.message
                ));
            } else {
                out.push(format!("{prefix}{text}"));
            }
        }
        out.join("\n")
    }
}

// ---------------------------------------------------------------------------
// Linter trait
// ---------------------------------------------------------------------------

pub trait Linter: Send + Sync {
    fn name(&self) -> &str;
    fn supports(&self, language: Language) -> bool;
    fn lint(&self, path: &Path) -> Result<Vec<LintResult>>;
}

// ---------------------------------------------------------------------------
// DefaultLinter
// ---------------------------------------------------------------------------

pub struct DefaultLinter {
    linters: Vec<Box<dyn Linter>>,
}

impl Default for DefaultLinter {
    fn default() -> Self {
        Self::new(&LinterConfig::default())
    }
}

impl DefaultLinter {
    /// flake8 (when enabled and installed) ahead of the tree-sitter check.
    pub fn new(config: &LinterConfig) -> Self {
        let mut linters: Vec<Box<dyn Linter>> = Vec::new();
        if config.use_flake8 {
            linters.push(Box::new(Flake8Linter::new(config.flake8_select.clone())));
        }
        linters.push(Box::new(TreesitterBasicLinter));
        Self { linters }
    }

    /// Like [`DefaultLinter::new`], with flake8 bounded by `shell.timeout_secs`.
    pub fn from_config(config: &Config) -> Self {
        let mut linters: Vec<Box<dyn Linter>> = Vec::new();
        if config.linter.use_flake8 {
            let timeout = Duration::from_secs(config.shell.timeout_secs);
            linters.push(Box::new(
                Flake8Linter::new(config.linter.flake8_select.clone()).with_timeout(timeout),
            ));
        }
        linters.push(Box::new(TreesitterBasicLinter));
        Self { linters }
    }

    pub fn with_linters(linters: Vec<Box<dyn Linter>>) -> Self {
        Self { linters }
    }

    /// Results of the first applicable backend that reports anything.
    pub fn lint(&self, path: &Path) -> Result<Vec<LintResult>> {
        let Some(language) = Language::from_path(path) else {
            return Ok(Vec::new());
        };
        for linter in self.linters.iter().filter(|l| l.supports(language)) {
            let results = linter.lint(path)?;
            if !results.is_empty() {
                tracing::debug!(
                    linter = linter.name(),
                    path = %path.display(),
                    count = results.len(),
                    "lint issues found"
                );
                return Ok(results);
            }
        }
        Ok(Vec::new())
    }

    /// Issues present in `updated` that `original` did not already have.
    ///
    /// Issues are matched by message and the trimmed text of their source
    /// line, so pre-existing problems that merely moved are not reported.
    pub fn lint_file_diff(&self, original: &Path, updated: &Path) -> Result<Vec<LintResult>> {
        let old_results = self.lint(original)?;
        let new_results = self.lint(updated)?;
        if new_results.is_empty() {
            return Ok(Vec::new());
        }

        let old_content = std::fs::read_to_string(original).unwrap_or_default();
        let new_content = std::fs::read_to_string(updated).unwrap_or_default();

        let mut seen: HashMap<(String, String), usize> = HashMap::new();
        for r in &old_results {
            *seen.entry(issue_key(r, &old_content)).or_insert(0) += 1;
        }

        let mut introduced = Vec::new();
        for r in new_results {
            let key = issue_key(&r, &new_content);
            match seen.get_mut(&key) {
                Some(n) if *n > 0 => *n -= 1,
                _ => introduced.push(r),
            }
        }
        Ok(introduced)
    }
}

fn issue_key(result: &LintResult, content: &str) -> (String, String) {
    let line = content
        .lines()
        .nth(result.line.saturating_sub(1))
        .unwrap_or("")
        .trim()
        .to_string();
    (result.message.clone(), line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn visualize_marks_the_error_line() {
        let content = "class Foo:\n    def foo():\n        print(\"Hello, World!\")\n    print(\"Wrong indent\")\n    foo(\n";
        let result = LintResult {
            file: "/tmp/x.py".into(),
            line: 5,
            column: 5,
            message: "Syntax error".into(),
        };
        assert_eq!(
            result.visualize_source(content, 3),
            concat!(
                "2|    def foo():\n",
                "3|        print(\"Hello, World!\")\n",
                "4|    print(\"Wrong indent\")\n",
                "\x1b[91m5|    foo(\x1b[0m\n",
                "      ^ ERROR HERE: Syntax error\n",
                "6|"
            )
        );
    }

    #[test]
    fn visualize_clamps_at_file_start() {
        let result = LintResult {
            file: "/tmp/x.py".into(),
            line: 1,
            column: 1,
            message: "bad".into(),
        };
        let out = result.visualize_source("x(\ny\n", 3);
        assert!(out.starts_with("\x1b[91m1|x(\x1b[0m\n  ^ ERROR HERE: bad"));
    }

    #[test]
    fn unknown_extension_lints_clean() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "def (((").unwrap();
        assert!(DefaultLinter::default().lint(&path).unwrap().is_empty());
    }

    #[test]
    fn diff_reports_only_new_issues() {
        let dir = TempDir::new().unwrap();
        let old = dir.path().join("old.py");
        let new = dir.path().join("new.py");
        std::fs::write(&old, "x = 1\n").unwrap();
        std::fs::write(&new, "x = 1\ndef broken(:\n    pass\n").unwrap();

        let linter = DefaultLinter::with_linters(vec![Box::new(TreesitterBasicLinter)]);
        let results = linter.lint_file_diff(&old, &new).unwrap();
        assert!(!results.is_empty());
        assert!(results.iter().all(|r| r.message == "Syntax error"));
    }
}
