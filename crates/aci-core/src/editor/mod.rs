//! The `oh_editor` tool: view, create and edit files on behalf of an agent.
//!
//! Every command returns a [`ToolResult`] whose `output` is written for the
//! agent to read. Problems the agent can fix (bad parameters, a missing
//! file, an ambiguous `old_str`) come back as tool errors so callers can
//! turn them into `ERROR:` results instead of aborting.

mod validate;
mod view;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::{Config, EditorConfig};
use crate::error::{AciError, Result};
use crate::history::FileHistoryManager;
use crate::io::atomic_write;
use crate::linter::DefaultLinter;
use crate::results::{maybe_truncate, ToolResult, FILE_CONTENT_TRUNCATED_NOTICE};
use crate::text::{count_lines, expand_tabs, line_of_offset, line_range, number_lines, TAB_SIZE};

pub const TOOL_NAME: &str = "oh_editor";

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    View,
    Create,
    StrReplace,
    Insert,
    UndoEdit,
}

impl Command {
    pub fn all() -> &'static [Command] {
        &[
            Command::View,
            Command::Create,
            Command::StrReplace,
            Command::Insert,
            Command::UndoEdit,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Command::View => "view",
            Command::Create => "create",
            Command::StrReplace => "str_replace",
            Command::Insert => "insert",
            Command::UndoEdit => "undo_edit",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Command {
    type Err = AciError;

    fn from_str(s: &str) -> Result<Self> {
        Command::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| {
                let allowed: Vec<&str> = Command::all().iter().map(|c| c.as_str()).collect();
                AciError::Tool(format!(
                    "Unrecognized command {s}. The allowed commands for the {TOOL_NAME} tool are: {}",
                    allowed.join(", ")
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// EditRequest
// ---------------------------------------------------------------------------

/// One call of the editor tool, in the shape agents send it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditRequest {
    pub command: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_range: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_str: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_str: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert_line: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_linting: Option<bool>,
}

impl EditRequest {
    pub fn new(command: impl ToString, path: impl AsRef<Path>) -> Self {
        Self {
            command: command.to_string(),
            path: path.as_ref().to_string_lossy().into_owned(),
            ..Self::default()
        }
    }

    pub fn file_text(mut self, text: impl Into<String>) -> Self {
        self.file_text = Some(text.into());
        self
    }

    pub fn view_range(mut self, range: Vec<i64>) -> Self {
        self.view_range = Some(range);
        self
    }

    pub fn old_str(mut self, s: impl Into<String>) -> Self {
        self.old_str = Some(s.into());
        self
    }

    pub fn new_str(mut self, s: impl Into<String>) -> Self {
        self.new_str = Some(s.into());
        self
    }

    pub fn insert_line(mut self, line: i64) -> Self {
        self.insert_line = Some(line);
        self
    }

    pub fn lint(mut self, enabled: bool) -> Self {
        self.enable_linting = Some(enabled);
        self
    }
}

// ---------------------------------------------------------------------------
// Editor
// ---------------------------------------------------------------------------

pub struct Editor {
    config: EditorConfig,
    history: FileHistoryManager,
    linter: DefaultLinter,
}

impl Editor {
    pub fn new(config: EditorConfig) -> Result<Self> {
        Self::with_linter(config, DefaultLinter::default())
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_linter(config.editor.clone(), DefaultLinter::from_config(config))
    }

    pub fn with_linter(config: EditorConfig, linter: DefaultLinter) -> Result<Self> {
        let history =
            FileHistoryManager::new(config.max_history_per_file, config.history_dir.clone())?;
        Ok(Self {
            config,
            history,
            linter,
        })
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn history(&self) -> &FileHistoryManager {
        &self.history
    }

    /// Validate and run one request.
    pub fn execute(&self, req: &EditRequest) -> Result<ToolResult> {
        let command: Command = req.command.parse()?;
        let path = PathBuf::from(&req.path);
        self.validate_path(command, &path)?;

        let lint = req.enable_linting.unwrap_or(self.config.enable_linting);

        match command {
            Command::View => self.view(&path, req.view_range.as_deref()),
            Command::Create => {
                let text = req
                    .file_text
                    .as_deref()
                    .ok_or_else(|| AciError::missing(command, "file_text"))?;
                self.create(&path, text)
            }
            Command::StrReplace => {
                let old_str = req
                    .old_str
                    .as_deref()
                    .ok_or_else(|| AciError::missing(command, "old_str"))?;
                if req.new_str.as_deref() == Some(old_str) {
                    return Err(AciError::invalid(
                        "new_str",
                        old_str,
                        "No replacement was performed. `new_str` and `old_str` must be different.",
                    ));
                }
                self.str_replace(&path, old_str, req.new_str.as_deref(), lint)
            }
            Command::Insert => {
                let line = req
                    .insert_line
                    .ok_or_else(|| AciError::missing(command, "insert_line"))?;
                let new_str = req
                    .new_str
                    .as_deref()
                    .ok_or_else(|| AciError::missing(command, "new_str"))?;
                self.insert(&path, line, new_str, lint)
            }
            Command::UndoEdit => self.undo_edit(&path),
        }
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    pub fn create(&self, path: &Path, file_text: &str) -> Result<ToolResult> {
        self.write_file(path, file_text)?;
        self.history.add_history(path, file_text)?;
        Ok(ToolResult {
            output: Some(format!("File created successfully at: {}", path.display())),
            path: Some(path.display().to_string()),
            prev_exist: false,
            new_content: Some(file_text.to_string()),
            ..ToolResult::default()
        })
    }

    /// Replace the single occurrence of `old_str` with `new_str`.
    pub fn str_replace(
        &self,
        path: &Path,
        old_str: &str,
        new_str: Option<&str>,
        lint: bool,
    ) -> Result<ToolResult> {
        self.validate_file(path)?;
        let old_str = expand_tabs(old_str, TAB_SIZE);
        let new_str = expand_tabs(new_str.unwrap_or(""), TAB_SIZE);

        let original = self.read_file(path)?;
        let content = expand_tabs(&original, TAB_SIZE);

        let offsets: Vec<usize> = content.match_indices(&old_str).map(|(i, _)| i).collect();
        let idx = match offsets.as_slice() {
            [] => {
                return Err(AciError::Tool(format!(
                    "No replacement was performed, old_str `{old_str}` did not appear verbatim in {}.",
                    path.display()
                )))
            }
            [idx] => *idx,
            many => {
                let lines: Vec<usize> = many.iter().map(|&i| line_of_offset(&content, i)).collect();
                return Err(AciError::Tool(format!(
                    "No replacement was performed. Multiple occurrences of old_str `{old_str}` in lines {lines:?}. Please ensure it is unique."
                )));
            }
        };

        let mut new_content = String::with_capacity(content.len() + new_str.len());
        new_content.push_str(&content[..idx]);
        new_content.push_str(&new_str);
        new_content.push_str(&content[idx + old_str.len()..]);

        self.write_file(path, &new_content)?;
        self.history.add_history(path, &original)?;

        let window = self.config.snippet_context_window;
        let replacement_line = line_of_offset(&content, idx);
        let start = replacement_line.saturating_sub(window).max(1);
        let end = replacement_line + window + new_str.matches('\n').count();
        let snippet = line_range(&new_content, start, end);

        let mut message = format!("The file {} has been edited. ", path.display());
        message.push_str(&self.make_output(
            &snippet,
            &format!("a snippet of {}", path.display()),
            start,
        ));
        if lint {
            message.push('\n');
            message.push_str(&self.run_linting(&original, &new_content, path));
            message.push('\n');
        }
        message.push_str(
            "Review the changes and make sure they are as expected. Edit the file again if necessary.",
        );

        Ok(ToolResult {
            output: Some(message),
            path: Some(path.display().to_string()),
            prev_exist: true,
            old_content: Some(original),
            new_content: Some(new_content),
            ..ToolResult::default()
        })
    }

    /// Insert `new_str` as whole lines after line `insert_line` (0 = top).
    pub fn insert(
        &self,
        path: &Path,
        insert_line: i64,
        new_str: &str,
        lint: bool,
    ) -> Result<ToolResult> {
        self.validate_file(path)?;
        let original = self.read_file(path)?;
        let num_lines = count_lines(&original);

        let at = usize::try_from(insert_line)
            .ok()
            .filter(|&n| n <= num_lines)
            .ok_or_else(|| {
                AciError::invalid(
                    "insert_line",
                    insert_line,
                    format!("It should be within the range of lines of the file: [0, {num_lines}]"),
                )
            })?;

        let new_text = expand_tabs(new_str, TAB_SIZE);
        let new_lines: Vec<&str> = new_text.split('\n').collect();
        let existing: Vec<&str> = original.split_inclusive('\n').collect();

        let mut new_content = String::with_capacity(original.len() + new_text.len() + 1);
        for line in &existing[..at] {
            new_content.push_str(&expand_tabs(line, TAB_SIZE));
        }
        if !new_content.is_empty() && !new_content.ends_with('\n') {
            new_content.push('\n');
        }
        for line in &new_lines {
            new_content.push_str(line);
            new_content.push('\n');
        }
        for line in &existing[at..] {
            new_content.push_str(&expand_tabs(line, TAB_SIZE));
        }

        self.write_file(path, &new_content)?;
        self.history.add_history(path, &original)?;

        let window = self.config.snippet_context_window;
        let start = at.saturating_sub(window).max(1);
        let end = (num_lines + new_lines.len()).min(at + window + new_lines.len());
        let snippet = line_range(&new_content, start, end);

        let mut message = format!("The file {} has been edited. ", path.display());
        message.push_str(&self.make_output(&snippet, "a snippet of the edited file", start));
        if lint {
            message.push('\n');
            message.push_str(&self.run_linting(&original, &new_content, path));
            message.push('\n');
        }
        message.push_str(
            "Review the changes and make sure they are as expected (correct indentation, no duplicate lines, etc). Edit the file again if necessary.",
        );

        Ok(ToolResult {
            output: Some(message),
            path: Some(path.display().to_string()),
            prev_exist: true,
            old_content: Some(original),
            new_content: Some(new_content),
            ..ToolResult::default()
        })
    }

    pub fn undo_edit(&self, path: &Path) -> Result<ToolResult> {
        let current = self.read_file(path)?;
        let Some(previous) = self.history.get_last_history(path)? else {
            return Err(AciError::Tool(format!(
                "No edit history found for {}.",
                path.display()
            )));
        };

        self.write_file(path, &previous)?;

        Ok(ToolResult {
            output: Some(format!(
                "Last edit to {} undone successfully. {}",
                path.display(),
                self.make_output(&previous, &path.display().to_string(), 1)
            )),
            path: Some(path.display().to_string()),
            prev_exist: true,
            old_content: Some(current),
            new_content: Some(previous),
            ..ToolResult::default()
        })
    }

    // -----------------------------------------------------------------------
    // File access
    // -----------------------------------------------------------------------

    pub fn read_file(&self, path: &Path) -> Result<String> {
        self.validate_file(path)?;
        std::fs::read_to_string(path).map_err(|e| {
            AciError::Tool(format!(
                "Ran into {e} while trying to read {}",
                path.display()
            ))
        })
    }

    pub fn write_file(&self, path: &Path, text: &str) -> Result<()> {
        self.validate_file(path)?;
        atomic_write(path, text.as_bytes()).map_err(|e| {
            AciError::Tool(format!(
                "Ran into {e} while trying to write to {}",
                path.display()
            ))
        })
    }

    // -----------------------------------------------------------------------
    // Output
    // -----------------------------------------------------------------------

    /// `cat -n` style rendering of a snippet starting at line `start`.
    pub(crate) fn make_output(&self, snippet: &str, description: &str, start: usize) -> String {
        let truncated = maybe_truncate(
            snippet,
            Some(self.config.max_response_len_chars),
            FILE_CONTENT_TRUNCATED_NOTICE,
        );
        let expanded = expand_tabs(&truncated, TAB_SIZE);
        format!(
            "Here's the result of running `cat -n` on {description}:\n{}\n",
            number_lines(&expanded, start)
        )
    }

    /// Lint the change from `old` to `new` and describe only new issues.
    fn run_linting(&self, old: &str, new: &str, path: &Path) -> String {
        match self.lint_change(old, new, path) {
            Ok(issues) if issues.is_empty() => "No linting issues found in the changes.".to_string(),
            Ok(issues) => {
                let mut out = vec!["Linting issues found in the changes:".to_string()];
                out.extend(
                    issues
                        .iter()
                        .map(|r| format!("- Line {}, Column {}: {}", r.line, r.column, r.message)),
                );
                out.join("\n") + "\n"
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "linting failed");
                format!("Linting could not be run: {e}")
            }
        }
    }

    fn lint_change(
        &self,
        old: &str,
        new: &str,
        path: &Path,
    ) -> Result<Vec<crate::linter::LintResult>> {
        let dir = tempfile::tempdir()?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        let old_path = dir.path().join(format!("old.{name}"));
        let new_path = dir.path().join(format!("new.{name}"));
        std::fs::write(&old_path, old)?;
        std::fs::write(&new_path, new)?;
        self.linter.lint_file_diff(&old_path, &new_path)
    }
}

#[cfg(test)]
mod tests;
