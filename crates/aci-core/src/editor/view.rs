use std::path::{Path, PathBuf};

use super::Editor;
use crate::error::{AciError, Result};
use crate::paths::is_hidden;
use crate::results::{maybe_truncate, ToolResult, DIRECTORY_CONTENT_TRUNCATED_NOTICE};
use crate::text::{count_lines, line_range};

impl Editor {
    pub fn view(&self, path: &Path, view_range: Option<&[i64]>) -> Result<ToolResult> {
        let view_range = view_range.filter(|r| !r.is_empty());
        if path.is_dir() {
            if let Some(range) = view_range {
                return Err(AciError::invalid(
                    "view_range",
                    format!("{range:?}"),
                    "The `view_range` parameter is not allowed when `path` points to a directory.",
                ));
            }
            return self.view_directory(path);
        }

        let content = self.read_file(path)?;
        let description = path.display().to_string();

        let Some(range) = view_range else {
            return Ok(self.view_result(path, self.make_output(&content, &description, 1)));
        };

        let &[start, end] = range else {
            return Err(AciError::invalid(
                "view_range",
                format!("{range:?}"),
                "It should be a list of two integers.",
            ));
        };

        let num_lines = count_lines(&content) as i64;
        if start < 1 || start > num_lines {
            return Err(AciError::invalid(
                "view_range",
                format!("{range:?}"),
                format!(
                    "Its first element `{start}` should be within the range of lines of the file: [1, {num_lines}]."
                ),
            ));
        }
        if end > num_lines {
            return Err(AciError::invalid(
                "view_range",
                format!("{range:?}"),
                format!(
                    "Its second element `{end}` should be smaller than the number of lines in the file: `{num_lines}`."
                ),
            ));
        }
        if end != -1 && end < start {
            return Err(AciError::invalid(
                "view_range",
                format!("{range:?}"),
                format!(
                    "Its second element `{end}` should be greater than or equal to the first element `{start}`."
                ),
            ));
        }

        let end = if end == -1 { num_lines } else { end };
        let snippet = line_range(&content, start as usize, end as usize);
        Ok(self.view_result(
            path,
            self.make_output(&snippet, &description, start as usize),
        ))
    }

    fn view_result(&self, path: &Path, output: String) -> ToolResult {
        ToolResult {
            output: Some(output),
            path: Some(path.display().to_string()),
            ..ToolResult::default()
        }
    }

    /// Entries up to two levels deep, hidden ones left out.
    fn view_directory(&self, path: &Path) -> Result<ToolResult> {
        let mut hidden = 0usize;
        let mut entries: Vec<PathBuf> = vec![path.to_path_buf()];

        for child in read_dir_sorted(path)? {
            let name = child.file_name().map(|n| n.to_string_lossy().into_owned());
            if name.as_deref().is_some_and(is_hidden) {
                hidden += 1;
                continue;
            }
            if child.is_dir() {
                match read_dir_sorted(&child) {
                    Ok(grandchildren) => entries.extend(grandchildren.into_iter().filter(|g| {
                        !g.file_name()
                            .is_some_and(|n| is_hidden(&n.to_string_lossy()))
                    })),
                    Err(e) => {
                        tracing::warn!(dir = %child.display(), error = %e, "skipping unreadable directory")
                    }
                }
            }
            entries.push(child);
        }

        entries.sort_by_key(|p| p.display().to_string());
        let listing: Vec<String> = entries
            .iter()
            .map(|p| {
                let s = p.display().to_string();
                if p.is_dir() && !s.ends_with('/') {
                    format!("{s}/")
                } else {
                    s
                }
            })
            .collect();

        let listing = maybe_truncate(
            &listing.join("\n"),
            Some(self.config.max_response_len_chars),
            DIRECTORY_CONTENT_TRUNCATED_NOTICE,
        );

        let mut message = format!(
            "Here's the files and directories up to 2 levels deep in {}, excluding hidden items:\n{listing}",
            path.display()
        );
        if hidden > 0 {
            message.push_str(&format!(
                "\n\n{hidden} hidden files/directories in this directory are excluded. You can use 'ls -la {}' to see them.",
                path.display()
            ));
        }
        Ok(self.view_result(path, message))
    }
}

fn read_dir_sorted(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        out.push(entry?.path());
    }
    out.sort();
    Ok(out)
}
