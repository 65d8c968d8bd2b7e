use std::path::Path;

use super::{Command, Editor};
use crate::error::{AciError, Result};
use crate::io::read_head;

/// Bytes sniffed when deciding whether a file is text.
const SNIFF_LEN: usize = 8 * 1024;

impl Editor {
    /// Check that `path` suits `command` before anything touches the disk.
    pub fn validate_path(&self, command: Command, path: &Path) -> Result<()> {
        if !path.is_absolute() {
            let suggested = std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| Path::new("/").join(path));
            return Err(AciError::invalid(
                "path",
                path.display(),
                format!(
                    "The path should be an absolute path, starting with `/`. Maybe you meant {}?",
                    suggested.display()
                ),
            ));
        }

        if command == Command::Create {
            if path.exists() {
                return Err(AciError::invalid(
                    "path",
                    path.display(),
                    format!(
                        "File already exists at: {}. Cannot overwrite files using command `create`.",
                        path.display()
                    ),
                ));
            }
            return Ok(());
        }

        if !path.exists() {
            return Err(AciError::invalid(
                "path",
                path.display(),
                format!(
                    "The path {} does not exist. Please provide a valid path.",
                    path.display()
                ),
            ));
        }

        if command != Command::View && path.is_dir() {
            return Err(AciError::invalid(
                "path",
                path.display(),
                format!(
                    "The path {} is a directory and only the `view` command can be used on directories.",
                    path.display()
                ),
            ));
        }
        Ok(())
    }

    /// Reject files that are too large or not text. Missing paths pass.
    pub fn validate_file(&self, path: &Path) -> Result<()> {
        if !path.is_file() {
            return Ok(());
        }
        let fail = |reason: String| AciError::FileValidation {
            path: path.display().to_string(),
            reason,
        };

        let size = std::fs::metadata(path)
            .map_err(|e| fail(format!("Error checking file size: {e}")))?
            .len();
        let max = self.config.max_file_size_bytes();
        if size > max {
            return Err(fail(format!(
                "File is too large ({:.1}MB). Maximum allowed size is {}MB.",
                size as f64 / 1024.0 / 1024.0,
                self.config.max_file_size_mb
            )));
        }

        let head = read_head(path, SNIFF_LEN)
            .map_err(|e| fail(format!("Error checking file type: {e}")))?;
        if looks_binary(&head) {
            let reason = match mime_guess::from_path(path).first() {
                Some(mime) if mime.type_() != mime_guess::mime::TEXT => {
                    format!("File type {mime} is not supported. Only text files can be edited.")
                }
                _ => "File appears to be binary. Only text files can be edited.".to_string(),
            };
            return Err(fail(reason));
        }
        Ok(())
    }
}

/// NUL bytes or invalid UTF-8 mark a file as binary. A multi-byte sequence
/// cut off by the sniff limit does not count.
fn looks_binary(head: &[u8]) -> bool {
    if head.contains(&0) {
        return true;
    }
    match std::str::from_utf8(head) {
        Ok(_) => false,
        Err(e) => e.error_len().is_some(),
    }
}
