use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Limits and notices
// ---------------------------------------------------------------------------

pub const MAX_RESPONSE_LEN_CHAR: usize = 16_000;
pub const SNIPPET_CONTEXT_WINDOW: usize = 4;

pub const CONTENT_TRUNCATED_NOTICE: &str = "<response clipped><NOTE>Due to the max output limit, only part of the full response has been shown to you.</NOTE>";

pub const FILE_CONTENT_TRUNCATED_NOTICE: &str = "<response clipped><NOTE>Due to the max output limit, only part of this file has been shown to you. You should retry this tool after you have searched inside the file with `grep -n` in order to find the line numbers of what you are looking for.</NOTE>";

pub const DIRECTORY_CONTENT_TRUNCATED_NOTICE: &str = "<response clipped><NOTE>Due to the max output limit, only part of this directory has been shown to you. You should use `ls -la` instead to view large directories incrementally.</NOTE>";

// ---------------------------------------------------------------------------
// ToolResult
// ---------------------------------------------------------------------------

/// Outcome of one editor command, as reported to the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub output: Option<String>,
    pub error: Option<String>,
    pub path: Option<String>,
    pub prev_exist: bool,
    pub old_content: Option<String>,
    pub new_content: Option<String>,
}

impl Default for ToolResult {
    fn default() -> Self {
        Self {
            output: None,
            error: None,
            path: None,
            prev_exist: true,
            old_content: None,
            new_content: None,
        }
    }
}

impl ToolResult {
    pub fn output(output: impl Into<String>) -> Self {
        Self {
            output: Some(output.into()),
            ..Self::default()
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// True when neither output nor error carries any text.
    pub fn is_empty(&self) -> bool {
        let blank = |s: &Option<String>| s.as_deref().map_or(true, str::is_empty);
        blank(&self.output) && blank(&self.error)
    }

    /// The text an agent sees: the error prefixed with `ERROR:`, or the output.
    pub fn formatted(&self) -> String {
        match self.error.as_deref() {
            Some(err) if !err.is_empty() => format!("ERROR:\n{err}"),
            _ => self.output.clone().unwrap_or_default(),
        }
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

// ---------------------------------------------------------------------------
// Truncation
// ---------------------------------------------------------------------------

/// Cut `content` to `truncate_after` characters and append `notice`.
///
/// `None` or `0` disables truncation. Counting is by `char`, so multi-byte
/// text is never split inside a code point.
pub fn maybe_truncate(content: &str, truncate_after: Option<usize>, notice: &str) -> String {
    let limit = match truncate_after {
        Some(n) if n > 0 => n,
        _ => return content.to_string(),
    };
    match content.char_indices().nth(limit) {
        None => content.to_string(),
        Some((cut, _)) => {
            let mut out = String::with_capacity(cut + notice.len());
            out.push_str(&content[..cut]);
            out.push_str(notice);
            out
        }
    }
}
