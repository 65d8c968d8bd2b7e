use crate::error::Result;
use crate::paths;
use crate::results::{MAX_RESPONSE_LEN_CHAR, SNIPPET_CONTEXT_WINDOW};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// EditorConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,
    #[serde(default = "default_max_history")]
    pub max_history_per_file: usize,
    #[serde(default = "default_snippet_window")]
    pub snippet_context_window: usize,
    #[serde(default = "default_max_response_len")]
    pub max_response_len_chars: usize,
    #[serde(default)]
    pub enable_linting: bool,
    /// Where undo history lives. `None` keeps it in a private temp dir
    /// that disappears with the editor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_dir: Option<PathBuf>,
}

fn default_max_file_size_mb() -> u64 {
    10
}

fn default_max_history() -> usize {
    10
}

fn default_snippet_window() -> usize {
    SNIPPET_CONTEXT_WINDOW
}

fn default_max_response_len() -> usize {
    MAX_RESPONSE_LEN_CHAR
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: default_max_file_size_mb(),
            max_history_per_file: default_max_history(),
            snippet_context_window: default_snippet_window(),
            max_response_len_chars: default_max_response_len(),
            enable_linting: false,
            history_dir: None,
        }
    }
}

impl EditorConfig {
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }
}

// ---------------------------------------------------------------------------
// ShellConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShellConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

// ---------------------------------------------------------------------------
// LinterConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinterConfig {
    #[serde(default = "default_use_flake8")]
    pub use_flake8: bool,
    #[serde(default = "default_flake8_select")]
    pub flake8_select: Vec<String>,
}

fn default_use_flake8() -> bool {
    true
}

fn default_flake8_select() -> Vec<String> {
    ["F821", "F822", "F831", "E112", "E113", "E999", "E902"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for LinterConfig {
    fn default() -> Self {
        Self {
            use_flake8: default_use_flake8(),
            flake8_select: default_flake8_select(),
        }
    }
}

// ---------------------------------------------------------------------------
// ViewerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_jump_context")]
    pub jump_context: usize,
}

fn default_page_size() -> usize {
    20
}

fn default_jump_context() -> usize {
    10
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            jump_context: default_jump_context(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default)]
    pub shell: ShellConfig,
    #[serde(default)]
    pub linter: LinterConfig,
    #[serde(default)]
    pub viewer: ViewerConfig,
}

impl Config {
    /// Load `<root>/.aci/config.yaml`, falling back to `~/.aci/config.yaml`
    /// and then to defaults. A missing file is not an error.
    pub fn load(root: &Path) -> Result<Self> {
        let project = paths::config_path(root);
        if project.exists() {
            return Self::load_file(&project);
        }
        if let Some(user) = paths::user_config_path() {
            if user.exists() {
                return Self::load_file(&user);
            }
        }
        Ok(Self::default())
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Fill in the history directory for editors that persist undo state
    /// across process runs.
    pub fn with_history_dir(mut self, dir: PathBuf) -> Self {
        if self.editor.history_dir.is_none() {
            self.editor.history_dir = Some(dir);
        }
        self
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.editor.max_file_size_mb == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "editor.max_file_size_mb is 0: every file would be rejected".into(),
            });
        }

        if self.editor.max_history_per_file == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "editor.max_history_per_file is 0: undo_edit will never work".into(),
            });
        }

        if self.editor.snippet_context_window > 100 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "editor.snippet_context_window is {}: edit snippets will be very long",
                    self.editor.snippet_context_window
                ),
            });
        }

        if self.editor.max_response_len_chars == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "editor.max_response_len_chars is 0: output is never truncated".into(),
            });
        }

        if self.shell.timeout_secs == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "shell.timeout_secs is 0: every command would time out".into(),
            });
        }

        if self.linter.use_flake8 && self.linter.flake8_select.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "linter.flake8_select is empty: flake8 will report every check".into(),
            });
        }

        if self.viewer.page_size == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "viewer.page_size is 0: views will be empty".into(),
            });
        }

        warnings
    }
}
