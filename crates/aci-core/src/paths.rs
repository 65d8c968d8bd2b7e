use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const ACI_DIR: &str = ".aci";
pub const CONFIG_FILE: &str = ".aci/config.yaml";
pub const HISTORY_DIR: &str = ".aci/history";

/// Directory names never descended into while indexing or exploring.
pub const SKIPPED_DIRS: &[&str] = &[
    "node_modules",
    "target",
    "__pycache__",
    "venv",
    "dist",
    "build",
];

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn aci_dir(root: &Path) -> PathBuf {
    root.join(ACI_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn history_dir(root: &Path) -> PathBuf {
    root.join(HISTORY_DIR)
}

/// `~/.aci/config.yaml`, used when the project has no config of its own.
pub fn user_config_path() -> Option<PathBuf> {
    home::home_dir().map(|h| h.join(CONFIG_FILE))
}

pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

pub fn is_skipped_dir(name: &str) -> bool {
    is_hidden(name) || SKIPPED_DIRS.contains(&name)
}
