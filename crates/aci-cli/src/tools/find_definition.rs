use super::{required_str, AciTool};
use aci_core::config::Config;
use aci_core::viewer::FileViewer;
use std::path::Path;

pub struct FindDefinitionTool;

impl AciTool for FindDefinitionTool {
    fn name(&self) -> &str {
        "find_definition"
    }

    fn description(&self) -> &str {
        "Find where a symbol used in a file is defined, following imports"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "file": {
                    "type": "string",
                    "description": "File the symbol is used in"
                },
                "symbol": {
                    "type": "string",
                    "description": "Symbol name"
                }
            },
            "required": ["file", "symbol"]
        })
    }

    fn call(&self, args: serde_json::Value, root: &Path) -> Result<serde_json::Value, String> {
        let file = root.join(required_str(&args, "file")?);
        let symbol = required_str(&args, "symbol")?;

        let viewer = load(root, &file)?;
        let target = viewer
            .find_definition(symbol)
            .ok_or_else(|| format!("no definition found for '{symbol}'"))?;
        serde_json::to_value(&target).map_err(|e| e.to_string())
    }
}

pub(super) fn load(root: &Path, file: &Path) -> Result<FileViewer, String> {
    let config = Config::load(root).map_err(|e| e.to_string())?;
    let mut viewer = FileViewer::new(root, config.viewer);
    viewer
        .load_file(file)
        .map_err(|e| format!("failed to open {}: {e}", file.display()))?;
    Ok(viewer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn finds_definition_in_same_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("main.py"),
            "def greet():\n    return 1\n\ngreet()\n",
        )
        .unwrap();

        let result = FindDefinitionTool
            .call(
                serde_json::json!({"file": "main.py", "symbol": "greet"}),
                dir.path(),
            )
            .unwrap();
        assert_eq!(result["line"], 1);
        assert_eq!(result["kind"], "definition");
        assert_eq!(result["symbol"], "greet");
    }

    #[test]
    fn unknown_symbol_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("main.py"), "x = 1\n").unwrap();

        let err = FindDefinitionTool
            .call(
                serde_json::json!({"file": "main.py", "symbol": "nowhere"}),
                dir.path(),
            )
            .unwrap_err();
        assert!(err.contains("no definition found"));
    }
}
