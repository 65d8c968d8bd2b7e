use super::find_definition::load;
use super::{required_str, AciTool};
use std::path::Path;

pub struct FindReferencesTool;

impl AciTool for FindReferencesTool {
    fn name(&self) -> &str {
        "find_references"
    }

    fn description(&self) -> &str {
        "List every use of a symbol across the workspace, excluding its definition"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "file": {
                    "type": "string",
                    "description": "File the symbol is defined or imported in"
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
        let refs = viewer.find_references(symbol);
        serde_json::to_value(&refs).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn lists_call_sites() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("main.py"),
            "def greet():\n    return 1\n\ngreet()\n",
        )
        .unwrap();

        let result = FindReferencesTool
            .call(
                serde_json::json!({"file": "main.py", "symbol": "greet"}),
                dir.path(),
            )
            .unwrap();
        let refs = result.as_array().unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0]["line"], 4);
        assert_eq!(refs[0]["kind"], "reference");
    }

    #[test]
    fn undefined_symbol_has_no_references() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("main.py"), "print(other)\n").unwrap();

        let result = FindReferencesTool
            .call(
                serde_json::json!({"file": "main.py", "symbol": "other"}),
                dir.path(),
            )
            .unwrap();
        assert_eq!(result, serde_json::json!([]));
    }
}
