use super::{required_str, AciTool};
use aci_core::config::Config;
use aci_core::linter::DefaultLinter;
use std::path::Path;

pub struct LintFileTool;

impl AciTool for LintFileTool {
    fn name(&self) -> &str {
        "lint_file"
    }

    fn description(&self) -> &str {
        "Lint a file. With `against`, report only issues not already present in that older version"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "File to lint (relative paths resolve against the project root)"
                },
                "against": {
                    "type": "string",
                    "description": "Older version of the file"
                }
            },
            "required": ["path"]
        })
    }

    fn call(&self, args: serde_json::Value, root: &Path) -> Result<serde_json::Value, String> {
        let path = root.join(required_str(&args, "path")?);
        let config = Config::load(root).map_err(|e| e.to_string())?;
        let linter = DefaultLinter::from_config(&config);

        let results = match args["against"].as_str() {
            Some(against) => linter.lint_file_diff(&root.join(against), &path),
            None => linter.lint(&path),
        }
        .map_err(|e| e.to_string())?;

        serde_json::to_value(&results).map_err(|e| e.to_string())
    }
}
