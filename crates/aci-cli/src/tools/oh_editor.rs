use super::AciTool;
use aci_core::editor::{Command, EditRequest, TOOL_NAME};
use std::path::Path;

pub struct OhEditorTool;

impl AciTool for OhEditorTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Custom editing tool for viewing, creating and editing files. \
         `view` shows a file with line numbers or lists a directory two levels deep; \
         `create` writes a new file; `str_replace` replaces exactly one occurrence of `old_str`; \
         `insert` adds `new_str` after `insert_line`; `undo_edit` reverts the last edit. \
         Paths must be absolute."
    }

    fn schema(&self) -> serde_json::Value {
        let commands: Vec<&str> = Command::all().iter().map(|c| c.as_str()).collect();
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "enum": commands,
                    "description": "The command to run"
                },
                "path": {
                    "type": "string",
                    "description": "Absolute path to a file or directory"
                },
                "file_text": {
                    "type": "string",
                    "description": "Content of the file to create (create)"
                },
                "view_range": {
                    "type": "array",
                    "items": {"type": "integer"},
                    "description": "[start, end] lines to view; end -1 means end of file (view)"
                },
                "old_str": {
                    "type": "string",
                    "description": "Text to replace; must match exactly once (str_replace)"
                },
                "new_str": {
                    "type": "string",
                    "description": "Replacement or inserted text (str_replace, insert)"
                },
                "insert_line": {
                    "type": "integer",
                    "description": "Line after which to insert; 0 inserts at the top (insert)"
                },
                "enable_linting": {
                    "type": "boolean",
                    "description": "Report lint issues introduced by the edit (str_replace, insert)"
                }
            },
            "required": ["command", "path"]
        })
    }

    fn call(&self, args: serde_json::Value, root: &Path) -> Result<serde_json::Value, String> {
        let req: EditRequest =
            serde_json::from_value(args).map_err(|e| format!("invalid arguments: {e}"))?;
        let editor = crate::cmd::edit::editor(root).map_err(|e| format!("{e:#}"))?;

        match editor.execute(&req) {
            Ok(result) if result.error.is_none() => Ok(serde_json::Value::String(result.formatted())),
            Ok(result) => Err(result.formatted()),
            Err(e) => Err(format!("ERROR:\n{e}")),
        }
    }
}
