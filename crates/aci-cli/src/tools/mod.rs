use std::path::Path;

pub mod find_definition;
pub mod find_references;
pub mod lint_file;
pub mod oh_editor;

/// One tool exposed over MCP. `call` returns either a JSON value or, for a
/// plain text result, a JSON string that is passed through verbatim.
pub trait AciTool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn schema(&self) -> serde_json::Value;
    fn call(&self, args: serde_json::Value, root: &Path) -> Result<serde_json::Value, String>;
}

pub fn all_tools() -> Vec<Box<dyn AciTool>> {
    vec![
        Box::new(oh_editor::OhEditorTool),
        Box::new(lint_file::LintFileTool),
        Box::new(find_definition::FindDefinitionTool),
        Box::new(find_references::FindReferencesTool),
    ]
}

fn required_str<'a>(args: &'a serde_json::Value, name: &str) -> Result<&'a str, String> {
    args[name]
        .as_str()
        .ok_or_else(|| format!("missing required argument: {name}"))
}
