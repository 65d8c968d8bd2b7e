use crate::output::print_json;
use aci_core::config::Config;
use aci_core::editor::{EditRequest, Editor};
use aci_core::paths;
use aci_core::results::ToolResult;
use anyhow::Context;
use std::path::Path;

/// Editor configured from the project config, with undo history kept under
/// `<root>/.aci/history` so `undo` works across invocations.
pub fn editor(root: &Path) -> anyhow::Result<Editor> {
    let config = Config::load(root)
        .context("failed to load config")?
        .with_history_dir(paths::history_dir(root));
    Editor::from_config(&config).context("failed to initialise editor")
}

pub fn request(command: &str, path: &Path) -> EditRequest {
    EditRequest::new(command, path)
}

pub fn create(
    root: &Path,
    path: &Path,
    text: Option<String>,
    from_file: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let text = match (text, from_file) {
        (Some(text), _) => text,
        (None, Some(src)) => std::fs::read_to_string(src)
            .with_context(|| format!("failed to read {}", src.display()))?,
        (None, None) => anyhow::bail!("either --text or --file is required"),
    };
    run(root, request("create", path).file_text(text), json)
}

/// Execute one request and print its result. Tool errors are printed as
/// `ERROR:` output on stdout and end the process with status 1.
pub fn run(root: &Path, req: EditRequest, json: bool) -> anyhow::Result<()> {
    let editor = editor(root)?;
    let result = match editor.execute(&req) {
        Ok(result) => result,
        Err(e) if e.is_tool_error() => ToolResult::error(e.to_string()),
        Err(e) => return Err(e).context(format!("{} failed", req.command)),
    };

    if json {
        print_json(&result)?;
    } else {
        let text = result.formatted();
        if text.ends_with('\n') {
            print!("{text}");
        } else {
            println!("{text}");
        }
    }

    if result.error.is_some() {
        std::process::exit(1);
    }
    Ok(())
}
