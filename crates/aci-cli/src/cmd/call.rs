use aci_core::editor::EditRequest;
use aci_core::tool::file_editor;
use anyhow::Context;
use std::io::Read;
use std::path::Path;

/// Read one `EditRequest` as JSON and print the `oh_aci_output` envelope.
/// Tool errors are reported inside the envelope; the exit status stays 0.
pub fn run(root: &Path, input: Option<&str>) -> anyhow::Result<()> {
    let raw = match input {
        Some(s) => s.to_string(),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read request from stdin")?;
            buf
        }
    };

    let req: EditRequest =
        serde_json::from_str(raw.trim()).context("request is not a valid editor call")?;
    let editor = super::edit::editor(root)?;
    println!("{}", file_editor(&editor, &req));
    Ok(())
}
