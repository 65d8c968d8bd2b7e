use crate::output::print_json;
use aci_core::config::Config;
use aci_core::linter::DefaultLinter;
use anyhow::Context;
use std::path::Path;

pub fn run(root: &Path, file: &Path, against: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let linter = DefaultLinter::from_config(&config);

    let results = match against {
        Some(original) => linter.lint_file_diff(original, file),
        None => linter.lint(file),
    }
    .with_context(|| format!("failed to lint {}", file.display()))?;

    if json {
        print_json(&results)?;
        return Ok(());
    }

    if results.is_empty() {
        println!("No linting issues found.");
        return Ok(());
    }

    for r in &results {
        println!("{}:{}:{}: {}", r.file, r.line, r.column, r.message);
        println!("{}", r.visualize());
        println!();
    }
    anyhow::bail!("{} linting issue(s) found", results.len());
}
