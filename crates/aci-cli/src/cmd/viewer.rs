use crate::output::{print_json, print_table};
use aci_core::config::Config;
use aci_core::viewer::{DirNode, FileViewer};
use anyhow::Context;
use std::path::Path;

fn open(root: &Path, file: Option<&Path>) -> anyhow::Result<FileViewer> {
    let config = Config::load(root).context("failed to load config")?;
    let mut viewer = FileViewer::new(root, config.viewer);
    if let Some(file) = file {
        viewer
            .load_file(file)
            .with_context(|| format!("failed to open {}", file.display()))?;
    }
    Ok(viewer)
}

// ---------------------------------------------------------------------------
// explore / show
// ---------------------------------------------------------------------------

pub fn explore(
    root: &Path,
    path: Option<&Path>,
    depth: Option<usize>,
    json: bool,
) -> anyhow::Result<()> {
    let viewer = open(root, None)?;
    let tree = viewer
        .directory_structure(path, depth)
        .context("failed to read directory")?;

    if json {
        return print_json(&tree);
    }
    let label = path.unwrap_or(root);
    println!("{}/", label.display());
    let mut lines = Vec::new();
    render_tree(&tree, 1, &mut lines);
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

fn render_tree(node: &DirNode, indent: usize, out: &mut Vec<String>) {
    let DirNode::Dir(children) = node else {
        return;
    };
    let pad = "  ".repeat(indent);
    for (name, child) in children {
        match child {
            DirNode::File(_) => out.push(format!("{pad}{name}")),
            DirNode::Dir(_) => {
                out.push(format!("{pad}{name}/"));
                render_tree(child, indent + 1, out);
            }
        }
    }
}

pub fn show(
    root: &Path,
    file: &Path,
    start: Option<usize>,
    end: Option<usize>,
    json: bool,
) -> anyhow::Result<()> {
    let viewer = open(root, Some(file))?;
    let lines = viewer.view_content(start, end);
    if json {
        return print_json(&lines);
    }
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

pub fn find_def(root: &Path, file: &Path, symbol: &str, json: bool) -> anyhow::Result<()> {
    let mut viewer = open(root, Some(file))?;
    let Some(target) = viewer.find_definition(symbol) else {
        anyhow::bail!("no definition found for '{symbol}'");
    };

    if json {
        return print_json(&target);
    }
    for line in viewer.jump_to_target(&target)? {
        println!("{line}");
    }
    Ok(())
}

pub fn find_refs(root: &Path, file: &Path, symbol: &str, json: bool) -> anyhow::Result<()> {
    let viewer = open(root, Some(file))?;
    let refs = viewer.find_references(symbol);

    if json {
        return print_json(&refs);
    }
    if refs.is_empty() {
        println!("No references found for '{symbol}'.");
        return Ok(());
    }
    let rows = refs
        .iter()
        .map(|r| {
            vec![
                r.file_path.display().to_string(),
                r.line.to_string(),
                r.column.to_string(),
            ]
        })
        .collect();
    print_table(&["FILE", "LINE", "COLUMN"], rows);
    Ok(())
}

pub fn symbol_info(root: &Path, file: &Path, symbol: &str) -> anyhow::Result<()> {
    let viewer = open(root, Some(file))?;
    let details = viewer
        .symbol_info(symbol)
        .context("no file loaded")?;
    print_json(&details)
}

pub fn calls(root: &Path, file: &Path, function: &str, json: bool) -> anyhow::Result<()> {
    let viewer = open(root, Some(file))?;
    let hierarchy = viewer
        .call_hierarchy(function)
        .context("no file loaded")?;

    if json {
        return print_json(&hierarchy);
    }
    println!("Callers of '{function}':");
    for caller in &hierarchy.callers {
        println!("  {caller}");
    }
    println!("Callees of '{function}':");
    for callee in &hierarchy.callees {
        println!("  {callee}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn render_tree_indents_nested_dirs() {
        let mut inner = BTreeMap::new();
        inner.insert("b.py".to_string(), DirNode::File("/w/pkg/b.py".into()));
        let mut top = BTreeMap::new();
        top.insert("a.py".to_string(), DirNode::File("/w/a.py".into()));
        top.insert("pkg".to_string(), DirNode::Dir(inner));

        let mut lines = Vec::new();
        render_tree(&DirNode::Dir(top), 1, &mut lines);
        assert_eq!(lines, vec!["  a.py", "  pkg/", "    b.py"]);
    }
}
