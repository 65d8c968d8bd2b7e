//! Workspace symbol index: definitions, imports and references.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tree_sitter::Node;

use crate::error::Result;
use crate::lang::{node_text, walk_tree, Language};
use crate::paths::{is_hidden, is_skipped_dir};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Where a symbol sits. Lines are 1-based, columns 0-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolLocation {
    pub file_path: PathBuf,
    pub line: usize,
    pub column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl SymbolLocation {
    fn of(node: Node<'_>, file_path: &Path) -> Self {
        let start = node.start_position();
        let end = node.end_position();
        Self {
            file_path: file_path.to_path_buf(),
            line: start.row + 1,
            column: start.column,
            end_line: end.row + 1,
            end_column: end.column,
        }
    }

    fn contains_line(&self, line: usize) -> bool {
        self.line <= line && line <= self.end_line
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub name: String,
    /// `function`, `method`, `class`, `struct`, ...
    pub kind: String,
    pub location: SymbolLocation,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallHierarchy {
    pub callers: Vec<String>,
    pub callees: Vec<String>,
}

#[derive(Debug, Clone)]
struct FileIndex {
    language: Language,
    symbols: Vec<SymbolInfo>,
    imports: BTreeSet<PathBuf>,
    import_map: HashMap<String, PathBuf>,
}

impl FileIndex {
    fn symbol(&self, name: &str) -> Option<&SymbolInfo> {
        self.symbols.iter().find(|s| s.name == name)
    }
}

// ---------------------------------------------------------------------------
// Definition nodes
// ---------------------------------------------------------------------------

/// Kind label for nodes that define a named symbol.
pub(crate) fn definition_kind(language: Language, node: Node<'_>) -> Option<&'static str> {
    let kind = match (language, node.kind()) {
        (Language::Python, "function_definition") => {
            if nested_in(node, &["class_definition"]) {
                "method"
            } else {
                "function"
            }
        }
        (Language::Python, "class_definition") => "class",

        (Language::JavaScript | Language::TypeScript | Language::Tsx, k) => match k {
            "function_declaration" | "generator_function_declaration" => "function",
            "class_declaration" | "abstract_class_declaration" => "class",
            "method_definition" => "method",
            "interface_declaration" => "interface",
            "type_alias_declaration" => "type",
            "enum_declaration" => "enum",
            "variable_declarator" => match node.child_by_field_name("value")?.kind() {
                "arrow_function" | "function_expression" | "function" => "function",
                _ => return None,
            },
            _ => return None,
        },

        (Language::Rust, "function_item") => {
            if nested_in(node, &["impl_item", "trait_item"]) {
                "method"
            } else {
                "function"
            }
        }
        (Language::Rust, "function_signature_item") => "method",
        (Language::Rust, "struct_item") => "struct",
        (Language::Rust, "enum_item") => "enum",
        (Language::Rust, "trait_item") => "trait",
        (Language::Rust, "type_item") => "type",
        (Language::Rust, "mod_item") => "module",

        (Language::Go, "function_declaration") => "function",
        (Language::Go, "method_declaration") => "method",
        (Language::Go, "type_spec") => match node.child_by_field_name("type").map(|t| t.kind()) {
            Some("struct_type") => "struct",
            Some("interface_type") => "interface",
            _ => "type",
        },

        (Language::Java, "class_declaration" | "record_declaration") => "class",
        (Language::Java, "interface_declaration") => "interface",
        (Language::Java, "enum_declaration") => "enum",
        (Language::Java, "method_declaration") => "method",
        (Language::Java, "constructor_declaration") => "constructor",

        _ => return None,
    };
    Some(kind)
}

/// True when `node` sits directly in the body of one of `containers`.
fn nested_in(node: Node<'_>, containers: &[&str]) -> bool {
    let mut current = node.parent();
    while let Some(parent) = current {
        match parent.kind() {
            "block" | "decorated_definition" | "declaration_list" | "class_body" => {
                current = parent.parent()
            }
            kind => return containers.contains(&kind),
        }
    }
    false
}

fn is_identifier_kind(kind: &str) -> bool {
    matches!(
        kind,
        "identifier"
            | "type_identifier"
            | "field_identifier"
            | "property_identifier"
            | "shorthand_property_identifier"
    )
}

/// The name node of the definition `node` names, if it is one.
fn is_definition_name(language: Language, node: Node<'_>) -> bool {
    node.parent().is_some_and(|parent| {
        definition_kind(language, parent).is_some()
            && parent.child_by_field_name("name") == Some(node)
    })
}

fn call_target(language: Language, node: Node<'_>) -> Option<Node<'_>> {
    match (language, node.kind()) {
        (Language::Python, "call") => node.child_by_field_name("function"),
        (Language::Java, "method_invocation") => node.child_by_field_name("name"),
        (Language::Python | Language::Java, _) => None,
        (_, "call_expression") => node.child_by_field_name("function"),
        _ => None,
    }
}

/// Rightmost name of a call target: `foo`, `obj.foo`, `pkg::foo` all give `foo`.
fn callee_name<'s>(target: Node<'_>, source: &'s str) -> Option<&'s str> {
    let name_node = match target.kind() {
        k if is_identifier_kind(k) => target,
        "attribute" => target.child_by_field_name("attribute")?,
        "member_expression" => target.child_by_field_name("property")?,
        "field_expression" | "selector_expression" => target.child_by_field_name("field")?,
        "scoped_identifier" => target.child_by_field_name("name")?,
        _ => return None,
    };
    Some(node_text(name_node, source))
}

// ---------------------------------------------------------------------------
// CodeIntelligence
// ---------------------------------------------------------------------------

pub struct CodeIntelligence {
    root: PathBuf,
    files: BTreeMap<PathBuf, FileIndex>,
}

impl CodeIntelligence {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root = root.canonicalize().unwrap_or(root);
        Self {
            root,
            files: BTreeMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key(&self, path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
    }

    /// Index every supported file under `path`. Returns the number indexed.
    pub fn index_workspace(&mut self, path: &Path) -> usize {
        let mut files = Vec::new();
        collect_source_files(path, &mut files);
        let mut indexed = 0;
        for file in files {
            match self.index_file(&file) {
                Ok(true) => indexed += 1,
                Ok(false) => {}
                Err(e) => tracing::warn!(path = %file.display(), error = %e, "failed to index file"),
            }
        }
        tracing::debug!(root = %path.display(), files = indexed, "workspace indexed");
        indexed
    }

    /// Index one file. `Ok(false)` when its language is not supported.
    pub fn index_file(&mut self, path: &Path) -> Result<bool> {
        let Some(language) = Language::from_path(path) else {
            return Ok(false);
        };
        let key = self.key(path);
        let source = std::fs::read_to_string(&key)?;
        let tree = language.parse(&source)?;
        let root = tree.root_node();

        let mut symbols = Vec::new();
        walk_tree(root, |node| {
            let Some(kind) = definition_kind(language, node) else {
                return;
            };
            if let Some(name) = node.child_by_field_name("name") {
                symbols.push(SymbolInfo {
                    name: node_text(name, &source).to_string(),
                    kind: kind.to_string(),
                    location: SymbolLocation::of(node, &key),
                });
            }
        });

        let mut index = FileIndex {
            language,
            symbols,
            imports: BTreeSet::new(),
            import_map: HashMap::new(),
        };
        self.collect_imports(root, &source, &key, &mut index);
        self.files.insert(key, index);
        Ok(true)
    }

    pub fn is_indexed(&self, path: &Path) -> bool {
        self.files.contains_key(&self.key(path))
    }

    pub fn indexed_files(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    pub fn symbols(&self, path: &Path) -> &[SymbolInfo] {
        self.files
            .get(&self.key(path))
            .map(|f| f.symbols.as_slice())
            .unwrap_or_default()
    }

    pub fn imports(&self, path: &Path) -> Option<&BTreeSet<PathBuf>> {
        self.files.get(&self.key(path)).map(|f| &f.imports)
    }

    pub fn import_map(&self, path: &Path) -> Option<&HashMap<String, PathBuf>> {
        self.files.get(&self.key(path)).map(|f| &f.import_map)
    }

    // -----------------------------------------------------------------------
    // Imports
    // -----------------------------------------------------------------------

    fn collect_imports(&self, root: Node<'_>, source: &str, file: &Path, index: &mut FileIndex) {
        let language = index.language;
        walk_tree(root, |node| match (language, node.kind()) {
            (Language::Python, "import_statement") => {
                let mut cursor = node.walk();
                for name in node.children_by_field_name("name", &mut cursor) {
                    let module = match name.kind() {
                        "aliased_import" => name.child_by_field_name("name"),
                        _ => Some(name),
                    };
                    if let Some(resolved) =
                        module.and_then(|m| self.resolve_python_module(file, node_text(m, source)))
                    {
                        index.imports.insert(resolved);
                    }
                }
            }
            (Language::Python, "import_from_statement") => {
                let Some(module) = node.child_by_field_name("module_name") else {
                    return;
                };
                let Some(resolved) = self.resolve_python_module(file, node_text(module, source))
                else {
                    return;
                };
                let mut cursor = node.walk();
                for name in node.children_by_field_name("name", &mut cursor) {
                    let original = match name.kind() {
                        "aliased_import" => name.child_by_field_name("name"),
                        _ => Some(name),
                    };
                    if let Some(original) = original {
                        index
                            .import_map
                            .insert(node_text(original, source).to_string(), resolved.clone());
                    }
                }
                index.imports.insert(resolved);
            }
            (l, "import_statement") if l.is_js_family() => {
                let Some(spec) = node.child_by_field_name("source") else {
                    return;
                };
                let spec = node_text(spec, source).trim_matches(|c| c == '"' || c == '\'');
                let Some(resolved) = self.resolve_js_module(file, spec) else {
                    return;
                };
                walk_tree(node, |n| {
                    let name = match n.kind() {
                        "import_specifier" => n.child_by_field_name("name"),
                        "identifier" if n.parent().is_some_and(|p| p.kind() == "import_clause") => {
                            Some(n)
                        }
                        _ => None,
                    };
                    if let Some(name) = name {
                        index
                            .import_map
                            .insert(node_text(name, source).to_string(), resolved.clone());
                    }
                });
                index.imports.insert(resolved);
            }
            _ => {}
        });
    }

    /// Resolve `a.b`, `.a` or `..a.b` to a module file, trying the importing
    /// file's directory before the workspace root.
    fn resolve_python_module(&self, file: &Path, module: &str) -> Option<PathBuf> {
        let dots = module.chars().take_while(|&c| c == '.').count();
        let relative: PathBuf = module[dots..].split('.').filter(|s| !s.is_empty()).collect();

        let mut bases = Vec::new();
        if dots > 0 {
            let mut base = file.parent()?;
            for _ in 1..dots {
                base = base.parent()?;
            }
            bases.push(base.to_path_buf());
        } else {
            bases.extend(file.parent().map(Path::to_path_buf));
            bases.push(self.root.clone());
        }

        for base in bases {
            let target = base.join(&relative);
            let mut candidates = Vec::with_capacity(2);
            if !relative.as_os_str().is_empty() {
                candidates.push(PathBuf::from(format!("{}.py", target.display())));
            }
            candidates.push(target.join("__init__.py"));
            if let Some(found) = candidates.into_iter().find(|c| c.is_file()) {
                return Some(self.key(&found));
            }
        }
        None
    }

    fn resolve_js_module(&self, file: &Path, spec: &str) -> Option<PathBuf> {
        const EXTS: &[&str] = &["js", "jsx", "ts", "tsx", "mjs", "cjs"];
        let bases = [file.parent().map(Path::to_path_buf), Some(self.root.clone())];
        for base in bases.into_iter().flatten() {
            let target = base.join(spec);
            let mut candidates = vec![target.clone()];
            candidates.extend(EXTS.iter().map(|ext| PathBuf::from(format!("{}.{ext}", target.display()))));
            candidates.extend(EXTS.iter().map(|ext| target.join(format!("index.{ext}"))));
            if let Some(found) = candidates
                .into_iter()
                .find(|c| c.is_file() && Language::from_path(c).is_some())
            {
                return Some(self.key(&found));
            }
        }
        None
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Look in `current_file`, then where its imports say the symbol comes
    /// from, then in every file it imports.
    pub fn find_definition(&self, symbol: &str, current_file: &Path) -> Option<SymbolLocation> {
        let index = self.files.get(&self.key(current_file))?;
        if let Some(info) = index.symbol(symbol) {
            return Some(info.location.clone());
        }

        if let Some(info) = index
            .import_map
            .get(symbol)
            .and_then(|module| self.files.get(module))
            .and_then(|module| module.symbol(symbol))
        {
            return Some(info.location.clone());
        }

        index
            .imports
            .iter()
            .filter_map(|path| self.files.get(path))
            .find_map(|imported| imported.symbol(symbol))
            .map(|info| info.location.clone())
    }

    /// Every use of `symbol` in indexed files of the defining language.
    /// Empty when no definition can be found.
    pub fn find_references(&self, symbol: &str, current_file: &Path) -> Vec<SymbolLocation> {
        let Some(definition) = self.find_definition(symbol, current_file) else {
            return Vec::new();
        };
        let Some(def_language) = Language::from_path(&definition.file_path) else {
            return Vec::new();
        };

        let mut references = Vec::new();
        for (path, index) in &self.files {
            if !same_family(index.language, def_language) {
                continue;
            }
            match self.references_in_file(symbol, path, index.language) {
                Ok(found) => references.extend(found),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to scan file"),
            }
        }
        references
    }

    fn references_in_file(
        &self,
        symbol: &str,
        path: &Path,
        language: Language,
    ) -> Result<Vec<SymbolLocation>> {
        let source = std::fs::read_to_string(path)?;
        if !source.contains(symbol) {
            return Ok(Vec::new());
        }
        let tree = language.parse(&source)?;
        let mut found = Vec::new();
        walk_tree(tree.root_node(), |node| {
            if is_identifier_kind(node.kind())
                && node_text(node, &source) == symbol
                && !is_definition_name(language, node)
            {
                found.push(SymbolLocation::of(node, path));
            }
        });
        Ok(found)
    }

    /// Functions calling `function` from other files, and the names it calls.
    pub fn call_hierarchy(&self, function: &str, file: &Path) -> CallHierarchy {
        let mut hierarchy = CallHierarchy::default();
        let Some(definition) = self.find_definition(function, file) else {
            return hierarchy;
        };

        for reference in self.find_references(function, file) {
            if reference.file_path == definition.file_path {
                continue;
            }
            if let Some(caller) = self.enclosing_function(&reference.file_path, reference.line) {
                if !hierarchy.callers.contains(&caller) {
                    hierarchy.callers.push(caller);
                }
            }
        }

        match self.callees(function, &definition) {
            Ok(callees) => hierarchy.callees = callees,
            Err(e) => tracing::warn!(function, error = %e, "failed to collect callees"),
        }
        hierarchy
    }

    /// Innermost function or method spanning `line`.
    fn enclosing_function(&self, path: &Path, line: usize) -> Option<String> {
        self.files
            .get(path)?
            .symbols
            .iter()
            .filter(|s| matches!(s.kind.as_str(), "function" | "method" | "constructor"))
            .filter(|s| s.location.contains_line(line))
            .min_by_key(|s| s.location.end_line - s.location.line)
            .map(|s| s.name.clone())
    }

    fn callees(&self, function: &str, definition: &SymbolLocation) -> Result<Vec<String>> {
        let Some(language) = Language::from_path(&definition.file_path) else {
            return Ok(Vec::new());
        };
        let source = std::fs::read_to_string(&definition.file_path)?;
        let tree = language.parse(&source)?;

        let mut def_node = None;
        walk_tree(tree.root_node(), |node| {
            if def_node.is_none()
                && node.start_position().row + 1 == definition.line
                && definition_kind(language, node).is_some()
                && node
                    .child_by_field_name("name")
                    .is_some_and(|n| node_text(n, &source) == function)
            {
                def_node = Some(node);
            }
        });
        let Some(def_node) = def_node else {
            return Ok(Vec::new());
        };

        let mut callees: Vec<String> = Vec::new();
        walk_tree(def_node, |node| {
            if let Some(name) = call_target(language, node).and_then(|t| callee_name(t, &source)) {
                if !callees.iter().any(|c| c == name) {
                    callees.push(name.to_string());
                }
            }
        });
        Ok(callees)
    }
}

fn same_family(a: Language, b: Language) -> bool {
    a == b || (a.is_js_family() && b.is_js_family())
}

fn collect_source_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "cannot read directory");
            return;
        }
    };
    let mut paths: Vec<(PathBuf, bool)> = entries
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let name = e.file_name().to_string_lossy().into_owned();
            if is_hidden(&name) {
                return None;
            }
            let file_type = e.file_type().ok()?;
            if file_type.is_dir() && is_skipped_dir(&name) {
                return None;
            }
            Some((e.path(), file_type.is_dir()))
        })
        .collect();
    paths.sort();
    for (path, is_dir) in paths {
        if is_dir {
            collect_source_files(&path, out);
        } else if Language::from_path(&path).is_some() {
            out.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn workspace(files: &[(&str, &str)]) -> (TempDir, CodeIntelligence) {
        let dir = TempDir::new().unwrap();
        for (name, body) in files {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, body).unwrap();
        }
        let mut intel = CodeIntelligence::new(dir.path());
        intel.index_workspace(dir.path());
        (dir, intel)
    }

    #[test]
    fn indexes_python_symbols_with_kinds() {
        let (dir, intel) = workspace(&[(
            "shapes.py",
            "class Shape:\n    def area(self):\n        return 0\n\ndef make():\n    return Shape()\n",
        )]);
        let symbols = intel.symbols(&dir.path().join("shapes.py"));
        let kinds: Vec<(&str, &str)> = symbols
            .iter()
            .map(|s| (s.name.as_str(), s.kind.as_str()))
            .collect();
        assert_eq!(
            kinds,
            vec![("Shape", "class"), ("area", "method"), ("make", "function")]
        );
        assert_eq!(symbols[0].location.line, 1);
        assert_eq!(symbols[0].location.end_line, 3);
    }

    #[test]
    fn skips_hidden_and_build_directories() {
        let (_dir, intel) = workspace(&[
            ("src/a.py", "def a():\n    pass\n"),
            (".venv/lib.py", "def hidden():\n    pass\n"),
            ("node_modules/x.js", "function x() {}\n"),
        ]);
        let files: Vec<String> = intel
            .indexed_files()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(files, vec!["a.py"]);
    }

    #[test]
    fn finds_definition_through_from_import() {
        let (dir, intel) = workspace(&[
            ("utils.py", "def helper():\n    return 1\n"),
            ("main.py", "from utils import helper\n\nprint(helper())\n"),
        ]);
        let main = dir.path().join("main.py");
        let loc = intel.find_definition("helper", &main).unwrap();
        assert!(loc.file_path.ends_with("utils.py"));
        assert_eq!(loc.line, 1);
        assert!(intel.import_map(&main).unwrap().contains_key("helper"));
        assert!(intel.find_definition("missing", &main).is_none());
    }

    #[test]
    fn resolves_relative_and_package_imports() {
        let (dir, intel) = workspace(&[
            ("pkg/__init__.py", "def init_fn():\n    pass\n"),
            ("pkg/core.py", "def run():\n    pass\n"),
            ("pkg/cli.py", "from .core import run\nimport pkg\n"),
        ]);
        let cli = dir.path().join("pkg/cli.py");
        let imports = intel.imports(&cli).unwrap();
        assert_eq!(imports.len(), 2);
        assert!(intel.find_definition("run", &cli).is_some());
        assert!(intel.find_definition("init_fn", &cli).is_some());
    }

    #[test]
    fn finds_definition_through_js_import() {
        let (dir, intel) = workspace(&[
            ("lib/math.js", "export function add(a, b) {\n  return a + b;\n}\n"),
            ("app.js", "import { add } from './lib/math';\n\nadd(1, 2);\n"),
        ]);
        let loc = intel
            .find_definition("add", &dir.path().join("app.js"))
            .unwrap();
        assert!(loc.file_path.ends_with("lib/math.js"));
    }

    #[test]
    fn references_exclude_definition_names() {
        let (dir, intel) = workspace(&[
            ("utils.py", "def helper():\n    return 1\n"),
            (
                "main.py",
                "from utils import helper\n\ndef main():\n    return helper()\n",
            ),
        ]);
        let refs = intel.find_references("helper", &dir.path().join("main.py"));
        assert!(refs.iter().all(|r| !(r.file_path.ends_with("utils.py") && r.line == 1)));
        let main_lines: Vec<usize> = refs
            .iter()
            .filter(|r| r.file_path.ends_with("main.py"))
            .map(|r| r.line)
            .collect();
        assert_eq!(main_lines, vec![1, 4]);
    }

    #[test]
    fn references_require_a_definition() {
        let (dir, intel) = workspace(&[("main.py", "print(unknown)\n")]);
        assert!(intel
            .find_references("unknown", &dir.path().join("main.py"))
            .is_empty());
    }

    #[test]
    fn call_hierarchy_lists_callers_and_callees() {
        let (dir, intel) = workspace(&[
            (
                "utils.py",
                "def helper():\n    data = load()\n    return clean(data)\n",
            ),
            (
                "main.py",
                "from utils import helper\n\ndef main():\n    return helper()\n",
            ),
        ]);
        let hierarchy = intel.call_hierarchy("helper", &dir.path().join("main.py"));
        assert_eq!(hierarchy.callers, vec!["main"]);
        assert_eq!(hierarchy.callees, vec!["load", "clean"]);
    }

    #[test]
    fn indexes_rust_go_and_java_definitions() {
        let (dir, intel) = workspace(&[
            ("lib.rs", "struct Point;\nimpl Point {\n    fn norm(&self) {}\n}\nfn main() {}\n"),
            ("main.go", "package main\n\ntype Server struct{}\n\nfunc Run() {}\n"),
            ("App.java", "public class App {\n    public void start() {}\n}\n"),
        ]);
        let names = |f: &str| -> Vec<(String, String)> {
            intel
                .symbols(&dir.path().join(f))
                .iter()
                .map(|s| (s.name.clone(), s.kind.clone()))
                .collect()
        };
        assert_eq!(
            names("lib.rs"),
            vec![
                ("Point".into(), "struct".into()),
                ("norm".into(), "method".into()),
                ("main".into(), "function".into())
            ]
        );
        assert_eq!(
            names("main.go"),
            vec![
                ("Server".into(), "struct".into()),
                ("Run".into(), "function".into())
            ]
        );
        assert_eq!(
            names("App.java"),
            vec![
                ("App".into(), "class".into()),
                ("start".into(), "method".into())
            ]
        );
    }
}
