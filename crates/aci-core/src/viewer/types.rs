//! Lightweight type information: declared annotations plus a little
//! inference from literals.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tree_sitter::Node;

use super::docs::declaration_after;
use crate::lang::{node_text, walk_tree, Language};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeInfo {
    pub name: String,
    pub type_hint: Option<String>,
    pub inferred_type: Option<String>,
    pub possible_types: BTreeSet<String>,
}

impl TypeInfo {
    fn hinted(name: &str, hint: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            type_hint: Some(hint.into()),
            ..Self::default()
        }
    }
}

fn callable_hint(returns: Option<&str>) -> String {
    match returns {
        Some(ret) => format!("Callable[...] -> {ret}"),
        None => "Callable".to_string(),
    }
}

#[derive(Debug, Default)]
pub struct TypeAnalyzer {
    cache: HashMap<PathBuf, HashMap<String, TypeInfo>>,
}

impl TypeAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Types declared in `content`, computed once per path.
    pub fn analyze_file(&mut self, path: &Path, content: &str) -> &HashMap<String, TypeInfo> {
        self.cache
            .entry(path.to_path_buf())
            .or_insert_with(|| match Language::from_path(path) {
                Some(Language::Python) => analyze_python(content),
                Some(lang) if lang.is_js_family() => analyze_javascript(content),
                _ => HashMap::new(),
            })
    }

    pub fn type_info(&self, path: &Path, symbol: &str) -> Option<&TypeInfo> {
        self.cache.get(path)?.get(symbol)
    }

    pub fn invalidate(&mut self, path: &Path) {
        self.cache.remove(path);
    }
}

// ---------------------------------------------------------------------------
// Python
// ---------------------------------------------------------------------------

const PY_BUILTIN_CONSTRUCTORS: &[&str] = &[
    "str", "int", "float", "bool", "list", "dict", "set", "tuple", "bytes",
];

fn analyze_python(content: &str) -> HashMap<String, TypeInfo> {
    let mut types = HashMap::new();
    let Ok(tree) = Language::Python.parse(content) else {
        return types;
    };
    let root = tree.root_node();

    let mut classes = HashSet::new();
    walk_tree(root, |node| {
        if node.kind() == "class_definition" {
            if let Some(name) = node.child_by_field_name("name") {
                classes.insert(node_text(name, content).to_string());
            }
        }
    });

    walk_tree(root, |node| match node.kind() {
        "assignment" => python_assignment(node, content, &classes, &mut types),
        "function_definition" => {
            let Some(name) = node.child_by_field_name("name") else {
                return;
            };
            let name = node_text(name, content);
            let returns = node
                .child_by_field_name("return_type")
                .map(|r| node_text(r, content));
            types.insert(name.to_string(), TypeInfo::hinted(name, callable_hint(returns)));

            if let Some(params) = node.child_by_field_name("parameters") {
                python_parameters(params, content, &mut types);
            }
        }
        "class_definition" => {
            let Some(name) = node.child_by_field_name("name") else {
                return;
            };
            let name = node_text(name, content);
            let mut bases: BTreeSet<String> = BTreeSet::new();
            if let Some(superclasses) = node.child_by_field_name("superclasses") {
                let mut cursor = superclasses.walk();
                bases.extend(
                    superclasses
                        .named_children(&mut cursor)
                        .filter(|c| c.kind() != "keyword_argument" && c.kind() != "comment")
                        .map(|c| node_text(c, content).to_string()),
                );
            }
            if bases.is_empty() {
                bases.insert("object".to_string());
            }
            types.insert(
                name.to_string(),
                TypeInfo {
                    possible_types: bases,
                    ..TypeInfo::hinted(name, "type")
                },
            );
        }
        _ => {}
    });
    types
}

fn python_assignment(
    node: Node<'_>,
    content: &str,
    classes: &HashSet<String>,
    types: &mut HashMap<String, TypeInfo>,
) {
    let Some(left) = node.child_by_field_name("left").filter(|l| l.kind() == "identifier") else {
        return;
    };
    let name = node_text(left, content);

    if let Some(hint) = node.child_by_field_name("type") {
        let inferred = node
            .child_by_field_name("right")
            .and_then(|r| infer_python(r, content, classes));
        types.insert(
            name.to_string(),
            TypeInfo {
                inferred_type: inferred,
                ..TypeInfo::hinted(name, node_text(hint, content))
            },
        );
        return;
    }

    let Some(inferred) = node
        .child_by_field_name("right")
        .and_then(|r| infer_python(r, content, classes))
    else {
        return;
    };
    let entry = types.entry(name.to_string()).or_insert_with(|| TypeInfo {
        name: name.to_string(),
        ..TypeInfo::default()
    });
    entry.possible_types.insert(inferred.clone());
    if entry.inferred_type.is_none() {
        entry.inferred_type = Some(inferred);
    }
}

fn python_parameters(params: Node<'_>, content: &str, types: &mut HashMap<String, TypeInfo>) {
    let mut cursor = params.walk();
    for param in params.named_children(&mut cursor) {
        let name = match param.kind() {
            "typed_parameter" => param.named_child(0).filter(|n| n.kind() == "identifier"),
            "typed_default_parameter" => param.child_by_field_name("name"),
            _ => None,
        };
        let hint = param.child_by_field_name("type");
        if let (Some(name), Some(hint)) = (name, hint) {
            let name = node_text(name, content);
            types.insert(name.to_string(), TypeInfo::hinted(name, node_text(hint, content)));
        }
    }
}

fn infer_python(value: Node<'_>, content: &str, classes: &HashSet<String>) -> Option<String> {
    let ty = match value.kind() {
        "string" | "concatenated_string" => "str",
        "integer" => "int",
        "float" => "float",
        "true" | "false" => "bool",
        "none" => "None",
        "list" | "list_comprehension" => "list",
        "dictionary" | "dictionary_comprehension" => "dict",
        "set" | "set_comprehension" => "set",
        "tuple" => "tuple",
        "call" => {
            let func = value.child_by_field_name("function")?;
            let name = node_text(func, content);
            if PY_BUILTIN_CONSTRUCTORS.contains(&name) || classes.contains(name) {
                return Some(name.to_string());
            }
            return None;
        }
        _ => return None,
    };
    Some(ty.to_string())
}

// ---------------------------------------------------------------------------
// JavaScript / TypeScript
// ---------------------------------------------------------------------------

static JSDOC_TYPE_RE: OnceLock<Regex> = OnceLock::new();
static JSDOC_PARAM_RE: OnceLock<Regex> = OnceLock::new();
static JSDOC_RETURNS_RE: OnceLock<Regex> = OnceLock::new();
static TS_ANNOTATION_RE: OnceLock<Regex> = OnceLock::new();

fn jsdoc_type_re() -> &'static Regex {
    JSDOC_TYPE_RE.get_or_init(|| Regex::new(r"@type\s+\{([^}]+)\}").unwrap())
}

fn jsdoc_param_re() -> &'static Regex {
    JSDOC_PARAM_RE.get_or_init(|| Regex::new(r"@param\s+\{([^}]+)\}\s+\[?(\w+)").unwrap())
}

fn jsdoc_returns_re() -> &'static Regex {
    JSDOC_RETURNS_RE.get_or_init(|| Regex::new(r"@returns?\s+\{([^}]+)\}").unwrap())
}

fn ts_annotation_re() -> &'static Regex {
    TS_ANNOTATION_RE.get_or_init(|| {
        Regex::new(r"\b(\w+)\??\s*:\s*([A-Za-z_][\w.<>|\[\]]*)\s*[=;]").unwrap()
    })
}

const NOT_NAMES: &[&str] = &["case", "default", "return"];

/// Name declared right after the doc comment that contains `pos`.
fn declared_after_comment(content: &str, pos: usize) -> Option<String> {
    let close = pos + content[pos..].find("*/")? + 2;
    declaration_after(content, close)
}

fn analyze_javascript(content: &str) -> HashMap<String, TypeInfo> {
    let mut types = HashMap::new();

    for caps in jsdoc_type_re().captures_iter(content) {
        let Some(whole) = caps.get(0) else { continue };
        if let Some(name) = declared_after_comment(content, whole.end()) {
            types.insert(name.clone(), TypeInfo::hinted(&name, &caps[1]));
        }
    }

    for caps in jsdoc_param_re().captures_iter(content) {
        types.insert(caps[2].to_string(), TypeInfo::hinted(&caps[2], &caps[1]));
    }

    for caps in jsdoc_returns_re().captures_iter(content) {
        let Some(whole) = caps.get(0) else { continue };
        if let Some(name) = declared_after_comment(content, whole.end()) {
            types.insert(
                name.clone(),
                TypeInfo::hinted(&name, callable_hint(Some(&caps[1]))),
            );
        }
    }

    for caps in ts_annotation_re().captures_iter(content) {
        let name = &caps[1];
        if NOT_NAMES.contains(&name) {
            continue;
        }
        types.insert(name.to_string(), TypeInfo::hinted(name, &caps[2]));
    }

    types
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn python_annotations_and_signatures() {
        let src = "count: int = 0\n\ndef greet(name: str, times: int = 1) -> str:\n    return name\n\nclass Base:\n    pass\n\nclass Child(Base, Mixin):\n    pass\n";
        let types = analyze_python(src);

        assert_eq!(types["count"].type_hint.as_deref(), Some("int"));
        assert_eq!(types["count"].inferred_type.as_deref(), Some("int"));
        assert_eq!(types["greet"].type_hint.as_deref(), Some("Callable[...] -> str"));
        assert_eq!(types["name"].type_hint.as_deref(), Some("str"));
        assert_eq!(types["times"].type_hint.as_deref(), Some("int"));
        assert_eq!(types["Base"].type_hint.as_deref(), Some("type"));
        assert_eq!(
            types["Base"].possible_types.iter().collect::<Vec<_>>(),
            vec!["object"]
        );
        assert_eq!(
            types["Child"].possible_types.iter().collect::<Vec<_>>(),
            vec!["Base", "Mixin"]
        );
    }

    #[test]
    fn python_unannotated_function_is_plain_callable() {
        let types = analyze_python("def run():\n    pass\n");
        assert_eq!(types["run"].type_hint.as_deref(), Some("Callable"));
    }

    #[test]
    fn python_infers_from_literals_and_constructors() {
        let src = "class Point:\n    pass\n\nname = 'x'\nitems = []\np = Point()\nflag = True\nunknown = compute()\n";
        let types = analyze_python(src);
        assert_eq!(types["name"].inferred_type.as_deref(), Some("str"));
        assert_eq!(types["items"].inferred_type.as_deref(), Some("list"));
        assert_eq!(types["p"].inferred_type.as_deref(), Some("Point"));
        assert_eq!(types["flag"].inferred_type.as_deref(), Some("bool"));
        assert!(!types.contains_key("unknown"));
        assert_eq!(types["name"].type_hint, None);
    }

    #[test]
    fn javascript_jsdoc_and_annotations() {
        let src = "/**\n * @type {number}\n */\nconst limit = 10;\n\n/**\n * Add numbers.\n * @param {number} a first\n * @param {number} b second\n * @returns {number} the sum\n */\nfunction add(a, b) {\n  return a + b;\n}\n\nlet label: string = 'x';\n";
        let types = analyze_javascript(src);
        assert_eq!(types["limit"].type_hint.as_deref(), Some("number"));
        assert_eq!(types["a"].type_hint.as_deref(), Some("number"));
        assert_eq!(types["add"].type_hint.as_deref(), Some("Callable[...] -> number"));
        assert_eq!(types["label"].type_hint.as_deref(), Some("string"));
    }

    #[test]
    fn analyzer_caches_per_path() {
        let mut analyzer = TypeAnalyzer::new();
        let path = Path::new("/virtual/a.py");
        analyzer.analyze_file(path, "x: int = 1\n");
        // A second call with different content is served from the cache.
        let types = analyzer.analyze_file(path, "y: str = ''\n");
        assert!(types.contains_key("x"));
        assert!(!types.contains_key("y"));
        assert_eq!(
            analyzer.type_info(path, "x").unwrap().type_hint.as_deref(),
            Some("int")
        );

        analyzer.invalidate(path);
        assert!(analyzer.type_info(path, "x").is_none());
    }

    #[test]
    fn unsupported_languages_have_no_types() {
        let mut analyzer = TypeAnalyzer::new();
        assert!(analyzer
            .analyze_file(Path::new("/x/main.go"), "package main\n")
            .is_empty());
    }
}
