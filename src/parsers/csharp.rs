//! Regex-based structural extraction for C# sources.
//!
//! This is pattern matching, not parsing: no AST, no type resolution. It
//! recovers enough structure to name, classify and link components.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::ComponentKind;

static CLASS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bclass\s+(\w+)").unwrap());

static NAMESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bnamespace\s+([\w.]+)").unwrap());

static METHOD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\bpublic\s+(?:(?:static|virtual|override|async|abstract|sealed|new)\s+)*([\w<>\[\],.?]+)\s+(\w+)\s*\(",
    )
    .unwrap()
});

static PROPERTY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\bpublic\s+(?:(?:static|virtual|override|abstract|new)\s+)*([\w<>\[\],.?]+)\s+(\w+)\s*\{",
    )
    .unwrap()
});

/// `new OrderRepository(...)`
static NEW_DEPENDENCY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bnew\s+(\w+(?:Repository|Service|Controller))\b").unwrap());

/// Injected fields and constructor parameters: `IOrderService _orders;`,
/// `(OrderRepository repository,`
static INJECTED_DEPENDENCY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\w+(?:Repository|Service))\s+_?\w+\s*[;,)=]").unwrap());

/// Structural facts recovered from one source file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExtractedComponent {
    pub name: String,
    pub kind: ComponentKind,
    pub namespace: String,
    pub methods: Vec<String>,
    pub properties: Vec<String>,
    /// Referenced component class names, interface prefix stripped, deduplicated.
    pub dependency_names: Vec<String>,
}

/// C# extractor.
#[derive(Debug, Clone, Copy, Default)]
pub struct CSharpExtractor;

impl CSharpExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extracts a structural record; falls back to the file stem when no
    /// class declaration is found.
    pub fn parse(&self, content: &str, path: &str) -> ExtractedComponent {
        let name = first_capture(&CLASS_RE, content).unwrap_or_else(|| file_stem(path));

        let mut dependency_names: Vec<String> = Vec::new();
        let found = NEW_DEPENDENCY_RE
            .captures_iter(content)
            .chain(INJECTED_DEPENDENCY_RE.captures_iter(content))
            .filter_map(|c| c.get(1))
            .map(|m| strip_interface_prefix(m.as_str()));
        for dep in found {
            if dep != name && !dependency_names.contains(&dep) {
                dependency_names.push(dep);
            }
        }

        ExtractedComponent {
            kind: kind_from_path(path),
            namespace: first_capture(&NAMESPACE_RE, content).unwrap_or_default(),
            methods: member_names(&METHOD_RE, content),
            properties: member_names(&PROPERTY_RE, content),
            dependency_names,
            name,
        }
    }
}

/// Classifies by path substring, first match wins.
pub(crate) fn kind_from_path(path: &str) -> ComponentKind {
    if path.contains("Controller") {
        ComponentKind::Controller
    } else if path.contains("Service") {
        ComponentKind::Service
    } else if path.contains("Repository") {
        ComponentKind::Repository
    } else if path.contains("Model") || path.contains("Entity") {
        ComponentKind::Model
    } else {
        ComponentKind::Other
    }
}

/// `IOrderService` -> `OrderService`; `InventoryService` is left alone.
fn strip_interface_prefix(name: &str) -> String {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some('I'), Some(second)) if second.is_ascii_uppercase() => name[1..].to_string(),
        _ => name.to_string(),
    }
}

fn file_stem(path: &str) -> String {
    std::path::Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

fn first_capture(re: &Regex, content: &str) -> Option<String> {
    re.captures(content)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Member names from a `(type, name)` pattern, skipping type declarations.
fn member_names(re: &Regex, content: &str) -> Vec<String> {
    re.captures_iter(content)
        .filter(|c| {
            !matches!(
                c.get(1).map(|m| m.as_str()),
                Some("class" | "interface" | "struct" | "enum" | "record")
            )
        })
        .filter_map(|c| c.get(2))
        .map(|m| m.as_str().to_string())
        .collect()
}
