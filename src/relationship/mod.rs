//! Relationship module
//!
//! Directed, typed, weighted edges between a file and the names it depends
//! on: inherited classes, implemented interfaces and imported modules.
//!
//! # Main types
//!
//! - [`RelationKind`]: the edge type, with its fixed strength
//! - [`Relationship`]: one edge, owned by the file that declares it
//! - [`RelatedFile`]: an edge seen from the other end, as returned by queries
//!
//! Targets are left unresolved. An import of `./util` produces the target
//! `./util`, not a path in the store, and an inherited class produces the
//! class name.

use crate::parsing::StructuralDescription;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    Inheritance,
    Implementation,
    Import,
}

impl RelationKind {
    pub const ALL: [RelationKind; 3] = [
        RelationKind::Inheritance,
        RelationKind::Implementation,
        RelationKind::Import,
    ];

    /// Fixed edge weight for this kind
    pub fn strength(&self) -> f32 {
        match self {
            Self::Inheritance => 0.9,
            Self::Implementation => 0.8,
            Self::Import => 0.6,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inheritance => "inheritance",
            Self::Implementation => "implementation",
            Self::Import => "import",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationKind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "inheritance" => Ok(Self::Inheritance),
            "implementation" => Ok(Self::Implementation),
            "import" => Ok(Self::Import),
            _ => Err("Unknown relationship type"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub source: String,
    pub target: String,
    pub kind: RelationKind,
    pub strength: f32,
    pub metadata: serde_json::Value,
}

impl Relationship {
    /// Edge with the kind's fixed strength and no metadata
    pub fn new(source: impl Into<String>, target: impl Into<String>, kind: RelationKind) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind,
            strength: kind.strength(),
            metadata: serde_json::Value::Null,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Which end of an edge the queried path sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// The queried path is the source
    Outgoing,
    /// The queried path is the target
    Incoming,
}

/// An edge touching a queried path, reported from the other end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedFile {
    /// The end of the edge that is not the queried path
    pub file: String,
    pub kind: RelationKind,
    pub strength: f32,
    pub direction: Direction,
    pub metadata: serde_json::Value,
}

/// Derive the edges a file declares.
///
/// Order: per class, the inheritance edge followed by its implementation
/// edges; then one import edge per import in source order. No
/// deduplication is performed.
pub fn extract_relationships(path: &str, desc: &StructuralDescription) -> Vec<Relationship> {
    let mut edges = Vec::new();

    for class in &desc.classes {
        for base in class.bases() {
            edges.push(
                Relationship::new(path, base, RelationKind::Inheritance)
                    .with_metadata(json!({ "class": class.name })),
            );
        }
        for interface in &class.interfaces {
            edges.push(
                Relationship::new(path, interface.as_str(), RelationKind::Implementation)
                    .with_metadata(json!({ "class": class.name })),
            );
        }
    }

    for import in &desc.imports {
        edges.push(
            Relationship::new(path, import.module.as_str(), RelationKind::Import)
                .with_metadata(json!({ "items": import.items })),
        );
    }

    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::{Language, get_registry};

    fn describe(source: &str, language: Language) -> StructuralDescription {
        get_registry().extract(source, language).unwrap()
    }

    #[test]
    fn test_single_inheritance_edge() {
        let desc = describe(
            "class Foo extends Bar { getInstance() {} }",
            Language::JavaScript,
        );
        let edges = extract_relationships("src/foo.js", &desc);

        assert_eq!(edges.len(), 1);
        let edge = &edges[0];
        assert_eq!(edge.source, "src/foo.js");
        assert_eq!(edge.target, "Bar");
        assert_eq!(edge.kind, RelationKind::Inheritance);
        assert_eq!(edge.strength, 0.9);
        assert_eq!(edge.metadata["class"], "Foo");
    }

    #[test]
    fn test_implementation_and_import_edges() {
        let source = r#"import { Store } from './store';
export class Cache extends Base implements Store, Disposable {}
"#;
        let desc = describe(source, Language::TypeScript);
        let edges = extract_relationships("cache.ts", &desc);

        let kinds: Vec<_> = edges.iter().map(|e| (e.kind, e.target.as_str())).collect();
        assert_eq!(
            kinds,
            vec![
                (RelationKind::Inheritance, "Base"),
                (RelationKind::Implementation, "Store"),
                (RelationKind::Implementation, "Disposable"),
                (RelationKind::Import, "./store"),
            ]
        );
        assert_eq!(edges[1].strength, 0.8);
        assert_eq!(edges[3].strength, 0.6);
        assert_eq!(edges[3].metadata["items"], json!(["Store"]));
    }

    #[test]
    fn test_python_multiple_bases() {
        let desc = describe(
            "class View(Base, Mixin):\n    pass\n",
            Language::Python,
        );
        let edges = extract_relationships("view.py", &desc);
        let targets: Vec<_> = edges.iter().map(|e| e.target.as_str()).collect();
        assert_eq!(targets, vec!["Base", "Mixin"]);
        assert!(edges.iter().all(|e| e.kind == RelationKind::Inheritance));
    }

    #[test]
    fn test_includes_become_imports() {
        let desc = describe("#include <vector>\n#include \"util.h\"\n", Language::Cpp);
        let edges = extract_relationships("main.cpp", &desc);
        let targets: Vec<_> = edges.iter().map(|e| e.target.as_str()).collect();
        assert_eq!(targets, vec!["vector", "util.h"]);
    }

    #[test]
    fn test_kind_round_trip_names() {
        for kind in RelationKind::ALL {
            assert_eq!(kind.as_str().parse::<RelationKind>(), Ok(kind));
        }
        assert!("composition".parse::<RelationKind>().is_err());
    }
}
