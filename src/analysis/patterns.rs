//! Architectural pattern detection.
//!
//! Each rule is an independent check over one [`StructuralDescription`].
//! Results keep rule order and are not ranked by confidence.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::parsing::{StructuralDescription, Visibility};

/// Upper bound on patterns reported for one file
pub const MAX_PATTERNS: usize = 6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchitecturalPattern {
    pub name: String,
    pub confidence: f32,
    pub evidence: String,
}

struct PatternRule {
    name: &'static str,
    confidence: f32,
    evidence: &'static str,
    matches: fn(&StructuralDescription) -> bool,
}

const RULES: &[PatternRule] = &[
    PatternRule {
        name: "Singleton",
        confidence: 0.8,
        evidence: "Private constructor with static instance",
        matches: is_singleton,
    },
    PatternRule {
        name: "Factory",
        confidence: 0.7,
        evidence: "Create methods returning interface types",
        matches: is_factory,
    },
    PatternRule {
        name: "Observer",
        confidence: 0.75,
        evidence: "Event subscription/notification methods",
        matches: is_observer,
    },
    PatternRule {
        name: "Strategy",
        confidence: 0.6,
        evidence: "Interface with multiple implementations",
        matches: is_strategy,
    },
    PatternRule {
        name: "MVC",
        confidence: 0.65,
        evidence: "Controller, Model, View separation",
        matches: is_mvc,
    },
];

/// Run every rule against `desc`, in rule order, keeping at most [`MAX_PATTERNS`].
pub fn detect_patterns(desc: &StructuralDescription) -> Vec<ArchitecturalPattern> {
    RULES
        .iter()
        .filter(|rule| (rule.matches)(desc))
        .take(MAX_PATTERNS)
        .map(|rule| ArchitecturalPattern {
            name: rule.name.to_string(),
            confidence: rule.confidence,
            evidence: rule.evidence.to_string(),
        })
        .collect()
}

fn is_singleton(desc: &StructuralDescription) -> bool {
    desc.classes.iter().any(|class| {
        class
            .methods
            .iter()
            .any(|m| m.name == "getInstance" && m.is_static)
            && class
                .properties
                .iter()
                .any(|p| p.is_static && p.visibility == Visibility::Private)
    })
}

fn any_method_name_contains(desc: &StructuralDescription, needles: &[&str]) -> bool {
    desc.methods().any(|m| {
        let name = m.name.to_lowercase();
        needles.iter().any(|needle| name.contains(needle))
    })
}

fn is_factory(desc: &StructuralDescription) -> bool {
    any_method_name_contains(desc, &["create", "factory"])
}

fn is_observer(desc: &StructuralDescription) -> bool {
    any_method_name_contains(desc, &["subscribe", "notify", "observer"])
}

fn is_strategy(desc: &StructuralDescription) -> bool {
    !desc.interfaces.is_empty()
        && desc
            .classes
            .iter()
            .filter(|c| !c.interfaces.is_empty())
            .count()
            > 1
}

fn is_mvc(desc: &StructuralDescription) -> bool {
    let has = |part: &str| {
        desc.classes
            .iter()
            .any(|c| c.name.to_lowercase().contains(part))
    };
    has("controller") && has("model") && has("view")
}

/// How often one pattern name recurs across the corpus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternOccurrence {
    pub name: String,
    pub count: usize,
    pub files: Vec<String>,
}

/// Aggregate per-file pattern lists into occurrence counts.
///
/// Sorted by count descending, ties by name. Files are listed in the order
/// they were first seen.
pub fn summarize_patterns<'a, I>(per_file: I) -> Vec<PatternOccurrence>
where
    I: IntoIterator<Item = (&'a str, &'a [ArchitecturalPattern])>,
{
    let mut by_name: BTreeMap<&str, PatternOccurrence> = BTreeMap::new();

    for (path, patterns) in per_file {
        for pattern in patterns {
            let entry = by_name
                .entry(pattern.name.as_str())
                .or_insert_with(|| PatternOccurrence {
                    name: pattern.name.clone(),
                    count: 0,
                    files: Vec::new(),
                });
            entry.count += 1;
            if !entry.files.iter().any(|f| f == path) {
                entry.files.push(path.to_string());
            }
        }
    }

    let mut summary: Vec<_> = by_name.into_values().collect();
    // BTreeMap order already breaks ties by name
    summary.sort_by(|a, b| b.count.cmp(&a.count));
    summary
}
