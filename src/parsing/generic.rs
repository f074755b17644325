//! Reduced rule set for languages without a dedicated extractor.
//!
//! Go, Rust and unknown files get functions, declared structures, imports,
//! comment statistics and a whole-file complexity count. The results are
//! intentionally coarse; nothing here fails on unexpected syntax.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use super::registry::{ExtractResult, StructureExtractor};
use super::text::{LineIndex, is_control_keyword};
use super::{
    CommentStats, FunctionInfo, ImportInfo, ImportKind, Language, StructuralDescription,
    StructureInfo,
};

const MAX_FUNCTIONS: usize = 20;

static DECLARATIONS: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        Regex::new(r"\bfunction\s+(\w+)").expect("Invalid function regex"),
        Regex::new(r"\bdef\s+(\w+)").expect("Invalid def regex"),
        Regex::new(r"\bfn\s+(\w+)").expect("Invalid fn regex"),
        Regex::new(r"\bfunc\s+(?:\([^)]*\)\s*)?(\w+)").expect("Invalid func regex"),
    ]
});

static CALL_LIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Za-z_]\w*)\s*\(").expect("Invalid call regex"));

static STRUCTURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(class|struct|interface|type|trait|enum)\s+([A-Za-z_]\w*)")
        .expect("Invalid structure regex")
});

static IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)\bimport[ \t]+([^\n;]+)|\brequire\s*\(\s*['"]([^'"]+)['"]\s*\)|#include\s*[<"]([^>"]+)[>"]|\buse[ \t]+([^;\n]+);"#,
    )
    .expect("Invalid import regex")
});

static LINE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)//.*$").expect("Invalid comment regex"));
static BLOCK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("Invalid comment regex"));
static DOC_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*\*.*?\*/").expect("Invalid comment regex"));

static BRANCH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:if|else|for|while|switch|try|catch)\b").expect("Invalid branch regex")
});

/// Words that look like calls but never name a function
const NOT_A_FUNCTION: &[&str] = &[
    "fn", "func", "function", "def", "return", "match", "loop", "sizeof", "typeof", "new",
    "Some", "Ok", "Err",
];

pub struct GenericExtractor;

impl StructureExtractor for GenericExtractor {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn languages(&self) -> &'static [Language] {
        &[Language::Go, Language::Rust, Language::Generic]
    }

    /// Accepts any language; this is the registry's fallback
    fn extract(&self, content: &str, language: Language) -> ExtractResult<StructuralDescription> {
        let lines = LineIndex::new(content);
        let mut desc = StructuralDescription::new(language);

        desc.functions = extract_functions(content, &lines);
        desc.structures = STRUCTURE
            .captures_iter(content)
            .filter_map(|caps| {
                let kind = caps.get(1)?;
                Some(StructureInfo {
                    kind: kind.as_str().to_string(),
                    name: caps.get(2)?.as_str().to_string(),
                    line: lines.line_at(kind.start()),
                })
            })
            .collect();
        desc.imports = IMPORT
            .captures_iter(content)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let module = (1..=4).find_map(|i| caps.get(i))?;
                Some(ImportInfo {
                    module: module.as_str().trim().to_string(),
                    items: Vec::new(),
                    kind: ImportKind::Generic,
                    line: lines.line_at(whole.start()),
                })
            })
            .collect();
        desc.comments = Some(CommentStats {
            single_line: LINE_COMMENT.find_iter(content).count(),
            multi_line: BLOCK_COMMENT.find_iter(content).count(),
            doc: DOC_COMMENT.find_iter(content).count(),
        });
        desc.complexity = Some(1 + BRANCH.find_iter(content).count() as u32);

        Ok(desc)
    }
}

/// Declared functions in source order, then call-like identifiers
fn extract_functions(content: &str, lines: &LineIndex) -> Vec<FunctionInfo> {
    let mut declared: Vec<(usize, &str)> = DECLARATIONS
        .iter()
        .flat_map(|re| re.captures_iter(content))
        .filter_map(|caps| caps.get(1).map(|m| (m.start(), m.as_str())))
        .collect();
    declared.sort_by_key(|(offset, _)| *offset);

    let calls = CALL_LIKE
        .captures_iter(content)
        .filter_map(|caps| caps.get(1).map(|m| (m.start(), m.as_str())));

    let mut seen = HashSet::new();
    declared
        .into_iter()
        .chain(calls)
        .filter(|(_, name)| !is_control_keyword(name) && !NOT_A_FUNCTION.contains(name))
        .filter(|(_, name)| seen.insert(*name))
        .take(MAX_FUNCTIONS)
        .map(|(offset, name)| FunctionInfo::named(name, lines.line_at(offset)))
        .collect()
}
