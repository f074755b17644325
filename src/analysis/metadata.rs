//! Enhanced per-file metadata stored next to each embedding.
//!
//! Mixes facts taken from the structural description (names, imports,
//! counts) with whole-text scans that work even when extraction failed
//! (API calls, code-pattern tags, security markers). Similarity boosts read
//! `patterns` and `functions` from here.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use super::{ArchitecturalPattern, CodeMetrics, FileAnalysis};
use crate::parsing::{ErrorHandlingStats, Language, text};

/// Function names kept in the metadata
pub const MAX_FUNCTION_NAMES: usize = 10;

static HTTP_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.(get|post|put|delete|patch)\s*\(").expect("Invalid http call regex")
});
static AXIOS_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\baxios\.(get|post|put|delete|patch)\s*\(").expect("Invalid axios regex")
});
static FETCH_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bfetch\s*\(").expect("Invalid fetch regex"));

static TRY_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\btry\s*[{:]").expect("Invalid try regex"));
static CATCH_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:catch|except)\b").expect("Invalid catch regex"));
static THROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:throw|raise)\s+").expect("Invalid throw regex"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub size: usize,
    pub lines: usize,
    pub language: String,
    pub functions: Vec<String>,
    pub classes: Vec<ClassSummary>,
    pub imports: Vec<ImportSummary>,
    pub exports: Vec<String>,
    pub error_handling: ErrorHandlingStats,
    pub complexity: u32,
    pub api_calls: Vec<ApiCall>,
    /// Code-pattern tags such as `async` or `singleton`
    pub patterns: Vec<String>,
    pub security: SecurityProfile,
    pub ast: AstSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSummary {
    pub name: String,
    pub extends: Option<String>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub module: String,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiCallKind {
    Http,
    Axios,
    Fetch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiCall {
    pub kind: ApiCallKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityProfile {
    pub has_validation: bool,
    pub has_sanitization: bool,
    pub has_authentication: bool,
    pub has_authorization: bool,
    pub has_encryption: bool,
    pub vulnerabilities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstSummary {
    pub has_ast: bool,
    #[serde(default)]
    pub architectural_patterns: Vec<ArchitecturalPattern>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_metrics: Option<CodeMetrics>,
    #[serde(default)]
    pub class_count: usize,
    #[serde(default)]
    pub function_count: usize,
    #[serde(default)]
    pub interface_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileMetadata {
    /// Build metadata for `content`. `analysis` carries the extraction
    /// result, or the failure message when extraction did not succeed.
    pub fn build(
        content: &str,
        language: Language,
        analysis: Result<&FileAnalysis, &str>,
    ) -> Self {
        let mut metadata = Self {
            size: content.len(),
            lines: content.split('\n').count(),
            language: language.tag().to_string(),
            functions: Vec::new(),
            classes: Vec::new(),
            imports: Vec::new(),
            exports: Vec::new(),
            error_handling: scan_error_handling(content),
            complexity: text::complexity(content),
            api_calls: api_calls(content),
            patterns: code_pattern_tags(content)
                .into_iter()
                .map(str::to_string)
                .collect(),
            security: security_profile(content),
            ast: AstSummary {
                has_ast: false,
                architectural_patterns: Vec::new(),
                code_metrics: None,
                class_count: 0,
                function_count: 0,
                interface_count: 0,
                error: None,
            },
        };

        match analysis {
            Ok(analysis) => {
                let desc = &analysis.description;
                metadata.functions = desc
                    .function_names()
                    .chain(desc.methods().map(|m| m.name.as_str()))
                    .take(MAX_FUNCTION_NAMES)
                    .map(str::to_string)
                    .collect();
                metadata.classes = desc
                    .classes
                    .iter()
                    .map(|c| ClassSummary {
                        name: c.name.clone(),
                        extends: c.superclass.clone(),
                        line: c.line,
                    })
                    .collect();
                metadata.imports = desc
                    .imports
                    .iter()
                    .map(|i| ImportSummary {
                        module: i.module.clone(),
                        items: i.items.clone(),
                    })
                    .collect();
                metadata.exports = desc.exports.iter().map(|e| e.name.clone()).collect();
                if let Some(stats) = &desc.error_handling {
                    metadata.error_handling = stats.clone();
                }
                metadata.ast = AstSummary {
                    has_ast: true,
                    architectural_patterns: analysis.patterns.clone(),
                    code_metrics: Some(analysis.metrics),
                    class_count: desc.classes.len(),
                    function_count: desc.functions.len(),
                    interface_count: desc.interfaces.len(),
                    error: None,
                };
            }
            Err(reason) => {
                metadata.ast.error = Some(reason.to_string());
            }
        }

        metadata
    }
}

/// Coarse tags used for the code-pattern index and search boosts
pub fn code_pattern_tags(content: &str) -> Vec<&'static str> {
    let mut tags = Vec::new();
    if content.contains("constructor") && content.contains("extends") {
        tags.push("inheritance");
    }
    if content.contains("Promise") || content.contains("async") || content.contains("await") {
        tags.push("async");
    }
    if content.contains("addEventListener") || content.contains("on(") {
        tags.push("event-driven");
    }
    if content.contains("factory") || content.contains("Factory") {
        tags.push("factory");
    }
    if content.contains("Singleton") || content.contains("getInstance") {
        tags.push("singleton");
    }
    tags
}

fn contains_any(content: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| content.contains(n))
}

pub fn security_profile(content: &str) -> SecurityProfile {
    let mut vulnerabilities = Vec::new();
    if content.contains("eval(") {
        vulnerabilities.push("eval-usage".to_string());
    }
    if content.contains("innerHTML") && !content.contains("sanitize") {
        vulnerabilities.push("xss-risk".to_string());
    }
    if content.contains("SQL") && content.contains('+') {
        vulnerabilities.push("sql-injection-risk".to_string());
    }

    SecurityProfile {
        has_validation: contains_any(content, &["validate", "isValid", "check"]),
        has_sanitization: contains_any(content, &["sanitize", "escape", "clean"]),
        has_authentication: contains_any(content, &["auth", "login", "token"]),
        has_authorization: contains_any(content, &["permission", "role", "access"]),
        has_encryption: contains_any(content, &["encrypt", "hash", "crypto"]),
        vulnerabilities,
    }
}

pub fn api_calls(content: &str) -> Vec<ApiCall> {
    let verb_calls = |re: &Regex, kind: ApiCallKind| -> Vec<ApiCall> {
        re.captures_iter(content)
            .filter_map(|caps| caps.get(1))
            .map(|m| ApiCall {
                kind,
                method: Some(m.as_str().to_string()),
            })
            .collect()
    };

    let mut calls = verb_calls(&HTTP_CALL, ApiCallKind::Http);
    calls.extend(verb_calls(&AXIOS_CALL, ApiCallKind::Axios));
    calls.extend(FETCH_CALL.find_iter(content).map(|_| ApiCall {
        kind: ApiCallKind::Fetch,
        method: None,
    }));
    calls
}

/// Language-agnostic error handling counts, used when the extractor has none
fn scan_error_handling(content: &str) -> ErrorHandlingStats {
    let try_blocks = TRY_BLOCK.find_iter(content).count();
    let catch_blocks = CATCH_BLOCK.find_iter(content).count();
    ErrorHandlingStats {
        try_blocks,
        catch_blocks,
        throw_statements: THROW.find_iter(content).count(),
        error_types: Vec::new(),
        has_error_handling: try_blocks > 0 && catch_blocks > 0,
    }
}
