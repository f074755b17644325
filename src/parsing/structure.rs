//! Structural description ("pseudo-AST") produced by the extractors.
//!
//! One flat record per file. Fields that only make sense for some languages
//! (interfaces, includes, decorators, error-handling statistics) stay empty
//! for the others, so every language serializes to the same JSON shape.

use super::Language;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuralDescription {
    pub language: Language,
    pub classes: Vec<ClassInfo>,
    pub functions: Vec<FunctionInfo>,
    pub imports: Vec<ImportInfo>,
    pub exports: Vec<ExportInfo>,
    /// TypeScript and Java interfaces
    pub interfaces: Vec<InterfaceInfo>,
    /// C and C++ `#include` directives
    pub includes: Vec<IncludeInfo>,
    /// Java package declaration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    /// Declarations found by the generic rule set
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub structures: Vec<StructureInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<CommentStats>,
    /// Whole-file complexity, filled by the generic rule set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_handling: Option<ErrorHandlingStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub async_patterns: Option<AsyncStats>,
}

impl StructuralDescription {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            classes: Vec::new(),
            functions: Vec::new(),
            imports: Vec::new(),
            exports: Vec::new(),
            interfaces: Vec::new(),
            includes: Vec::new(),
            package: None,
            structures: Vec::new(),
            comments: None,
            complexity: None,
            error_handling: None,
            async_patterns: None,
        }
    }

    /// Every method of every class, in declaration order
    pub fn methods(&self) -> impl Iterator<Item = &MethodInfo> {
        self.classes.iter().flat_map(|c| c.methods.iter())
    }

    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.iter().map(|f| f.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassInfo {
    pub name: String,
    pub line: usize,
    /// First base class (`extends`, first Python base, first C++ base)
    pub superclass: Option<String>,
    /// Remaining bases for languages with multiple inheritance
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_bases: Vec<String>,
    pub interfaces: Vec<String>,
    pub methods: Vec<MethodInfo>,
    pub properties: Vec<PropertyInfo>,
    pub constructors: Vec<ConstructorInfo>,
    /// Declaration modifiers such as `abstract`, `final`, `exported`, `template`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decorators: Vec<String>,
}

impl ClassInfo {
    pub fn new(name: impl Into<String>, line: usize) -> Self {
        Self {
            name: name.into(),
            line,
            superclass: None,
            additional_bases: Vec::new(),
            interfaces: Vec::new(),
            methods: Vec::new(),
            properties: Vec::new(),
            constructors: Vec::new(),
            attributes: Vec::new(),
            decorators: Vec::new(),
        }
    }

    /// Superclass followed by any additional bases
    pub fn bases(&self) -> impl Iterator<Item = &str> {
        self.superclass
            .iter()
            .chain(self.additional_bases.iter())
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
    Protected,
    /// Java's default access
    Package,
}

impl Visibility {
    pub fn parse(keyword: &str) -> Option<Self> {
        match keyword {
            "public" => Some(Self::Public),
            "private" => Some(Self::Private),
            "protected" => Some(Self::Protected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodInfo {
    pub name: String,
    pub line: usize,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_async: bool,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<String>,
    pub complexity: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decorators: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyInfo {
    pub name: String,
    pub line: usize,
    pub visibility: Visibility,
    pub is_static: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// TypeScript `name?: T`
    #[serde(default)]
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructorInfo {
    pub line: usize,
    pub parameters: Vec<Parameter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionInfo {
    pub name: String,
    pub line: usize,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<String>,
    pub is_async: bool,
    pub is_exported: bool,
    pub complexity: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decorators: Vec<String>,
}

impl FunctionInfo {
    /// A bare name with no signature details, as the generic rules produce
    pub fn named(name: impl Into<String>, line: usize) -> Self {
        Self {
            name: name.into(),
            line,
            parameters: Vec::new(),
            return_type: None,
            is_async: false,
            is_exported: false,
            complexity: 1,
            decorators: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
    Es6,
    CommonJs,
    Python,
    Java,
    Generic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportInfo {
    /// Module specifier exactly as written (unresolved)
    pub module: String,
    pub items: Vec<String>,
    pub kind: ImportKind,
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    Named,
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportInfo {
    pub name: String,
    pub kind: ExportKind,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceInfo {
    pub name: String,
    pub line: usize,
    pub extends: Vec<String>,
    pub properties: Vec<PropertyInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludeInfo {
    pub path: String,
    pub is_system: bool,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureInfo {
    /// Declaration keyword: class, struct, interface, type, trait, enum
    pub kind: String,
    pub name: String,
    pub line: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentStats {
    pub single_line: usize,
    pub multi_line: usize,
    pub doc: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorHandlingStats {
    pub try_blocks: usize,
    pub catch_blocks: usize,
    pub throw_statements: usize,
    pub error_types: Vec<String>,
    pub has_error_handling: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsyncStats {
    pub async_functions: usize,
    pub await_calls: usize,
    pub promises: usize,
    pub promise_chains: usize,
    pub has_async_await: bool,
}
