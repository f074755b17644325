//! Language detection and enumeration
//!
//! Maps a file extension to a language tag. Detection is total through
//! [`Language::classify`], which falls back to [`Language::Generic`]; callers
//! that must reject unknown files use [`Language::from_path`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Languages the structural extractor knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    JavaScript,
    TypeScript,
    Python,
    Cpp,
    C,
    Java,
    Go,
    Rust,
    /// Fallback for extensions outside the table
    Generic,
}

/// Extension table in lookup order. The first language listing an extension wins,
/// which is why `.h` resolves to C++.
const EXTENSION_TABLE: &[(Language, &[&str])] = &[
    (Language::JavaScript, &["js", "jsx", "mjs"]),
    (Language::TypeScript, &["ts", "tsx"]),
    (Language::Python, &["py"]),
    (Language::Cpp, &["cpp", "cc", "cxx", "c++", "hpp", "h"]),
    (Language::C, &["c", "h"]),
    (Language::Java, &["java"]),
    (Language::Go, &["go"]),
    (Language::Rust, &["rs"]),
];

impl Language {
    /// All concrete languages, in table order
    pub const ALL: [Language; 8] = [
        Language::JavaScript,
        Language::TypeScript,
        Language::Python,
        Language::Cpp,
        Language::C,
        Language::Java,
        Language::Go,
        Language::Rust,
    ];

    /// Detect language from a file extension (without the dot, case-insensitive)
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext_lower = ext.to_lowercase();
        EXTENSION_TABLE
            .iter()
            .find(|(_, exts)| exts.contains(&ext_lower.as_str()))
            .map(|(lang, _)| *lang)
    }

    /// Detect language from file path, `None` for unknown extensions
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Total classification: unknown extensions map to [`Language::Generic`]
    pub fn classify(path: &Path) -> Self {
        Self::from_path(path).unwrap_or(Language::Generic)
    }

    /// Get default file extensions for this language
    pub fn extensions(&self) -> &'static [&'static str] {
        EXTENSION_TABLE
            .iter()
            .find(|(lang, _)| lang == self)
            .map(|(_, exts)| *exts)
            .unwrap_or(&[])
    }

    /// Stable tag stored in the cache
    pub fn tag(&self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Python => "python",
            Language::Cpp => "cpp",
            Language::C => "c",
            Language::Java => "java",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Generic => "unknown",
        }
    }

    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Language::JavaScript => "JavaScript",
            Language::TypeScript => "TypeScript",
            Language::Python => "Python",
            Language::Cpp => "C++",
            Language::C => "C",
            Language::Java => "Java",
            Language::Go => "Go",
            Language::Rust => "Rust",
            Language::Generic => "Unknown",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        if lower == "unknown" || lower == "generic" {
            return Ok(Language::Generic);
        }
        Self::ALL
            .iter()
            .find(|lang| lang.tag() == lower)
            .copied()
            .ok_or_else(|| format!("Unknown language tag: {s}"))
    }
}
