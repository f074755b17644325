//! Java rule set

use regex::Regex;
use std::ops::Range;
use std::sync::{Arc, LazyLock};

use super::registry::{ExtractError, ExtractResult, ExtractorRegistry, StructureExtractor};
use super::text::{
    LineIndex, balanced_block, comma_list, complexity, is_control_keyword, mask_nested, non_empty,
    parse_typed_params,
};
use super::{
    ClassInfo, ConstructorInfo, ImportInfo, ImportKind, InterfaceInfo, Language, MethodInfo,
    PropertyInfo, StructuralDescription, Visibility,
};

static PACKAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bpackage\s+([\w.]+)\s*;").expect("Invalid package regex"));

static CLASS_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"((?:@\w+(?:\([^)]*\))?\s*)*)((?:(?:public|private|protected|abstract|final|static|sealed)\s+)*)\b(?:class|record|enum)\s+(\w+)(?:\s*<[^>{]*>)?(?:\s*\([^)]*\))?(?:\s+extends\s+([\w.]+)(?:\s*<[^>{]*>)?)?(?:\s+implements\s+([\w,\s.<>]+?))?\s*\{",
    )
    .expect("Invalid class header regex")
});

static INTERFACE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:(?:public|private|protected|static|sealed)\s+)*\binterface\s+(\w+)(?:\s*<[^>{]*>)?(?:\s+extends\s+([\w,\s.<>]+?))?\s*\{",
    )
    .expect("Invalid interface regex")
});

static METHOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"((?:@\w+(?:\([^)]*\))?\s*)*)((?:(?:public|private|protected|static|final|abstract|synchronized|native|default)\s+)*)(?:<[^>]+>\s+)?([\w.]+(?:<[^;{}()]*>)?(?:\[\])*)\s+(\w+)\s*\(([^)]*)\)(?:\s*throws\s+[\w.,\s]+?)?\s*[{;]",
    )
    .expect("Invalid method regex")
});

static CONSTRUCTOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"((?:(?:public|private|protected)\s+)*)(\w+)\s*\(([^)]*)\)(?:\s*throws\s+[\w.,\s]+?)?\s*\{",
    )
    .expect("Invalid constructor regex")
});

static FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"((?:(?:public|private|protected|static|final|transient|volatile)\s+)*)([\w.]+(?:<[^;{}()]*>)?(?:\[\])*)\s+(\w+)(?:\s*=\s*([^;]+))?;",
    )
    .expect("Invalid field regex")
});

static IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bimport\s+(?:static\s+)?([\w.]+(?:\.\*)?)\s*;").expect("Invalid import regex")
});

const NOT_A_TYPE: &[&str] = &[
    "return", "throw", "new", "package", "import", "else", "case", "assert", "yield",
];

pub struct JavaExtractor;

impl StructureExtractor for JavaExtractor {
    fn name(&self) -> &'static str {
        "java"
    }

    fn languages(&self) -> &'static [Language] {
        &[Language::Java]
    }

    fn extract(&self, content: &str, language: Language) -> ExtractResult<StructuralDescription> {
        if language != Language::Java {
            return Err(ExtractError::WrongLanguage {
                extractor: self.name(),
                requested: language,
            });
        }

        let lines = LineIndex::new(content);
        let mut desc = StructuralDescription::new(language);

        desc.package = PACKAGE
            .captures(content)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string());
        desc.classes = extract_classes(content, &lines);
        desc.interfaces = INTERFACE_HEADER
            .captures_iter(content)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                Some(InterfaceInfo {
                    name: caps.get(1)?.as_str().to_string(),
                    line: lines.line_at(whole.start()),
                    extends: caps.get(2).map(|m| comma_list(m.as_str())).unwrap_or_default(),
                    properties: Vec::new(),
                })
            })
            .collect();
        desc.imports = IMPORT
            .captures_iter(content)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let module = caps.get(1)?.as_str();
                let item = module.rsplit('.').next().unwrap_or(module);
                Some(ImportInfo {
                    module: module.to_string(),
                    items: vec![item.to_string()],
                    kind: ImportKind::Java,
                    line: lines.line_at(whole.start()),
                })
            })
            .collect();

        Ok(desc)
    }
}

pub(crate) fn register(registry: &mut ExtractorRegistry) {
    registry.register(Arc::new(JavaExtractor));
}

fn extract_classes(content: &str, lines: &LineIndex) -> Vec<ClassInfo> {
    let mut classes = Vec::new();
    let mut resume = 0;

    while let Some(caps) = CLASS_HEADER.captures_at(content, resume) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(3)) else {
            break;
        };
        let open = whole.end() - 1;
        let block = balanced_block(content, open);
        let body_start = open + 1;
        let body_end = block.end.saturating_sub(1).max(body_start);
        let masked = mask_nested(&content[body_start..body_end]);

        // Report the declaration line, not the first annotation
        let decl_start = caps.get(2).map_or(whole.start(), |m| m.start());
        let mut class = ClassInfo::new(name.as_str(), lines.line_at(decl_start));
        class.superclass = caps.get(4).map(|m| m.as_str().to_string());
        class.interfaces = caps
            .get(5)
            .map(|m| comma_list(m.as_str()))
            .unwrap_or_default();
        class.attributes = caps
            .get(2)
            .map(|m| m.as_str().split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        class.decorators = annotations(caps.get(1).map_or("", |m| m.as_str()));

        fill_members(&mut class, content, &masked, body_start, lines);

        classes.push(class);
        resume = body_start;
    }

    classes
}

fn annotations(text: &str) -> Vec<String> {
    text.split('@')
        .filter_map(non_empty)
        .collect()
}

fn modifier_visibility(modifiers: &str) -> Visibility {
    modifiers
        .split_whitespace()
        .find_map(Visibility::parse)
        .unwrap_or(Visibility::Package)
}

fn fill_members(
    class: &mut ClassInfo,
    content: &str,
    masked: &str,
    base: usize,
    lines: &LineIndex,
) {
    let mut claimed: Vec<Range<usize>> = Vec::new();

    for caps in CONSTRUCTOR.captures_iter(masked) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(2)) else {
            continue;
        };
        if name.as_str() != class.name {
            continue;
        }
        claimed.push(whole.range());
        class.constructors.push(ConstructorInfo {
            line: lines.line_at(base + name.start()),
            parameters: parse_typed_params(caps.get(3).map_or("", |m| m.as_str())),
        });
    }

    for caps in METHOD.captures_iter(masked) {
        let (Some(whole), Some(ret), Some(name)) = (caps.get(0), caps.get(3), caps.get(4)) else {
            continue;
        };
        if claimed
            .iter()
            .any(|c| c.start < whole.end() && whole.start() < c.end)
            || NOT_A_TYPE.contains(&ret.as_str())
            || is_control_keyword(name.as_str())
        {
            continue;
        }
        claimed.push(whole.range());

        let modifiers = caps.get(2).map_or("", |m| m.as_str());
        let has_body = whole.as_str().ends_with('{');
        class.methods.push(MethodInfo {
            name: name.as_str().to_string(),
            line: lines.line_at(base + name.start()),
            visibility: modifier_visibility(modifiers),
            is_static: modifiers.contains("static"),
            is_async: false,
            parameters: parse_typed_params(caps.get(5).map_or("", |m| m.as_str())),
            return_type: Some(ret.as_str().to_string()),
            complexity: if has_body {
                complexity(&content[balanced_block(content, base + whole.end() - 1)])
            } else {
                1
            },
            decorators: annotations(caps.get(1).map_or("", |m| m.as_str())),
        });
    }

    for caps in FIELD.captures_iter(masked) {
        let (Some(whole), Some(ty), Some(name)) = (caps.get(0), caps.get(2), caps.get(3)) else {
            continue;
        };
        if claimed
            .iter()
            .any(|c| c.start < whole.end() && whole.start() < c.end)
            || NOT_A_TYPE.contains(&ty.as_str())
        {
            continue;
        }
        let modifiers = caps.get(1).map_or("", |m| m.as_str());
        class.properties.push(PropertyInfo {
            name: name.as_str().to_string(),
            line: lines.line_at(base + name.start()),
            visibility: modifier_visibility(modifiers),
            is_static: modifiers.contains("static"),
            type_name: Some(ty.as_str().to_string()),
            default_value: caps.get(4).and_then(|m| non_empty(m.as_str())),
            optional: false,
        });
    }
}
