//! C and C++ rule set

use regex::Regex;
use std::ops::Range;
use std::sync::{Arc, LazyLock};

use super::registry::{ExtractError, ExtractResult, ExtractorRegistry, StructureExtractor};
use super::text::{
    LineIndex, balanced_block, complexity, is_control_keyword, mask_nested, non_empty,
    parse_typed_params,
};
use super::{
    ClassInfo, ConstructorInfo, FunctionInfo, ImportInfo, ImportKind, IncludeInfo, Language,
    MethodInfo, PropertyInfo, StructuralDescription, Visibility,
};

static CLASS_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(template\s*<[^>]*>\s*)?\b(class|struct)\s+(\w+)(\s+final)?(?:\s*:\s*([^{;]+?))?\s*\{",
    )
    .expect("Invalid class header regex")
});

static ACCESS_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(public|private|protected)\s*:").expect("Invalid access label regex")
});

static METHOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"((?:(?:inline|static|virtual|constexpr|explicit)\s+)*)(?:((?:\w+::)*\w+(?:\s*<[^;{}()]*>)?(?:\s*[*&]+)?)\s+)?(~?\w+)\s*\(([^)]*)\)\s*((?:(?:const|noexcept|override|final)\s*)*)(?:->\s*[\w:<>*&\s]+?)?\s*(?:=\s*(?:0|default|delete)\s*)?[{;]",
    )
    .expect("Invalid method regex")
});

static MEMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b((?:(?:static|mutable|const|constexpr|inline|volatile)\s+)*)((?:\w+::)*\w+(?:\s*<[^;{}()]*>)?(?:\s*[*&]+)?)\s+([*&]*)(\w+)(?:\s*\[[^\]]*\])?(?:\s*=\s*[^;{}]+|\s*\{[^}]*\})?\s*;",
    )
    .expect("Invalid member regex")
});

static FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"((?:(?:inline|static|virtual|constexpr|extern)\s+)*)((?:\w+::)*\w+(?:\s*<[^;{}()]*>)?(?:\s*[*&]+)*)\s+([*&]*)((?:\w+::)*~?\w+)\s*\(([^)]*)\)\s*(const|noexcept|override|final)?\s*(?:->[\s\w*&:<>]+)?\s*([{;])",
    )
    .expect("Invalid function regex")
});

static INCLUDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"#include\s*([<"])([^>"]+)[>"]"#).expect("Invalid include regex")
});

/// Words the type position of a declaration rule can pick up that are never types
const NOT_A_TYPE: &[&str] = &[
    "return", "else", "new", "delete", "throw", "case", "goto", "co_return", "typedef", "using",
    "namespace", "friend", "class", "struct", "enum", "union", "public", "private", "protected",
    "operator", "template",
];

pub struct CppExtractor;

impl StructureExtractor for CppExtractor {
    fn name(&self) -> &'static str {
        "cpp"
    }

    fn languages(&self) -> &'static [Language] {
        &[Language::Cpp, Language::C]
    }

    fn extract(&self, content: &str, language: Language) -> ExtractResult<StructuralDescription> {
        if !self.languages().contains(&language) {
            return Err(ExtractError::WrongLanguage {
                extractor: self.name(),
                requested: language,
            });
        }

        let lines = LineIndex::new(content);
        let mut desc = StructuralDescription::new(language);

        let (classes, class_ranges) = extract_classes(content, &lines);
        desc.classes = classes;
        desc.functions = extract_functions(content, &lines, &class_ranges);
        desc.includes = INCLUDE
            .captures_iter(content)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                Some(IncludeInfo {
                    path: caps.get(2)?.as_str().to_string(),
                    is_system: caps.get(1)?.as_str() == "<",
                    line: lines.line_at(whole.start()),
                })
            })
            .collect();
        // Includes double as the import list so consumers see one shape
        desc.imports = desc
            .includes
            .iter()
            .map(|inc| ImportInfo {
                module: inc.path.clone(),
                items: Vec::new(),
                kind: ImportKind::Generic,
                line: inc.line,
            })
            .collect();

        Ok(desc)
    }
}

pub(crate) fn register(registry: &mut ExtractorRegistry) {
    registry.register(Arc::new(CppExtractor));
}

fn extract_classes(content: &str, lines: &LineIndex) -> (Vec<ClassInfo>, Vec<Range<usize>>) {
    let mut classes = Vec::new();
    let mut ranges = Vec::new();
    let mut resume = 0;

    while let Some(caps) = CLASS_HEADER.captures_at(content, resume) {
        let (Some(whole), Some(keyword), Some(name)) = (caps.get(0), caps.get(2), caps.get(3))
        else {
            break;
        };
        let open = whole.end() - 1;
        let block = balanced_block(content, open);
        let body_start = open + 1;
        let body_end = block.end.saturating_sub(1).max(body_start);
        let masked = mask_nested(&content[body_start..body_end]);

        let mut class = ClassInfo::new(name.as_str(), lines.line_at(whole.start()));
        let mut bases = caps
            .get(5)
            .map(|m| parse_bases(m.as_str()))
            .unwrap_or_default()
            .into_iter();
        class.superclass = bases.next();
        class.additional_bases = bases.collect();

        if caps.get(1).is_some() {
            class.attributes.push("template".to_string());
        }
        if caps.get(4).is_some() {
            class.attributes.push("final".to_string());
        }
        if masked.contains("virtual") {
            class.attributes.push("virtual".to_string());
        }
        if masked.contains("static") {
            class.attributes.push("static".to_string());
        }

        let default_access = if keyword.as_str() == "struct" {
            Visibility::Public
        } else {
            Visibility::Private
        };
        fill_members(&mut class, content, &masked, body_start, default_access, lines);

        classes.push(class);
        ranges.push(whole.start()..block.end);
        resume = body_start;
    }

    (classes, ranges)
}

/// `public Base, private virtual Other<T>` -> `[Base, Other<T>]`
fn parse_bases(list: &str) -> Vec<String> {
    super::text::split_top_level(list)
        .into_iter()
        .filter_map(|base| base.split_whitespace().last())
        .map(str::to_string)
        .collect()
}

fn fill_members(
    class: &mut ClassInfo,
    content: &str,
    masked: &str,
    base: usize,
    default_access: Visibility,
    lines: &LineIndex,
) {
    let labels: Vec<(usize, Visibility)> = ACCESS_LABEL
        .captures_iter(masked)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some((whole.end(), Visibility::parse(caps.get(1)?.as_str())?))
        })
        .collect();
    let access_at = |offset: usize| {
        labels
            .iter()
            .rev()
            .find(|(end, _)| *end <= offset)
            .map_or(default_access, |(_, v)| *v)
    };

    let mut claimed: Vec<Range<usize>> = Vec::new();

    for caps in METHOD.captures_iter(masked) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(3)) else {
            continue;
        };
        let name_str = name.as_str();
        let return_type = caps.get(2).map(|m| m.as_str().trim().to_string());
        if is_control_keyword(name_str)
            || return_type
                .as_deref()
                .is_some_and(|t| NOT_A_TYPE.contains(&t))
        {
            continue;
        }
        claimed.push(whole.range());

        let parameters = parse_typed_params(caps.get(4).map_or("", |m| m.as_str()));
        let line = lines.line_at(base + name.start());
        if name_str == class.name && return_type.is_none() {
            class.constructors.push(ConstructorInfo { line, parameters });
            continue;
        }

        let modifiers = caps.get(1).map_or("", |m| m.as_str());
        let has_body = whole.as_str().ends_with('{');
        class.methods.push(MethodInfo {
            name: name_str.to_string(),
            line,
            visibility: access_at(whole.start()),
            is_static: modifiers.contains("static"),
            is_async: false,
            parameters,
            return_type,
            complexity: if has_body {
                complexity(&content[balanced_block(content, base + whole.end() - 1)])
            } else {
                1
            },
            decorators: Vec::new(),
        });
    }

    for caps in MEMBER.captures_iter(masked) {
        let (Some(whole), Some(ty), Some(name)) = (caps.get(0), caps.get(2), caps.get(4)) else {
            continue;
        };
        let ty_str = ty.as_str().trim();
        if claimed
            .iter()
            .any(|c| c.start < whole.end() && whole.start() < c.end)
            || NOT_A_TYPE.contains(&ty_str)
        {
            continue;
        }
        let pointer = caps.get(3).map_or("", |m| m.as_str());
        let modifiers = caps.get(1).map_or("", |m| m.as_str());
        class.properties.push(PropertyInfo {
            name: name.as_str().to_string(),
            line: lines.line_at(base + name.start()),
            visibility: access_at(whole.start()),
            is_static: modifiers.contains("static"),
            type_name: non_empty(&format!("{ty_str}{pointer}")),
            default_value: None,
            optional: false,
        });
    }
}

/// Free functions outside class bodies. Function bodies are skipped so local
/// declarations inside them never read as functions.
fn extract_functions(
    content: &str,
    lines: &LineIndex,
    class_ranges: &[Range<usize>],
) -> Vec<FunctionInfo> {
    let mut functions = Vec::new();
    let mut at = 0;

    while let Some(caps) = FUNCTION.captures_at(content, at) {
        let Some(whole) = caps.get(0) else { break };

        if let Some(class) = class_ranges.iter().find(|r| r.contains(&whole.start())) {
            at = class.end.max(whole.start() + 1);
            continue;
        }

        let has_body = caps.get(7).is_some_and(|m| m.as_str() == "{");
        let body = has_body.then(|| balanced_block(content, whole.end() - 1));
        at = body.as_ref().map_or(whole.end(), |b| b.end);

        let (Some(ret), Some(name)) = (caps.get(2), caps.get(4)) else {
            continue;
        };
        let ret_str = ret.as_str().trim();
        let name_str = name.as_str();
        if NOT_A_TYPE.contains(&ret_str) || is_control_keyword(name_str) {
            continue;
        }

        let pointer = caps.get(3).map_or("", |m| m.as_str());
        let modifiers = caps.get(1).map_or("", |m| m.as_str());
        functions.push(FunctionInfo {
            name: name_str.to_string(),
            line: lines.line_at(whole.start()),
            parameters: parse_typed_params(caps.get(5).map_or("", |m| m.as_str())),
            return_type: Some(format!("{ret_str}{pointer}")),
            is_async: false,
            is_exported: !modifiers.contains("static"),
            complexity: body.map_or(1, |b| complexity(&content[b])),
            decorators: Vec::new(),
        });
    }

    functions
}
