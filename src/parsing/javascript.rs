//! JavaScript and TypeScript rule set
//!
//! Classes are found by their header and their body is taken by brace
//! matching. Member rules then run over the body with nested blocks blanked
//! out (see [`mask_nested`]), so statements inside method bodies never show
//! up as members.

use regex::{Captures, Regex};
use std::ops::Range;
use std::sync::{Arc, LazyLock};

use super::registry::{ExtractError, ExtractResult, ExtractorRegistry, StructureExtractor};
use super::text::{
    LineIndex, balanced_block, comma_list, complexity, is_control_keyword, mask_nested, non_empty,
    parse_annotated_params,
};
use super::{
    AsyncStats, ClassInfo, ConstructorInfo, ErrorHandlingStats, ExportInfo, ExportKind,
    FunctionInfo, ImportInfo, ImportKind, InterfaceInfo, Language, MethodInfo, PropertyInfo,
    StructuralDescription, Visibility,
};

static CLASS_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:\bexport\s+)?(?:default\s+)?(?:abstract\s+)?\bclass\s+(\w+)(?:\s*<[^>{]*>)?(?:\s+extends\s+([\w.]+)(?:\s*<[^>{]*>)?)?(?:\s+implements\s+([\w,\s]+?))?\s*\{",
    )
    .expect("Invalid class header regex")
});

static METHOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:(public|private|protected)\s+)?(?:(static)\s+)?(?:(async)\s+)?(?:(?:get|set)\s+)?(#?\w+)\s*\(([^)]*)\)(?:\s*:\s*([^{;]+?))?\s*\{",
    )
    .expect("Invalid method regex")
});

static PROPERTY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:(public|private|protected)\s+)?(?:(static)\s+)?(?:readonly\s+)?(#?\w+)(\?)?(?:\s*:\s*([^=;{]+))?(?:\s*=\s*([^;{]+))?[;{]",
    )
    .expect("Invalid property regex")
});

static CONSTRUCTOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bconstructor\s*\(([^)]*)\)\s*\{").expect("Invalid constructor regex")
});

static FUNCTION_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?P<export>\bexport\s+(?:default\s+)?)?(?P<async>\basync\s+)?\bfunction\b\s*\*?\s*(?P<name>\w+)\s*(?:<[^>(]*>)?\s*\((?P<params>[^)]*)\)(?:\s*:\s*(?P<ret>[^{;]+?))?\s*\{",
    )
    .expect("Invalid function declaration regex")
});

static FUNCTION_EXPR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?P<export>\bexport\s+)?\b(?:const|let|var)\s+(?P<name>\w+)(?:\s*:\s*[^=]+?)?\s*=\s*(?P<async>async\s+)?(?:\bfunction\b\s*\*?\s*\w*\s*\((?P<fparams>[^)]*)\)|\((?P<aparams>[^)]*)\)|(?P<single>\w+))(?:\s*:\s*(?P<ret>[^={;]+?))?\s*(?:=>|\{)",
    )
    .expect("Invalid function expression regex")
});

static INTERFACE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:\bexport\s+)?\binterface\s+(\w+)(?:\s*<[^>{]*>)?(?:\s+extends\s+([\w,\s.<>]+?))?\s*\{",
    )
    .expect("Invalid interface regex")
});

static INTERFACE_PROPERTY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:readonly\s+)?(\w+)(\?)?\s*:\s*([^;,\n]+)").expect("Invalid interface member regex")
});

static ES6_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\bimport\s+(?:type\s+)?(?:\{([^}]+)\}|\*\s+as\s+(\w+)|(\w+))(?:\s*,\s*\{([^}]+)\})?\s+from\s+['"]([^'"]+)['"]"#,
    )
    .expect("Invalid import regex")
});

static SIDE_EFFECT_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bimport\s+['"]([^'"]+)['"]"#).expect("Invalid side-effect import regex")
});

static REQUIRE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\b(?:const|let|var)\s+(?:\{([^}]+)\}|(\w+))\s*=\s*require\s*\(\s*['"]([^'"]+)['"]\s*\)"#,
    )
    .expect("Invalid require regex")
});

static NAMED_EXPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\bexport\s+(?:async\s+)?(?:const|let|var|function\*?|class|interface|type|enum)\s+(\w+)",
    )
    .expect("Invalid named export regex")
});

static EXPORT_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bexport\s*\{([^}]*)\}").expect("Invalid export list regex")
});

static DEFAULT_EXPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\bexport\s+default\s+(?:abstract\s+)?(?:class\s+(\w+)|(?:async\s+)?function\s*\*?\s*(\w+)|(\w+))",
    )
    .expect("Invalid default export regex")
});

static MODULE_EXPORTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bmodule\.exports\s*=\s*(\w+)|\bexports\.(\w+)\s*=")
        .expect("Invalid CommonJS export regex")
});

static TRY_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\btry\s*\{").expect("Invalid try regex"));
static CATCH_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bcatch\b\s*[({]").expect("Invalid catch regex"));
static THROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bthrow\s+").expect("Invalid throw regex"));
static ERROR_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bnew\s+(\w*Error)\s*\(|\bcatch\s*\(\s*(\w+)\s*:")
        .expect("Invalid error type regex")
});

static ASYNC_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\basync\s+(?:function\b|\w+\s*(?:=>|\()|\([^)]*\)\s*=>)")
        .expect("Invalid async regex")
});
static AWAIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bawait\s+").expect("Invalid await regex"));
static NEW_PROMISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bnew\s+Promise\b").expect("Invalid promise regex"));
static THEN_CHAIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.then\s*\(").expect("Invalid then regex"));

/// Rule set for `.js`, `.jsx`, `.mjs`, `.ts` and `.tsx`
pub struct JavaScriptExtractor;

impl StructureExtractor for JavaScriptExtractor {
    fn name(&self) -> &'static str {
        "javascript"
    }

    fn languages(&self) -> &'static [Language] {
        &[Language::JavaScript, Language::TypeScript]
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

        desc.classes = extract_classes(content, &lines);
        desc.functions = extract_functions(content, &lines);
        if language == Language::TypeScript {
            desc.interfaces = extract_interfaces(content, &lines);
        }
        desc.imports = extract_imports(content, &lines);
        desc.exports = extract_exports(content, &lines);
        desc.error_handling = Some(error_handling(content));
        desc.async_patterns = Some(async_patterns(content));

        Ok(desc)
    }
}

pub(crate) fn register(registry: &mut ExtractorRegistry) {
    registry.register(Arc::new(JavaScriptExtractor));
}

fn extract_classes(content: &str, lines: &LineIndex) -> Vec<ClassInfo> {
    let mut classes = Vec::new();
    let mut resume = 0;

    while let Some(caps) = CLASS_HEADER.captures_at(content, resume) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        let open = whole.end() - 1;
        let block = balanced_block(content, open);

        let mut class = ClassInfo::new(name.as_str(), lines.line_at(whole.start()));
        class.superclass = caps.get(2).map(|m| m.as_str().to_string());
        class.interfaces = caps.get(3).map(|m| comma_list(m.as_str())).unwrap_or_default();

        let header = whole.as_str();
        if header.contains("abstract") {
            class.attributes.push("abstract".to_string());
        }
        if header.trim_start().starts_with("export") {
            class.attributes.push("exported".to_string());
        }

        let body_start = open + 1;
        let body_end = block.end.saturating_sub(1).max(body_start);
        let masked = mask_nested(&content[body_start..body_end]);
        fill_members(&mut class, content, &masked, body_start, lines);

        classes.push(class);
        // Continue inside the body so nested class expressions are still seen
        resume = body_start;
    }

    classes
}

/// Methods, constructors and properties from a masked class body at `base`
fn fill_members(
    class: &mut ClassInfo,
    content: &str,
    masked: &str,
    base: usize,
    lines: &LineIndex,
) {
    let mut claimed: Vec<Range<usize>> = Vec::new();

    for caps in CONSTRUCTOR.captures_iter(masked) {
        let Some(whole) = caps.get(0) else { continue };
        claimed.push(whole.range());
        class.constructors.push(ConstructorInfo {
            line: lines.line_at(base + whole.start()),
            parameters: parse_annotated_params(caps.get(1).map_or("", |m| m.as_str())),
        });
    }

    for caps in METHOD.captures_iter(masked) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(4)) else {
            continue;
        };
        if overlaps(&claimed, &whole.range()) {
            continue;
        }
        let raw_name = name.as_str();
        if raw_name == "constructor" || is_control_keyword(raw_name) {
            continue;
        }
        claimed.push(whole.range());

        let (name, visibility) = member_name(raw_name, caps.get(1).map(|m| m.as_str()));
        let absolute_end = base + whole.end();
        class.methods.push(MethodInfo {
            name,
            line: lines.line_at(base + name_start(&caps, 4)),
            visibility,
            is_static: caps.get(2).is_some(),
            is_async: caps.get(3).is_some(),
            parameters: parse_annotated_params(caps.get(5).map_or("", |m| m.as_str())),
            return_type: caps.get(6).and_then(|m| non_empty(m.as_str())),
            complexity: body_complexity(content, absolute_end - 1),
            decorators: Vec::new(),
        });
    }

    for caps in PROPERTY.captures_iter(masked) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(3)) else {
            continue;
        };
        if overlaps(&claimed, &whole.range()) || is_control_keyword(name.as_str()) {
            continue;
        }
        let type_name = caps.get(5).and_then(|m| non_empty(m.as_str()));
        if type_name.as_deref().is_some_and(|t| t.contains(['(', ')'])) {
            continue;
        }
        let (prop_name, visibility) = member_name(name.as_str(), caps.get(1).map(|m| m.as_str()));
        class.properties.push(PropertyInfo {
            name: prop_name,
            line: lines.line_at(base + name.start()),
            visibility,
            is_static: caps.get(2).is_some(),
            type_name,
            default_value: caps.get(6).and_then(|m| non_empty(m.as_str())),
            optional: caps.get(4).is_some(),
        });
    }
}

/// `#name` is a private field regardless of modifiers
fn member_name(raw: &str, modifier: Option<&str>) -> (String, Visibility) {
    match raw.strip_prefix('#') {
        Some(stripped) => (stripped.to_string(), Visibility::Private),
        None => (
            raw.to_string(),
            modifier
                .and_then(Visibility::parse)
                .unwrap_or(Visibility::Public),
        ),
    }
}

fn name_start(caps: &Captures<'_>, group: usize) -> usize {
    caps.get(group)
        .or_else(|| caps.get(0))
        .map_or(0, |m| m.start())
}

fn overlaps(claimed: &[Range<usize>], range: &Range<usize>) -> bool {
    claimed
        .iter()
        .any(|c| c.start < range.end && range.start < c.end)
}

/// Complexity of the brace block opening at `open`
fn body_complexity(content: &str, open: usize) -> u32 {
    complexity(&content[balanced_block(content, open)])
}

fn extract_functions(content: &str, lines: &LineIndex) -> Vec<FunctionInfo> {
    let mut found: Vec<(usize, FunctionInfo)> = Vec::new();

    for caps in FUNCTION_DECL.captures_iter(content) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.name("name")) else {
            continue;
        };
        found.push((
            whole.start(),
            FunctionInfo {
                name: name.as_str().to_string(),
                line: lines.line_at(whole.start()),
                parameters: parse_annotated_params(caps.name("params").map_or("", |m| m.as_str())),
                return_type: caps.name("ret").and_then(|m| non_empty(m.as_str())),
                is_async: caps.name("async").is_some(),
                is_exported: caps.name("export").is_some(),
                complexity: body_complexity(content, whole.end() - 1),
                decorators: Vec::new(),
            },
        ));
    }

    for caps in FUNCTION_EXPR.captures_iter(content) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.name("name")) else {
            continue;
        };
        let params = caps
            .name("fparams")
            .or_else(|| caps.name("aparams"))
            .or_else(|| caps.name("single"))
            .map_or("", |m| m.as_str());
        found.push((
            whole.start(),
            FunctionInfo {
                name: name.as_str().to_string(),
                line: lines.line_at(whole.start()),
                parameters: parse_annotated_params(params),
                return_type: caps.name("ret").and_then(|m| non_empty(m.as_str())),
                is_async: caps.name("async").is_some(),
                is_exported: caps.name("export").is_some(),
                complexity: expression_complexity(content, whole.end()),
                decorators: Vec::new(),
            },
        ));
    }

    found.sort_by_key(|(offset, _)| *offset);
    found.into_iter().map(|(_, f)| f).collect()
}

/// Complexity for a function whose header ends at `end` (just past `{` or `=>`)
fn expression_complexity(content: &str, end: usize) -> u32 {
    if content[..end].ends_with('{') {
        return body_complexity(content, end - 1);
    }
    let rest = &content[end..];
    let trimmed = rest.trim_start();
    if trimmed.starts_with('{') {
        return body_complexity(content, end + (rest.len() - trimmed.len()));
    }
    // Expression-bodied arrow: the rest of the line is the body
    let line_end = rest.find('\n').unwrap_or(rest.len());
    complexity(&rest[..line_end])
}

fn extract_interfaces(content: &str, lines: &LineIndex) -> Vec<InterfaceInfo> {
    let mut interfaces = Vec::new();

    for caps in INTERFACE_HEADER.captures_iter(content) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let open = whole.end() - 1;
        let block = balanced_block(content, open);
        let body_start = open + 1;
        let body_end = block.end.saturating_sub(1).max(body_start);
        let masked = mask_nested(&content[body_start..body_end]);

        let properties = INTERFACE_PROPERTY
            .captures_iter(&masked)
            .filter_map(|p| {
                let prop_name = p.get(1)?;
                let type_name = non_empty(p.get(3)?.as_str())?;
                if type_name.contains(['(', ')']) {
                    return None;
                }
                Some(PropertyInfo {
                    name: prop_name.as_str().to_string(),
                    line: lines.line_at(body_start + prop_name.start()),
                    visibility: Visibility::Public,
                    is_static: false,
                    type_name: Some(type_name),
                    default_value: None,
                    optional: p.get(2).is_some(),
                })
            })
            .collect();

        interfaces.push(InterfaceInfo {
            name: name.as_str().to_string(),
            line: lines.line_at(whole.start()),
            extends: caps.get(2).map(|m| comma_list(m.as_str())).unwrap_or_default(),
            properties,
        });
    }

    interfaces
}

fn extract_imports(content: &str, lines: &LineIndex) -> Vec<ImportInfo> {
    let mut found: Vec<(usize, ImportInfo)> = Vec::new();

    for caps in ES6_IMPORT.captures_iter(content) {
        let (Some(whole), Some(module)) = (caps.get(0), caps.get(5)) else {
            continue;
        };
        let mut items = Vec::new();
        if let Some(default) = caps.get(3).or_else(|| caps.get(2)) {
            items.push(default.as_str().to_string());
        }
        for group in [caps.get(1), caps.get(4)].into_iter().flatten() {
            items.extend(import_names(group.as_str()));
        }
        found.push((
            whole.start(),
            ImportInfo {
                module: module.as_str().to_string(),
                items,
                kind: ImportKind::Es6,
                line: lines.line_at(whole.start()),
            },
        ));
    }

    for caps in SIDE_EFFECT_IMPORT.captures_iter(content) {
        let (Some(whole), Some(module)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        found.push((
            whole.start(),
            ImportInfo {
                module: module.as_str().to_string(),
                items: Vec::new(),
                kind: ImportKind::Es6,
                line: lines.line_at(whole.start()),
            },
        ));
    }

    for caps in REQUIRE.captures_iter(content) {
        let (Some(whole), Some(module)) = (caps.get(0), caps.get(3)) else {
            continue;
        };
        let items = match (caps.get(1), caps.get(2)) {
            (Some(list), _) => import_names(list.as_str()),
            (None, Some(single)) => vec![single.as_str().to_string()],
            (None, None) => Vec::new(),
        };
        found.push((
            whole.start(),
            ImportInfo {
                module: module.as_str().to_string(),
                items,
                kind: ImportKind::CommonJs,
                line: lines.line_at(whole.start()),
            },
        ));
    }

    found.sort_by_key(|(offset, _)| *offset);
    found.into_iter().map(|(_, i)| i).collect()
}

/// `a, b as c` -> `[a, c]`; also handles `a: c` destructuring renames
fn import_names(list: &str) -> Vec<String> {
    list.split(',')
        .filter_map(|item| {
            let item = item.trim().trim_start_matches("type ").trim();
            let local = item
                .rsplit_once(" as ")
                .map(|(_, alias)| alias)
                .or_else(|| item.split_once(':').map(|(_, alias)| alias))
                .unwrap_or(item);
            non_empty(local)
        })
        .collect()
}

fn extract_exports(content: &str, lines: &LineIndex) -> Vec<ExportInfo> {
    let mut found: Vec<(usize, ExportInfo)> = Vec::new();
    let mut push = |offset: usize, name: &str, kind: ExportKind| {
        found.push((
            offset,
            ExportInfo {
                name: name.to_string(),
                kind,
                line: lines.line_at(offset),
            },
        ));
    };

    for caps in NAMED_EXPORT.captures_iter(content) {
        if let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) {
            push(whole.start(), name.as_str(), ExportKind::Named);
        }
    }

    for caps in EXPORT_LIST.captures_iter(content) {
        let (Some(whole), Some(list)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        for name in import_names(list.as_str()) {
            push(whole.start(), &name, ExportKind::Named);
        }
    }

    for caps in DEFAULT_EXPORT.captures_iter(content) {
        let Some(whole) = caps.get(0) else { continue };
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .map(|m| m.as_str())
            .filter(|n| !matches!(*n, "function" | "class" | "async"))
            .unwrap_or("default");
        push(whole.start(), name, ExportKind::Default);
    }

    for caps in MODULE_EXPORTS.captures_iter(content) {
        let Some(whole) = caps.get(0) else { continue };
        match (caps.get(1), caps.get(2)) {
            (Some(default), _) => push(whole.start(), default.as_str(), ExportKind::Default),
            (None, Some(named)) => push(whole.start(), named.as_str(), ExportKind::Named),
            (None, None) => {}
        }
    }

    found.sort_by_key(|(offset, _)| *offset);
    found.into_iter().map(|(_, e)| e).collect()
}

fn error_handling(content: &str) -> ErrorHandlingStats {
    let try_blocks = TRY_BLOCK.find_iter(content).count();
    let catch_blocks = CATCH_BLOCK.find_iter(content).count();

    let mut error_types: Vec<String> = Vec::new();
    for caps in ERROR_TYPE.captures_iter(content) {
        if let Some(name) = caps.get(1).or_else(|| caps.get(2)) {
            if !error_types.iter().any(|t| t == name.as_str()) {
                error_types.push(name.as_str().to_string());
            }
        }
    }

    ErrorHandlingStats {
        try_blocks,
        catch_blocks,
        throw_statements: THROW.find_iter(content).count(),
        error_types,
        has_error_handling: try_blocks > 0 && catch_blocks > 0,
    }
}

fn async_patterns(content: &str) -> AsyncStats {
    let async_functions = ASYNC_FUNCTION.find_iter(content).count();
    let await_calls = AWAIT.find_iter(content).count();
    AsyncStats {
        async_functions,
        await_calls,
        promises: NEW_PROMISE.find_iter(content).count(),
        promise_chains: THEN_CHAIN.find_iter(content).count(),
        has_async_await: async_functions > 0 && await_calls > 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(code: &str, language: Language) -> StructuralDescription {
        JavaScriptExtractor.extract(code, language).unwrap()
    }

    #[test]
    fn test_class_with_inheritance_and_methods() {
        let code = "class Foo extends Bar { getInstance() {} }";
        let desc = extract(code, Language::JavaScript);

        assert_eq!(desc.classes.len(), 1);
        let class = &desc.classes[0];
        assert_eq!(class.name, "Foo");
        assert_eq!(class.superclass.as_deref(), Some("Bar"));
        assert_eq!(class.line, 1);
        assert_eq!(class.methods.len(), 1);
        assert_eq!(class.methods[0].name, "getInstance");
        assert_eq!(class.methods[0].complexity, 1);
    }

    #[test]
    fn test_nested_bodies_do_not_leak_members() {
        let code = r#"
export class Service extends Base implements Runnable, Disposable {
  private static instance: Service;
  count = 0;

  constructor(name) {
    super(name);
  }

  static getInstance() {
    if (!Service.instance) {
      for (const x of []) { if (x) { return x; } }
    }
    return Service.instance;
  }

  async load(url: string): Promise<void> {
    await fetch(url);
  }
}
"#;
        let desc = extract(code, Language::TypeScript);
        let class = &desc.classes[0];

        assert_eq!(class.line, 2);
        assert_eq!(class.interfaces, vec!["Runnable", "Disposable"]);
        assert!(class.attributes.contains(&"exported".to_string()));
        assert_eq!(class.constructors.len(), 1);
        assert_eq!(class.constructors[0].parameters[0].name, "name");

        let names: Vec<_> = class.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["getInstance", "load"]);

        let get_instance = &class.methods[0];
        assert!(get_instance.is_static);
        // if, for, if
        assert_eq!(get_instance.complexity, 4);
        assert_eq!(get_instance.line, 10);

        let load = &class.methods[1];
        assert!(load.is_async);
        assert_eq!(load.return_type.as_deref(), Some("Promise<void>"));
        assert_eq!(load.parameters[0].type_name.as_deref(), Some("string"));

        let instance = class
            .properties
            .iter()
            .find(|p| p.name == "instance")
            .unwrap();
        assert!(instance.is_static);
        assert_eq!(instance.visibility, Visibility::Private);
        assert!(class.properties.iter().any(|p| p.name == "count"));
        // method parameters are not mistaken for properties
        assert!(!class.properties.iter().any(|p| p.name == "url"));
    }

    #[test]
    fn test_private_hash_fields() {
        let code = "class Cache { static #instance = null; static getInstance() { return 1; } }";
        let desc = extract(code, Language::JavaScript);
        let prop = &desc.classes[0].properties[0];
        assert_eq!(prop.name, "instance");
        assert_eq!(prop.visibility, Visibility::Private);
        assert!(prop.is_static);
    }

    #[test]
    fn test_functions() {
        let code = r#"
export async function load(path, opts = {}) {
  if (a && b) { return 1; }
}
const add = (a, b) => a + b;
const check = async (x) => {
  return x ? 1 : 2;
};
let legacy = function (y) { while (y) {} };
"#;
        let desc = extract(code, Language::JavaScript);
        let names: Vec<_> = desc.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["load", "add", "check", "legacy"]);

        let load = &desc.functions[0];
        assert!(load.is_async && load.is_exported);
        assert_eq!(load.line, 2);
        assert_eq!(load.parameters.len(), 2);
        assert_eq!(load.parameters[1].default_value.as_deref(), Some("{}"));
        // if, &&
        assert_eq!(load.complexity, 3);

        assert_eq!(desc.functions[1].complexity, 1);
        assert!(desc.functions[2].is_async);
        assert_eq!(desc.functions[2].complexity, 2);
        assert_eq!(desc.functions[3].complexity, 2);
    }

    #[test]
    fn test_imports_and_exports() {
        let code = r#"
import React, { useState, useEffect as effect } from 'react';
import * as path from "path";
import './styles.css';
const fs = require('fs');
const { join, resolve } = require('path');
export const VERSION = 1;
export default class App {}
export { helper as util };
module.exports = App;
"#;
        let desc = extract(code, Language::JavaScript);

        let modules: Vec<_> = desc.imports.iter().map(|i| i.module.as_str()).collect();
        assert_eq!(modules, vec!["react", "path", "./styles.css", "fs", "path"]);
        assert_eq!(desc.imports[0].items, vec!["React", "useState", "effect"]);
        assert_eq!(desc.imports[1].items, vec!["path"]);
        assert_eq!(desc.imports[3].kind, ImportKind::CommonJs);
        assert_eq!(desc.imports[4].items, vec!["join", "resolve"]);

        let exports: Vec<_> = desc
            .exports
            .iter()
            .map(|e| (e.name.as_str(), e.kind))
            .collect();
        assert!(exports.contains(&("VERSION", ExportKind::Named)));
        assert!(exports.contains(&("App", ExportKind::Default)));
        assert!(exports.contains(&("util", ExportKind::Named)));
    }

    #[test]
    fn test_typescript_interfaces() {
        let code = r#"
export interface Shape extends Drawable, Sized {
  area: number;
  label?: string;
  draw(ctx: Context): void;
}
class Square implements Shape {}
class Circle implements Shape {}
"#;
        let desc = extract(code, Language::TypeScript);
        assert_eq!(desc.interfaces.len(), 1);
        let shape = &desc.interfaces[0];
        assert_eq!(shape.extends, vec!["Drawable", "Sized"]);
        let props: Vec<_> = shape
            .properties
            .iter()
            .map(|p| (p.name.as_str(), p.optional))
            .collect();
        assert_eq!(props, vec![("area", false), ("label", true)]);
        assert_eq!(desc.classes.len(), 2);

        // JavaScript files never report interfaces
        assert!(extract(code, Language::JavaScript).interfaces.is_empty());
    }

    #[test]
    fn test_error_and_async_stats() {
        let code = r#"
async function run() {
  try {
    await step();
  } catch (e) {
    throw new ValidationError("bad");
  }
  return new Promise(r => r()).then(done);
}
"#;
        let desc = extract(code, Language::JavaScript);
        let errors = desc.error_handling.unwrap();
        assert_eq!(errors.try_blocks, 1);
        assert_eq!(errors.catch_blocks, 1);
        assert_eq!(errors.throw_statements, 1);
        assert_eq!(errors.error_types, vec!["ValidationError"]);
        assert!(errors.has_error_handling);

        let asyncs = desc.async_patterns.unwrap();
        assert_eq!(asyncs.async_functions, 1);
        assert_eq!(asyncs.await_calls, 1);
        assert_eq!(asyncs.promises, 1);
        assert_eq!(asyncs.promise_chains, 1);
        assert!(asyncs.has_async_await);
    }

    #[test]
    fn test_deterministic() {
        let code = "class A extends B { x() {} }\nfunction f() {}\nimport a from 'a';";
        assert_eq!(
            extract(code, Language::JavaScript),
            extract(code, Language::JavaScript)
        );
    }

    #[test]
    fn test_rejects_other_languages() {
        assert!(JavaScriptExtractor.extract("", Language::Python).is_err());
    }
}
