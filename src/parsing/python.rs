//! Python rule set
//!
//! Python has no braces, so a class's members are the `def`s and assignments
//! sitting at the first indentation level of the class's block.

use regex::Regex;
use std::ops::Range;
use std::sync::{Arc, LazyLock};

use super::registry::{ExtractError, ExtractResult, ExtractorRegistry, StructureExtractor};
use super::text::{LineIndex, comma_list, complexity, non_empty, parse_annotated_params};
use super::{
    ClassInfo, FunctionInfo, ImportInfo, ImportKind, Language, MethodInfo, PropertyInfo,
    StructuralDescription, Visibility,
};

static CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^([ \t]*)class\s+(\w+)(?:\s*\(([^)]*)\))?\s*:").expect("Invalid class regex")
});

static DEF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^([ \t]*)(async\s+)?def\s+(\w+)\s*\(([^)]*)\)(?:\s*->\s*([^:]+?))?\s*:")
        .expect("Invalid def regex")
});

static ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^([ \t]+)(\w+)[ \t]*(?::[ \t]*([^=\n]+?))?[ \t]*=[ \t]*([^=\n][^\n]*)$")
        .expect("Invalid assignment regex")
});

static IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:from[ \t]+([\w.]+)[ \t]+)?import[ \t]+(?:\(([^)]*)\)|([\w, \t*.]+))",
    )
    .expect("Invalid import regex")
});

/// Python spellings of else-if, catch, `&&` and `||`
static PY_BRANCHES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:elif|except|and|or)\b").expect("Invalid python branch regex")
});

pub struct PythonExtractor;

impl StructureExtractor for PythonExtractor {
    fn name(&self) -> &'static str {
        "python"
    }

    fn languages(&self) -> &'static [Language] {
        &[Language::Python]
    }

    fn extract(&self, content: &str, language: Language) -> ExtractResult<StructuralDescription> {
        if language != Language::Python {
            return Err(ExtractError::WrongLanguage {
                extractor: self.name(),
                requested: language,
            });
        }

        let lines = LineIndex::new(content);
        let mut desc = StructuralDescription::new(language);

        let mut blocks: Vec<ClassBlock> = Vec::new();
        for caps in CLASS.captures_iter(content) {
            let (Some(whole), Some(indent), Some(name)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            let indent = indent.as_str().len();
            let range = whole.start()..block_end(content, whole.end(), indent);
            let member_indent = member_indent(content, whole.end(), indent);

            let mut class = ClassInfo::new(name.as_str(), lines.line_at(indent_end(&whole)));
            let bases: Vec<String> = caps
                .get(3)
                .map(|m| comma_list(m.as_str()))
                .unwrap_or_default()
                .into_iter()
                .filter(|b| !b.contains('='))
                .collect();
            let mut bases = bases.into_iter();
            class.superclass = bases.next();
            class.additional_bases = bases.collect();
            class.decorators = decorators_before(content, whole.start());

            desc.classes.push(class);
            blocks.push(ClassBlock {
                range,
                member_indent,
            });
        }

        for caps in DEF.captures_iter(content) {
            let (Some(whole), Some(indent), Some(name)) = (caps.get(0), caps.get(1), caps.get(3))
            else {
                continue;
            };
            let indent = indent.as_str().len();
            let body_end = block_end(content, whole.end(), indent);
            let body = &content[whole.end()..body_end];
            let decorators = decorators_before(content, whole.start());
            let parameters = parse_annotated_params(caps.get(4).map_or("", |m| m.as_str()));
            let return_type = caps.get(5).and_then(|m| non_empty(m.as_str()));
            let is_async = caps.get(2).is_some();
            let line = lines.line_at(indent_end(&whole));
            let body_complexity = complexity(body) + PY_BRANCHES.find_iter(body).count() as u32;

            match owning_class(&blocks, whole.start(), indent) {
                Some(index) => {
                    let is_static = decorators
                        .iter()
                        .any(|d| d == "staticmethod" || d == "classmethod");
                    desc.classes[index].methods.push(MethodInfo {
                        name: name.as_str().to_string(),
                        line,
                        visibility: python_visibility(name.as_str()),
                        is_static,
                        is_async,
                        parameters,
                        return_type,
                        complexity: body_complexity,
                        decorators,
                    });
                }
                None => desc.functions.push(FunctionInfo {
                    name: name.as_str().to_string(),
                    line,
                    parameters,
                    return_type,
                    is_async,
                    is_exported: !name.as_str().starts_with('_'),
                    complexity: body_complexity,
                    decorators,
                }),
            }
        }

        for caps in ASSIGNMENT.captures_iter(content) {
            let (Some(whole), Some(indent), Some(name)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            let Some(index) = owning_class(&blocks, whole.start(), indent.as_str().len()) else {
                continue;
            };
            desc.classes[index].properties.push(PropertyInfo {
                name: name.as_str().to_string(),
                line: lines.line_at(name.start()),
                visibility: python_visibility(name.as_str()),
                // class-level attributes are shared by every instance
                is_static: true,
                type_name: caps.get(3).and_then(|m| non_empty(m.as_str())),
                default_value: caps.get(4).and_then(|m| non_empty(m.as_str())),
                optional: false,
            });
        }

        desc.imports = extract_imports(content, &lines);
        Ok(desc)
    }
}

pub(crate) fn register(registry: &mut ExtractorRegistry) {
    registry.register(Arc::new(PythonExtractor));
}

struct ClassBlock {
    range: Range<usize>,
    member_indent: Option<usize>,
}

/// Innermost class whose first indentation level holds a statement at `offset`
fn owning_class(blocks: &[ClassBlock], offset: usize, indent: usize) -> Option<usize> {
    blocks
        .iter()
        .enumerate()
        .filter(|(_, b)| b.range.contains(&offset) && b.member_indent == Some(indent))
        .max_by_key(|(_, b)| b.range.start)
        .map(|(i, _)| i)
}

/// Offset of the keyword after the leading indentation of a `(?m)^` match
fn indent_end(whole: &regex::Match<'_>) -> usize {
    let text = whole.as_str();
    whole.start() + (text.len() - text.trim_start().len())
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches([' ', '\t']).len()
}

fn is_code_line(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && !trimmed.starts_with('#')
}

/// Lines after the header line, with their starting offsets
fn lines_after(content: &str, header_end: usize) -> impl Iterator<Item = (usize, &str)> {
    let start = content[header_end..]
        .find('\n')
        .map_or(content.len(), |i| header_end + i + 1);
    content[start..]
        .split_inclusive('\n')
        .scan(start, |offset, line| {
            let at = *offset;
            *offset += line.len();
            Some((at, line))
        })
}

/// End of the indented block opened by a header ending at `header_end`
fn block_end(content: &str, header_end: usize, indent: usize) -> usize {
    lines_after(content, header_end)
        .find(|(_, line)| is_code_line(line) && indent_of(line) <= indent)
        .map_or(content.len(), |(offset, _)| offset)
}

/// Indentation of the first statement inside the block, if the block has one
fn member_indent(content: &str, header_end: usize, indent: usize) -> Option<usize> {
    lines_after(content, header_end)
        .find(|(_, line)| is_code_line(line))
        .map(|(_, line)| indent_of(line))
        .filter(|&member| member > indent)
}

/// Decorator lines directly above `start`, skipping blank lines and comments
fn decorators_before(content: &str, start: usize) -> Vec<String> {
    let mut decorators = Vec::new();
    for line in content[..start].lines().rev() {
        let trimmed = line.trim();
        if let Some(decorator) = trimmed.strip_prefix('@') {
            decorators.push(decorator.to_string());
        } else if !trimmed.is_empty() && !trimmed.starts_with('#') {
            break;
        }
    }
    decorators.reverse();
    decorators
}

/// `__name` is private, `_name` protected; dunder names are public
fn python_visibility(name: &str) -> Visibility {
    if name.starts_with("__") && !name.ends_with("__") {
        Visibility::Private
    } else if name.starts_with('_') && !name.starts_with("__") {
        Visibility::Protected
    } else {
        Visibility::Public
    }
}

fn extract_imports(content: &str, lines: &LineIndex) -> Vec<ImportInfo> {
    let mut imports = Vec::new();

    for caps in IMPORT.captures_iter(content) {
        let Some(whole) = caps.get(0) else { continue };
        let line = lines.line_at(indent_end(&whole));
        let names: Vec<String> = caps
            .get(2)
            .or_else(|| caps.get(3))
            .map(|m| comma_list(&m.as_str().replace('\n', " ")))
            .unwrap_or_default()
            .into_iter()
            .map(|item| match item.split_once(" as ") {
                Some((_, alias)) => alias.trim().to_string(),
                None => item,
            })
            .collect();

        match caps.get(1) {
            Some(module) => imports.push(ImportInfo {
                module: module.as_str().to_string(),
                items: names,
                kind: ImportKind::Python,
                line,
            }),
            // `import a, b.c` names modules directly
            None => {
                let modules = caps
                    .get(3)
                    .map(|m| comma_list(m.as_str()))
                    .unwrap_or_default();
                for module in modules {
                    let module = module
                        .split_once(" as ")
                        .map_or(module.as_str(), |(m, _)| m.trim())
                        .to_string();
                    imports.push(ImportInfo {
                        module,
                        items: Vec::new(),
                        kind: ImportKind::Python,
                        line,
                    });
                }
            }
        }
    }

    imports
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(code: &str) -> StructuralDescription {
        PythonExtractor.extract(code, Language::Python).unwrap()
    }

    const SAMPLE: &str = r#"import os, sys as system
from typing import List, Optional as Opt
from .models import (
    User,
    Account,
)

@dataclass
@register("svc")
class Service(Base, Mixin, metaclass=ABCMeta):
    __instance = None
    retries: int = 3

    @staticmethod
    def get_instance():
        if Service.__instance is None:
            Service.__instance = Service()
        return Service.__instance

    async def fetch(self, url: str, timeout: float = 1.0) -> bytes:
        for attempt in range(3):
            try:
                return await get(url)
            except Exception:
                pass

    def _helper(self):
        return 1


def main(argv) -> int:
    if argv and len(argv) > 1:
        return 1
    elif not argv:
        return 2
    return 0
"#;

    #[test]
    fn test_class_bases_and_decorators() {
        let desc = extract(SAMPLE);
        assert_eq!(desc.classes.len(), 1);

        let class = &desc.classes[0];
        assert_eq!(class.name, "Service");
        assert_eq!(class.line, 10);
        assert_eq!(class.superclass.as_deref(), Some("Base"));
        assert_eq!(class.additional_bases, vec!["Mixin"]);
        assert_eq!(class.decorators, vec!["dataclass", "register(\"svc\")"]);
    }

    #[test]
    fn test_methods_stay_inside_class_block() {
        let desc = extract(SAMPLE);
        let class = &desc.classes[0];

        let names: Vec<_> = class.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["get_instance", "fetch", "_helper"]);

        let get_instance = &class.methods[0];
        assert!(get_instance.is_static);
        assert_eq!(get_instance.decorators, vec!["staticmethod"]);
        assert_eq!(get_instance.complexity, 2);

        let fetch = &class.methods[1];
        assert!(fetch.is_async);
        assert_eq!(fetch.return_type.as_deref(), Some("bytes"));
        assert_eq!(fetch.parameters.len(), 3);
        assert_eq!(fetch.parameters[2].default_value.as_deref(), Some("1.0"));
        // for, except
        assert_eq!(fetch.complexity, 3);

        assert_eq!(class.methods[2].visibility, Visibility::Protected);

        let functions: Vec<_> = desc.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(functions, vec!["main"]);
        // if, and, elif
        assert_eq!(desc.functions[0].complexity, 4);
    }

    #[test]
    fn test_class_attributes() {
        let desc = extract(SAMPLE);
        let props = &desc.classes[0].properties;

        let instance = props.iter().find(|p| p.name == "__instance").unwrap();
        assert_eq!(instance.visibility, Visibility::Private);
        assert!(instance.is_static);
        assert_eq!(instance.default_value.as_deref(), Some("None"));

        let retries = props.iter().find(|p| p.name == "retries").unwrap();
        assert_eq!(retries.type_name.as_deref(), Some("int"));
        // assignments inside method bodies are not class attributes
        assert!(!props.iter().any(|p| p.name.contains("instance") && p.line > 12));
    }

    #[test]
    fn test_imports() {
        let desc = extract(SAMPLE);
        let summary: Vec<_> = desc
            .imports
            .iter()
            .map(|i| (i.module.as_str(), i.items.clone()))
            .collect();

        assert_eq!(summary[0], ("os", vec![]));
        assert_eq!(summary[1], ("sys", vec![]));
        assert_eq!(
            summary[2],
            ("typing", vec!["List".to_string(), "Opt".to_string()])
        );
        assert_eq!(
            summary[3],
            (".models", vec!["User".to_string(), "Account".to_string()])
        );
        assert_eq!(desc.imports[3].line, 3);
    }

    #[test]
    fn test_module_without_classes() {
        let desc = extract("def solo():\n    return 1\n");
        assert!(desc.classes.is_empty());
        assert_eq!(desc.functions.len(), 1);
        assert!(desc.functions[0].is_exported);
    }
}
