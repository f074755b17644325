//! Text helpers shared by the extractors: line lookup, brace matching,
//! parameter splitting and the complexity counter.

use super::Parameter;
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

static BRANCH_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:if|else|for|while|switch|case|catch)\b").expect("Invalid branch regex")
});

/// Words that look like calls or declarations to the textual rules but never name a function
pub const CONTROL_KEYWORDS: &[&str] = &[
    "if", "else", "for", "while", "do", "switch", "case", "catch", "try", "return", "new",
    "delete", "throw", "sizeof", "typeof", "function", "with", "elif", "except", "match",
    "using", "goto", "await", "yield", "super", "this",
];

pub fn is_control_keyword(word: &str) -> bool {
    CONTROL_KEYWORDS.contains(&word)
}

/// Maps byte offsets to 1-based line numbers
pub struct LineIndex {
    newlines: Vec<usize>,
}

impl LineIndex {
    pub fn new(content: &str) -> Self {
        Self {
            newlines: content.match_indices('\n').map(|(i, _)| i).collect(),
        }
    }

    /// Line of the byte at `offset`: one more than the newlines before it
    pub fn line_at(&self, offset: usize) -> usize {
        self.newlines.partition_point(|&nl| nl < offset) + 1
    }
}

/// Range of the brace-balanced block whose `{` sits at `open`, braces included.
///
/// Unbalanced input runs to the end of the text.
pub fn balanced_block(content: &str, open: usize) -> Range<usize> {
    let bytes = content.as_bytes();
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return open..i + 1;
                }
            }
            _ => {}
        }
    }
    open..content.len()
}

/// Blank out everything nested deeper than the top level of `body`.
///
/// The `{`/`}` pair that opens and closes each nested block is kept, as are
/// newlines, so byte offsets and line numbers stay valid and member rules can
/// run against a class body without seeing statements inside method bodies.
pub fn mask_nested(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut depth = 0usize;
    for ch in body.chars() {
        match ch {
            '{' => {
                depth += 1;
                out.push(if depth == 1 { '{' } else { ' ' });
            }
            '}' => {
                out.push(if depth == 1 { '}' } else { ' ' });
                depth = depth.saturating_sub(1);
            }
            '\n' => out.push('\n'),
            _ if depth > 0 => out.extend(std::iter::repeat_n(' ', ch.len_utf8())),
            _ => out.push(ch),
        }
    }
    out
}

/// `1 + ` the number of branch keywords and `&&`, `||`, `?` operators in `body`
pub fn complexity(body: &str) -> u32 {
    let keywords = BRANCH_KEYWORDS.find_iter(body).count();
    1 + (keywords + count_operators(body)) as u32
}

fn count_operators(body: &str) -> usize {
    let bytes = body.as_bytes();
    let mut count = 0;
    let mut i = 0;
    while i < bytes.len() {
        match (bytes[i], bytes.get(i + 1).copied()) {
            (b'&', Some(b'&')) | (b'|', Some(b'|')) => {
                count += 1;
                i += 2;
                continue;
            }
            // `?.` and `??` are access and coalescing, not branches
            (b'?', Some(b'.')) | (b'?', Some(b'?')) => {
                i += 2;
                continue;
            }
            (b'?', _) => count += 1,
            _ => {}
        }
        i += 1;
    }
    count
}

/// Split a parameter list on commas that are not nested in brackets
pub fn split_top_level(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, ch) in list.char_indices() {
        match ch {
            '(' | '[' | '{' | '<' => depth += 1,
            ')' | ']' | '}' | '>' => depth -= 1,
            ',' if depth <= 0 => {
                parts.push(&list[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&list[start..]);
    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// `name: Type = default` parameters (JavaScript, TypeScript, Python)
pub fn parse_annotated_params(list: &str) -> Vec<Parameter> {
    split_top_level(list)
        .into_iter()
        .map(|param| {
            let (decl, default_value) = split_default(param);
            let (name, type_name) = match decl.split_once(':') {
                Some((name, ty)) => (name, non_empty(ty)),
                None => (decl, None),
            };
            Parameter {
                name: name.trim().trim_end_matches('?').to_string(),
                type_name,
                default_value,
            }
        })
        .collect()
}

/// `Type name = default` parameters (C, C++, Java)
pub fn parse_typed_params(list: &str) -> Vec<Parameter> {
    split_top_level(list)
        .into_iter()
        .filter(|p| *p != "void")
        .map(|param| {
            let (decl, default_value) = split_default(param);
            let decl = decl.trim();
            // Split after the last separator; it may be multi-byte whitespace
            let split_at = decl
                .char_indices()
                .rev()
                .find(|&(_, c)| c.is_whitespace() || c == '*' || c == '&')
                .map(|(i, c)| i + c.len_utf8());
            let (type_part, name) = match split_at {
                Some(i) => (&decl[..i], &decl[i..]),
                None => ("", decl),
            };
            Parameter {
                name: if name.is_empty() {
                    "unnamed".to_string()
                } else {
                    name.to_string()
                },
                type_name: non_empty(type_part),
                default_value,
            }
        })
        .collect()
}

fn split_default(param: &str) -> (&str, Option<String>) {
    match param.split_once('=') {
        Some((decl, default)) => (decl, non_empty(default)),
        None => (param, None),
    }
}

pub fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Split a comma list such as `A, B ,C` into trimmed names
pub fn comma_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_index() {
        let text = "a\nbb\n\nccc";
        let idx = LineIndex::new(text);
        assert_eq!(idx.line_at(0), 1);
        assert_eq!(idx.line_at(2), 2);
        assert_eq!(idx.line_at(5), 3);
        assert_eq!(idx.line_at(6), 4);
    }

    #[test]
    fn test_balanced_block() {
        let text = "fn x() { if a { b } else { c } } tail";
        let open = text.find('{').unwrap();
        let range = balanced_block(text, open);
        assert_eq!(&text[range], "{ if a { b } else { c } }");

        let unbalanced = "{ { ";
        assert_eq!(balanced_block(unbalanced, 0), 0..unbalanced.len());
    }

    #[test]
    fn test_mask_nested_keeps_offsets() {
        let body = " a() { if (x) { y(); } }\n b = 1;";
        let masked = mask_nested(body);
        assert_eq!(masked.len(), body.len());
        assert!(masked.starts_with(" a() {"));
        assert!(!masked.contains("if"));
        assert!(masked.contains("b = 1;"));
        assert_eq!(masked.matches('\n').count(), 1);
    }

    #[test]
    fn test_complexity_counts() {
        assert_eq!(complexity("{ return 1; }"), 1);
        // if, else, &&, ?
        assert_eq!(complexity("{ if (a && b) { x } else { y ? 1 : 2 } }"), 5);
        // optional chaining and nullish coalescing do not count
        assert_eq!(complexity("{ a?.b ?? c }"), 1);
        // identifiers containing keywords do not count
        assert_eq!(complexity("{ notify(); format(); }"), 1);
    }

    #[test]
    fn test_parse_annotated_params() {
        let params = parse_annotated_params("a, b: number, c: Map<string, number> = new Map()");
        assert_eq!(params.len(), 3);
        assert_eq!(params[0].name, "a");
        assert_eq!(params[1].type_name.as_deref(), Some("number"));
        assert_eq!(params[2].type_name.as_deref(), Some("Map<string, number>"));
        assert_eq!(params[2].default_value.as_deref(), Some("new Map()"));
        assert!(parse_annotated_params("  ").is_empty());
    }

    #[test]
    fn test_parse_typed_params() {
        let params = parse_typed_params("const char* name, int count = 3");
        assert_eq!(params[0].name, "name");
        assert_eq!(params[0].type_name.as_deref(), Some("const char*"));
        assert_eq!(params[1].name, "count");
        assert_eq!(params[1].default_value.as_deref(), Some("3"));
        assert!(parse_typed_params("void").is_empty());
    }

    #[test]
    fn test_parse_typed_params_unicode_whitespace() {
        let params = parse_typed_params("int\u{00A0}a, long\u{3000}b, char*\u{00A0}c");
        assert_eq!(params.len(), 3);
        assert_eq!(params[0].name, "a");
        assert_eq!(params[0].type_name.as_deref(), Some("int"));
        assert_eq!(params[1].name, "b");
        assert_eq!(params[1].type_name.as_deref(), Some("long"));
        assert_eq!(params[2].name, "c");
        assert_eq!(params[2].type_name.as_deref(), Some("char*"));
    }
}
