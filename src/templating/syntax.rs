//! Source preprocessing before templates reach Tera.
//!
//! Tera only understands `{{ }}` for expressions. Sources written with other
//! delimiters are rewritten so that `[[ title ]]` becomes `{{ title }}`. Literal
//! `{{` sequences in such sources would otherwise turn into expressions, so they
//! are replaced by an expression printing the two braces. Statement and comment
//! tags (`{% %}`, `{# #}`) are left alone.
//!
//! The module also finds the names a template pulls in through `include`,
//! `extends` and `import`, so the compiler can load them from the store.

use std::borrow::Cow;

use regex::Regex;

use crate::config::{DEFAULT_LEFT_DELIMITER, DEFAULT_RIGHT_DELIMITER, Delimiters};

/// Expression printing a literal `{{`.
const ESCAPED_OPEN: &str = r#"{{ "{{" }}"#;

/// Opening of an `include`, `extends` or `import` tag and its name argument.
const REFERENCE_TAG: &str =
    r#"\{%-?\s*(?:include|extends|import)\s+(\[[^\]]*\]|"[^"]*"|'[^']*'|`[^`]*`)"#;

/// One Tera string literal in any of its three quote styles.
const QUOTED: &str = r#""([^"]*)"|'([^']*)'|`([^`]*)`"#;

/// A custom expression delimiter was opened and never closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnclosedDelimiter {
    /// Byte offset of the opening delimiter
    pub offset: usize,
    pub line: usize,
}

impl std::fmt::Display for UnclosedDelimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unclosed expression delimiter on line {}", self.line)
    }
}

/// Rewrite `source` from `delimiters` to Tera's native delimiters.
pub fn translate<'a>(
    source: &'a str,
    delimiters: &Delimiters,
) -> Result<Cow<'a, str>, UnclosedDelimiter> {
    if delimiters.is_native() {
        return Ok(Cow::Borrowed(source));
    }

    let (left, right) = (delimiters.left.as_str(), delimiters.right.as_str());
    let mut out = String::with_capacity(source.len() + source.len() / 8);
    let mut pos = 0;

    while pos < source.len() {
        let rest = &source[pos..];
        if rest.starts_with(left) {
            let inner_start = pos + left.len();
            let Some(inner_len) = source[inner_start..].find(right) else {
                return Err(UnclosedDelimiter {
                    offset: pos,
                    line: source[..pos].matches('\n').count() + 1,
                });
            };
            out.push_str(DEFAULT_LEFT_DELIMITER);
            out.push_str(&source[inner_start..inner_start + inner_len]);
            out.push_str(DEFAULT_RIGHT_DELIMITER);
            pos = inner_start + inner_len + right.len();
        } else if rest.starts_with(DEFAULT_LEFT_DELIMITER) {
            out.push_str(ESCAPED_OPEN);
            pos += DEFAULT_LEFT_DELIMITER.len();
        } else if let Some(ch) = rest.chars().next() {
            out.push(ch);
            pos += ch.len_utf8();
        }
    }

    Ok(Cow::Owned(out))
}

/// Template names referenced by `include`, `extends` and `import` tags, in order.
pub fn references(source: &str) -> Vec<String> {
    let mut names = Vec::new();
    let (Ok(tag_re), Ok(quoted_re)) = (Regex::new(REFERENCE_TAG), Regex::new(QUOTED)) else {
        return names;
    };

    for tag in tag_re.captures_iter(source) {
        for quoted in quoted_re.captures_iter(&tag[1]) {
            if let Some(name) = quoted.iter().skip(1).flatten().next() {
                let name = name.as_str().to_string();
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
    }
    names
}
