//! Parser for separator-delimited path expressions.
//!
//! Grammar, for an active separator `S`:
//!
//! ```text
//! path   := "" | token (S? index | S token)* S?
//! token  := name | index
//! name   := ([0-9a-zA-Z/_-] | "\" reserved)+
//! index  := "[" "-"? digit+ "]"
//! ```
//!
//! `reserved` is one of `. # | :`. Reserved characters other than the active
//! separator are rejected unless escaped, so a path never changes meaning when
//! a different separator is selected.

use super::path::{Path, PathElement};
use thiserror::Error;

/// Separator used when none is configured.
pub const DEFAULT_SEPARATOR: char = '.';

/// Characters that may act as a separator.
pub const RESERVED_SEPARATORS: [char; 4] = ['.', '#', '|', ':'];

/// PathError describes why a path expression could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("invalid separator {0:?}: expected one of '.', '#', '|', ':'")]
    InvalidSeparator(char),

    #[error("{key}: unexpected character {found:?} at offset {offset}")]
    UnexpectedChar {
        key: String,
        found: char,
        offset: usize,
    },

    #[error("{key}: empty segment at offset {offset}")]
    EmptySegment { key: String, offset: usize },

    #[error("{key}: malformed index at offset {offset}")]
    MalformedIndex { key: String, offset: usize },

    #[error("{key}: dangling escape at offset {offset}")]
    DanglingEscape { key: String, offset: usize },
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '/' | '_' | '-')
}

/// Returns true when `key` is a well-formed path for `separator`.
pub fn is_valid(key: &str, separator: char) -> bool {
    parse(key, separator).is_ok()
}

/// Tokenizes `key` into path elements.
///
/// Every reserved separator (`. # | :`) other than the active one must be
/// escaped with a backslash inside a field name, so a dotted key under `#`
/// is written `metadata#annotations#openshift\.io/host`. Keys that relied on
/// an unescaped `.` under another separator are rejected.
pub fn parse(key: &str, separator: char) -> Result<Path, PathError> {
    if !RESERVED_SEPARATORS.contains(&separator) {
        return Err(PathError::InvalidSeparator(separator));
    }

    let chars: Vec<char> = key.chars().collect();
    let mut elements = Vec::new();
    let mut expect_token = true;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '[' {
            let (index, next) = parse_index(key, &chars, i)?;
            elements.push(PathElement::Index(index));
            expect_token = false;
            i = next;
            continue;
        }

        if c == separator {
            if expect_token {
                return Err(PathError::EmptySegment {
                    key: key.to_string(),
                    offset: i,
                });
            }
            expect_token = true;
            i += 1;
            continue;
        }

        if is_name_char(c) || c == '\\' {
            if !expect_token {
                return Err(PathError::UnexpectedChar {
                    key: key.to_string(),
                    found: c,
                    offset: i,
                });
            }
            let (name, next) = parse_name(key, &chars, i)?;
            elements.push(PathElement::Field(name));
            expect_token = false;
            i = next;
            continue;
        }

        return Err(PathError::UnexpectedChar {
            key: key.to_string(),
            found: c,
            offset: i,
        });
    }

    Ok(Path::from_elements(elements))
}

fn parse_index(key: &str, chars: &[char], start: usize) -> Result<(i64, usize), PathError> {
    let malformed = || PathError::MalformedIndex {
        key: key.to_string(),
        offset: start,
    };

    let close = chars[start..]
        .iter()
        .position(|&c| c == ']')
        .map(|p| start + p)
        .ok_or_else(malformed)?;

    let digits: String = chars[start + 1..close].iter().collect();
    let unsigned = digits.strip_prefix('-').unwrap_or(&digits);
    if unsigned.is_empty() || !unsigned.chars().all(|c| c.is_ascii_digit()) {
        return Err(malformed());
    }

    let index = digits.parse::<i64>().map_err(|_| malformed())?;
    Ok((index, close + 1))
}

fn parse_name(key: &str, chars: &[char], start: usize) -> Result<(String, usize), PathError> {
    let mut name = String::new();
    let mut i = start;

    while i < chars.len() {
        let c = chars[i];
        if is_name_char(c) {
            name.push(c);
            i += 1;
        } else if c == '\\' {
            match chars.get(i + 1) {
                Some(&escaped) if RESERVED_SEPARATORS.contains(&escaped) => {
                    name.push(escaped);
                    i += 2;
                }
                _ => {
                    return Err(PathError::DanglingEscape {
                        key: key.to_string(),
                        offset: i,
                    })
                }
            }
        } else {
            break;
        }
    }

    Ok((name, i))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(names: &[&str]) -> Path {
        names.iter().map(|n| PathElement::field(*n)).collect()
    }

    #[test]
    fn test_empty_path_is_whole_document() {
        assert_eq!(parse("", '.').unwrap(), Path::new());
        assert!(is_valid("", '.'));
    }

    #[test]
    fn test_dotted_fields() {
        assert_eq!(
            parse("spec.tls.termination", '.').unwrap(),
            fields(&["spec", "tls", "termination"])
        );
    }

    #[test]
    fn test_indexes_inline_and_chained() {
        let path = parse("a.b[0][-1].c", '.').unwrap();
        assert_eq!(
            path,
            Path::from_elements(vec![
                PathElement::field("a"),
                PathElement::field("b"),
                PathElement::index(0),
                PathElement::index(-1),
                PathElement::field("c"),
            ])
        );
        assert_eq!(
            parse("[2].name", '.').unwrap(),
            Path::from_elements(vec![PathElement::index(2), PathElement::field("name")])
        );
        assert_eq!(parse("a.[1]", '.').unwrap(), parse("a[1]", '.').unwrap());
    }

    #[test]
    fn test_alternate_separator() {
        assert_eq!(parse("a#b#c", '#').unwrap(), fields(&["a", "b", "c"]));
        assert_eq!(parse("a|b", '|').unwrap(), fields(&["a", "b"]));
        assert_eq!(parse("a:b", ':').unwrap(), fields(&["a", "b"]));
    }

    #[test]
    fn test_other_reserved_characters_rejected() {
        assert!(!is_valid("a#b", '.'));
        assert!(!is_valid("a.b", '#'));
        assert!(!is_valid("a:b", '|'));
        assert!(!is_valid("a b", '.'));
    }

    #[test]
    fn test_escaped_reserved_characters() {
        assert_eq!(
            parse(r"metadata#annotations#openshift\.io/host", '#').unwrap(),
            fields(&["metadata", "annotations", "openshift.io/host"])
        );
        assert_eq!(parse(r"a\#b.c", '.').unwrap(), fields(&["a#b", "c"]));
        assert!(matches!(
            parse(r"a\x", '.'),
            Err(PathError::DanglingEscape { offset: 1, .. })
        ));
    }

    #[test]
    fn test_name_charset() {
        assert_eq!(
            parse("my-app/v1_x.9", '.').unwrap(),
            fields(&["my-app/v1_x", "9"])
        );
    }

    #[test]
    fn test_malformed_paths() {
        assert!(matches!(parse(".a", '.'), Err(PathError::EmptySegment { offset: 0, .. })));
        assert!(matches!(parse("a..b", '.'), Err(PathError::EmptySegment { offset: 2, .. })));
        assert!(matches!(parse("a[x]", '.'), Err(PathError::MalformedIndex { .. })));
        assert!(matches!(parse("a[1", '.'), Err(PathError::MalformedIndex { .. })));
        assert!(matches!(parse("a[-]", '.'), Err(PathError::MalformedIndex { .. })));
        assert!(matches!(parse("a[0]b", '.'), Err(PathError::UnexpectedChar { found: 'b', .. })));
    }

    #[test]
    fn test_trailing_separator_tolerated() {
        assert_eq!(parse("a.", '.').unwrap(), fields(&["a"]));
    }

    #[test]
    fn test_invalid_separator() {
        assert_eq!(parse("a/b", '/'), Err(PathError::InvalidSeparator('/')));
    }
}
