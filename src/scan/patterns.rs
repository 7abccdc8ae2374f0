//! Pattern building blocks shared by the declaration scanners.

use regex::{Regex, RegexBuilder};

/// How deeply bracketed constructs may nest within a single pattern.
///
/// Regular expressions cannot count, so balanced brackets are unrolled to a
/// fixed depth. Anything nested deeper is simply not matched.
pub const BRACKET_DEPTH: usize = 16;

/// An identifier.
pub const NAME: &str = r"\b[A-Za-z_][A-Za-z0-9_]*\b";

/// A `{ ... }` block whose contents hold no unmasked braces.
pub const FLAT_BLOCK: &str = r"\{[^{}]*\}";

/// A balanced `open ... close` expression, nested up to [`BRACKET_DEPTH`].
pub fn bracket_expr(open: char, close: char) -> String {
    let open = regex::escape(&open.to_string());
    let close = regex::escape(&close.to_string());
    let other = format!("[^{open}{close}]");

    let mut pattern = String::new();
    for _ in 0..BRACKET_DEPTH {
        pattern.push_str(&format!("{open}(?:{other}|"));
    }
    pattern.push_str(&format!("{open}{other}*{close}"));
    for _ in 0..BRACKET_DEPTH {
        pattern.push_str(&format!(")*{close}"));
    }
    pattern
}

/// Compile one of the built-in patterns.
///
/// The unrolled bracket expressions make some declaration patterns large, so
/// the compiled-size limits are raised well above the defaults.
pub fn compile(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .size_limit(1 << 28)
        .dfa_size_limit(1 << 26)
        .build()
        .expect("built-in pattern must compile")
}

/// The leading identifier of `text`, if any.
pub fn first_word(text: &str) -> &str {
    let text = text.trim_start();
    let end = text
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
        .unwrap_or(text.len());
    &text[..end]
}

/// Strip string-literal quoting from a type annotation.
pub fn decode_type(text: &str) -> String {
    let text = text.trim();
    for quote in ["'''", "\"\"\"", "'", "\""] {
        if text.len() >= 2 * quote.len() && text.starts_with(quote) && text.ends_with(quote) {
            return text[quote.len()..text.len() - quote.len()].trim().to_string();
        }
    }
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bracket_expr_matches_nested() {
        let angle = compile(&format!("^{}$", bracket_expr('<', '>')));
        assert!(angle.is_match("<A>"));
        assert!(angle.is_match("<Map<K, List<V>>>"));
        assert!(!angle.is_match("<A"));
        assert!(!angle.is_match("<A>>"));

        let paren = compile(&format!("^{}$", bracket_expr('(', ')')));
        assert!(paren.is_match("(a, (b), ((c)))"));
    }

    #[test]
    fn test_bracket_expr_depth_bound() {
        let angle = compile(&format!("^{}$", bracket_expr('<', '>')));
        let within = format!("{}{}", "<".repeat(BRACKET_DEPTH + 1), ">".repeat(BRACKET_DEPTH + 1));
        let beyond = format!("{}{}", "<".repeat(BRACKET_DEPTH + 2), ">".repeat(BRACKET_DEPTH + 2));
        assert!(angle.is_match(&within));
        assert!(!angle.is_match(&beyond));
    }

    #[test]
    fn test_first_word() {
        assert_eq!(first_word("  return x"), "return");
        assert_eq!(first_word("List<String>"), "List");
        assert_eq!(first_word("non-sealed class"), "non-sealed");
    }

    #[test]
    fn test_decode_type() {
        assert_eq!(decode_type(" 'Node' "), "Node");
        assert_eq!(decode_type("\"\"\"List[int]\"\"\""), "List[int]");
        assert_eq!(decode_type("Optional[str]"), "Optional[str]");
        assert_eq!(decode_type("'"), "'");
    }
}
