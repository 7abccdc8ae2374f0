//! Source text with a same-length "visible" overlay.
//!
//! Patterns are always matched against the visible copy. Once a region has
//! been consumed it is masked: every non-whitespace character is overwritten
//! with [`MASK_CHAR`], one per UTF-8 byte, so byte offsets never move. Text
//! recorded into definitions is always taken from the original at the
//! matched offsets.

use regex::{Captures, Regex};
use std::ops::Range;

/// Placeholder written over consumed text.
pub const MASK_CHAR: char = '\u{1a}';

/// A string plus a maskable overlay of identical byte length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskedText {
    original: String,
    visible: String,
}

impl MaskedText {
    pub fn new(text: impl Into<String>) -> Self {
        let original = text.into();
        let visible = original.clone();
        Self { original, visible }
    }

    /// The untouched source text.
    pub fn original(&self) -> &str {
        &self.original
    }

    /// The text as seen by pattern matching.
    pub fn visible(&self) -> &str {
        &self.visible
    }

    pub fn len(&self) -> usize {
        self.original.len()
    }

    pub fn is_empty(&self) -> bool {
        self.original.is_empty()
    }

    /// Mask every non-whitespace character in `start..end`.
    pub fn mask(&mut self, start: usize, end: usize) {
        self.fill(start..end, MASK_CHAR);
    }

    /// Overwrite every non-whitespace character in `start..end` with an ASCII
    /// `fill` character.
    pub fn mask_with(&mut self, start: usize, end: usize, fill: char) {
        debug_assert!(fill.is_ascii(), "mask fill must be a single byte");
        let fill = if fill.is_ascii() { fill } else { MASK_CHAR };
        self.fill(start..end, fill);
    }

    /// Mask every match of `pattern`. Returns whether anything matched.
    pub fn mask_all(&mut self, pattern: &Regex) -> bool {
        let ranges: Vec<Range<usize>> = pattern
            .find_iter(&self.visible)
            .map(|m| m.range())
            .filter(|r| !r.is_empty())
            .collect();
        for range in &ranges {
            self.fill(range.clone(), MASK_CHAR);
        }
        !ranges.is_empty()
    }

    /// Like [`mask_all`](Self::mask_all), with an ASCII fill character.
    pub fn mask_all_with(&mut self, pattern: &Regex, fill: char) -> bool {
        let ranges: Vec<Range<usize>> = pattern
            .find_iter(&self.visible)
            .map(|m| m.range())
            .filter(|r| !r.is_empty())
            .collect();
        for range in &ranges {
            self.mask_with(range.start, range.end, fill);
        }
        !ranges.is_empty()
    }

    /// Keep masking matches of `pattern` until none remain.
    ///
    /// Used for patterns that peel nested brackets one layer at a time.
    pub fn mask_repeatedly(&mut self, pattern: &Regex) {
        while self.mask_all(pattern) {
            // A pass that matched only already-masked text makes no progress.
            if !pattern
                .find_iter(&self.visible)
                .any(|m| self.has_unmasked(m.range()))
            {
                break;
            }
        }
    }

    /// Find the first match of `pattern` in the visible text.
    pub fn find<'t>(&'t self, pattern: &Regex) -> Option<MaskedMatch<'t>> {
        self.find_at(pattern, 0)
    }

    /// Find the first match of `pattern` starting at or after `pos`.
    pub fn find_at<'t>(&'t self, pattern: &Regex, pos: usize) -> Option<MaskedMatch<'t>> {
        if pos > self.visible.len() {
            return None;
        }
        pattern
            .captures_at(&self.visible, pos)
            .map(|captures| MaskedMatch {
                text: self,
                captures,
            })
    }

    /// All non-overlapping matches of `pattern`.
    pub fn find_all<'t>(&'t self, pattern: &Regex) -> Vec<MaskedMatch<'t>> {
        pattern
            .captures_iter(&self.visible)
            .map(|captures| MaskedMatch {
                text: self,
                captures,
            })
            .collect()
    }

    /// Original text of every match of `pattern`.
    pub fn find_all_original(&self, pattern: &Regex) -> Vec<&str> {
        pattern
            .find_iter(&self.visible)
            .map(|m| self.original_slice(m.range()))
            .collect()
    }

    /// A new masked text covering `range`, keeping the current masking.
    pub fn slice(&self, range: Range<usize>) -> MaskedText {
        let range = self.widen(range);
        MaskedText {
            original: self.original[range.clone()].to_string(),
            visible: self.visible[range].to_string(),
        }
    }

    /// Original text covering `range`.
    pub fn original_slice(&self, range: Range<usize>) -> &str {
        let range = self.widen(range);
        &self.original[range]
    }

    /// Whether `range` still contains visible, non-whitespace text.
    pub fn has_unmasked(&self, range: Range<usize>) -> bool {
        let range = self.widen(range);
        self.visible[range]
            .chars()
            .any(|c| c != MASK_CHAR && !c.is_whitespace())
    }

    /// Byte offset of the character following the one at `pos`.
    pub fn next_char(&self, pos: usize) -> usize {
        self.visible
            .get(pos..)
            .and_then(|rest| rest.chars().next())
            .map(|c| pos + c.len_utf8())
            .unwrap_or(pos + 1)
    }

    /// One-based line number of byte offset `pos`.
    pub fn line_of(&self, pos: usize) -> usize {
        let pos = pos.min(self.original.len());
        self.original.as_bytes()[..pos]
            .iter()
            .filter(|&&b| b == b'\n')
            .count()
            + 1
    }

    fn fill(&mut self, range: Range<usize>, fill: char) {
        let range = self.widen(range);
        if range.is_empty() {
            return;
        }
        let mut visible = String::with_capacity(self.visible.len());
        visible.push_str(&self.visible[..range.start]);
        for c in self.visible[range.clone()].chars() {
            if c.is_whitespace() {
                visible.push(c);
            } else {
                for _ in 0..c.len_utf8() {
                    visible.push(fill);
                }
            }
        }
        visible.push_str(&self.visible[range.end..]);
        self.visible = visible;
    }

    /// Clamp `range` outwards to character boundaries of the original.
    ///
    /// Every boundary of the original is also a boundary of the visible text,
    /// since masking only ever replaces characters with single-byte ones.
    fn widen(&self, range: Range<usize>) -> Range<usize> {
        let len = self.original.len();
        let mut start = range.start.min(len);
        let mut end = range.end.clamp(start, len);
        while !self.original.is_char_boundary(start) {
            start -= 1;
        }
        while !self.original.is_char_boundary(end) {
            end += 1;
        }
        start..end
    }
}

/// A pattern match against the visible text of a [`MaskedText`].
#[derive(Debug)]
pub struct MaskedMatch<'t> {
    text: &'t MaskedText,
    captures: Captures<'t>,
}

impl<'t> MaskedMatch<'t> {
    pub fn start(&self) -> usize {
        self.range().start
    }

    pub fn end(&self) -> usize {
        self.range().end
    }

    pub fn range(&self) -> Range<usize> {
        self.captures
            .get(0)
            .map(|m| m.range())
            .unwrap_or(0..0)
    }

    /// Original text of the whole match.
    pub fn original(&self) -> &'t str {
        self.text.original_slice(self.range())
    }

    /// Visible (masked) text of the whole match.
    pub fn masked(&self) -> &'t str {
        let range = self.text.widen(self.range());
        &self.text.visible[range]
    }

    pub fn has_group(&self, name: &str) -> bool {
        self.captures.name(name).is_some()
    }

    pub fn group_range(&self, name: &str) -> Option<Range<usize>> {
        self.captures.name(name).map(|m| m.range())
    }

    /// Original text of a named group.
    pub fn original_group(&self, name: &str) -> Option<&'t str> {
        self.group_range(name)
            .map(|range| self.text.original_slice(range))
    }

    /// Visible text of a named group.
    pub fn masked_group(&self, name: &str) -> Option<&'t str> {
        self.captures.name(name).map(|m| m.as_str())
    }

    /// A named group as a new masked text, for matching sub-patterns inside it.
    pub fn masked_group_text(&self, name: &str) -> Option<MaskedText> {
        self.group_range(name).map(|range| self.text.slice(range))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_preserves_length_and_whitespace() {
        let mut text = MaskedText::new("ab cd\nef");
        text.mask(1, 7);
        assert_eq!(text.len(), text.visible().len());
        assert_eq!(text.visible(), "a\u{1a} \u{1a}\u{1a}\n\u{1a}f");
        assert_eq!(text.original(), "ab cd\nef");
    }

    #[test]
    fn test_mask_multibyte_keeps_offsets() {
        let mut text = MaskedText::new("x = \"héllo\"; y");
        let end = text.original().find(';').unwrap();
        text.mask(4, end);
        assert_eq!(text.visible().len(), text.original().len());
        assert_eq!(text.visible().find(';'), Some(end));
        assert_eq!(text.original_slice(4..end), "\"héllo\"");
    }

    #[test]
    fn test_masked_text_is_not_rematched() {
        let pattern = Regex::new(r"\bfoo\b").unwrap();
        let mut text = MaskedText::new("foo bar foo");
        assert!(text.mask_all(&pattern));
        assert!(text.find(&pattern).is_none());
        assert!(!text.mask_all(&pattern));
    }

    #[test]
    fn test_groups_come_from_original() {
        let string = Regex::new(r#""[^"]*""#).unwrap();
        let call = Regex::new(r"(?P<name>\w+)\((?P<args>[^)]*)\)").unwrap();
        let mut text = MaskedText::new(r#"call("a,b")"#);
        text.mask_all(&string);

        let m = text.find(&call).unwrap();
        assert_eq!(m.original_group("name"), Some("call"));
        assert_eq!(m.original_group("args"), Some("\"a,b\""));
        assert!(!m.masked_group("args").unwrap().contains(','));
    }

    #[test]
    fn test_mask_repeatedly_peels_layers() {
        let parens = Regex::new(r"\([^()]*\)").unwrap();
        let mut text = MaskedText::new("f(a, (b, c)), d");
        text.mask_repeatedly(&parens);
        assert_eq!(text.visible().matches(',').count(), 1);
    }

    #[test]
    fn test_slice_and_line_numbers() {
        let text = MaskedText::new("one\ntwo\nthree");
        let sub = text.slice(4..7);
        assert_eq!(sub.original(), "two");
        assert_eq!(text.line_of(0), 1);
        assert_eq!(text.line_of(9), 3);
    }
}
