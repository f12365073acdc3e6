//! Offset bookkeeping for splicing replacements into the original text.
//!
//! Parser spans are byte offsets reported relative to a virtual base; the
//! rewriter splices over the UTF-8 source. [`SourceSpans`] recovers the base
//! by locating the first real token in the text, then maps every span through
//! [`OffsetMapper`] so splice positions always land on character starts no
//! matter what multi-byte text precedes a handler.

use std::ops::Range;

use swc_core::common::Span;

/// Maps parser byte offsets to validated splice indices.
///
/// Precomputes the byte offset of every character start; `to_index` binary
/// searches that table, clamping to the endpoints and snapping backward to
/// the nearest character boundary.
#[derive(Debug)]
pub struct OffsetMapper {
    char_starts: Vec<usize>,
    len: usize,
}

impl OffsetMapper {
    pub fn new(text: &str) -> Self {
        Self {
            char_starts: text.char_indices().map(|(idx, _)| idx).collect(),
            len: text.len(),
        }
    }

    /// Splice index of the character starting at `byte`.
    pub fn to_index(&self, byte: usize) -> usize {
        if byte >= self.len {
            return self.len;
        }
        match self.char_starts.binary_search(&byte) {
            Ok(at) => self.char_starts[at],
            Err(0) => 0,
            Err(after) => self.char_starts[after - 1],
        }
    }
}

/// Byte offset of the first token in `text`, skipping a BOM, a shebang line,
/// whitespace, and `//` / `/* */` comments.
pub fn first_token_offset(text: &str) -> usize {
    let mut rest = text;
    let mut offset = 0usize;

    if let Some(stripped) = rest.strip_prefix('\u{feff}') {
        offset += rest.len() - stripped.len();
        rest = stripped;
    }
    if rest.starts_with("#!") {
        let line_end = rest.find('\n').map(|at| at + 1).unwrap_or(rest.len());
        offset += line_end;
        rest = &rest[line_end..];
    }

    loop {
        let trimmed = rest.trim_start();
        offset += rest.len() - trimmed.len();
        rest = trimmed;

        if let Some(after) = rest.strip_prefix("//") {
            let line_end = after.find('\n').map(|at| at + 1).unwrap_or(after.len());
            offset += 2 + line_end;
            rest = &after[line_end..];
        } else if let Some(after) = rest.strip_prefix("/*") {
            match after.find("*/") {
                Some(close) => {
                    offset += 2 + close + 2;
                    rest = &after[close + 2..];
                }
                // Unterminated comment: nothing after it can be a token.
                None => return text.len(),
            }
        } else {
            return offset;
        }
    }
}

/// Span-to-range translation for one source text.
pub struct SourceSpans {
    mapper: OffsetMapper,
    base: u32,
    len: usize,
}

impl SourceSpans {
    /// `module_start` is the parser-reported start of the module (its first
    /// token). The difference between it and the scanned first-token offset
    /// is the constant subtracted from every span.
    pub fn new(text: &str, module_start: u32) -> Self {
        let first_token = first_token_offset(text) as u32;
        Self {
            mapper: OffsetMapper::new(text),
            base: module_start.saturating_sub(first_token),
            len: text.len(),
        }
    }

    /// Splice range for a span, or `None` when the span is degenerate or
    /// predates the base offset (dummy spans do).
    pub fn range(&self, span: Span) -> Option<Range<usize>> {
        let lo = span.lo.0.checked_sub(self.base)? as usize;
        let hi = span.hi.0.checked_sub(self.base)? as usize;
        if lo >= hi {
            return None;
        }
        let start = self.mapper.to_index(lo);
        let end = self.mapper.to_index(hi.min(self.len));
        (start < end).then_some(start..end)
    }
}

/// Widens `start` by one when the previous character is `(` and the current
/// one is `)`, the zero-width shape one parser quirk produces for
/// paren-wrapped expressions.
pub fn widen_parens(text: &str, start: usize) -> usize {
    let bytes = text.as_bytes();
    if start > 0 && start < bytes.len() && bytes[start] == b')' && bytes[start - 1] == b'(' {
        start - 1
    } else {
        start
    }
}

/// Extends `end` over a terminating semicolon (and surrounding whitespace)
/// so a statement-form replacement does not leave a dangling `;` behind.
/// Leaves `end` untouched when no semicolon follows.
pub fn trim_statement_end(text: &str, end: usize) -> usize {
    let bytes = text.as_bytes();
    let mut probe = end;
    while probe < bytes.len() && bytes[probe].is_ascii_whitespace() {
        probe += 1;
    }
    if probe < bytes.len() && bytes[probe] == b';' {
        probe += 1;
        while probe < bytes.len() && bytes[probe].is_ascii_whitespace() {
            probe += 1;
        }
        return probe;
    }
    end
}

/// Extends `end` over an immediately following semicolon for verbatim
/// statement slices whose parser span stopped just before it.
pub fn include_trailing_semi(text: &str, end: usize) -> usize {
    let bytes = text.as_bytes();
    let mut probe = end;
    while probe < bytes.len() && (bytes[probe] == b' ' || bytes[probe] == b'\t') {
        probe += 1;
    }
    if probe < bytes.len() && bytes[probe] == b';' {
        probe + 1
    } else {
        end
    }
}
