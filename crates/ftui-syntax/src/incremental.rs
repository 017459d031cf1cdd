#![forbid(unsafe_code)]

//! Per-line token cache with incremental re-tokenization.
//!
//! This is the consumer side of the continuation contract: the last token
//! type of line `n` is the initial type of line `n + 1`, and the tokenizer's
//! delegate state after line `n` is restored before line `n + 1` is
//! re-analyzed.

use std::ops::Range;

use crate::maker::{DelegateState, TokenMaker};
use crate::segment::Segment;
use crate::token::{Token, TokenKind, TokenList};

/// Per-line tokenization result with the ending state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenLine {
    /// Tokens with absolute document offsets.
    pub tokens: Vec<Token>,
    /// Continuation state the next line starts in.
    pub state_after: TokenKind,
    /// Tokenizer delegate state after this line.
    pub delegate_after: Option<DelegateState>,
    /// Absolute offset of the line's first byte.
    pub start_offset: usize,
}

impl TokenLine {
    fn capture(list: &TokenList, start_offset: usize) -> Self {
        Self {
            tokens: list.tokens().to_vec(),
            state_after: list.last_token_type(),
            delegate_after: None,
            start_offset,
        }
    }

    /// Equal up to the line's position in the document.
    fn same_shape(&self, other: &Self) -> bool {
        self.state_after == other.state_after
            && self.delegate_after == other.delegate_after
            && self.tokens.len() == other.tokens.len()
            && self.tokens.iter().zip(&other.tokens).all(|(a, b)| {
                a.kind == b.kind
                    && a.meta == b.meta
                    && a.range.start.wrapping_sub(self.start_offset)
                        == b.range.start.wrapping_sub(other.start_offset)
                    && a.range.end.wrapping_sub(self.start_offset)
                        == b.range.end.wrapping_sub(other.start_offset)
            })
    }

    fn rebase(&mut self, start_offset: usize) {
        if start_offset == self.start_offset {
            return;
        }
        for token in &mut self.tokens {
            token.range.start = token.range.start.wrapping_sub(self.start_offset) + start_offset;
            token.range.end = token.range.end.wrapping_sub(self.start_offset) + start_offset;
        }
        self.start_offset = start_offset;
    }
}

/// Cached tokenization for a multi-line text buffer.
///
/// Remembers the byte width of each line ending so cached offsets stay
/// aligned with the document across incremental updates.
#[derive(Debug, Clone, Default)]
pub struct TokenizedText {
    lines: Vec<TokenLine>,
    endings: Vec<usize>,
}

fn line_starts(lines: &[&str], endings: &[usize]) -> Vec<usize> {
    let mut starts = Vec::with_capacity(lines.len());
    let mut offset = 0usize;
    for (idx, line) in lines.iter().enumerate() {
        starts.push(offset);
        offset += line.len() + endings.get(idx).copied().unwrap_or(1);
    }
    starts
}

impl TokenizedText {
    /// Tokenize an entire buffer from scratch.
    ///
    /// Offsets are absolute positions in `text`: LF, CRLF and bare CR line
    /// endings are measured as they appear.
    pub fn from_text(maker: &mut dyn TokenMaker, text: &str) -> Self {
        let segments = Segment::lines(text);
        let lines: Vec<&str> = segments.iter().map(Segment::as_str).collect();
        let endings: Vec<usize> = segments
            .iter()
            .enumerate()
            .map(|(idx, seg)| {
                let next = segments
                    .get(idx + 1)
                    .map_or(text.len(), |n| n.buffer_range().start);
                next - seg.buffer_range().end
            })
            .collect();
        Self::build(maker, &lines, endings)
    }

    /// Tokenize an explicit slice of lines (preserves empty lines).
    ///
    /// Each line ending counts as one byte (`\n`) for offset purposes.
    /// Starts in the `Null` state with no delegate state.
    pub fn from_lines(maker: &mut dyn TokenMaker, lines: &[&str]) -> Self {
        Self::build(maker, lines, vec![1; lines.len()])
    }

    fn build(maker: &mut dyn TokenMaker, lines: &[&str], endings: Vec<usize>) -> Self {
        let starts = line_starts(lines, &endings);
        let mut state = TokenKind::Null;
        maker.set_delegate_state(None);
        let mut out = Vec::with_capacity(lines.len());
        for (line, &start) in lines.iter().zip(&starts) {
            let list = maker.analyze(Segment::whole(line), state, start);
            state = list.last_token_type();
            let mut captured = TokenLine::capture(list, start);
            captured.delegate_after = maker.delegate_state().cloned();
            out.push(captured);
        }
        Self {
            lines: out,
            endings,
        }
    }

    /// Access tokenized lines.
    pub fn lines(&self) -> &[TokenLine] {
        &self.lines
    }

    /// Return tokens on a line that overlap the given document range.
    pub fn tokens_in_range(&self, line_index: usize, range: Range<usize>) -> Vec<&Token> {
        let Some(line) = self.lines.get(line_index) else {
            return Vec::new();
        };
        line.tokens
            .iter()
            .filter(|token| token.range.start < range.end && token.range.end > range.start)
            .collect()
    }

    /// Incrementally re-tokenize starting at a single line edit.
    ///
    /// This re-tokenizes the edited line and continues until a line's tokens
    /// and end state match the cached ones (no further impact). Lines after
    /// that point are only shifted to their new offsets, keeping the line
    /// ending widths recorded at build time. If line counts change, it falls
    /// back to full re-tokenization with one-byte line endings.
    pub fn update_line(&mut self, maker: &mut dyn TokenMaker, lines: &[&str], line_index: usize) {
        if line_index >= lines.len() {
            return;
        }

        if self.lines.len() != lines.len() {
            *self = Self::from_lines(maker, lines);
            return;
        }

        let starts = line_starts(lines, &self.endings);
        let (mut state, delegate) = match line_index.checked_sub(1) {
            Some(prev) => (
                self.lines[prev].state_after,
                self.lines[prev].delegate_after.clone(),
            ),
            None => (TokenKind::Null, None),
        };
        maker.set_delegate_state(delegate);

        let mut idx = line_index;
        while idx < lines.len() {
            let list = maker.analyze(Segment::whole(lines[idx]), state, starts[idx]);
            state = list.last_token_type();
            let mut line = TokenLine::capture(list, starts[idx]);
            line.delegate_after = maker.delegate_state().cloned();

            let unchanged = self.lines[idx].same_shape(&line);
            self.lines[idx] = line;
            idx += 1;

            if unchanged {
                break;
            }
        }

        for (line, &start) in self.lines[idx..].iter_mut().zip(&starts[idx..]) {
            line.rebase(start);
        }
    }
}
