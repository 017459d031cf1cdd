#![forbid(unsafe_code)]

//! The tokenizer interface handed out by the registry.

use crate::segment::Segment;
use crate::token::{Token, TokenKind, TokenList};

// ---------------------------------------------------------------------------
// Delegate state
// ---------------------------------------------------------------------------

/// Cross-line lexical context a tokenizer keeps for itself.
///
/// Owned by the tokenizer instance; a tokenizing callback borrows it for the
/// duration of one analysis call and may replace it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DelegateState {
    /// Inside an embedded sub-language (e.g. a `<script>` block in HTML).
    Embedded {
        /// Language index of the embedded grammar.
        language_index: u32,
        /// Nesting depth within the embedded grammar.
        depth: u16,
    },
    /// Waiting for a closing delimiter (heredoc tag, raw string fence).
    Delimited(Box<str>),
    /// Plain nesting depth (nested block comments).
    Nesting(u16),
}

// ---------------------------------------------------------------------------
// TokenMaker trait
// ---------------------------------------------------------------------------

/// A per-line tokenizer.
///
/// Implementors turn one segment plus the continuation state of the previous
/// line into a [`TokenList`]. The list is owned by the tokenizer and is
/// rebuilt on every call; read it before analyzing the next segment.
///
/// Instances are not shared: `analyze` takes `&mut self`, so at most one
/// analysis is in flight per instance.
pub trait TokenMaker: Send {
    /// Human-readable name (e.g., "Plain", "Dispatch").
    fn name(&self) -> &'static str;

    /// Which sub-language this instance represents, for picking styles.
    fn language_index(&self) -> u32 {
        0
    }

    /// Tokenize one segment.
    ///
    /// `initial` is the last token type of the previous line; `start_offset`
    /// is the absolute document offset of the segment's first byte. Token
    /// ranges in the result are absolute document offsets.
    fn analyze(
        &mut self,
        segment: Segment<'_>,
        initial: TokenKind,
        start_offset: usize,
    ) -> &TokenList;

    /// Cross-line state, if this tokenizer keeps any.
    fn delegate_state(&self) -> Option<&DelegateState> {
        None
    }

    /// Replace the cross-line state. Tokenizers without state ignore it.
    fn set_delegate_state(&mut self, state: Option<DelegateState>) {
        let _ = state;
    }

    /// Tokenize a full text buffer.
    ///
    /// Starts in the `Null` state with no delegate state, threads each line's
    /// last token type into the next line, and collects the tokens. Offsets
    /// follow the real LF, CRLF or bare CR line endings of `text`.
    fn tokenize(&mut self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut state = TokenKind::Null;
        self.set_delegate_state(None);

        for line in Segment::lines(text) {
            let start = line.buffer_range().start;
            let list = self.analyze(line, state, start);
            tokens.extend(list.iter().cloned());
            state = list.last_token_type();
        }

        tokens
    }
}

// ---------------------------------------------------------------------------
// PlainTokenizer (trivial fallback)
// ---------------------------------------------------------------------------

/// Tokenizer that treats each line as a single `Text` token.
///
/// Used when no tokenizer is registered for a key, so the editor shows
/// unhighlighted text. Every line ends in the `Null` state.
#[derive(Debug, Clone, Default)]
pub struct PlainTokenizer {
    tokens: TokenList,
}

impl PlainTokenizer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenMaker for PlainTokenizer {
    fn name(&self) -> &'static str {
        "Plain"
    }

    fn analyze(
        &mut self,
        segment: Segment<'_>,
        _initial: TokenKind,
        start_offset: usize,
    ) -> &TokenList {
        let end = start_offset + segment.len();
        self.tokens.clear(start_offset);
        if !segment.is_empty() {
            self.tokens
                .push(Token::new(TokenKind::Text, start_offset..end));
        }
        self.tokens.finish_with(end, TokenKind::Null);
        &self.tokens
    }
}
