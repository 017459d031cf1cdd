#![forbid(unsafe_code)]

//! Token model shared by every tokenizer.
//!
//! A [`TokenList`] is the output of one per-line analysis call: the emitted
//! tokens in source order followed by a zero-length terminal marker whose kind
//! is the continuation state for the next line.

use std::ops::Range;

// ---------------------------------------------------------------------------
// Token kinds
// ---------------------------------------------------------------------------

/// Token types, doubling as the per-line continuation state.
///
/// Sub-categories (e.g., `KeywordControl` vs `Keyword`) allow themes to assign
/// different styles to different semantic roles while keeping a flat enum.
/// [`TokenKind::Internal`] is reserved for language-private states that a
/// tokenizer hands to itself across lines; the core never interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TokenKind {
    /// No type. Terminal markers of lines that end in the normal state.
    #[default]
    Null,

    // Keywords
    Keyword,
    KeywordControl,
    KeywordType,
    KeywordModifier,

    // Literals
    String,
    StringEscape,
    Number,
    Boolean,

    // Identifiers
    Identifier,
    Type,
    Constant,
    Function,
    Macro,

    // Comments
    Comment,
    CommentBlock,
    CommentDoc,

    // Operators and punctuation
    Operator,
    Punctuation,
    Delimiter,

    // Special
    Attribute,
    Label,

    // Markup
    Heading,
    Link,
    Emphasis,
    MarkupTag,

    // Whitespace and errors
    Whitespace,
    Error,

    // Default / plain text
    Text,

    /// Language-private continuation state (e.g. "inside an embedded script").
    Internal(i32),
}

impl TokenKind {
    /// Whether this kind is a comment variant.
    pub fn is_comment(self) -> bool {
        matches!(self, Self::Comment | Self::CommentBlock | Self::CommentDoc)
    }

    /// Whether this kind is a string variant.
    pub fn is_string(self) -> bool {
        matches!(self, Self::String | Self::StringEscape)
    }

    /// Whether this kind is a keyword variant.
    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            Self::Keyword | Self::KeywordControl | Self::KeywordType | Self::KeywordModifier
        )
    }

    /// Whether this kind is a language-private state.
    pub fn is_internal(self) -> bool {
        matches!(self, Self::Internal(_))
    }

    /// Whether a line ending in this kind starts the next line in normal context.
    pub fn is_null(self) -> bool {
        self == Self::Null
    }
}

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// A token with a kind and an absolute byte range in the document.
///
/// Ranges are half-open. Tokens must satisfy `range.start <= range.end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub range: Range<usize>,
    pub meta: Option<TokenMeta>,
}

/// Optional metadata attached to a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenMeta {
    /// Nesting depth (e.g., bracket depth, comment nesting level).
    pub nesting: u16,
}

impl Token {
    /// Create a token. Panics in debug builds if the range is inverted.
    pub fn new(kind: TokenKind, range: Range<usize>) -> Self {
        debug_assert!(range.start <= range.end, "token range must be ordered");
        Self {
            kind,
            range,
            meta: None,
        }
    }

    /// Create a token with nesting metadata.
    pub fn with_nesting(kind: TokenKind, range: Range<usize>, nesting: u16) -> Self {
        debug_assert!(range.start <= range.end, "token range must be ordered");
        Self {
            kind,
            range,
            meta: Some(TokenMeta { nesting }),
        }
    }

    /// Token length in bytes.
    pub fn len(&self) -> usize {
        self.range.end.saturating_sub(self.range.start)
    }

    /// Whether the token is empty.
    pub fn is_empty(&self) -> bool {
        self.range.start >= self.range.end
    }

    /// Document offset of the first byte.
    pub fn start_offset(&self) -> usize {
        self.range.start
    }

    /// Inclusive document offset of the last byte.
    ///
    /// For an empty token this is `start_offset() - 1`, saturating at zero.
    pub fn last_offset(&self) -> usize {
        self.range.end.saturating_sub(1)
    }

    /// Extract the token's text from the document it was produced for.
    pub fn text<'a>(&self, document: &'a str) -> &'a str {
        &document[self.range.clone()]
    }
}

// ---------------------------------------------------------------------------
// TokenList
// ---------------------------------------------------------------------------

/// The ordered result of analyzing one segment.
///
/// Always holds a terminal marker, so an empty segment still yields a valid
/// list. The marker's kind is what the next line should start in:
/// - `Null` if the line was explicitly ended with a null token,
/// - otherwise the kind of the last emitted token,
/// - otherwise (nothing emitted) the initial kind of the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenList {
    tokens: Vec<Token>,
    terminal: Token,
    line_start: usize,
}

impl Default for TokenList {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenList {
    /// An empty list terminated at offset 0 in the `Null` state.
    pub fn new() -> Self {
        Self {
            tokens: Vec::new(),
            terminal: Token::new(TokenKind::Null, 0..0),
            line_start: 0,
        }
    }

    /// Discard all tokens and move the terminal marker to `offset`.
    ///
    /// Keeps the allocation so per-line analysis does not reallocate.
    pub fn clear(&mut self, offset: usize) {
        self.tokens.clear();
        self.terminal = Token::new(TokenKind::Null, offset..offset);
        self.line_start = offset;
    }

    /// Append a token. Callers keep tokens in source order.
    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    /// Close the list at `end_offset`, deriving the continuation state from
    /// the last emitted token or, if there is none, from `initial`.
    pub fn finish(&mut self, end_offset: usize, initial: TokenKind) {
        let kind = self.tokens.last().map_or(initial, |t| t.kind);
        self.terminal = Token::new(kind, end_offset..end_offset);
    }

    /// Close the list at `end_offset` with an explicit continuation state.
    pub fn finish_with(&mut self, end_offset: usize, continuation: TokenKind) {
        self.terminal = Token::new(continuation, end_offset..end_offset);
    }

    /// Absolute offset of the analyzed segment's first byte, shared by every
    /// token in the list.
    pub fn line_start(&self) -> usize {
        self.line_start
    }

    /// Emitted tokens in source order (terminal marker excluded).
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// First emitted token, if any.
    pub fn first(&self) -> Option<&Token> {
        self.tokens.first()
    }

    /// The zero-length terminal marker.
    pub fn terminal(&self) -> &Token {
        &self.terminal
    }

    /// Continuation state to hand to the next line's analysis call.
    pub fn last_token_type(&self) -> TokenKind {
        self.terminal.kind
    }

    /// Number of emitted tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether only the terminal marker is present.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Iterate over emitted tokens.
    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    /// Whether the tokens cover `bounds` exactly, with no gaps or overlaps.
    ///
    /// Empty tokens are allowed anywhere. An empty list partitions an empty range.
    pub fn is_partition_of(&self, bounds: Range<usize>) -> bool {
        let mut cursor = bounds.start;
        for token in &self.tokens {
            if token.range.start != cursor || token.range.end < token.range.start {
                return false;
            }
            cursor = token.range.end;
        }
        cursor == bounds.end
    }

    /// Take the emitted tokens out of the list.
    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }
}

impl<'a> IntoIterator for &'a TokenList {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate that all token ranges lie within `bounds`, are ordered, and do
/// not overlap.
///
/// Analysis never calls this; it is for callers that want to check a
/// tokenizing callback.
pub fn validate_tokens(bounds: Range<usize>, tokens: &[Token]) -> bool {
    let mut prev_end = bounds.start;
    for token in tokens {
        if token.range.start > token.range.end {
            return false;
        }
        if token.range.end > bounds.end {
            return false;
        }
        if token.range.start < prev_end {
            return false; // overlapping or out of order
        }
        prev_end = token.range.end;
    }
    true
}
