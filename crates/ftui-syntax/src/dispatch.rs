#![forbid(unsafe_code)]

//! Dispatch tokenizer: one generic [`TokenMaker`] that forwards lexing to an
//! injected callback.
//!
//! Many language grammars can share this engine. The grammar lives in a
//! [`TokenizeCallback`]; the tokenizer owns the output list and any
//! [`DelegateState`] the grammar needs across lines, and lends both to the
//! callback through a [`TokenEmitter`] on each call.
//!
//! # Example
//! ```
//! use ftui_syntax::{DispatchTokenizer, Segment, TokenKind};
//!
//! let mut tokenizer = DispatchTokenizer::from_fn(|out, segment, _initial, _offset| {
//!     let bytes = segment.as_bytes();
//!     let mut pos = 0;
//!     while pos < bytes.len() {
//!         let ws = bytes[pos] == b' ';
//!         let start = pos;
//!         while pos < bytes.len() && (bytes[pos] == b' ') == ws {
//!             pos += 1;
//!         }
//!         let kind = if ws { TokenKind::Whitespace } else { TokenKind::Text };
//!         out.add_token(start..pos, kind);
//!     }
//! });
//!
//! let list = tokenizer.analyze(Segment::whole("ab cd"), TokenKind::Null, 0);
//! assert_eq!(list.len(), 3);
//! ```

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use crate::maker::{DelegateState, TokenMaker};
use crate::segment::Segment;
use crate::token::{Token, TokenKind, TokenList};

// ---------------------------------------------------------------------------
// Callback
// ---------------------------------------------------------------------------

/// The grammar a [`DispatchTokenizer`] forwards to.
///
/// `tokenize` is expected to call [`TokenEmitter::add_token`] left to right
/// so the emitted tokens partition the segment. That is not checked.
pub trait TokenizeCallback: Send + Sync {
    /// Tokenize one segment into `out`.
    fn tokenize(
        &self,
        out: &mut TokenEmitter<'_>,
        segment: Segment<'_>,
        initial: TokenKind,
        start_offset: usize,
    );

    /// Called when the owning tokenizer's delegate state is set from outside.
    ///
    /// One callback may serve many tokenizers (every instance resolved from
    /// a registry dispatch entry shares it), so this hook sees changes from
    /// all of them. Per-instance lexical context belongs in the emitter's
    /// delegate state, not in the callback.
    fn delegate_state_changed(&self, state: Option<&DelegateState>) {
        let _ = state;
    }
}

/// Adapter that lets a plain closure act as a [`TokenizeCallback`].
pub struct FnCallback<F>(F);

impl<F> FnCallback<F>
where
    F: Fn(&mut TokenEmitter<'_>, Segment<'_>, TokenKind, usize) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> TokenizeCallback for FnCallback<F>
where
    F: Fn(&mut TokenEmitter<'_>, Segment<'_>, TokenKind, usize) + Send + Sync,
{
    fn tokenize(
        &self,
        out: &mut TokenEmitter<'_>,
        segment: Segment<'_>,
        initial: TokenKind,
        start_offset: usize,
    ) {
        (self.0)(out, segment, initial, start_offset);
    }
}

/// Wrap a closure into a shareable callback.
pub fn callback_fn<F>(f: F) -> Arc<dyn TokenizeCallback>
where
    F: Fn(&mut TokenEmitter<'_>, Segment<'_>, TokenKind, usize) + Send + Sync + 'static,
{
    Arc::new(FnCallback::new(f))
}

// ---------------------------------------------------------------------------
// TokenEmitter
// ---------------------------------------------------------------------------

/// The add-token sink lent to a callback for one analysis call.
pub struct TokenEmitter<'a> {
    tokens: &'a mut TokenList,
    delegate: &'a mut Option<DelegateState>,
    start_offset: usize,
    segment_len: usize,
    language_index: u32,
    null_terminated: bool,
}

impl TokenEmitter<'_> {
    /// Emit a token covering `range` of the segment (segment-relative bytes).
    ///
    /// The stored token carries absolute document offsets.
    pub fn add_token(&mut self, range: Range<usize>, kind: TokenKind) {
        let start = self.start_offset + range.start;
        let end = self.start_offset + range.end;
        self.tokens.push(Token::new(kind, start..end));
        self.null_terminated = false;
    }

    /// Emit a token with nesting metadata.
    pub fn add_nested_token(&mut self, range: Range<usize>, kind: TokenKind, nesting: u16) {
        let start = self.start_offset + range.start;
        let end = self.start_offset + range.end;
        self.tokens
            .push(Token::with_nesting(kind, start..end, nesting));
        self.null_terminated = false;
    }

    /// End the line in the normal state, regardless of the last token's kind.
    pub fn add_null_token(&mut self) {
        self.null_terminated = true;
    }

    /// Absolute document offset of the segment's first byte.
    pub fn start_offset(&self) -> usize {
        self.start_offset
    }

    /// Segment length in bytes.
    pub fn segment_len(&self) -> usize {
        self.segment_len
    }

    /// Language index of the owning tokenizer.
    pub fn language_index(&self) -> u32 {
        self.language_index
    }

    /// Tokens emitted so far in this call.
    pub fn emitted(&self) -> &[Token] {
        self.tokens.tokens()
    }

    /// The owning tokenizer's cross-line state.
    pub fn delegate_state(&self) -> Option<&DelegateState> {
        self.delegate.as_ref()
    }

    /// Mutable access to the cross-line state.
    pub fn delegate_state_mut(&mut self) -> &mut Option<DelegateState> {
        &mut *self.delegate
    }

    /// Replace the cross-line state, returning the previous one.
    pub fn replace_delegate_state(
        &mut self,
        state: Option<DelegateState>,
    ) -> Option<DelegateState> {
        std::mem::replace(&mut *self.delegate, state)
    }
}

// ---------------------------------------------------------------------------
// DispatchTokenizer
// ---------------------------------------------------------------------------

/// A tokenizer whose lexing rules come from an injected [`TokenizeCallback`].
///
/// Without a callback it degrades to an identity pass: the whole segment
/// becomes one token of the initial type.
#[derive(Default)]
pub struct DispatchTokenizer {
    callback: Option<Arc<dyn TokenizeCallback>>,
    language_index: u32,
    delegate_state: Option<DelegateState>,
    tokens: TokenList,
}

impl fmt::Debug for DispatchTokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchTokenizer")
            .field("has_callback", &self.callback.is_some())
            .field("language_index", &self.language_index)
            .field("delegate_state", &self.delegate_state)
            .field("tokens", &self.tokens)
            .finish()
    }
}

impl DispatchTokenizer {
    /// A tokenizer with no callback and language index 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// A tokenizer forwarding to `callback`.
    pub fn with_callback(callback: Arc<dyn TokenizeCallback>) -> Self {
        Self {
            callback: Some(callback),
            ..Self::default()
        }
    }

    /// A tokenizer forwarding to a closure.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&mut TokenEmitter<'_>, Segment<'_>, TokenKind, usize) + Send + Sync + 'static,
    {
        Self::with_callback(callback_fn(f))
    }

    /// Set the language index.
    #[must_use]
    pub fn with_language_index(mut self, language_index: u32) -> Self {
        self.language_index = language_index;
        self
    }

    /// Which sub-language this instance represents.
    pub fn language_index(&self) -> u32 {
        self.language_index
    }

    /// Whether a callback is configured.
    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    /// The current cross-line state.
    pub fn delegate_state(&self) -> Option<&DelegateState> {
        self.delegate_state.as_ref()
    }

    /// Set the cross-line state and notify the callback.
    pub fn set_delegate_state(&mut self, state: Option<DelegateState>) {
        self.delegate_state = state;
        if let Some(callback) = &self.callback {
            callback.delegate_state_changed(self.delegate_state.as_ref());
        }
    }

    /// Take the cross-line state out, leaving `None`.
    pub fn take_delegate_state(&mut self) -> Option<DelegateState> {
        self.delegate_state.take()
    }

    /// Result of the most recent analysis call.
    pub fn tokens(&self) -> &TokenList {
        &self.tokens
    }

    /// Tokenize one segment, discarding the previous result.
    pub fn analyze(
        &mut self,
        segment: Segment<'_>,
        initial: TokenKind,
        start_offset: usize,
    ) -> &TokenList {
        let _span = tracing::trace_span!(
            "dispatch.analyze",
            language_index = self.language_index,
            len = segment.len()
        )
        .entered();

        let end = start_offset + segment.len();
        self.tokens.clear(start_offset);

        match &self.callback {
            None => {
                if !segment.is_empty() {
                    self.tokens.push(Token::new(initial, start_offset..end));
                }
                self.tokens.finish(end, initial);
            }
            Some(callback) => {
                let mut out = TokenEmitter {
                    tokens: &mut self.tokens,
                    delegate: &mut self.delegate_state,
                    start_offset,
                    segment_len: segment.len(),
                    language_index: self.language_index,
                    null_terminated: false,
                };
                callback.tokenize(&mut out, segment, initial, start_offset);
                if out.null_terminated {
                    self.tokens.finish_with(end, TokenKind::Null);
                } else {
                    self.tokens.finish(end, initial);
                }
            }
        }

        &self.tokens
    }
}

impl TokenMaker for DispatchTokenizer {
    fn name(&self) -> &'static str {
        "Dispatch"
    }

    fn language_index(&self) -> u32 {
        self.language_index
    }

    fn analyze(
        &mut self,
        segment: Segment<'_>,
        initial: TokenKind,
        start_offset: usize,
    ) -> &TokenList {
        DispatchTokenizer::analyze(self, segment, initial, start_offset)
    }

    fn delegate_state(&self) -> Option<&DelegateState> {
        self.delegate_state.as_ref()
    }

    fn set_delegate_state(&mut self, state: Option<DelegateState>) {
        DispatchTokenizer::set_delegate_state(self, state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn split_words(out: &mut TokenEmitter<'_>, segment: Segment<'_>, _: TokenKind, _: usize) {
        let bytes = segment.as_bytes();
        let mut pos = 0;
        while pos < bytes.len() {
            let ws = bytes[pos].is_ascii_whitespace();
            let start = pos;
            while pos < bytes.len() && bytes[pos].is_ascii_whitespace() == ws {
                pos += 1;
            }
            let kind = if ws {
                TokenKind::Whitespace
            } else {
                TokenKind::Text
            };
            out.add_token(start..pos, kind);
        }
    }

    fn spans(list: &TokenList) -> Vec<(usize, usize, TokenKind)> {
        list.iter()
            .map(|t| (t.start_offset(), t.last_offset(), t.kind))
            .collect()
    }

    #[test]
    fn identity_pass_without_callback() {
        let mut t = DispatchTokenizer::new();
        let list = t.analyze(Segment::whole("hello"), TokenKind::CommentBlock, 40);
        assert_eq!(spans(list), vec![(40, 44, TokenKind::CommentBlock)]);
        assert_eq!(list.last_token_type(), TokenKind::CommentBlock);
    }

    #[test]
    fn empty_segment_yields_terminal_only() {
        let mut t = DispatchTokenizer::new();
        let list = t.analyze(Segment::whole(""), TokenKind::String, 7);
        assert!(list.is_empty());
        assert_eq!(list.terminal().range, 7..7);
        assert_eq!(list.last_token_type(), TokenKind::String);

        let mut t = DispatchTokenizer::from_fn(split_words);
        let list = t.analyze(Segment::whole(""), TokenKind::Null, 0);
        assert!(list.is_empty());
    }

    #[test]
    fn whitespace_split_scenario() {
        let mut t = DispatchTokenizer::from_fn(split_words);
        let list = t.analyze(Segment::whole("ab cd"), TokenKind::Identifier, 0);
        assert_eq!(
            spans(list),
            vec![
                (0, 1, TokenKind::Text),
                (2, 2, TokenKind::Whitespace),
                (3, 4, TokenKind::Text),
            ]
        );
        assert!(list.is_partition_of(0..5));
    }

    #[test]
    fn offsets_are_absolute() {
        let buffer = "first\nab cd";
        let segment = Segment::new(buffer, 6..11).unwrap();
        let mut t = DispatchTokenizer::from_fn(split_words);
        let list = t.analyze(segment, TokenKind::Null, 6);
        let texts: Vec<_> = list.iter().map(|tok| tok.text(buffer)).collect();
        assert_eq!(texts, vec!["ab", " ", "cd"]);
        assert_eq!(list.line_start(), 6);
    }

    #[test]
    fn consecutive_calls_do_not_leak() {
        let mut t = DispatchTokenizer::from_fn(split_words);
        assert_eq!(t.analyze(Segment::whole("a b c d"), TokenKind::Null, 0).len(), 7);
        let list = t.analyze(Segment::whole("xy"), TokenKind::Null, 100);
        assert_eq!(spans(list), vec![(100, 101, TokenKind::Text)]);
    }

    #[test]
    fn null_token_ends_line_in_normal_state() {
        let mut t = DispatchTokenizer::from_fn(|out, segment, _, _| {
            out.add_token(0..segment.len(), TokenKind::Comment);
            out.add_null_token();
        });
        let list = t.analyze(Segment::whole("// note"), TokenKind::Null, 0);
        assert_eq!(list.len(), 1);
        assert_eq!(list.last_token_type(), TokenKind::Null);
    }

    #[test]
    fn delegate_round_trip() {
        let mut t = DispatchTokenizer::new();
        let state = DelegateState::Embedded {
            language_index: 2,
            depth: 1,
        };
        t.set_delegate_state(Some(state.clone()));
        assert_eq!(t.delegate_state(), Some(&state));
        assert_eq!(t.take_delegate_state(), Some(state));
        assert!(t.delegate_state().is_none());
    }

    #[test]
    fn callback_observes_and_replaces_delegate() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let mut t = DispatchTokenizer::from_fn(move |out, segment, _, _| {
            log.lock().unwrap().push(out.delegate_state().cloned());
            let depth = match out.delegate_state() {
                Some(DelegateState::Nesting(d)) => *d,
                _ => 0,
            };
            out.replace_delegate_state(Some(DelegateState::Nesting(depth + 1)));
            out.add_token(0..segment.len(), TokenKind::Text);
        });

        t.set_delegate_state(Some(DelegateState::Nesting(5)));
        t.analyze(Segment::whole("x"), TokenKind::Null, 0);
        t.analyze(Segment::whole("y"), TokenKind::Null, 2);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                Some(DelegateState::Nesting(5)),
                Some(DelegateState::Nesting(6))
            ]
        );
        assert_eq!(t.delegate_state(), Some(&DelegateState::Nesting(7)));
    }

    struct Recording {
        changes: Mutex<Vec<Option<DelegateState>>>,
    }

    impl TokenizeCallback for Recording {
        fn tokenize(&self, out: &mut TokenEmitter<'_>, seg: Segment<'_>, _: TokenKind, _: usize) {
            out.add_token(0..seg.len(), TokenKind::Text);
        }

        fn delegate_state_changed(&self, state: Option<&DelegateState>) {
            self.changes.lock().unwrap().push(state.cloned());
        }
    }

    #[test]
    fn setting_delegate_notifies_callback() {
        let callback = Arc::new(Recording {
            changes: Mutex::new(Vec::new()),
        });
        let mut t = DispatchTokenizer::with_callback(callback.clone());
        t.set_delegate_state(Some(DelegateState::Delimited("EOF".into())));
        t.set_delegate_state(None);
        assert_eq!(
            *callback.changes.lock().unwrap(),
            vec![Some(DelegateState::Delimited("EOF".into())), None]
        );
    }

    #[test]
    fn emitter_exposes_context() {
        let mut t = DispatchTokenizer::from_fn(|out, segment, _, offset| {
            assert_eq!(out.start_offset(), offset);
            assert_eq!(out.segment_len(), segment.len());
            assert_eq!(out.language_index(), 3);
            out.add_nested_token(0..segment.len(), TokenKind::Delimiter, 2);
            assert_eq!(out.emitted().len(), 1);
        })
        .with_language_index(3);
        let list = t.analyze(Segment::whole("("), TokenKind::Null, 9);
        assert_eq!(list.tokens()[0].meta.map(|m| m.nesting), Some(2));
    }

    #[test]
    fn works_through_trait_object() {
        let mut boxed: Box<dyn TokenMaker> =
            Box::new(DispatchTokenizer::from_fn(split_words).with_language_index(4));
        assert_eq!(boxed.language_index(), 4);
        assert_eq!(boxed.name(), "Dispatch");
        boxed.set_delegate_state(Some(DelegateState::Nesting(1)));
        assert_eq!(boxed.delegate_state(), Some(&DelegateState::Nesting(1)));
        let tokens = boxed.tokenize("a b\nc");
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[3].range, 4..5);
    }

    #[test]
    fn tokenize_starts_each_document_without_delegate_state() {
        // `<%` enters an embedded block that persists until the next document.
        let mut t = DispatchTokenizer::from_fn(|out, segment, _, _| {
            let kind = if out.delegate_state().is_some() {
                TokenKind::Internal(1)
            } else {
                TokenKind::Text
            };
            out.add_token(0..segment.len(), kind);
            if segment.as_str().contains("<%") {
                out.replace_delegate_state(Some(DelegateState::Nesting(1)));
            }
        });

        t.tokenize("a <%");
        assert_eq!(t.delegate_state(), Some(&DelegateState::Nesting(1)));

        let second = t.tokenize("b");
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].kind, TokenKind::Text);
        assert!(t.delegate_state().is_none());
    }
}
