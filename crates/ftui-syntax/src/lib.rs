#![forbid(unsafe_code)]

//! Pluggable tokenization for FrankenTUI syntax highlighting.
//!
//! This crate lets many language grammars share one per-line tokenization
//! engine:
//! - [`TokenizerRegistry`] - maps language keys to tokenizer construction
//!   recipes, built lazily on lookup
//! - [`DispatchTokenizer`] - a generic tokenizer that forwards lexing to an
//!   injected [`TokenizeCallback`] and keeps [`DelegateState`] across lines
//! - [`TokenMaker`] - the object-safe tokenizer interface handed out by the
//!   registry
//! - [`TokenizedText`] - a per-line cache that threads continuation state
//!   from line to line and re-tokenizes incrementally
//!
//! # Example
//! ```
//! use ftui_syntax::{Segment, TokenKind, TokenMaker, TokenizerRegistry};
//!
//! let registry = TokenizerRegistry::builder()
//!     .dispatch_fn("text/x-demo", 0, |out, segment, _initial, _offset| {
//!         let text = segment.as_str();
//!         let mut pos = 0;
//!         for word in text.split(' ') {
//!             if pos > 0 {
//!                 out.add_token(pos - 1..pos, TokenKind::Whitespace);
//!             }
//!             out.add_token(pos..pos + word.len(), TokenKind::Text);
//!             pos += word.len() + 1;
//!         }
//!     })
//!     .build();
//!
//! // Unknown keys fall back to the plain tokenizer.
//! let plain = registry.tokenizer("text/x-unknown").unwrap();
//! assert_eq!(plain.name(), "Plain");
//!
//! let mut demo = registry.tokenizer("text/x-demo").unwrap();
//! let list = demo.analyze(Segment::whole("ab cd"), TokenKind::Identifier, 0);
//! let spans: Vec<_> = list
//!     .iter()
//!     .map(|t| (t.start_offset(), t.last_offset(), t.kind))
//!     .collect();
//! assert_eq!(
//!     spans,
//!     vec![
//!         (0, 1, TokenKind::Text),
//!         (2, 2, TokenKind::Whitespace),
//!         (3, 4, TokenKind::Text),
//!     ]
//! );
//! ```

pub mod dispatch;
pub mod error;
pub mod incremental;
pub mod maker;
pub mod registry;
pub mod segment;
pub mod token;

pub use dispatch::{DispatchTokenizer, FnCallback, TokenEmitter, TokenizeCallback, callback_fn};
pub use error::{CreateError, CreateErrorKind};
pub use incremental::{TokenLine, TokenizedText};
pub use maker::{DelegateState, PlainTokenizer, TokenMaker};
pub use registry::{
    Creator, MakerFactory, MakerResult, SYNTAX_STYLE_C, SYNTAX_STYLE_CSS, SYNTAX_STYLE_HTML,
    SYNTAX_STYLE_JAVASCRIPT, SYNTAX_STYLE_JSON, SYNTAX_STYLE_MARKDOWN, SYNTAX_STYLE_NONE,
    SYNTAX_STYLE_PYTHON, SYNTAX_STYLE_RUST, SYNTAX_STYLE_XML, TokenizerEntry, TokenizerLoader,
    TokenizerRegistry, TokenizerRegistryBuilder,
};
pub use segment::Segment;
pub use token::{Token, TokenKind, TokenList, TokenMeta, validate_tokens};
