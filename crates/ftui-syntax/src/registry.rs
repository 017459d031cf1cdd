#![forbid(unsafe_code)]

//! Registry mapping language keys to tokenizer constructors.
//!
//! Entries are construction recipes, not tokenizers: nothing is built until a
//! key is resolved, and every resolution builds a fresh instance. A registry
//! can list many languages while a document pays only for the one it uses.
//!
//! # Example
//! ```
//! use ftui_syntax::{SYNTAX_STYLE_NONE, Segment, TokenKind, TokenMaker, TokenizerRegistry};
//!
//! let registry = TokenizerRegistry::builder()
//!     .named(SYNTAX_STYLE_NONE, "PlainTokenizer")
//!     .dispatch_fn("text/x-upper", 1, |out, segment, _, _| {
//!         out.add_token(0..segment.len(), TokenKind::Keyword);
//!     })
//!     .build();
//!
//! let mut tokenizer = registry.resolve("text/x-upper").unwrap().unwrap();
//! assert_eq!(tokenizer.language_index(), 1);
//! let list = tokenizer.analyze(Segment::whole("ABC"), TokenKind::Null, 0);
//! assert_eq!(list.len(), 1);
//!
//! assert!(registry.resolve("text/x-missing").unwrap().is_none());
//! ```

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::dispatch::{DispatchTokenizer, TokenEmitter, TokenizeCallback, callback_fn};
use crate::error::CreateError;
use crate::maker::{PlainTokenizer, TokenMaker};
use crate::segment::Segment;
use crate::token::TokenKind;

// ---------------------------------------------------------------------------
// Conventional keys
// ---------------------------------------------------------------------------

/// Plain text, no highlighting.
pub const SYNTAX_STYLE_NONE: &str = "text/plain";
pub const SYNTAX_STYLE_C: &str = "text/c";
pub const SYNTAX_STYLE_CSS: &str = "text/css";
pub const SYNTAX_STYLE_HTML: &str = "text/html";
pub const SYNTAX_STYLE_JAVASCRIPT: &str = "text/javascript";
pub const SYNTAX_STYLE_JSON: &str = "text/json";
pub const SYNTAX_STYLE_MARKDOWN: &str = "text/markdown";
pub const SYNTAX_STYLE_PYTHON: &str = "text/python";
pub const SYNTAX_STYLE_RUST: &str = "text/rust";
pub const SYNTAX_STYLE_XML: &str = "text/xml";

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

/// Result of running a tokenizer constructor.
pub type MakerResult = Result<Box<dyn TokenMaker>, CreateError>;

/// A deferred tokenizer constructor.
pub type MakerFactory = dyn Fn() -> MakerResult + Send + Sync;

/// Catalog of named tokenizer constructors.
///
/// Named entries in a registry are looked up here when they are resolved, so
/// a key can refer to a tokenizer type that is only defined later (or never).
#[derive(Clone, Default)]
pub struct TokenizerLoader {
    ctors: HashMap<String, Arc<MakerFactory>>,
}

impl fmt::Debug for TokenizerLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenizerLoader")
            .field("types", &self.names())
            .finish()
    }
}

impl TokenizerLoader {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog with `PlainTokenizer` and `DispatchTokenizer`.
    pub fn with_builtins() -> Self {
        Self::new()
            .define("PlainTokenizer", || Ok(Box::new(PlainTokenizer::new())))
            .define("DispatchTokenizer", || Ok(Box::new(DispatchTokenizer::new())))
    }

    /// Define (or redefine) a named constructor.
    #[must_use]
    pub fn define<F>(mut self, type_name: impl Into<String>, ctor: F) -> Self
    where
        F: Fn() -> MakerResult + Send + Sync + 'static,
    {
        self.ctors.insert(type_name.into(), Arc::new(ctor));
        self
    }

    /// Whether `type_name` is defined.
    pub fn contains(&self, type_name: &str) -> bool {
        self.ctors.contains_key(type_name)
    }

    /// Build an instance of `type_name`.
    pub fn load(&self, type_name: &str) -> MakerResult {
        let ctor = self
            .ctors
            .get(type_name)
            .ok_or_else(|| CreateError::not_found(type_name))?;
        ctor()
    }

    /// Defined type names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.ctors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// How an entry builds its tokenizer.
#[derive(Clone)]
pub enum Creator {
    /// Look up `type_name` in `loader`, or in the registry's loader if `None`.
    Named {
        type_name: String,
        loader: Option<Arc<TokenizerLoader>>,
    },
    /// Run a constructor closure.
    Factory(Arc<MakerFactory>),
    /// Wrap a shared callback in a new [`DispatchTokenizer`].
    ///
    /// Every instance built from this creator holds the same callback.
    Dispatch {
        callback: Arc<dyn TokenizeCallback>,
        language_index: u32,
    },
}

impl fmt::Debug for Creator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named { type_name, loader } => f
                .debug_struct("Named")
                .field("type_name", type_name)
                .field("own_loader", &loader.is_some())
                .finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
            Self::Dispatch { language_index, .. } => f
                .debug_struct("Dispatch")
                .field("language_index", language_index)
                .finish_non_exhaustive(),
        }
    }
}

impl Creator {
    /// Build a tokenizer, using `fallback_loader` for named entries without
    /// a loader of their own.
    pub fn create(&self, fallback_loader: &TokenizerLoader) -> MakerResult {
        match self {
            Self::Named { type_name, loader } => loader
                .as_deref()
                .unwrap_or(fallback_loader)
                .load(type_name),
            Self::Factory(ctor) => ctor(),
            Self::Dispatch {
                callback,
                language_index,
            } => Ok(Box::new(
                DispatchTokenizer::with_callback(Arc::clone(callback))
                    .with_language_index(*language_index),
            )),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Self::Named { .. } => "named",
            Self::Factory(_) => "factory",
            Self::Dispatch { .. } => "dispatch",
        }
    }
}

/// A key and its construction recipe.
#[derive(Debug, Clone)]
pub struct TokenizerEntry {
    key: String,
    creator: Creator,
}

impl TokenizerEntry {
    pub fn new(key: impl Into<String>, creator: Creator) -> Self {
        Self {
            key: key.into(),
            creator,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn creator(&self) -> &Creator {
        &self.creator
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Collects the initial registrations of a [`TokenizerRegistry`].
///
/// `build()` consumes the builder, so population happens exactly once and
/// before any lookup.
#[derive(Debug, Default)]
pub struct TokenizerRegistryBuilder {
    entries: Vec<TokenizerEntry>,
    loader: Option<TokenizerLoader>,
}

impl TokenizerRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader for named entries that do not carry their own.
    /// Defaults to [`TokenizerLoader::with_builtins`].
    #[must_use]
    pub fn loader(mut self, loader: TokenizerLoader) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Map `key` to an arbitrary creator.
    #[must_use]
    pub fn entry(mut self, key: impl Into<String>, creator: Creator) -> Self {
        self.entries.push(TokenizerEntry::new(key, creator));
        self
    }

    /// Map `key` to a type name resolved by the registry's loader.
    #[must_use]
    pub fn named(self, key: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.entry(
            key,
            Creator::Named {
                type_name: type_name.into(),
                loader: None,
            },
        )
    }

    /// Map `key` to a type name resolved by a specific loader.
    #[must_use]
    pub fn named_in(
        self,
        key: impl Into<String>,
        type_name: impl Into<String>,
        loader: Arc<TokenizerLoader>,
    ) -> Self {
        self.entry(
            key,
            Creator::Named {
                type_name: type_name.into(),
                loader: Some(loader),
            },
        )
    }

    /// Map `key` to a constructor closure.
    #[must_use]
    pub fn factory<F>(self, key: impl Into<String>, ctor: F) -> Self
    where
        F: Fn() -> MakerResult + Send + Sync + 'static,
    {
        self.entry(key, Creator::Factory(Arc::new(ctor)))
    }

    /// Map `key` to a dispatch tokenizer over a shared callback.
    #[must_use]
    pub fn dispatch(
        self,
        key: impl Into<String>,
        language_index: u32,
        callback: Arc<dyn TokenizeCallback>,
    ) -> Self {
        self.entry(
            key,
            Creator::Dispatch {
                callback,
                language_index,
            },
        )
    }

    /// Map `key` to a dispatch tokenizer over a closure.
    #[must_use]
    pub fn dispatch_fn<F>(self, key: impl Into<String>, language_index: u32, f: F) -> Self
    where
        F: Fn(&mut TokenEmitter<'_>, Segment<'_>, TokenKind, usize) + Send + Sync + 'static,
    {
        self.dispatch(key, language_index, callback_fn(f))
    }

    /// Build the registry. Later registrations of a key win.
    pub fn build(self) -> TokenizerRegistry {
        let loader = self.loader.unwrap_or_else(TokenizerLoader::with_builtins);
        let mut entries = HashMap::with_capacity(self.entries.len());
        for entry in self.entries {
            entries.insert(entry.key.clone(), Arc::new(entry));
        }
        tracing::debug!(entries = entries.len(), "tokenizer registry built");
        TokenizerRegistry {
            entries: RwLock::new(entries),
            loader: Arc::new(loader),
        }
    }
}

// ---------------------------------------------------------------------------
// TokenizerRegistry
// ---------------------------------------------------------------------------

/// Maps registry keys to tokenizer construction recipes.
///
/// Keys are flat, case-sensitive strings; punctuation carries no meaning.
///
/// # Thread Safety
///
/// Entries live behind an internal `RwLock` and are swapped whole, so a
/// concurrent `resolve` sees either the old or the new entry for a key. The
/// lock is released before a tokenizer is constructed.
pub struct TokenizerRegistry {
    entries: RwLock<HashMap<String, Arc<TokenizerEntry>>>,
    loader: Arc<TokenizerLoader>,
}

impl fmt::Debug for TokenizerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenizerRegistry")
            .field("keys", &self.keys())
            .field("loader", &self.loader)
            .finish()
    }
}

impl Default for TokenizerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

static GLOBAL: OnceLock<RwLock<Arc<TokenizerRegistry>>> = OnceLock::new();

fn global_slot() -> &'static RwLock<Arc<TokenizerRegistry>> {
    GLOBAL.get_or_init(|| RwLock::new(Arc::new(TokenizerRegistry::with_defaults())))
}

impl TokenizerRegistry {
    /// An empty registry using the built-in loader.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// A registry mapping [`SYNTAX_STYLE_NONE`] to the plain tokenizer.
    pub fn with_defaults() -> Self {
        Self::builder()
            .named(SYNTAX_STYLE_NONE, "PlainTokenizer")
            .build()
    }

    pub fn builder() -> TokenizerRegistryBuilder {
        TokenizerRegistryBuilder::new()
    }

    /// Build a registry from an initialization routine.
    pub fn with_init<F>(init: F) -> Self
    where
        F: FnOnce(TokenizerRegistryBuilder) -> TokenizerRegistryBuilder,
    {
        init(Self::builder()).build()
    }

    /// The process-wide registry.
    pub fn global() -> Arc<TokenizerRegistry> {
        let slot = global_slot().read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&slot)
    }

    /// Replace the process-wide registry, returning the previous one.
    ///
    /// Holders of the previous `Arc` keep using it until they call
    /// [`TokenizerRegistry::global`] again.
    pub fn set_global(registry: Arc<TokenizerRegistry>) -> Arc<TokenizerRegistry> {
        let mut slot = global_slot().write().unwrap_or_else(|e| e.into_inner());
        std::mem::replace(&mut *slot, registry)
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<TokenizerEntry>>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<TokenizerEntry>>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert or overwrite the entry for `key`.
    ///
    /// Nothing is validated here; a creator that cannot build is only
    /// noticed when the key is resolved.
    pub fn register(&self, key: impl Into<String>, creator: Creator) {
        let key = key.into();
        tracing::debug!(key = %key, creator = creator.describe(), "registering tokenizer");
        let entry = Arc::new(TokenizerEntry::new(key.clone(), creator));
        self.write().insert(key, entry);
    }

    /// Map `key` to a type name, resolved by `loader` or the registry's own.
    pub fn register_named(
        &self,
        key: impl Into<String>,
        type_name: impl Into<String>,
        loader: Option<Arc<TokenizerLoader>>,
    ) {
        self.register(
            key,
            Creator::Named {
                type_name: type_name.into(),
                loader,
            },
        );
    }

    /// Map `key` to a constructor closure.
    pub fn register_factory<F>(&self, key: impl Into<String>, ctor: F)
    where
        F: Fn() -> MakerResult + Send + Sync + 'static,
    {
        self.register(key, Creator::Factory(Arc::new(ctor)));
    }

    /// Map `key` to a dispatch tokenizer over a shared callback.
    pub fn register_dispatch(
        &self,
        key: impl Into<String>,
        language_index: u32,
        callback: Arc<dyn TokenizeCallback>,
    ) {
        self.register(
            key,
            Creator::Dispatch {
                callback,
                language_index,
            },
        );
    }

    /// Map `key` to a dispatch tokenizer over a closure.
    pub fn register_dispatch_fn<F>(&self, key: impl Into<String>, language_index: u32, f: F)
    where
        F: Fn(&mut TokenEmitter<'_>, Segment<'_>, TokenKind, usize) + Send + Sync + 'static,
    {
        self.register_dispatch(key, language_index, callback_fn(f));
    }

    /// Remove the entry for `key`, returning it.
    pub fn unregister(&self, key: &str) -> Option<Arc<TokenizerEntry>> {
        self.write().remove(key)
    }

    /// The entry registered for `key`.
    pub fn entry(&self, key: &str) -> Option<Arc<TokenizerEntry>> {
        self.read().get(key).cloned()
    }

    /// Build a new tokenizer for `key`.
    ///
    /// - Unknown key: `Ok(None)`, no side effects.
    /// - Soft construction failure: logged, then `Ok(None)`.
    /// - Fatal construction failure: `Err`.
    pub fn resolve(&self, key: &str) -> Result<Option<Box<dyn TokenMaker>>, CreateError> {
        let Some(entry) = self.entry(key) else {
            return Ok(None);
        };

        match entry.creator.create(&self.loader) {
            Ok(maker) => {
                tracing::debug!(key, tokenizer = maker.name(), "resolved tokenizer");
                Ok(Some(maker))
            }
            Err(err) if err.is_fatal() => {
                tracing::error!(key, kind = %err.kind(), error = %err, "fatal tokenizer construction failure");
                Err(err)
            }
            Err(err) => {
                tracing::warn!(key, kind = %err.kind(), error = %err, "tokenizer unavailable, treating key as unregistered");
                Ok(None)
            }
        }
    }

    /// Build a tokenizer for `key`, falling back to [`PlainTokenizer`].
    pub fn tokenizer(&self, key: &str) -> Result<Box<dyn TokenMaker>, CreateError> {
        Ok(self
            .resolve(key)?
            .unwrap_or_else(|| Box::new(PlainTokenizer::new())))
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> BTreeSet<String> {
        self.read().keys().cloned().collect()
    }

    /// Whether `key` is registered.
    pub fn contains(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    /// Number of registered keys.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether no keys are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The loader used for named entries without their own.
    pub fn loader(&self) -> &TokenizerLoader {
        &self.loader
    }
}
