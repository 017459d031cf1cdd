#![forbid(unsafe_code)]

//! Tokenizer construction errors.

use std::fmt;

/// What went wrong while building a tokenizer.
///
/// The first three kinds are soft: the registry logs them and reports the key
/// as absent so the editor can fall back to plain text. The last two are
/// fatal and are returned to the caller unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CreateErrorKind {
    /// The named tokenizer type is not known to the loader.
    NotFound,
    /// The type is known but could not be built (bad configuration, etc.).
    NotConstructible,
    /// Construction was refused (e.g. the language is disabled).
    Denied,
    /// Memory or another hard resource ran out.
    ResourceExhausted,
    /// An internal invariant was broken; continuing would hide a bug.
    InvariantViolated,
}

impl CreateErrorKind {
    /// Whether errors of this kind must propagate instead of being swallowed.
    pub fn is_fatal(self) -> bool {
        matches!(self, Self::ResourceExhausted | Self::InvariantViolated)
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not found",
            Self::NotConstructible => "not constructible",
            Self::Denied => "denied",
            Self::ResourceExhausted => "resource exhausted",
            Self::InvariantViolated => "invariant violated",
        }
    }
}

impl fmt::Display for CreateErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure to build a tokenizer for a registry key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateError {
    kind: CreateErrorKind,
    message: String,
}

impl CreateError {
    pub fn new(kind: CreateErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// No constructor registered under `type_name`.
    pub fn not_found(type_name: &str) -> Self {
        Self::new(
            CreateErrorKind::NotFound,
            format!("no tokenizer type named `{type_name}`"),
        )
    }

    pub fn not_constructible(message: impl Into<String>) -> Self {
        Self::new(CreateErrorKind::NotConstructible, message)
    }

    pub fn denied(message: impl Into<String>) -> Self {
        Self::new(CreateErrorKind::Denied, message)
    }

    pub fn resource_exhausted(message: impl Into<String>) -> Self {
        Self::new(CreateErrorKind::ResourceExhausted, message)
    }

    pub fn invariant_violated(message: impl Into<String>) -> Self {
        Self::new(CreateErrorKind::InvariantViolated, message)
    }

    pub fn kind(&self) -> CreateErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether this error must propagate out of the registry.
    pub fn is_fatal(&self) -> bool {
        self.kind.is_fatal()
    }
}

impl fmt::Display for CreateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tokenizer construction failed ({}): {}", self.kind, self.message)
    }
}

impl std::error::Error for CreateError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_split() {
        assert!(!CreateErrorKind::NotFound.is_fatal());
        assert!(!CreateErrorKind::NotConstructible.is_fatal());
        assert!(!CreateErrorKind::Denied.is_fatal());
        assert!(CreateErrorKind::ResourceExhausted.is_fatal());
        assert!(CreateErrorKind::InvariantViolated.is_fatal());
    }

    #[test]
    fn display_includes_kind_and_message() {
        let err = CreateError::not_found("HtmlTokenizer");
        assert_eq!(err.kind(), CreateErrorKind::NotFound);
        assert_eq!(
            err.to_string(),
            "tokenizer construction failed (not found): no tokenizer type named `HtmlTokenizer`"
        );
    }

    #[test]
    fn usable_as_boxed_error() {
        let err: Box<dyn std::error::Error> = Box::new(CreateError::denied("disabled"));
        assert!(err.to_string().contains("denied"));
    }
}
