//! Error types for pattern lexing, compilation, and configuration.
//!
//! Using thiserror for more idiomatic error handling. Every lexer and
//! compiler error carries the pattern text (or the offending segment of it)
//! so diagnostics read like `invalid pattern 'I*+v', found multiple
//! quantifiers in a row`.

use thiserror::Error;

/// Main error type for the pattern engine.
#[derive(Error, Debug)]
pub enum PatternError {
    #[error("invalid pattern: cannot be empty")]
    EmptyPattern,

    #[error("invalid pattern '{pattern}', {detail}")]
    BadScope { pattern: String, detail: String },

    #[error("invalid pattern '{ident}', {detail}")]
    BadIdentifier { ident: String, detail: String },

    #[error("invalid pattern '{object}', unknown replacement object")]
    UnknownReplacementObject { object: String },

    #[error("invalid pattern '{member}', unknown replacement member")]
    UnknownReplacementMember { member: String },

    #[error("invalid pattern '{segment}', {detail}")]
    InvalidEscape { segment: String, detail: String },

    #[error("invalid pattern '{class}', {detail}")]
    InvalidCharClass { class: String, detail: String },

    #[error("invalid pattern '{segment}', {detail}")]
    QuantifierMisuse { segment: String, detail: String },

    #[error("invalid pattern '{segment}', {feature} currently unsupported")]
    UnsupportedFeature { segment: String, feature: String },

    #[error("invalid pattern '{segment}', {detail}")]
    InvalidCharacter { segment: String, detail: String },

    #[error("pattern '{pattern}' contains {globs} scope globs, only one is supported")]
    MultiGlobNotImplemented { pattern: String, globs: usize },

    #[error("unknown file property '{name}'")]
    UnknownProperty { name: String },

    #[error("'this' replacement requires a configuration context")]
    ThisOutsideConfig,

    #[error("failed to compile regex for '{segment}': {source}")]
    RegexCompile {
        segment: String,
        #[source]
        source: regex::Error,
    },

    #[error("in {path}: {detail}")]
    ConfigShape { path: String, detail: String },

    #[error("in {path}: no patterns found in config (ctor/dtor/all)")]
    ConfigMissingPatterns { path: String },

    #[error("config file has already been loaded from {path}")]
    ConfigReload { path: String },

    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    ConfigJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type alias for pattern operations.
pub type PatternResult<T> = Result<T, PatternError>;
