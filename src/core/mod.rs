//! Core pattern-engine infrastructure.
//!
//! The pipeline runs left to right: pattern text is lexed into tokens
//! ([`lexer`]), compiled into an arena-allocated node tree ([`compiler`],
//! [`pattern`]), and owned by a [`matcher::SymbolMatcher`] that answers
//! match queries over demangled scope names. Late-bound `{file.*}`
//! references are rebound through [`replacer`]s whenever the matcher is
//! pointed at a new input file.

pub mod character;
pub mod compiler;
pub mod config;
pub mod error;
pub mod file_props;
pub mod lexer;
pub mod matcher;
pub mod pattern;
pub mod replacer;
pub mod token;

// Re-export core components.
pub use error::{PatternError, PatternResult};
pub use file_props::{FileProp, FilePropertyCache};
pub use lexer::lex_pattern;
pub use matcher::{MatcherStats, SymbolMatcher};
pub use pattern::{PatternNode, RegexTable, VARIABLE_COUNT};
pub use token::{Token, TokenKind};
