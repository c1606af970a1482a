//! debase - selective base-call removal for C++ LLVM-IR modules.
//!
//! A post-compilation tool marks constructor and destructor bodies with
//! `__debase_mark_begin`/`__debase_mark_end` sentinels and names the C++
//! types to rewrite through a pattern language over demangled qualified
//! names. This crate implements that pattern language and the symbol
//! matching built on it.
//!
//! # Primary Usage
//!
//! ```
//! use bumpalo::Bump;
//! use debase::core::SymbolMatcher;
//! use debase::demangle::{Classifier, ItaniumClassifier, SymbolFeatures};
//!
//! let arena = Bump::new();
//! let mut matcher = SymbolMatcher::new(&arena, false);
//! matcher.add_pattern("cocos2d::**::{file.stem}").unwrap();
//! matcher.set_filename("bindings/CCScheduler.cpp").unwrap();
//!
//! let mut features = SymbolFeatures::new();
//! ItaniumClassifier.classify("_ZN7cocos2d11CCSchedulerD1Ev", &mut features);
//! assert!(matcher.matches(&features));
//! ```
//!
//! # Pattern language
//!
//! Patterns are `::`-separated scope segments over demangled names:
//!
//! - `x::y::Z`: literal scopes.
//! - `@`: an anonymous-namespace scope.
//! - `**`: a scope glob, matching any run of scopes.
//! - `{file.stem}` / `{this.dir}`: file-property replacements; `file`
//!   binds late against each input module, `this` resolves against the
//!   configuration file.
//! - `/I?[A-Z]+/`: a restricted regex over identifier characters, with
//!   `\a`/`\d`/`\w`/`\i` escapes and POSIX classes like `[[:lower:]]`.
//!
//! # Architecture
//!
//! - [`core`]: lexer, compiler, pattern tree, matcher, config loader.
//! - [`demangle`]: Itanium/Microsoft symbol classification.
//! - [`driver`]: hardening modes, triple handling, the debase oracle.

pub mod core;
pub mod demangle;
pub mod driver;

// Keep the main entry points reachable from the crate root.
pub use crate::core::{PatternError, PatternResult, SymbolMatcher};
pub use crate::demangle::{Classifier, SymbolFeatures, SymbolKind};
pub use crate::driver::{DebaseOracle, Hardening, ManglingAbi};
