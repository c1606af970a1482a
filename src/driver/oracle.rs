//! The per-module debase oracle.
//!
//! This is the consumer surface of the core: the IR rewriter asks, for each
//! function symbol of the current module, whether the function should be
//! debased. The oracle owns the demangler back end, reuses one features
//! buffer as scratch, and forwards to the matcher installed for the module.

use crate::core::error::PatternResult;
use crate::core::matcher::SymbolMatcher;
use crate::demangle::{Classifier, SymbolFeatures, SymbolKind};

use super::triple::ManglingAbi;

/// Answers "should this function be debased?" for one module at a time.
pub struct DebaseOracle<'m, 'arena> {
    matcher: &'m mut SymbolMatcher<'arena>,
    classifier: Box<dyn Classifier>,
    /// Scratch, reset on every classify.
    features: SymbolFeatures,
    symbols_seen: usize,
    symbols_matched: usize,
}

impl<'m, 'arena> DebaseOracle<'m, 'arena> {
    pub fn new(matcher: &'m mut SymbolMatcher<'arena>, abi: ManglingAbi) -> Self {
        Self {
            matcher,
            classifier: abi.classifier(),
            features: SymbolFeatures::new(),
            symbols_seen: 0,
            symbols_matched: 0,
        }
    }

    /// Installs `path` as the current module; late-bound patterns rebind
    /// against its file properties.
    pub fn begin_module(&mut self, path: &str) -> PatternResult<()> {
        log::debug!("debasing module '{path}'");
        self.matcher.set_filename(path)
    }

    /// Classifies one mangled symbol and checks it against the pattern
    /// sets. Unparseable symbols are skipped, never fatal.
    pub fn should_debase(&mut self, mangled: &str) -> bool {
        self.symbols_seen += 1;
        let kind = self.classifier.classify(mangled, &mut self.features);
        if !matches!(kind, SymbolKind::Constructor | SymbolKind::Destructor) {
            return false;
        }
        let hit = self.matcher.matches(&self.features);
        if hit {
            self.symbols_matched += 1;
            log::debug!(
                "matched {} '{}' ({})",
                if self.features.is_ctor() { "ctor" } else { "dtor" },
                self.features.scope_names.join("::"),
                mangled
            );
        }
        hit
    }

    /// The features extracted by the most recent classify.
    pub fn last_features(&self) -> &SymbolFeatures {
        &self.features
    }

    pub fn symbols_seen(&self) -> usize {
        self.symbols_seen
    }

    pub fn symbols_matched(&self) -> usize {
        self.symbols_matched
    }

    pub fn matcher(&self) -> &SymbolMatcher<'arena> {
        self.matcher
    }
}
