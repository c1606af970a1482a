// This module provides the arena-based matcher session that owns every
// compiled pattern for a tool run. The matcher borrows an externally created
// bump arena; pattern nodes, interned strings, and token text live in the
// arena and die with it, while state with real destructors (compiled
// regexes, replacer templates) lives in matcher-owned tables so teardown
// runs normally. Compilation is memoized on the raw pattern text, which
// makes repeated compiles pointer-equal and lets the ctor/dtor sets share
// nodes. Installing a module filename fans out to every registered replacer
// in insertion order, rewriting late-bound leaf text and recompiling their
// regexes against the new file's properties.

//! The symbol matcher.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use bumpalo::Bump;

use crate::demangle::SymbolFeatures;

use super::compiler::PatternCompiler;
use super::error::PatternResult;
use super::file_props::FilePropertyCache;
use super::lexer::lex_pattern;
use super::pattern::{PatternNode, RegexTable};
use super::replacer::Replacer;
use super::token::format_tokens;

/// Counters describing one matcher's lifetime.
#[derive(Debug, Default, Clone, Copy)]
pub struct MatcherStats {
    /// Patterns compiled fresh (cache misses).
    pub patterns_compiled: usize,
    /// Compile requests answered from the cache.
    pub cache_hits: usize,
    /// `set_filename` sweeps performed.
    pub rebinds: usize,
    /// Match queries answered.
    pub match_queries: usize,
    /// Queries that matched a pattern.
    pub symbols_matched: usize,
}

impl fmt::Display for MatcherStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Matcher statistics:")?;
        writeln!(f, "  Patterns compiled: {}", self.patterns_compiled)?;
        writeln!(f, "  Pattern cache hits: {}", self.cache_hits)?;
        writeln!(f, "  Filename rebinds: {}", self.rebinds)?;
        writeln!(f, "  Match queries: {}", self.match_queries)?;
        writeln!(f, "  Symbols matched: {}", self.symbols_matched)
    }
}

/// Utility to match constructor/destructor symbols against pattern sets.
///
/// Created once per tool run, filled from configuration and the command
/// line, consulted for every module, and torn down at exit.
pub struct SymbolMatcher<'arena> {
    /// Arena for nodes, interned strings, and token text.
    arena: &'arena Bump,
    /// String interning, shared by pattern text and filenames.
    interned: RefCell<HashMap<String, &'arena str>>,
    /// Pattern text to compiled node; guarantees compile-once.
    cache: HashMap<&'arena str, &'arena PatternNode<'arena>>,
    /// Patterns used for matching constructors, each with a flag recording
    /// whether it has matched a symbol yet.
    ctor_patterns: Vec<(&'arena PatternNode<'arena>, Cell<bool>)>,
    /// Patterns used for matching destructors, flagged like the ctor set.
    dtor_patterns: Vec<(&'arena PatternNode<'arena>, Cell<bool>)>,
    /// Compiled regex state for every `Regex` leaf.
    regexes: RegexTable,
    /// Late-bind replacers, in insertion order.
    replacers: Vec<Replacer<'arena>>,
    /// Filename of the current module.
    current_filename: Option<&'arena str>,
    /// Absolute path of the loaded config, once one was loaded.
    config_path: Option<PathBuf>,
    /// Errors become warnings when set.
    permissive: bool,
    stats: RefCell<MatcherStats>,
}

impl<'arena> SymbolMatcher<'arena> {
    pub fn new(arena: &'arena Bump, permissive: bool) -> Self {
        Self {
            arena,
            interned: RefCell::new(HashMap::new()),
            cache: HashMap::new(),
            ctor_patterns: Vec::new(),
            dtor_patterns: Vec::new(),
            regexes: RegexTable::default(),
            replacers: Vec::new(),
            current_filename: None,
            config_path: None,
            permissive,
            stats: RefCell::new(MatcherStats::default()),
        }
    }

    pub fn permissive(&self) -> bool {
        self.permissive
    }

    pub fn arena(&self) -> &'arena Bump {
        self.arena
    }

    /// Interns a string in the arena.
    pub fn intern(&self, s: &str) -> &'arena str {
        if s.is_empty() {
            return "";
        }
        let mut interned = self.interned.borrow_mut();
        if let Some(&existing) = interned.get(s) {
            return existing;
        }
        let stored: &'arena str = self.arena.alloc_str(s);
        interned.insert(s.to_string(), stored);
        stored
    }

    /// Compiles `pattern` if uncached, otherwise returns the cached node.
    pub fn compile_pattern(
        &mut self,
        pattern: &str,
    ) -> PatternResult<&'arena PatternNode<'arena>> {
        self.compile_pattern_with(pattern, None)
    }

    /// Like [`Self::compile_pattern`], with a file-property cache for
    /// immediate `{this.*}` resolution (config-loading context).
    pub fn compile_pattern_with(
        &mut self,
        pattern: &str,
        this: Option<&mut FilePropertyCache>,
    ) -> PatternResult<&'arena PatternNode<'arena>> {
        let key = self.intern(pattern);
        if let Some(&node) = self.cache.get(key) {
            self.stats.borrow_mut().cache_hits += 1;
            return Ok(node);
        }

        let toks = lex_pattern(self.arena, key, this)?;
        if log::log_enabled!(log::Level::Trace) {
            log::trace!("lexed '{}' into {}", key, format_tokens(&toks));
        }
        let mut compiler = PatternCompiler {
            arena: self.arena,
            regexes: &mut self.regexes,
            replacers: &mut self.replacers,
            pattern: key,
        };
        let node = compiler.compile(&toks)?;

        self.cache.insert(key, node);
        self.stats.borrow_mut().patterns_compiled += 1;
        log::debug!("compiled pattern '{key}' as {node}");
        Ok(node)
    }

    /// Adds a compiled node to the constructor set.
    pub fn insert_ctor(&mut self, node: &'arena PatternNode<'arena>) {
        if !self.ctor_patterns.iter().any(|(p, _)| std::ptr::eq(*p, node)) {
            self.ctor_patterns.push((node, Cell::new(false)));
        }
    }

    /// Adds a compiled node to the destructor set.
    pub fn insert_dtor(&mut self, node: &'arena PatternNode<'arena>) {
        if !self.dtor_patterns.iter().any(|(p, _)| std::ptr::eq(*p, node)) {
            self.dtor_patterns.push((node, Cell::new(false)));
        }
    }

    /// Compiles and registers a constructor-only pattern.
    pub fn add_ctor_pattern(&mut self, pattern: &str) -> PatternResult<()> {
        let node = self.compile_pattern(pattern)?;
        self.insert_ctor(node);
        Ok(())
    }

    /// Compiles and registers a destructor-only pattern.
    pub fn add_dtor_pattern(&mut self, pattern: &str) -> PatternResult<()> {
        let node = self.compile_pattern(pattern)?;
        self.insert_dtor(node);
        Ok(())
    }

    /// Compiles and registers a pattern for both sets (the "all" meaning).
    pub fn add_pattern(&mut self, pattern: &str) -> PatternResult<()> {
        let node = self.compile_pattern(pattern)?;
        self.insert_ctor(node);
        self.insert_dtor(node);
        Ok(())
    }

    pub fn ctor_pattern_count(&self) -> usize {
        self.ctor_patterns.len()
    }

    pub fn dtor_pattern_count(&self) -> usize {
        self.dtor_patterns.len()
    }

    /// Installs `filename` as the current module and rebinds every
    /// late-bind replacer against its properties, in insertion order.
    ///
    /// A failing replacer is fatal in strict mode; permissive mode logs a
    /// warning and keeps going.
    pub fn set_filename(&mut self, filename: &str) -> PatternResult<()> {
        self.current_filename = Some(self.intern(filename));
        self.stats.borrow_mut().rebinds += 1;
        let mut cache = FilePropertyCache::new(filename);
        for replacer in &self.replacers {
            if let Err(err) = replacer.replace(&mut cache, self.arena, &mut self.regexes) {
                if !self.permissive {
                    return Err(err);
                }
                log::warn!("skipping replacer for '{filename}': {err}");
            }
        }
        Ok(())
    }

    pub fn current_filename(&self) -> Option<&'arena str> {
        self.current_filename
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    pub(crate) fn set_config_path(&mut self, path: PathBuf) {
        debug_assert!(self.config_path.is_none(), "config loaded twice?");
        self.config_path = Some(path);
    }

    /// Checks constructor/destructor features against the pattern sets.
    ///
    /// Infallible: anything that is not an admissible structor answers
    /// `false`. Deleting destructors (Itanium variant 0) are excluded.
    pub fn matches(&self, features: &SymbolFeatures) -> bool {
        let mut stats = self.stats.borrow_mut();
        stats.match_queries += 1;
        drop(stats);

        if !features.is_ctor_dtor() {
            return false;
        }
        if features.variant == 0 {
            return false;
        }
        if features.scope_names.is_empty() {
            return false;
        }

        let set = if features.is_ctor() {
            &self.ctor_patterns
        } else {
            &self.dtor_patterns
        };
        for (pattern, hit) in set {
            if pattern.match_symbol(&features.scope_names, &self.regexes) {
                hit.set(true);
                self.stats.borrow_mut().symbols_matched += 1;
                return true;
            }
        }
        false
    }

    pub fn stats(&self) -> MatcherStats {
        *self.stats.borrow()
    }

    /// The text of every registered pattern that has not matched a symbol
    /// yet, sorted. Strict-mode drivers fail when this is non-empty after
    /// all inputs were scanned.
    pub fn unmatched_patterns(&self) -> Vec<String> {
        let mut entries = self.sorted_cache_entries();
        entries.retain(|(_, node)| {
            let mut in_any_set = false;
            let mut hit = false;
            for (pattern, matched) in self.ctor_patterns.iter().chain(&self.dtor_patterns) {
                if std::ptr::eq(*pattern, *node) {
                    in_any_set = true;
                    hit |= matched.get();
                }
            }
            in_any_set && !hit
        });
        entries.into_iter().map(|(text, _)| text.to_string()).collect()
    }

    /// Renders every compiled pattern with its set membership.
    pub fn dump(&self) -> String {
        use std::fmt::Write;

        let mut out = String::new();
        let _ = writeln!(out, "SymbolMatcher {{");
        let _ = writeln!(
            out,
            "  Filename: {}",
            self.current_filename.unwrap_or("<none>")
        );
        let _ = writeln!(out, "  Permissive: {}", self.permissive);
        let _ = writeln!(out, "  Patterns: [");
        for (text, node) in self.sorted_cache_entries() {
            let ctor = self
                .ctor_patterns
                .iter()
                .any(|(p, _)| std::ptr::eq(*p, node));
            let dtor = self
                .dtor_patterns
                .iter()
                .any(|(p, _)| std::ptr::eq(*p, node));
            let _ = writeln!(out, "    \"{text}\": {node} (ctor: {ctor}, dtor: {dtor})");
        }
        let _ = writeln!(out, "  ]");
        let _ = write!(out, "}}");
        out
    }

    fn sorted_cache_entries(&self) -> Vec<(&'arena str, &'arena PatternNode<'arena>)> {
        let mut entries: Vec<(&'arena str, &'arena PatternNode<'arena>)> =
            self.cache.iter().map(|(k, v)| (*k, *v)).collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demangle::SymbolKind;

    fn features(names: &[&str], kind: SymbolKind, variant: i32) -> SymbolFeatures {
        let mut f = SymbolFeatures::new();
        for name in &names[..names.len() - 1] {
            f.add_scope(*name);
        }
        f.set_base(names[names.len() - 1]);
        f.kind = kind;
        f.variant = variant;
        f
    }

    #[test]
    fn compile_cache_returns_pointer_equal_nodes() {
        let arena = Bump::new();
        let mut matcher = SymbolMatcher::new(&arena, false);
        let a = matcher.compile_pattern("x::y::Z").unwrap();
        let b = matcher.compile_pattern("x::y::Z").unwrap();
        assert!(std::ptr::eq(a, b));
        assert_eq!(matcher.stats().patterns_compiled, 1);
        assert_eq!(matcher.stats().cache_hits, 1);
    }

    #[test]
    fn same_pattern_in_both_sets_shares_one_node() {
        let arena = Bump::new();
        let mut matcher = SymbolMatcher::new(&arena, false);
        matcher.add_ctor_pattern("a::B").unwrap();
        matcher.add_dtor_pattern("a::B").unwrap();
        assert_eq!(matcher.ctor_pattern_count(), 1);
        assert_eq!(matcher.dtor_pattern_count(), 1);
        assert_eq!(matcher.stats().patterns_compiled, 1);
    }

    #[test]
    fn duplicate_inserts_are_deduplicated() {
        let arena = Bump::new();
        let mut matcher = SymbolMatcher::new(&arena, false);
        matcher.add_pattern("a::B").unwrap();
        matcher.add_pattern("a::B").unwrap();
        assert_eq!(matcher.ctor_pattern_count(), 1);
        assert_eq!(matcher.dtor_pattern_count(), 1);
    }

    #[test]
    fn match_dispatches_on_kind() {
        let arena = Bump::new();
        let mut matcher = SymbolMatcher::new(&arena, false);
        matcher.add_ctor_pattern("ns::Widget").unwrap();

        let ctor = features(&["ns", "Widget", "Widget"], SymbolKind::Constructor, 1);
        // Wrong arity: the pattern names two scopes, the symbol has three.
        assert!(!matcher.matches(&ctor));

        matcher.add_ctor_pattern("ns::Widget::Widget").unwrap();
        assert!(matcher.matches(&ctor));

        // Same shape as a dtor should not match the ctor-only set.
        let dtor = features(&["ns", "Widget", "Widget"], SymbolKind::Destructor, 1);
        assert!(!matcher.matches(&dtor));

        let other = features(&["ns", "Widget", "Widget"], SymbolKind::Other, 1);
        assert!(!matcher.matches(&other));
    }

    #[test]
    fn deleting_destructors_are_excluded() {
        let arena = Bump::new();
        let mut matcher = SymbolMatcher::new(&arena, false);
        matcher.add_dtor_pattern("ns::Widget::Widget").unwrap();
        let d0 = features(&["ns", "Widget", "Widget"], SymbolKind::Destructor, 0);
        assert!(!matcher.matches(&d0));
        let d2 = features(&["ns", "Widget", "Widget"], SymbolKind::Destructor, 2);
        assert!(matcher.matches(&d2));
    }

    #[test]
    fn set_filename_rebinds_replacers() {
        let arena = Bump::new();
        let mut matcher = SymbolMatcher::new(&arena, false);
        matcher.add_pattern("**::{file.stem}").unwrap();

        matcher.set_filename("CCScheduler.cpp").unwrap();
        let f = features(
            &["cocos2d", "CCScheduler", "CCScheduler"],
            SymbolKind::Constructor,
            1,
        );
        assert!(matcher.matches(&f));

        matcher.set_filename("CCLightning.cpp").unwrap();
        assert!(!matcher.matches(&f));
        let f = features(
            &["cocos2d", "CCLightning", "CCLightning"],
            SymbolKind::Constructor,
            1,
        );
        assert!(matcher.matches(&f));
        assert_eq!(matcher.current_filename(), Some("CCLightning.cpp"));
    }

    #[test]
    fn unresolved_this_is_fatal_in_strict_mode() {
        let arena = Bump::new();
        let mut matcher = SymbolMatcher::new(&arena, false);
        // No config context, so `{this.stem}` stays symbolic.
        matcher.add_pattern("{this.stem}::X").unwrap();
        assert!(matcher.set_filename("module.ll").is_err());
    }

    #[test]
    fn unresolved_this_is_skipped_in_permissive_mode() {
        let arena = Bump::new();
        let mut matcher = SymbolMatcher::new(&arena, true);
        matcher.add_pattern("{this.stem}::X").unwrap();
        assert!(matcher.set_filename("module.ll").is_ok());
    }

    #[test]
    fn unmatched_patterns_are_tracked_across_queries() {
        let arena = Bump::new();
        let mut matcher = SymbolMatcher::new(&arena, false);
        matcher.add_ctor_pattern("a::B").unwrap();
        matcher.add_dtor_pattern("c::D").unwrap();
        assert_eq!(matcher.unmatched_patterns(), ["a::B", "c::D"]);

        assert!(matcher.matches(&features(&["a", "B"], SymbolKind::Constructor, 1)));
        assert_eq!(matcher.unmatched_patterns(), ["c::D"]);

        // A failed query marks nothing.
        assert!(!matcher.matches(&features(&["x", "Y"], SymbolKind::Destructor, 1)));
        assert_eq!(matcher.unmatched_patterns(), ["c::D"]);

        assert!(matcher.matches(&features(&["c", "D"], SymbolKind::Destructor, 1)));
        assert!(matcher.unmatched_patterns().is_empty());
    }

    #[test]
    fn shared_pattern_counts_as_matched_from_either_set() {
        let arena = Bump::new();
        let mut matcher = SymbolMatcher::new(&arena, false);
        matcher.add_pattern("e::F").unwrap();
        assert!(matcher.matches(&features(&["e", "F"], SymbolKind::Destructor, 1)));
        assert!(matcher.unmatched_patterns().is_empty());
    }

    #[test]
    fn dump_lists_patterns_and_membership() {
        let arena = Bump::new();
        let mut matcher = SymbolMatcher::new(&arena, false);
        matcher.add_ctor_pattern("a::B").unwrap();
        matcher.add_pattern("c::D").unwrap();
        let dump = matcher.dump();
        assert!(dump.contains("\"a::B\": a::B (ctor: true, dtor: false)"));
        assert!(dump.contains("\"c::D\": c::D (ctor: true, dtor: true)"));
        assert!(dump.contains("Filename: <none>"));
    }

    #[test]
    fn compile_errors_surface() {
        let arena = Bump::new();
        let mut matcher = SymbolMatcher::new(&arena, false);
        assert!(matcher.compile_pattern("").is_err());
        assert!(matcher.compile_pattern("x::").is_err());
        assert!(matcher.compile_pattern("a::**::b::**::c").is_err());
    }
}
