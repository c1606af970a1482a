//! Symbol classification.
//!
//! The matcher never sees mangled names directly; a [`Classifier`] back end
//! (one per mangling ABI) turns them into [`SymbolFeatures`]: the enclosing
//! scope chain, the unqualified base name, a [`SymbolKind`], and the ABI
//! variant tag for Itanium structors. Unparseable symbols classify as
//! [`SymbolKind::Invalid`] and are skipped; they never abort the tool.

pub mod itanium;
pub mod msvc;

pub use itanium::ItaniumClassifier;
pub use msvc::MsvcClassifier;

/// What a function symbol turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// Empty input or parse failure.
    Invalid,
    Constructor,
    Destructor,
    /// Recognized but not interesting (vtables, typeinfo, operators).
    Other,
    /// Free functions, data, plain methods.
    Ignorable,
}

/// The useful features found in a function symbol.
///
/// The base (class) name is stored as the last element of `scope_names`,
/// with a flag denoting its role; `scope_names` as a whole is the full
/// qualified name the matcher runs patterns against.
#[derive(Debug, Clone)]
pub struct SymbolFeatures {
    pub scope_names: Vec<String>,
    pub kind: SymbolKind,
    /// The Itanium ABI letter variant for structors: `0` marks a deleting
    /// destructor and is excluded from matching. `-1` when inapplicable.
    pub variant: i32,
    has_base: bool,
}

impl Default for SymbolFeatures {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolFeatures {
    pub fn new() -> Self {
        Self {
            scope_names: Vec::new(),
            kind: SymbolKind::Invalid,
            variant: -1,
            has_base: false,
        }
    }

    pub fn clear(&mut self) {
        self.scope_names.clear();
        self.kind = SymbolKind::Invalid;
        self.variant = -1;
        self.has_base = false;
    }

    /// Appends an enclosing scope name. Ignored once the base is set.
    pub fn add_scope(&mut self, name: impl Into<String>) {
        if !self.has_base {
            self.scope_names.push(name.into());
        }
    }

    /// Sets the unqualified base name, replacing a previously set one.
    pub fn set_base(&mut self, name: impl Into<String>) {
        if self.has_base {
            self.scope_names.pop();
        }
        self.scope_names.push(name.into());
        self.has_base = true;
    }

    /// The unqualified base name, when one was extracted.
    pub fn base_name(&self) -> Option<&str> {
        if self.has_base {
            self.scope_names.last().map(String::as_str)
        } else {
            None
        }
    }

    pub fn is_ctor(&self) -> bool {
        self.kind == SymbolKind::Constructor
    }

    pub fn is_dtor(&self) -> bool {
        self.kind == SymbolKind::Destructor
    }

    pub fn is_ctor_dtor(&self) -> bool {
        self.is_ctor() || self.is_dtor()
    }

    pub fn is_other(&self) -> bool {
        self.kind == SymbolKind::Other
    }

    pub fn is_ignorable(&self) -> bool {
        self.kind == SymbolKind::Ignorable
    }

    pub fn is_invalid(&self) -> bool {
        self.kind == SymbolKind::Invalid
    }
}

/// Classifies mangled symbols into [`SymbolFeatures`].
pub trait Classifier {
    /// Clears `out`, classifies `mangled`, and fills `out` for symbols in
    /// the constructor/destructor family.
    fn classify(&mut self, mangled: &str, out: &mut SymbolFeatures) -> SymbolKind;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_is_last_scope_element() {
        let mut features = SymbolFeatures::new();
        features.add_scope("cocos2d");
        features.add_scope("CCLightning");
        features.set_base("CCLightning");
        assert_eq!(
            features.scope_names,
            ["cocos2d", "CCLightning", "CCLightning"]
        );
        assert_eq!(features.base_name(), Some("CCLightning"));
    }

    #[test]
    fn set_base_replaces_prior_base() {
        let mut features = SymbolFeatures::new();
        features.set_base("A");
        features.set_base("B");
        assert_eq!(features.scope_names, ["B"]);
    }

    #[test]
    fn scopes_after_base_are_ignored() {
        let mut features = SymbolFeatures::new();
        features.set_base("A");
        features.add_scope("ns");
        assert_eq!(features.scope_names, ["A"]);
    }

    #[test]
    fn clear_resets_everything() {
        let mut features = SymbolFeatures::new();
        features.add_scope("x");
        features.set_base("Y");
        features.kind = SymbolKind::Constructor;
        features.variant = 2;
        features.clear();
        assert!(features.scope_names.is_empty());
        assert!(features.is_invalid());
        assert_eq!(features.variant, -1);
        assert_eq!(features.base_name(), None);
    }
}
