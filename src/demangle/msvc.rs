//! Microsoft ABI symbol classification.
//!
//! Parses the qualified-name half of an MSVC decorated name: `??0`/`??1`
//! mark constructors and destructors, whose qualifier list runs inner to
//! outer up to the `@@` terminator. Other `??`-operators and `??_`-special
//! names (vftables, scalar deleting destructors) classify as Other; plain
//! `?name@...` symbols as Ignorable. Template components and nested
//! qualified names fall outside the subset and classify as Invalid, which
//! the matcher skips.

use crate::core::character::is_identifier;

use super::{Classifier, SymbolFeatures, SymbolKind};

/// Classifies symbols from the Microsoft ABI.
#[derive(Debug, Default)]
pub struct MsvcClassifier;

impl Classifier for MsvcClassifier {
    fn classify(&mut self, mangled: &str, out: &mut SymbolFeatures) -> SymbolKind {
        out.clear();
        let kind = classify_impl(mangled, out);
        if kind != SymbolKind::Constructor && kind != SymbolKind::Destructor {
            out.clear();
        }
        out.kind = kind;
        kind
    }
}

fn classify_impl(mangled: &str, out: &mut SymbolFeatures) -> SymbolKind {
    if mangled.is_empty() {
        return SymbolKind::Invalid;
    }
    if let Some(operator) = mangled.strip_prefix("??") {
        return match operator.bytes().next() {
            Some(b'0') => classify_structor(&operator[1..], false, out),
            Some(b'1') => classify_structor(&operator[1..], true, out),
            // `??_7` vftables, `??_G`/`??_E` deleting destructors, and the
            // rest of the special/intrinsic family.
            Some(b'_') => SymbolKind::Other,
            // Other operators (`??4` operator=, `??H` operator+, ...).
            Some(_) => SymbolKind::Other,
            None => SymbolKind::Invalid,
        };
    }
    if let Some(name) = mangled.strip_prefix('?') {
        // Plain named functions and data are never rewritten.
        if name.is_empty() {
            return SymbolKind::Invalid;
        }
        return SymbolKind::Ignorable;
    }
    SymbolKind::Invalid
}

/// Extracts features from the qualifier list of a structor symbol.
fn classify_structor(rest: &str, is_dtor: bool, out: &mut SymbolFeatures) -> SymbolKind {
    let Some(qual_end) = rest.find("@@") else {
        return SymbolKind::Invalid;
    };
    let quals = &rest[..qual_end];
    if quals.is_empty() {
        return SymbolKind::Invalid;
    }

    // Components run inner to outer; the first is the class itself.
    let mut components: Vec<&str> = Vec::new();
    for component in quals.split('@') {
        if component.is_empty() {
            return SymbolKind::Invalid;
        }
        if component.starts_with("?A") {
            components.push("@");
            continue;
        }
        if component.starts_with('?') || !is_identifier(component) {
            // Templates (`?$`), nested names, and anything else exotic.
            return SymbolKind::Invalid;
        }
        components.push(component);
    }

    let base = components[0];
    for component in components.iter().rev() {
        out.add_scope(*component);
    }
    out.set_base(base);
    if is_dtor {
        SymbolKind::Destructor
    } else {
        SymbolKind::Constructor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(sym: &str) -> (SymbolKind, SymbolFeatures) {
        let mut features = SymbolFeatures::new();
        let kind = MsvcClassifier.classify(sym, &mut features);
        (kind, features)
    }

    #[test]
    fn constructor() {
        let (kind, features) = classify("??0CCLightning@cocos2d@@QEAA@XZ");
        assert_eq!(kind, SymbolKind::Constructor);
        assert_eq!(
            features.scope_names,
            ["cocos2d", "CCLightning", "CCLightning"]
        );
        assert_eq!(features.base_name(), Some("CCLightning"));
        // Variant tags are an Itanium concept; never zero here so msvc
        // structors stay admissible.
        assert_eq!(features.variant, -1);
    }

    #[test]
    fn destructor() {
        let (kind, features) = classify("??1CCLightning@cocos2d@@QEAA@XZ");
        assert_eq!(kind, SymbolKind::Destructor);
        assert_eq!(
            features.scope_names,
            ["cocos2d", "CCLightning", "CCLightning"]
        );
    }

    #[test]
    fn global_scope_structor() {
        let (kind, features) = classify("??0Widget@@QAE@XZ");
        assert_eq!(kind, SymbolKind::Constructor);
        assert_eq!(features.scope_names, ["Widget", "Widget"]);
    }

    #[test]
    fn deep_scopes_reverse_to_outer_first() {
        let (kind, features) = classify("??1Impl@detail@engine@@QEAA@XZ");
        assert_eq!(kind, SymbolKind::Destructor);
        assert_eq!(features.scope_names, ["engine", "detail", "Impl", "Impl"]);
    }

    #[test]
    fn anonymous_namespace_canonicalizes() {
        let (kind, features) = classify("??0Hidden@?A0x12345678@@QEAA@XZ");
        assert_eq!(kind, SymbolKind::Constructor);
        assert_eq!(features.scope_names, ["@", "Hidden", "Hidden"]);
    }

    #[test]
    fn special_names_are_other() {
        assert_eq!(classify("??_7type_info@@6B@").0, SymbolKind::Other);
        // Scalar deleting destructor is an intrinsic, not a structor.
        assert_eq!(classify("??_GCCLightning@@UEAAPEAXI@Z").0, SymbolKind::Other);
        assert_eq!(classify("??4Foo@@QEAAAEAV0@AEBV0@@Z").0, SymbolKind::Other);
    }

    #[test]
    fn plain_names_are_ignorable() {
        assert_eq!(classify("?update@CCScheduler@cocos2d@@QEAAXM@Z").0, SymbolKind::Ignorable);
        assert_eq!(classify("?count@@3HA").0, SymbolKind::Ignorable);
    }

    #[test]
    fn invalid_inputs() {
        assert_eq!(classify("").0, SymbolKind::Invalid);
        assert_eq!(classify("main").0, SymbolKind::Invalid);
        assert_eq!(classify("_ZN1AC1Ev").0, SymbolKind::Invalid);
        assert_eq!(classify("?").0, SymbolKind::Invalid);
        // Unterminated qualifier list.
        assert_eq!(classify("??0Foo").0, SymbolKind::Invalid);
        // Template class is out of subset.
        assert_eq!(classify("??0?$vector@H@std@@QEAA@XZ").0, SymbolKind::Invalid);
    }
}
