// This back end classifies Itanium-mangled symbols without demangling them
// to text. Only the shapes the matcher cares about are parsed: `_ZN...E`
// nested names whose final component is a C1/C2/C3 or D0/D1/D2 structor
// marker. Special names (`_ZT*`, `_ZG*`) classify as Other, bare and
// std-qualified names as Ignorable, and anything outside the subset
// (template scopes, substitutions, exotic components) as Invalid, which
// the matcher treats as "skip", never as an abort. Parsing the encoding
// directly is what preserves the structor variant digit; a text demangle
// collapses D0/D1/D2 into the same `~T()` spelling.

//! Itanium ABI symbol classification.

use super::{Classifier, SymbolFeatures, SymbolKind};

/// Classifies symbols from the Itanium ABI.
#[derive(Debug, Default)]
pub struct ItaniumClassifier;

impl Classifier for ItaniumClassifier {
    fn classify(&mut self, mangled: &str, out: &mut SymbolFeatures) -> SymbolKind {
        out.clear();
        let kind = classify_impl(mangled, out);
        if kind != SymbolKind::Constructor && kind != SymbolKind::Destructor {
            // Features are only meaningful for structors.
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
    let Some(rest) = mangled.strip_prefix("_Z") else {
        return SymbolKind::Invalid;
    };
    match rest.bytes().next() {
        // Nested name, the only shape that can hold a structor.
        Some(b'N') => classify_nested(&rest[1..], out),
        // Special names: vtables, typeinfo, guard variables, thunks.
        Some(b'T') | Some(b'G') => SymbolKind::Other,
        // Bare (possibly internal-linkage) names: free functions and data.
        Some(b'0'..=b'9') | Some(b'L') => SymbolKind::Ignorable,
        // `St`-qualified and substituted names; never user structors.
        Some(b'S') => SymbolKind::Ignorable,
        _ => SymbolKind::Invalid,
    }
}

/// Walks the component list of a `N ... E` nested name.
fn classify_nested(encoding: &str, out: &mut SymbolFeatures) -> SymbolKind {
    let bytes = encoding.as_bytes();
    let mut pos = 0;

    // CV and reference qualifiers on the function itself.
    while matches!(bytes.get(pos).copied(), Some(b'r' | b'V' | b'K')) {
        pos += 1;
    }
    if matches!(bytes.get(pos).copied(), Some(b'R' | b'O')) {
        pos += 1;
    }

    let mut scopes: Vec<&str> = Vec::new();
    loop {
        match bytes.get(pos).copied() {
            None => return SymbolKind::Invalid,
            Some(b'E') => {
                // A nested name whose inner component is not a structor.
                return SymbolKind::Ignorable;
            }
            Some(b'0'..=b'9') => {
                let Some((name, next)) = parse_source_name(encoding, pos) else {
                    return SymbolKind::Invalid;
                };
                scopes.push(canonical_scope(name));
                pos = next;
            }
            Some(b'S') => {
                // Only the `St` (std) abbreviation is in-subset; numbered
                // substitutions cannot be resolved without full state.
                if bytes.get(pos + 1).copied() == Some(b't') {
                    scopes.push("std");
                    pos += 2;
                } else {
                    return SymbolKind::Invalid;
                }
            }
            // Internal-linkage marker before a member name.
            Some(b'L') => pos += 1,
            Some(b'C') => {
                let variant = match bytes.get(pos + 1).copied() {
                    Some(d @ b'1'..=b'3') => (d - b'0') as i32,
                    _ => return SymbolKind::Invalid,
                };
                return finish_structor(&scopes, bytes.get(pos + 2).copied(), variant, false, out);
            }
            Some(b'D') => {
                let variant = match bytes.get(pos + 1).copied() {
                    Some(d @ b'0'..=b'2') => (d - b'0') as i32,
                    _ => return SymbolKind::Invalid,
                };
                return finish_structor(&scopes, bytes.get(pos + 2).copied(), variant, true, out);
            }
            // Template scopes are outside the supported subset.
            Some(b'I') => return SymbolKind::Invalid,
            // Two-letter operator codes terminate non-structor members.
            Some(c) if c.is_ascii_lowercase() => return SymbolKind::Ignorable,
            Some(_) => return SymbolKind::Invalid,
        }
    }
}

fn finish_structor(
    scopes: &[&str],
    after: Option<u8>,
    variant: i32,
    is_dtor: bool,
    out: &mut SymbolFeatures,
) -> SymbolKind {
    // The marker must close the nested name, and it needs a class to name.
    if after != Some(b'E') {
        return SymbolKind::Invalid;
    }
    let Some(&base) = scopes.last() else {
        return SymbolKind::Invalid;
    };
    for scope in scopes {
        out.add_scope(*scope);
    }
    out.set_base(base);
    out.variant = variant;
    if is_dtor {
        SymbolKind::Destructor
    } else {
        SymbolKind::Constructor
    }
}

/// Parses a length-prefixed source name at `pos`.
fn parse_source_name(encoding: &str, pos: usize) -> Option<(&str, usize)> {
    let bytes = encoding.as_bytes();
    let mut len = 0usize;
    let mut at = pos;
    while let Some(d) = bytes.get(at).copied().filter(|b| b.is_ascii_digit()) {
        len = len.checked_mul(10)?.checked_add((d - b'0') as usize)?;
        at += 1;
    }
    if len == 0 {
        return None;
    }
    let name = encoding.get(at..at + len)?;
    Some((name, at + len))
}

/// Maps the mangled anonymous-namespace name onto the `@` marker patterns
/// compare against.
fn canonical_scope(name: &str) -> &str {
    if name == "_GLOBAL__N_1" {
        "@"
    } else {
        name
    }
}
