//! The runtime pattern tree.
//!
//! Compiled patterns form a tree of [`PatternNode`]s allocated in the
//! matcher's arena. The structure is immutable after compilation; the only
//! mutation is the coordinated rebind on `set_filename`, which rewrites
//! `Solo` leaf text (a [`Cell`]) and recompiles regex slots held in the
//! matcher-owned [`RegexTable`]. Keeping compiled regexes out of the bump
//! arena lets their destructors run when the matcher is torn down.

use std::cell::Cell;
use std::fmt;

use super::error::{PatternError, PatternResult};

/// Marks a node as having a variable scope count.
pub const VARIABLE_COUNT: u32 = u32::MAX;

/// Index of a compiled regex in the matcher's [`RegexTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegexSlot(pub(crate) u32);

/// Owns the compiled regex state for every `Regex` leaf of a matcher.
///
/// A slot holding `None` is a placeholder awaiting late-bind substitution;
/// it matches nothing until a replacer fills it.
#[derive(Default)]
pub struct RegexTable {
    slots: Vec<Option<regex::Regex>>,
}

impl RegexTable {
    /// Reserves an empty slot.
    pub fn alloc(&mut self) -> RegexSlot {
        self.slots.push(None);
        RegexSlot(self.slots.len() as u32 - 1)
    }

    /// Compiles `text` anchored to the whole name and stores it in `slot`.
    pub fn compile(&mut self, slot: RegexSlot, text: &str) -> PatternResult<()> {
        let anchored = format!("^(?:{text})$");
        let compiled = regex::Regex::new(&anchored).map_err(|source| {
            PatternError::RegexCompile {
                segment: text.to_string(),
                source,
            }
        })?;
        self.slots[slot.0 as usize] = Some(compiled);
        Ok(())
    }

    pub fn get(&self, slot: RegexSlot) -> Option<&regex::Regex> {
        self.slots.get(slot.0 as usize).and_then(|s| s.as_ref())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// One node of a compiled pattern.
///
/// Single-kind nodes (`Solo`, `Regex`) match exactly one scope name; every
/// other variant consumes a fixed number of names, except the glob variants
/// whose count is [`VARIABLE_COUNT`]. Globs never nest.
#[derive(Debug)]
pub enum PatternNode<'arena> {
    /// An exact scope list, eg. `::x::y::Z`.
    Simple { parts: &'arena [&'arena str] },
    /// A fixed prefix of a longer scope list; only ever the leading half of
    /// a [`PatternNode::ButterflyGlob`].
    LeadingSimple { parts: &'arena [&'arena str] },
    /// One single-kind node per scope name.
    SingleSequence {
        items: &'arena [&'arena PatternNode<'arena>],
    },
    /// Mixed fixed-width children, concatenated.
    AnySequence {
        items: &'arena [&'arena PatternNode<'arena>],
        required: u32,
    },
    /// Lifts a single-kind node into the multi interface.
    Forwarding { inner: &'arena PatternNode<'arena> },
    /// `**::y::Z`: any non-empty prefix, then `trailing` matches the tail.
    LeadingGlob { trailing: &'arena PatternNode<'arena> },
    /// `x::**::Z`: fixed prefix and suffix, anything between.
    ButterflyGlob {
        leading: &'arena PatternNode<'arena>,
        trailing: &'arena PatternNode<'arena>,
    },
    /// One scope name, compared literally. The text cell is rewritten by
    /// late-bind replacers.
    Solo { text: Cell<&'arena str> },
    /// One scope name, matched by a compiled regex.
    Regex { slot: RegexSlot },
}

impl<'arena> PatternNode<'arena> {
    /// Returns true for nodes matching exactly one name by themselves.
    pub fn is_single(&self) -> bool {
        matches!(self, PatternNode::Solo { .. } | PatternNode::Regex { .. })
    }

    /// The static count of scope names this node consumes, or
    /// [`VARIABLE_COUNT`] for globs.
    pub fn count(&self) -> u32 {
        match self {
            PatternNode::Simple { parts } | PatternNode::LeadingSimple { parts } => {
                parts.len() as u32
            }
            PatternNode::SingleSequence { items } => items.len() as u32,
            PatternNode::AnySequence { required, .. } => *required,
            PatternNode::Forwarding { .. } => 1,
            PatternNode::LeadingGlob { .. } | PatternNode::ButterflyGlob { .. } => VARIABLE_COUNT,
            PatternNode::Solo { .. } | PatternNode::Regex { .. } => 1,
        }
    }

    /// The minimum number of scope names required to match.
    pub fn required_count(&self) -> u32 {
        match self {
            PatternNode::LeadingGlob { trailing } => trailing.required_count(),
            PatternNode::ButterflyGlob { leading, trailing } => {
                leading.required_count() + trailing.required_count()
            }
            _ => self.count(),
        }
    }

    /// Dispatches to kind-specific matching over a full scope-name list.
    pub fn match_symbol(&self, names: &[String], regexes: &RegexTable) -> bool {
        if names.is_empty() {
            return false;
        }
        if self.is_single() {
            return names.len() == 1 && self.match_one(&names[0], regexes);
        }
        self.match_names(names, regexes)
    }

    /// Matches a multi-kind node against a (possibly sliced) name list.
    fn match_names(&self, names: &[String], regexes: &RegexTable) -> bool {
        match self {
            PatternNode::Simple { parts } => {
                parts.len() == names.len()
                    && parts
                        .iter()
                        .zip(names)
                        .all(|(part, name)| *part == name.as_str())
            }
            PatternNode::LeadingSimple { parts } => {
                names.len() > parts.len()
                    && parts
                        .iter()
                        .zip(names)
                        .all(|(part, name)| *part == name.as_str())
            }
            PatternNode::SingleSequence { items } => {
                items.len() == names.len()
                    && items
                        .iter()
                        .zip(names)
                        .all(|(item, name)| item.match_one(name, regexes))
            }
            PatternNode::AnySequence { items, required } => {
                if names.len() as u32 != *required {
                    return false;
                }
                let mut rest = names;
                for item in *items {
                    if item.is_single() {
                        if !item.match_one(&rest[0], regexes) {
                            return false;
                        }
                        rest = &rest[1..];
                    } else {
                        let n = item.required_count() as usize;
                        if !item.match_names(&rest[..n], regexes) {
                            return false;
                        }
                        rest = &rest[n..];
                    }
                }
                rest.is_empty()
            }
            PatternNode::Forwarding { inner } => {
                names.len() == 1 && inner.match_one(&names[0], regexes)
            }
            PatternNode::LeadingGlob { trailing } => {
                let count = trailing.required_count() as usize;
                // The glob must consume at least one leading scope.
                if names.len() <= count {
                    return false;
                }
                trailing.match_names(&names[names.len() - count..], regexes)
            }
            PatternNode::ButterflyGlob { leading, trailing } => {
                let leading_count = leading.required_count() as usize;
                let trailing_count = trailing.required_count() as usize;
                if names.len() < leading_count + trailing_count {
                    return false;
                }
                // A leading-prefix node validates the full list itself.
                let leading_ok = match leading {
                    PatternNode::LeadingSimple { .. } => leading.match_names(names, regexes),
                    _ => leading.match_names(&names[..leading_count], regexes),
                };
                leading_ok && trailing.match_names(&names[names.len() - trailing_count..], regexes)
            }
            PatternNode::Solo { .. } | PatternNode::Regex { .. } => {
                names.len() == 1 && self.match_one(&names[0], regexes)
            }
        }
    }

    /// Matches a single-kind node against one name. The whole name must
    /// match; there are no partial matches.
    fn match_one(&self, name: &str, regexes: &RegexTable) -> bool {
        match self {
            PatternNode::Solo { text } => {
                let text = text.get();
                !text.is_empty() && text == name
            }
            PatternNode::Regex { slot } => match regexes.get(*slot) {
                Some(re) => re.is_match(name),
                // Placeholder awaiting late-bind substitution.
                None => false,
            },
            _ => false,
        }
    }
}

impl fmt::Display for PatternNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternNode::Simple { parts } | PatternNode::LeadingSimple { parts } => {
                write!(f, "{}", parts.join("::"))
            }
            PatternNode::SingleSequence { items } | PatternNode::AnySequence { items, .. } => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, "::")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            PatternNode::Forwarding { inner } => write!(f, "{inner}"),
            PatternNode::LeadingGlob { trailing } => write!(f, "**::{trailing}"),
            PatternNode::ButterflyGlob { leading, trailing } => {
                write!(f, "{leading}::**::{trailing}")
            }
            PatternNode::Solo { text } => write!(f, "{}", text.get()),
            PatternNode::Regex { .. } => write!(f, "/REGEX/"),
        }
    }
}
