//! Late-bind replacers.
//!
//! A replacer owns a mini-template of literal and hole pieces parsed from a
//! compound head token and its trailing arguments. When the matcher installs
//! a new filename, every replacer rebuilds its text from the file-property
//! cache and pushes it into its target leaf: `Solo` leaves get their text
//! cell rewritten, `Regex` leaves get their slot recompiled.

use bumpalo::Bump;

use super::error::{PatternError, PatternResult};
use super::file_props::{FileProp, FilePropertyCache};
use super::pattern::{PatternNode, RegexSlot, RegexTable};
use super::token::{Token, TokenKind};

/// One piece of a replacer template.
#[derive(Debug)]
enum Piece<'arena> {
    Lit(&'arena str),
    /// A `{file.*}` hole, filled from the current input file.
    File(FileProp),
    /// A `{this.*}` hole left over from lexing without a config context.
    /// Rejected when a rebind first touches it.
    This,
}

/// Where a replacer writes its rebuilt text.
pub enum ReplaceTarget<'arena> {
    /// Rewrites the text cell of a `Solo` leaf.
    Solo(&'arena PatternNode<'arena>),
    /// Recompiles a regex slot.
    Regex(RegexSlot),
}

/// A late-bind template attached to one pattern leaf.
pub struct Replacer<'arena> {
    pieces: Vec<Piece<'arena>>,
    target: ReplaceTarget<'arena>,
}

impl<'arena> Replacer<'arena> {
    /// Builds a replacer from a compound group: the head token plus exactly
    /// `head.trailing` argument tokens.
    pub fn from_group(toks: &[Token<'arena>], target: ReplaceTarget<'arena>) -> Self {
        debug_assert!(!toks.is_empty());
        debug_assert_eq!(toks[0].trailing as usize, toks.len() - 1);
        Self {
            pieces: parse_template(toks[0].text, &toks[1..]),
            target,
        }
    }

    /// Builds a replacer for a standalone `{file.*}` or `{this.*}` scope
    /// segment.
    pub fn from_property(tok: Token<'arena>, target: ReplaceTarget<'arena>) -> Self {
        Self {
            pieces: vec![piece_for(tok)],
            target,
        }
    }

    /// Rebuilds the target text from `cache`.
    pub fn replace(
        &self,
        cache: &mut FilePropertyCache,
        arena: &'arena Bump,
        regexes: &mut RegexTable,
    ) -> PatternResult<()> {
        let is_regex = matches!(self.target, ReplaceTarget::Regex(_));
        let mut built = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Lit(lit) => built.push_str(lit),
                Piece::File(prop) => {
                    let value = cache.property(*prop);
                    if is_regex {
                        // Grouped, so a following quantifier binds to the
                        // whole substituted value.
                        built.push('(');
                        built.push_str(value);
                        built.push(')');
                    } else {
                        built.push_str(value);
                    }
                }
                Piece::This => return Err(PatternError::ThisOutsideConfig),
            }
        }

        match &self.target {
            ReplaceTarget::Solo(node) => {
                if let PatternNode::Solo { text } = node {
                    text.set(arena.alloc_str(&built));
                }
                Ok(())
            }
            ReplaceTarget::Regex(slot) => regexes.compile(*slot, &built),
        }
    }
}

fn piece_for<'arena>(tok: Token<'arena>) -> Piece<'arena> {
    match tok.kind {
        TokenKind::This => Piece::This,
        // The token text is the canonical member name.
        _ => Piece::File(FileProp::from_member(tok.text).unwrap_or(FileProp::Whole)),
    }
}

/// Splits a head-token template into literal pieces and `{n}` holes.
fn parse_template<'arena>(
    head: &'arena str,
    trailing: &[Token<'arena>],
) -> Vec<Piece<'arena>> {
    let mut pieces = Vec::new();
    let mut rest = head;
    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}').map(|off| open + off) else {
            break;
        };
        if open > 0 {
            pieces.push(Piece::Lit(&rest[..open]));
        }
        match rest[open + 1..close].parse::<usize>() {
            Ok(index) if index < trailing.len() => pieces.push(piece_for(trailing[index])),
            // Not one of ours; keep the braces literal.
            _ => pieces.push(Piece::Lit(&rest[open..=close])),
        }
        rest = &rest[close + 1..];
    }
    if !rest.is_empty() {
        pieces.push(Piece::Lit(rest));
    }
    pieces
}
