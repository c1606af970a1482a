// This module builds the runtime pattern tree out of the lexer's token
// stream. Tokens are first grouped into scope segments: a leading `**` glob
// is absorbed into the group that follows it, and a compound head token
// (nonzero trailing count) always forms its own replacement group. Dispatch
// then runs on the glob count: zero globs build Simple/SingleSequence/
// AnySequence shapes, one glob builds a LeadingGlob or ButterflyGlob around
// recursively compiled halves, and more than one glob is rejected outright.
// Replacement groups and late-bind property segments wire fresh replacers
// into the matcher's replacer list as they compile.

//! The pattern compiler: token groups to [`PatternNode`] trees.

use std::cell::Cell;

use bumpalo::Bump;

use super::error::{PatternError, PatternResult};
use super::pattern::{PatternNode, RegexTable};
use super::replacer::{ReplaceTarget, Replacer};
use super::token::{Token, TokenKind};

/// A contiguous slice of tokens forming one scope-segment group.
#[derive(Clone, Copy)]
struct TokenGroup<'toks, 'arena> {
    toks: &'toks [Token<'arena>],
    /// Every token is a literal (`Simple` or `Anonymous`).
    all_simple: bool,
    /// The group is a compound head plus its trailing arguments.
    replacement: bool,
    /// A `**` directly preceded (and was consumed into) this group.
    leading_glob: bool,
}

/// Builds pattern nodes in the matcher's arena, threading new regex slots
/// and replacers back into the matcher's tables.
pub(crate) struct PatternCompiler<'m, 'arena> {
    pub arena: &'arena Bump,
    pub regexes: &'m mut RegexTable,
    pub replacers: &'m mut Vec<Replacer<'arena>>,
    /// The raw pattern text, for diagnostics.
    pub pattern: &'arena str,
}

impl<'m, 'arena> PatternCompiler<'m, 'arena> {
    /// Compiles a lexed token stream into a pattern tree.
    pub fn compile(&mut self, toks: &[Token<'arena>]) -> PatternResult<&'arena PatternNode<'arena>> {
        let (groups, globs) = self.split_into_groups(toks)?;
        match globs {
            0 => self.compile_no_globs(&groups),
            1 => self.compile_one_glob(&groups),
            globs => Err(PatternError::MultiGlobNotImplemented {
                pattern: self.pattern.to_string(),
                globs,
            }),
        }
    }

    /// Splits tokens into scope-segment groups, counting globs.
    fn split_into_groups<'toks>(
        &self,
        toks: &'toks [Token<'arena>],
    ) -> PatternResult<(Vec<TokenGroup<'toks, 'arena>>, usize)> {
        let mut groups = Vec::new();
        let mut globs = 0usize;
        let mut i = 0;
        while i < toks.len() {
            let mut leading_glob = false;
            if toks[i].kind == TokenKind::Glob {
                globs += 1;
                leading_glob = true;
                i += 1;
                if i >= toks.len() {
                    return Err(self.report("glob found at end of pattern"));
                }
                if toks[i].kind == TokenKind::Glob {
                    return Err(self.report("sequential globs not coalesced"));
                }
            }

            let start = i;
            // A compound head and its arguments are always their own group.
            if toks[i].trailing > 0 {
                let count = 1 + toks[i].trailing as usize;
                if start + count > toks.len() {
                    return Err(self.report("compound group missing trailing arguments"));
                }
                i = start + count;
                groups.push(TokenGroup {
                    toks: &toks[start..i],
                    all_simple: false,
                    replacement: true,
                    leading_glob,
                });
                continue;
            }

            let mut all_simple = true;
            while i < toks.len() && toks[i].kind != TokenKind::Glob && toks[i].trailing == 0 {
                if !toks[i].is_literal() {
                    all_simple = false;
                }
                i += 1;
            }
            if i == start {
                return Err(self.report("found empty group"));
            }
            groups.push(TokenGroup {
                toks: &toks[start..i],
                all_simple,
                replacement: false,
                leading_glob,
            });
        }

        if groups.is_empty() {
            return Err(self.report("found no groups"));
        }
        Ok((groups, globs))
    }

    /// Compiles groups with no glob among them.
    fn compile_no_globs(
        &mut self,
        groups: &[TokenGroup<'_, 'arena>],
    ) -> PatternResult<&'arena PatternNode<'arena>> {
        if groups.len() == 1 {
            return self.make_dispatch(&groups[0]);
        }
        let mut items = Vec::with_capacity(groups.len());
        let mut required = 0u32;
        for group in groups {
            let node = self.make_dispatch(group)?;
            required += node.required_count();
            items.push(node);
        }
        let items = &*self.arena.alloc_slice_copy(&items);
        Ok(self.arena.alloc(PatternNode::AnySequence { items, required }))
    }

    /// Compiles a pattern with exactly one glob.
    fn compile_one_glob(
        &mut self,
        groups: &[TokenGroup<'_, 'arena>],
    ) -> PatternResult<&'arena PatternNode<'arena>> {
        if groups[0].leading_glob {
            let tail = self.compile_no_globs(groups)?;
            let trailing = self.wrap(tail);
            return Ok(self.arena.alloc(PatternNode::LeadingGlob { trailing }));
        }

        let split = groups
            .iter()
            .position(|g| g.leading_glob)
            .ok_or_else(|| self.report("glob group not found"))?;
        let (leading_groups, trailing_groups) = groups.split_at(split);

        let leading = if leading_groups.len() == 1 && leading_groups[0].all_simple {
            // A simple prefix validates itself against the full name list.
            let parts = self.literal_parts(&leading_groups[0]);
            &*self.arena.alloc(PatternNode::LeadingSimple { parts })
        } else {
            let node = self.compile_no_globs(leading_groups)?;
            self.wrap(node)
        };
        let node = self.compile_no_globs(trailing_groups)?;
        let trailing = self.wrap(node);
        Ok(self
            .arena
            .alloc(PatternNode::ButterflyGlob { leading, trailing }))
    }

    /// Creates the right node for one group.
    fn make_dispatch(
        &mut self,
        group: &TokenGroup<'_, 'arena>,
    ) -> PatternResult<&'arena PatternNode<'arena>> {
        if group.all_simple {
            Ok(self.make_simple(group))
        } else if group.replacement {
            self.make_replacement(group)
        } else {
            self.make_single_sequence(group)
        }
    }

    fn literal_parts(&self, group: &TokenGroup<'_, 'arena>) -> &'arena [&'arena str] {
        let parts: Vec<&'arena str> = group.toks.iter().map(|t| t.text).collect();
        self.arena.alloc_slice_copy(&parts)
    }

    fn make_simple(&self, group: &TokenGroup<'_, 'arena>) -> &'arena PatternNode<'arena> {
        debug_assert!(group.all_simple);
        let parts = self.literal_parts(group);
        self.arena.alloc(PatternNode::Simple { parts })
    }

    fn make_single_sequence(
        &mut self,
        group: &TokenGroup<'_, 'arena>,
    ) -> PatternResult<&'arena PatternNode<'arena>> {
        let mut items: Vec<&'arena PatternNode<'arena>> = Vec::with_capacity(group.toks.len());
        for tok in group.toks {
            let item: &'arena PatternNode<'arena> = match tok.kind {
                TokenKind::Simple | TokenKind::Anonymous => self.arena.alloc(PatternNode::Solo {
                    text: Cell::new(tok.text),
                }),
                TokenKind::Regex => {
                    let slot = self.regexes.alloc();
                    self.regexes.compile(slot, tok.text)?;
                    self.arena.alloc(PatternNode::Regex { slot })
                }
                TokenKind::LateBind | TokenKind::This => {
                    let node = &*self.arena.alloc(PatternNode::Solo {
                        text: Cell::new(""),
                    });
                    self.replacers
                        .push(Replacer::from_property(*tok, ReplaceTarget::Solo(node)));
                    node
                }
                _ => return Err(self.report("unexpected token in sequence group")),
            };
            items.push(item);
        }
        if items.len() == 1 {
            return Ok(items[0]);
        }
        let items = &*self.arena.alloc_slice_copy(&items);
        Ok(self.arena.alloc(PatternNode::SingleSequence { items }))
    }

    /// Builds the leaf for a compound replacement group and wires up its
    /// replacer.
    fn make_replacement(
        &mut self,
        group: &TokenGroup<'_, 'arena>,
    ) -> PatternResult<&'arena PatternNode<'arena>> {
        debug_assert!(group.replacement);
        match group.toks[0].kind {
            TokenKind::SimpleFmt => {
                let node = &*self.arena.alloc(PatternNode::Solo {
                    text: Cell::new(""),
                });
                self.replacers
                    .push(Replacer::from_group(group.toks, ReplaceTarget::Solo(node)));
                Ok(node)
            }
            TokenKind::RegexFmt => {
                // Placeholder slot; the first rebind compiles it.
                let slot = self.regexes.alloc();
                let node = &*self.arena.alloc(PatternNode::Regex { slot });
                self.replacers
                    .push(Replacer::from_group(group.toks, ReplaceTarget::Regex(slot)));
                Ok(node)
            }
            _ => Err(self.report("invalid replacement group head")),
        }
    }

    /// Lifts single-kind nodes into the multi interface.
    fn wrap(&self, node: &'arena PatternNode<'arena>) -> &'arena PatternNode<'arena> {
        if node.is_single() {
            self.arena.alloc(PatternNode::Forwarding { inner: node })
        } else {
            node
        }
    }

    fn report(&self, detail: &str) -> PatternError {
        PatternError::BadScope {
            pattern: self.pattern.to_string(),
            detail: detail.to_string(),
        }
    }
}
