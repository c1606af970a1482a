// This module turns a pattern string into the flat token stream the compiler
// consumes. The entry point trims the input, strips one leading `::`, then
// walks `::`-separated segments: plain identifiers and the standalone `@`/`**`
// markers are classified directly, `{obj.member}` segments become replacement
// tokens, and everything else is handed to the compound sub-lexer, which
// re-lexes the segment character by character into the restricted regex
// flavor (identifier bytes, quantifiers, character classes, escapes, embedded
// replacements). Compound segments emit one head token whose text is the
// rewritten regex/format string plus one trailing token per distinct
// replacement, in insertion order. Sequential `**` segments coalesce into a
// single glob token.

//! The pattern lexer.
//!
//! See [`lex_pattern`] for the entry point. Token layout and the regex
//! subset are described on [`Token`] and in the crate docs.

use bumpalo::Bump;

use super::character::{identify, is_identifier, is_identifier_byte, CharKind};
use super::error::{PatternError, PatternResult};
use super::file_props::{FileProp, FilePropertyCache};
use super::token::{Token, TokenKind, MAX_TRAILING};

/// The replacement object named before the `.` in `{obj.member}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReplObject {
    /// `this` / `self`: the configuration file.
    This,
    /// `file` / `input`: the current input module, bound late.
    LateBind,
}

/// Splits a replacement body into its object and member parts.
fn classify_replacement(body: &str) -> PatternResult<(ReplObject, FileProp)> {
    let body = body.trim();
    if body.is_empty() {
        return Err(PatternError::UnknownReplacementObject {
            object: body.to_string(),
        });
    }
    let (object, member) = match body.split_once('.') {
        Some((object, member)) => (object.trim_end(), member.trim_start()),
        None => (body, ""),
    };
    let kind = if object.eq_ignore_ascii_case("this") || object.eq_ignore_ascii_case("self") {
        ReplObject::This
    } else if object.eq_ignore_ascii_case("file") || object.eq_ignore_ascii_case("input") {
        ReplObject::LateBind
    } else {
        return Err(PatternError::UnknownReplacementObject {
            object: object.to_string(),
        });
    };
    let prop = FileProp::from_member(member).ok_or_else(|| {
        PatternError::UnknownReplacementMember {
            member: member.to_string(),
        }
    })?;
    Ok((kind, prop))
}

/// Lexes `pattern` into tokens allocated in `arena`.
///
/// `this` is the file-property cache of the configuration file, when one is
/// in scope; with it present, `{this.*}` references resolve immediately to
/// literal tokens. Without it they stay symbolic and are rejected once a
/// replacer tries to bind them.
pub fn lex_pattern<'arena>(
    arena: &'arena Bump,
    pattern: &str,
    this: Option<&mut FilePropertyCache>,
) -> PatternResult<Vec<Token<'arena>>> {
    let trimmed = pattern.trim();
    let trimmed = trimmed.strip_prefix("::").unwrap_or(trimmed);
    // Symbols can never be empty.
    if trimmed.is_empty() {
        return Err(PatternError::EmptyPattern);
    }
    let pat: &'arena str = arena.alloc_str(trimmed);
    PatternLexer {
        arena,
        pattern: pat,
        rest: pat,
        curr: "",
        toks: Vec::new(),
        this,
    }
    .lex()
}

/// Implements lexing for patterns.
struct PatternLexer<'arena, 'cache> {
    arena: &'arena Bump,
    /// The whole pattern (after trimming), for diagnostics.
    pattern: &'arena str,
    /// Unconsumed pattern text.
    rest: &'arena str,
    /// The current segment text.
    curr: &'arena str,
    /// Output tokens.
    toks: Vec<Token<'arena>>,
    /// Replacement source for `this`, if one exists.
    this: Option<&'cache mut FilePropertyCache>,
}

impl<'arena> PatternLexer<'arena, '_> {
    /// Pre-checks + lexing + post-checks.
    fn lex(mut self) -> PatternResult<Vec<Token<'arena>>> {
        if self.pattern.ends_with("::") {
            return Err(self.report_pattern("cannot end with scope resolution"));
        }
        if self.pattern.ends_with('@') {
            return Err(self.report_pattern("cannot end with anonymous namespace"));
        }

        self.lex_impl()?;

        debug_assert!(!self.toks.is_empty(), "empty pattern made it here?");
        if self.toks.len() == 1 {
            match self.toks[0].kind {
                TokenKind::Glob => return Err(self.report_pattern("must contain non-glob particle")),
                TokenKind::Anonymous => {
                    return Err(self.report_pattern("must contain non-anonymous particle"))
                }
                _ => {}
            }
        }
        Ok(self.toks)
    }

    /// Main lexing loop.
    fn lex_impl(&mut self) -> PatternResult<()> {
        loop {
            // Grab as many plain identifier segments as possible.
            self.handle_simple()?;
            if self.done() {
                return Ok(());
            }
            debug_assert!(!self.curr.is_empty());

            if let Some(kind) = self.identify_standalone() {
                // Skip multiple globs in a row.
                if !(kind == TokenKind::Glob && self.last_token_was_glob()) {
                    let text = if kind == TokenKind::Glob { "**" } else { "@" };
                    self.toks.push(Token::new(kind, text));
                }
                self.curr = "";
                continue;
            }

            if Self::is_replacement(self.curr) {
                let body = &self.curr[1..self.curr.len() - 1];
                let tok = self.replacement_token(body)?;
                self.toks.push(tok);
                self.curr = "";
                continue;
            }

            // Must be a compound type.
            self.handle_compound()?;
            self.curr = "";
        }
    }

    /// Handles runs of simple identifier segments, leaving anything else in
    /// `curr` for the caller.
    fn handle_simple(&mut self) -> PatternResult<()> {
        loop {
            if !self.load_next_segment() {
                return Ok(());
            }
            if self.curr.is_empty() {
                return Err(self.report_pattern("contains empty scope"));
            }
            if !is_identifier(self.curr) {
                // Some other thing we don't worry about here.
                return Ok(());
            }
            // Identifiers cannot start with [0-9].
            if self.curr.as_bytes()[0].is_ascii_digit() {
                return Err(PatternError::BadIdentifier {
                    ident: self.curr.to_string(),
                    detail: "identifiers cannot start with a number".to_string(),
                });
            }
            let tok = Token::new(TokenKind::Simple, self.curr);
            self.toks.push(tok);
            self.curr = "";
        }
    }

    /// Identifies `@` or `**`.
    fn identify_standalone(&self) -> Option<TokenKind> {
        match self.curr {
            "@" => Some(TokenKind::Anonymous),
            "**" => Some(TokenKind::Glob),
            _ => None,
        }
    }

    fn last_token_was_glob(&self) -> bool {
        self.toks.last().is_some_and(|t| t.kind == TokenKind::Glob)
    }

    /// Returns true iff `s` is a whole-segment `{obj.member}` replacement.
    /// Things like `{this.stem}{file.stem}` are compound, not replacements.
    fn is_replacement(s: &str) -> bool {
        s.len() >= 2 && s.starts_with('{') && s.ends_with('}') && s.matches('{').count() == 1
    }

    /// Builds the token for a whole-segment replacement body.
    fn replacement_token(&mut self, body: &str) -> PatternResult<Token<'arena>> {
        let (object, prop) = classify_replacement(body)?;
        if object == ReplObject::This {
            if let Some(cache) = self.this.as_deref_mut() {
                let value = cache.property(prop).to_string();
                if !is_identifier(&value) {
                    return Err(PatternError::BadIdentifier {
                        ident: value,
                        detail: "replacement contains invalid characters".to_string(),
                    });
                }
                // Direct replacement via {this.prop}.
                let mut tok = Token::new(TokenKind::Simple, &*self.arena.alloc_str(&value));
                tok.modified = true;
                return Ok(tok);
            }
            return Ok(Token::new(TokenKind::This, prop.canonical()));
        }
        Ok(Token::new(TokenKind::LateBind, prop.canonical()))
    }

    /// Handles compound segments (any combination of regex and replacements).
    fn handle_compound(&mut self) -> PatternResult<()> {
        let mut seg = self.curr;
        if let Some(stripped) = seg.strip_prefix('/') {
            seg = match stripped.strip_suffix('/') {
                Some(inner) => inner,
                None => {
                    return Err(PatternError::BadScope {
                        pattern: self.curr.to_string(),
                        detail: "unknown sequence in compound".to_string(),
                    })
                }
            };
        }
        if seg.is_empty() {
            return Err(self.report_pattern("contains empty scope"));
        }
        CompoundLexer::new(self, seg).lex()
    }

    /// Loads the next `::`-separated segment into `curr`.
    fn load_next_segment(&mut self) -> bool {
        if self.rest.is_empty() {
            self.curr = "";
            return false;
        }
        let (curr, rest) = match self.rest.split_once("::") {
            Some((curr, rest)) => (curr, rest),
            None => (self.rest, ""),
        };
        self.curr = curr.trim();
        self.rest = rest;
        true
    }

    fn done(&self) -> bool {
        self.rest.is_empty() && self.curr.is_empty()
    }

    fn report_pattern(&self, detail: &str) -> PatternError {
        PatternError::BadScope {
            pattern: self.pattern.to_string(),
            detail: detail.to_string(),
        }
    }
}

/// The compound sub-lexer deals with segments that mix regex and
/// replacements, eg. `{this.stem}Class`, `I?Foo`, `[A-Z]*{file.stem}+`.
///
/// The regex flavor is deliberately limited to C++ identifier characters;
/// there is no grouping and no alternation. Replacements inside a compound
/// segment add rebinding overhead, since the regex is recompiled for every
/// input file.
struct CompoundLexer<'lex, 'arena, 'cache> {
    lex: &'lex mut PatternLexer<'arena, 'cache>,
    /// The segment being scanned, slashes already stripped.
    seg: &'arena str,
    /// Current byte position in `seg`.
    at: usize,
    /// The last token class read.
    last: CharKind,
    /// If the expression contains regex.
    has_regex: bool,
    /// If the expression contains replacements.
    has_replacements: bool,
    /// Rewritten regex/format text.
    buf: String,
    /// Insertion-ordered replacement arguments.
    replacements: Vec<(ReplObject, FileProp, Token<'arena>)>,
}

impl<'lex, 'arena, 'cache> CompoundLexer<'lex, 'arena, 'cache> {
    fn new(lex: &'lex mut PatternLexer<'arena, 'cache>, seg: &'arena str) -> Self {
        Self {
            lex,
            seg,
            at: 0,
            last: CharKind::Unsupported,
            has_regex: false,
            has_replacements: false,
            buf: String::with_capacity(seg.len()),
            replacements: Vec::new(),
        }
    }

    /// Lex a compound segment.
    fn lex(mut self) -> PatternResult<()> {
        if is_identifier(self.seg) {
            // Simple case of something like `/abc/`.
            let tok = Token::new(TokenKind::Simple, self.seg);
            self.lex.toks.push(tok);
            return Ok(());
        }

        self.scan()?;

        if !self.has_regex && !self.has_replacements {
            // Only immediate this-resolutions; collapses back to a literal.
            let text = strip_grouping(&self.buf);
            let mut tok = Token::new(TokenKind::Simple, &*self.lex.arena.alloc_str(&text));
            tok.modified = true;
            self.lex.toks.push(tok);
            return Ok(());
        }

        self.finish();
        Ok(())
    }

    /// Reads until something interesting.
    fn scan(&mut self) -> PatternResult<()> {
        while self.at < self.seg.len() {
            let byte = self.seg.as_bytes()[self.at];
            match identify(byte) {
                CharKind::OpenCurly => self.handle_replacement()?,
                CharKind::Identifier => {
                    // `$` would act as an anchor once the text is compiled.
                    if byte == b'$' {
                        self.buf.push_str("\\$");
                    } else {
                        self.buf.push(byte as char);
                    }
                    self.last = CharKind::Identifier;
                    self.at += 1;
                }
                kind => self.dispatch_regex(kind)?,
            }
        }
        Ok(())
    }

    /// Dispatches regex character handling.
    fn dispatch_regex(&mut self, kind: CharKind) -> PatternResult<()> {
        self.has_regex = true;
        match kind {
            CharKind::Wildcard => {
                // `.` means "any identifier byte" in this flavor.
                self.buf.push_str("[A-Za-z0-9_$]");
                self.last = CharKind::Wildcard;
                self.at += 1;
                Ok(())
            }
            CharKind::ZeroOrOne | CharKind::Kleene | CharKind::KleenePlus => {
                self.handle_quantifier(kind)
            }
            CharKind::Escape => self.handle_escape(),
            CharKind::OpenBrace => self.handle_char_class(),
            CharKind::OpenParen => Err(PatternError::UnsupportedFeature {
                segment: self.seg.to_string(),
                feature: "match groups".to_string(),
            }),
            kind => Err(self.regex_error(kind)),
        }
    }

    /// Handles `?`, `*`, and `+`.
    fn handle_quantifier(&mut self, kind: CharKind) -> PatternResult<()> {
        let ch = self.seg.as_bytes()[self.at] as char;
        match self.last {
            CharKind::Unsupported => {
                return Err(PatternError::QuantifierMisuse {
                    segment: self.seg.to_string(),
                    detail: format!("'{ch}' found at the start of pattern"),
                });
            }
            CharKind::Identifier
            | CharKind::Wildcard
            | CharKind::CloseParen
            | CharKind::CloseBrace => {}
            // Replacement sequence, eg. {file.stem}?
            CharKind::CloseCurly => {}
            CharKind::ZeroOrOne | CharKind::Kleene | CharKind::KleenePlus => {
                // Only a lazy `?` may follow a quantifier, and never a second
                // one after it.
                if kind != CharKind::ZeroOrOne || self.last == CharKind::ZeroOrOne {
                    if kind == CharKind::Kleene && self.last == CharKind::Kleene {
                        return Err(PatternError::QuantifierMisuse {
                            segment: self.seg.to_string(),
                            detail: "glob not allowed in compound expressions".to_string(),
                        });
                    }
                    return Err(self.multiple_quantifiers());
                }
                if self.peek_next() == CharKind::ZeroOrOne {
                    return Err(self.multiple_quantifiers());
                }
            }
            _ => return Err(self.regex_error(kind)),
        }
        self.buf.push(ch);
        self.last = kind;
        self.at += 1;
        Ok(())
    }

    fn multiple_quantifiers(&self) -> PatternError {
        PatternError::QuantifierMisuse {
            segment: self.seg.to_string(),
            detail: "found multiple quantifiers in a row".to_string(),
        }
    }

    /// Handles escape sequences.
    fn handle_escape(&mut self) -> PatternResult<()> {
        let report = |detail: String| PatternError::InvalidEscape {
            segment: self.seg.to_string(),
            detail,
        };
        let Some(&next) = self.seg.as_bytes().get(self.at + 1) else {
            return Err(report("character must follow escape sequence".to_string()));
        };
        match next {
            b'a' => self.buf.push_str("[A-Za-z]"),
            b'd' => self.buf.push_str("[0-9]"),
            b'w' => self.buf.push_str("[A-Za-z0-9_]"),
            b'i' => self.buf.push_str("[A-Za-z0-9_$]"),
            b'n' | b'r' | b't' | b'0' => {
                return Err(report("whitespace escapes are not allowed".to_string()));
            }
            other => {
                return Err(report(format!(
                    "invalid escape sequence '\\{}'",
                    char::from(other).escape_default()
                )));
            }
        }
        self.at += 2;
        self.last = CharKind::CloseBrace;
        Ok(())
    }

    /// Handles `[...]`.
    fn handle_char_class(&mut self) -> PatternResult<()> {
        let bytes = self.seg.as_bytes();
        let mut end = self.at + 1;
        // For handling [:name:].
        let mut in_posix = false;
        loop {
            if end >= bytes.len() {
                return Err(PatternError::InvalidCharClass {
                    class: self.seg.to_string(),
                    detail: "unterminated character class".to_string(),
                });
            }
            match bytes[end] {
                b']' if !in_posix => break,
                b']' => in_posix = false,
                b'[' if in_posix => {
                    return Err(PatternError::InvalidCharClass {
                        class: self.seg.to_string(),
                        detail: "invalid character class nesting".to_string(),
                    });
                }
                b'[' => in_posix = true,
                _ => {}
            }
            end += 1;
        }

        let class = &self.seg[self.at..=end];
        validate_char_class(class)?;

        self.buf.push_str(class);
        self.at = end + 1;
        self.last = CharKind::CloseBrace;
        Ok(())
    }

    /// Handles `{obj.member}` inside a compound segment.
    fn handle_replacement(&mut self) -> PatternResult<()> {
        let end = match self.seg[self.at + 1..].find('}') {
            Some(off) => self.at + 1 + off,
            None => {
                return Err(PatternError::BadScope {
                    pattern: self.seg.to_string(),
                    detail: "unterminated replacement block".to_string(),
                });
            }
        };
        let body = self.seg[self.at + 1..end].trim();
        let (object, prop) = classify_replacement(body)?;

        if object == ReplObject::This {
            if let Some(cache) = self.lex.this.as_deref_mut() {
                let value = cache.property(prop).to_string();
                if !is_identifier(&value) {
                    return Err(PatternError::BadIdentifier {
                        ident: value,
                        detail: "replacement contains invalid characters".to_string(),
                    });
                }
                // Resolve right here; the grouping parentheses keep a
                // following quantifier attached to the whole value.
                self.buf.push('(');
                for byte in value.bytes() {
                    if byte == b'$' {
                        self.buf.push_str("\\$");
                    } else {
                        self.buf.push(byte as char);
                    }
                }
                self.buf.push(')');
                self.at = end + 1;
                self.last = CharKind::Identifier;
                return Ok(());
            }
        }

        self.has_replacements = true;
        let index = match self
            .replacements
            .iter()
            .position(|&(o, p, _)| o == object && p == prop)
        {
            Some(index) => index,
            None => {
                let kind = match object {
                    ReplObject::This => TokenKind::This,
                    ReplObject::LateBind => TokenKind::LateBind,
                };
                self.replacements.push((object, prop, Token::grouped(kind, prop.canonical())));
                if self.replacements.len() > MAX_TRAILING {
                    return Err(PatternError::UnsupportedFeature {
                        segment: self.seg.to_string(),
                        feature: format!("more than {MAX_TRAILING} replacement arguments"),
                    });
                }
                self.replacements.len() - 1
            }
        };

        self.buf.push('{');
        self.buf.push_str(&index.to_string());
        self.buf.push('}');
        self.at = end + 1;
        self.last = CharKind::CloseCurly;
        Ok(())
    }

    /// Pushes the head token and its trailing replacement arguments.
    fn finish(&mut self) {
        let kind = if self.has_regex {
            if self.has_replacements {
                TokenKind::RegexFmt
            } else {
                TokenKind::Regex
            }
        } else {
            TokenKind::SimpleFmt
        };
        // A format literal must not keep the regex-side escapes or grouping.
        let text = if kind == TokenKind::SimpleFmt {
            strip_grouping(&self.buf)
        } else {
            self.buf.clone()
        };

        let mut head = Token::new(kind, &*self.lex.arena.alloc_str(&text));
        head.trailing = self.replacements.len() as u8;
        head.grouped = self.has_replacements;
        head.modified = true;
        self.lex.toks.push(head);

        // The last trailing argument ends the compound group.
        let last = self.replacements.len().saturating_sub(1);
        for (i, &(_, _, tok)) in self.replacements.iter().enumerate() {
            let mut tok = tok;
            tok.grouped = i != last;
            self.lex.toks.push(tok);
        }
    }

    /// Returns the character kind after the current position.
    fn peek_next(&self) -> CharKind {
        match self.seg.as_bytes().get(self.at + 1) {
            Some(&b) => identify(b),
            None => CharKind::End,
        }
    }

    /// Builds the error for a stray regex character.
    fn regex_error(&self, kind: CharKind) -> PatternError {
        let ch = self.seg[self.at..].chars().next().unwrap_or('\0');
        let segment = self.seg.to_string();
        match kind {
            CharKind::Range | CharKind::Not => PatternError::InvalidCharClass {
                class: segment,
                detail: format!("character '{ch}' found outside character class"),
            },
            CharKind::CloseParen | CharKind::CloseBrace | CharKind::CloseCurly => {
                PatternError::InvalidCharacter {
                    segment,
                    detail: format!("unopened '{ch}'"),
                }
            }
            CharKind::Whitespace => PatternError::InvalidCharacter {
                segment,
                detail: "whitespace found in pattern".to_string(),
            },
            _ => PatternError::InvalidCharacter {
                segment,
                detail: format!("invalid character '{}' in pattern", ch.escape_default()),
            },
        }
    }
}

/// Strips grouping parentheses and un-escapes `\$` from resolved text.
fn strip_grouping(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut bytes = s.bytes().peekable();
    while let Some(b) = bytes.next() {
        match b {
            b'(' | b')' => {}
            b'\\' if bytes.peek() == Some(&b'$') => {
                bytes.next();
                out.push('$');
            }
            _ => out.push(b as char),
        }
    }
    out
}

/// Validates the content of a bracketed character class.
fn validate_char_class(class: &str) -> PatternResult<()> {
    let bytes = class.as_bytes();
    debug_assert!(bytes[0] == b'[' && bytes[bytes.len() - 1] == b']');
    let report = |detail: String| PatternError::InvalidCharClass {
        class: class.to_string(),
        detail,
    };

    // Check for empty and invalid braces.
    if bytes.len() <= 2 {
        return Err(report("empty character class".to_string()));
    }

    let mut start = 1;
    if bytes[1] == b'-' {
        return Err(report("'-' found at start of class".to_string()));
    }
    if bytes[1] == b'^' {
        // Check for [^].
        if bytes.len() == 3 {
            return Err(report("'^' found in empty class".to_string()));
        }
        start = 2;
    }

    // Index of the closing ']'.
    let end = bytes.len() - 1;
    let mut i = start;
    while i < end {
        let b = bytes[i];

        // Case range.
        if b == b'-' {
            if i == start {
                return Err(report("'-' found at start of class".to_string()));
            }
            let next = bytes[i + 1];
            if next == b']' {
                return Err(report("'-' found at end of class".to_string()));
            }
            if !is_identifier_byte(next) {
                return Err(report(format!(
                    "'{}' in case range",
                    char::from(next).escape_default()
                )));
            }
            // The previous byte was validated by the prior iteration; the
            // range must stay within one case pool.
            let prev = bytes[i - 1];
            if !is_valid_case_range(prev, next) {
                return Err(report(format!(
                    "invalid case range '{}-{}'",
                    prev as char, next as char
                )));
            }
            i += 2;
            continue;
        }

        // POSIX metaclass.
        if b == b'[' && i + 1 < end && bytes[i + 1] == b':' {
            let name_start = i + 2;
            let mut j = name_start;
            loop {
                if j >= end {
                    return Err(report("unterminated POSIX metaclass".to_string()));
                }
                if bytes[j] == b':' {
                    break;
                }
                if !bytes[j].is_ascii_lowercase() {
                    return Err(report("invalid character in POSIX metaclass".to_string()));
                }
                j += 1;
            }
            if bytes.get(j + 1) != Some(&b']') {
                return Err(report("unterminated POSIX metaclass".to_string()));
            }
            let name = &class[name_start..j];
            if !matches!(name, "upper" | "lower" | "alpha" | "digit" | "alnum" | "xdigit") {
                return Err(report(format!("unknown POSIX metaclass '{name}'")));
            }
            i = j + 2;
            continue;
        }

        if !is_identifier_byte(b) {
            return Err(report(format!(
                "'{}' found in character class",
                char::from(b).escape_default()
            )));
        }
        i += 1;
    }

    Ok(())
}

/// A case range must stay within one of `[A-Z]`, `[a-z]`, or `[0-9]`.
fn is_valid_case_range(start: u8, end: u8) -> bool {
    (start.is_ascii_uppercase() && end.is_ascii_uppercase())
        || (start.is_ascii_lowercase() && end.is_ascii_lowercase())
        || (start.is_ascii_digit() && end.is_ascii_digit())
}
