//! Pattern-lexer acceptance tests.
//!
//! Table-driven: each group lists patterns with the expected outcome,
//! optionally under a config file-property cache.

use bumpalo::Bump;
use debase::core::file_props::FilePropertyCache;
use debase::core::lex_pattern;

fn check(pattern: &str, should_pass: bool, this: Option<&str>) {
    let arena = Bump::new();
    let mut cache = this.map(FilePropertyCache::new);
    let result = lex_pattern(&arena, pattern, cache.as_mut());
    match (&result, should_pass) {
        (Ok(_), true) | (Err(_), false) => {}
        (Ok(toks), false) => {
            panic!("pattern '{pattern}' should have failed, lexed {toks:?}");
        }
        (Err(err), true) => {
            panic!("pattern '{pattern}' failed: {err}");
        }
    }
}

fn check_group(cases: &[(&str, bool)], this: Option<&str>) {
    for (pattern, should_pass) in cases {
        check(pattern, *should_pass, this);
    }
}

#[test]
fn simple() {
    check_group(
        &[("::foo", true), ("::a::b::C", true), ("x :: y :: z", true)],
        None,
    );
}

#[test]
fn empty() {
    check_group(
        &[
            ("", false),
            ("\t", false),
            ("  :: ", false),
            ("x::", false),
            ("x:: ::z", false),
        ],
        None,
    );
}

#[test]
fn standalone() {
    check_group(
        &[
            ("@::xyz", true),
            ("@::@::bar", true),
            ("@", false),
            ("::@::**", true),
            ("**::xyz", true),
            ("::**", false),
            ("**::", false),
        ],
        None,
    );
}

#[test]
fn replacements() {
    check_group(
        &[
            // Config path.
            ("{this}", true),
            ("{This.Dir}", true),
            ("{thiS.stEm}", true),
            ("{SELF}", true),
            ("{sElF.dir}", true),
            ("{seLf.STEM}", true),
            // Input path.
            ("{file}", true),
            ("{input.diR}", true),
            ("{filE.Stem}", true),
            ("{fILe.sTEm}", true),
            // Invalid.
            ("{ \t  }", false),
            ("{.stem}", false),
            ("{@.stem}", false),
            ("{this.@}", false),
        ],
        None,
    );
}

#[test]
fn this_replacements_with_cache() {
    check_group(
        &[
            ("{This.Dir}", true),
            ("{thiS.stEm}", true),
            ("{this.dir}", true),
        ],
        Some("xyz/Config.json"),
    );
}

#[test]
fn regex() {
    check_group(
        &[
            // Basic.
            ("/II/", true),
            ("II?", true),
            ("I+", true),
            ("/I+/", true),
            ("I*v", true),
            ("::/I*v/", true),
            ("x::/I*v/", true),
            ("**::I*v", true),
            ("**::/I*v/", true),
            ("?v", false),
            ("*v", false),
            ("I::*v", false),
            ("+v", false),
            ("**v", false),
            ("v**", false),
            ("I*?v", true),
            ("I*??v", false),
            ("I*+v", false),
            // Escapes.
            ("\\a\\d?", true),
            ("\\w+", true),
            ("\\a\\i*", true),
            ("\\n+", false),
            ("\\*", false),
            // Character classes.
            ("[a-z]", true),
            ("[a-zA-Z]+", true),
            ("[0-z]", false),
            ("[0-9A-z]", false),
            ("[^0-9]", true),
            ("[^]", false),
            ("[-abc]", false),
            ("[abc-]", false),
            ("[[:alnum:]]", true),
            ("[^[:digit:]]", true),
            ("[[:xyz:]]", false),
        ],
        None,
    );
}

#[test]
fn double_question_mark_is_rejected() {
    check_group(&[("I??", false), ("I???", false)], None);
}

#[test]
fn simple_format() {
    check_group(
        &[
            ("I{file.stem}", true),
            ("{this.stem}{file.stem}", true),
            ("/I{file.stem}/", true),
            ("/I{this.stem}/", true),
            ("I{this.@}v", false),
        ],
        None,
    );
}

#[test]
fn regex_format() {
    check_group(
        &[
            ("I{file.stem}+", true),
            ("/{this.stem}+/", true),
            ("i::/{file.stem}+/", true),
            ("x::I{this.stem}", true),
            ("**::{file.stem}", true),
            ("{this.stem}\\w*", true),
            ("?{file.stem}", false),
            ("I[{file.stem}]", false),
        ],
        None,
    );
}

#[test]
fn formats_resolve_under_cache() {
    check_group(
        &[
            ("I{this.stem}", true),
            ("{this.stem}{file.stem}", true),
            ("/I{this.stem}/", true),
            ("x::I{this.stem}", true),
        ],
        Some("xyz/Config.json"),
    );
}

#[test]
fn capture_groups_are_unsupported() {
    check_group(&[("(abc)", false), ("I(a)?", false)], None);
}

#[test]
fn unterminated_forms() {
    check_group(
        &[
            ("/abc", false),
            ("[abc", false),
            ("{file.stem", false),
            ("I{file.stem", false),
        ],
        None,
    );
}
