//! End-to-end matcher scenarios: compile patterns, install filenames, and
//! match against demangled scope lists.

use bumpalo::Bump;
use debase::core::{PatternError, SymbolMatcher};
use debase::demangle::{Classifier, ItaniumClassifier, SymbolFeatures, SymbolKind};

fn ctor(names: &[&str]) -> SymbolFeatures {
    structor(names, SymbolKind::Constructor, 1)
}

fn dtor(names: &[&str]) -> SymbolFeatures {
    structor(names, SymbolKind::Destructor, 2)
}

fn structor(names: &[&str], kind: SymbolKind, variant: i32) -> SymbolFeatures {
    let mut features = SymbolFeatures::new();
    for name in &names[..names.len() - 1] {
        features.add_scope(*name);
    }
    features.set_base(names[names.len() - 1]);
    features.kind = kind;
    features.variant = variant;
    features
}

#[test]
fn regex_format_pattern_follows_the_filename() {
    let arena = Bump::new();
    let mut matcher = SymbolMatcher::new(&arena, false);
    matcher.add_pattern("x::/y+/::z::I?{file.stem}").unwrap();

    matcher.set_filename("bindings/CCScheduler.cpp").unwrap();
    assert!(matcher.matches(&ctor(&["x", "y", "z", "ICCScheduler"])));
    assert!(matcher.matches(&ctor(&["x", "yyy", "z", "ICCScheduler"])));
    assert!(matcher.matches(&ctor(&["x", "y", "z", "CCScheduler"])));
    assert!(!matcher.matches(&ctor(&["x", "w", "z", "ICCScheduler"])));
    assert!(!matcher.matches(&ctor(&["x", "y", "z"])));

    matcher.set_filename("bindings/CCLightning.cpp").unwrap();
    assert!(matcher.matches(&ctor(&["x", "yyy", "z", "CCLightning"])));
    assert!(!matcher.matches(&ctor(&["x", "y", "z", "ICCScheduler"])));
}

#[test]
fn leading_glob_binds_the_stem() {
    let arena = Bump::new();
    let mut matcher = SymbolMatcher::new(&arena, false);
    matcher.add_pattern("**::{file.stem}").unwrap();

    matcher.set_filename("CCScheduler.cpp").unwrap();
    assert!(matcher.matches(&ctor(&["cocos2d", "CCScheduler"])));
    // The glob requires at least one prefix element.
    assert!(!matcher.matches(&ctor(&["CCScheduler"])));

    matcher.set_filename("CCLightning.cpp").unwrap();
    assert!(matcher.matches(&ctor(&["cocos2d", "CCLightning"])));
    assert!(!matcher.matches(&ctor(&["cocos2d", "CCScheduler"])));
}

#[test]
fn butterfly_glob_with_regex_prefix() {
    let arena = Bump::new();
    let mut matcher = SymbolMatcher::new(&arena, false);
    matcher.add_pattern("[[:lower:]]+::**::{file.stem}").unwrap();

    matcher.set_filename("CCScheduler.cpp").unwrap();
    assert!(matcher.matches(&ctor(&["x", "y", "z", "CCScheduler"])));
    assert!(!matcher.matches(&ctor(&["X", "y", "z", "CCScheduler"])));

    matcher.set_filename("CCLightning.cpp").unwrap();
    assert!(matcher.matches(&ctor(&["cocos", "CCLightning"])));
    assert!(!matcher.matches(&ctor(&["cocos", "CCScheduler"])));
}

#[test]
fn leading_scope_resolution_matches_one_name() {
    let arena = Bump::new();
    let mut matcher = SymbolMatcher::new(&arena, false);
    matcher.add_pattern("::foo").unwrap();
    assert!(matcher.matches(&ctor(&["foo"])));
    assert!(!matcher.matches(&ctor(&["bar"])));
    assert!(!matcher.matches(&ctor(&["ns", "foo"])));
}

#[test]
fn unknown_replacement_object_fails_to_compile() {
    let arena = Bump::new();
    let mut matcher = SymbolMatcher::new(&arena, false);
    assert!(matches!(
        matcher.compile_pattern("{.stem}"),
        Err(PatternError::UnknownReplacementObject { .. })
    ));
}

#[test]
fn bad_case_range_fails_to_compile() {
    let arena = Bump::new();
    let mut matcher = SymbolMatcher::new(&arena, false);
    assert!(matches!(
        matcher.compile_pattern("[0-z]"),
        Err(PatternError::InvalidCharClass { .. })
    ));
}

#[test]
fn glob_inside_compound_fails_to_compile() {
    let arena = Bump::new();
    let mut matcher = SymbolMatcher::new(&arena, false);
    assert!(matches!(
        matcher.compile_pattern("I**"),
        Err(PatternError::QuantifierMisuse { .. })
    ));
}

#[test]
fn multi_glob_is_reported_clearly() {
    let arena = Bump::new();
    let mut matcher = SymbolMatcher::new(&arena, false);
    let err = matcher.compile_pattern("a::**::b::**::c").unwrap_err();
    match err {
        PatternError::MultiGlobNotImplemented { globs, .. } => assert_eq!(globs, 2),
        other => panic!("expected MultiGlobNotImplemented, got {other}"),
    }
}

#[test]
fn demangled_destructor_is_admissible_to_dtor_matching() {
    let arena = Bump::new();
    let mut matcher = SymbolMatcher::new(&arena, false);
    matcher
        .add_dtor_pattern("cocos2d::CCLightning::CCLightning")
        .unwrap();

    let mut features = SymbolFeatures::new();
    let kind = ItaniumClassifier.classify("_ZN7cocos2d11CCLightningD2Ev", &mut features);
    assert_eq!(kind, SymbolKind::Destructor);
    assert_eq!(
        features.scope_names,
        ["cocos2d", "CCLightning", "CCLightning"]
    );
    assert_eq!(features.base_name(), Some("CCLightning"));
    assert_eq!(features.variant, 2);
    assert!(matcher.matches(&features));

    // The deleting destructor (D0) carries variant 0 and is excluded.
    let kind = ItaniumClassifier.classify("_ZN7cocos2d11CCLightningD0Ev", &mut features);
    assert_eq!(kind, SymbolKind::Destructor);
    assert_eq!(features.variant, 0);
    assert!(!matcher.matches(&features));
}

#[test]
fn anonymous_namespace_pattern_matches_demangled_scope() {
    let arena = Bump::new();
    let mut matcher = SymbolMatcher::new(&arena, false);
    matcher.add_pattern("@::Hidden::Hidden").unwrap();

    let mut features = SymbolFeatures::new();
    ItaniumClassifier.classify("_ZN12_GLOBAL__N_16HiddenC2Ev", &mut features);
    assert!(matcher.matches(&features));
}

#[test]
fn anonymous_matches_only_the_marker() {
    let arena = Bump::new();
    let mut matcher = SymbolMatcher::new(&arena, false);
    matcher.add_pattern("@::X").unwrap();
    assert!(matcher.matches(&ctor(&["@", "X"])));
    assert!(!matcher.matches(&ctor(&["ns", "X"])));
}

#[test]
fn mixed_sequence_of_literals_and_regex() {
    let arena = Bump::new();
    let mut matcher = SymbolMatcher::new(&arena, false);
    matcher.add_pattern("engine::/Widget[0-9]+/::Impl").unwrap();
    assert!(matcher.matches(&ctor(&["engine", "Widget42", "Impl"])));
    assert!(!matcher.matches(&ctor(&["engine", "Widget", "Impl"])));
    assert!(!matcher.matches(&ctor(&["engine", "Widget42", "Impl", "Extra"])));
}

#[test]
fn escapes_and_classes_compose() {
    let arena = Bump::new();
    let mut matcher = SymbolMatcher::new(&arena, false);
    matcher.add_pattern("ns::\\aCC\\w*").unwrap();
    assert!(matcher.matches(&ctor(&["ns", "xCCScheduler"])));
    assert!(!matcher.matches(&ctor(&["ns", "1CCScheduler"])));
    assert!(!matcher.matches(&ctor(&["ns", "CCScheduler"])));
}

#[test]
fn wildcard_spans_one_identifier_byte() {
    let arena = Bump::new();
    let mut matcher = SymbolMatcher::new(&arena, false);
    matcher.add_pattern("I.Scheduler").unwrap();
    assert!(matcher.matches(&ctor(&["ICScheduler"])));
    assert!(matcher.matches(&ctor(&["I_Scheduler"])));
    assert!(!matcher.matches(&ctor(&["IScheduler"])));
    assert!(!matcher.matches(&ctor(&["ICCScheduler"])));
}

#[test]
fn ctor_and_dtor_sets_are_disjoint_unless_all() {
    let arena = Bump::new();
    let mut matcher = SymbolMatcher::new(&arena, false);
    matcher.add_ctor_pattern("a::B::B").unwrap();
    matcher.add_dtor_pattern("c::D::D").unwrap();

    assert!(matcher.matches(&ctor(&["a", "B", "B"])));
    assert!(!matcher.matches(&dtor(&["a", "B", "B"])));
    assert!(matcher.matches(&dtor(&["c", "D", "D"])));
    assert!(!matcher.matches(&ctor(&["c", "D", "D"])));
}

#[test]
fn matching_is_stable_between_rebinds() {
    let arena = Bump::new();
    let mut matcher = SymbolMatcher::new(&arena, false);
    matcher.add_pattern("a::{file.stem}").unwrap();

    for _ in 0..3 {
        matcher.set_filename("dir/Thing.cpp").unwrap();
        assert!(matcher.matches(&ctor(&["a", "Thing"])));
        assert!(!matcher.matches(&ctor(&["a", "Other"])));
    }
}
