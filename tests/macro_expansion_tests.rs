//! Expander and binder contract tests: registration, single-step and full
//! expansion, evaluation-position rules, depth protection, and gensym
//! hygiene.

use mantra::errors::MantraError;
use mantra::macros::ParamSpec;
use mantra::term::Term;
use mantra::Engine;

fn sym(s: &str) -> Term {
    Term::symbol(s)
}

fn num(n: i64) -> Term {
    Term::number(n)
}

fn unq(name: &str) -> Term {
    Term::call("unquote", vec![sym(name)])
}

fn splice(name: &str) -> Term {
    Term::call("unquote-splicing", vec![sym(name)])
}

/// `(add2 x y)` => `(+ x y)`.
fn register_add2(engine: &mut Engine) {
    engine.register_macro(
        "add2",
        ParamSpec::positional(&["x", "y"]).unwrap(),
        vec![Term::call(
            "quasiquote",
            vec![Term::list(vec![sym("+"), unq("x"), unq("y")])],
        )],
    );
}

#[test]
fn non_macro_forms_are_returned_unchanged() {
    let engine = Engine::new();
    let form = Term::call("+", vec![num(1), num(2)]);
    assert_eq!(engine.expand_one(&form).unwrap(), form);
    assert_eq!(engine.expand_full(&form).unwrap(), form);
}

#[test]
fn atoms_pass_through_expansion() {
    let engine = Engine::new();
    for atom in [Term::Nil, num(7), sym("x"), Term::string("s")] {
        assert_eq!(engine.expand_full(&atom).unwrap(), atom);
    }
}

#[test]
fn expand_one_rewrites_the_outer_form_once() {
    let mut engine = Engine::new();
    register_add2(&mut engine);
    let call = Term::call("add2", vec![num(1), num(2)]);
    let expanded = engine.expand_one(&call).unwrap();
    assert_eq!(expanded, Term::call("+", vec![num(1), num(2)]));
}

#[test]
fn expand_one_does_not_recurse_into_the_result() {
    let mut engine = Engine::new();
    register_add2(&mut engine);
    // The replacement still contains an add2 call; one step must not touch it.
    engine.register_macro(
        "outer",
        ParamSpec::positional(&[]).unwrap(),
        vec![Term::call(
            "quote",
            vec![Term::call("add2", vec![num(1), num(2)])],
        )],
    );
    let expanded = engine.expand_one(&Term::call("outer", vec![])).unwrap();
    assert_eq!(expanded, Term::call("add2", vec![num(1), num(2)]));
}

#[test]
fn expand_full_reaches_nested_positions() {
    let mut engine = Engine::new();
    register_add2(&mut engine);
    let form = Term::call("*", vec![Term::call("add2", vec![num(1), num(2)]), num(3)]);
    let expanded = engine.expand_full(&form).unwrap();
    assert_eq!(
        expanded,
        Term::call("*", vec![Term::call("+", vec![num(1), num(2)]), num(3)])
    );
}

#[test]
fn quote_bodies_are_never_expanded() {
    let mut engine = Engine::new();
    register_add2(&mut engine);
    let quoted = Term::call("quote", vec![Term::call("add2", vec![num(1), num(2)])]);
    assert_eq!(engine.expand_full(&quoted).unwrap(), quoted);
}

#[test]
fn both_branches_of_a_conditional_are_expanded() {
    let mut engine = Engine::new();
    register_add2(&mut engine);
    let form = Term::call(
        "if",
        vec![
            sym("t"),
            Term::call("add2", vec![num(1), num(2)]),
            Term::call("add2", vec![num(3), num(4)]),
        ],
    );
    let expanded = engine.expand_full(&form).unwrap();
    assert_eq!(
        expanded,
        Term::call(
            "if",
            vec![
                sym("t"),
                Term::call("+", vec![num(1), num(2)]),
                Term::call("+", vec![num(3), num(4)]),
            ],
        )
    );
}

#[test]
fn let_binding_names_stay_literal_but_initializers_expand() {
    let mut engine = Engine::new();
    // A macro whose name shadows a plausible binding name.
    engine.register_macro(
        "v",
        ParamSpec::positional(&[]).unwrap(),
        vec![Term::call("quote", vec![num(9)])],
    );
    let form = Term::call(
        "let",
        vec![
            Term::list(vec![Term::list(vec![sym("x"), Term::call("v", vec![])])]),
            sym("x"),
        ],
    );
    let expanded = engine.expand_full(&form).unwrap();
    assert_eq!(
        expanded,
        Term::call(
            "let",
            vec![Term::list(vec![Term::list(vec![sym("x"), num(9)])]), sym("x")],
        )
    );
}

#[test]
fn set_target_stays_literal() {
    let mut engine = Engine::new();
    engine.register_macro(
        "x",
        ParamSpec::positional(&[]).unwrap(),
        vec![Term::call("quote", vec![num(1)])],
    );
    let form = Term::call("set!", vec![sym("x"), Term::call("x", vec![])]);
    let expanded = engine.expand_full(&form).unwrap();
    assert_eq!(expanded, Term::call("set!", vec![sym("x"), num(1)]));
}

#[test]
fn expansion_is_idempotent() {
    let mut engine = Engine::new();
    register_add2(&mut engine);
    let form = Term::call(
        "do",
        vec![
            Term::call("add2", vec![num(1), Term::call("add2", vec![num(2), num(3)])]),
            Term::call("quote", vec![Term::call("add2", vec![num(4), num(5)])]),
        ],
    );
    let once = engine.expand_full(&form).unwrap();
    let twice = engine.expand_full(&once).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn runaway_recursive_macro_is_a_depth_error() {
    let mut engine = Engine::new().with_max_expansion_depth(32);
    engine.register_macro(
        "spin",
        ParamSpec::positional(&[]).unwrap(),
        vec![Term::call("quote", vec![Term::call("spin", vec![])])],
    );
    let err = engine.expand_full(&Term::call("spin", vec![])).unwrap_err();
    assert_eq!(err, MantraError::ExpansionDepthExceeded { limit: 32 });
}

#[test]
fn structural_nesting_does_not_consume_the_rewrite_budget() {
    let mut engine = Engine::new().with_max_expansion_depth(8);
    register_add2(&mut engine);
    // One legitimate macro call buried far deeper than the rewrite limit.
    let mut form = Term::call("add2", vec![num(1), num(2)]);
    for _ in 0..20 {
        form = Term::call("do", vec![form]);
    }
    let expanded = engine.expand_full(&form).unwrap();
    assert!(expanded.symbols().contains(&"+"));
    assert!(!expanded.symbols().contains(&"add2"));
}

#[test]
fn missing_required_argument_is_an_arity_error() {
    let mut engine = Engine::new();
    register_add2(&mut engine);
    let err = engine
        .expand_full(&Term::call("add2", vec![num(1)]))
        .unwrap_err();
    assert!(matches!(err, MantraError::Arity { .. }));
}

#[test]
fn excess_arguments_without_rest_are_an_arity_error() {
    let mut engine = Engine::new();
    register_add2(&mut engine);
    let err = engine
        .expand_full(&Term::call("add2", vec![num(1), num(2), num(3)]))
        .unwrap_err();
    assert!(matches!(err, MantraError::Arity { .. }));
}

#[test]
fn dotted_call_binds_the_body_parameter_verbatim() {
    let mut engine = Engine::new();
    // (with-pair a b . forms) => (do forms...)
    engine.register_macro(
        "with-pair",
        ParamSpec::with_body(&["a", "b"], "forms").unwrap(),
        vec![Term::call(
            "quasiquote",
            vec![Term::list(vec![sym("do"), splice("forms")])],
        )],
    );
    let body_forms = vec![
        Term::call("emit", vec![num(1)]),
        Term::call("emit", vec![num(2)]),
        sym("t"),
    ];
    let call = Term::improper(
        vec![sym("with-pair"), sym("p"), sym("q")],
        Term::list(body_forms.clone()),
    );
    let expanded = engine.expand_one(&call).unwrap();
    let mut expected_items = vec![sym("do")];
    expected_items.extend(body_forms);
    assert_eq!(expanded, Term::list(expected_items));
}

#[test]
fn dotted_call_without_body_parameter_is_rejected() {
    let mut engine = Engine::new();
    register_add2(&mut engine);
    let call = Term::improper(
        vec![sym("add2"), num(1), num(2)],
        Term::list(vec![num(3)]),
    );
    let err = engine.expand_one(&call).unwrap_err();
    assert!(matches!(err, MantraError::MalformedForm { .. }));
}

#[test]
fn optional_parameters_default_to_the_empty_marker() {
    let mut engine = Engine::new();
    engine.register_macro(
        "maybe",
        ParamSpec::new(vec!["a".to_string()], vec!["b".to_string()], None).unwrap(),
        vec![Term::call(
            "quasiquote",
            vec![Term::list(vec![sym("list"), unq("a"), unq("b")])],
        )],
    );
    let expanded = engine.expand_one(&Term::call("maybe", vec![num(1)])).unwrap();
    assert_eq!(
        expanded,
        Term::call("list", vec![num(1), Term::Nil])
    );
}

#[test]
fn re_registration_replaces_the_previous_definition() {
    let mut engine = Engine::new();
    register_add2(&mut engine);
    engine.register_macro(
        "add2",
        ParamSpec::positional(&["x", "y"]).unwrap(),
        vec![Term::call(
            "quasiquote",
            vec![Term::list(vec![sym("*"), unq("x"), unq("y")])],
        )],
    );
    let expanded = engine
        .expand_one(&Term::call("add2", vec![num(2), num(3)]))
        .unwrap();
    assert_eq!(expanded, Term::call("*", vec![num(2), num(3)]));
}

#[test]
fn fresh_names_never_collide_with_input_symbols() {
    let mut engine = Engine::new();
    // (tmp-let e) => (let ((<fresh> e)) <fresh>)
    engine.register_macro(
        "tmp-let",
        ParamSpec::positional(&["e"]).unwrap(),
        vec![Term::call(
            "let",
            vec![
                Term::list(vec![Term::list(vec![
                    sym("tmp"),
                    Term::call("gensym", vec![Term::string("tmp")]),
                ])]),
                Term::call(
                    "quasiquote",
                    vec![Term::list(vec![
                        sym("let"),
                        Term::list(vec![Term::list(vec![unq("tmp"), unq("e")])]),
                        unq("tmp"),
                    ])],
                ),
            ],
        )],
    );
    let input = Term::call("tmp-let", vec![sym("tmp")]);
    let input_symbols: Vec<String> =
        input.symbols().iter().map(|s| s.to_string()).collect();

    let expanded = engine.expand_full(&input).unwrap();
    let fresh: Vec<&str> = expanded
        .symbols()
        .into_iter()
        .filter(|s| s.starts_with("#:"))
        .collect();
    assert!(!fresh.is_empty(), "expected a generated temporary: {}", expanded);
    for name in &fresh {
        assert!(!input_symbols.iter().any(|s| s == name));
    }

    // The user's own `tmp` symbol survives untouched alongside the fresh one.
    assert!(expanded.symbols().contains(&"tmp"));
}

#[test]
fn repeated_inspection_may_differ_only_in_fresh_names() {
    let mut engine = Engine::new();
    engine.register_macro(
        "tag",
        ParamSpec::positional(&[]).unwrap(),
        vec![Term::call("gensym", vec![])],
    );
    let call = Term::call("tag", vec![]);
    let first = engine.macroexpand(&call).unwrap();
    let second = engine.macroexpand(&call).unwrap();
    assert_ne!(first, second);
}

#[test]
fn expansion_trace_records_every_rewrite() {
    let mut engine = Engine::new();
    register_add2(&mut engine);
    let form = Term::call("add2", vec![Term::call("add2", vec![num(1), num(2)]), num(3)]);
    let (expanded, trace) = engine.expand_full_traced(&form).unwrap();
    assert_eq!(
        expanded,
        Term::call("+", vec![Term::call("+", vec![num(1), num(2)]), num(3)])
    );
    assert_eq!(trace.len(), 2);
    assert!(trace.iter().all(|step| step.macro_name == "add2"));
    assert_eq!(trace[0].input, form);
}

#[test]
fn failed_expansion_leaves_the_registry_usable() {
    let mut engine = Engine::new();
    register_add2(&mut engine);
    assert!(engine.expand_full(&Term::call("add2", vec![])).is_err());
    // The same engine still expands well-formed calls.
    let ok = engine
        .expand_full(&Term::call("add2", vec![num(1), num(2)]))
        .unwrap();
    assert_eq!(ok, Term::call("+", vec![num(1), num(2)]));
}
