use foolish_ast::{Expr, ExprRef, SearchOperator};
use foolish_ubc::{NodeIndex, Sequencer, SequencerOptions, Snapshot, Ubc};
use serde_json::json;

fn eval(program: &ExprRef) -> (Ubc, NodeIndex) {
    let mut ubc = Ubc::new();
    let root = ubc.build(program);
    ubc.run(root).expect("program terminates");
    (ubc, root)
}

fn render(program: &ExprRef) -> String {
    let (ubc, root) = eval(program);
    Sequencer::new(&ubc).sequence(root)
}

#[test]
fn test_render_nested_branes() {
    let program = Expr::brane(vec![
        Expr::assign("a", Expr::int(1)),
        Expr::assign(
            "b",
            Expr::brane(vec![Expr::assign(
                "c",
                Expr::add(Expr::ident("a"), Expr::int(1)),
            )]),
        ),
        Expr::assign("d", Expr::ident("x")),
    ]);
    assert_eq!(
        render(&program),
        "{\n  a = 1\n  b = {\n    c = 2\n  }\n  d = ???\n}"
    );
}

#[test]
fn test_render_is_deterministic() {
    let program = Expr::brane(vec![
        Expr::assign("a", Expr::int(1)),
        Expr::assign("b", Expr::brane(vec![Expr::assign("c", Expr::int(2))])),
    ]);
    assert_eq!(render(&program), render(&program));
}

#[test]
fn test_render_characterized_and_empty_branes() {
    let program = Expr::brane(vec![
        Expr::assign(
            "t",
            Expr::characterized_brane(&["type"], vec![Expr::assign("v", Expr::int(1))]),
        ),
        Expr::assign("e", Expr::brane(vec![])),
    ]);
    assert_eq!(
        render(&program),
        "{\n  t = type'{\n    v = 1\n  }\n  e = {}\n}"
    );
}

#[test]
fn test_render_bare_statements_and_enclosing_reference() {
    let program = Expr::brane(vec![
        Expr::add(Expr::int(1), Expr::int(2)),
        Expr::assign("me", Expr::search_up()),
    ]);
    assert_eq!(render(&program), "{\n  3\n  me = ↑\n}");
}

#[test]
fn test_render_global_search_results() {
    let program = Expr::brane(vec![
        Expr::assign(
            "b",
            Expr::brane(vec![
                Expr::assign("x", Expr::int(1)),
                Expr::assign("x", Expr::int(2)),
            ]),
        ),
        Expr::assign(
            "all",
            Expr::search(Expr::ident("b"), SearchOperator::BackwardAll, "x"),
        ),
    ]);
    assert_eq!(
        render(&program),
        "{\n  b = {\n    x = 1\n    x = 2\n  }\n  all = {\n    2\n    1\n  }\n}"
    );
}

#[test]
fn test_render_with_custom_tab() {
    let program = Expr::brane(vec![Expr::assign(
        "b",
        Expr::brane(vec![Expr::assign("c", Expr::unknown())]),
    )]);
    let (ubc, root) = eval(&program);
    let options = SequencerOptions {
        tab: "\t".to_string(),
    };
    assert_eq!(
        Sequencer::with_options(&ubc, options).sequence(root),
        "{\n\tb = {\n\t\tc = ???\n\t}\n}"
    );
}

#[test]
fn test_render_plain_value() {
    assert_eq!(render(&Expr::mul(Expr::int(6), Expr::int(7))), "42");
    assert_eq!(render(&Expr::ident("nothing")), "???");
}

#[test]
fn test_render_unfinished_as_unknown() {
    let mut ubc = Ubc::new();
    let root = ubc.build(&Expr::brane(vec![Expr::assign("a", Expr::int(1))]));
    ubc.step(root).unwrap();
    assert_eq!(Sequencer::new(&ubc).sequence(root), "{\n  a = ???\n}");
    assert_eq!(
        Snapshot::capture(&ubc, root),
        Snapshot::Brane {
            characterization: String::new(),
            statements: vec![foolish_ubc::StatementSnapshot {
                name: Some("a".to_string()),
                value: Snapshot::Pending,
            }],
        }
    );
}

#[test]
fn test_snapshot_json() {
    let program = Expr::brane(vec![
        Expr::assign("a", Expr::int(1)),
        Expr::assign("d", Expr::ident("x")),
        Expr::assign("u", Expr::unknown()),
    ]);
    let (ubc, root) = eval(&program);
    let snapshot = Snapshot::capture(&ubc, root);
    assert!(snapshot.is_brane());
    assert_eq!(
        serde_json::to_value(&snapshot).unwrap(),
        json!({
            "kind": "brane",
            "statements": [
                { "name": "a", "value": { "kind": "value", "value": 1 } },
                {
                    "name": "d",
                    "value": { "kind": "unknown", "reason": { "reason": "unbound", "detail": "x" } }
                },
                { "name": "u", "value": { "kind": "unknown", "reason": { "reason": "literal" } } }
            ]
        })
    );
}
