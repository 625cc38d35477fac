use foolish_ast::{DetachmentBrane, DetachmentStatement as Rule, Expr, ExprRef};
use foolish_ubc::{CharacterizedIdentifier, NodeError, NodeIndex, Ubc, UnknownReason};

fn eval(statements: Vec<ExprRef>) -> (Ubc, NodeIndex) {
    let mut ubc = Ubc::new();
    let root = ubc.build(&Expr::brane(statements));
    ubc.run(root).expect("program terminates");
    (ubc, root)
}

fn binding(ubc: &Ubc, block: NodeIndex, name: &str) -> NodeIndex {
    ubc.scope(block)
        .expect("a brane")
        .lookup_local(&CharacterizedIdentifier::parse(name), u32::MAX)
        .unwrap_or_else(|| panic!("`{name}` is bound"))
        .node
}

fn stage(rules: Vec<Rule>) -> DetachmentBrane {
    DetachmentBrane::new(rules)
}

/// `{ v = 1; u = 3; r = <stages>{ w = v; }; }`, returning `r.w`.
fn detached_read(stages: Vec<DetachmentBrane>, read: &str) -> Result<i64, NodeError> {
    let (ubc, root) = eval(vec![
        Expr::assign("v", Expr::int(1)),
        Expr::assign("u", Expr::int(3)),
        Expr::assign(
            "r",
            Expr::detached(stages, vec![Expr::assign("w", Expr::ident(read))]),
        ),
    ]);
    let r = binding(&ubc, root, "r");
    ubc.value(binding(&ubc, r, "w"))
}

fn unbound(name: &str) -> Result<i64, NodeError> {
    Err(NodeError::NotKnowable {
        reason: UnknownReason::Unbound(name.to_string()),
    })
}

#[test]
fn test_undetached_brane_sees_parent() {
    assert_eq!(detached_read(vec![], "v"), Ok(1));
}

#[test]
fn test_blocked_identifier_is_not_found() {
    assert_eq!(detached_read(vec![stage(vec![Rule::block("v")])], "v"), unbound("v"));
    assert_eq!(
        detached_read(vec![stage(vec![Rule::block("v")])], "u"),
        Ok(3),
        "other names still pass"
    );
}

#[test]
fn test_leftmost_stage_wins() {
    let blocked = vec![
        stage(vec![Rule::block("v")]),
        stage(vec![Rule::allow("v")]),
        stage(vec![Rule::block("v")]),
    ];
    assert_eq!(detached_read(blocked, "v"), unbound("v"));

    let unblocked = vec![
        stage(vec![Rule::block("u")]),
        stage(vec![Rule::allow("v")]),
        stage(vec![Rule::block("v")]),
    ];
    assert_eq!(detached_read(unblocked, "v"), Ok(1));
}

#[test]
fn test_default_replaces_blocked_value() {
    let stages = vec![stage(vec![Rule::default_value("v", Expr::int(42))])];
    assert_eq!(detached_read(stages, "v"), Ok(42));
}

#[test]
fn test_first_default_left_to_right() {
    let stages = vec![
        stage(vec![Rule::block("v")]),
        stage(vec![Rule::default_value("v", Expr::int(7))]),
        stage(vec![Rule::default_value("v", Expr::int(8))]),
    ];
    assert_eq!(detached_read(stages, "v"), Ok(7));
}

#[test]
fn test_default_expression_reads_parent_scope() {
    let default = Expr::mul(Expr::ident("u"), Expr::int(10));
    let stages = vec![stage(vec![Rule::default_value("v", default)])];
    assert_eq!(detached_read(stages, "v"), Ok(30));
}

#[test]
fn test_local_binding_is_not_filtered() {
    let (ubc, root) = eval(vec![
        Expr::assign("v", Expr::int(1)),
        Expr::assign(
            "r",
            Expr::detached(
                vec![stage(vec![Rule::block("v")])],
                vec![
                    Expr::assign("v", Expr::int(5)),
                    Expr::assign("w", Expr::ident("v")),
                ],
            ),
        ),
    ]);
    let r = binding(&ubc, root, "r");
    assert_eq!(ubc.value(binding(&ubc, r, "w")), Ok(5));
}

#[test]
fn test_pattern_rule_blocks_matching_names() {
    let (ubc, root) = eval(vec![
        Expr::assign("abc", Expr::int(1)),
        Expr::assign("b", Expr::int(2)),
        Expr::assign(
            "r",
            Expr::detached(
                vec![stage(vec![Rule::block("a.*")])],
                vec![
                    Expr::assign("w", Expr::ident("abc")),
                    Expr::assign("z", Expr::ident("b")),
                ],
            ),
        ),
    ]);
    let r = binding(&ubc, root, "r");
    assert_eq!(ubc.value(binding(&ubc, r, "w")), unbound("abc"));
    assert_eq!(ubc.value(binding(&ubc, r, "z")), Ok(2));
}

#[test]
fn test_identical_adjacent_stages_collapse() {
    let (ubc, root) = eval(vec![
        Expr::assign(
            "same",
            Expr::detached(
                vec![stage(vec![Rule::block("v")]), stage(vec![Rule::block("v")])],
                vec![],
            ),
        ),
        Expr::assign(
            "interleaved",
            Expr::detached(
                vec![
                    stage(vec![Rule::block("v")]),
                    stage(vec![Rule::allow("v")]),
                    stage(vec![Rule::block("v")]),
                ],
                vec![],
            ),
        ),
    ]);
    let same = binding(&ubc, root, "same");
    let interleaved = binding(&ubc, root, "interleaved");
    assert_eq!(ubc.scope(same).unwrap().detachment().len(), 1);
    assert_eq!(ubc.scope(interleaved).unwrap().detachment().len(), 3);
}

#[test]
fn test_hidden_binding_is_invisible_to_search_only() {
    let body = vec![
        Expr::assign("secret", Expr::int(1)),
        Expr::assign("open", Expr::int(2)),
        Expr::assign("peek", Expr::ident("secret")),
    ];
    let (ubc, root) = eval(vec![
        Expr::assign(
            "r",
            Expr::detached(vec![stage(vec![Rule::hide_from_search("secret")])], body),
        ),
        Expr::assign("s", Expr::dot(Expr::ident("r"), "secret")),
        Expr::assign("t", Expr::dot(Expr::ident("r"), "open")),
    ]);
    let r = binding(&ubc, root, "r");
    assert_eq!(ubc.value(binding(&ubc, r, "peek")), Ok(1));
    assert_eq!(
        ubc.value(binding(&ubc, root, "s")),
        Err(NodeError::NotKnowable {
            reason: UnknownReason::NotFound("secret".to_string())
        })
    );
    assert_eq!(ubc.value(binding(&ubc, root, "t")), Ok(2));
}

#[test]
fn test_block_scopes_know_their_block() {
    let (ubc, root) = eval(vec![
        Expr::assign("plain", Expr::brane(vec![])),
        Expr::assign(
            "r",
            Expr::detached(
                vec![stage(vec![Rule::block("v")])],
                vec![Expr::assign("w", Expr::int(1))],
            ),
        ),
    ]);
    assert_eq!(ubc.scope(root).unwrap().owner(), root);
    for name in ["plain", "r"] {
        let block = binding(&ubc, root, name);
        assert_eq!(
            ubc.scope(block).unwrap().owner(),
            ubc.terminal(block),
            "`{name}` owns its scope"
        );
    }
}
