use foolish_ast::{Expr, ExprRef};
use foolish_ubc::{NodeError, NodeIndex, Nyes, RuntimeFault, StepCount, Ubc, UbcOptions};

fn statements(ubc: &Ubc, block: NodeIndex) -> Vec<NodeIndex> {
    ubc.nodes()
        .block(block)
        .expect("root is a block")
        .statements
        .clone()
}

fn three_literals() -> ExprRef {
    Expr::brane(vec![
        Expr::assign("a", Expr::int(1)),
        Expr::assign("b", Expr::int(2)),
        Expr::assign("c", Expr::int(3)),
    ])
}

#[test]
fn test_build_does_not_evaluate() {
    let mut ubc = Ubc::new();
    let root = ubc.build(&three_literals());
    assert!(ubc.needs_step(root));
    assert!(ubc.is_abstract(root));
    assert_eq!(ubc.node(root).unwrap().nyes, Nyes::Uninitialized);
    assert_eq!(ubc.value(root), Err(NodeError::NotFinished(root)));
}

#[test]
fn test_stepping_a_finished_node_is_a_no_op() {
    let mut ubc = Ubc::new();
    let root = ubc.build(&Expr::brane(vec![Expr::assign(
        "x",
        Expr::add(Expr::int(1), Expr::int(2)),
    )]));
    ubc.run(root).unwrap();
    let x = statements(&ubc, root)[0];
    let (before_value, before_abstract) = (ubc.value(x), ubc.is_abstract(x));
    let nodes_before = ubc.nodes().len();

    for _ in 0..5 {
        ubc.step(root).unwrap();
        ubc.step(x).unwrap();
    }

    assert_eq!(ubc.value(x), before_value);
    assert_eq!(ubc.value(x), Ok(3));
    assert_eq!(ubc.is_abstract(x), before_abstract);
    assert_eq!(
        ubc.nodes().len(),
        nodes_before,
        "stepping finished nodes must not allocate"
    );
}

#[test]
fn test_breadth_first_fairness_for_equal_work() {
    // One step to open the block, then each assignment of a literal needs
    // two steps of its own.
    let mut ubc = Ubc::new();
    let root = ubc.build(&three_literals());
    ubc.step(root).unwrap();
    let children = statements(&ubc, root);
    assert_eq!(children.len(), 3);

    for _ in 0..(2 * children.len() - 1) {
        ubc.step(root).unwrap();
    }
    assert!(
        ubc.needs_step(children[2]),
        "the last child still owes its final step"
    );

    ubc.step(root).unwrap();
    for &child in &children {
        assert!(!ubc.needs_step(child), "child {child:?} is starved");
    }
    assert!(ubc.needs_step(root), "the block finishes on its next step");
    ubc.step(root).unwrap();
    assert!(!ubc.needs_step(root));
}

#[test]
fn test_shallow_sibling_is_not_starved_by_deep_one() {
    let deep = Expr::add(
        Expr::add(Expr::add(Expr::int(1), Expr::int(2)), Expr::int(3)),
        Expr::int(4),
    );
    let mut ubc = Ubc::new();
    let root = ubc.build(&Expr::brane(vec![
        Expr::assign("deep", deep),
        Expr::assign("shallow", Expr::int(5)),
    ]));
    for _ in 0..5 {
        ubc.step(root).unwrap();
    }
    let children = statements(&ubc, root);
    assert!(ubc.needs_step(children[0]));
    assert!(!ubc.needs_step(children[1]));
    assert_eq!(ubc.value(children[1]), Ok(5));

    ubc.run(root).unwrap();
    assert_eq!(ubc.value(children[0]), Ok(10));
}

#[test]
fn test_run_reports_step_count() {
    let mut ubc = Ubc::new();
    let root = ubc.build(&three_literals());
    assert_eq!(ubc.run(root), Ok(StepCount(8)));
    assert_eq!(StepCount(8).to_string(), "8 steps");
}

#[test]
fn test_step_limit_is_a_resumable_fault() {
    let mut ubc = Ubc::new();
    let root = ubc.build(&three_literals());

    let fault = ubc.run_to_completion(root, 3).unwrap_err();
    assert_eq!(
        fault,
        RuntimeFault::StepLimitExceeded {
            limit: 3,
            node: root
        }
    );
    assert!(ubc.needs_step(root));

    assert_eq!(ubc.run_to_completion(root, 100), Ok(StepCount(5)));
    let children = statements(&ubc, root);
    let values: Vec<_> = children.iter().map(|&c| ubc.value(c)).collect();
    assert_eq!(values, vec![Ok(1), Ok(2), Ok(3)]);
}

#[test]
fn test_configured_step_bound() {
    let mut ubc = Ubc::with_options(UbcOptions {
        max_steps: 2,
        ..UbcOptions::default()
    });
    let root = ubc.build(&three_literals());
    assert!(matches!(
        ubc.run(root),
        Err(RuntimeFault::StepLimitExceeded { limit: 2, .. })
    ));
}

#[test]
fn test_value_of_block_is_a_contract_violation() {
    let mut ubc = Ubc::new();
    let root = ubc.build(&three_literals());
    ubc.run(root).unwrap();
    assert_eq!(ubc.value(root), Err(NodeError::NotAValue { kind: "block" }));
    assert!(!ubc.is_abstract(root));
}

#[test]
fn test_scope_of_value_is_a_contract_violation() {
    let mut ubc = Ubc::new();
    let root = ubc.build(&Expr::int(7));
    ubc.run(root).unwrap();
    assert_eq!(ubc.value(root), Ok(7));
    assert!(matches!(ubc.scope(root), Err(NodeError::NotABlock { .. })));
}

#[test]
fn test_unknown_node_is_reported() {
    let ubc = Ubc::new();
    let missing = NodeIndex(42);
    assert_eq!(ubc.value(missing), Err(NodeError::UnknownNode(missing)));
    assert!(ubc.is_abstract(missing));
}

#[test]
fn test_options_deserialize_with_defaults() {
    let options: UbcOptions = serde_json::from_str(r#"{ "max_steps": 10 }"#).unwrap();
    assert_eq!(options.max_steps, 10);
    assert!(!options.trace_steps);
}
