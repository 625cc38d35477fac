use foolish_ast::Expr;
use foolish_ubc::{CharacterizedIdentifier, MemoryId, NodeError, NodeIndex, Ubc};

fn id(name: &str) -> CharacterizedIdentifier {
    CharacterizedIdentifier::parse(name)
}

fn literal(ubc: &mut Ubc, value: i64) -> NodeIndex {
    ubc.build(&Expr::int(value))
}

#[test]
fn test_shadowing_by_line() {
    let mut ubc = Ubc::new();
    let root = ubc.build(&Expr::brane(vec![
        Expr::assign("x", Expr::int(10)),
        Expr::assign("y", Expr::int(20)),
        Expr::assign("x", Expr::int(30)),
    ]));
    ubc.run(root).unwrap();
    let memory = ubc.scope_id(root).unwrap();

    let x_at = |line| {
        ubc.lookup(memory, &id("x"), line)
            .map(|node| ubc.value(node))
    };
    assert_eq!(x_at(2), Some(Ok(30)));
    assert_eq!(x_at(0), Some(Ok(10)));
    assert_eq!(x_at(1), Some(Ok(10)));
    assert_eq!(x_at(u32::MAX), Some(Ok(30)));
}

#[test]
fn test_lookup_requires_exact_characterization() {
    let mut ubc = Ubc::new();
    let plain = literal(&mut ubc, 1);
    let typed = literal(&mut ubc, 2);
    let memories = ubc.memories_mut();
    let scope = memories.alloc_root();
    memories.bind(scope, id("x"), 0, plain).unwrap();
    memories
        .bind(scope, CharacterizedIdentifier::characterized("type", "x"), 1, typed)
        .unwrap();

    assert_eq!(ubc.lookup(scope, &id("x"), 5), Some(plain));
    assert_eq!(ubc.lookup(scope, &id("type'x"), 5), Some(typed));
    assert_eq!(ubc.lookup(scope, &id("kind'x"), 5), None);
}

#[test]
fn test_parent_visibility_is_bounded_by_creation_line() {
    let mut ubc = Ubc::new();
    let x = literal(&mut ubc, 100);
    let y = literal(&mut ubc, 200);
    let z = literal(&mut ubc, 300);

    let memories = ubc.memories_mut();
    let parent = memories.alloc_root();
    memories.bind(parent, id("x"), 0, x).unwrap();
    let child = memories.alloc(parent, 1);
    // Bound after the child scope exists.
    memories.bind(parent, id("y"), 1, y).unwrap();
    memories.bind(parent, id("z"), 2, z).unwrap();

    assert_eq!(ubc.lookup(child, &id("x"), 0), Some(x));
    assert_eq!(ubc.lookup(child, &id("y"), 0), Some(y));
    assert_eq!(
        ubc.lookup(child, &id("z"), u32::MAX),
        None,
        "z is bound after the child's creation line"
    );
    assert_eq!(ubc.lookup(parent, &id("z"), 2), Some(z));
}

#[test]
fn test_lookup_walks_several_levels() {
    let mut ubc = Ubc::new();
    let x = literal(&mut ubc, 1);
    let memories = ubc.memories_mut();
    let outer = memories.alloc_root();
    memories.bind(outer, id("x"), 0, x).unwrap();
    let middle = memories.alloc(outer, 3);
    let inner = memories.alloc(middle, 0);

    assert_eq!(ubc.lookup(inner, &id("x"), 0), Some(x));
    assert_eq!(ubc.lookup(inner, &id("w"), 0), None);
    assert_eq!(ubc.lookup(MemoryId::NONE, &id("x"), 0), None);
}

#[test]
fn test_bindings_must_advance() {
    let mut ubc = Ubc::new();
    let a = literal(&mut ubc, 1);
    let memories = ubc.memories_mut();
    let scope = memories.alloc_root();
    memories.bind(scope, id("a"), 3, a).unwrap();
    assert_eq!(
        memories.bind(scope, id("b"), 3, a),
        Err(NodeError::BindingOutOfOrder {
            identifier: "b".to_string(),
            line: 3,
            last: 3
        })
    );
    assert_eq!(
        memories.bind(MemoryId::NONE, id("b"), 4, a),
        Err(NodeError::UnknownScope(MemoryId::NONE))
    );
}

#[test]
fn test_build_in_existing_scope() {
    let mut ubc = Ubc::new();
    let x = literal(&mut ubc, 100);
    let y = literal(&mut ubc, 200);
    let memories = ubc.memories_mut();
    let scope = memories.alloc_root();
    memories.bind(scope, id("x"), 0, x).unwrap();
    memories.bind(scope, id("y"), 4, y).unwrap();

    let sum = Expr::add(Expr::ident("x"), Expr::ident("y"));
    let early = ubc.build_in(&sum, scope, 1);
    let late = ubc.build_in(&sum, scope, 4);
    ubc.run(early).unwrap();
    ubc.run(late).unwrap();

    assert!(ubc.is_abstract(early), "y is not visible from line 1");
    assert_eq!(ubc.value(late), Ok(300));
}

#[test]
fn test_block_scope_parent_is_enclosing_scope() {
    let mut ubc = Ubc::new();
    let root = ubc.build(&Expr::brane(vec![
        Expr::assign("a", Expr::int(1)),
        Expr::assign("b", Expr::brane(vec![])),
    ]));
    ubc.run(root).unwrap();
    let outer = ubc.scope_id(root).unwrap();
    let b = ubc.lookup(outer, &id("b"), 1).unwrap();
    let inner = ubc.scope(b).unwrap();
    assert_eq!(inner.parent(), outer);
    assert_eq!(inner.creation_line(), 1);
    assert!(inner.is_empty());
    assert_eq!(ubc.scope(root).unwrap().len(), 2);
}
