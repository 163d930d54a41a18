use pretty_assertions::assert_eq;

use super::*;

fn chain() -> (ScopeTree, ScopeId, ScopeId, ScopeId) {
    let mut tree = ScopeTree::new();
    let func = tree.push(ScopeId::MODULE, ScopeKind::Function, Span::DUMMY);
    let unsafe_block = tree.push(func, ScopeKind::Unsafe, Span::DUMMY);
    let inner = tree.push(unsafe_block, ScopeKind::Block, Span::DUMMY);
    (tree, func, unsafe_block, inner)
}

#[test]
fn depth_increases_by_one() {
    let (tree, func, unsafe_block, inner) = chain();
    assert_eq!(tree.depth(ScopeId::MODULE), 0);
    assert_eq!(tree.depth(func), 1);
    assert_eq!(tree.depth(unsafe_block), 2);
    assert_eq!(tree.depth(inner), 3);
}

#[test]
fn ancestry() {
    let (mut tree, func, unsafe_block, inner) = chain();
    let sibling = tree.push(func, ScopeKind::Block, Span::DUMMY);

    assert!(tree.is_ancestor_or_equal(ScopeId::MODULE, inner));
    assert!(tree.is_ancestor_or_equal(func, inner));
    assert!(tree.is_ancestor_or_equal(inner, inner));
    assert!(!tree.is_ancestor_or_equal(inner, func));
    assert!(!tree.is_ancestor_or_equal(sibling, inner));
    assert!(!tree.is_ancestor_or_equal(unsafe_block, sibling));
    assert_eq!(
        tree.ancestors(inner).collect::<Vec<_>>(),
        vec![inner, unsafe_block, func, ScopeId::MODULE]
    );
}

#[test]
fn unsafe_is_inherited() {
    let (tree, func, unsafe_block, inner) = chain();
    assert!(!tree.in_unsafe(func));
    assert!(tree.in_unsafe(unsafe_block));
    assert!(tree.in_unsafe(inner));
}

#[test]
fn deeper_picks_the_inner_scope() {
    let (tree, func, _, inner) = chain();
    assert_eq!(tree.deeper(func, inner), inner);
    assert_eq!(tree.deeper(inner, func), inner);
}

#[test]
fn sealing_marks_scope() {
    let (mut tree, func, _, _) = chain();
    tree.seal(func);
    assert!(tree.get(func).is_some_and(|s| s.sealed));
    assert!(!tree.get(ScopeId::MODULE).is_some_and(|s| s.sealed));
}
