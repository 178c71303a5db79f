use cgmath::{Matrix4, SquareMatrix, Vector3};
use scene_ngin::{Node, SceneError, SceneNode, Transform};

use crate::common::test_utils::{assert_matrix_eq, init, names, sample_tree};

mod common;

#[test]
fn should_attach_and_report_parent_and_children() {
    init();
    let t = sample_tree();

    assert_eq!(t.a.parent(), Some(t.root.clone()));
    assert_eq!(names(t.root.children()), vec!["a", "b"]);
    assert_eq!(names(t.a.children()), vec!["a1", "a2"]);
    assert!(t.root.parent().is_none());
}

#[test]
fn should_move_node_when_reparented() {
    let t = sample_tree();

    t.a1.attach_to(&t.b).unwrap();

    assert_eq!(names(t.a.children()), vec!["a2"]);
    assert_eq!(names(t.b.children()), vec!["a1"]);
    assert_eq!(t.a1.parent(), Some(t.b.clone()));
}

#[test]
fn should_append_when_reattached_to_same_parent() {
    let t = sample_tree();

    t.a.attach_to(&t.root).unwrap();

    assert_eq!(names(t.root.children()), vec!["b", "a"]);
}

#[test]
fn should_reject_attaching_under_descendant() {
    let t = sample_tree();

    let err = t.a.attach_to(&t.a1).unwrap_err();

    assert!(matches!(err, SceneError::Cycle { .. }));
    assert_eq!(t.a.parent(), Some(t.root.clone()));
    assert_eq!(names(t.a.children()), vec!["a1", "a2"]);
    assert!(t.a1.children().is_empty());
}

#[test]
fn should_reject_attaching_under_self() {
    let node = Node::with_name("solo");

    assert!(matches!(
        node.attach_to(&node),
        Err(SceneError::Cycle { .. })
    ));
    assert!(node.parent().is_none());
}

#[test]
fn should_detach_once_and_ignore_repeats() {
    let t = sample_tree();

    t.b.detach();
    assert!(t.b.parent().is_none());
    assert_eq!(names(t.root.children()), vec!["a"]);

    t.b.detach();
    assert_eq!(names(t.root.children()), vec!["a"]);
}

#[test]
fn should_visit_all_nodes_in_pre_order() {
    let t = sample_tree();

    let visited = names(t.root.visit(false));

    assert_eq!(visited, vec!["root", "a", "a1", "a2", "b"]);
}

#[test]
fn should_prune_invisible_subtrees_when_visiting_visible_only() {
    let t = sample_tree();
    t.a.set_visible(false);

    assert_eq!(names(t.root.visit(true)), vec!["root", "b"]);
    assert_eq!(t.root.visit(false).count(), 5);
}

#[test]
fn should_restart_iteration_on_every_visit() {
    let t = sample_tree();
    let mut first = t.root.visit(false);
    first.next();

    assert_eq!(t.root.visit(false).count(), 5);
    assert_eq!(first.count(), 4);
}

#[test]
fn should_find_by_name_and_root() {
    let t = sample_tree();

    assert_eq!(t.root.find("a2"), Some(t.a2.clone()));
    assert!(t.root.find("missing").is_none());
    assert_eq!(t.a2.root(), t.root);
    assert!(t.root.is_ancestor_of(&t.a2));
    assert!(!t.b.is_ancestor_of(&t.a2));
}

#[test]
fn should_display_name() {
    assert_eq!(Node::with_name("cube").to_string(), "<Node 'cube'>");
    assert_eq!(Node::new().to_string(), "<Node>");
}

#[test]
fn should_compose_world_transform_root_to_leaf() {
    let t = sample_tree();
    t.root.set_transform(Transform::scale([2.0, 2.0, 2.0]));
    t.a.set_transform(Transform::translate([1.0, 0.0, 0.0]));
    t.a1.set_transform(Transform::translate([0.0, 3.0, 0.0]));

    let expected = Matrix4::from_scale(2.0)
        * Matrix4::from_translation(Vector3::new(1.0, 0.0, 0.0))
        * Matrix4::from_translation(Vector3::new(0.0, 3.0, 0.0));
    assert_matrix_eq(&t.a1.world_transform(), &expected);
    assert_matrix_eq(&t.b.world_transform(), &Matrix4::from_scale(2.0));
}

#[test]
fn should_invalidate_cached_world_transform_on_ancestor_change() {
    let t = sample_tree();
    assert_matrix_eq(&t.a1.world_transform(), &Matrix4::identity());
    assert!(t.a1.has_cached_world_transform());

    t.root.set_transform(Transform::translate([0.0, 0.0, 5.0]));

    assert!(!t.a1.has_cached_world_transform());
    assert_matrix_eq(
        &t.a1.world_transform(),
        &Matrix4::from_translation(Vector3::new(0.0, 0.0, 5.0)),
    );
}

#[test]
fn should_invalidate_cached_world_transform_on_reparent() {
    let t = sample_tree();
    t.b.set_transform(Transform::translate([4.0, 0.0, 0.0]));
    assert_matrix_eq(&t.a1.world_transform(), &Matrix4::identity());

    t.a1.attach_to(&t.b).unwrap();

    assert_matrix_eq(
        &t.a1.world_transform(),
        &Matrix4::from_translation(Vector3::new(4.0, 0.0, 0.0)),
    );

    t.a1.detach();
    assert_matrix_eq(&t.a1.world_transform(), &Matrix4::identity());
}

#[test]
fn should_drop_subtree_with_last_root_handle() {
    let root = Node::with_name("root");
    let child = Node::new_child(&root, Some("child"));
    let held_child = child.clone();
    drop(child);

    assert_eq!(held_child.parent(), Some(root.clone()));
    drop(root);
    assert!(held_child.parent().is_none());
}

#[test]
fn should_expose_tree_capability_through_trait() {
    fn depth(node: &dyn SceneNode) -> usize {
        let mut depth = 0;
        let mut current = node.parent();
        while let Some(n) = current {
            depth += 1;
            current = n.parent();
        }
        depth
    }

    let t = sample_tree();
    assert_eq!(depth(&t.a2), 2);
    assert_eq!(depth(&t.root), 0);
}
