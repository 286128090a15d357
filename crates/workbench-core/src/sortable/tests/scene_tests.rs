use crate::sortable::{NodeKind, Rect, SceneGraph, SortableError};

fn tree() -> SceneGraph {
    let mut scene = SceneGraph::new();
    scene.register_item("a", None).unwrap();
    scene.register_group("g", None).unwrap();
    scene.register_item("g1", Some("g")).unwrap();
    scene.register_group("g2", Some("g")).unwrap();
    scene.register_item("g2a", Some("g2")).unwrap();
    scene.register_item("b", None).unwrap();
    scene
}

#[test]
fn test_registration_order_and_flatten() {
    let scene = tree();
    assert_eq!(scene.children(None), ["a", "g", "b"]);
    let order: Vec<&str> = scene.flatten().iter().map(|node| node.id.as_str()).collect();
    assert_eq!(order, ["a", "g", "g1", "g2", "g2a", "b"]);
    assert_eq!(scene.node("g2").unwrap().kind, NodeKind::Group);
    assert!(scene.is_ancestor("g", "g2a"));
    assert!(!scene.is_ancestor("g2", "g1"));
}

#[test]
fn test_registration_errors() {
    let mut scene = tree();
    assert_eq!(
        scene.register_item("a", None),
        Err(SortableError::DuplicateNode { id: "a".to_string() })
    );
    assert_eq!(
        scene.register_item("x", Some("a")),
        Err(SortableError::NotAGroup { id: "a".to_string() })
    );
    assert_eq!(
        scene.register_item("x", Some("nope")),
        Err(SortableError::UnknownNode { id: "nope".to_string() })
    );
    assert!(scene.set_header_rect("a", Some(Rect::default())).is_err());
    assert!(scene.set_rect("x", Rect::default()).is_err());
}

#[test]
fn test_unregister_removes_subtree() {
    let mut scene = tree();
    scene.unregister("g").unwrap();
    assert_eq!(scene.children(None), ["a", "b"]);
    assert!(!scene.contains("g1"));
    assert!(!scene.contains("g2a"));
    assert_eq!(scene.len(), 2);
}

#[test]
fn test_insert_at_and_move_node() {
    let mut scene = tree();
    scene.insert_at("b", 0).unwrap();
    assert_eq!(scene.children(None), ["b", "a", "g"]);
    scene.insert_at("b", 99).unwrap();
    assert_eq!(scene.children(None), ["a", "g", "b"]);

    scene.move_node("a", Some("g2"), 0).unwrap();
    assert_eq!(scene.children(Some("g2")), ["a", "g2a"]);
    assert_eq!(scene.node("a").unwrap().parent.as_deref(), Some("g2"));
    assert_eq!(scene.index_in_parent("g2a"), Some(1));

    assert!(matches!(
        scene.move_node("g", Some("g2"), 0),
        Err(SortableError::CyclicMove { .. })
    ));
    assert!(matches!(
        scene.move_node("b", Some("g1"), 0),
        Err(SortableError::NotAGroup { .. })
    ));
    // A rejected move leaves the node where it was
    assert_eq!(scene.children(None), ["g", "b"]);
}
