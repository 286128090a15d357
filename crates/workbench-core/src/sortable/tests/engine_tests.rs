use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::sortable::{
    DocumentListeners, HoverArea, ItemMoved, NodeKind, Point, Rect, SortableEngine, SortableError,
};
use crate::storage::DragConfig;

#[derive(Clone, Default)]
struct ListenerLog {
    attached: Arc<AtomicUsize>,
    detached: Arc<AtomicUsize>,
}

impl ListenerLog {
    fn counts(&self) -> (usize, usize) {
        (
            self.attached.load(Ordering::SeqCst),
            self.detached.load(Ordering::SeqCst),
        )
    }
}

impl DocumentListeners for ListenerLog {
    fn attach(&mut self) {
        self.attached.fetch_add(1, Ordering::SeqCst);
    }

    fn detach(&mut self) {
        self.detached.fetch_add(1, Ordering::SeqCst);
    }
}

/// Root list `[a, b, c, g, e]`. `g` holds `g1` and `e` is an empty group.
///
/// ```text
///   0..30  a        100..200 g (header 100..120, content 120..200)
///  30..60  b        120..150   g1
///  60..90  c        210..270 e (header 210..230)
/// ```
fn engine(log: &ListenerLog) -> SortableEngine {
    engine_with(log, DragConfig::default())
}

fn engine_with(log: &ListenerLog, config: DragConfig) -> SortableEngine {
    let mut engine = SortableEngine::new(config, Box::new(log.clone()));
    let scene = engine.scene_mut();
    scene.set_list_rect(Rect::new(0.0, 0.0, 100.0, 300.0));
    for (i, id) in ["a", "b", "c"].iter().enumerate() {
        scene.register_item(id, None).unwrap();
        scene
            .set_rect(id, Rect::new(0.0, 30.0 * i as f64, 100.0, 30.0))
            .unwrap();
    }
    scene.register_group("g", None).unwrap();
    scene.set_rect("g", Rect::new(0.0, 100.0, 100.0, 100.0)).unwrap();
    scene
        .set_header_rect("g", Some(Rect::new(0.0, 100.0, 100.0, 20.0)))
        .unwrap();
    scene
        .set_content_rect("g", Some(Rect::new(0.0, 120.0, 100.0, 80.0)))
        .unwrap();
    scene.register_item("g1", Some("g")).unwrap();
    scene.set_rect("g1", Rect::new(0.0, 120.0, 100.0, 30.0)).unwrap();
    scene.register_group("e", None).unwrap();
    scene.set_rect("e", Rect::new(0.0, 210.0, 100.0, 60.0)).unwrap();
    scene
        .set_header_rect("e", Some(Rect::new(0.0, 210.0, 100.0, 20.0)))
        .unwrap();
    engine
}

fn at(y: f64) -> Point {
    Point::new(50.0, y)
}

#[test]
fn test_position_arithmetic() {
    let engine = engine(&ListenerLog::default());

    let below_b = engine.resolve_hover("a", at(50.0)).unwrap();
    assert_eq!(below_b.area, HoverArea::Bottom);
    assert_eq!(below_b.destination_id, None);
    assert_eq!(below_b.position, 1);

    let above_b = engine.resolve_hover("c", at(35.0)).unwrap();
    assert_eq!(above_b.area, HoverArea::Top);
    assert_eq!(above_b.position, 1);

    let above_a = engine.resolve_hover("c", at(5.0)).unwrap();
    assert_eq!(above_a.position, 0);
}

#[test]
fn test_same_slot_is_rejected() {
    let engine = engine(&ListenerLog::default());
    // TOP of b resolves to position 0, which is where a already is
    assert_eq!(engine.resolve_hover("a", at(35.0)), None);
    // BOTTOM of a and TOP of c are b's own slot
    assert_eq!(engine.resolve_hover("b", at(25.0)), None);
    assert_eq!(engine.resolve_hover("b", at(65.0)), None);
    // Hovering yourself
    assert_eq!(engine.resolve_hover("b", at(45.0)), None);
}

#[test]
fn test_group_areas() {
    let engine = engine(&ListenerLog::default());

    let header = engine.resolve_hover("a", at(115.0)).unwrap();
    assert_eq!(header.area, HoverArea::Header);
    assert_eq!(header.destination_id.as_deref(), Some("g"));
    assert_eq!(header.position, 0);

    // Group bands are capped, so 105 is TOP of g rather than its header
    let top = engine.resolve_hover("a", at(105.0)).unwrap();
    assert_eq!(top.area, HoverArea::Top);
    assert_eq!(top.destination_id, None);
    assert_eq!(top.position, 2);

    // Filled content area between children is not a target
    assert_eq!(engine.resolve_hover("a", at(170.0)), None);

    // An empty group's interior accepts the drop
    let into_empty = engine.resolve_hover("a", at(250.0)).unwrap();
    assert_eq!(into_empty.area, HoverArea::Center);
    assert_eq!(into_empty.destination_id.as_deref(), Some("e"));
}

#[test]
fn test_group_body_outside_content_drops_into_group() {
    let mut engine = engine(&ListenerLog::default());
    // Footer 160..200 below the content area of g
    engine
        .scene_mut()
        .set_content_rect("g", Some(Rect::new(0.0, 120.0, 100.0, 40.0)))
        .unwrap();

    let footer = engine.resolve_hover("a", at(175.0)).unwrap();
    assert_eq!(footer.element_id.as_deref(), Some("g"));
    assert_eq!(footer.area, HoverArea::Center);
    assert_eq!(footer.destination_id.as_deref(), Some("g"));
    assert_eq!(footer.position, 0);

    // Gap inside the filled content area stays rejected
    assert_eq!(engine.resolve_hover("a", at(155.0)), None);
    // g1 is already first in g
    assert_eq!(engine.resolve_hover("g1", at(175.0)), None);
}

#[test]
fn test_group_without_content_rect_rejects_whole_body() {
    let mut engine = engine(&ListenerLog::default());
    engine.scene_mut().set_content_rect("g", None).unwrap();
    assert_eq!(engine.resolve_hover("a", at(175.0)), None);
}

#[test]
fn test_item_interior_is_not_a_target() {
    let config = DragConfig {
        item_edge_fraction: 0.25,
        ..DragConfig::default()
    };
    let engine = engine_with(&ListenerLog::default(), config);
    // Middle of b, outside both 7.5px bands
    assert_eq!(engine.resolve_hover("a", at(45.0)), None);
    assert!(engine.resolve_hover("a", at(55.0)).is_some());
}

#[test]
fn test_parent_header_and_own_subtree_are_rejected() {
    let engine = engine(&ListenerLog::default());
    assert_eq!(engine.resolve_hover("g1", at(115.0)), None);
    assert_eq!(engine.resolve_hover("g", at(130.0)), None);

    let out_of_group = engine.resolve_hover("g1", at(50.0)).unwrap();
    assert_eq!(out_of_group.destination_id, None);
    assert_eq!(out_of_group.position, 2);
}

#[test]
fn test_empty_space_in_list_targets_end() {
    let engine = engine(&ListenerLog::default());
    let end = engine.resolve_hover("a", at(290.0)).unwrap();
    assert_eq!(end.element_id.as_deref(), Some("e"));
    assert_eq!(end.area, HoverArea::Bottom);
    assert_eq!(end.position, 4);

    assert_eq!(engine.resolve_hover("a", at(400.0)), None);
}

#[test]
fn test_drag_fires_on_item_moved_once() {
    let log = ListenerLog::default();
    let moves: Arc<Mutex<Vec<ItemMoved>>> = Arc::default();
    let m = moves.clone();
    let mut engine = engine(&log).with_on_item_moved(move |moved| {
        m.lock().unwrap().push(moved.clone());
    });
    let now = Instant::now();

    engine.pointer_down("a", at(5.0)).unwrap();
    assert_eq!(log.counts(), (1, 0));
    assert_eq!(engine.drag_offset(), Some(Point::new(50.0, 5.0)));

    // Below the threshold nothing happens yet
    assert_eq!(engine.pointer_move(at(7.0), now), None);
    assert!(!engine.is_dragging());

    let hover = engine.pointer_move(at(50.0), now).unwrap();
    assert!(engine.is_dragging());
    assert_eq!(hover.position, 1);

    let moved = engine.pointer_up().unwrap();
    assert_eq!(
        moved,
        ItemMoved {
            moved_id: "a".to_string(),
            origin_id: None,
            destination_id: None,
            position: 1,
        }
    );
    assert_eq!(*moves.lock().unwrap(), vec![moved]);
    assert_eq!(log.counts(), (1, 1));
    assert!(engine.is_idle());

    // A second release is a no-op
    assert_eq!(engine.pointer_up(), None);
    assert_eq!(log.counts(), (1, 1));
}

#[test]
fn test_release_without_target_does_not_fire() {
    let log = ListenerLog::default();
    let fired = Arc::new(AtomicUsize::new(0));
    let f = fired.clone();
    let mut engine = engine(&log).with_on_item_moved(move |_| {
        f.fetch_add(1, Ordering::SeqCst);
    });

    engine.pointer_down("b", at(45.0)).unwrap();
    engine.pointer_move(at(65.0), Instant::now());
    assert!(engine.hover().is_none());
    assert_eq!(engine.pointer_up(), None);
    assert_eq!(fired.load(Ordering::SeqCst), 0);
    assert_eq!(log.counts(), (1, 1));
}

#[test]
fn test_predicate_veto_clears_hover() {
    let log = ListenerLog::default();
    let seen: Arc<Mutex<Vec<NodeKind>>> = Arc::default();
    let s = seen.clone();
    let mut engine = engine(&log).with_move_allowed(move |args| {
        s.lock().unwrap().extend(args.destination_type);
        args.destination_id.is_none()
    });

    engine.pointer_down("a", at(5.0)).unwrap();
    assert!(engine.pointer_move(at(115.0), Instant::now()).is_none());
    assert_eq!(*seen.lock().unwrap(), vec![NodeKind::Group]);

    assert!(engine.pointer_move(at(50.0), Instant::now()).is_some());
    assert!(engine.pointer_up().is_some());
}

#[test]
fn test_every_exit_path_detaches_once() {
    let exits: [fn(&mut SortableEngine); 3] = [
        SortableEngine::escape,
        SortableEngine::window_blur,
        SortableEngine::unmount,
    ];
    for exit in exits {
        let log = ListenerLog::default();
        let mut engine = engine(&log);
        engine.pointer_down("a", at(5.0)).unwrap();
        engine.pointer_move(at(50.0), Instant::now());
        exit(&mut engine);
        assert!(engine.is_idle());
        assert_eq!(log.counts(), (1, 1));
        exit(&mut engine);
        assert_eq!(log.counts(), (1, 1));
    }

    let log = ListenerLog::default();
    {
        let mut engine = engine(&log);
        engine.pointer_down("a", at(5.0)).unwrap();
    }
    assert_eq!(log.counts(), (1, 1), "drop while armed");

    let log = ListenerLog::default();
    drop(engine(&log));
    assert_eq!(log.counts(), (0, 0), "idle drop has nothing to detach");
}

#[test]
fn test_single_drag_at_a_time() {
    let mut engine = engine(&ListenerLog::default());
    engine.pointer_down("a", at(5.0)).unwrap();
    assert_eq!(
        engine.pointer_down("b", at(45.0)),
        Err(SortableError::DragInProgress { id: "a".to_string() })
    );
    assert!(matches!(
        SortableEngine::new(DragConfig::default(), Box::new(ListenerLog::default()))
            .pointer_down("ghost", at(0.0)),
        Err(SortableError::UnknownNode { .. })
    ));
}

#[test]
fn test_autoscroll_runs_only_while_dragging() {
    let mut engine = engine(&ListenerLog::default());
    engine.set_scroll_container(Some(Rect::new(0.0, 0.0, 100.0, 300.0)));
    let t0 = Instant::now();

    engine.pointer_down("c", at(65.0)).unwrap();
    engine.pointer_move(at(10.0), t0);
    assert_eq!(engine.tick(t0 + Duration::from_millis(100)), Some(-10.0));

    engine.escape();
    assert_eq!(engine.tick(t0 + Duration::from_millis(500)), None);
}
