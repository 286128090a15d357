use std::fmt;
use std::time::Instant;

use crate::sortable::autoscroll::AutoScroller;
use crate::sortable::error::SortableError;
use crate::sortable::geometry::{Point, Rect};
use crate::sortable::hover::{classify, HoverArea};
use crate::sortable::listeners::DocumentListeners;
use crate::sortable::scene::{NodeKind, SceneGraph};
use crate::storage::DragConfig;

/// A fully resolved candidate move, as seen by the move predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveArgs {
    pub moved_item_id: String,
    pub moved_item_type: NodeKind,
    /// `None` when the item sits directly in the list
    pub origin_id: Option<String>,
    pub origin_type: Option<NodeKind>,
    pub destination_id: Option<String>,
    pub destination_type: Option<NodeKind>,
    pub position: usize,
}

/// Current drop target of a drag.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverTarget {
    /// Element under the pointer. `None` when dropping into an empty list.
    pub element_id: Option<String>,
    pub area: HoverArea,
    pub destination_id: Option<String>,
    /// Index among the destination's children, not counting the dragged node
    pub position: usize,
}

/// Delivered once per accepted drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemMoved {
    pub moved_id: String,
    pub origin_id: Option<String>,
    pub destination_id: Option<String>,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragState {
    Idle,
    /// Pressed on a handle, pointer has not travelled far enough yet
    Armed { id: String, start: Point, offset: Point },
    Dragging {
        id: String,
        pointer: Point,
        offset: Point,
        hover: Option<HoverTarget>,
    },
}

type MovePredicate = Box<dyn Fn(&MoveArgs) -> bool + Send>;
type MoveCallback = Box<dyn FnMut(&ItemMoved) + Send>;

/// Pointer-driven reorder engine over a [`SceneGraph`].
///
/// `Idle -> Armed -> Dragging -> Idle`. Document listeners are attached on
/// arming and detached on every way back to `Idle`, including drop.
pub struct SortableEngine {
    config: DragConfig,
    scene: SceneGraph,
    state: DragState,
    listeners: Box<dyn DocumentListeners>,
    listeners_attached: bool,
    scroller: AutoScroller,
    scroll_container: Option<Rect>,
    is_move_allowed: Option<MovePredicate>,
    on_item_moved: Option<MoveCallback>,
}

impl SortableEngine {
    pub fn new(config: DragConfig, listeners: Box<dyn DocumentListeners>) -> Self {
        Self {
            scroller: AutoScroller::new(&config),
            config,
            scene: SceneGraph::new(),
            state: DragState::Idle,
            listeners,
            listeners_attached: false,
            scroll_container: None,
            is_move_allowed: None,
            on_item_moved: None,
        }
    }

    pub fn with_move_allowed<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&MoveArgs) -> bool + Send + 'static,
    {
        self.is_move_allowed = Some(Box::new(predicate));
        self
    }

    pub fn with_on_item_moved<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&ItemMoved) + Send + 'static,
    {
        self.on_item_moved = Some(Box::new(callback));
        self
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    pub fn set_scroll_container(&mut self, rect: Option<Rect>) {
        self.scroll_container = rect;
        if rect.is_none() {
            self.scroller.stop();
        }
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == DragState::Idle
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn dragged_id(&self) -> Option<&str> {
        match &self.state {
            DragState::Idle => None,
            DragState::Armed { id, .. } | DragState::Dragging { id, .. } => Some(id),
        }
    }

    pub fn hover(&self) -> Option<&HoverTarget> {
        match &self.state {
            DragState::Dragging { hover, .. } => hover.as_ref(),
            _ => None,
        }
    }

    /// Pointer position relative to the dragged node's top-left corner.
    pub fn drag_offset(&self) -> Option<Point> {
        match &self.state {
            DragState::Idle => None,
            DragState::Armed { offset, .. } | DragState::Dragging { offset, .. } => Some(*offset),
        }
    }

    /// Press on the drag handle of `id`.
    pub fn pointer_down(&mut self, id: &str, point: Point) -> Result<(), SortableError> {
        if let Some(active) = self.dragged_id() {
            return Err(SortableError::DragInProgress { id: active.to_string() });
        }
        let node = self.scene.node(id)?;
        let offset = node
            .rect
            .map(|rect| Point::new(point.x - rect.left(), point.y - rect.top()))
            .unwrap_or_default();
        self.listeners.attach();
        self.listeners_attached = true;
        self.state = DragState::Armed {
            id: id.to_string(),
            start: point,
            offset,
        };
        log::trace!("Armed drag on '{}'", id);
        Ok(())
    }

    /// Track the pointer. Returns the hover target after this move.
    pub fn pointer_move(&mut self, point: Point, now: Instant) -> Option<HoverTarget> {
        let (id, offset) = match &self.state {
            DragState::Idle => return None,
            DragState::Armed { id, start, offset } => {
                if start.distance_to(point) < self.config.threshold_px {
                    return None;
                }
                log::debug!("Started dragging '{}'", id);
                (id.clone(), *offset)
            }
            DragState::Dragging { id, offset, .. } => (id.clone(), *offset),
        };

        let hover = self
            .resolve_hover(&id, point)
            .filter(|target| self.accepts(&id, target));
        if let Some(container) = self.scroll_container {
            self.scroller.update(point, container, now);
        }
        self.state = DragState::Dragging {
            id,
            pointer: point,
            offset,
            hover: hover.clone(),
        };
        hover
    }

    /// Scroll delta due at `now` while dragging.
    pub fn tick(&mut self, now: Instant) -> Option<f64> {
        if !self.is_dragging() {
            return None;
        }
        self.scroller.tick(now)
    }

    /// Release the pointer. Fires `on_item_moved` when the drop is accepted.
    pub fn pointer_up(&mut self) -> Option<ItemMoved> {
        let state = std::mem::replace(&mut self.state, DragState::Idle);
        let moved = match state {
            DragState::Dragging {
                id,
                hover: Some(target),
                ..
            } if self.accepts(&id, &target) => {
                let origin_id = self.scene.node(&id).ok().and_then(|node| node.parent.clone());
                Some(ItemMoved {
                    moved_id: id,
                    origin_id,
                    destination_id: target.destination_id,
                    position: target.position,
                })
            }
            _ => None,
        };
        self.end_gesture();

        if let Some(moved) = &moved {
            log::debug!(
                "Moved '{}' to {:?} at {}",
                moved.moved_id,
                moved.destination_id,
                moved.position
            );
            if let Some(callback) = self.on_item_moved.as_mut() {
                callback(moved);
            }
        }
        moved
    }

    pub fn escape(&mut self) {
        self.cancel("escape");
    }

    pub fn window_blur(&mut self) {
        self.cancel("window blur");
    }

    /// The list is going away; abandon any gesture.
    pub fn unmount(&mut self) {
        self.cancel("unmount");
    }

    fn cancel(&mut self, reason: &str) {
        if let Some(id) = self.dragged_id() {
            log::debug!("Drag of '{}' cancelled by {}", id, reason);
        }
        self.end_gesture();
    }

    fn end_gesture(&mut self) {
        if self.listeners_attached {
            self.listeners.detach();
            self.listeners_attached = false;
        }
        self.state = DragState::Idle;
        self.scroller.stop();
    }

    fn accepts(&self, id: &str, target: &HoverTarget) -> bool {
        let Some(predicate) = &self.is_move_allowed else {
            return true;
        };
        self.move_args(id, target)
            .map(|args| predicate(&args))
            .unwrap_or(false)
    }

    fn move_args(&self, id: &str, target: &HoverTarget) -> Option<MoveArgs> {
        let node = self.scene.node(id).ok()?;
        let kind_of = |id: &Option<String>| {
            id.as_deref()
                .and_then(|id| self.scene.node(id).ok())
                .map(|node| node.kind)
        };
        Some(MoveArgs {
            moved_item_id: id.to_string(),
            moved_item_type: node.kind,
            origin_type: kind_of(&node.parent),
            origin_id: node.parent.clone(),
            destination_type: kind_of(&target.destination_id),
            destination_id: target.destination_id.clone(),
            position: target.position,
        })
    }

    /// Geometric drop target for dragging `dragged` with the pointer at
    /// `point`, ignoring the move predicate.
    pub fn resolve_hover(&self, dragged: &str, point: Point) -> Option<HoverTarget> {
        let dragged_node = self.scene.node(dragged).ok()?;
        let candidate = self
            .scene
            .flatten()
            .into_iter()
            .rev()
            .find(|node| node.rect.is_some_and(|rect| rect.contains(point)));

        let (target, area) = match candidate {
            Some(node) => (node, classify(node, point, &self.config)?),
            None => {
                if !self.scene.list_rect().is_some_and(|rect| rect.contains(point)) {
                    return None;
                }
                let Some(last) = self.scene.children(None).last() else {
                    return Some(HoverTarget {
                        element_id: None,
                        area: HoverArea::Bottom,
                        destination_id: None,
                        position: 0,
                    });
                };
                (self.scene.node(last).ok()?, HoverArea::Bottom)
            }
        };

        if target.id == dragged || self.scene.is_ancestor(dragged, &target.id) {
            return None;
        }

        let (destination_id, position) = match (target.kind, area) {
            (NodeKind::Item, HoverArea::Header | HoverArea::Center) => return None,
            (NodeKind::Group, HoverArea::Header) => {
                if dragged_node.parent.as_deref() == Some(target.id.as_str()) {
                    return None;
                }
                (Some(target.id.clone()), 0)
            }
            (NodeKind::Group, HoverArea::Center) => {
                // Without a content rect the whole body counts as content
                let over_content = target
                    .content_rect
                    .is_none_or(|content| content.contains(point));
                if over_content && !target.children.is_empty() {
                    return None;
                }
                (Some(target.id.clone()), 0)
            }
            (_, HoverArea::Top | HoverArea::Bottom) => {
                let index = self
                    .scene
                    .children(target.parent.as_deref())
                    .iter()
                    .filter(|child| child.as_str() != dragged)
                    .position(|child| *child == target.id)?;
                let offset = usize::from(area == HoverArea::Bottom);
                (target.parent.clone(), index + offset)
            }
        };

        if destination_id == dragged_node.parent
            && self.scene.index_in_parent(dragged) == Some(position)
        {
            return None;
        }

        Some(HoverTarget {
            element_id: Some(target.id.clone()),
            area,
            destination_id,
            position,
        })
    }
}

impl Drop for SortableEngine {
    fn drop(&mut self) {
        self.end_gesture();
    }
}

impl fmt::Debug for SortableEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortableEngine")
            .field("state", &self.state)
            .field("nodes", &self.scene.len())
            .field("scroll", &self.scroller.direction())
            .finish()
    }
}
