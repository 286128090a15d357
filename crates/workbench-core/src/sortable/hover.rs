use crate::sortable::geometry::{Point, Rect};
use crate::sortable::scene::{NodeKind, SceneNode};
use crate::storage::DragConfig;

/// Where on a node the pointer is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HoverArea {
    /// Insert before the node
    Top,
    /// Insert after the node
    Bottom,
    /// Groups only: drop into the group as first child
    Header,
    /// Interior outside the bands and the header
    Center,
}

/// Height of the TOP and BOTTOM bands of `node`.
pub fn edge_band(kind: NodeKind, rect: &Rect, config: &DragConfig) -> f64 {
    match kind {
        NodeKind::Item => rect.height * config.item_edge_fraction,
        NodeKind::Group => (rect.height * config.group_edge_fraction).min(config.group_edge_cap_px),
    }
}

/// Classify `point` against `node`. `None` when the node has no rectangle
/// or the point lies outside it.
pub fn classify(node: &SceneNode, point: Point, config: &DragConfig) -> Option<HoverArea> {
    let rect = node.rect?;
    if !rect.contains(point) {
        return None;
    }
    let band = edge_band(node.kind, &rect, config);
    if point.y < rect.top() + band {
        return Some(HoverArea::Top);
    }
    if point.y > rect.bottom() - band {
        return Some(HoverArea::Bottom);
    }
    match node.kind {
        NodeKind::Group if node.header_rect.is_some_and(|header| header.contains(point)) => {
            Some(HoverArea::Header)
        }
        _ => Some(HoverArea::Center),
    }
}
