use std::collections::HashMap;

use crate::sortable::error::SortableError;
use crate::sortable::geometry::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Item,
    Group,
}

/// A registered draggable element.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub id: String,
    pub kind: NodeKind,
    /// `None` for direct children of the list
    pub parent: Option<String>,
    pub rect: Option<Rect>,
    /// Groups only: the region that accepts drops "into" the group
    pub header_rect: Option<Rect>,
    /// Groups only: the region holding the children
    pub content_rect: Option<Rect>,
    pub children: Vec<String>,
}

/// Explicit tree of draggable items and groups.
///
/// Renderers register nodes and keep their rectangles current; the drag
/// engine only ever reads this graph.
#[derive(Debug, Default, Clone)]
pub struct SceneGraph {
    nodes: HashMap<String, SceneNode>,
    root: Vec<String>,
    list_rect: Option<Rect>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_item(&mut self, id: &str, parent: Option<&str>) -> Result<(), SortableError> {
        self.register(id, NodeKind::Item, parent)
    }

    pub fn register_group(&mut self, id: &str, parent: Option<&str>) -> Result<(), SortableError> {
        self.register(id, NodeKind::Group, parent)
    }

    fn register(&mut self, id: &str, kind: NodeKind, parent: Option<&str>) -> Result<(), SortableError> {
        if self.nodes.contains_key(id) {
            return Err(SortableError::DuplicateNode { id: id.to_string() });
        }
        self.children_mut(parent)?.push(id.to_string());
        self.nodes.insert(
            id.to_string(),
            SceneNode {
                id: id.to_string(),
                kind,
                parent: parent.map(str::to_string),
                rect: None,
                header_rect: None,
                content_rect: None,
                children: Vec::new(),
            },
        );
        Ok(())
    }

    fn children_mut(&mut self, parent: Option<&str>) -> Result<&mut Vec<String>, SortableError> {
        let Some(parent) = parent else {
            return Ok(&mut self.root);
        };
        let node = self
            .nodes
            .get_mut(parent)
            .ok_or_else(|| SortableError::UnknownNode { id: parent.to_string() })?;
        if node.kind != NodeKind::Group {
            return Err(SortableError::NotAGroup { id: parent.to_string() });
        }
        Ok(&mut node.children)
    }

    /// Remove `id` together with everything nested under it.
    pub fn unregister(&mut self, id: &str) -> Result<(), SortableError> {
        let node = self.node(id)?;
        let parent = node.parent.clone();
        self.children_mut(parent.as_deref())?.retain(|child| child != id);

        let mut stack = vec![id.to_string()];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.remove(&next) {
                stack.extend(node.children);
            }
        }
        Ok(())
    }

    /// Move `id` to `index` among its current siblings. Out of range indices
    /// append.
    pub fn insert_at(&mut self, id: &str, index: usize) -> Result<(), SortableError> {
        let parent = self.node(id)?.parent.clone();
        self.move_node(id, parent.as_deref(), index)
    }

    /// Re-parent `id` under `parent` at `index`, counted without `id` itself.
    pub fn move_node(&mut self, id: &str, parent: Option<&str>, index: usize) -> Result<(), SortableError> {
        let old_parent = self.node(id)?.parent.clone();
        if let Some(parent) = parent {
            if parent == id || self.is_ancestor(id, parent) {
                return Err(SortableError::CyclicMove {
                    id: id.to_string(),
                    parent: parent.to_string(),
                });
            }
        }
        // Validate the destination before detaching.
        self.children_mut(parent)?;
        self.children_mut(old_parent.as_deref())?.retain(|child| child != id);
        let siblings = self.children_mut(parent)?;
        let index = index.min(siblings.len());
        siblings.insert(index, id.to_string());
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = parent.map(str::to_string);
        }
        Ok(())
    }

    pub fn set_rect(&mut self, id: &str, rect: Rect) -> Result<(), SortableError> {
        self.node_mut(id)?.rect = Some(rect);
        Ok(())
    }

    pub fn set_header_rect(&mut self, id: &str, rect: Option<Rect>) -> Result<(), SortableError> {
        self.group_mut(id)?.header_rect = rect;
        Ok(())
    }

    pub fn set_content_rect(&mut self, id: &str, rect: Option<Rect>) -> Result<(), SortableError> {
        self.group_mut(id)?.content_rect = rect;
        Ok(())
    }

    /// Outer bounds of the whole list.
    pub fn set_list_rect(&mut self, rect: Rect) {
        self.list_rect = Some(rect);
    }

    pub fn list_rect(&self) -> Option<Rect> {
        self.list_rect
    }

    pub fn node(&self, id: &str) -> Result<&SceneNode, SortableError> {
        self.nodes
            .get(id)
            .ok_or_else(|| SortableError::UnknownNode { id: id.to_string() })
    }

    fn node_mut(&mut self, id: &str) -> Result<&mut SceneNode, SortableError> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| SortableError::UnknownNode { id: id.to_string() })
    }

    fn group_mut(&mut self, id: &str) -> Result<&mut SceneNode, SortableError> {
        let node = self.node_mut(id)?;
        if node.kind != NodeKind::Group {
            return Err(SortableError::NotAGroup { id: id.to_string() });
        }
        Ok(node)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Children of `parent`, or of the list for `None`. Unknown parents have none.
    pub fn children(&self, parent: Option<&str>) -> &[String] {
        match parent {
            None => &self.root,
            Some(parent) => self
                .nodes
                .get(parent)
                .map(|node| node.children.as_slice())
                .unwrap_or(&[]),
        }
    }

    /// Position of `id` among its siblings.
    pub fn index_in_parent(&self, id: &str) -> Option<usize> {
        let node = self.nodes.get(id)?;
        self.children(node.parent.as_deref())
            .iter()
            .position(|child| child == id)
    }

    /// Whether `ancestor` is a strict ancestor of `id`.
    pub fn is_ancestor(&self, ancestor: &str, id: &str) -> bool {
        let mut current = self.nodes.get(id).and_then(|node| node.parent.as_deref());
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.nodes.get(parent).and_then(|node| node.parent.as_deref());
        }
        false
    }

    /// All nodes in document order: each group is followed by its children.
    pub fn flatten(&self) -> Vec<&SceneNode> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<&String> = self.root.iter().rev().collect();
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get(id) {
                out.push(node);
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }
}
