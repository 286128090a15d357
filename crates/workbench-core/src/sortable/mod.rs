//! # Workbench Core Sortable Lists
//!
//! A renderer-agnostic drag-and-drop reorder engine. Renderers register the
//! items and groups they draw in a [`SceneGraph`] and keep their rectangles
//! current; the [`SortableEngine`] turns pointer input into hover targets and
//! accepted moves.
//!
//! - **[`scene`]**: the explicit tree of draggable nodes.
//! - **[`hover`]**: TOP / BOTTOM / HEADER / CENTER classification.
//! - **[`engine`]**: the `Idle -> Armed -> Dragging` state machine, move
//!   resolution and the move predicate.
//! - **[`autoscroll`]**: edge scrolling with an accelerating cadence.
pub mod autoscroll;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod hover;
pub mod listeners;
pub mod scene;

pub use autoscroll::{AutoScroller, ScrollDirection};
pub use engine::{DragState, HoverTarget, ItemMoved, MoveArgs, SortableEngine};
pub use error::SortableError;
pub use geometry::{Point, Rect};
pub use hover::{classify, HoverArea};
pub use listeners::{DocumentListeners, NoopListeners};
pub use scene::{NodeKind, SceneGraph, SceneNode};

#[cfg(test)]
mod tests;
