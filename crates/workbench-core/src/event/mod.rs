//! # Workbench Core Event System
//!
//! Two notification primitives live here:
//!
//! - **[`delegate`]**: the pull-model [`PublishSubscribeDelegate`]. Publishers
//!   notify a topic without a payload and subscribers read the current value
//!   back through a [`SnapshotGetter`]. Every stateful object in the workbench
//!   (module instances, dashboards, channels, global services) exposes its
//!   changes this way.
//! - **[`dispatcher`]**: the push-model [`EventDispatcher`], used for one-shot
//!   GUI events whose payload has no "current value" to read back.
pub mod delegate;
pub mod dispatcher;
pub mod error;

use std::fmt;
use std::hash::Hash;

/// A closed set of topics published by one kind of object.
///
/// `Snapshot` is the tagged union of values readable for those topics, which
/// keeps "payload type matches topic" checked by the compiler.
pub trait Topic: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static {
    type Snapshot: Clone + Send + Sync + 'static;
}

/// Result of event processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    /// Event was processed successfully and propagation should continue
    Continue,
    /// Event was processed and propagation should stop
    Stop,
}

/// Re-export important types
pub use delegate::{
    make_snapshot_getter, PublishSubscribe, PublishSubscribeDelegate, SnapshotGetter, Unsubscribe,
};
pub use dispatcher::{DispatchedEvent, EventDispatcher, HandlerId};
pub use error::EventSystemError;
