//! # Workbench Core Data Channels
//!
//! A module instance publishes typed data on [`Channel`]s and listens to other
//! instances through [`ChannelReceiver`]s. Each instance owns one
//! [`ChannelManager`] holding both sides.
//!
//! Removing a channel notifies its `Removed` topic and every receiver
//! listening to it drops the subscription, so a torn-down instance never
//! leaves dangling references behind in other instances.
pub mod channel;
pub mod error;
pub mod manager;
pub mod receiver;

pub use channel::{Channel, ChannelContent, ChannelDefinition, ChannelSnapshot, ChannelTopic};
pub use error::ChannelError;
pub use manager::{ChannelManager, ChannelManagerSnapshot, ChannelManagerTopic, ReceiverSubscription};
pub use receiver::{ChannelReceiver, ReceiverDefinition, ReceiverSnapshot, ReceiverTopic};

#[cfg(test)]
mod tests;
