//! # Workbench Core State Store
//!
//! [`StateStore`] is the per-key observable container behind module instance
//! state, GUI state and interface derivations. The key set is fixed when the
//! store is built. Touching any other key is a [`StateStoreError::UnknownKey`].
pub mod error;
pub mod store;

pub use error::StateStoreError;
pub use store::{StateKeyOptions, StateKeySpec, StateStore};

#[cfg(test)]
mod tests;
