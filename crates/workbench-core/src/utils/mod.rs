//! Small helpers shared by every subsystem.
use std::sync::{Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

#[cfg(test)]
pub(crate) mod testing;

/// Lock a mutex, recovering the guard if a previous holder panicked.
///
/// Every mutex in the crate guards plain data that is left consistent after
/// each individual write, so a poisoned lock carries no broken invariant.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Generate a fresh random (v4) identifier.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}
