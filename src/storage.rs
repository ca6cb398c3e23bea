//! Tensor storage abstraction
//!
//! A `Storage` is a flat, shared element buffer. Several tensor handles may
//! point at the same storage with different layouts; that is how in-place
//! operations and views are expressed. Cloning a `Storage` aliases it, it
//! never copies.

use crate::error::{Result, VoltaError};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Shared, lock-protected element buffer
pub struct Storage<T> {
    inner: Arc<RwLock<Vec<T>>>,
}

impl<T> Clone for Storage<T> {
    fn clone(&self) -> Self {
        Storage {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Storage<T> {
    /// Create new storage owning `data`
    pub fn new(data: Vec<T>) -> Self {
        Storage {
            inner: Arc::new(RwLock::new(data)),
        }
    }

    /// True when both handles refer to the same buffer
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of handles currently sharing this buffer
    #[must_use]
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Acquire shared access to the buffer
    pub fn read(&self) -> Result<RwLockReadGuard<'_, Vec<T>>> {
        self.inner.read().map_err(|_| VoltaError::PoisonedStorage)
    }

    /// Acquire exclusive access to the buffer
    pub fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<T>>> {
        self.inner.write().map_err(|_| VoltaError::PoisonedStorage)
    }

    /// Get the length
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    /// Check if empty
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl<T: Clone> Storage<T> {
    /// Copy the whole buffer out
    pub fn to_vec(&self) -> Result<Vec<T>> {
        Ok(self.read()?.clone())
    }
}

impl<T> std::fmt::Debug for Storage<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.try_read() {
            Ok(data) => write!(f, "Storage({} elements)", data.len()),
            Err(_) => write!(f, "Storage(<locked>)"),
        }
    }
}
