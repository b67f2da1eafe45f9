//! Structural completion capability.
//!
//! A submit result is treated as asynchronous when it exposes a `then`
//! continuation, not when it has a particular concrete type. Any type can opt
//! in by implementing [`MaybeThenable`]; plain values answer `None`.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Zero-argument continuation registered on a thenable.
pub type Continuation = Box<dyn FnOnce() + Send + 'static>;

/// Anything that can run a continuation once it settles.
pub trait Thenable: Send + Sync {
    /// Register `continuation` to run when this value settles.
    ///
    /// Implementations may run it immediately if already settled.
    fn then(&self, continuation: Continuation);
}

/// Capability check used by the interceptor on every submit result.
pub trait MaybeThenable {
    /// Returns the thenable view of this value, or `None` for plain values.
    fn as_thenable(&self) -> Option<&dyn Thenable>;
}

macro_rules! plain_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl MaybeThenable for $ty {
                fn as_thenable(&self) -> Option<&dyn Thenable> {
                    None
                }
            }
        )*
    };
}

plain_value!((), bool, i32, i64, u32, u64, usize, String, serde_json::Value);

impl MaybeThenable for Box<dyn Thenable> {
    fn as_thenable(&self) -> Option<&dyn Thenable> {
        Some(self.as_ref())
    }
}

impl MaybeThenable for Arc<dyn Thenable> {
    fn as_thenable(&self) -> Option<&dyn Thenable> {
        Some(self.as_ref())
    }
}

type Callback<T> = Box<dyn FnOnce(&T) + Send + 'static>;

enum DeferredState<T> {
    Pending(Vec<Callback<T>>),
    Resolved(Arc<T>),
}

/// Settle-once cell shared between a producer and any number of observers.
///
/// Clones share the same state. Callbacks registered before resolution run
/// in registration order on the thread that calls [`Deferred::resolve`];
/// callbacks registered afterwards run immediately.
pub struct Deferred<T> {
    inner: Arc<Mutex<DeferredState<T>>>,
}

impl<T: Send + Sync + 'static> Deferred<T> {
    /// Create an unresolved cell.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(DeferredState::Pending(Vec::new()))),
        }
    }

    /// Create a cell that is already resolved with `value`.
    #[must_use]
    pub fn resolved(value: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(DeferredState::Resolved(Arc::new(value)))),
        }
    }

    /// Run `callback` with the resolved value, now or on resolution.
    pub fn on_resolve(&self, callback: impl FnOnce(&T) + Send + 'static) {
        let value = {
            let mut state = self.lock();
            match &mut *state {
                DeferredState::Pending(callbacks) => {
                    callbacks.push(Box::new(callback));
                    return;
                }
                DeferredState::Resolved(value) => Arc::clone(value),
            }
        };
        callback(&value);
    }

    /// Resolve the cell and run every pending callback.
    ///
    /// Returns `false` (and drops `value`) if the cell was already resolved.
    /// A panicking callback unwinds into the caller; later callbacks do not run.
    pub fn resolve(&self, value: T) -> bool {
        let value = Arc::new(value);
        let callbacks = {
            let mut state = self.lock();
            match std::mem::replace(&mut *state, DeferredState::Resolved(Arc::clone(&value))) {
                DeferredState::Pending(callbacks) => callbacks,
                resolved @ DeferredState::Resolved(_) => {
                    *state = resolved;
                    return false;
                }
            }
        };

        for callback in callbacks {
            callback(&value);
        }
        true
    }
}

impl<T> Deferred<T> {
    /// Whether [`Deferred::resolve`] has been called.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(&*self.lock(), DeferredState::Resolved(_))
    }

    /// The resolved value, if any.
    #[must_use]
    pub fn value(&self) -> Option<Arc<T>> {
        match &*self.lock() {
            DeferredState::Resolved(value) => Some(Arc::clone(value)),
            DeferredState::Pending(_) => None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, DeferredState<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Send + Sync + 'static> Default for Deferred<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

impl<T: Send + Sync + 'static> Thenable for Deferred<T> {
    fn then(&self, continuation: Continuation) {
        self.on_resolve(move |_| continuation());
    }
}

impl<T: Send + Sync + 'static> MaybeThenable for Deferred<T> {
    fn as_thenable(&self) -> Option<&dyn Thenable> {
        Some(self)
    }
}
