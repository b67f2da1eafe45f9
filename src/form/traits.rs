//! Form engine contract consumed by the interceptor.

use crate::core::thenable::MaybeThenable;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Field name to error message.
pub type FieldErrors = BTreeMap<String, String>;

/// A submit operation stored in a [`SubmitSlot`].
///
/// `None` means the call produced no value (for example a vetoed or
/// synchronously rejected submission).
pub type SubmitFn<F> = Arc<dyn Fn(&F) -> Option<<F as FormApi>::Output> + Send + Sync>;

/// Form engine the interceptor can be installed on.
///
/// Implementors are cheap handles: clones refer to the same form, so a
/// continuation registered on an async submit result can keep one alive.
pub trait FormApi: Clone + Send + Sync + 'static {
    /// Value returned by a submit call: a plain value or a thenable.
    type Output: MaybeThenable + Send + 'static;

    /// The replaceable submit operation.
    fn submit_slot(&self) -> &SubmitSlot<Self>;

    /// Snapshot of the form state.
    fn state(&self) -> FormState;

    /// Submit through whatever operation currently occupies the slot.
    fn submit(&self) -> Option<Self::Output> {
        self.submit_slot().call(self)
    }
}

/// Form state snapshot.
///
/// The interceptor only reads `submit_succeeded` and `submit_failed`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormState {
    /// A submit handler is running.
    pub submitting: bool,

    /// The most recently completed submission succeeded.
    pub submit_succeeded: bool,

    /// The most recently completed submission failed (validation or handler).
    pub submit_failed: bool,

    /// Validation errors from the last submit attempt.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: FieldErrors,

    /// Errors returned by the submit handler.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub submit_errors: FieldErrors,
}

/// Shared, replaceable submit operation.
///
/// Clones point at the same slot. The current function is cloned out before
/// it runs, so replacing the slot from inside a submit call is fine.
pub struct SubmitSlot<F: FormApi> {
    current: Arc<RwLock<SubmitFn<F>>>,
}

impl<F: FormApi> SubmitSlot<F> {
    /// Create a slot holding `submit`.
    #[must_use]
    pub fn new(submit: SubmitFn<F>) -> Self {
        Self {
            current: Arc::new(RwLock::new(submit)),
        }
    }

    /// Create a slot from a closure.
    #[must_use]
    pub fn from_fn(submit: impl Fn(&F) -> Option<F::Output> + Send + Sync + 'static) -> Self {
        Self::new(Arc::new(submit))
    }

    /// The operation currently in the slot.
    #[must_use]
    pub fn current(&self) -> SubmitFn<F> {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&current)
    }

    /// Put `submit` in the slot and return the previous occupant.
    pub fn replace(&self, submit: SubmitFn<F>) -> SubmitFn<F> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, submit)
    }

    /// Whether `submit` is the operation currently in the slot.
    #[must_use]
    pub fn holds(&self, submit: &SubmitFn<F>) -> bool {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::ptr_eq(&current, submit)
    }

    /// Invoke the current operation on `form`.
    pub fn call(&self, form: &F) -> Option<F::Output> {
        let submit = self.current();
        submit(form)
    }
}

impl<F: FormApi> Clone for SubmitSlot<F> {
    fn clone(&self) -> Self {
        Self {
            current: Arc::clone(&self.current),
        }
    }
}

impl<F: FormApi> fmt::Debug for SubmitSlot<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmitSlot").finish_non_exhaustive()
    }
}
