//! In-memory reference form engine.
//!
//! Enough of a form engine to drive the interceptor end to end: registered
//! fields, values, optional sync or async validation, and a sync or async
//! submit handler. Async work is represented by [`Deferred`] cells that the
//! caller resolves, so tests control exactly when completion happens.

use crate::core::thenable::Deferred;
use crate::form::traits::{FieldErrors, FormApi, FormState, SubmitSlot};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Field values keyed by field name.
pub type Values = Map<String, Value>;

/// Result of a validator or submit handler.
#[derive(Debug, Clone)]
pub enum Outcome<T> {
    /// Known now.
    Ready(T),
    /// Known once the cell resolves.
    Pending(Deferred<T>),
}

/// Validates all values; an empty map means valid.
pub type Validator = Arc<dyn Fn(&Values) -> Outcome<FieldErrors> + Send + Sync>;

/// Handles a valid submission; an empty map means it succeeded.
pub type SubmitHandler = Arc<dyn Fn(&Values) -> Outcome<FieldErrors> + Send + Sync>;

struct FormInner {
    fields: RwLock<BTreeSet<String>>,
    values: RwLock<Values>,
    state: RwLock<FormState>,
    validator: Option<Validator>,
    on_submit: SubmitHandler,
    slot: SubmitSlot<MemoryForm>,
}

/// In-memory form handle. Clones refer to the same form.
#[derive(Clone)]
pub struct MemoryForm {
    inner: Arc<FormInner>,
}

impl MemoryForm {
    /// Create a form without validation.
    #[must_use]
    pub fn new(
        on_submit: impl Fn(&Values) -> Outcome<FieldErrors> + Send + Sync + 'static,
    ) -> Self {
        Self::build(Arc::new(on_submit), None)
    }

    /// Create a form whose submissions are validated first.
    #[must_use]
    pub fn with_validator(
        on_submit: impl Fn(&Values) -> Outcome<FieldErrors> + Send + Sync + 'static,
        validate: impl Fn(&Values) -> Outcome<FieldErrors> + Send + Sync + 'static,
    ) -> Self {
        Self::build(Arc::new(on_submit), Some(Arc::new(validate)))
    }

    fn build(on_submit: SubmitHandler, validator: Option<Validator>) -> Self {
        Self {
            inner: Arc::new(FormInner {
                fields: RwLock::new(BTreeSet::new()),
                values: RwLock::new(Values::new()),
                state: RwLock::new(FormState::default()),
                validator,
                on_submit,
                slot: SubmitSlot::from_fn(MemoryForm::run_submit),
            }),
        }
    }

    /// Register a field by name. Registering twice is a no-op.
    pub fn register_field(&self, name: &str) {
        write(&self.inner.fields).insert(name.to_string());
    }

    /// Registered field names, sorted.
    #[must_use]
    pub fn fields(&self) -> Vec<String> {
        read(&self.inner.fields).iter().cloned().collect()
    }

    /// Set a field value.
    pub fn change(&self, name: &str, value: impl Into<Value>) {
        write(&self.inner.values).insert(name.to_string(), value.into());
    }

    /// Snapshot of all values.
    #[must_use]
    pub fn values(&self) -> Values {
        read(&self.inner.values).clone()
    }

    /// The engine's own submit procedure, installed in the slot at creation.
    fn run_submit(&self) -> Option<Deferred<()>> {
        if read(&self.inner.state).submitting {
            debug!("submit ignored: submission already in flight");
            return None;
        }

        let values = self.values();
        let Some(validator) = &self.inner.validator else {
            return self.submit_validated(&values, FieldErrors::new());
        };

        match validator(&values) {
            Outcome::Ready(errors) => self.submit_validated(&values, errors),
            Outcome::Pending(validation) => {
                self.update_state(|state| state.submitting = true);

                let settled = Deferred::new();
                let done = settled.clone();
                let form = self.clone();
                validation.on_resolve(move |errors| {
                    match form.submit_validated(&values, errors.clone()) {
                        Some(submission) => submission.on_resolve(move |_| {
                            done.resolve(());
                        }),
                        None => {
                            done.resolve(());
                        }
                    }
                });
                Some(settled)
            }
        }
    }

    fn submit_validated(&self, values: &Values, errors: FieldErrors) -> Option<Deferred<()>> {
        if !errors.is_empty() {
            debug!(fields = errors.len(), "submit blocked by validation errors");
            self.update_state(|state| {
                state.errors = errors;
                state.submitting = false;
                state.submit_succeeded = false;
                state.submit_failed = true;
            });
            return None;
        }

        self.update_state(|state| {
            state.errors.clear();
            state.submit_errors.clear();
            state.submitting = true;
            state.submit_succeeded = false;
            state.submit_failed = false;
        });

        match (self.inner.on_submit)(values) {
            Outcome::Ready(submit_errors) => {
                self.complete(submit_errors);
                None
            }
            Outcome::Pending(handler) => {
                let settled = Deferred::new();
                let done = settled.clone();
                let form = self.clone();
                handler.on_resolve(move |submit_errors| {
                    form.complete(submit_errors.clone());
                    done.resolve(());
                });
                Some(settled)
            }
        }
    }

    fn complete(&self, submit_errors: FieldErrors) {
        let failed = !submit_errors.is_empty();
        debug!(failed, "submission completed");
        self.update_state(|state| {
            state.submitting = false;
            state.submit_succeeded = !failed;
            state.submit_failed = failed;
            state.submit_errors = submit_errors;
        });
    }

    fn update_state(&self, apply: impl FnOnce(&mut FormState)) {
        apply(&mut write(&self.inner.state));
    }
}

impl FormApi for MemoryForm {
    type Output = Deferred<()>;

    fn submit_slot(&self) -> &SubmitSlot<Self> {
        &self.inner.slot
    }

    fn state(&self) -> FormState {
        read(&self.inner.state).clone()
    }
}

impl fmt::Debug for MemoryForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryForm")
            .field("fields", &self.fields())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
