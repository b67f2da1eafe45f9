//! Submission hook configuration.

use crate::form::traits::FormApi;
use std::fmt;
use std::sync::Arc;

/// What the before-submit hook decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitDecision {
    /// Let the submission run.
    #[default]
    Proceed,
    /// Stop the submission before the engine sees it.
    Veto,
}

impl SubmitDecision {
    /// Whether this decision stops the submission.
    #[must_use]
    pub fn is_veto(self) -> bool {
        self == Self::Veto
    }
}

/// A hook that returns nothing proceeds.
impl From<()> for SubmitDecision {
    fn from((): ()) -> Self {
        Self::Proceed
    }
}

/// Only `false` vetoes.
impl From<bool> for SubmitDecision {
    fn from(proceed: bool) -> Self {
        if proceed { Self::Proceed } else { Self::Veto }
    }
}

/// `None` proceeds, `Some(b)` behaves like `b`.
impl From<Option<bool>> for SubmitDecision {
    fn from(proceed: Option<bool>) -> Self {
        proceed.map_or(Self::Proceed, Self::from)
    }
}

/// Hook run before submission.
pub type BeforeSubmitFn<F> = Arc<dyn Fn(&F) -> SubmitDecision + Send + Sync>;

/// Hook run after a submission outcome is known.
pub type AfterSubmitFn<F> = Arc<dyn Fn(&F) + Send + Sync>;

/// Up to three optional submission hooks.
///
/// Built once, then handed to [`create_decorator`](crate::core::create_decorator).
/// Absent hooks are no-ops.
pub struct SubmitHooks<F: FormApi> {
    pub(crate) before_submit: Option<BeforeSubmitFn<F>>,
    pub(crate) after_submit_succeeded: Option<AfterSubmitFn<F>>,
    pub(crate) after_submit_failed: Option<AfterSubmitFn<F>>,
}

impl<F: FormApi> SubmitHooks<F> {
    /// No hooks configured.
    #[must_use]
    pub fn new() -> Self {
        Self {
            before_submit: None,
            after_submit_succeeded: None,
            after_submit_failed: None,
        }
    }

    /// Run `hook` before every submission.
    ///
    /// The hook may return `()`, `bool`, `Option<bool>` or a
    /// [`SubmitDecision`]. Returning `false` vetoes the submission.
    #[must_use]
    pub fn before_submit<D, H>(mut self, hook: H) -> Self
    where
        D: Into<SubmitDecision>,
        H: Fn(&F) -> D + Send + Sync + 'static,
    {
        self.before_submit = Some(Arc::new(move |form: &F| -> SubmitDecision {
            hook(form).into()
        }));
        self
    }

    /// Run `hook` when a submission completes with `submit_succeeded` set.
    #[must_use]
    pub fn after_submit_succeeded(mut self, hook: impl Fn(&F) + Send + Sync + 'static) -> Self {
        self.after_submit_succeeded = Some(Arc::new(hook));
        self
    }

    /// Run `hook` when a submission completes with `submit_failed` set.
    #[must_use]
    pub fn after_submit_failed(mut self, hook: impl Fn(&F) + Send + Sync + 'static) -> Self {
        self.after_submit_failed = Some(Arc::new(hook));
        self
    }

    /// Whether any after-submit hook is configured.
    #[must_use]
    pub fn has_outcome_hooks(&self) -> bool {
        self.after_submit_succeeded.is_some() || self.after_submit_failed.is_some()
    }

    /// Ask the before-submit hook, if any.
    pub(crate) fn decide(&self, form: &F) -> SubmitDecision {
        self.before_submit
            .as_ref()
            .map_or(SubmitDecision::Proceed, |hook| hook(form))
    }

    /// Fire the after-submit hooks matching the form's current state.
    pub(crate) fn dispatch_outcome(&self, form: &F) {
        let state = form.state();
        tracing::trace!(
            succeeded = state.submit_succeeded,
            failed = state.submit_failed,
            "dispatching submit outcome"
        );

        if let (Some(hook), true) = (&self.after_submit_succeeded, state.submit_succeeded) {
            hook(form);
        }
        if let (Some(hook), true) = (&self.after_submit_failed, state.submit_failed) {
            hook(form);
        }
    }
}

impl<F: FormApi> Default for SubmitHooks<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: FormApi> Clone for SubmitHooks<F> {
    fn clone(&self) -> Self {
        Self {
            before_submit: self.before_submit.clone(),
            after_submit_succeeded: self.after_submit_succeeded.clone(),
            after_submit_failed: self.after_submit_failed.clone(),
        }
    }
}

impl<F: FormApi> fmt::Debug for SubmitHooks<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmitHooks")
            .field("before_submit", &self.before_submit.is_some())
            .field("after_submit_succeeded", &self.after_submit_succeeded.is_some())
            .field("after_submit_failed", &self.after_submit_failed.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_conversions() {
        assert_eq!(SubmitDecision::from(()), SubmitDecision::Proceed);
        assert_eq!(SubmitDecision::from(true), SubmitDecision::Proceed);
        assert_eq!(SubmitDecision::from(false), SubmitDecision::Veto);
        assert_eq!(SubmitDecision::from(None), SubmitDecision::Proceed);
        assert_eq!(SubmitDecision::from(Some(true)), SubmitDecision::Proceed);
        assert_eq!(SubmitDecision::from(Some(false)), SubmitDecision::Veto);
    }

    #[test]
    fn only_veto_is_veto() {
        assert!(SubmitDecision::Veto.is_veto());
        assert!(!SubmitDecision::Proceed.is_veto());
        assert!(!SubmitDecision::default().is_veto());
    }
}
