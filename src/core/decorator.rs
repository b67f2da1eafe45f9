//! Installing submission hooks on a form.
//!
//! [`create_decorator`] turns a [`SubmitHooks`] configuration into a
//! [`Decorator`]. Installing the decorator on a form swaps the form's submit
//! operation for a wrapper and returns an [`Installation`] that owns the
//! operation it replaced, so it can be put back later.
//!
//! The wrapper:
//! 1. asks the before-submit hook, returning `None` on a veto;
//! 2. calls the captured submit operation;
//! 3. with no after-submit hooks configured, returns the result untouched;
//! 4. otherwise dispatches the outcome hooks now, or once the result settles
//!    if it is thenable, and returns the result.
//!
//! Nothing is caught: a panic in a hook or in the engine unwinds to whoever
//! called submit (or resolved the thenable).

use crate::core::hooks::SubmitHooks;
use crate::core::thenable::MaybeThenable;
use crate::form::traits::{FormApi, SubmitFn, SubmitSlot};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Build a decorator from a hook configuration.
///
/// Nothing happens until [`Decorator::install`] is called.
#[must_use]
pub fn create_decorator<F: FormApi>(hooks: SubmitHooks<F>) -> Decorator<F> {
    Decorator {
        hooks: Arc::new(hooks),
    }
}

/// Reusable installer for one hook configuration.
pub struct Decorator<F: FormApi> {
    hooks: Arc<SubmitHooks<F>>,
}

impl<F: FormApi> Decorator<F> {
    /// The configuration this decorator installs.
    #[must_use]
    pub fn hooks(&self) -> &SubmitHooks<F> {
        &self.hooks
    }

    /// Wrap `form`'s current submit operation.
    ///
    /// Each call captures whatever operation is in the slot at that moment,
    /// so installing twice layers a second wrapper over the first.
    #[must_use = "the Installation is the only way to remove the hooks again"]
    pub fn install(&self, form: &F) -> Installation<F> {
        let slot = form.submit_slot().clone();
        let original = slot.current();
        let wrapped = wrap_submit(Arc::clone(&self.hooks), Arc::clone(&original));
        slot.replace(Arc::clone(&wrapped));
        debug!(hooks = ?self.hooks, "submit hooks installed");

        Installation {
            slot,
            original,
            wrapped,
            state: InstallState::Installed,
        }
    }
}

impl<F: FormApi> Clone for Decorator<F> {
    fn clone(&self) -> Self {
        Self {
            hooks: Arc::clone(&self.hooks),
        }
    }
}

impl<F: FormApi> fmt::Debug for Decorator<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decorator")
            .field("hooks", &self.hooks)
            .finish()
    }
}

fn wrap_submit<F: FormApi>(hooks: Arc<SubmitHooks<F>>, original: SubmitFn<F>) -> SubmitFn<F> {
    Arc::new(move |form: &F| {
        if hooks.decide(form).is_veto() {
            debug!("submission vetoed by before-submit hook");
            return None;
        }

        let result = original(form);
        if !hooks.has_outcome_hooks() {
            return result;
        }

        match result.as_ref().and_then(MaybeThenable::as_thenable) {
            Some(pending) => {
                let hooks = Arc::clone(&hooks);
                let form = form.clone();
                pending.then(Box::new(move || hooks.dispatch_outcome(&form)));
            }
            None => hooks.dispatch_outcome(form),
        }
        result
    })
}

/// Lifecycle of one installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallState {
    /// The wrapper was put in the slot.
    Installed,
    /// The captured operation was put back.
    Uninstalled,
}

/// Handle returned by [`Decorator::install`].
///
/// Owns the submit operation that was in the slot before installation.
/// Dropping the handle does not uninstall.
pub struct Installation<F: FormApi> {
    slot: SubmitSlot<F>,
    original: SubmitFn<F>,
    wrapped: SubmitFn<F>,
    state: InstallState,
}

impl<F: FormApi> Installation<F> {
    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> InstallState {
        self.state
    }

    /// Whether this installation's wrapper is the operation in the slot.
    ///
    /// `false` after uninstall, or while a later installation is layered on top.
    #[must_use]
    pub fn is_outermost(&self) -> bool {
        self.slot.holds(&self.wrapped)
    }

    /// Put the captured submit operation back in the slot.
    ///
    /// Restores exactly what was there at install time, even if other
    /// wrappers were installed since. Calling it again re-assigns the same
    /// operation.
    pub fn uninstall(&mut self) {
        if self.state == InstallState::Installed && !self.is_outermost() {
            debug!("uninstalling beneath a later installation; its wrapper leaves the slot too");
        }
        self.slot.replace(Arc::clone(&self.original));
        self.state = InstallState::Uninstalled;
        debug!("submit hooks uninstalled");
    }
}

impl<F: FormApi> fmt::Debug for Installation<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Installation")
            .field("state", &self.state)
            .field("outermost", &self.is_outermost())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hooks::SubmitDecision;
    use crate::core::thenable::{Deferred, Thenable};
    use crate::form::traits::FormState;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Result of the scripted engine: a plain number or something to wait on.
    enum Reply {
        Now(u32),
        Later(Deferred<()>),
    }

    impl MaybeThenable for Reply {
        fn as_thenable(&self) -> Option<&dyn Thenable> {
            match self {
                Reply::Now(_) => None,
                Reply::Later(pending) => Some(pending),
            }
        }
    }

    type Script = Arc<dyn Fn(&ScriptedForm) -> Option<Reply> + Send + Sync>;

    /// Form whose engine submit runs a caller-supplied script.
    #[derive(Clone)]
    struct ScriptedForm {
        slot: SubmitSlot<ScriptedForm>,
        state: Arc<Mutex<FormState>>,
        state_reads: Arc<AtomicUsize>,
        engine_calls: Arc<AtomicUsize>,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl ScriptedForm {
        fn new(script: impl Fn(&ScriptedForm) -> Option<Reply> + Send + Sync + 'static) -> Self {
            let script: Script = Arc::new(script);
            Self {
                slot: SubmitSlot::from_fn(move |form: &ScriptedForm| {
                    form.engine_calls.fetch_add(1, Ordering::SeqCst);
                    form.record("engine");
                    script(form)
                }),
                state: Arc::new(Mutex::new(FormState::default())),
                state_reads: Arc::new(AtomicUsize::new(0)),
                engine_calls: Arc::new(AtomicUsize::new(0)),
                log: Arc::new(Mutex::new(Vec::new())),
            }
        }

        /// Engine that finishes synchronously with the given flags.
        fn settled(succeeded: bool, failed: bool) -> Self {
            Self::new(move |form| {
                form.set_outcome(succeeded, failed);
                Some(Reply::Now(1))
            })
        }

        /// Engine whose outcome lands when `pending` resolves.
        fn deferred(pending: &Deferred<()>, succeeded: bool) -> Self {
            let pending = pending.clone();
            Self::new(move |form| {
                let done = form.clone();
                pending.on_resolve(move |_| done.set_outcome(succeeded, !succeeded));
                Some(Reply::Later(pending.clone()))
            })
        }

        fn set_outcome(&self, succeeded: bool, failed: bool) {
            let mut state = self.state.lock().unwrap();
            state.submit_succeeded = succeeded;
            state.submit_failed = failed;
        }

        fn record(&self, entry: &'static str) {
            self.log.lock().unwrap().push(entry);
        }

        fn log(&self) -> Vec<&'static str> {
            self.log.lock().unwrap().clone()
        }

        fn engine_calls(&self) -> usize {
            self.engine_calls.load(Ordering::SeqCst)
        }
    }

    impl FormApi for ScriptedForm {
        type Output = Reply;

        fn submit_slot(&self) -> &SubmitSlot<Self> {
            &self.slot
        }

        fn state(&self) -> FormState {
            self.state_reads.fetch_add(1, Ordering::SeqCst);
            self.state.lock().unwrap().clone()
        }
    }

    fn recording_hooks() -> SubmitHooks<ScriptedForm> {
        SubmitHooks::new()
            .before_submit(|form: &ScriptedForm| form.record("before"))
            .after_submit_succeeded(|form: &ScriptedForm| form.record("succeeded"))
            .after_submit_failed(|form: &ScriptedForm| form.record("failed"))
    }

    #[test]
    fn install_is_lazy() {
        let form = ScriptedForm::settled(true, false);
        let decorator = create_decorator(recording_hooks());

        assert!(form.log().is_empty());
        let installation = decorator.install(&form);
        assert!(form.log().is_empty());
        assert_eq!(form.engine_calls(), 0);
        assert_eq!(installation.state(), InstallState::Installed);
        assert!(installation.is_outermost());
    }

    #[test]
    fn sync_success_runs_hooks_in_order() {
        let form = ScriptedForm::settled(true, false);
        let _installation = create_decorator(recording_hooks()).install(&form);

        let result = form.submit();

        assert!(matches!(result, Some(Reply::Now(1))));
        assert_eq!(form.log(), vec!["before", "engine", "succeeded"]);
    }

    #[test]
    fn sync_failure_runs_failed_hook() {
        let form = ScriptedForm::settled(false, true);
        let _installation = create_decorator(recording_hooks()).install(&form);

        form.submit();

        assert_eq!(form.log(), vec!["before", "engine", "failed"]);
    }

    #[test]
    fn veto_skips_engine_and_outcome_hooks() {
        let form = ScriptedForm::settled(true, false);
        let hooks = SubmitHooks::new()
            .before_submit(|form: &ScriptedForm| {
                form.record("before");
                false
            })
            .after_submit_succeeded(|form: &ScriptedForm| form.record("succeeded"));
        let _installation = create_decorator(hooks).install(&form);

        assert!(form.submit().is_none());
        assert_eq!(form.engine_calls(), 0);
        assert_eq!(form.log(), vec!["before"]);
        assert_eq!(form.state_reads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn non_false_decisions_proceed() {
        let form = ScriptedForm::settled(true, false);
        let decorator = create_decorator(
            SubmitHooks::new().before_submit(|_: &ScriptedForm| SubmitDecision::Proceed),
        );
        let _a = decorator.install(&form);
        let _b = create_decorator(SubmitHooks::new().before_submit(|_: &ScriptedForm| true))
            .install(&form);
        let _c = create_decorator(SubmitHooks::new().before_submit(|_: &ScriptedForm| None::<bool>))
            .install(&form);

        form.submit();
        assert_eq!(form.engine_calls(), 1);
    }

    #[test]
    fn no_outcome_hooks_means_no_state_inspection() {
        let form = ScriptedForm::settled(true, false);
        let hooks = SubmitHooks::new().before_submit(|form: &ScriptedForm| form.record("before"));
        let _installation = create_decorator(hooks).install(&form);

        form.submit();

        assert_eq!(form.log(), vec!["before", "engine"]);
        assert_eq!(form.state_reads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn thenable_result_defers_dispatch() {
        let pending = Deferred::new();
        let form = ScriptedForm::deferred(&pending, true);
        let _installation = create_decorator(recording_hooks()).install(&form);

        let result = form.submit();

        assert!(matches!(result, Some(Reply::Later(_))));
        assert_eq!(form.log(), vec!["before", "engine"]);
        assert_eq!(form.state_reads.load(Ordering::SeqCst), 0);

        pending.resolve(());

        assert_eq!(form.log(), vec!["before", "engine", "succeeded"]);
    }

    #[test]
    fn both_flags_fire_both_hooks() {
        let form = ScriptedForm::settled(true, true);
        let _installation = create_decorator(recording_hooks()).install(&form);

        form.submit();

        assert_eq!(form.log(), vec!["before", "engine", "succeeded", "failed"]);
    }

    #[test]
    fn engine_returning_nothing_dispatches_inline() {
        let form = ScriptedForm::new(|form| {
            form.set_outcome(false, true);
            None
        });
        let _installation = create_decorator(recording_hooks()).install(&form);

        assert!(form.submit().is_none());
        assert_eq!(form.log(), vec!["before", "engine", "failed"]);
    }

    #[test]
    fn uninstall_restores_original() {
        let form = ScriptedForm::settled(true, false);
        let original = form.submit_slot().current();
        let mut installation = create_decorator(recording_hooks()).install(&form);

        assert!(!form.submit_slot().holds(&original));
        installation.uninstall();

        assert!(form.submit_slot().holds(&original));
        assert_eq!(installation.state(), InstallState::Uninstalled);
        assert!(!installation.is_outermost());

        form.submit();
        assert_eq!(form.log(), vec!["engine"]);

        installation.uninstall();
        assert!(form.submit_slot().holds(&original));
    }

    #[test]
    fn layered_installs_unwind_like_a_stack() {
        let form = ScriptedForm::settled(true, false);
        let inner_hooks =
            SubmitHooks::new().before_submit(|form: &ScriptedForm| form.record("inner"));
        let outer_hooks =
            SubmitHooks::new().before_submit(|form: &ScriptedForm| form.record("outer"));

        let mut inner = create_decorator(inner_hooks).install(&form);
        let mut outer = create_decorator(outer_hooks).install(&form);
        assert!(outer.is_outermost());
        assert!(!inner.is_outermost());

        form.submit();
        assert_eq!(form.log(), vec!["outer", "inner", "engine"]);

        outer.uninstall();
        assert!(inner.is_outermost());
        form.submit();
        assert_eq!(form.log()[3..], ["inner", "engine"]);

        inner.uninstall();
        form.submit();
        assert_eq!(form.log()[5..], ["engine"]);
    }

    #[test]
    fn out_of_order_uninstall_restores_captured_operation() {
        let form = ScriptedForm::settled(true, false);
        let original = form.submit_slot().current();

        let mut inner = create_decorator(recording_hooks()).install(&form);
        let outer = create_decorator(recording_hooks()).install(&form);

        inner.uninstall();

        assert!(form.submit_slot().holds(&original));
        assert!(!outer.is_outermost());
    }

    #[test]
    fn continuation_survives_uninstall() {
        let pending = Deferred::new();
        let form = ScriptedForm::deferred(&pending, false);
        let mut installation = create_decorator(recording_hooks()).install(&form);

        form.submit();
        installation.uninstall();
        pending.resolve(());

        assert_eq!(form.log(), vec!["before", "engine", "failed"]);
    }

    #[test]
    #[should_panic(expected = "before hook exploded")]
    fn before_hook_panic_propagates() {
        let form = ScriptedForm::settled(true, false);
        let hooks = SubmitHooks::new().before_submit(|_: &ScriptedForm| -> bool {
            panic!("before hook exploded")
        });
        let _installation = create_decorator(hooks).install(&form);

        form.submit();
    }

    #[test]
    #[should_panic(expected = "engine exploded")]
    fn engine_panic_propagates() {
        let form = ScriptedForm::new(|_| panic!("engine exploded"));
        let _installation = create_decorator(recording_hooks()).install(&form);

        form.submit();
    }

    #[test]
    #[should_panic(expected = "after hook exploded")]
    fn sync_after_hook_panic_reaches_submit_caller() {
        let form = ScriptedForm::settled(true, false);
        let hooks = SubmitHooks::new()
            .after_submit_succeeded(|_: &ScriptedForm| panic!("after hook exploded"));
        let _installation = create_decorator(hooks).install(&form);

        form.submit();
    }

    #[test]
    fn async_after_hook_panic_reaches_resolver() {
        let pending = Deferred::new();
        let form = ScriptedForm::deferred(&pending, true);
        let hooks = SubmitHooks::new()
            .after_submit_succeeded(|_: &ScriptedForm| panic!("after hook exploded"));
        let _installation = create_decorator(hooks).install(&form);

        let submitted = panic::catch_unwind(AssertUnwindSafe(|| form.submit()));
        assert!(matches!(submitted, Ok(Some(Reply::Later(_)))));

        let resolved = panic::catch_unwind(AssertUnwindSafe(|| pending.resolve(())));
        let message = resolved.expect_err("resolve should unwind");
        assert_eq!(message.downcast_ref::<&str>(), Some(&"after hook exploded"));
    }

    #[test]
    fn decorator_is_reusable_across_forms() {
        let decorator = create_decorator(recording_hooks());
        let first = ScriptedForm::settled(true, false);
        let second = ScriptedForm::settled(false, true);
        let _a = decorator.install(&first);
        let _b = decorator.clone().install(&second);

        first.submit();
        second.submit();

        assert_eq!(first.log(), vec!["before", "engine", "succeeded"]);
        assert_eq!(second.log(), vec!["before", "engine", "failed"]);
    }
}
