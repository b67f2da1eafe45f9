//! Drive a scenario through a [`MemoryForm`] with recording hooks installed.

use crate::core::{Deferred, SubmitDecision, SubmitHooks, create_decorator};
use crate::error::Result;
use crate::form::{FieldErrors, FormApi, FormState, MemoryForm, Outcome, Values};
use crate::simulate::scenario::{BeforeSubmitMode, Scenario, StepSection, Timing};
use crate::simulate::trace::{EventType, Recorder, TraceEvent};
use serde::Serialize;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

/// Outcome of a simulation run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    /// Every lifecycle event, in order.
    pub events: Vec<TraceEvent>,

    /// Form state after everything settled.
    pub final_state: FormState,

    /// How many times the engine's submit handler ran.
    pub engine_calls: u32,
}

/// Which engine step a pending cell belongs to.
#[derive(Debug, Clone, Copy)]
enum StepKind {
    Validation,
    Submit,
}

impl StepKind {
    fn label(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Submit => "submit",
        }
    }
}

struct PendingStep {
    kind: StepKind,
    cell: Deferred<FieldErrors>,
    errors: FieldErrors,
}

/// Pending async steps, settled in FIFO order.
#[derive(Clone, Default)]
struct PendingQueue {
    steps: Arc<Mutex<VecDeque<PendingStep>>>,
}

impl PendingQueue {
    fn push(&self, step: PendingStep) {
        self.steps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(step);
    }

    fn pop(&self) -> Option<PendingStep> {
        self.steps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }
}

/// Build an engine step that records itself and completes per `section`.
fn engine_step(
    kind: StepKind,
    section: StepSection,
    recorder: Recorder,
    queue: PendingQueue,
    calls: Option<Arc<AtomicU32>>,
) -> impl Fn(&Values) -> Outcome<FieldErrors> + Send + Sync + 'static {
    move |values| {
        if let Some(calls) = &calls {
            calls.fetch_add(1, Ordering::SeqCst);
        }
        let event_type = match kind {
            StepKind::Validation => EventType::Validation,
            StepKind::Submit => EventType::EngineSubmit,
        };
        recorder.record(
            event_type,
            json!({ "mode": section.mode, "errors": section.errors, "values": values }),
        );

        match section.mode {
            Timing::Sync => Outcome::Ready(section.errors.clone()),
            Timing::Async => {
                let cell = Deferred::new();
                queue.push(PendingStep {
                    kind,
                    cell: cell.clone(),
                    errors: section.errors.clone(),
                });
                Outcome::Pending(cell)
            }
        }
    }
}

/// Hooks that append to `recorder` and behave as the scenario asks.
fn recording_hooks(scenario: &Scenario, recorder: &Recorder) -> SubmitHooks<MemoryForm> {
    let mut hooks = SubmitHooks::new();

    let decision = match scenario.hooks.before_submit {
        BeforeSubmitMode::Absent => None,
        BeforeSubmitMode::Proceed => Some(SubmitDecision::Proceed),
        BeforeSubmitMode::Veto => Some(SubmitDecision::Veto),
    };
    if let Some(decision) = decision {
        let recorder = recorder.clone();
        hooks = hooks.before_submit(move |_: &MemoryForm| {
            recorder.record(
                EventType::BeforeSubmit,
                json!({ "veto": decision.is_veto() }),
            );
            decision
        });
    }

    if scenario.hooks.after_submit_succeeded {
        let recorder = recorder.clone();
        hooks = hooks.after_submit_succeeded(move |form: &MemoryForm| {
            recorder.record(EventType::AfterSubmitSucceeded, json!(form.state()));
        });
    }

    if scenario.hooks.after_submit_failed {
        let recorder = recorder.clone();
        hooks = hooks.after_submit_failed(move |form: &MemoryForm| {
            recorder.record(EventType::AfterSubmitFailed, json!(form.state()));
        });
    }

    hooks
}

fn settle_all(queue: &PendingQueue, recorder: &Recorder) {
    while let Some(step) = queue.pop() {
        debug!(step = step.kind.label(), "settling pending step");
        recorder.record(
            EventType::Settled,
            json!({ "step": step.kind.label(), "errors": step.errors }),
        );
        step.cell.resolve(step.errors);
    }
}

/// Run `scenario` to completion.
///
/// Async steps are settled in the order they were started, after each
/// submit call returns.
///
/// # Errors
///
/// Returns an error if the scenario fails its consistency check.
pub fn simulate(scenario: &Scenario) -> Result<SimulationReport> {
    scenario.check()?;

    let recorder = Recorder::new();
    let queue = PendingQueue::default();
    let engine_calls = Arc::new(AtomicU32::new(0));

    let on_submit = engine_step(
        StepKind::Submit,
        scenario.submit.clone(),
        recorder.clone(),
        queue.clone(),
        Some(Arc::clone(&engine_calls)),
    );
    let form = match &scenario.validation {
        Some(section) => MemoryForm::with_validator(
            on_submit,
            engine_step(
                StepKind::Validation,
                section.clone(),
                recorder.clone(),
                queue.clone(),
                None,
            ),
        ),
        None => MemoryForm::new(on_submit),
    };

    for field in &scenario.form.fields {
        form.register_field(field);
    }
    for (name, value) in &scenario.form.values {
        form.change(name, value.clone());
    }

    let decorator = create_decorator(recording_hooks(scenario, &recorder));
    let mut installation = decorator.install(&form);
    recorder.record(EventType::Installed, json!(scenario.hooks));

    let run = &scenario.run;
    for attempt in 1..=run.submits {
        recorder.record(EventType::SubmitCalled, json!({ "attempt": attempt }));
        let returned = if form.submit().is_some() { "pending" } else { "none" };
        recorder.record(
            EventType::SubmitReturned,
            json!({ "attempt": attempt, "result": returned }),
        );

        let uninstall_now = attempt == run.uninstall_after;
        if uninstall_now && run.uninstall_before_settle {
            installation.uninstall();
            recorder.record(EventType::Uninstalled, json!({ "attempt": attempt }));
        }

        settle_all(&queue, &recorder);

        if uninstall_now && !run.uninstall_before_settle {
            installation.uninstall();
            recorder.record(EventType::Uninstalled, json!({ "attempt": attempt }));
        }
    }

    let report = SimulationReport {
        events: recorder.events(),
        final_state: form.state(),
        engine_calls: engine_calls.load(Ordering::SeqCst),
    };
    info!(
        events = report.events.len(),
        engine_calls = report.engine_calls,
        "simulation finished"
    );
    Ok(report)
}
