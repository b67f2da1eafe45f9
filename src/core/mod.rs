//! Submission interceptor: hook configuration, thenable detection, install/uninstall.

pub mod decorator;
pub mod hooks;
pub mod thenable;

pub use decorator::{Decorator, InstallState, Installation, create_decorator};
pub use hooks::{AfterSubmitFn, BeforeSubmitFn, SubmitDecision, SubmitHooks};
pub use thenable::{Continuation, Deferred, MaybeThenable, Thenable};
