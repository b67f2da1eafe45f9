//! submit-listener - submission lifecycle hooks for form-state engines.
//!
//! Wraps a form's submit operation so a before-submit hook can veto a
//! submission and after-submit hooks run once the outcome is known, whether
//! the engine completes synchronously or hands back a thenable.
//!
//! ```
//! use submit_listener::core::{SubmitHooks, create_decorator};
//! use submit_listener::form::{FieldErrors, FormApi, MemoryForm, Outcome};
//!
//! let form = MemoryForm::new(|_| Outcome::Ready(FieldErrors::new()));
//! let decorator = create_decorator(
//!     SubmitHooks::new()
//!         .before_submit(|form: &MemoryForm| !form.values().is_empty())
//!         .after_submit_succeeded(|_: &MemoryForm| println!("saved")),
//! );
//! let mut installation = decorator.install(&form);
//!
//! form.submit(); // vetoed: no values yet
//! form.change("name", "Ada");
//! form.submit(); // prints "saved"
//!
//! installation.uninstall();
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod form;
pub mod logging;
pub mod simulate;

pub use crate::config::Config;
pub use crate::core::{Decorator, Installation, SubmitDecision, SubmitHooks, create_decorator};
pub use crate::error::{Error, Result};
pub use crate::form::{FormApi, FormState, MemoryForm};
