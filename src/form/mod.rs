//! Form engine contract and an in-memory engine.

pub mod memory;
pub mod traits;

pub use memory::{MemoryForm, Outcome, SubmitHandler, Validator, Values};
pub use traits::{FieldErrors, FormApi, FormState, SubmitFn, SubmitSlot};
