//! Saved validation sessions
//!
//! Reports can be stored after a run and inspected later without re-querying
//! either repository.

pub mod key;
pub mod storage;

pub use storage::{SessionStore, SessionSummary};
