//! In-memory demo adapter.
//!
//! [`InMemoryQaStore`] implements every port against process-local state.
//! It backs the `demo_mode` setting and the integration tests; it is never
//! chosen silently in place of the HTTP adapter.

mod ports;
mod store;

pub use store::{DEMO_PROOF, InMemoryQaStore, MemoryOperation};
