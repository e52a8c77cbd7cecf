//! Outbound adapters implementing the domain ports.
//!
//! - **http**: reqwest client for the remote Q&A API, with its request
//!   throttle.
//! - **memory**: in-memory demo store, selected only through `demo_mode`.
//!
//! Adapters translate between wire or storage shapes and domain types. They
//! contain no business rules.

pub mod http;
pub mod memory;
