//! HTTP adapter for the remote Q&A API.
//!
//! [`QaHttpClient`] implements every domain port. Requests pass through a
//! [`RequestThrottle`] before they are sent.

mod client;
mod dto;
mod ports;
mod throttle;

pub use client::{QaHttpClient, QaHttpConfig};
pub use throttle::RequestThrottle;
