//! Job board notification client — library crate.
//!
//! Re-exports modules needed by the `jobboard` binary and by integration
//! tests in `tests/`.

pub mod clock;
pub mod config;
pub mod display;
pub mod errors;
pub mod models;
pub mod notice;
pub mod service;
pub mod session;
pub mod store;
