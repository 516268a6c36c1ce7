//! Shared plumbing for the OAuth client details workspace.

pub mod logging;

pub use logging::{init_logging, LogFormat};
