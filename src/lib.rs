//! # Querygate
//!
//! A thin HTTP gateway in front of a tool-augmented agent runtime.
//!
//! The gateway accepts a free-form text query over HTTP, forwards it to an
//! external agent runtime under a configured session identity, scans the
//! runtime's event stream for the first final response, and returns its text
//! as JSON. The reasoning loop, tool dispatch, and session persistence all
//! live behind the [`runner::AgentRunner`] seam.

pub mod config;
pub mod error;
pub mod runner;
pub mod server;

pub use config::Config;
pub use error::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const NAME: &str = env!("CARGO_PKG_NAME");
