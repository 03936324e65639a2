//! Configuration management for the congress API
//!
//! Configuration is read from an optional TOML file and then overridden by
//! environment variables, so containers can run without a file at all.

pub mod environment;
pub mod loader;
pub mod types;

pub use environment::*;
pub use loader::*;
pub use types::*;
