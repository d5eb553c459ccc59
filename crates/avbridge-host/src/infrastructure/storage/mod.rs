//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module reads the TOML configuration file, writes it back
//! when asked, and supplies defaults when no file exists yet.

pub mod config;
