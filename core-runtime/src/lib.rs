//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the playback core:
//! - Logging and tracing infrastructure
//! - Configuration management and capability injection
//!
//! ## Overview
//!
//! Other crates depend on this one for the logging conventions they share and
//! for [`CoreConfig`](config::CoreConfig), which bundles the host bridges a
//! playback controller needs together with its tunable settings.

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
