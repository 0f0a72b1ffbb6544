//! Mesmer Common - shared infrastructure for the Mesmer engine.
//!
//! This crate provides the pieces every Mesmer crate leans on:
//! - Unified error type ([`error::Error`])
//! - Logging bootstrap ([`logging::init_logging`])
//! - Engine configuration snapshot ([`config::EngineConfig`]) and its
//!   validation ([`validation::Validate`])

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod logging;
pub mod validation;

// Re-export commonly used types
pub use config::EngineConfig;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use validation::{Validate, ValidationError, ValidationResult};
