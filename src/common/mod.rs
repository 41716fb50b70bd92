//! Common utilities and shared functionality
//!
//! Value types, environment seams and configuration loading used across
//! the engine.

pub mod types;
pub mod config;
pub mod traits;
