//! # sb-core
//!
//! Core types, traits, and utilities for Sitebook RS.
//!
//! This crate provides the foundational building blocks used across all other crates:
//! - Common error types and the field-path keyed `ValidationErrors`
//! - The `Clock` abstraction used for every timestamp the workflow stamps
//! - Percentage helpers shared by the rollup and the progress summary
//! - Configuration types

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use error::*;
pub use traits::*;
pub use types::*;
