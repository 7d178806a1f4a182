//! # sb-contracts
//!
//! Contract validation for Sitebook RS.
//!
//! Editing is permissive: the store accepts transiently invalid working copies.
//! Contracts are consulted at the submission boundary and report every violation
//! at once, keyed by field path, so nothing reaches the backend half-valid.

pub mod base;
pub mod project_versions;

pub use base::*;
pub use project_versions::{ProjectVersionBaseContract, SubmitProjectVersionContract};
