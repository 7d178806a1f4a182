//! Project version contracts
//!
//! - `ProjectVersionBaseContract`: field rules and the cross-field invariants
//!   every working copy must satisfy
//! - `SubmitProjectVersionContract`: what a daily report needs before it leaves
//!   the device

mod base;
mod submit;

pub use base::ProjectVersionBaseContract;
pub use submit::SubmitProjectVersionContract;
