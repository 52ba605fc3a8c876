//! # Route Modules
//!
//! - [`ballot`]: what is being voted on and the current results.
//! - [`voters`]: eligibility, commitment registration, and vote submission.

pub mod ballot;
pub mod voters;
