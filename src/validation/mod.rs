//! Field Validator and Uniqueness Checker
//!
//! - `rules.rs` - per-field rule chain (type, range, length, pattern)
//! - `validator.rs` - required/unknown checks and rule dispatch
//! - `uniqueness.rs` - unique-field scan over a tenant's records

pub mod rules;
mod uniqueness;
mod validator;

pub use uniqueness::check_unique;
pub use validator::Validator;
