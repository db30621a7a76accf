//! Validation rules shared by authentication request payloads.

pub mod rules;

pub use validator::Validate;
