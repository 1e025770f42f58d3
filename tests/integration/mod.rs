//! Integration tests backed by a local mock of the indicator site

pub mod bankruptcy_verification;
