//! Domain layer types and invariants.

pub mod pages;
pub mod users;
