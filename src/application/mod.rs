//! Application services layer.

pub mod auth;
pub mod error;
pub mod metadata;
pub mod render;
pub mod repos;
