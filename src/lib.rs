//! A small wiki: markdown pages on disk, rendered once and cached until the
//! source changes.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
