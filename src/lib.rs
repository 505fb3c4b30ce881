//! Track resolver library - shared modules for all binaries.

pub mod backend;
pub mod config;
pub mod models;
pub mod normalize;
pub mod progress;
pub mod queries;
pub mod resolver;
pub mod scoring;
