//! Lua runtime for rule files.
//!
//! # Submodules
//!
//! - [`action`] - Command calls from running actions
//! - [`globals`] - The `pake` global table
//! - [`runtime`] - Lua VM creation and per-unit environments

pub mod action;
pub mod globals;
pub mod runtime;
