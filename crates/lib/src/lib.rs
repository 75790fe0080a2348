//! pake-lib: Core types and logic for pake
//!
//! This crate provides the pieces of the build orchestrator:
//! - `VariableStore` and `$(NAME)` expansion
//! - `Rule` and `RuleGraph`: declared rules and producer lookup
//! - `Orchestrator`: dependency-first execution with mtime staleness
//! - `load_unit`: evaluating a `Pakefile.lua` into a `Unit`

pub mod build;
pub mod command;
pub mod console;
pub mod consts;
pub mod expand;
pub mod graph;
pub mod load;
pub mod lua;
pub mod rule;
pub mod session;
pub mod util;
pub mod vars;
