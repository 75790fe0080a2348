//! Library tests driving `Pakefile.lua` rule files through the loader and
//! the orchestrator.

mod common;

mod build_tests;
mod session_tests;
