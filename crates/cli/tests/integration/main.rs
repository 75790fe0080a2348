//! End-to-end tests running the `pake` binary against real programs.

mod common;

#[cfg(unix)]
mod build_tests;
