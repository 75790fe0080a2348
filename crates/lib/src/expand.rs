//! Variable reference expansion.
//!
//! Strings in a rule file (targets, dependencies, command arguments) may
//! reference unit variables with `$(NAME)`, where `NAME` is made of ASCII
//! letters, digits and underscores.
//!
//! Expansion is iterative: the leftmost reference in the current string is
//! replaced (every occurrence of that token at once), then the string is
//! scanned again from the start. Values may therefore reference other
//! variables, and a reference assembled by an earlier substitution is expanded
//! as well.
//!
//! Anything that is not a complete reference token passes through unchanged,
//! so shell-style text like `$HOME`, `$$` or `$(not valid)` is left alone.
//! There is no escape for a literal `$(NAME)`.
//!
//! # Example
//!
//! ```
//! use pake_lib::expand::evaluate;
//! use pake_lib::vars::VariableStore;
//!
//! let mut vars = VariableStore::new();
//! vars.set_literal("EXE", "hello");
//! vars.set_literal("C_SOURCES", "hello.c");
//!
//! let args = evaluate("-o $(EXE) $(C_SOURCES)", &vars).unwrap();
//! assert_eq!(args, "-o hello hello.c");
//! ```

use std::collections::HashSet;

use thiserror::Error;
use tracing::trace;

use crate::consts::MAX_EXPANSIONS;
use crate::vars::VariableStore;

/// Errors that can occur while expanding references.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpandError {
  #[error("unresolved reference: no variable named '{name}'")]
  UnresolvedReference { name: String },

  #[error("variable reference cycle: {}", chain.join(" -> "))]
  Cycle { chain: Vec<String> },

  #[error("expansion of '{expr}' exceeded {limit} substitutions")]
  TooManyExpansions { expr: String, limit: usize },
}

/// A `$(NAME)` token located in a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference<'a> {
  /// Byte offset of the `$`.
  pub start: usize,
  /// Byte offset one past the closing `)`.
  pub end: usize,
  pub name: &'a str,
}

impl Reference<'_> {
  /// The full token text, e.g. `$(EXE)`.
  pub fn token(&self) -> String {
    format!("$({})", self.name)
  }
}

fn is_name_byte(b: u8) -> bool {
  b.is_ascii_alphanumeric() || b == b'_'
}

/// Find the leftmost reference token at or after byte offset `from`.
pub fn find_reference(input: &str, from: usize) -> Option<Reference<'_>> {
  let bytes = input.as_bytes();
  let mut pos = from;

  while pos + 1 < bytes.len() {
    if bytes[pos] == b'$' && bytes[pos + 1] == b'(' {
      let name_start = pos + 2;
      let mut name_end = name_start;
      while name_end < bytes.len() && is_name_byte(bytes[name_end]) {
        name_end += 1;
      }

      if name_end > name_start && name_end < bytes.len() && bytes[name_end] == b')' {
        return Some(Reference {
          start: pos,
          end: name_end + 1,
          name: &input[name_start..name_end],
        });
      }
    }
    pos += 1;
  }

  None
}

/// Names referenced directly by `expr`, in order of first appearance.
pub fn references(expr: &str) -> Vec<String> {
  let mut names: Vec<String> = Vec::new();
  let mut from = 0;

  while let Some(reference) = find_reference(expr, from) {
    if !names.iter().any(|n| n == reference.name) {
      names.push(reference.name.to_string());
    }
    from = reference.end;
  }

  names
}

/// Expand every reference in `expr` against `vars`.
///
/// # Errors
///
/// - [`ExpandError::UnresolvedReference`] when a referenced name is unbound
/// - [`ExpandError::Cycle`] when a referenced variable (transitively) refers
///   back to itself
/// - [`ExpandError::TooManyExpansions`] when substitution does not settle
pub fn evaluate(expr: &str, vars: &VariableStore) -> Result<String, ExpandError> {
  let mut parsed = expr.to_string();
  let mut acyclic: HashSet<String> = HashSet::new();
  let mut expansions = 0usize;

  while let Some(reference) = find_reference(&parsed, 0) {
    let name = reference.name.to_string();
    let token = reference.token();

    let value = vars
      .get(&name)
      .ok_or_else(|| ExpandError::UnresolvedReference { name: name.clone() })?;

    if !acyclic.contains(&name) {
      if let Some(chain) = find_cycle(&name, vars) {
        return Err(ExpandError::Cycle { chain });
      }
      acyclic.insert(name.clone());
    }

    expansions += 1;
    if expansions > MAX_EXPANSIONS {
      return Err(ExpandError::TooManyExpansions {
        expr: expr.to_string(),
        limit: MAX_EXPANSIONS,
      });
    }

    let replacement = value.expansion();
    trace!(name = %name, value = %replacement, "expanding reference");
    parsed = parsed.replace(&token, &replacement);
  }

  Ok(parsed)
}

/// Look for a path of references leading from `start` back to itself.
///
/// Returns the chain of names, starting and ending with `start`.
fn find_cycle(start: &str, vars: &VariableStore) -> Option<Vec<String>> {
  let mut path = vec![start.to_string()];
  let mut visited = HashSet::new();
  visited.insert(start.to_string());

  if walk(start, start, vars, &mut path, &mut visited) {
    Some(path)
  } else {
    None
  }
}

fn walk(current: &str, start: &str, vars: &VariableStore, path: &mut Vec<String>, visited: &mut HashSet<String>) -> bool {
  let Some(value) = vars.get(current) else {
    return false;
  };

  for next in references(&value.expansion()) {
    if next == start {
      path.push(next);
      return true;
    }

    if visited.insert(next.clone()) {
      path.push(next.clone());
      if walk(&next, start, vars, path, visited) {
        return true;
      }
      path.pop();
    }
  }

  false
}
