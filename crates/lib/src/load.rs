//! Loading rule files into units.
//!
//! Loading happens in two phases. The script runs first, in its own
//! environment table, declaring rules through `pake.rule{}` and variables as
//! plain global assignments. Afterwards the environment is scanned and every
//! string, number, boolean or command binding becomes a unit variable. Since
//! variables are only collected once the whole file ran, a command may
//! reference variables assigned further down the file.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use mlua::prelude::*;
use tracing::debug;

use crate::graph::{GraphError, RuleGraph};
use crate::lua::{action, runtime};
use crate::session::Unit;
use crate::vars::{Value, VariableStore};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
  #[error("failed to read rule file {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The rule file raised a Lua error. Kept as text since `LuaError` is not `Send`.
  #[error("lua error: {message}")]
  Lua { message: String },

  #[error("invalid rules in {unit}: {source}")]
  Graph {
    unit: String,
    #[source]
    source: GraphError,
  },
}

/// Load the rule file at `path` into a validated [`Unit`].
///
/// The unit is named after the canonical path of the file and keeps the Lua
/// state alive so script actions can run later.
pub fn load_unit(path: &Path) -> Result<Unit, LoadError> {
  let read_err = |source| LoadError::Read {
    path: path.to_path_buf(),
    source,
  };
  let path = dunce::canonicalize(path).map_err(read_err)?;
  let source = std::fs::read_to_string(&path).map_err(read_err)?;
  let unit_name = path.display().to_string();

  let graph = Rc::new(RefCell::new(Some(RuleGraph::new())));
  let lua = runtime::create_runtime(graph.clone()).map_err(lua_err)?;
  let env = runtime::exec_unit(&lua, &path, &source).map_err(lua_err)?;
  let vars = collect_variables(&lua, &env).map_err(lua_err)?;

  let graph = graph.borrow_mut().take().unwrap_or_default();
  debug!(unit = %unit_name, rules = graph.len(), variables = vars.len(), "collected declarations");

  let unit = Unit::new(unit_name.clone(), vars, graph).map_err(|source| LoadError::Graph {
    unit: unit_name,
    source,
  })?;
  Ok(unit.with_source(path, lua))
}

fn lua_err(err: LuaError) -> LoadError {
  LoadError::Lua {
    message: err.to_string(),
  }
}

/// Turn the globals a rule file assigned into unit variables.
///
/// Functions, plain tables and other values are not variables and are
/// skipped.
pub fn collect_variables(lua: &Lua, env: &LuaTable) -> LuaResult<VariableStore> {
  let mut vars = VariableStore::new();

  for pair in env.pairs::<LuaValue, LuaValue>() {
    let (key, value) = pair?;
    let LuaValue::String(name) = key else {
      continue;
    };
    let name = name.to_str()?.to_string();

    let value = match value {
      LuaValue::String(s) => Value::Literal(s.to_str()?.to_string()),
      LuaValue::Integer(_) | LuaValue::Number(_) => match lua.coerce_string(value)? {
        Some(s) => Value::Literal(s.to_str()?.to_string()),
        None => continue,
      },
      LuaValue::Boolean(b) => Value::Literal(b.to_string()),
      LuaValue::Table(t) => match action::command_from_table(&t)? {
        Some(command) => Value::Command(command),
        None => continue,
      },
      _ => continue,
    };
    vars.set(name, value);
  }

  Ok(vars)
}
