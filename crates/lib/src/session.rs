//! Loaded units and the session that owns them.
//!
//! A [`Unit`] is one loaded rule file: its variables, its validated rule graph
//! and, for Lua rule files, the Lua state its script actions live in. A
//! [`BuildSession`] owns every unit loaded during one process run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use mlua::Lua;
use tracing::info;

use crate::graph::{GraphError, RuleGraph};
use crate::load::{self, LoadError};
use crate::vars::VariableStore;

pub struct Unit {
  name: String,
  path: Option<PathBuf>,
  vars: Rc<VariableStore>,
  graph: RuleGraph,
  lua: Option<Lua>,
}

impl Unit {
  /// Create a unit from already collected declarations.
  ///
  /// # Errors
  ///
  /// Returns the first [`GraphError`] found by [`RuleGraph::validate`].
  pub fn new(name: impl Into<String>, vars: VariableStore, graph: RuleGraph) -> Result<Self, GraphError> {
    graph.validate(&vars)?;
    Ok(Self {
      name: name.into(),
      path: None,
      vars: Rc::new(vars),
      graph,
      lua: None,
    })
  }

  pub(crate) fn with_source(mut self, path: PathBuf, lua: Lua) -> Self {
    self.path = Some(path);
    self.lua = Some(lua);
    self
  }

  /// Name used in diagnostics; the rule file path for loaded units.
  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn path(&self) -> Option<&Path> {
    self.path.as_deref()
  }

  pub fn vars(&self) -> &VariableStore {
    &self.vars
  }

  pub(crate) fn shared_vars(&self) -> Rc<VariableStore> {
    self.vars.clone()
  }

  pub fn graph(&self) -> &RuleGraph {
    &self.graph
  }

  pub(crate) fn lua(&self) -> Option<&Lua> {
    self.lua.as_ref()
  }
}

impl std::fmt::Debug for Unit {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Unit")
      .field("name", &self.name)
      .field("path", &self.path)
      .field("vars", &self.vars)
      .field("rules", &self.graph.len())
      .finish_non_exhaustive()
  }
}

/// All units loaded in one run, keyed by canonical rule file path.
#[derive(Debug, Default)]
pub struct BuildSession {
  units: BTreeMap<PathBuf, Unit>,
}

impl BuildSession {
  pub fn new() -> Self {
    Self::default()
  }

  /// Load a rule file, replacing any unit previously loaded from it.
  pub fn load(&mut self, path: &Path) -> Result<&Unit, LoadError> {
    let unit = load::load_unit(path)?;
    let key = unit.path().map(Path::to_path_buf).unwrap_or_else(|| path.to_path_buf());
    info!(unit = %unit.name(), rules = unit.graph().len(), "loaded rule file");
    self.units.insert(key.clone(), unit);
    Ok(&self.units[&key])
  }

  /// Add a unit that was not loaded from a file, keyed by its name.
  pub fn insert(&mut self, unit: Unit) -> &Unit {
    let key = PathBuf::from(unit.name());
    self.units.insert(key.clone(), unit);
    &self.units[&key]
  }

  pub fn unit(&self, path: &Path) -> Option<&Unit> {
    match dunce::canonicalize(path) {
      Ok(canonical) => self.units.get(&canonical),
      Err(_) => self.units.get(path),
    }
  }

  pub fn units(&self) -> impl Iterator<Item = &Unit> {
    self.units.values()
  }

  pub fn len(&self) -> usize {
    self.units.len()
  }

  pub fn is_empty(&self) -> bool {
    self.units.is_empty()
  }
}
