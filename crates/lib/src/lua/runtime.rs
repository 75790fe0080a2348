use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use mlua::prelude::*;

use crate::graph::RuleGraph;
use crate::lua::globals;

/// Create a Lua runtime with the `pake` global registered.
///
/// Rules declared with `pake.rule{}` are added to `graph` until the slot is
/// emptied by the loader.
pub fn create_runtime(graph: Rc<RefCell<Option<RuleGraph>>>) -> LuaResult<Lua> {
  let lua = Lua::new();
  globals::register_globals(&lua, graph)?;
  Ok(lua)
}

/// Execute a rule file's source in a fresh environment table.
///
/// The environment reads through to `_G`, but assignments stay in the
/// environment, so after execution it holds exactly the unit's globals.
/// Sets `pake.dir` to the directory of `path`.
pub fn exec_unit(lua: &Lua, path: &Path, source: &str) -> LuaResult<LuaTable> {
  let pake: LuaTable = lua.globals().get("pake")?;
  pake.set(
    "dir",
    path
      .parent()
      .unwrap_or(Path::new("."))
      .to_string_lossy()
      .into_owned(),
  )?;

  let env = lua.create_table()?;
  let mt = lua.create_table()?;
  mt.set("__index", lua.globals())?;
  env.set_metatable(Some(mt))?;

  lua
    .load(source)
    .set_name(format!("@{}", path.display()))
    .set_environment(env.clone())
    .exec()?;

  Ok(env)
}
