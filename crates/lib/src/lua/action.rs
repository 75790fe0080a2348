//! Running commands from Lua actions.
//!
//! Command bindings and `pake.run` need the unit's variables, the command
//! runner and the console. The orchestrator installs them as Lua app data
//! ([`ActionEnv`]) before it calls a script action; calling a command outside
//! of a running action is an error.

use std::rc::Rc;

use mlua::prelude::*;

use crate::command::{self, CommandRunner, Invocation};
use crate::console::Console;
use crate::consts::COMMAND_TYPE;
use crate::expand;
use crate::vars::{CommandDef, VariableStore};

/// What a running script action can reach.
#[derive(Clone)]
pub struct ActionEnv {
  pub vars: Rc<VariableStore>,
  pub runner: Rc<dyn CommandRunner>,
  pub console: Rc<Console>,
}

/// Make `env` available to commands called from Lua.
pub fn install_action_env(lua: &Lua, env: ActionEnv) {
  lua.set_app_data(env);
}

pub(crate) fn action_env(lua: &Lua) -> LuaResult<ActionEnv> {
  lua
    .app_data_ref::<ActionEnv>()
    .map(|env| ActionEnv::clone(&env))
    .ok_or_else(|| LuaError::external("commands can only run while a rule action runs"))
}

/// Read a command binding back from its Lua table, if `table` is one.
pub fn command_from_table(table: &LuaTable) -> LuaResult<Option<CommandDef>> {
  let is_command = table
    .metatable()
    .and_then(|mt| mt.get::<String>("__type").ok())
    .is_some_and(|t| t == COMMAND_TYPE);

  if !is_command {
    return Ok(None);
  }

  let program: String = table.get("program")?;
  let base_args: Option<String> = table.get("args")?;
  Ok(Some(CommandDef::new(program).with_base_args(base_args.unwrap_or_default())))
}

fn exit_code(invocation: Invocation) -> Option<i32> {
  match invocation {
    Invocation::Completed(output) => output.code,
    Invocation::NotFound => None,
  }
}

/// The `__call` metamethod shared by every command binding.
///
/// `CC("$(C_FLAGS)")` invokes the binding with the call-site arguments and
/// returns the exit code, or nil when the program was not found.
pub fn create_call_function(lua: &Lua) -> LuaResult<LuaFunction> {
  lua.create_async_function(|lua, (this, call_args): (LuaTable, Option<String>)| async move {
    let command = command_from_table(&this)?.ok_or_else(|| LuaError::external("not a command binding"))?;
    let env = action_env(&lua)?;

    let invocation = command::invoke(
      &command,
      call_args.as_deref().unwrap_or(""),
      &env.vars,
      env.runner.as_ref(),
      &env.console,
    )
    .await
    .map_err(LuaError::external)?;

    Ok(exit_code(invocation))
  })
}

/// `pake.run(program [, args])`: run an ad-hoc program.
pub fn create_run_function(lua: &Lua) -> LuaResult<LuaFunction> {
  lua.create_async_function(|lua, (program, args): (String, Option<String>)| async move {
    let env = action_env(&lua)?;

    let invocation = command::invoke(
      &CommandDef::new(program),
      args.as_deref().unwrap_or(""),
      &env.vars,
      env.runner.as_ref(),
      &env.console,
    )
    .await
    .map_err(LuaError::external)?;

    Ok(exit_code(invocation))
  })
}

/// `pake.eval(expr)`: expand references against the running unit.
pub fn create_eval_function(lua: &Lua) -> LuaResult<LuaFunction> {
  lua.create_function(|lua, expr: String| {
    let env = action_env(lua)?;
    expand::evaluate(&expr, &env.vars).map_err(LuaError::external)
  })
}

/// The table passed to a script action: `{ name, targets, dependencies }`.
pub fn rule_context(lua: &Lua, name: &str, targets: &[String], dependencies: &[String]) -> LuaResult<LuaTable> {
  let ctx = lua.create_table()?;
  ctx.set("name", name)?;
  ctx.set("targets", lua.create_sequence_from(targets.iter().map(String::as_str))?)?;
  ctx.set(
    "dependencies",
    lua.create_sequence_from(dependencies.iter().map(String::as_str))?,
  )?;
  Ok(ctx)
}
