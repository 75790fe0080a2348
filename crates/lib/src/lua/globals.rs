//! The `pake` global table.
//!
//! - `pake.command(program [, args])` - declare a command binding
//! - `pake.rule{}` - declare a rule
//! - `pake.eval(str)` - expand `$(NAME)` references (inside actions)
//! - `pake.run(program [, args])` - run an ad-hoc program (inside actions)
//! - `pake.dir` - directory of the rule file being loaded

use std::cell::RefCell;
use std::rc::Rc;

use mlua::prelude::*;

use super::action;
use crate::consts::COMMAND_TYPE;
use crate::graph::RuleGraph;
use crate::rule::{Action, Rule, Step};

/// Register the `pake` global table.
///
/// Rules declared with `pake.rule{}` go into `graph`. Once the loader takes
/// the graph out of the slot, further declarations fail.
pub fn register_globals(lua: &Lua, graph: Rc<RefCell<Option<RuleGraph>>>) -> LuaResult<()> {
  let pake = lua.create_table()?;

  register_pake_command(lua, &pake)?;
  register_pake_rule(lua, &pake, graph)?;
  pake.set("eval", action::create_eval_function(lua)?)?;
  pake.set("run", action::create_run_function(lua)?)?;

  lua.globals().set("pake", pake)?;
  Ok(())
}

fn register_pake_command(lua: &Lua, pake: &LuaTable) -> LuaResult<()> {
  let mt = lua.create_table()?;
  mt.set("__type", COMMAND_TYPE)?;
  mt.set("__call", action::create_call_function(lua)?)?;

  let command_fn = lua.create_function(move |lua, (program, args): (String, Option<String>)| {
    if program.trim().is_empty() {
      return Err(LuaError::external("pake.command requires a program"));
    }
    let table = lua.create_table()?;
    table.set("program", program)?;
    table.set("args", args.unwrap_or_default())?;
    table.set_metatable(Some(mt.clone()))?;
    Ok(table)
  })?;
  pake.set("command", command_fn)?;
  Ok(())
}

fn register_pake_rule(lua: &Lua, pake: &LuaTable, graph: Rc<RefCell<Option<RuleGraph>>>) -> LuaResult<()> {
  let rule_fn = lua.create_function(move |_, spec: LuaTable| {
    let rule = parse_rule(&spec)?;
    let mut slot = graph.borrow_mut();
    let graph = slot
      .as_mut()
      .ok_or_else(|| LuaError::external("rules can only be declared while the rule file loads"))?;
    graph.add_rule(rule);
    Ok(())
  })?;
  pake.set("rule", rule_fn)?;
  Ok(())
}

/// Parse a `pake.rule{}` table into a [`Rule`].
pub fn parse_rule(spec: &LuaTable) -> LuaResult<Rule> {
  let name: String = spec
    .get::<Option<String>>("name")
    .map_err(|_| LuaError::external("rule 'name' must be a string"))?
    .ok_or_else(|| LuaError::external("rule spec requires 'name' field"))?;

  let targets = string_list(spec.get("target")?, &name, "target")?;
  let dependencies = string_list(spec.get("dependency")?, &name, "dependency")?;

  let is_default = match spec.get::<LuaValue>("default")? {
    LuaValue::Nil => false,
    LuaValue::Boolean(b) => b,
    other => {
      return Err(LuaError::external(format!(
        "rule '{name}': 'default' must be a boolean, got {}",
        other.type_name()
      )));
    }
  };

  let action = match spec.get::<LuaValue>("action")? {
    LuaValue::Nil => Action::None,
    LuaValue::Function(f) => Action::Script(f),
    LuaValue::Table(t) => Action::Steps(parse_steps(&t, &name)?),
    other => {
      return Err(LuaError::external(format!(
        "rule '{name}': 'action' must be a function or a list of steps, got {}",
        other.type_name()
      )));
    }
  };

  let mut rule = Rule::new(name).with_default(is_default).with_action(action);
  rule.targets = targets;
  rule.dependencies = dependencies;
  Ok(rule)
}

fn string_list(value: LuaValue, rule: &str, field: &str) -> LuaResult<Vec<String>> {
  match value {
    LuaValue::Nil => Ok(Vec::new()),
    LuaValue::String(s) => Ok(vec![s.to_str()?.to_string()]),
    LuaValue::Table(t) => t
      .sequence_values::<LuaValue>()
      .map(|item| match item? {
        LuaValue::String(s) => Ok(s.to_str()?.to_string()),
        other => Err(LuaError::external(format!(
          "rule '{rule}': '{field}' entries must be strings, got {}",
          other.type_name()
        ))),
      })
      .collect(),
    other => Err(LuaError::external(format!(
      "rule '{rule}': '{field}' must be a string or a list of strings, got {}",
      other.type_name()
    ))),
  }
}

fn parse_steps(steps: &LuaTable, rule: &str) -> LuaResult<Vec<Step>> {
  let mut parsed = Vec::new();
  for (i, step) in steps.sequence_values::<LuaValue>().enumerate() {
    let LuaValue::Table(step) = step? else {
      return Err(LuaError::external(format!(
        "rule '{rule}': step {} must be a table like {{ \"CMD\", \"args\" }}",
        i + 1
      )));
    };
    let command: String = step
      .get::<Option<String>>(1)?
      .ok_or_else(|| LuaError::external(format!("rule '{rule}': step {} has no command name", i + 1)))?;
    let args: Option<String> = step.get(2)?;
    parsed.push(Step::new(command, args.unwrap_or_default()));
  }
  Ok(parsed)
}
