//! Loading several rule files into one session.

use pake_lib::graph::GraphError;
use pake_lib::load::LoadError;
use pake_lib::session::BuildSession;
use pake_lib::vars::Value;

use super::common::Project;

#[test]
fn units_keep_their_own_variables() {
  let app = Project::new(r#"NAME = "app"; pake.rule { name = "all", target = "$(NAME)", default = true }"#);
  let lib = Project::new(r#"NAME = "lib"; pake.rule { name = "all", target = "$(NAME)", default = true }"#);

  let mut session = BuildSession::new();
  session.load(&app.rule_file()).unwrap();
  session.load(&lib.rule_file()).unwrap();

  assert_eq!(session.len(), 2);
  let app_unit = session.unit(&app.rule_file()).unwrap();
  let lib_unit = session.unit(&lib.rule_file()).unwrap();
  assert_eq!(app_unit.vars().get("NAME"), Some(&Value::Literal("app".into())));
  assert_eq!(lib_unit.vars().get("NAME"), Some(&Value::Literal("lib".into())));
}

#[test]
fn globals_do_not_leak_between_units() {
  let first = Project::new(r#"SHARED = "first""#);
  let second = Project::new(r#"SEEN = tostring(SHARED)"#);

  let mut session = BuildSession::new();
  session.load(&first.rule_file()).unwrap();
  let unit = session.load(&second.rule_file()).unwrap();

  assert_eq!(unit.vars().get("SEEN"), Some(&Value::Literal("nil".into())));
}

#[test]
fn summaries_show_evaluated_paths() {
  let project = Project::new(
    r#"
    OUT = "build/app"
    pake.rule { name = "app", target = "$(OUT)", dependency = { "main.c", "util.c" }, default = true }
    pake.rule { name = "clean", action = function() end }
    "#,
  );

  let mut session = BuildSession::new();
  let unit = session.load(&project.rule_file()).unwrap();
  let summaries = unit.graph().summaries(unit.vars());

  assert_eq!(summaries.len(), 2);
  assert_eq!(summaries[0].name, "app");
  assert_eq!(summaries[0].targets, vec!["build/app"]);
  assert_eq!(summaries[0].dependencies, vec!["main.c", "util.c"]);
  assert!(summaries[0].default);
  assert_eq!(summaries[1].action, "script");
}

#[test]
fn multiple_defaults_fail_to_load() {
  let project = Project::new(
    r#"
    pake.rule { name = "a", default = true }
    pake.rule { name = "b", default = true }
    "#,
  );

  let err = BuildSession::new().load(&project.rule_file()).unwrap_err();
  assert!(matches!(
    err,
    LoadError::Graph {
      source: GraphError::MultipleDefaults { .. },
      ..
    }
  ));
}

#[test]
fn variable_cycle_in_target_fails_to_load() {
  let project = Project::new(
    r#"
    A = "$(B)"
    B = "$(A)"
    pake.rule { name = "loop", target = "$(A)" }
    "#,
  );

  let err = BuildSession::new().load(&project.rule_file()).unwrap_err();
  assert!(matches!(err, LoadError::Graph { source: GraphError::Expand { .. }, .. }));
}
