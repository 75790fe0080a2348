//! Building rule files end to end.

use std::time::{Duration, SystemTime};

use pake_lib::build::BuildError;
use pake_lib::load::load_unit;

use super::common::Project;

const HELLO: &str = r#"
CC = pake.command("cc")
ECHO = pake.command("echo")
RUN = pake.command("./$(EXE)")

C_FLAGS = "-o $(EXE) $(C_SOURCES)"
C_SOURCES = "hello.c"
EXE = "hello"

pake.rule {
  name = "run",
  dependency = "$(EXE)",
  default = true,
  action = { { "RUN" } },
}

pake.rule {
  name = "build",
  target = "$(EXE)",
  dependency = "$(C_SOURCES)",
  action = function()
    ECHO("$(CC) $(C_FLAGS)")
    CC("$(C_FLAGS)")
  end,
}
"#;

fn age(project: &Project, name: &str, secs: u64) {
  let mtime = SystemTime::now() - Duration::from_secs(secs);
  std::fs::File::options()
    .write(true)
    .open(project.temp.path().join(name))
    .unwrap()
    .set_modified(mtime)
    .unwrap();
}

mod hello_world {
  use super::*;

  #[tokio::test]
  async fn default_rule_builds_then_runs() {
    let project = Project::new(HELLO);
    project.write("hello.c", "int main() { return 0; }");
    age(&project, "hello.c", 60);

    let unit = load_unit(&project.rule_file()).unwrap();
    let report = project.orchestrator(&unit).execute_default().await.unwrap();

    assert_eq!(report.executed, vec!["build", "run"]);
    assert!(project.exists("hello"));
    assert_eq!(
      project.tools.calls(),
      vec!["echo cc -o hello hello.c", "cc -o hello hello.c", "./hello"]
    );
  }

  #[tokio::test]
  async fn second_build_has_nothing_to_do() {
    let project = Project::new(HELLO);
    project.write("hello.c", "int main() { return 0; }");
    age(&project, "hello.c", 60);

    let unit = load_unit(&project.rule_file()).unwrap();
    let orchestrator = project.orchestrator(&unit);
    orchestrator.execute_rule("build").await.unwrap();
    let report = orchestrator.execute_rule("build").await.unwrap();

    assert!(report.executed.is_empty());
    assert_eq!(report.up_to_date, vec!["build"]);
    assert_eq!(project.tools.calls().len(), 2);
    assert!(
      project
        .output
        .contents()
        .contains("*** Nothing to do for 'hello.c' in ")
    );
  }

  #[tokio::test]
  async fn edited_source_rebuilds() {
    let project = Project::new(HELLO);
    project.write("hello.c", "int main() { return 0; }");
    age(&project, "hello.c", 60);

    let unit = load_unit(&project.rule_file()).unwrap();
    let orchestrator = project.orchestrator(&unit);
    orchestrator.execute_rule("build").await.unwrap();

    age(&project, "hello", 30);
    project.write("hello.c", "int main() { return 1; }");

    let report = orchestrator.execute_rule("build").await.unwrap();
    assert_eq!(report.executed, vec!["build"]);
    assert_eq!(project.tools.calls().len(), 4);
  }

  #[tokio::test]
  async fn missing_source_is_unbuildable() {
    let project = Project::new(HELLO);

    let unit = load_unit(&project.rule_file()).unwrap();
    let err = project.orchestrator(&unit).execute_default().await.unwrap_err();

    match err {
      BuildError::UnbuildableDependency { path, rule, .. } => {
        assert_eq!(path.to_str(), Some("hello.c"));
        assert_eq!(rule, "build");
      }
      other => panic!("unexpected error: {other}"),
    }
    assert!(project.tools.calls().is_empty());
  }
}

mod actions {
  use super::*;

  #[tokio::test]
  async fn command_output_reaches_console() {
    let project = Project::new(
      r#"
      CAT = pake.command("cat")
      pake.rule { name = "show", action = { { "CAT", "notes.txt" } } }
      "#,
    );
    project.write("notes.txt", "remember the milk\n");

    let unit = load_unit(&project.rule_file()).unwrap();
    project.orchestrator(&unit).execute_rule("show").await.unwrap();

    assert_eq!(project.output.contents(), "remember the milk\n");
  }

  #[tokio::test]
  async fn missing_tool_warns_and_continues() {
    let project = Project::new(
      r#"
      LINT = pake.command("missing-lint")
      pake.rule {
        name = "check",
        action = { { "LINT", "src" } },
      }
      pake.rule {
        name = "all",
        dependency = "stamp",
        action = function() pake.run("touch", "done") end,
      }
      pake.rule {
        name = "stamp",
        target = "stamp",
        action = function() LINT("src"); pake.run("touch", "stamp") end,
      }
      "#,
    );

    let unit = load_unit(&project.rule_file()).unwrap();
    let report = project.orchestrator(&unit).execute_rule("all").await.unwrap();

    assert_eq!(report.executed, vec!["stamp", "all"]);
    assert!(project.exists("done"));
    assert!(
      project
        .output
        .contents()
        .contains("warning: command 'missing-lint' not found")
    );
  }

  #[tokio::test]
  async fn copy_chain_with_lists() {
    let project = Project::new(
      r#"
      CP = pake.command("cp")
      pake.rule {
        name = "dist",
        target = { "dist-a.txt", "dist-b.txt" },
        dependency = { "a.txt", "b.txt" },
        default = true,
        action = { { "CP", "a.txt dist-a.txt" }, { "CP", "b.txt dist-b.txt" } },
      }
      pake.rule {
        name = "b",
        target = "b.txt",
        dependency = "a.txt",
        action = { { "CP", "a.txt b.txt" } },
      }
      "#,
    );
    project.write("a.txt", "alpha");
    age(&project, "a.txt", 60);

    let unit = load_unit(&project.rule_file()).unwrap();
    let orchestrator = project.orchestrator(&unit);

    let report = orchestrator.execute_default().await.unwrap();
    assert_eq!(report.executed, vec!["b", "dist"]);
    assert!(project.exists("dist-b.txt"));

    let report = orchestrator.execute_default().await.unwrap();
    assert_eq!(report.up_to_date, vec!["dist"]);
  }

  #[tokio::test]
  async fn quoted_arguments_stay_whole() {
    let project = Project::new(
      r#"
      ECHO = pake.command("echo", "-n")
      GREETING = "hello world"
      pake.rule { name = "greet", action = { { "ECHO", "'$(GREETING)' \"it's\" plain\\ word" } } }
      "#,
    );

    let unit = load_unit(&project.rule_file()).unwrap();
    project.orchestrator(&unit).execute_rule("greet").await.unwrap();

    assert_eq!(project.tools.calls(), vec!["echo -n hello world it's plain word"]);
  }
}
