//! Building with real programs (`cp`, `echo`, `sh`).

use predicates::prelude::*;

use super::common::TestEnv;

const COPY_RULES: &str = r#"
CP = pake.command("cp")
ECHO = pake.command("echo")

SRC = "input.txt"
OUT = "output.txt"

pake.rule {
  name = "copy",
  target = "$(OUT)",
  dependency = "$(SRC)",
  default = true,
  action = {
    { "ECHO", "copying $(SRC)" },
    { "CP", "$(SRC) $(OUT)" },
  },
}
"#;

#[test]
fn builds_default_rule() {
  let env = TestEnv::new(COPY_RULES);
  env.write_file("input.txt", "payload");
  env.age("input.txt", 60);

  env
    .pake()
    .assert()
    .success()
    .stdout(predicate::str::contains("copying input.txt"))
    .stdout(predicate::str::contains("1 rule(s) run"));

  assert_eq!(std::fs::read_to_string(env.path("output.txt")).unwrap(), "payload");
}

#[test]
fn second_run_has_nothing_to_do() {
  let env = TestEnv::new(COPY_RULES);
  env.write_file("input.txt", "payload");
  env.age("input.txt", 60);

  env.pake().assert().success();
  env.age("output.txt", 30);

  env
    .pake()
    .arg("copy")
    .assert()
    .success()
    .stdout(predicate::str::contains("*** Nothing to do for 'input.txt'"))
    .stdout(predicate::str::contains("copying").not());
}

#[test]
fn stderr_is_marked() {
  let env = TestEnv::new(
    r#"
    SH = pake.command("sh", "-c")
    pake.rule { name = "warn", default = true, action = { { "SH", "'echo careful 1>&2; exit 4'" } } }
    "#,
  );

  env
    .pake()
    .assert()
    .success()
    .stdout(predicate::str::contains("[stderr] careful"));
}

#[test]
fn missing_program_warns_but_succeeds() {
  let env = TestEnv::new(
    r#"
    GONE = pake.command("pake-no-such-program")
    pake.rule { name = "all", default = true, action = { { "GONE", "--flag" } } }
    "#,
  );

  env
    .pake()
    .assert()
    .success()
    .stdout(predicate::str::contains(
      "warning: command 'pake-no-such-program' not found",
    ));
}

#[test]
fn script_action_runs_commands() {
  let env = TestEnv::new(
    r#"
    SH = pake.command("sh", "-c")
    NAME = "world"
    pake.rule {
      name = "greet",
      target = "greeting.txt",
      action = function(ctx)
        SH("'echo hello $(NAME) > " .. ctx.targets[1] .. "'")
      end,
    }
    "#,
  );

  env.pake().arg("greet").assert().success();

  assert_eq!(
    std::fs::read_to_string(env.path("greeting.txt")).unwrap(),
    "hello world\n"
  );
}

#[test]
fn verbose_logs_to_stderr() {
  let env = TestEnv::new(r#"pake.rule { name = "noop", default = true }"#);

  env
    .pake()
    .arg("-v")
    .assert()
    .success()
    .stderr(predicate::str::contains("running rule"));
}
