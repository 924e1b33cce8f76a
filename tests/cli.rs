use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn rox() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("rox"))
}

fn script(source: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", source).unwrap();
    file
}

#[test]
fn run_prints_program_output() {
    let file = script("var a = 1;\nfun twice(x) { return x * 2; }\nprint twice(a) + 0.5;");

    rox()
        .arg("run")
        .arg(file.path())
        .assert()
        .success()
        .stdout("2.5\n")
        .stderr(predicate::str::is_empty());
}

#[test]
fn run_reports_static_errors_with_65() {
    let file = script("print \"never\";\n{ var a = a; }");

    rox()
        .arg("run")
        .arg(file.path())
        .assert()
        .code(65)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains(
            "[line 2] Error at 'a': Can't read local variable in its own initializer.",
        ));
}

#[test]
fn run_reports_runtime_errors_with_70() {
    let file = script("print \"first\";\nprint -nil;");

    rox()
        .arg("run")
        .arg(file.path())
        .assert()
        .code(70)
        .stdout("first\n")
        .stderr(predicate::str::contains("Operand must be a number.\n[line 2]"));
}

#[test]
fn tokenize_lists_tokens() {
    let file = script("var x = \"hi\";");

    rox()
        .arg("tokenize")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("VAR var null"))
        .stdout(predicate::str::contains("STRING \"hi\" hi"))
        .stdout(predicate::str::contains("EOF  null"));
}

#[test]
fn tokenize_reports_bad_characters_with_65() {
    let file = script("1 $ 2");

    rox()
        .arg("tokenize")
        .arg(file.path())
        .assert()
        .code(65)
        .stdout(predicate::str::contains("NUMBER 2 2.0"))
        .stderr(predicate::str::contains("[line 1] Error: Unexpected character: $"));
}

#[test]
fn parse_prints_prefix_form() {
    let file = script("1 + 2 * (3 - x)");

    rox()
        .arg("parse")
        .arg(file.path())
        .assert()
        .success()
        .stdout("(+ 1.0 (* 2.0 (group (- 3.0 x))))\n");
}

#[test]
fn parse_prints_each_statement() {
    let file = script("var a = 1;\nwhile (a < 3) a = a + 1;\nfun f(x) { return; }");

    rox()
        .arg("parse")
        .arg(file.path())
        .assert()
        .success()
        .stdout("(var a = 1.0)\n(while (< a 3.0) (; (= a (+ a 1.0))))\n(fun f(x) (return))\n");
}

#[test]
fn parse_reports_program_errors_with_65() {
    let file = script("print 1;\nvar = 2;");

    rox()
        .arg("parse")
        .arg(file.path())
        .assert()
        .code(65)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("[line 2] Error at '=': Expected variable name"));
}

#[test]
fn parse_json() {
    let file = script("!true");

    rox()
        .args(["parse", "--json"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Unary\""))
        .stdout(predicate::str::contains("\"lexeme\": \"!\""));
}

#[test]
fn parse_json_program() {
    let file = script("print 1;");

    rox()
        .args(["parse", "--json"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Print\""))
        .stdout(predicate::str::contains("\"line\": 1"));
}

#[test]
fn run_survives_deep_nesting() {
    let depth = 50_000;
    let file = script(&format!(
        "print 0{};\n{}print \"nested\";{}",
        " + 1".repeat(200_000),
        "{".repeat(depth),
        "}".repeat(depth)
    ));

    rox()
        .arg("run")
        .arg(file.path())
        .assert()
        .success()
        .stdout("200000\nnested\n");
}

#[test]
fn evaluate_prints_value() {
    let file = script("(1 + 2) * 4 == 12");

    rox()
        .arg("evaluate")
        .arg(file.path())
        .assert()
        .success()
        .stdout("true\n");
}

#[test]
fn missing_filename_prints_notice() {
    rox()
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("No input filepath was provided."));
}

#[test]
fn unreadable_file_exits_with_74() {
    rox()
        .args(["run", "definitely/not/here.lox"])
        .assert()
        .code(74)
        .stderr(predicate::str::contains("Failed to open file"));
}

#[test]
fn log_flag_writes_log_file() {
    let file = script("print 1;");
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("rox.log");

    rox()
        .arg("--log")
        .arg("--log-file")
        .arg(&log)
        .arg("run")
        .arg(file.path())
        .assert()
        .success()
        .stdout("1\n");

    let contents = std::fs::read_to_string(&log).unwrap();
    assert!(contents.contains("Logger initialized"));
}

#[test]
fn repl_keeps_state_between_lines() {
    rox()
        .arg("repl")
        .write_stdin("var a = 20;\nfun add(b) { return a + b; }\nprint add(22);\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("42"));
}

#[test]
fn repl_recovers_after_error() {
    rox()
        .arg("repl")
        .write_stdin("print nope;\nvar = ;\nprint \"still here\";\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Undefined variable 'nope'."))
        .stderr(predicate::str::contains("Expected variable name"))
        .stdout(predicate::str::contains("still here"));
}

#[test]
fn repl_stops_on_stack_overflow() {
    rox()
        .arg("repl")
        .write_stdin("fun f() { f(); }\nf();\nprint \"unreachable\";\n")
        .assert()
        .code(70)
        .stderr(predicate::str::contains("Stack overflow."))
        .stdout(predicate::str::contains("unreachable").not());
}
