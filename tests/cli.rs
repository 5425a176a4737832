/**
 * Copyright 2022 - Jahred Love
 *
 * Redistribution and use in source and binary forms, with or without modification,
 * are permitted provided that the following conditions are met:
 *
 * 1. Redistributions of source code must retain the above copyright notice, this
 * list of conditions and the following disclaimer.
 *
 * 2. Redistributions in binary form must reproduce the above copyright notice, this
 * list of conditions and the following disclaimer in the documentation and/or other
 * materials provided with the distribution.
 *
 * 3. Neither the name of the copyright holder nor the names of its contributors may
 * be used to endorse or promote products derived from this software without specific
 * prior written permission.
 *
 * THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS “AS IS” AND
 * ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO, THE IMPLIED
 * WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE DISCLAIMED.
 * IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE FOR ANY DIRECT,
 * INDIRECT, INCIDENTAL, SPECIAL, EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT
 * NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR SERVICES; LOSS OF USE, DATA, OR
 * PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF LIABILITY,
 * WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE)
 * ARISING IN ANY WAY OUT OF THE USE OF THIS SOFTWARE, EVEN IF ADVISED OF THE
 * POSSIBILITY OF SUCH DAMAGE.
 */

// End-to-end driver tests: exit codes, output.ll placement, diagnostics on
// stderr. Each test runs the real binary in its own scratch directory.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_mccomp")
}

fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("mccomp-cli-{}-{}", tag, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn run_in(dir: &PathBuf, args: &[&str]) -> Output {
    Command::new(bin())
        .args(args)
        .current_dir(dir)
        .env_remove("MCCOMP_DEBUG")
        .output()
        .expect("failed to run compiler")
}

#[test]
fn valid_program_exits_zero_and_writes_output_ll() {
    let dir = scratch_dir("ok");
    fs::write(
        dir.join("prog.c"),
        "int main() {\n    int x;\n    x = 41;\n    return x + 1;\n}\n",
    )
    .unwrap();

    let out = run_in(&dir, &["prog.c"]);
    assert!(
        out.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );

    let ll = fs::read_to_string(dir.join("output.ll")).unwrap();
    assert!(ll.contains("; ModuleID = 'mini-c'"), "{ll}");
    assert!(ll.contains("define i32 @main()"), "{ll}");
    assert!(ll.contains("add i32"), "{ll}");

    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Output: output.ll"), "{stderr}");
}

#[test]
fn semantic_failure_exits_one_and_writes_no_ir() {
    let dir = scratch_dir("divzero");
    fs::write(dir.join("prog.c"), "int main() {\n    return 1 / 0;\n}\n").unwrap();

    let out = run_in(&dir, &["prog.c"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(!dir.join("output.ll").exists());

    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("division by zero"), "{stderr}");
    assert!(stderr.contains("prog.c:2:"), "{stderr}");
}

#[test]
fn syntax_failure_reports_location_and_caret() {
    let dir = scratch_dir("syntax");
    fs::write(
        dir.join("prog.c"),
        "int main() {\n    int x;\n    if (x = 5) {\n        return 1;\n    }\n    return 0;\n}\n",
    )
    .unwrap();

    let out = run_in(&dir, &["prog.c"]);
    assert_eq!(out.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Syntax error"), "{stderr}");
    assert!(stderr.contains("use comparison (==)"), "{stderr}");
    assert!(stderr.contains("if (x = 5) {"), "{stderr}");
    assert!(stderr.contains("^"), "{stderr}");
}

#[test]
fn missing_main_exits_one_with_semantic_error() {
    let dir = scratch_dir("nomain");
    fs::write(dir.join("prog.c"), "int helper() {\n    return 1;\n}\n").unwrap();

    let out = run_in(&dir, &["prog.c"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(!dir.join("output.ll").exists());

    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("'main'"), "{stderr}");
}

#[test]
fn missing_input_file_exits_one() {
    let dir = scratch_dir("noinput");
    let out = run_in(&dir, &["does-not-exist.c"]);
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn no_arguments_prints_usage_and_exits_one() {
    let dir = scratch_dir("usage");
    let out = run_in(&dir, &[]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("usage"), "{stderr}");
}

#[test]
fn debug_flag_enables_phase_tracing() {
    let dir = scratch_dir("debug");
    fs::write(dir.join("prog.c"), "int main() {\n    return 0;\n}\n").unwrap();

    let out = run_in(&dir, &["-d", "user", "prog.c"]);
    assert!(out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("[USER]"), "{stderr}");
}

#[test]
fn debug_env_var_enables_tracing() {
    let dir = scratch_dir("debugenv");
    fs::write(dir.join("prog.c"), "int main() {\n    return 0;\n}\n").unwrap();

    let out = Command::new(bin())
        .arg("prog.c")
        .current_dir(&dir)
        .env("MCCOMP_DEBUG", "parser")
        .output()
        .expect("failed to run compiler");
    assert!(out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("[PARSER]"), "{stderr}");
}

#[test]
fn suggestion_appears_in_rendered_diagnostics() {
    let dir = scratch_dir("suggest");
    fs::write(
        dir.join("prog.c"),
        "int counter;\n\nint main() {\n    countr = 1;\n    return 0;\n}\n",
    )
    .unwrap();

    let out = run_in(&dir, &["prog.c"]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("did you mean"), "{stderr}");
    assert!(stderr.contains("counter"), "{stderr}");
}

#[test]
fn multiple_errors_are_all_reported() {
    let dir = scratch_dir("multi");
    fs::write(
        dir.join("prog.c"),
        "int f() {\n    return missing;\n}\n\nint g() {\n    return 1 % 0;\n}\n\nint main() {\n    return 0;\n}\n",
    )
    .unwrap();

    let out = run_in(&dir, &["prog.c"]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("undefined variable 'missing'"), "{stderr}");
    assert!(stderr.contains("modulo by zero"), "{stderr}");
    assert!(stderr.contains("2 error(s)"), "{stderr}");
}
