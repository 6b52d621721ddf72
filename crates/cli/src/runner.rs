//! Conformance suite runner.
//!
//! Convention:
//!   positive/        -- *.sini + *.expected.ini (byte-exact output)
//!   negative/        -- *.sini + *.expected-error.json (fatal error expected)
//!   warnings/        -- *.sini + *.expected-warnings.json (array of warning codes)
//!   include/<case>/  -- main.sini + main.expected.ini or main.expected-error.json;
//!                       the other files in the directory are include targets
//!
//! The `file` field of an error is compared by file name only, so fixtures do
//! not depend on where the suite lives.

use crate::tap::Tap;
use serde_json::Value;
use std::path::{Path, PathBuf};
use superini_core::{compile_file, Compilation, CompileError};

pub struct RunResult {
    pub failed: usize,
}

pub fn run_suite(suite_dir: &Path) -> RunResult {
    let mut tap = Tap::new();

    run_positive_dir(suite_dir, &mut tap);
    run_negative_dir(suite_dir, &mut tap);
    run_warning_dir(suite_dir, &mut tap);
    run_include_cases(suite_dir, &mut tap);

    let failed = tap.failure_count();
    tap.finish();

    RunResult { failed }
}

fn run_positive_dir(suite_dir: &Path, tap: &mut Tap) {
    let dir = suite_dir.join("positive");
    for sini_path in glob_sini_files(&dir) {
        let stem = stem(&sini_path);
        let test_name = format!("positive/{}", stem);
        let expected_path = dir.join(format!("{}.expected.ini", stem));
        if !expected_path.exists() {
            tap.not_ok(
                test_name,
                format!("missing expected file: {}", expected_path.display()),
            );
            continue;
        }
        run_positive_test(&sini_path, &expected_path, &test_name, tap);
    }
}

fn run_negative_dir(suite_dir: &Path, tap: &mut Tap) {
    let dir = suite_dir.join("negative");
    for sini_path in glob_sini_files(&dir) {
        let stem = stem(&sini_path);
        let test_name = format!("negative/{}", stem);
        let expected_path = dir.join(format!("{}.expected-error.json", stem));
        if !expected_path.exists() {
            tap.not_ok(
                test_name,
                format!("missing expected-error file: {}", expected_path.display()),
            );
            continue;
        }
        run_negative_test(&sini_path, &expected_path, &test_name, tap);
    }
}

fn run_warning_dir(suite_dir: &Path, tap: &mut Tap) {
    let dir = suite_dir.join("warnings");
    for sini_path in glob_sini_files(&dir) {
        let stem = stem(&sini_path);
        let test_name = format!("warnings/{}", stem);
        let expected_path = dir.join(format!("{}.expected-warnings.json", stem));
        let expected = match read_json(&expected_path) {
            Ok(v) => v,
            Err(e) => {
                tap.not_ok(test_name, e);
                continue;
            }
        };
        match compile_file(&sini_path) {
            Ok(compilation) => {
                let got = warning_codes(&compilation);
                if got == expected {
                    tap.ok(test_name);
                } else {
                    let diff = json_diff(&expected, &got);
                    tap.not_ok(test_name, format!("warning mismatch:\n{}", diff));
                }
            }
            Err(e) => tap.not_ok(test_name, format!("unexpected compilation error: {}", e)),
        }
    }
}

fn run_include_cases(suite_dir: &Path, tap: &mut Tap) {
    let dir = suite_dir.join("include");
    let Ok(entries) = std::fs::read_dir(&dir) else {
        return;
    };
    let mut cases: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    cases.sort();

    for case in cases {
        let test_name = format!("include/{}", stem(&case));
        let root = case.join("main.sini");
        let expected_ini = case.join("main.expected.ini");
        let expected_error = case.join("main.expected-error.json");
        if expected_ini.exists() {
            run_positive_test(&root, &expected_ini, &test_name, tap);
        } else if expected_error.exists() {
            run_negative_test(&root, &expected_error, &test_name, tap);
        } else {
            tap.not_ok(test_name, "missing main.expected.ini or main.expected-error.json");
        }
    }
}

fn run_positive_test(sini_path: &Path, expected_path: &Path, test_name: &str, tap: &mut Tap) {
    let expected = match std::fs::read_to_string(expected_path) {
        Ok(s) => s,
        Err(e) => {
            tap.not_ok(test_name, format!("failed to read expected file: {}", e));
            return;
        }
    };

    match compile_file(sini_path) {
        Ok(compilation) => {
            let got = compilation.to_ini();
            if got == expected {
                tap.ok(test_name);
            } else {
                tap.not_ok(
                    test_name,
                    format!("output mismatch:\n--- expected\n{}+++ got\n{}", expected, got),
                );
            }
        }
        Err(e) => {
            tap.not_ok(test_name, format!("unexpected compilation error: {}", e));
        }
    }
}

fn run_negative_test(sini_path: &Path, expected_error_path: &Path, test_name: &str, tap: &mut Tap) {
    let expected_error = match read_json(expected_error_path) {
        Ok(v) => v,
        Err(e) => {
            tap.not_ok(test_name, format!("failed to read expected-error file: {}", e));
            return;
        }
    };

    match compile_file(sini_path) {
        Err(got_error) => {
            let got_json = error_json(&got_error);
            if got_json == expected_error {
                tap.ok(test_name);
            } else {
                let diff = json_diff(&expected_error, &got_json);
                tap.not_ok(test_name, format!("error mismatch:\n{}", diff));
            }
        }
        Ok(_) => {
            tap.not_ok(test_name, "expected a compilation error but compilation succeeded");
        }
    }
}

// -- Helpers --

fn error_json(e: &CompileError) -> Value {
    let mut json = e.to_json_value();
    if let Some(path) = e.trace.as_ref().map(|t| Path::new(&t.path)) {
        json["file"] = Value::String(
            path.file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string(),
        );
    }
    json
}

fn warning_codes(compilation: &Compilation) -> Value {
    Value::Array(
        compilation
            .warnings
            .iter()
            .map(|w| Value::String(w.code().to_owned()))
            .collect(),
    )
}

fn glob_sini_files(dir: &Path) -> Vec<PathBuf> {
    let mut results = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("sini") {
                results.push(path);
            }
        }
    }
    results.sort();
    results
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

fn read_json(path: &Path) -> Result<Value, String> {
    let src = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    serde_json::from_str(&src).map_err(|e| format!("invalid JSON in {}: {}", path.display(), e))
}

fn json_diff(expected: &Value, got: &Value) -> String {
    let exp_str = serde_json::to_string_pretty(expected).unwrap_or_default();
    let got_str = serde_json::to_string_pretty(got).unwrap_or_default();
    format!("--- expected\n{}\n+++ got\n{}", exp_str, got_str)
}
