//! End-to-end tests of the compilation pipeline, driven through the public
//! API with the in-memory source provider.

use std::path::Path;
use superini_core::{
    compile_str, CompileError, Compilation, Compiler, Config, ErrorKind, InMemoryProvider,
    WarningKind, GLOBAL_SCOPE,
};

fn compile(src: &str) -> Compilation {
    compile_str(src, "test.sini").unwrap_or_else(|e| panic!("unexpected error: {}", e))
}

fn compile_err(src: &str) -> CompileError {
    match compile_str(src, "test.sini") {
        Ok(c) => panic!("expected failure, got:\n{}", c.to_ini()),
        Err(e) => e,
    }
}

// ──────────────────────────────────────────────
// Scopes and pairs
// ──────────────────────────────────────────────

#[test]
fn headerless_document_lands_in_global_scope() {
    let c = compile("name = demo\nversion = 3\n");
    assert_eq!(c.table.len(), 1);
    assert_eq!(c.table.lookup(GLOBAL_SCOPE, "name"), Some("demo"));
    assert_eq!(c.to_ini(), "[__global__]\nname=demo\nversion=3\n");
}

#[test]
fn empty_input_still_has_global_scope() {
    let c = compile("");
    assert_eq!(c.to_ini(), "[__global__]\n");
}

#[test]
fn last_assignment_wins() {
    let c = compile("[s]\nk = 1\nk = 2\n");
    assert_eq!(c.table.lookup("s", "k"), Some("2"));
    assert_eq!(c.warnings[0].kind, WarningKind::DuplicateKey);
}

#[test]
fn empty_value_only_type_checks_as_str() {
    compile("[s]\nk: str =\n");
    assert_eq!(compile_err("[s]\nk: int =\n").kind, ErrorKind::TypeError);
    assert_eq!(compile_err("[s]\nk: bool =\n").kind, ErrorKind::TypeError);
}

// ──────────────────────────────────────────────
// Types
// ──────────────────────────────────────────────

#[test]
fn declared_types_are_enforced() {
    compile("[w]\ndamage: i32 = 355\nflag: bool = True\n");

    let err = compile_err("[w]\ndamage: i32 = 99999999999999\n");
    assert_eq!(err.kind, ErrorKind::TypeError);
    assert_eq!(err.detail, "i32");
    assert_eq!(err.trace.as_ref().unwrap().line, 2);

    assert_eq!(compile_err("[w]\nflag: bool = yes\n").kind, ErrorKind::TypeError);
}

#[test]
fn unknown_type_is_fatal() {
    let err = compile_err("[w]\nk: decimal = 1\n");
    assert_eq!(err.kind, ErrorKind::UndefinedType);
    assert_eq!(err.detail, "decimal");
}

#[test]
fn types_are_checked_after_resolution() {
    let c = compile("[c]\nn = 42\n[s]\nv: i8 = c::n\n");
    assert_eq!(c.table.lookup("s", "v"), Some("42"));

    let err = compile_err("[c]\nn = 4200\n[s]\nv: i8 = c::n\n");
    assert_eq!(err.kind, ErrorKind::TypeError);
}

// ──────────────────────────────────────────────
// References
// ──────────────────────────────────────────────

#[test]
fn reference_resolves_to_current_value() {
    let c = compile("[constants] :: internal\nPI = 3.14159\n[circle]\npi = constants::PI\n");
    assert_eq!(c.to_ini(), "[__global__]\n[circle]\npi=3.14159\n");
    assert!(c.warnings.is_empty());
}

#[test]
fn missing_scope_reference_is_kept_with_warning() {
    let c = compile("[s]\nk = A::k\n");
    assert_eq!(c.table.lookup("s", "k"), Some("A::k"));
    assert_eq!(c.warnings.len(), 1);
    assert_eq!(c.warnings[0].kind, WarningKind::UndefinedScopeReference);
}

#[test]
fn missing_key_reference_is_kept_with_warning() {
    let c = compile("[A]\nother = 1\n[s]\nk = A::k\n");
    assert_eq!(c.table.lookup("s", "k"), Some("A::k"));
    assert_eq!(c.warnings[0].kind, WarningKind::UndefinedKeyReference);
}

#[test]
fn forward_reference_reads_unresolved_text() {
    let c = compile("[a]\nx = b::y\n[b]\ny = c::z\n[c]\nz = 5\n");
    assert_eq!(c.table.lookup("a", "x"), Some("c::z"));
    assert_eq!(c.table.lookup("b", "y"), Some("5"));
}

// ──────────────────────────────────────────────
// Closures
// ──────────────────────────────────────────────

const WEAPONS: &str = "[Weapons] :: abstract :x :y\n";

#[test]
fn as_requires_every_abstract_key() {
    let err = compile_err(&format!("{}[Sword] :: as :Weapons\nx = 1\n", WEAPONS));
    assert_eq!(err.kind, ErrorKind::StructInitialization);
    assert_eq!(err.detail, "y");

    let c = compile(&format!("{}[Sword] :: as :Weapons\nx = 1\ny = 2\n", WEAPONS));
    assert_eq!(c.to_ini(), "[__global__]\n[Weapons]\n[Sword]\nx=1\ny=2\n");
}

#[test]
fn as_with_missing_target_is_fatal() {
    let err = compile_err("[Sword] :: as :Nothing\nx = 1\n");
    assert_eq!(err.kind, ErrorKind::UndefinedClosure);
    assert_eq!(err.detail, "Nothing");
}

#[test]
fn as_requires_exactly_one_target() {
    let err = compile_err("[Sword] :: as\nx = 1\n");
    assert_eq!(err.kind, ErrorKind::ClosureArgument);
}

#[test]
fn inline_writes_caller_values_into_target() {
    let c = compile(&format!("{}[Sword] :: inline :Weapons\ny = 2\nx = 1\n", WEAPONS));
    assert_eq!(c.table.lookup("Weapons", "Sword"), Some("1 2"));
    assert!(c.table.get("Sword").unwrap().internal);
    assert_eq!(c.to_ini(), "[__global__]\n[Weapons]\nSword=1 2\n");
}

#[test]
fn inline_with_missing_key_is_fatal() {
    let err = compile_err(&format!("{}[Sword] :: inline :Weapons\nx = 1\n", WEAPONS));
    assert_eq!(err.kind, ErrorKind::StructInitialization);
}

#[test]
fn empty_abstract_warns() {
    let c = compile("[Base] :: abstract\n");
    assert_eq!(c.warnings.len(), 1);
    assert_eq!(c.warnings[0].kind, WarningKind::EmptyStruct);
}

#[test]
fn abstract_symbols_on_separate_lines() {
    let src = "[Weapons] :: abstract\n:x\n:y :z\n[Sword] :: as :Weapons\nx = 1\ny = 2\n";
    assert_eq!(compile_err(src).detail, "z");
}

#[test]
fn internal_scopes_never_serialize() {
    let c = compile(
        "[a] :: internal\nk = 1\n[env] :: setenv\nfoo = bar\n\
         [T] :: abstract :k\n[b] :: inline :T\nk = 2\n[shown]\nk = 3\n",
    );
    let out = c.to_ini();
    assert_eq!(out, "[__global__]\n[T]\nb=2\n[shown]\nk=3\n");
}

#[test]
fn setenv_writes_configuration() {
    let c = compile(
        "[env] :: setenv\noutput = build/game.ini\nsorted = True\n[b]\nz = 1\n[a]\ny = 2\n",
    );
    assert_eq!(c.config.output(), Some("build/game.ini"));
    assert!(c.config.is_sorted());
    assert_eq!(c.to_ini(), "[__global__]\n[a]\ny=2\n[b]\nz=1\n");
}

#[test]
fn seeded_configuration_is_respected() {
    let provider = InMemoryProvider::default();
    let mut config = Config::default();
    config.set_sorted(true);
    let c = Compiler::new(&provider)
        .with_config(config)
        .compile_str("[b]\n[a]\n", "x.sini")
        .unwrap();
    assert_eq!(c.to_ini(), "[__global__]\n[a]\n[b]\n");
}

#[test]
fn eval_computes_values() {
    let c = compile("[calc] :: eval\nbase = 40\ntotal = base + 2\nratio = 1 / 4\nname = hello\n");
    assert_eq!(c.table.lookup("calc", "total"), Some("42"));
    assert_eq!(c.table.lookup("calc", "ratio"), Some("0.25"));
    assert_eq!(c.table.lookup("calc", "name"), Some("hello"));
}

#[test]
fn eval_runs_after_reference_resolution() {
    let c = compile("[c]\nn = 6\n[calc] :: eval\nv = c::n * 7\n");
    assert_eq!(c.table.lookup("calc", "v"), Some("42"));
}

#[test]
fn eval_failure_is_fatal() {
    let err = compile_err("[calc] :: eval\nv = 1 / 0\n");
    assert_eq!(err.kind, ErrorKind::EvalError);
    assert_eq!(err.code(), "E07");
    assert_eq!(compile_err("[calc] :: eval\nv = hello world\n").kind, ErrorKind::EvalError);
}

#[test]
fn deeply_nested_eval_is_an_error() {
    let depth = 200_000;
    let src = format!(
        "[calc] :: eval\nv = {}1{}\n",
        "(".repeat(depth),
        ")".repeat(depth)
    );
    let err = compile_err(&src);
    assert_eq!(err.kind, ErrorKind::EvalError);
    assert_eq!(err.detail, "expression nested too deeply");
    assert_eq!(err.trace.unwrap().line, 2);
}

#[test]
fn declared_type_is_checked_before_closures_run() {
    let err = compile_err("[calc] :: eval\nv: i32 = 1 + 2\n");
    assert_eq!(err.kind, ErrorKind::TypeError);
    assert_eq!(err.detail, "i32");
}

#[test]
fn keys_added_by_closures_are_not_resolved_again() {
    let c = compile("[T] :: abstract :x\n[c] :: inline :T\nx = nope::k\n");
    assert_eq!(c.table.lookup("T", "c"), Some("nope::k"));
    assert_eq!(c.warnings.len(), 1);
    assert_eq!(c.warnings[0].kind, WarningKind::UndefinedScopeReference);
}

#[test]
fn closures_run_in_declaration_order() {
    let c = compile("[calc] :: eval, setenv\nsorted = 1 - 1\n");
    assert_eq!(c.config.get("sorted"), Some("0"));
}

// ──────────────────────────────────────────────
// Output stability
// ──────────────────────────────────────────────

#[test]
fn recompiling_output_is_byte_identical() {
    let src = "top = 1\n[constants] :: internal\nPI = 3.14\n[game]\npi = constants::PI\n\
               motd = hello\n    world\n\
               [Weapons] :: abstract :x\n[Bow] :: inline :Weapons\nx = 9\n";
    let first = compile(src).to_ini();
    let second = compile_str(&first, "out.ini").unwrap().to_ini();
    assert_eq!(first, second);
}

#[test]
fn stats_count_internal_objects() {
    let c = compile("g = 1\n[a] :: internal\nx = 1\n[b]\ny = 2\n");
    let stats = c.stats();
    assert_eq!(stats.objects, 3);
    assert_eq!(stats.internal_objects, 1);
    assert_eq!(stats.public_keys(), 2);
}

// ──────────────────────────────────────────────
// Include
// ──────────────────────────────────────────────

fn compile_in_memory(provider: &InMemoryProvider, root: &str) -> Result<Compilation, CompileError> {
    Compiler::new(provider).compile_file(Path::new(root))
}

#[test]
fn include_merges_after_primary_document() {
    let provider = InMemoryProvider::default()
        .with_file(
            "conf/main.sini",
            "[shared]\nk = 1\n[libs] :: include :lib/extra.sini\n[own]\nv = 1\n",
        )
        .with_file("conf/lib/extra.sini", "[shared]\nk = 2\n[extra]\ne = 3\n");

    let c = compile_in_memory(&provider, "conf/main.sini").unwrap();
    assert_eq!(
        c.to_ini(),
        "[__global__]\n[shared]\nk=2\n[libs]\n[own]\nv=1\n[extra]\ne=3\n"
    );
}

#[test]
fn included_globals_replace_only_when_non_empty() {
    let provider = InMemoryProvider::default()
        .with_file("main.sini", "g = main\n[i] :: include :a.sini :b.sini\n")
        .with_file("a.sini", "[a]\n")
        .with_file("b.sini", "g = b\n");

    let c = compile_in_memory(&provider, "main.sini").unwrap();
    assert_eq!(c.table.lookup(GLOBAL_SCOPE, "g"), Some("b"));
    assert!(c.table.contains("a"));
}

#[test]
fn included_setenv_reaches_shared_configuration() {
    let provider = InMemoryProvider::default()
        .with_file("main.sini", "[i] :: include :env.sini\n")
        .with_file("env.sini", "[env] :: setenv\noutput = out.ini\n");

    let c = compile_in_memory(&provider, "main.sini").unwrap();
    assert_eq!(c.config.output(), Some("out.ini"));
    assert!(!c.to_ini().contains("[env]"));
}

#[test]
fn missing_include_is_fatal() {
    let provider =
        InMemoryProvider::default().with_file("main.sini", "[i] :: include :gone.sini\n");
    let err = compile_in_memory(&provider, "main.sini").unwrap_err();
    assert_eq!(err.kind, ErrorKind::NoInput);
    assert_eq!(err.trace.unwrap().scope, "i");
}

#[test]
fn include_cycle_is_detected() {
    let provider = InMemoryProvider::default()
        .with_file("a.sini", "[x] :: include :b.sini\n")
        .with_file("b.sini", "[y] :: include :a.sini\n");

    let err = compile_in_memory(&provider, "a.sini").unwrap_err();
    assert_eq!(err.kind, ErrorKind::IncludeCycle);
    assert_eq!(err.detail, "a.sini \u{2192} b.sini \u{2192} a.sini");
}

#[test]
fn self_include_is_a_cycle() {
    let provider = InMemoryProvider::default().with_file("a.sini", "[x] :: include :a.sini\n");
    let err = compile_in_memory(&provider, "a.sini").unwrap_err();
    assert_eq!(err.kind, ErrorKind::IncludeCycle);
}

#[test]
fn missing_root_is_no_input() {
    let provider = InMemoryProvider::default();
    let err = compile_in_memory(&provider, "nope.sini").unwrap_err();
    assert_eq!(err.kind, ErrorKind::NoInput);
    assert!(err.trace.is_none());
}
