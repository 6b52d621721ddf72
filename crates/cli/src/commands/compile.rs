use std::path::{Path, PathBuf};
use std::process;

use superini_core::{CompileError, Compiler, Config, ErrorKind, FileSystemProvider, Stats};
use tracing::info;

use crate::{report, OutputFormat};

pub(crate) struct CompileOptions<'a> {
    pub input: &'a Path,
    pub output: Option<&'a Path>,
    pub dump: bool,
    pub sorted: bool,
    pub format: OutputFormat,
    pub quiet: bool,
}

pub(crate) fn cmd_compile(opts: CompileOptions<'_>) {
    let mut config = Config::default();
    if opts.sorted {
        config.set_sorted(true);
    }

    let compilation = match Compiler::new(&FileSystemProvider)
        .with_config(config)
        .compile_file(opts.input)
    {
        Ok(c) => c,
        Err(e) => {
            report::compile_error(&e, opts.format, opts.quiet);
            process::exit(1);
        }
    };
    report::warnings(&compilation.warnings, opts.format, opts.quiet);

    let ini = compilation.to_ini();
    let stats = compilation.stats();

    // stdout carries the INI text when dumping, so the banner moves to stderr
    if opts.dump {
        if !opts.quiet {
            match opts.format {
                OutputFormat::Text => {
                    for line in report::stats_lines(&stats) {
                        eprintln!("{}", line);
                    }
                }
                OutputFormat::Json => eprintln!("{}", summary(&stats, None)),
            }
        }
        print!("{}", ini);
        return;
    }

    let target: Option<PathBuf> = opts
        .output
        .map(Path::to_path_buf)
        .or_else(|| compilation.config.output().map(PathBuf::from));
    let Some(target) = target else {
        let e = CompileError::new(
            ErrorKind::NoOutput,
            None,
            "no output path given and no setenv scope sets one",
        );
        report::compile_error(&e, opts.format, opts.quiet);
        process::exit(1);
    };

    if let Err(err) = std::fs::write(&target, &ini) {
        let e = CompileError::new(
            ErrorKind::NoOutput,
            None,
            format!("{}: {}", target.display(), err),
        );
        report::compile_error(&e, opts.format, opts.quiet);
        process::exit(1);
    }
    info!(output = %target.display(), bytes = ini.len(), "wrote output");

    if !opts.quiet {
        match opts.format {
            OutputFormat::Text => {
                for line in report::stats_lines(&stats) {
                    println!("{}", line);
                }
                println!("OK: written to {}", target.display());
            }
            OutputFormat::Json => println!("{}", summary(&stats, Some(&target))),
        }
    }
}

fn summary(stats: &Stats, written: Option<&Path>) -> String {
    let value = serde_json::json!({
        "stats": stats,
        "written": written.map(|p| p.display().to_string()),
    });
    serde_json::to_string_pretty(&value)
        .unwrap_or_else(|e| format!("{{\"error\": \"serialization: {}\"}}", e))
}
