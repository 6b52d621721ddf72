use std::path::Path;
use std::process;

use superini_core::compile_file;

use crate::{report, OutputFormat};

/// Run the full pipeline and report warnings, stats and the final
/// configuration. Nothing is written.
pub(crate) fn cmd_check(input: &Path, format: OutputFormat, quiet: bool) {
    let compilation = match compile_file(input) {
        Ok(c) => c,
        Err(e) => {
            report::compile_error(&e, format, quiet);
            process::exit(1);
        }
    };

    if quiet {
        return;
    }

    let stats = compilation.stats();
    match format {
        OutputFormat::Json => {
            let warnings: Vec<serde_json::Value> = compilation
                .warnings
                .iter()
                .map(|w| w.to_json_value())
                .collect();
            let json = serde_json::json!({
                "config": compilation.config,
                "scopes": compilation.table.scope_ids(),
                "stats": stats,
                "warnings": warnings,
            });
            let pretty = serde_json::to_string_pretty(&json)
                .unwrap_or_else(|e| format!("{{\"error\": \"serialization: {}\"}}", e));
            println!("{}", pretty);
        }
        OutputFormat::Text => {
            report::warnings(&compilation.warnings, format, quiet);
            for line in report::stats_lines(&stats) {
                println!("{}", line);
            }
            for (key, value) in compilation.config.iter() {
                println!("  {} = {}", key, value);
            }
            println!("OK: {} warning(s)", compilation.warnings.len());
        }
    }
}
