//! Diagnostic rendering for the terminal.
//!
//! Text mode prints the diagnostic line followed by its trace line. JSON mode
//! prints one object per diagnostic, in the same shape as the conformance
//! fixtures. Everything goes to stderr.

use superini_core::{CompileError, Stats, Warning};

use crate::OutputFormat;

/// Report a fatal compilation error. JSON errors are printed even in quiet
/// mode so tooling always gets a result.
pub(crate) fn compile_error(e: &CompileError, format: OutputFormat, quiet: bool) {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&e.to_json_value())
                .unwrap_or_else(|_| format!("{{\"error\": \"{}\"}}", escape(&e.to_string())));
            eprintln!("{}", json);
        }
        OutputFormat::Text => {
            if !quiet {
                eprintln!("{}", e);
                if let Some(trace) = &e.trace {
                    eprintln!("{}", trace);
                }
            }
        }
    }
}

pub(crate) fn warnings(warnings: &[Warning], format: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    for w in warnings {
        match format {
            OutputFormat::Json => eprintln!("{}", w.to_json_value()),
            OutputFormat::Text => {
                eprintln!("{}", w);
                if let Some(trace) = &w.trace {
                    eprintln!("{}", trace);
                }
            }
        }
    }
}

/// Banner lines describing the parsed and compiled table.
pub(crate) fn stats_lines(stats: &Stats) -> [String; 2] {
    [
        format!(
            "OK: parsed {} objects ({} internal), {} keys",
            stats.objects, stats.internal_objects, stats.keys
        ),
        format!(
            "OK: compiled {} objects, {} keys",
            stats.public_objects(),
            stats.public_keys()
        ),
    ]
}

/// Report a failure that did not come from the compiler.
pub(crate) fn report_error(msg: &str, format: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match format {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => eprintln!("{{\"error\": \"{}\"}}", escape(msg)),
    }
}

fn escape(msg: &str) -> String {
    msg.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_banner() {
        let stats = Stats {
            objects: 4,
            internal_objects: 1,
            keys: 7,
            internal_keys: 2,
        };
        let [parsed, compiled] = stats_lines(&stats);
        assert_eq!(parsed, "OK: parsed 4 objects (1 internal), 7 keys");
        assert_eq!(compiled, "OK: compiled 3 objects, 5 keys");
    }

    #[test]
    fn escape_quotes_and_backslashes() {
        assert_eq!(escape(r#"a "b" \c"#), r#"a \"b\" \\c"#);
    }
}
