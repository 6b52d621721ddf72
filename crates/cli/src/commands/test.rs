use std::path::Path;
use std::process;

use crate::{report, OutputFormat};

pub(crate) fn cmd_test(suite_dir: &Path, format: OutputFormat, quiet: bool) {
    if !suite_dir.exists() {
        let msg = format!(
            "error: conformance suite directory not found: {}",
            suite_dir.display()
        );
        report::report_error(&msg, format, quiet);
        process::exit(1);
    }

    // TAP is the primary output; quiet only silences the error path above
    let result = crate::runner::run_suite(suite_dir);
    if result.failed > 0 {
        process::exit(1);
    }
}
