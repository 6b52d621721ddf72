//! Pass 2: cross-scope reference resolution.
//!
//! A reference is a whitespace-delimited `scope::key` token inside a value.
//! Resolution reads whatever the referenced key holds at that moment; there
//! is no dependency ordering, so a reference to a key that is resolved later
//! in table order sees its unresolved text.

use crate::error::{Warning, WarningKind};
use crate::pass1_build::SCOPE_RESOLUTION_OPERATOR;
use crate::table::{GlobalTable, Trace};
use tracing::trace;

/// True when `raw` may contain a reference and needs resolving.
pub fn has_reference(raw: &str) -> bool {
    raw.contains(SCOPE_RESOLUTION_OPERATOR)
}

/// Rewrite every resolvable reference in `raw`. Unresolvable tokens are
/// kept verbatim and reported as warnings.
pub fn resolve_value(
    table: &GlobalTable,
    raw: &str,
    trace: &Trace,
    warnings: &mut Vec<Warning>,
) -> String {
    let mut out: Vec<&str> = Vec::new();

    for token in raw.split_whitespace() {
        let Some((scope_id, key)) = token.split_once(SCOPE_RESOLUTION_OPERATOR) else {
            out.push(token);
            continue;
        };

        let Some(scope) = table.get(scope_id) else {
            warnings.push(Warning::new(
                WarningKind::UndefinedScopeReference,
                Some(trace),
                scope_id,
            ));
            out.push(token);
            continue;
        };

        match scope.get(key) {
            Some(value) => {
                trace!(reference = token, %value, "resolved reference");
                out.push(value);
            }
            None => {
                warnings.push(Warning::new(
                    WarningKind::UndefinedKeyReference,
                    Some(trace),
                    key,
                ));
                out.push(token);
            }
        }
    }

    out.join(" ").trim().to_owned()
}
