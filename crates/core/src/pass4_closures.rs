//! Pass 4: closure registry and dispatch.
//!
//! Closures are resolved from their header names into [`ClosureKind`] while
//! building the table, and run per scope once that scope's keys have been
//! resolved and validated. Keys a closure adds are not re-resolved.

use crate::compile::Session;
use crate::error::{CompileError, ErrorKind, WarningKind};
use crate::eval::{self, Number, Outcome};
use crate::table::{GlobalTable, Scope, Trace, Value};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClosureKind {
    /// Exclude the caller from output.
    Internal,
    /// Evaluate every value as an arithmetic expression.
    Eval,
    /// Compile each symbol as a document path and stage the result.
    Include,
    /// Copy every key into the run configuration; implies `internal`.
    Setenv,
    /// Declare the caller's symbols as the keys implementors must classify.
    Abstract,
    /// Require the caller to classify every key of the target abstract scope.
    As,
    /// `as`, then write the caller's values into the target under the
    /// caller's id; implies `internal`.
    Inline,
}

impl ClosureKind {
    pub const ALL: [ClosureKind; 7] = [
        ClosureKind::Internal,
        ClosureKind::Eval,
        ClosureKind::Include,
        ClosureKind::Setenv,
        ClosureKind::Abstract,
        ClosureKind::As,
        ClosureKind::Inline,
    ];

    pub fn from_name(name: &str) -> Option<ClosureKind> {
        ClosureKind::ALL.into_iter().find(|c| c.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            ClosureKind::Internal => "internal",
            ClosureKind::Eval => "eval",
            ClosureKind::Include => "include",
            ClosureKind::Setenv => "setenv",
            ClosureKind::Abstract => "abstract",
            ClosureKind::As => "as",
            ClosureKind::Inline => "inline",
        }
    }

    fn apply(
        self,
        table: &mut GlobalTable,
        caller: &str,
        session: &mut Session<'_>,
    ) -> Result<(), CompileError> {
        match self {
            ClosureKind::Internal => {
                caller_mut(table, caller)?.internal = true;
                Ok(())
            }
            ClosureKind::Eval => eval_values(table, caller),
            ClosureKind::Include => {
                let scope = caller_ref(table, caller)?;
                let (symbols, trace) = (scope.symbols.clone(), scope.trace.clone());
                for symbol in &symbols {
                    session.include(symbol, &trace)?;
                }
                Ok(())
            }
            ClosureKind::Setenv => {
                let scope = caller_mut(table, caller)?;
                scope.internal = true;
                for (key, value) in &scope.keys {
                    session.config_mut().set(key.clone(), value.raw.clone());
                }
                Ok(())
            }
            ClosureKind::Abstract => {
                let scope = caller_ref(table, caller)?;
                if scope.symbols.is_empty() {
                    let trace = scope.trace.clone();
                    session.warn(WarningKind::EmptyStruct, Some(&trace), caller);
                }
                Ok(())
            }
            ClosureKind::As => {
                let target = target_of(table, caller)?;
                required_values(table, caller, &target).map(|_| ())
            }
            ClosureKind::Inline => {
                let target = target_of(table, caller)?;
                let values = required_values(table, caller, &target)?;
                let scope = caller_mut(table, caller)?;
                scope.internal = true;
                let trace = scope.trace.clone();
                let joined = Value::new(values.join(" "), None, trace);
                if let Some(target_scope) = table.get_mut(&target) {
                    target_scope.keys.insert(caller.to_owned(), joined);
                }
                Ok(())
            }
        }
    }
}

/// Run the caller's closures in declaration order.
pub fn dispatch(
    table: &mut GlobalTable,
    caller: &str,
    session: &mut Session<'_>,
) -> Result<(), CompileError> {
    let closures = caller_ref(table, caller)?.closures.clone();
    for closure in closures {
        debug!(scope = caller, closure = closure.name(), "dispatch closure");
        closure.apply(table, caller, session)?;
    }
    Ok(())
}

fn caller_ref<'t>(table: &'t GlobalTable, caller: &str) -> Result<&'t Scope, CompileError> {
    table
        .get(caller)
        .ok_or_else(|| CompileError::new(ErrorKind::Undefined, None, caller))
}

fn caller_mut<'t>(table: &'t mut GlobalTable, caller: &str) -> Result<&'t mut Scope, CompileError> {
    table
        .get_mut(caller)
        .ok_or_else(|| CompileError::new(ErrorKind::Undefined, None, caller))
}

/// The single symbol of an `as`/`inline` caller, checked to name a scope.
fn target_of(table: &GlobalTable, caller: &str) -> Result<String, CompileError> {
    let scope = caller_ref(table, caller)?;
    let [target] = scope.symbols.as_slice() else {
        return Err(CompileError::at(
            ErrorKind::ClosureArgument,
            &scope.trace,
            format!("expected exactly one target scope, got {}", scope.symbols.len()),
        ));
    };
    if !table.contains(target) {
        return Err(CompileError::at(ErrorKind::UndefinedClosure, &scope.trace, target));
    }
    Ok(target.clone())
}

/// The caller's values for each symbol the target requires, in the target's
/// symbol order.
fn required_values(
    table: &GlobalTable,
    caller: &str,
    target: &str,
) -> Result<Vec<String>, CompileError> {
    let scope = caller_ref(table, caller)?;
    let required = caller_ref(table, target)?.symbols.iter();
    required
        .map(|symbol| {
            scope.get(symbol).map(str::to_owned).ok_or_else(|| {
                CompileError::at(ErrorKind::StructInitialization, &scope.trace, symbol)
            })
        })
        .collect()
}

fn eval_values(table: &mut GlobalTable, caller: &str) -> Result<(), CompileError> {
    let scope = caller_mut(table, caller)?;
    for index in 0..scope.keys.len() {
        let value = &scope.keys[index];
        let lookup = |name: &str| scope.get(name).and_then(Number::parse_literal);
        let outcome =
            eval::evaluate(&value.raw, lookup).map_err(|e| eval_error(&value.trace, e))?;
        match outcome {
            Outcome::Value(n) => scope.keys[index].raw = n.to_string(),
            Outcome::Unresolved(name) => {
                debug!(scope = caller, identifier = %name, "eval left value unresolved");
            }
        }
    }
    Ok(())
}

fn eval_error(trace: &Trace, e: eval::EvalError) -> CompileError {
    CompileError::at(ErrorKind::EvalError, trace, e.to_string())
}
