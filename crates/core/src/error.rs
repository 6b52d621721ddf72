use crate::table::Trace;
use serde::Serialize;

/// Fatal error classes. Codes are stable and shared with the CLI output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Undefined,
    IllegalCharKey,
    IllegalCharScope,
    UndefinedClosure,
    ClosureArgument,
    StructInitialization,
    TypeError,
    EvalError,
    NoInput,
    NoOutput,
    IncludeCycle,
    UndefinedType,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Undefined => "E00",
            ErrorKind::IllegalCharKey => "E02",
            ErrorKind::IllegalCharScope => "E03",
            ErrorKind::UndefinedClosure => "E04",
            ErrorKind::ClosureArgument => "E05",
            ErrorKind::StructInitialization => "E06",
            ErrorKind::TypeError | ErrorKind::EvalError => "E07",
            ErrorKind::NoInput => "E08",
            ErrorKind::NoOutput => "E09",
            ErrorKind::IncludeCycle => "E10",
            ErrorKind::UndefinedType => "E11",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ErrorKind::Undefined => "undefined sequence",
            ErrorKind::IllegalCharKey => "key contains illegal character",
            ErrorKind::IllegalCharScope => "scope id contains illegal character",
            ErrorKind::UndefinedClosure => "undefined closure:",
            ErrorKind::ClosureArgument => "not a symbol:",
            ErrorKind::StructInitialization => "must classify key from abstract scope:",
            ErrorKind::TypeError => "incorrect type, expected",
            ErrorKind::EvalError => "evaluation error:",
            ErrorKind::NoInput => "missing input file",
            ErrorKind::NoOutput => "missing output file",
            ErrorKind::IncludeCycle => "include cycle detected:",
            ErrorKind::UndefinedType => "undefined type:",
        }
    }
}

/// A fatal compilation error. Aborts the whole run.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("error[{}]: {} {}", .kind.code(), .kind.message(), .detail)]
pub struct CompileError {
    pub kind: ErrorKind,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Trace>,
}

impl CompileError {
    pub fn new(kind: ErrorKind, trace: Option<&Trace>, detail: impl Into<String>) -> Self {
        CompileError {
            kind,
            detail: detail.into(),
            trace: trace.cloned(),
        }
    }

    pub fn at(kind: ErrorKind, trace: &Trace, detail: impl Into<String>) -> Self {
        CompileError::new(kind, Some(trace), detail)
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// JSON form used by `--format json` and by conformance fixtures.
    /// Always includes every field (null when absent).
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "code":    self.kind.code(),
            "detail":  self.detail,
            "file":    self.trace.as_ref().map(|t| t.path.as_str()),
            "line":    self.trace.as_ref().map(|t| t.line),
            "message": self.kind.message(),
            "scope":   self.trace.as_ref().map(|t| t.scope.as_str()),
        })
    }
}

/// Non-fatal diagnostic classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    UndefinedScopeReference,
    UndefinedKeyReference,
    MultipleAssignment,
    EmptyStruct,
    DuplicateKey,
    ScopeRedefined,
}

impl WarningKind {
    pub fn code(self) -> &'static str {
        match self {
            WarningKind::UndefinedScopeReference => "W00",
            WarningKind::UndefinedKeyReference => "W01",
            WarningKind::MultipleAssignment => "W02",
            WarningKind::EmptyStruct => "W03",
            WarningKind::DuplicateKey => "W04",
            WarningKind::ScopeRedefined => "W05",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            WarningKind::UndefinedScopeReference => "could not look up scope reference",
            WarningKind::UndefinedKeyReference => "could not look up key reference",
            WarningKind::MultipleAssignment => "multiple assignments in one statement",
            WarningKind::EmptyStruct => "empty abstract scope declaration",
            WarningKind::DuplicateKey => "key is already classified in scope",
            WarningKind::ScopeRedefined => "scope redefined, previous classification discarded",
        }
    }
}

/// A warning collected during compilation. Never aborts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Trace>,
}

impl Warning {
    pub fn new(kind: WarningKind, trace: Option<&Trace>, detail: impl Into<String>) -> Self {
        Warning {
            kind,
            detail: detail.into(),
            trace: trace.cloned(),
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "code":    self.kind.code(),
            "detail":  self.detail,
            "file":    self.trace.as_ref().map(|t| t.path.as_str()),
            "line":    self.trace.as_ref().map(|t| t.line),
            "message": self.kind.message(),
            "scope":   self.trace.as_ref().map(|t| t.scope.as_str()),
        })
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "warning[{}]: {} {}",
            self.kind.code(),
            self.kind.message(),
            self.detail
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_diagnostic_format() {
        let err = CompileError::new(ErrorKind::IllegalCharKey, None, "a,b");
        assert_eq!(
            err.to_string(),
            "error[E02]: key contains illegal character a,b"
        );
        let w = Warning::new(WarningKind::UndefinedScopeReference, None, "nope");
        assert_eq!(
            w.to_string(),
            "warning[W00]: could not look up scope reference nope"
        );
    }

    #[test]
    fn json_includes_null_trace_fields() {
        let err = CompileError::new(ErrorKind::NoOutput, None, "");
        let json = err.to_json_value();
        assert_eq!(json["code"], "E09");
        assert!(json["file"].is_null());
        assert!(json["line"].is_null());
    }

    #[test]
    fn json_carries_trace() {
        let trace = Trace::new("cfg.sini", 7, "Weapons", "damage");
        let err = CompileError::at(ErrorKind::TypeError, &trace, "i32");
        let json = err.to_json_value();
        assert_eq!(json["file"], "cfg.sini");
        assert_eq!(json["line"], 7);
        assert_eq!(json["scope"], "Weapons");
    }
}
