//! Symbol-table types shared by every compilation pass.
//!
//! The global table owns every scope; every scope owns its values. Passes
//! borrow the table mutably one at a time, nothing keeps a long-lived
//! reference into it.

use crate::pass4_closures::ClosureKind;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Id of the implicit scope that receives pairs written before any header.
pub const GLOBAL_SCOPE: &str = "__global__";

// ──────────────────────────────────────────────
// Trace
// ──────────────────────────────────────────────

/// Source location of a parsed entity, used only for diagnostics.
///
/// Traces are cloned whenever a new entity is stored so that the parser can
/// keep mutating its running trace without touching stored ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trace {
    pub path: String,
    pub line: u32,
    pub scope: String,
    pub key: String,
}

impl Trace {
    pub fn new(path: &str, line: u32, scope: &str, key: &str) -> Self {
        Trace {
            path: path.to_owned(),
            line,
            scope: scope.to_owned(),
            key: key.to_owned(),
        }
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  --> {}:{} [{}]", self.path, self.line, self.scope)
    }
}

// ──────────────────────────────────────────────
// Value
// ──────────────────────────────────────────────

/// A classified value: the raw payload plus an optional declared type name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Value {
    pub raw: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared: Option<String>,
    pub trace: Trace,
}

impl Value {
    pub fn new(raw: impl Into<String>, declared: Option<String>, trace: Trace) -> Self {
        Value {
            raw: raw.into(),
            declared: declared.filter(|t| !t.is_empty()),
            trace,
        }
    }
}

// ──────────────────────────────────────────────
// Scope
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Scope {
    pub id: String,
    pub keys: IndexMap<String, Value>,
    pub symbols: Vec<String>,
    pub closures: Vec<ClosureKind>,
    pub internal: bool,
    pub trace: Trace,
}

impl Scope {
    pub fn new(id: &str, trace: Trace) -> Self {
        Scope {
            id: id.to_owned(),
            keys: IndexMap::new(),
            symbols: Vec::new(),
            closures: Vec::new(),
            internal: false,
            trace,
        }
    }

    /// Raw value of `key`, if classified in this scope.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.keys.get(key).map(|v| v.raw.as_str())
    }
}

// ──────────────────────────────────────────────
// Global table
// ──────────────────────────────────────────────

/// Insertion-ordered map of scope id to scope, always holding [`GLOBAL_SCOPE`].
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct GlobalTable {
    scopes: IndexMap<String, Scope>,
}

impl GlobalTable {
    pub fn new(path: &str) -> Self {
        let mut scopes = IndexMap::new();
        scopes.insert(
            GLOBAL_SCOPE.to_owned(),
            Scope::new(GLOBAL_SCOPE, Trace::new(path, 0, GLOBAL_SCOPE, "")),
        );
        GlobalTable { scopes }
    }

    pub fn get(&self, id: &str) -> Option<&Scope> {
        self.scopes.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Scope> {
        self.scopes.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.scopes.contains_key(id)
    }

    /// Insert `scope`, replacing any scope with the same id in place.
    /// Returns the replaced scope.
    pub fn insert(&mut self, scope: Scope) -> Option<Scope> {
        self.scopes.insert(scope.id.clone(), scope)
    }

    /// Raw value of `scope::key`.
    pub fn lookup(&self, scope: &str, key: &str) -> Option<&str> {
        self.scopes.get(scope).and_then(|s| s.get(key))
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn scope_ids(&self) -> Vec<String> {
        self.scopes.keys().cloned().collect()
    }

    pub fn scopes(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.values()
    }

    pub(crate) fn scope_at(&self, index: usize) -> Option<&Scope> {
        self.scopes.get_index(index).map(|(_, s)| s)
    }

    pub(crate) fn scope_at_mut(&mut self, index: usize) -> Option<&mut Scope> {
        self.scopes.get_index_mut(index).map(|(_, s)| s)
    }

    /// Merge a table produced by an included document. Scopes replace
    /// same-id scopes in place; new ids are appended. An included global
    /// scope without keys is skipped.
    pub fn merge(&mut self, other: GlobalTable) {
        for (id, scope) in other.scopes {
            if id == GLOBAL_SCOPE && scope.keys.is_empty() {
                continue;
            }
            self.scopes.insert(id, scope);
        }
    }
}
