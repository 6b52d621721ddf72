//! Pass 1: line classification and symbol-table construction.
//!
//! Turns source text into a populated [`GlobalTable`]: scope headers with
//! their closure declarations, symbols, and raw key/value classifications.
//! Nothing is resolved or validated here; that happens in pass 2.

use crate::error::{CompileError, ErrorKind, Warning, WarningKind};
use crate::pass4_closures::ClosureKind;
use crate::table::{GlobalTable, Scope, Trace, Value, GLOBAL_SCOPE};
use tracing::{debug, trace};

pub const COMMENT: char = ';';
pub const INDENT: char = '\t';
pub const SPACE: char = ' ';
pub const OPEN_SCOPE_DEF: char = '[';
pub const CLOSE_SCOPE_DEF: char = ']';
pub const VALUE_SEPARATOR: char = '=';
pub const CLOSURE_OPERATOR: &str = "::";
pub const CLOSURE_DELIMITER: char = ',';
pub const SYMBOL_DEFINITION: char = ':';
pub const SCOPE_RESOLUTION_OPERATOR: &str = "::";
pub const ILLEGAL_NAME_CHARS: &[char] = &['=', ',', ':', '\\'];

/// True when `name` is usable as a scope id or key id.
pub fn is_legal_name(name: &str) -> bool {
    !name.contains(ILLEGAL_NAME_CHARS)
}

/// Build the symbol table for one document. Any failure is fatal.
pub fn build(
    src: &str,
    path: &str,
    warnings: &mut Vec<Warning>,
) -> Result<GlobalTable, CompileError> {
    let mut builder = Builder {
        table: GlobalTable::new(path),
        trace: Trace::new(path, 0, GLOBAL_SCOPE, ""),
        last_key: None,
        warnings,
    };

    for (i, raw) in src.lines().enumerate() {
        let line = strip_comment(raw);
        if line.trim().is_empty() {
            continue;
        }
        builder.trace.line = i as u32 + 1;
        builder.classify(line)?;
    }

    debug!(path, scopes = builder.table.len(), "pass 1 built symbol table");
    Ok(builder.table)
}

fn strip_comment(line: &str) -> &str {
    match line.find(COMMENT) {
        Some(pos) => &line[..pos],
        None => line,
    }
}

struct Builder<'w> {
    table: GlobalTable,
    /// Running trace; cloned into every stored entity.
    trace: Trace,
    /// Last key classified in the current scope, target of continuation lines.
    last_key: Option<String>,
    warnings: &'w mut Vec<Warning>,
}

impl Builder<'_> {
    fn classify(&mut self, line: &str) -> Result<(), CompileError> {
        let trimmed = line.trim();

        if trimmed.starts_with(OPEN_SCOPE_DEF) {
            return self.scope_header(line);
        }

        if !line.contains(VALUE_SEPARATOR) {
            if trimmed.starts_with(SYMBOL_DEFINITION) && self.current()?.keys.is_empty() {
                return self.symbol_line(trimmed);
            }
            if line.starts_with(INDENT) || line.starts_with(SPACE) {
                return self.continuation(trimmed);
            }
            return Err(CompileError::at(ErrorKind::Undefined, &self.trace, trimmed));
        }

        let key = self.pair(line)?;
        self.last_key = Some(key);
        Ok(())
    }

    fn current(&mut self) -> Result<&mut Scope, CompileError> {
        let trace = &self.trace;
        self.table.get_mut(&trace.scope).ok_or_else(|| {
            CompileError::at(ErrorKind::Undefined, trace, format!("scope {}", trace.scope))
        })
    }

    /// `[id] :: closure :sym, closure :sym`
    fn scope_header(&mut self, line: &str) -> Result<(), CompileError> {
        let parts: Vec<&str> = line.split(CLOSURE_OPERATOR).collect();
        if parts.len() > 2 {
            return Err(CompileError::at(
                ErrorKind::Undefined,
                &self.trace,
                parts[1..].join(CLOSURE_OPERATOR),
            ));
        }

        let id: String = parts[0]
            .trim()
            .chars()
            .filter(|c| *c != OPEN_SCOPE_DEF && *c != CLOSE_SCOPE_DEF)
            .collect();
        let id = id.trim().to_owned();

        self.trace.scope = id.clone();
        self.trace.key.clear();
        self.last_key = None;

        if !is_legal_name(&id) {
            return Err(CompileError::at(ErrorKind::IllegalCharScope, &self.trace, id));
        }

        let replaced = self.table.insert(Scope::new(&id, self.trace.clone()));
        if let Some(prev) = replaced {
            if !prev.keys.is_empty() || !prev.symbols.is_empty() || !prev.closures.is_empty() {
                self.warn(WarningKind::ScopeRedefined, id.clone());
            }
        }
        trace!(scope = %id, line = self.trace.line, "scope header");

        if let Some(decls) = parts.get(1) {
            for decl in decls.split(CLOSURE_DELIMITER) {
                self.closure_decl(decl)?;
            }
        }
        Ok(())
    }

    /// `name :sym :sym`
    fn closure_decl(&mut self, decl: &str) -> Result<(), CompileError> {
        let mut tokens = decl.split_whitespace();
        let name = tokens.next().unwrap_or_default();
        let kind = ClosureKind::from_name(name)
            .ok_or_else(|| CompileError::at(ErrorKind::UndefinedClosure, &self.trace, name))?;

        let mut symbols = Vec::new();
        for tok in tokens {
            match tok.strip_prefix(SYMBOL_DEFINITION) {
                Some(sym) if !sym.is_empty() => symbols.push(sym.to_owned()),
                _ => {
                    return Err(CompileError::at(
                        ErrorKind::ClosureArgument,
                        &self.trace,
                        tok,
                    ))
                }
            }
        }

        let scope = self.current()?;
        scope.closures.push(kind);
        scope.symbols.extend(symbols);
        Ok(())
    }

    /// `:sym :sym` on its own line, before the scope's first key.
    fn symbol_line(&mut self, trimmed: &str) -> Result<(), CompileError> {
        let symbols: Vec<String> = trimmed
            .split(SYMBOL_DEFINITION)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect();
        self.current()?.symbols.extend(symbols);
        Ok(())
    }

    /// Indented line extending the previous key's value.
    fn continuation(&mut self, trimmed: &str) -> Result<(), CompileError> {
        let Some(key) = self.last_key.clone() else {
            return Err(CompileError::at(ErrorKind::Undefined, &self.trace, trimmed));
        };
        let trace = self.trace.clone();
        let value = self
            .current()?
            .keys
            .get_mut(&key)
            .ok_or_else(|| CompileError::at(ErrorKind::Undefined, &trace, trimmed))?;
        value.raw.push(SPACE);
        value.raw.push_str(trimmed);
        Ok(())
    }

    /// `key = value`, `key: type = value`. Returns the key id.
    fn pair(&mut self, line: &str) -> Result<String, CompileError> {
        let segments: Vec<&str> = line.split(VALUE_SEPARATOR).collect();
        if segments.len() > 2 {
            self.warn(WarningKind::MultipleAssignment, line.trim().to_owned());
        }

        let key_part = segments[0].trim();
        let value = if segments.len() < 2 {
            ""
        } else {
            segments[segments.len() - 1].trim()
        };

        let (key, declared) = match key_part.split_once(SYMBOL_DEFINITION) {
            None => (key_part, None),
            Some((_, ty)) if ty.contains(SYMBOL_DEFINITION) => {
                return Err(CompileError::at(ErrorKind::IllegalCharKey, &self.trace, key_part));
            }
            Some((key, ty)) => (key.trim(), Some(ty.trim().to_owned())),
        };

        if !is_legal_name(key) {
            return Err(CompileError::at(ErrorKind::IllegalCharKey, &self.trace, key));
        }

        self.trace.key = key.to_owned();
        let stored = Value::new(value, declared, self.trace.clone());
        if self.current()?.keys.insert(key.to_owned(), stored).is_some() {
            self.warn(WarningKind::DuplicateKey, key.to_owned());
        }
        Ok(key.to_owned())
    }

    fn warn(&mut self, kind: WarningKind, detail: String) {
        debug!(code = kind.code(), %detail, "warning");
        self.warnings
            .push(Warning::new(kind, Some(&self.trace), detail));
    }
}
