//! Compilation driver: super-ini source -> INI text.
//!
//! This is a thin orchestrator over the passes. Pass 1 builds the table for
//! the whole document; then, scope by scope in table order, every key is
//! reference-resolved (pass 2) and type-checked (pass 3) before the scope's
//! closures run (pass 4). Documents pulled in by `include` go through the same
//! pipeline and are merged into the primary table once it is finished.
//! Pass 5 projects the merged table to INI.

use crate::config::Config;
use crate::error::{CompileError, ErrorKind, Warning, WarningKind};
use crate::pass1_build;
use crate::pass2_resolve;
use crate::pass3_types;
use crate::pass4_closures;
use crate::pass5_serialize::{self, Stats};
use crate::source::{FileSystemProvider, SourceProvider};
use crate::table::{GlobalTable, Trace, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, debug_span};

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct Compilation {
    pub table: GlobalTable,
    pub config: Config,
    pub warnings: Vec<Warning>,
}

impl Compilation {
    pub fn to_ini(&self) -> String {
        pass5_serialize::serialize(&self.table, &self.config)
    }

    pub fn stats(&self) -> Stats {
        Stats::of(&self.table)
    }
}

/// Compile `src` (read from `path`) with a default configuration. Includes
/// are read from the filesystem relative to `path`.
pub fn compile_str(src: &str, path: &str) -> Result<Compilation, CompileError> {
    Compiler::new(&FileSystemProvider).compile_str(src, path)
}

/// Read and compile the document at `path` with a default configuration.
pub fn compile_file(path: &Path) -> Result<Compilation, CompileError> {
    Compiler::new(&FileSystemProvider).compile_file(path)
}

/// Configurable entry point: choose the source provider and seed the run
/// configuration.
pub struct Compiler<'p> {
    provider: &'p dyn SourceProvider,
    config: Config,
}

impl<'p> Compiler<'p> {
    pub fn new(provider: &'p dyn SourceProvider) -> Self {
        Compiler {
            provider,
            config: Config::default(),
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn compile_file(self, path: &Path) -> Result<Compilation, CompileError> {
        let src = self.provider.read_source(path).map_err(|e| {
            CompileError::new(ErrorKind::NoInput, None, format!("{}: {}", path.display(), e))
        })?;
        self.compile_str(&src, &path.to_string_lossy())
    }

    pub fn compile_str(self, src: &str, path: &str) -> Result<Compilation, CompileError> {
        let mut session = Session {
            provider: self.provider,
            config: self.config,
            warnings: Vec::new(),
            include_stack: Vec::new(),
            staged: Vec::new(),
        };
        if let Ok(canon) = self.provider.canonicalize(Path::new(path)) {
            session.include_stack.push(canon);
        }

        let mut table = session.compile_document(src, path)?;
        for included in session.staged.drain(..) {
            table.merge(included);
        }

        debug!(
            path,
            scopes = table.len(),
            warnings = session.warnings.len(),
            "compilation finished"
        );
        Ok(Compilation {
            table,
            config: session.config,
            warnings: session.warnings,
        })
    }
}

/// Mutable state of one run, shared by the primary document and everything
/// it includes.
pub struct Session<'p> {
    provider: &'p dyn SourceProvider,
    config: Config,
    warnings: Vec<Warning>,
    /// Canonical paths of the documents currently being compiled.
    include_stack: Vec<PathBuf>,
    /// Included tables awaiting merge, in completion order.
    staged: Vec<GlobalTable>,
}

impl Session<'_> {
    pub(crate) fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub(crate) fn warn(&mut self, kind: WarningKind, trace: Option<&Trace>, detail: &str) {
        debug!(code = kind.code(), detail, "warning");
        self.warnings.push(Warning::new(kind, trace, detail));
    }

    /// Compile the document named by `symbol` and stage its table.
    pub(crate) fn include(&mut self, symbol: &str, trace: &Trace) -> Result<(), CompileError> {
        let base = Path::new(&trace.path)
            .parent()
            .unwrap_or(Path::new("."))
            .to_owned();
        let resolved = self.provider.resolve_include(&base, symbol);
        let unreadable = |e: std::io::Error| {
            CompileError::at(ErrorKind::NoInput, trace, format!("{}: {}", symbol, e))
        };

        let canon = self.provider.canonicalize(&resolved).map_err(unreadable)?;
        if self.include_stack.contains(&canon) {
            let mut chain: Vec<String> = self.include_stack.iter().map(|p| file_name(p)).collect();
            chain.push(file_name(&canon));
            return Err(CompileError::at(
                ErrorKind::IncludeCycle,
                trace,
                chain.join(" \u{2192} "),
            ));
        }
        let src = self.provider.read_source(&resolved).map_err(unreadable)?;

        debug!(include = %resolved.display(), depth = self.include_stack.len(), "include");
        self.include_stack.push(canon);
        let result = self.compile_document(&src, &resolved.to_string_lossy());
        self.include_stack.pop();

        self.staged.push(result?);
        Ok(())
    }

    fn compile_document(&mut self, src: &str, path: &str) -> Result<GlobalTable, CompileError> {
        let span = debug_span!("document", path);
        let _enter = span.enter();

        let mut table = pass1_build::build(src, path, &mut self.warnings)?;
        self.second_pass(&mut table)?;
        Ok(table)
    }

    /// Resolve and validate each scope's keys, then run its closures.
    fn second_pass(&mut self, table: &mut GlobalTable) -> Result<(), CompileError> {
        for index in 0..table.len() {
            let Some(id) = table.scope_at(index).map(|s| s.id.clone()) else {
                break;
            };

            let mut key = 0;
            while let Some(value) = value_at(table, index, key) {
                if pass2_resolve::has_reference(&value.raw) {
                    let resolved = pass2_resolve::resolve_value(
                        table,
                        &value.raw,
                        &value.trace,
                        &mut self.warnings,
                    );
                    if let Some((_, v)) = table
                        .scope_at_mut(index)
                        .and_then(|s| s.keys.get_index_mut(key))
                    {
                        v.raw = resolved;
                    }
                }
                if let Some(value) = value_at(table, index, key) {
                    pass3_types::validate(value)?;
                }
                key += 1;
            }

            debug!(scope = %id, keys = key, "scope resolved");
            pass4_closures::dispatch(table, &id, self)?;
        }
        Ok(())
    }
}

fn value_at(table: &GlobalTable, scope: usize, key: usize) -> Option<&Value> {
    table
        .scope_at(scope)
        .and_then(|s| s.keys.get_index(key))
        .map(|(_, v)| v)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}
