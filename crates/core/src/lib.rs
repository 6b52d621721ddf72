//! superini-core: the super-ini compiler library.
//!
//! Compiles the super-ini configuration dialect (scopes with closures,
//! cross-scope references, typed keys) into plain INI text.
//!
//! # Public API
//!
//! - [`compile_str()`] / [`compile_file()`] -- run the whole pipeline with
//!   the filesystem provider and a default [`Config`]
//! - [`Compiler`] -- choose the [`SourceProvider`] and seed the [`Config`]
//! - [`Compilation`] -- the final [`GlobalTable`], configuration and warnings
//! - [`CompileError`] / [`Warning`] -- fatal and non-fatal diagnostics
//!
//! Individual pass entry points are re-exported for selective use.

pub mod compile;
pub mod config;
pub mod error;
pub mod eval;
pub mod pass1_build;
pub mod pass2_resolve;
pub mod pass3_types;
pub mod pass4_closures;
pub mod pass5_serialize;
pub mod source;
pub mod table;

// ── Convenience re-exports: key types ────────────────────────────────

pub use compile::{Compilation, Compiler};
pub use config::Config;
pub use error::{CompileError, ErrorKind, Warning, WarningKind};
pub use pass3_types::DeclaredType;
pub use pass4_closures::ClosureKind;
pub use pass5_serialize::Stats;
pub use source::{FileSystemProvider, InMemoryProvider, SourceProvider};
pub use table::{GlobalTable, Scope, Trace, Value, GLOBAL_SCOPE};

// ── Convenience re-exports: pipeline entry points ────────────────────

pub use compile::{compile_file, compile_str};
pub use pass1_build::build;
pub use pass2_resolve::resolve_value;
pub use pass3_types::validate;
pub use pass5_serialize::serialize;
