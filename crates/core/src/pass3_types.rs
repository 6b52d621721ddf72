//! Pass 3: declared-type validation.
//!
//! Types are scalar predicates over the already-resolved value text. A value
//! either satisfies its declared type or compilation fails.

use crate::error::{CompileError, ErrorKind};
use crate::table::Value;

const LEGAL_INT: &str = "+-0123456789abcdefxo";
const LEGAL_FLOAT: &str = "+-.0123456789e";
const LEGAL_BOOL: [&str; 2] = ["true", "false"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredType {
    Str,
    Bool,
    Int,
    Float,
    I8,
    U8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl DeclaredType {
    pub const ALL: [DeclaredType; 11] = [
        DeclaredType::Str,
        DeclaredType::Bool,
        DeclaredType::Int,
        DeclaredType::Float,
        DeclaredType::I8,
        DeclaredType::U8,
        DeclaredType::I16,
        DeclaredType::I32,
        DeclaredType::I64,
        DeclaredType::F32,
        DeclaredType::F64,
    ];

    pub fn from_name(name: &str) -> Option<DeclaredType> {
        DeclaredType::ALL.into_iter().find(|t| t.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            DeclaredType::Str => "str",
            DeclaredType::Bool => "bool",
            DeclaredType::Int => "int",
            DeclaredType::Float => "float",
            DeclaredType::I8 => "i8",
            DeclaredType::U8 => "u8",
            DeclaredType::I16 => "i16",
            DeclaredType::I32 => "i32",
            DeclaredType::I64 => "i64",
            DeclaredType::F32 => "f32",
            DeclaredType::F64 => "f64",
        }
    }

    pub fn accepts(self, value: &str) -> bool {
        match self {
            DeclaredType::Str => true,
            DeclaredType::Bool => LEGAL_BOOL.contains(&value.to_lowercase().as_str()),
            DeclaredType::Int => is_int_text(value),
            DeclaredType::Float | DeclaredType::F32 | DeclaredType::F64 => is_float_text(value),
            DeclaredType::I8 => fits_signed(value, 7),
            DeclaredType::I16 => fits_signed(value, 15),
            DeclaredType::I32 => fits_signed(value, 31),
            DeclaredType::I64 => fits_signed(value, 63),
            DeclaredType::U8 => parse_int(value).is_some_and(|v| v >= 0 && bit_length(v) <= 8),
        }
    }
}

/// Check `value.raw` against its declared type, if any.
pub fn validate(value: &Value) -> Result<(), CompileError> {
    let Some(name) = value.declared.as_deref() else {
        return Ok(());
    };
    let ty = DeclaredType::from_name(name)
        .ok_or_else(|| CompileError::at(ErrorKind::UndefinedType, &value.trace, name))?;
    if ty.accepts(&value.raw) {
        Ok(())
    } else {
        Err(CompileError::at(ErrorKind::TypeError, &value.trace, name))
    }
}

fn is_int_text(value: &str) -> bool {
    !value.is_empty() && value.to_lowercase().chars().all(|c| LEGAL_INT.contains(c))
}

fn is_float_text(value: &str) -> bool {
    !value.is_empty() && value.to_lowercase().chars().all(|c| LEGAL_FLOAT.contains(c))
}

/// Parse with `0x`/`0o`/`0b` prefixes selecting the radix, base 10 otherwise.
fn parse_int(value: &str) -> Option<i128> {
    if !is_int_text(value) {
        return None;
    }
    let (digits, radix) = if let Some(d) = value.strip_prefix("0x") {
        (d, 16)
    } else if let Some(d) = value.strip_prefix("0o") {
        (d, 8)
    } else if let Some(d) = value.strip_prefix("0b") {
        (d, 2)
    } else {
        (value, 10)
    };
    if radix != 10 && digits.starts_with(['+', '-']) {
        return None;
    }
    i128::from_str_radix(digits, radix).ok()
}

/// Bits needed for the magnitude of `v`.
fn bit_length(v: i128) -> u32 {
    128 - v.unsigned_abs().leading_zeros()
}

fn fits_signed(value: &str, bits: u32) -> bool {
    parse_int(value).is_some_and(|v| bit_length(v) <= bits)
}
