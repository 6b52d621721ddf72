//! Sandboxed arithmetic evaluator backing the `eval` closure.
//!
//! Expressions are parsed in full before evaluation, so a syntax error is
//! always reported even when the expression also names an unknown
//! identifier. Unknown identifiers are not errors: evaluation stops with
//! [`Outcome::Unresolved`] and the caller keeps the original text.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    /// Parse `text` as a single, optionally signed, numeric literal.
    pub fn parse_literal(text: &str) -> Option<Number> {
        let tokens = lex(text.trim()).ok()?;
        match tokens.as_slice() {
            [Token::Num(n)] | [Token::Plus, Token::Num(n)] => Some(*n),
            [Token::Minus, Token::Num(n)] => negate(*n).ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{}", i),
            Number::Float(x) => f.write_str(&format_float(*x)),
        }
    }
}

/// Shortest round-trip text, `.0` on integral values, `e+NN` exponents.
fn format_float(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_owned();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_owned();
    }
    let repr = format!("{:?}", x);
    match repr.split_once('e') {
        None => repr,
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(d) => ('-', d),
                None => ('+', exp),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Value(Number),
    /// The expression named an identifier with no numeric binding.
    Unresolved(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("invalid number literal '{0}'")]
    InvalidNumber(String),
    #[error("unexpected token {0}")]
    UnexpectedToken(String),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow")]
    Overflow,
    #[error("result is not a real number")]
    Domain,
    #[error("expression nested too deeply")]
    TooDeep,
}

/// Evaluate `src`, resolving identifiers through `lookup`.
pub fn evaluate<F>(src: &str, lookup: F) -> Result<Outcome, EvalError>
where
    F: Fn(&str) -> Option<Number>,
{
    let tokens = lex(src)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        nodes: 0,
    };
    let expr = parser.expr()?;
    if let Some(tok) = parser.peek() {
        return Err(EvalError::UnexpectedToken(tok.to_string()));
    }
    match eval(&expr, &lookup) {
        Ok(n) => Ok(Outcome::Value(n)),
        Err(Halt::Unresolved(name)) => Ok(Outcome::Unresolved(name)),
        Err(Halt::Failed(e)) => Err(e),
    }
}

// ──────────────────────────────────────────────
// Lexer
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(Number),
    Ident(String),
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    SlashSlash,
    Percent,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Num(n) => write!(f, "{}", n),
            Token::Ident(s) => write!(f, "'{}'", s),
            Token::Plus => f.write_str("'+'"),
            Token::Minus => f.write_str("'-'"),
            Token::Star => f.write_str("'*'"),
            Token::StarStar => f.write_str("'**'"),
            Token::Slash => f.write_str("'/'"),
            Token::SlashSlash => f.write_str("'//'"),
            Token::Percent => f.write_str("'%'"),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
        }
    }
}

fn lex(src: &str) -> Result<Vec<Token>, EvalError> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0usize;

    while pos < chars.len() {
        let c = chars[pos];
        if c.is_whitespace() {
            pos += 1;
            continue;
        }

        let starts_number = c.is_ascii_digit()
            || (c == '.' && chars.get(pos + 1).is_some_and(|d| d.is_ascii_digit()));
        if starts_number {
            let start = pos;
            while pos < chars.len() && (chars[pos].is_ascii_alphanumeric() || chars[pos] == '.') {
                // exponent sign: 1e-3, 2E+8
                if matches!(chars[pos], 'e' | 'E')
                    && matches!(chars.get(pos + 1), Some('+') | Some('-'))
                    && !is_radix_literal(&chars[start..pos])
                {
                    pos += 1;
                }
                pos += 1;
            }
            let text: String = chars[start..pos].iter().collect();
            tokens.push(Token::Num(parse_number(&text)?));
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let start = pos;
            while pos < chars.len() && (chars[pos].is_alphanumeric() || chars[pos] == '_') {
                pos += 1;
            }
            tokens.push(Token::Ident(chars[start..pos].iter().collect()));
            continue;
        }

        let next = chars.get(pos + 1).copied();
        let (tok, width) = match (c, next) {
            ('*', Some('*')) => (Token::StarStar, 2),
            ('/', Some('/')) => (Token::SlashSlash, 2),
            ('*', _) => (Token::Star, 1),
            ('/', _) => (Token::Slash, 1),
            ('+', _) => (Token::Plus, 1),
            ('-', _) => (Token::Minus, 1),
            ('%', _) => (Token::Percent, 1),
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            _ => return Err(EvalError::UnexpectedChar(c)),
        };
        tokens.push(tok);
        pos += width;
    }
    Ok(tokens)
}

fn is_radix_literal(prefix: &[char]) -> bool {
    matches!(prefix, ['0', r, ..] if matches!(r, 'x' | 'X' | 'o' | 'O' | 'b' | 'B'))
}

fn parse_number(text: &str) -> Result<Number, EvalError> {
    let invalid = || EvalError::InvalidNumber(text.to_owned());
    let lower = text.to_ascii_lowercase();

    for (prefix, radix) in [("0x", 16), ("0o", 8), ("0b", 2)] {
        if let Some(digits) = lower.strip_prefix(prefix) {
            if digits.is_empty() || digits.starts_with(['+', '-']) {
                return Err(invalid());
            }
            return match i128::from_str_radix(digits, radix) {
                Ok(v) => i64::try_from(v).map(Number::Int).map_err(|_| EvalError::Overflow),
                Err(_) => Err(invalid()),
            };
        }
    }

    if !lower.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | '+' | '-')) {
        return Err(invalid());
    }
    if lower.contains(['.', 'e']) {
        return lower.parse::<f64>().map(Number::Float).map_err(|_| invalid());
    }
    match lower.parse::<i128>() {
        Ok(v) => i64::try_from(v).map(Number::Int).map_err(|_| EvalError::Overflow),
        Err(_) => Err(EvalError::Overflow),
    }
}

// ──────────────────────────────────────────────
// Parser
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

#[derive(Debug, Clone)]
enum Expr {
    Num(Number),
    Ident(String),
    Neg(Box<Expr>),
    Pos(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
}

/// Nesting limit for parentheses, unary signs and `**` chains.
const MAX_DEPTH: usize = 200;
/// Operator limit per expression; bounds the depth of the evaluated tree.
const MAX_NODES: usize = 1_000;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    nodes: usize,
}

impl Parser {
    fn descend(&mut self) -> Result<(), EvalError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(EvalError::TooDeep);
        }
        Ok(())
    }

    fn node(&mut self, expr: Expr) -> Result<Expr, EvalError> {
        self.nodes += 1;
        if self.nodes > MAX_NODES {
            return Err(EvalError::TooDeep);
        }
        Ok(expr)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn expr(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.term()?;
            left = self.node(Expr::Binary(op, Box::new(left), Box::new(right)))?;
        }
    }

    fn term(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.factor()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                Some(Token::SlashSlash) => BinOp::FloorDiv,
                Some(Token::Percent) => BinOp::Mod,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.factor()?;
            left = self.node(Expr::Binary(op, Box::new(left), Box::new(right)))?;
        }
    }

    /// Unary signs bind looser than `**`: `-2 ** 2` is `-(2 ** 2)`.
    fn factor(&mut self) -> Result<Expr, EvalError> {
        let wrap: fn(Box<Expr>) -> Expr = match self.peek() {
            Some(Token::Minus) => Expr::Neg,
            Some(Token::Plus) => Expr::Pos,
            _ => return self.power(),
        };
        self.pos += 1;
        self.descend()?;
        let inner = self.factor()?;
        self.depth -= 1;
        self.node(wrap(Box::new(inner)))
    }

    fn power(&mut self) -> Result<Expr, EvalError> {
        let base = self.primary()?;
        if self.peek() == Some(&Token::StarStar) {
            self.pos += 1;
            self.descend()?;
            let exp = self.factor()?;
            self.depth -= 1;
            return self.node(Expr::Binary(BinOp::Pow, Box::new(base), Box::new(exp)));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr, EvalError> {
        match self.next() {
            Some(Token::Num(n)) => Ok(Expr::Num(n)),
            Some(Token::Ident(name)) => Ok(Expr::Ident(name)),
            Some(Token::LParen) => {
                self.descend()?;
                let inner = self.expr()?;
                self.depth -= 1;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    Some(tok) => Err(EvalError::UnexpectedToken(tok.to_string())),
                    None => Err(EvalError::UnexpectedEnd),
                }
            }
            Some(tok) => Err(EvalError::UnexpectedToken(tok.to_string())),
            None => Err(EvalError::UnexpectedEnd),
        }
    }
}

// ──────────────────────────────────────────────
// Evaluation
// ──────────────────────────────────────────────

enum Halt {
    Unresolved(String),
    Failed(EvalError),
}

impl From<EvalError> for Halt {
    fn from(e: EvalError) -> Self {
        Halt::Failed(e)
    }
}

fn eval<F>(expr: &Expr, lookup: &F) -> Result<Number, Halt>
where
    F: Fn(&str) -> Option<Number>,
{
    match expr {
        Expr::Num(n) => Ok(*n),
        Expr::Ident(name) => lookup(name).ok_or_else(|| Halt::Unresolved(name.clone())),
        Expr::Pos(inner) => eval(inner, lookup),
        Expr::Neg(inner) => Ok(negate(eval(inner, lookup)?)?),
        Expr::Binary(op, l, r) => {
            let l = eval(l, lookup)?;
            let r = eval(r, lookup)?;
            Ok(binary(*op, l, r)?)
        }
    }
}

fn negate(n: Number) -> Result<Number, EvalError> {
    match n {
        Number::Int(i) => i.checked_neg().map(Number::Int).ok_or(EvalError::Overflow),
        Number::Float(f) => Ok(Number::Float(-f)),
    }
}

fn binary(op: BinOp, l: Number, r: Number) -> Result<Number, EvalError> {
    use Number::{Float, Int};

    match (op, l, r) {
        (BinOp::Add, Int(a), Int(b)) => a.checked_add(b).map(Int).ok_or(EvalError::Overflow),
        (BinOp::Sub, Int(a), Int(b)) => a.checked_sub(b).map(Int).ok_or(EvalError::Overflow),
        (BinOp::Mul, Int(a), Int(b)) => a.checked_mul(b).map(Int).ok_or(EvalError::Overflow),
        (BinOp::Add, a, b) => Ok(Float(a.as_f64() + b.as_f64())),
        (BinOp::Sub, a, b) => Ok(Float(a.as_f64() - b.as_f64())),
        (BinOp::Mul, a, b) => Ok(Float(a.as_f64() * b.as_f64())),
        (BinOp::Div, a, b) => {
            if b.as_f64() == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            Ok(Float(a.as_f64() / b.as_f64()))
        }
        (BinOp::FloorDiv, Int(a), Int(b)) => {
            if b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            let q = a.checked_div(b).ok_or(EvalError::Overflow)?;
            if a % b != 0 && ((a < 0) != (b < 0)) {
                Ok(Int(q - 1))
            } else {
                Ok(Int(q))
            }
        }
        (BinOp::FloorDiv, a, b) => {
            if b.as_f64() == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            Ok(Float((a.as_f64() / b.as_f64()).floor()))
        }
        (BinOp::Mod, Int(a), Int(b)) => {
            if b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            let r = a.checked_rem(b).ok_or(EvalError::Overflow)?;
            if r != 0 && ((r < 0) != (b < 0)) {
                Ok(Int(r + b))
            } else {
                Ok(Int(r))
            }
        }
        (BinOp::Mod, a, b) => {
            let (a, b) = (a.as_f64(), b.as_f64());
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            let r = a % b;
            if r != 0.0 && ((r < 0.0) != (b < 0.0)) {
                Ok(Float(r + b))
            } else {
                Ok(Float(r))
            }
        }
        (BinOp::Pow, Int(a), Int(b)) if b >= 0 => {
            let exp = u32::try_from(b).map_err(|_| EvalError::Overflow)?;
            a.checked_pow(exp).map(Int).ok_or(EvalError::Overflow)
        }
        (BinOp::Pow, a, b) => {
            let (a, b) = (a.as_f64(), b.as_f64());
            if a == 0.0 && b < 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            let v = a.powf(b);
            if v.is_nan() && !a.is_nan() && !b.is_nan() {
                return Err(EvalError::Domain);
            }
            Ok(Float(v))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(src: &str) -> String {
        match evaluate(src, |_| None) {
            Ok(Outcome::Value(n)) => n.to_string(),
            other => panic!("expected a value for {:?}, got {:?}", src, other),
        }
    }

    #[test]
    fn integer_arithmetic_and_precedence() {
        assert_eq!(value("1 + 2 * 3"), "7");
        assert_eq!(value("(1 + 2) * 3"), "9");
        assert_eq!(value("2 ** 3 ** 2"), "512");
        assert_eq!(value("-2 ** 2"), "-4");
        assert_eq!(value("0x10 + 0b11"), "19");
    }

    #[test]
    fn true_division_yields_float() {
        assert_eq!(value("1 / 2"), "0.5");
        assert_eq!(value("4 / 2"), "2.0");
        assert_eq!(value("2 ** -1"), "0.5");
    }

    #[test]
    fn floor_division_and_modulo_follow_divisor_sign() {
        assert_eq!(value("7 // 2"), "3");
        assert_eq!(value("-7 // 2"), "-4");
        assert_eq!(value("-7 % 3"), "2");
        assert_eq!(value("7 % -3"), "-2");
        assert_eq!(value("7.5 // 2"), "3.0");
    }

    #[test]
    fn float_formatting() {
        assert_eq!(value("0.1 + 0.2"), "0.30000000000000004");
        assert_eq!(value("1e3"), "1000.0");
        assert_eq!(value("1.5e16 * 1"), "1.5e+16");
        assert_eq!(value("1 / 100000"), "1e-05");
    }

    #[test]
    fn unknown_identifier_is_unresolved() {
        assert_eq!(
            evaluate("hello", |_| None),
            Ok(Outcome::Unresolved("hello".into()))
        );
        assert_eq!(
            evaluate("speed * 2", |_| None),
            Ok(Outcome::Unresolved("speed".into()))
        );
    }

    #[test]
    fn identifiers_use_lookup() {
        let lookup = |name: &str| (name == "base").then_some(Number::Int(40));
        assert_eq!(evaluate("base + 2", lookup), Ok(Outcome::Value(Number::Int(42))));
    }

    #[test]
    fn syntax_errors_win_over_unknown_identifiers() {
        assert!(matches!(
            evaluate("hello world", |_| None),
            Err(EvalError::UnexpectedToken(_))
        ));
        assert_eq!(evaluate("", |_| None), Err(EvalError::UnexpectedEnd));
        assert_eq!(evaluate("1 +", |_| None), Err(EvalError::UnexpectedEnd));
        assert_eq!(evaluate("(1", |_| None), Err(EvalError::UnexpectedEnd));
        assert_eq!(evaluate("'a'", |_| None), Err(EvalError::UnexpectedChar('\'')));
    }

    #[test]
    fn arithmetic_failures() {
        assert_eq!(evaluate("1 / 0", |_| None), Err(EvalError::DivisionByZero));
        assert_eq!(evaluate("5 % 0", |_| None), Err(EvalError::DivisionByZero));
        assert_eq!(
            evaluate("9223372036854775807 + 1", |_| None),
            Err(EvalError::Overflow)
        );
        assert_eq!(evaluate("(-8) ** 0.5", |_| None), Err(EvalError::Domain));
        assert!(matches!(
            evaluate("12abc", |_| None),
            Err(EvalError::InvalidNumber(_))
        ));
    }

    #[test]
    fn nesting_is_bounded() {
        let nested = |n: usize| format!("{}1{}", "(".repeat(n), ")".repeat(n));
        assert_eq!(value(&nested(MAX_DEPTH)), "1");
        assert_eq!(evaluate(&nested(200_000), |_| None), Err(EvalError::TooDeep));
        assert_eq!(
            evaluate(&format!("{}1", "-".repeat(100_000)), |_| None),
            Err(EvalError::TooDeep)
        );
        assert_eq!(
            evaluate(&format!("{}2", "2 ** ".repeat(100_000)), |_| None),
            Err(EvalError::TooDeep)
        );
    }

    #[test]
    fn operator_count_is_bounded() {
        let chain = |n: usize| format!("1{}", " + 1".repeat(n));
        assert_eq!(value(&chain(MAX_NODES)), (MAX_NODES + 1).to_string());
        assert_eq!(evaluate(&chain(100_000), |_| None), Err(EvalError::TooDeep));
    }

    #[test]
    fn parse_literal_accepts_signed_numbers_only() {
        assert_eq!(Number::parse_literal("-3"), Some(Number::Int(-3)));
        assert_eq!(Number::parse_literal(" 2.5 "), Some(Number::Float(2.5)));
        assert_eq!(Number::parse_literal("1 + 1"), None);
        assert_eq!(Number::parse_literal("abc"), None);
    }
}
