use std::f64::consts;
use std::fmt;
use std::str;

use lazy_static::lazy_static;

use crate::errors::EvalError;

/// Transform applied by a unary operator
pub type UnaryFn = fn(f64) -> f64;
/// Transform applied by a binary operator. The first argument is the
/// operand popped first, i.e. the one nearer the top of the stack, so
/// non-commutative transforms must be written accordingly (subtraction
/// computes `op2 - op1`)
pub type BinaryFn = fn(f64, f64) -> f64;
/// Domain check run on the resolved operand before a unary transform
pub type UnaryCheck = fn(f64) -> Option<EvalError>;
/// Domain check run on the resolved operands before a binary transform
pub type BinaryCheck = fn(f64, f64) -> Option<EvalError>;

// Precedence ranks used only for infix rendering, never for evaluation
// order. Operands, variables and constants always rank 0; the prefix sign
// ranks below 0 so the describer glues it to its operand without parens.
pub const PRI_ATOM: i32 = 0;
pub const PRI_ADD: i32 = 1;
pub const PRI_MUL: i32 = 2;
pub const PRI_SIGN: i32 = -1;

/// One entry of the op stack
#[derive(Clone)]
pub enum Op {
    /// Literal numeric operand
    Operand(f64),
    /// Operator taking a single operand from the stack
    Unary {
        symbol: String,
        precedence: i32,
        check: Option<UnaryCheck>,
        apply: UnaryFn,
    },
    /// Operator taking two operands from the stack
    Binary {
        symbol: String,
        precedence: i32,
        check: Option<BinaryCheck>,
        apply: BinaryFn,
    },
    /// Named operand resolved against the variable table at evaluation time
    Variable(String),
    /// Named operand with a fixed value, e.g. `π`
    Constant { symbol: String, value: f64 },
}

const F64_BUF_LEN: usize = 48;

/// Formats an `f64` the same way everywhere the engine turns a number into
/// text: program tokens, descriptions, and reported results
pub(crate) fn format_f64(g: f64) -> String {
    let mut buf = [b'\0'; F64_BUF_LEN];
    match dtoa::write(&mut buf[..], g) {
        Ok(len) => match str::from_utf8(&buf[..len]) {
            Ok(s) => s.to_string(),
            Err(..) => format!("{}", g),
        },
        Err(..) => format!("{}", g),
    }
}

impl Op {
    pub fn unary(symbol: &str, precedence: i32, check: Option<UnaryCheck>, apply: UnaryFn) -> Op {
        Op::Unary {
            symbol: symbol.to_string(),
            precedence,
            check,
            apply,
        }
    }

    pub fn binary(symbol: &str, precedence: i32, check: Option<BinaryCheck>, apply: BinaryFn) -> Op {
        Op::Binary {
            symbol: symbol.to_string(),
            precedence,
            check,
            apply,
        }
    }

    pub fn constant(symbol: &str, value: f64) -> Op {
        Op::Constant {
            symbol: symbol.to_string(),
            value,
        }
    }

    /// Rendering precedence of the op. Operands, variables and constants
    /// are atoms and never need parentheses
    pub fn precedence(&self) -> i32 {
        match self {
            Op::Unary { precedence, .. } | Op::Binary { precedence, .. } => *precedence,
            _ => PRI_ATOM,
        }
    }
}

// The display text doubles as the registry key for operators and constants
impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self {
            Op::Operand(value) => write!(f, "{}", format_f64(*value)),
            Op::Unary { symbol, .. } | Op::Binary { symbol, .. } => write!(f, "{}", symbol),
            Op::Variable(name) => write!(f, "{}", name),
            Op::Constant { symbol, .. } => write!(f, "{}", symbol),
        }
    }
}

impl fmt::Debug for Op {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self {
            Op::Operand(..) => write!(f, "Operand({})", self),
            Op::Unary { .. } => write!(f, "Unary({})", self),
            Op::Binary { .. } => write!(f, "Binary({})", self),
            Op::Variable(..) => write!(f, "Variable({})", self),
            Op::Constant { .. } => write!(f, "Constant({})", self),
        }
    }
}

fn check_divisor(op1: f64, _op2: f64) -> Option<EvalError> {
    if op1 == 0.0 {
        Some(EvalError::DividedByZero)
    } else {
        None
    }
}

fn check_root(operand: f64) -> Option<EvalError> {
    if operand < 0.0 {
        Some(EvalError::NegativeRoot)
    } else {
        None
    }
}

lazy_static! {
    /// Operators every engine knows from construction. The divisor check
    /// looks at the first popped operand because `÷` computes `op2 ÷ op1`
    pub(crate) static ref STD_OPS: Vec<Op> = vec![
        Op::binary("×", PRI_MUL, None, |op1, op2| op1 * op2),
        Op::binary("÷", PRI_MUL, Some(check_divisor), |op1, op2| op2 / op1),
        Op::binary("+", PRI_ADD, None, |op1, op2| op1 + op2),
        Op::binary("−", PRI_ADD, None, |op1, op2| op2 - op1),
        Op::unary("√", PRI_ATOM, Some(check_root), f64::sqrt),
        Op::unary("sin", PRI_ATOM, None, f64::sin),
        Op::unary("cos", PRI_ATOM, None, f64::cos),
        Op::unary("-", PRI_SIGN, None, |operand| -operand),
    ];

    /// Constants every engine knows from construction
    pub(crate) static ref STD_CONS: Vec<Op> = vec![Op::constant("π", consts::PI)];
}
