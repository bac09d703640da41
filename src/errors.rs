use std::fmt;

/// Everything that can go wrong while evaluating the op stack.
///
/// All conditions are recoverable: the evaluator turns them into a
/// placeholder message instead of aborting, and repeating the evaluation
/// without mutating the stack reproduces the same outcome.
#[derive(Clone, PartialEq)]
pub enum EvalError {
    /// A variable op whose name has no bound value
    UnknownVariable(String),
    /// A binary operator could not resolve its first operand
    /// (the one nearer the top of the stack)
    FirstOperandMissing,
    /// A binary operator could not resolve its second operand
    SecondOperandMissing,
    /// Division by zero
    DividedByZero,
    /// Square root of a negative number
    NegativeRoot,
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self {
            EvalError::UnknownVariable(name) => write!(f, "({}=❓)", name),
            EvalError::FirstOperandMissing => write!(f, "op1❓"),
            EvalError::SecondOperandMissing => write!(f, "op2❓"),
            EvalError::DividedByZero => write!(f, "❌ dividend"),
            EvalError::NegativeRoot => write!(f, "❌ √(n>0)"),
        }
    }
}

impl fmt::Debug for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
