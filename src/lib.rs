//! # RPN expression engine
//!
//! A stack-based calculator core: operands and operators are pushed one by
//! one in reverse-Polish order, and every mutation re-evaluates the whole
//! stack and returns the numeric result (or `None` when the stack does not
//! yet encode a computable expression).
//!
//! The engine keeps three pieces of state:
//! * the op stack itself - the single source of truth for "the program",
//! * registries of known operators and constants, preloaded at construction,
//! * a table of variable bindings mutated by the caller.
//!
//! Built-in operators: `×`, `÷`, `+`, `−` (binary), prefix sign `-`, `√`,
//! `sin`, `cos`. Built-in constant: `π`. New unary/binary operators can be
//! registered at runtime; on a symbol collision the last registration wins.
//!
//! Besides evaluation the engine can:
//! * render the stack as human-readable infix text with minimal
//!   parenthesization (several back-to-back complete expressions are
//!   joined with `", "`),
//! * serialize the stack to a flat list of string tokens and rebuild it
//!   from such a list, so a formula can be copied into an independent
//!   engine instance without sharing any mutable state,
//! * report evaluation problems as short placeholder messages instead of
//!   failing: `(x=❓)` for an unbound variable, `op1❓`/`op2❓` for a
//!   missing operand, `❌ dividend` for division by zero, `❌ √(n>0)` for
//!   the square root of a negative number.
//!
//! ```
//! use rpncalc::engine::Engine;
//!
//! let mut engine = Engine::new();
//! engine.push_operand(3.0);
//! engine.push_operand(4.0);
//! engine.push_operand(5.0);
//! engine.apply_operator("+");
//! assert_eq!(engine.apply_operator("×"), Some(27.0));
//! assert_eq!(engine.description(), "3×(4+5)");
//! ```

pub mod describe;
pub mod engine;
pub mod errors;
pub mod ops;
