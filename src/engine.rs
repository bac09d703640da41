use std::collections::HashMap;

use crate::describe::describe_stack;
use crate::errors::EvalError;
use crate::ops::{format_f64, BinaryCheck, BinaryFn, Op, UnaryCheck, UnaryFn, STD_CONS, STD_OPS};

/// One isolated unit of op stack + operator registries + variable bindings.
///
/// The engine is meant to be owned exclusively by one caller at a time.
/// Copying a formula to another owner goes through [`Engine::program`] and
/// [`Engine::set_program`], never by sharing the stack.
pub struct Engine {
    op_stack: Vec<Op>,
    known_ops: HashMap<String, Op>,
    known_cons: HashMap<String, Op>,
    variables: HashMap<String, f64>,
}

impl Default for Engine {
    fn default() -> Engine {
        let mut known_ops = HashMap::new();
        for op in STD_OPS.iter() {
            known_ops.insert(op.to_string(), op.clone());
        }
        let mut known_cons = HashMap::new();
        for op in STD_CONS.iter() {
            known_cons.insert(op.to_string(), op.clone());
        }
        Engine {
            op_stack: Vec::new(),
            known_ops,
            known_cons,
            variables: HashMap::new(),
        }
    }
}

impl Engine {
    pub fn new() -> Self {
        Default::default()
    }

    // ------------ stack mutation -----------------
    // every mutation re-evaluates the whole stack and returns the result

    /// Pushes a literal operand
    pub fn push_operand(&mut self, value: f64) -> Option<f64> {
        self.op_stack.push(Op::Operand(value));
        self.evaluate()
    }

    /// Pushes a variable by name; its value is looked up at evaluation time
    pub fn push_variable(&mut self, name: &str) -> Option<f64> {
        self.op_stack.push(Op::Variable(name.to_string()));
        self.evaluate()
    }

    /// Pushes an ad hoc named constant, independent of the registry
    pub fn push_constant(&mut self, symbol: &str, value: f64) -> Option<f64> {
        self.op_stack.push(Op::constant(symbol, value));
        self.evaluate()
    }

    /// Pushes a registered operator by symbol. An unknown symbol leaves the
    /// stack untouched: it is logged, not fatal
    pub fn apply_operator(&mut self, symbol: &str) -> Option<f64> {
        match self.known_ops.get(symbol) {
            Some(op) => {
                let op = op.clone();
                self.op_stack.push(op);
            }
            None => log::warn!("operator '{}' does not exist", symbol),
        }
        self.evaluate()
    }

    /// Removes the most recently pushed op; no-op on an empty stack
    pub fn undo(&mut self) -> Option<f64> {
        let _ = self.op_stack.pop();
        self.evaluate()
    }

    /// Empties both the op stack and the variable bindings
    pub fn clear(&mut self) {
        self.op_stack.clear();
        self.variables.clear();
    }

    // ------------ registries -----------------

    /// Registers a unary operator; replaces any previous op with the same symbol
    pub fn learn_unary_operation(
        &mut self,
        symbol: &str,
        precedence: i32,
        check: Option<UnaryCheck>,
        apply: UnaryFn,
    ) {
        self.known_ops
            .insert(symbol.to_string(), Op::unary(symbol, precedence, check, apply));
    }

    /// Registers a binary operator; replaces any previous op with the same symbol
    pub fn learn_binary_operation(
        &mut self,
        symbol: &str,
        precedence: i32,
        check: Option<BinaryCheck>,
        apply: BinaryFn,
    ) {
        self.known_ops
            .insert(symbol.to_string(), Op::binary(symbol, precedence, check, apply));
    }

    // ------------ variables -----------------

    /// Returns the value bound to a variable name, if any
    pub fn variable(&self, name: &str) -> Option<f64> {
        self.variables.get(name).copied()
    }

    /// Binds a value to a variable name. Graph-style consumers drive the
    /// formula by rebinding one slot and calling [`Engine::evaluate`] per sample
    pub fn set_variable(&mut self, name: &str, value: f64) {
        self.variables.insert(name.to_string(), value);
    }

    // ------------ evaluation -----------------

    /// Evaluates the entire stack; `None` when it does not encode a
    /// computable expression (empty, unbound variable, missing operand)
    pub fn evaluate(&self) -> Option<f64> {
        let (result, _) = self.eval(&self.op_stack);
        result
    }

    /// Evaluates the entire stack and renders the outcome as text: the
    /// numeric result on success, exactly one placeholder message on
    /// failure, `"?"` when nothing could be computed and no message applies
    pub fn evaluate_and_report_errors(&self) -> String {
        let (result, error, _) = self.eval_reported(&self.op_stack);
        match error {
            Some(e) => e.to_string(),
            None => match result {
                Some(value) => format_f64(value),
                None => "?".to_string(),
            },
        }
    }

    // Consumes ops from the top (last element first) and returns the part
    // of the slice it did not need. A binary op resolves its first operand
    // before its second, so the first popped value is the one nearer the
    // top of the stack.
    fn eval<'a>(&self, ops: &'a [Op]) -> (Option<f64>, &'a [Op]) {
        let (op, rest) = match ops.split_last() {
            Some(pair) => pair,
            None => return (None, ops),
        };

        match op {
            Op::Operand(value) => (Some(*value), rest),
            Op::Constant { value, .. } => (Some(*value), rest),
            Op::Variable(name) => (self.variables.get(name).copied(), rest),
            Op::Unary { apply, .. } => {
                let (operand, remaining) = self.eval(rest);
                match operand {
                    Some(value) => (Some(apply(value)), remaining),
                    None => (None, remaining),
                }
            }
            Op::Binary { apply, .. } => {
                let (operand1, remaining) = self.eval(rest);
                let op1 = match operand1 {
                    Some(value) => value,
                    None => return (None, remaining),
                };
                let (operand2, remaining) = self.eval(remaining);
                match operand2 {
                    Some(op2) => (Some(apply(op1, op2)), remaining),
                    None => (None, remaining),
                }
            }
        }
    }

    // Same recursive shape as eval() but threads an error alongside the
    // result. An operator's own domain check wins over anything found
    // deeper while resolving its operands; an operand that cannot be
    // resolved at all surfaces the deeper error instead (an unbound
    // variable beats the generic op1❓/op2❓ markers).
    fn eval_reported<'a>(&self, ops: &'a [Op]) -> (Option<f64>, Option<EvalError>, &'a [Op]) {
        let (op, rest) = match ops.split_last() {
            Some(pair) => pair,
            None => return (None, None, ops),
        };

        match op {
            Op::Operand(value) => (Some(*value), None, rest),
            Op::Constant { value, .. } => (Some(*value), None, rest),
            Op::Variable(name) => match self.variables.get(name) {
                Some(value) => (Some(*value), None, rest),
                None => (None, Some(EvalError::UnknownVariable(name.clone())), rest),
            },
            Op::Unary { check, apply, .. } => {
                let (operand, deeper, remaining) = self.eval_reported(rest);
                match operand {
                    Some(value) => {
                        let failure = match check {
                            Some(c) => c(value),
                            None => None,
                        };
                        (Some(apply(value)), failure.or(deeper), remaining)
                    }
                    None => (None, deeper, remaining),
                }
            }
            Op::Binary { check, apply, .. } => {
                let (operand1, err1, remaining) = self.eval_reported(rest);
                let op1 = match operand1 {
                    Some(value) => value,
                    None => {
                        let e = err1.unwrap_or(EvalError::FirstOperandMissing);
                        return (None, Some(e), remaining);
                    }
                };
                let (operand2, err2, remaining) = self.eval_reported(remaining);
                let op2 = match operand2 {
                    Some(value) => value,
                    None => {
                        let e = err2.unwrap_or(EvalError::SecondOperandMissing);
                        return (None, Some(e), remaining);
                    }
                };
                let failure = match check {
                    Some(c) => c(op1, op2),
                    None => None,
                };
                (Some(apply(op1, op2)), failure.or(err1).or(err2), remaining)
            }
        }
    }

    // ------------ description & serialization -----------------

    /// Infix text for every complete expression on the stack, in program
    /// order, joined with `", "`. Does not mutate the stack
    pub fn description(&self) -> String {
        describe_stack(&self.op_stack).join(", ")
    }

    /// Serializes the stack into a flat token list, bottom to top: numeric
    /// literal text for operands, the display symbol for everything else
    pub fn program(&self) -> Vec<String> {
        self.op_stack.iter().map(|op| op.to_string()).collect()
    }

    /// Rebuilds the stack from a token list. Tokens resolve independently:
    /// known operator first, then decimal numeral, then known constant;
    /// anything else becomes a variable name. Never an error
    pub fn set_program<S: AsRef<str>>(&mut self, tokens: &[S]) {
        let mut new_stack = Vec::with_capacity(tokens.len());
        for token in tokens {
            let token = token.as_ref();
            if let Some(op) = self.known_ops.get(token) {
                new_stack.push(op.clone());
            } else if let Ok(value) = token.parse::<f64>() {
                new_stack.push(Op::Operand(value));
            } else if let Some(op) = self.known_cons.get(token) {
                new_stack.push(op.clone());
            } else {
                new_stack.push(Op::Variable(token.to_string()));
            }
        }
        self.op_stack = new_stack;
    }

    /// Describes a serialized program without touching any existing
    /// instance: loads it into a fresh engine and renders the description
    pub fn description_of_program<S: AsRef<str>>(program: &[S]) -> String {
        let mut engine = Engine::new();
        engine.set_program(program);
        engine.description()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_evaluate() {
        let mut engine = Engine::new();
        // [5, 6, +, 4, ×] -> (5 + 6) × 4 = 44
        assert_eq!(engine.push_operand(5.0), Some(5.0));
        assert_eq!(engine.push_operand(6.0), Some(6.0));
        assert_eq!(engine.apply_operator("+"), Some(11.0));
        assert_eq!(engine.push_operand(4.0), Some(4.0));
        assert_eq!(engine.apply_operator("×"), Some(44.0));
    }

    #[test]
    fn test_operand_order() {
        let mut engine = Engine::new();
        // subtraction computes second − first: [10, 4, −] = 6
        engine.push_operand(10.0);
        engine.push_operand(4.0);
        assert_eq!(engine.apply_operator("−"), Some(6.0));

        engine.clear();
        // division computes second ÷ first: [10, 4, ÷] = 2.5
        engine.push_operand(10.0);
        engine.push_operand(4.0);
        assert_eq!(engine.apply_operator("÷"), Some(2.5));
    }

    #[test]
    fn test_unary_operations() {
        let mut engine = Engine::new();
        engine.push_operand(9.0);
        assert_eq!(engine.apply_operator("√"), Some(3.0));
        assert_eq!(engine.apply_operator("-"), Some(-3.0));

        engine.clear();
        engine.push_constant("π", std::f64::consts::PI);
        let cos_pi = engine.apply_operator("cos");
        assert_eq!(cos_pi, Some(-1.0));

        engine.clear();
        engine.push_operand(0.0);
        assert_eq!(engine.apply_operator("sin"), Some(0.0));
    }

    #[test]
    fn test_unknown_operator_is_noop() {
        let mut engine = Engine::new();
        engine.push_operand(3.0);
        let before_program = engine.program();
        let before_result = engine.evaluate();
        assert_eq!(engine.apply_operator("%"), before_result);
        assert_eq!(engine.program(), before_program);
    }

    #[test]
    fn test_undo_is_exact_inverse() {
        let mut engine = Engine::new();
        engine.push_operand(3.0);
        engine.push_operand(4.0);
        engine.apply_operator("+");
        let program = engine.program();
        let result = engine.evaluate();

        engine.push_operand(5.0);
        assert_eq!(engine.undo(), result);
        assert_eq!(engine.program(), program);

        // undo on an empty stack is a no-op
        let mut empty = Engine::new();
        assert_eq!(empty.undo(), None);
        assert!(empty.program().is_empty());
    }

    #[test]
    fn test_variables() {
        let mut engine = Engine::new();
        engine.push_variable("m");
        engine.push_variable("m");
        engine.apply_operator("×");
        assert_eq!(engine.evaluate(), None);
        assert_eq!(engine.evaluate_and_report_errors(), "(m=❓)");

        // the graph-style sampling loop: rebind one slot, re-evaluate
        for x in -3..4 {
            let x = f64::from(x);
            engine.set_variable("m", x);
            assert_eq!(engine.evaluate(), Some(x * x));
        }
        assert_eq!(engine.variable("m"), Some(3.0));
        assert_eq!(engine.variable("n"), None);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut engine = Engine::new();
        engine.push_operand(1.0);
        engine.set_variable("m", 2.0);
        engine.clear();
        assert!(engine.program().is_empty());
        assert_eq!(engine.variable("m"), None);
        assert_eq!(engine.evaluate(), None);
        assert_eq!(engine.evaluate_and_report_errors(), "?");
    }

    #[test]
    fn test_report_divide_by_zero() {
        let mut engine = Engine::new();
        engine.push_operand(5.0);
        engine.push_operand(0.0);
        engine.apply_operator("÷");
        assert_eq!(engine.evaluate_and_report_errors(), "❌ dividend");
    }

    #[test]
    fn test_report_negative_root() {
        let mut engine = Engine::new();
        engine.push_operand(-4.0);
        engine.apply_operator("√");
        assert_eq!(engine.evaluate_and_report_errors(), "❌ √(n>0)");
    }

    #[test]
    fn test_report_missing_operands() {
        let mut engine = Engine::new();
        engine.apply_operator("+");
        assert_eq!(engine.evaluate_and_report_errors(), "op1❓");

        engine.clear();
        engine.push_operand(5.0);
        engine.apply_operator("+");
        assert_eq!(engine.evaluate_and_report_errors(), "op2❓");
    }

    #[test]
    fn test_report_unbound_variable_beats_operand_marker() {
        let mut engine = Engine::new();
        // [x, 2, ×] with x unbound: the variable message surfaces, not op2❓
        engine.push_variable("x");
        engine.push_operand(2.0);
        engine.apply_operator("×");
        assert_eq!(engine.evaluate_and_report_errors(), "(x=❓)");
    }

    #[test]
    fn test_report_outermost_check_wins() {
        let mut engine = Engine::new();
        // √(0 − 5÷0): both the division and the root fail (5÷0 evaluates
        // to +inf, so the subtraction yields -inf); the root check is
        // outermost and its message is the one reported
        engine.push_operand(0.0);
        engine.push_operand(5.0);
        engine.push_operand(0.0);
        engine.apply_operator("÷");
        engine.apply_operator("−");
        engine.apply_operator("√");
        assert_eq!(engine.evaluate_and_report_errors(), "❌ √(n>0)");
    }

    #[test]
    fn test_report_deeper_check_propagates() {
        let mut engine = Engine::new();
        // (5 ÷ 0) + 1: the addition has no check, the division message
        // found while resolving its operand is the one reported
        engine.push_operand(5.0);
        engine.push_operand(0.0);
        engine.apply_operator("÷");
        engine.push_operand(1.0);
        engine.apply_operator("+");
        assert_eq!(engine.evaluate_and_report_errors(), "❌ dividend");
    }

    #[test]
    fn test_evaluators_agree_without_errors() {
        let mut engine = Engine::new();
        engine.push_operand(3.0);
        engine.push_operand(4.0);
        engine.push_operand(5.0);
        engine.apply_operator("+");
        engine.apply_operator("×");
        engine.push_operand(2.0);
        engine.apply_operator("÷");
        let result = engine.evaluate().unwrap();
        assert_eq!(engine.evaluate_and_report_errors(), format_f64(result));
    }

    #[test]
    fn test_program_round_trip() {
        let mut engine = Engine::new();
        engine.push_operand(3.0);
        engine.push_operand(4.5);
        engine.apply_operator("+");
        engine.push_variable("m");
        engine.apply_operator("×");
        let tokens = engine.program();
        assert_eq!(tokens, vec!["3.0", "4.5", "+", "m", "×"]);

        let mut copy = Engine::new();
        copy.set_program(&tokens);
        assert_eq!(copy.program(), tokens);

        // independent instances: binding in the copy leaves the original alone
        copy.set_variable("m", 2.0);
        assert_eq!(copy.evaluate(), Some(15.0));
        assert_eq!(engine.evaluate(), None);
    }

    #[test]
    fn test_set_program_token_resolution() {
        let mut engine = Engine::new();
        engine.set_program(&["π", "cos"]);
        assert_eq!(engine.evaluate(), Some(-1.0));
        assert_eq!(engine.program(), vec!["π", "cos"]);

        // an unparseable non-operator token always becomes a variable
        engine.set_program(&["whatever", "3", "+"]);
        assert_eq!(engine.evaluate(), None);
        engine.set_variable("whatever", 1.0);
        assert_eq!(engine.evaluate(), Some(4.0));
    }

    #[test]
    fn test_learned_operations() {
        let mut engine = Engine::new();
        engine.learn_unary_operation("tan", crate::ops::PRI_ATOM, None, f64::tan);
        engine.push_operand(0.0);
        assert_eq!(engine.apply_operator("tan"), Some(0.0));

        // last registration wins on a symbol collision
        engine.clear();
        engine.learn_binary_operation("+", crate::ops::PRI_ADD, None, |op1, op2| op2 - op1);
        engine.push_operand(10.0);
        engine.push_operand(4.0);
        assert_eq!(engine.apply_operator("+"), Some(6.0));
    }

    #[test]
    fn test_multiple_expressions_on_stack() {
        let mut engine = Engine::new();
        // two complete expressions back to back still evaluate from the top
        engine.push_operand(3.0);
        engine.push_operand(4.0);
        engine.apply_operator("+");
        engine.push_operand(5.0);
        engine.push_operand(6.0);
        assert_eq!(engine.apply_operator("×"), Some(30.0));
    }
}
