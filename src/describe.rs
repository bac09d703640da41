use crate::ops::{format_f64, Op, PRI_ATOM};

// Infix rendering of the op stack. Precedence ranks decide where
// parentheses go; they play no role in evaluation order.

/// Renders every complete expression the stack encodes, in program order
/// (bottom to top). The describer consumes from the top, so each pass
/// yields the latest expression first and the collected list is reversed
/// before returning.
pub(crate) fn describe_stack(ops: &[Op]) -> Vec<String> {
    let mut expressions = Vec::new();
    let mut remaining = ops;
    loop {
        let (text, _, rest) = describe(remaining);
        if let Some(text) = text {
            expressions.push(text);
        }
        if rest.is_empty() {
            break;
        }
        remaining = rest;
    }
    expressions.reverse();
    expressions
}

// One expression from the top of the stack. Returns the rendered text,
// the precedence of the outermost op (the caller needs it to decide on
// parentheses), and the unconsumed part of the slice.
//
// Parenthesization:
// - operand1 (nearer the top, rendered to the right of a binary symbol)
//   is wrapped whenever it is itself a binary expression; this keeps
//   chains built through the same branch flat ("1+2+3") while a compound
//   right side like "1−(2+3)" stays grouped,
// - operand2 (left of the symbol) is wrapped only when a lower-precedence
//   compound expression sits inside a higher-precedence op ("(1+2)×3"),
// - atoms never get parentheses,
// - a unary op with negative precedence is a prefix sign and glues
//   directly to its operand ("-5", not "-(5)").
fn describe(ops: &[Op]) -> (Option<String>, i32, &[Op]) {
    let (op, rest) = match ops.split_last() {
        Some(pair) => pair,
        None => return (None, PRI_ATOM, ops),
    };

    match op {
        Op::Operand(value) => {
            let mut text = format_f64(*value);
            if text.ends_with(".0") {
                text.truncate(text.len() - 2);
            }
            (Some(text), PRI_ATOM, rest)
        }
        Op::Variable(name) => (Some(name.clone()), PRI_ATOM, rest),
        Op::Constant { symbol, .. } => (Some(symbol.clone()), PRI_ATOM, rest),
        Op::Unary {
            symbol, precedence, ..
        } => {
            let (inner, _, remaining) = describe(rest);
            let inner = inner.unwrap_or_else(|| "?".to_string());
            let text = if *precedence >= 0 {
                format!("{}({})", symbol, inner)
            } else {
                format!("{}{}", symbol, inner)
            };
            (Some(text), *precedence, remaining)
        }
        Op::Binary {
            symbol, precedence, ..
        } => {
            let (text1, pri1, remaining) = describe(rest);
            let mut text1 = text1.unwrap_or_else(|| "?".to_string());
            let (text2, pri2, remaining) = describe(remaining);
            let mut text2 = text2.unwrap_or_else(|| "?".to_string());

            if pri1 != PRI_ATOM {
                text1 = parenthesized(&text1);
            }
            if *precedence > pri2 && pri2 != PRI_ATOM {
                text2 = parenthesized(&text2);
            }
            (
                Some(format!("{}{}{}", text2, symbol, text1)),
                *precedence,
                remaining,
            )
        }
    }
}

// Wraps the text in parentheses unless one matching outer pair already
// encloses the whole of it.
fn parenthesized(text: &str) -> String {
    if is_wrapped(text) {
        text.to_string()
    } else {
        format!("({})", text)
    }
}

fn is_wrapped(text: &str) -> bool {
    if !text.starts_with('(') || !text.ends_with(')') {
        return false;
    }
    let mut depth = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    // the pair opened at the start must close at the end
                    return i == text.len() - 1;
                }
            }
            _ => {}
        }
    }
    false
}
