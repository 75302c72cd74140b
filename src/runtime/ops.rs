//! Native operations and the output sink.
//!
//! Ordinary application resolves its head through the [`OpRegistry`], a
//! name → function-pointer table inspectable at runtime. Operations receive
//! their arguments already evaluated, left to right. The [`OutputSink`]
//! makes engine output injectable and testable: tests install a
//! [`RecordingSink`] and assert on the exact emission order.

use std::collections::HashMap;

use crate::errors::{MantraError, Result};
use crate::runtime::eval::EvalContext;
use crate::term::Term;

/// Output boundary for `emit`; the core never performs I/O directly.
pub trait OutputSink {
    fn emit(&mut self, text: &str);
}

/// Discards all output.
pub struct NullSink;

impl OutputSink for NullSink {
    fn emit(&mut self, _text: &str) {}
}

/// Records emissions in order; the observability hook the test suite relies
/// on to prove non-taken branches never run.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub emitted: Vec<String>,
}

impl OutputSink for RecordingSink {
    fn emit(&mut self, text: &str) {
        self.emitted.push(text.to_string());
    }
}

/// Native operation type: evaluated arguments in, one term out.
pub type NativeFn = fn(&[Term], &mut EvalContext) -> Result<Term>;

/// Registry of named native operations.
#[derive(Default)]
pub struct OpRegistry {
    ops: HashMap<String, NativeFn>,
}

impl OpRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, func: NativeFn) {
        self.ops.insert(name.to_string(), func);
    }

    pub fn get(&self, name: &str) -> Option<&NativeFn> {
        self.ops.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ops.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.ops.keys().cloned().collect()
    }
}

/// Builds the registry every engine starts from. Constructed once at the
/// entrypoint and passed by reference; never build a hidden local registry.
pub fn build_default_op_registry() -> OpRegistry {
    let mut registry = OpRegistry::new();
    registry.register("+", op_add);
    registry.register("-", op_sub);
    registry.register("*", op_mul);
    registry.register("=", op_equal);
    registry.register("<", op_less);
    registry.register(">", op_greater);
    registry.register("list", op_list);
    registry.register("first", op_first);
    registry.register("rest", op_rest);
    registry.register("cons", op_cons);
    registry.register("not", op_not);
    registry.register("emit", op_emit);
    registry.register("gensym", op_gensym);
    registry
}

fn expect_number(operation: &str, term: &Term) -> Result<i64> {
    term.as_number().ok_or_else(|| MantraError::TypeMismatch {
        operation: operation.to_string(),
        expected: "a number".to_string(),
        actual: term.to_string(),
    })
}

fn op_add(args: &[Term], _ctx: &mut EvalContext) -> Result<Term> {
    let mut sum = 0i64;
    for arg in args {
        sum = sum
            .checked_add(expect_number("+", arg)?)
            .ok_or_else(|| overflow("+"))?;
    }
    Ok(Term::Number(sum))
}

fn op_sub(args: &[Term], _ctx: &mut EvalContext) -> Result<Term> {
    match args {
        [] => Err(arity("-", "at least 1", 0)),
        [only] => {
            let n = expect_number("-", only)?;
            Ok(Term::Number(n.checked_neg().ok_or_else(|| overflow("-"))?))
        }
        [head, rest @ ..] => {
            let mut acc = expect_number("-", head)?;
            for arg in rest {
                acc = acc
                    .checked_sub(expect_number("-", arg)?)
                    .ok_or_else(|| overflow("-"))?;
            }
            Ok(Term::Number(acc))
        }
    }
}

fn op_mul(args: &[Term], _ctx: &mut EvalContext) -> Result<Term> {
    let mut product = 1i64;
    for arg in args {
        product = product
            .checked_mul(expect_number("*", arg)?)
            .ok_or_else(|| overflow("*"))?;
    }
    Ok(Term::Number(product))
}

fn overflow(op: &str) -> MantraError {
    MantraError::ArithmeticOverflow {
        operation: op.to_string(),
    }
}

// Structural, order-sensitive equality over terms, not a numeric tower.
fn op_equal(args: &[Term], _ctx: &mut EvalContext) -> Result<Term> {
    let all_equal = args.windows(2).all(|pair| pair[0] == pair[1]);
    Ok(Term::truth(all_equal))
}

fn op_less(args: &[Term], _ctx: &mut EvalContext) -> Result<Term> {
    compare_chain("<", args, |a, b| a < b)
}

fn op_greater(args: &[Term], _ctx: &mut EvalContext) -> Result<Term> {
    compare_chain(">", args, |a, b| a > b)
}

fn compare_chain(operation: &str, args: &[Term], ok: fn(i64, i64) -> bool) -> Result<Term> {
    for pair in args.windows(2) {
        let a = expect_number(operation, &pair[0])?;
        let b = expect_number(operation, &pair[1])?;
        if !ok(a, b) {
            return Ok(Term::truth(false));
        }
    }
    Ok(Term::truth(true))
}

fn op_list(args: &[Term], _ctx: &mut EvalContext) -> Result<Term> {
    Ok(Term::list(args.to_vec()))
}

fn op_first(args: &[Term], _ctx: &mut EvalContext) -> Result<Term> {
    let [seq] = args else {
        return Err(arity("first", "1", args.len()));
    };
    let Some((items, _)) = seq.as_sequence() else {
        return Err(MantraError::TypeMismatch {
            operation: "first".to_string(),
            expected: "a sequence".to_string(),
            actual: seq.to_string(),
        });
    };
    Ok(items.first().cloned().unwrap_or(Term::Nil))
}

fn op_rest(args: &[Term], _ctx: &mut EvalContext) -> Result<Term> {
    let [seq] = args else {
        return Err(arity("rest", "1", args.len()));
    };
    let Some((items, tail)) = seq.as_sequence() else {
        return Err(MantraError::TypeMismatch {
            operation: "rest".to_string(),
            expected: "a sequence".to_string(),
            actual: seq.to_string(),
        });
    };
    if items.len() <= 1 {
        return Ok(tail.cloned().unwrap_or(Term::Nil));
    }
    Ok(Term::improper(
        items[1..].to_vec(),
        tail.cloned().unwrap_or(Term::Nil),
    ))
}

fn op_cons(args: &[Term], _ctx: &mut EvalContext) -> Result<Term> {
    let [head, tail] = args else {
        return Err(arity("cons", "2", args.len()));
    };
    match tail.as_sequence() {
        Some((items, seq_tail)) => {
            let mut new_items = vec![head.clone()];
            new_items.extend(items.iter().cloned());
            Ok(Term::improper(
                new_items,
                seq_tail.cloned().unwrap_or(Term::Nil),
            ))
        }
        None => Ok(Term::improper(vec![head.clone()], tail.clone())),
    }
}

fn op_not(args: &[Term], _ctx: &mut EvalContext) -> Result<Term> {
    let [value] = args else {
        return Err(arity("not", "1", args.len()));
    };
    Ok(Term::truth(!value.is_truthy()))
}

fn op_emit(args: &[Term], ctx: &mut EvalContext) -> Result<Term> {
    for arg in args {
        let text = arg.to_string();
        ctx.output.emit(&text);
    }
    Ok(Term::Nil)
}

fn op_gensym(args: &[Term], ctx: &mut EvalContext) -> Result<Term> {
    match args {
        [] => Ok(ctx.gensym.fresh()),
        [base] => {
            let name = match base {
                Term::Symbol(s) => s.as_str(),
                Term::String(s) => s.as_str(),
                other => {
                    return Err(MantraError::TypeMismatch {
                        operation: "gensym".to_string(),
                        expected: "a symbol or string base name".to_string(),
                        actual: other.to_string(),
                    })
                }
            };
            Ok(ctx.gensym.fresh_named(name))
        }
        _ => Err(arity("gensym", "0 or 1", args.len())),
    }
}

fn arity(op: &str, expected: &str, found: usize) -> MantraError {
    MantraError::Arity {
        callee: op.to_string(),
        expected: expected.to_string(),
        found,
    }
}
