//! Evaluator for fully-expanded terms.
//!
//! Evaluation is a plain recursive computation over [`Term`]s: atoms
//! self-evaluate (symbols resolve through the environment), and sequences
//! dispatch on their head symbol — first against the fixed set of special
//! forms, then against the native operation registry as ordinary
//! application. Values *are* terms; the same machinery therefore evaluates
//! macro bodies at expansion time against an expansion-time environment.
//!
//! `go` performs its non-local transfer by raising the internal
//! [`MantraError::JumpSignal`], which the innermost `tagbody` intercepts.
//! This keeps labeled jumps an explicit state machine rather than a host
//! `goto`.

use std::collections::HashMap;

use crate::errors::{MantraError, Result};
use crate::gensym::GensymSession;
use crate::macros::template;
use crate::runtime::env::Environment;
use crate::runtime::ops::{OpRegistry, OutputSink};
use crate::term::Term;

/// Default recursion limit for evaluation.
pub const DEFAULT_MAX_EVAL_DEPTH: usize = 1000;

/// The context threaded through a single evaluation: the live environment,
/// the operation registry, the session's name generator, the output sink,
/// and the recursion budget.
pub struct EvalContext<'a> {
    pub env: Environment,
    pub ops: &'a OpRegistry,
    pub gensym: &'a GensymSession,
    pub output: &'a mut dyn OutputSink,
    pub depth: usize,
    pub max_depth: usize,
}

impl<'a> EvalContext<'a> {
    pub fn new(
        env: Environment,
        ops: &'a OpRegistry,
        gensym: &'a GensymSession,
        output: &'a mut dyn OutputSink,
        max_depth: usize,
    ) -> Self {
        EvalContext {
            env,
            ops,
            gensym,
            output,
            depth: 0,
            max_depth,
        }
    }
}

/// Evaluates one term, enforcing the recursion limit.
pub fn evaluate(term: &Term, ctx: &mut EvalContext) -> Result<Term> {
    if ctx.depth >= ctx.max_depth {
        return Err(MantraError::EvalDepthExceeded {
            limit: ctx.max_depth,
        });
    }
    ctx.depth += 1;
    let result = eval_term(term, ctx);
    ctx.depth -= 1;
    result
}

/// Evaluates a body of forms in order for effect, returning the last value
/// (the empty marker for an empty body). This is `do` semantics, shared by
/// `let` bodies and macro bodies.
pub fn evaluate_body(forms: &[Term], ctx: &mut EvalContext) -> Result<Term> {
    let mut last = Term::Nil;
    for form in forms {
        last = evaluate(form, ctx)?;
    }
    Ok(last)
}

fn eval_term(term: &Term, ctx: &mut EvalContext) -> Result<Term> {
    match term {
        Term::Nil | Term::Number(_) | Term::String(_) => Ok(term.clone()),
        Term::Symbol(name) => {
            ctx.env
                .lookup(name)
                .cloned()
                .ok_or_else(|| MantraError::UnboundVariable {
                    symbol: name.clone(),
                })
        }
        Term::Sequence { items, tail } => {
            if tail.is_some() {
                return Err(MantraError::MalformedForm {
                    construct: "application".to_string(),
                    reason: format!("cannot evaluate an improper sequence: {}", term),
                });
            }
            eval_sequence(items, ctx)
        }
    }
}

fn eval_sequence(items: &[Term], ctx: &mut EvalContext) -> Result<Term> {
    let Some(head) = items.first() else {
        return Ok(Term::Nil);
    };
    let args = &items[1..];
    let Some(name) = head.as_symbol() else {
        return Err(MantraError::MalformedForm {
            construct: "application".to_string(),
            reason: format!("operator position must be a symbol, got {}", head),
        });
    };

    match name {
        "quote" => {
            let [operand] = args else {
                return Err(malformed("quote", "expected exactly one operand", args));
            };
            Ok(operand.clone())
        }
        "quasiquote" => {
            let [operand] = args else {
                return Err(malformed(
                    "quasiquote",
                    "expected exactly one template operand",
                    args,
                ));
            };
            template::expand_template(operand, ctx)
        }
        "if" => eval_if(args, ctx),
        "and" => eval_and(args, ctx),
        "or" => eval_or(args, ctx),
        "do" => evaluate_body(args, ctx),
        "let" => eval_let(args, ctx),
        "set!" => eval_assignment(args, ctx),
        "tagbody" => eval_tagbody(args, ctx),
        "go" => {
            let [label] = args else {
                return Err(malformed("go", "expected exactly one label", args));
            };
            let Some(label) = label.as_symbol() else {
                return Err(malformed("go", "label must be a symbol", args));
            };
            Err(MantraError::JumpSignal {
                label: label.to_string(),
            })
        }
        _ => eval_application(name, args, ctx),
    }
}

/// Exactly one branch is evaluated; the non-taken branch must not produce
/// side effects.
fn eval_if(args: &[Term], ctx: &mut EvalContext) -> Result<Term> {
    let [predicate, then_branch, else_branch] = args else {
        return Err(malformed(
            "if",
            "expected predicate, then branch, and else branch",
            args,
        ));
    };
    let test = evaluate(predicate, ctx)?;
    let branch = if test.is_truthy() {
        then_branch
    } else {
        else_branch
    };
    evaluate(branch, ctx)
}

/// Left to right; the first falsy result is returned without evaluating the
/// remaining operands. `(and)` is the truthy identity.
fn eval_and(args: &[Term], ctx: &mut EvalContext) -> Result<Term> {
    let mut last = Term::truth(true);
    for operand in args {
        last = evaluate(operand, ctx)?;
        if !last.is_truthy() {
            return Ok(last);
        }
    }
    Ok(last)
}

/// Left to right; the first truthy result is returned without evaluating the
/// remaining operands. `(or)` is the falsy marker.
fn eval_or(args: &[Term], ctx: &mut EvalContext) -> Result<Term> {
    let mut last = Term::Nil;
    for operand in args {
        last = evaluate(operand, ctx)?;
        if last.is_truthy() {
            return Ok(last);
        }
    }
    Ok(last)
}

/// Parallel binding: all initializers are evaluated in the enclosing
/// environment before the new frame exists, so no initializer can observe a
/// sibling's binding.
fn eval_let(args: &[Term], ctx: &mut EvalContext) -> Result<Term> {
    let Some((bindings_form, body)) = args.split_first() else {
        return Err(malformed("let", "expected a bindings form", args));
    };
    let Some((pairs, None)) = bindings_form.as_sequence() else {
        return Err(malformed(
            "let",
            "bindings must be a proper sequence of (name initializer) pairs",
            args,
        ));
    };

    let mut evaluated = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let Some(([name_term, initializer], None)) = pair.as_sequence() else {
            return Err(malformed(
                "let",
                "each binding must be a proper (name initializer) pair",
                args,
            ));
        };
        let Some(name) = name_term.as_symbol() else {
            return Err(malformed("let", "binding name must be a symbol", args));
        };
        evaluated.push((name.to_string(), evaluate(initializer, ctx)?));
    }

    ctx.env.push_frame();
    for (name, value) in evaluated {
        ctx.env.define(name, value);
    }
    let result = evaluate_body(body, ctx);
    ctx.env.pop_frame();
    result
}

fn eval_assignment(args: &[Term], ctx: &mut EvalContext) -> Result<Term> {
    let [target, value_form] = args else {
        return Err(malformed("set!", "expected a target and a value", args));
    };
    let Some(name) = target.as_symbol() else {
        return Err(malformed("set!", "target must be a symbol", args));
    };
    let value = evaluate(value_form, ctx)?;
    ctx.env.assign(name, value.clone())?;
    Ok(value)
}

/// Labeled block: bare symbols are label markers, everything else is
/// evaluated for effect. A jump signal raised anywhere inside the current
/// form is resolved against this block's labels only; an unknown label is an
/// error, per the same-block jump contract. Falling off the end yields the
/// empty marker.
fn eval_tagbody(forms: &[Term], ctx: &mut EvalContext) -> Result<Term> {
    let labels: HashMap<&str, usize> = forms
        .iter()
        .enumerate()
        .filter_map(|(index, form)| form.as_symbol().map(|label| (label, index)))
        .collect();

    let mut pc = 0;
    while pc < forms.len() {
        let form = &forms[pc];
        if form.as_symbol().is_some() {
            pc += 1;
            continue;
        }
        match evaluate(form, ctx) {
            Ok(_) => pc += 1,
            Err(MantraError::JumpSignal { label }) => match labels.get(label.as_str()) {
                Some(&target) => pc = target + 1,
                None => return Err(MantraError::UndefinedLabel { label }),
            },
            Err(other) => return Err(other),
        }
    }
    Ok(Term::Nil)
}

/// Ordinary application: every argument is evaluated left to right, then the
/// named operation is invoked with the results.
fn eval_application(name: &str, args: &[Term], ctx: &mut EvalContext) -> Result<Term> {
    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        values.push(evaluate(arg, ctx)?);
    }
    let Some(func) = ctx.ops.get(name).copied() else {
        return Err(MantraError::UndefinedOperation {
            name: name.to_string(),
        });
    };
    func(&values, ctx)
}

fn malformed(construct: &str, reason: &str, args: &[Term]) -> MantraError {
    MantraError::MalformedForm {
        construct: construct.to_string(),
        reason: format!("{} (got {} operand(s))", reason, args.len()),
    }
}
