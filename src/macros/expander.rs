//! The expansion driver.
//!
//! [`expand_one`] performs a single rewrite of a macro-headed form;
//! [`expand_full`] drives the head to a fixed point and then recurses into
//! subterms — but only at positions the surrounding special form evaluates,
//! consulting a fixed evaluation-position table. The body of a quoting form
//! is data and is left untouched; both branches of a conditional are
//! expanded, because either may run.
//!
//! A depth counter bounds the head-rewrite chain, turning a runaway
//! recursive macro definition into [`MantraError::ExpansionDepthExceeded`]
//! instead of unbounded recursion. Each rewrite is recorded in an expansion
//! trace for inspection.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::errors::{MantraError, Result};
use crate::gensym::GensymSession;
use crate::macros::binder;
use crate::macros::registry::MacroRegistry;
use crate::runtime::env::Environment;
use crate::runtime::eval::{self, EvalContext, DEFAULT_MAX_EVAL_DEPTH};
use crate::runtime::ops::{NullSink, OpRegistry};
use crate::term::Term;

/// Default bound on successive head rewrites along one expansion path.
pub const DEFAULT_MAX_EXPANSION_DEPTH: usize = 128;

/// One recorded rewrite: which macro fired, on what input, producing what
/// output.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpansionStep {
    pub macro_name: String,
    pub input: Term,
    pub output: Term,
}

/// Everything an expansion session needs: the (read-only) macro registry,
/// the native operations and name generator macro bodies may call, the depth
/// bound, and the trace accumulated so far.
pub struct ExpansionContext<'a> {
    pub macros: &'a MacroRegistry,
    pub ops: &'a OpRegistry,
    pub gensym: &'a GensymSession,
    pub max_depth: usize,
    pub trace: Vec<ExpansionStep>,
}

impl<'a> ExpansionContext<'a> {
    pub fn new(macros: &'a MacroRegistry, ops: &'a OpRegistry, gensym: &'a GensymSession) -> Self {
        ExpansionContext {
            macros,
            ops,
            gensym,
            max_depth: DEFAULT_MAX_EXPANSION_DEPTH,
            trace: Vec::new(),
        }
    }
}

/// How the expander treats the argument positions of a known special form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PositionRule {
    /// No argument position is evaluated; the body is data and must be left
    /// untouched.
    Opaque,
    /// Every argument position is evaluated (conditionals expand both
    /// branches — which one runs is a runtime decision).
    AllArguments,
    /// `let`: binding names are literal, initializers and body are
    /// evaluation positions.
    LetLike,
    /// `set!`: the target is literal, the value is an evaluation position.
    AssignmentLike,
}

/// Fixed evaluation-position table, reviewed whenever a special form is
/// added. Forms not listed here are ordinary applications, which expand
/// every subterm.
static EVALUATION_POSITIONS: Lazy<HashMap<&'static str, PositionRule>> = Lazy::new(|| {
    HashMap::from([
        ("quote", PositionRule::Opaque),
        ("quasiquote", PositionRule::Opaque),
        ("go", PositionRule::Opaque),
        ("if", PositionRule::AllArguments),
        ("and", PositionRule::AllArguments),
        ("or", PositionRule::AllArguments),
        ("do", PositionRule::AllArguments),
        ("tagbody", PositionRule::AllArguments),
        ("let", PositionRule::LetLike),
        ("set!", PositionRule::AssignmentLike),
    ])
});

/// True if `form` is a sequence whose head symbol names a registered macro.
pub fn is_macro_call(form: &Term, macros: &MacroRegistry) -> bool {
    form.head_symbol().is_some_and(|name| macros.contains(name))
}

/// Applies at most one macro rewrite to the outer form. Non-macro forms are
/// returned unchanged; the result of a rewrite is *not* recursed into.
pub fn expand_one(form: &Term, ctx: &mut ExpansionContext) -> Result<Term> {
    if is_macro_call(form, ctx.macros) {
        apply_macro(form, ctx)
    } else {
        Ok(form.clone())
    }
}

/// Expands `form` completely: the outer head is rewritten to a fixed point,
/// then subterms are expanded according to the evaluation-position rules of
/// the resulting form. The output contains no macro-headed form in any
/// evaluation position.
pub fn expand_full(form: &Term, ctx: &mut ExpansionContext) -> Result<Term> {
    expand_at(form, ctx)
}

fn expand_at(form: &Term, ctx: &mut ExpansionContext) -> Result<Term> {
    let mut current = form.clone();
    // Counts rewrites along this head's chain only; structural nesting does
    // not consume the budget.
    let mut rewrites = 0;
    while is_macro_call(&current, ctx.macros) {
        if rewrites >= ctx.max_depth {
            return Err(MantraError::ExpansionDepthExceeded {
                limit: ctx.max_depth,
            });
        }
        current = apply_macro(&current, ctx)?;
        rewrites += 1;
    }

    let Term::Sequence { items, tail } = &current else {
        return Ok(current);
    };

    let rule = items
        .first()
        .and_then(Term::as_symbol)
        .and_then(|name| EVALUATION_POSITIONS.get(name))
        .copied()
        // Ordinary application: every subterm is an evaluation position.
        .unwrap_or(PositionRule::AllArguments);

    match rule {
        PositionRule::Opaque => Ok(current),
        PositionRule::AllArguments => {
            let expanded = items
                .iter()
                .map(|item| expand_at(item, ctx))
                .collect::<Result<Vec<_>>>()?;
            let expanded_tail = match tail {
                Some(t) => expand_at(t, ctx)?,
                None => Term::Nil,
            };
            Ok(Term::improper(expanded, expanded_tail))
        }
        PositionRule::LetLike => expand_let(items, ctx),
        PositionRule::AssignmentLike => {
            let mut expanded: Vec<Term> = items.iter().take(2).cloned().collect();
            for value_form in items.iter().skip(2) {
                expanded.push(expand_at(value_form, ctx)?);
            }
            Ok(Term::list(expanded))
        }
    }
}

/// `let`: binding names stay literal, initializers and body expand. A
/// structurally invalid bindings form is passed through for the evaluator to
/// reject.
fn expand_let(items: &[Term], ctx: &mut ExpansionContext) -> Result<Term> {
    let mut expanded = vec![items[0].clone()];

    if let Some(bindings_form) = items.get(1) {
        match bindings_form.as_sequence() {
            Some((pairs, None)) => {
                let mut new_pairs = Vec::with_capacity(pairs.len());
                for pair in pairs {
                    match pair.as_sequence() {
                        Some(([name, initializer], None)) => {
                            new_pairs.push(Term::list(vec![
                                name.clone(),
                                expand_at(initializer, ctx)?,
                            ]));
                        }
                        _ => new_pairs.push(pair.clone()),
                    }
                }
                expanded.push(Term::list(new_pairs));
            }
            _ => expanded.push(bindings_form.clone()),
        }
    }

    for body_form in items.iter().skip(2) {
        expanded.push(expand_at(body_form, ctx)?);
    }
    Ok(Term::list(expanded))
}

/// Rewrites one macro call: binds the unevaluated arguments against the
/// parameter specification, evaluates the macro body in that one-frame
/// expansion-time environment, and yields the last body value as the
/// replacement term. The body runs against a null sink, so expansion is
/// observably pure apart from gensym-counter advancement.
fn apply_macro(call: &Term, ctx: &mut ExpansionContext) -> Result<Term> {
    let Term::Sequence { items, tail } = call else {
        return Ok(call.clone());
    };
    // is_macro_call guarantees a symbol head.
    let name = items[0].as_symbol().unwrap_or_default().to_string();
    let Some(def) = ctx.macros.lookup(&name).cloned() else {
        return Ok(call.clone());
    };

    let bindings = binder::bind(&name, &def.params, &items[1..], tail.as_deref())?;
    let mut sink = NullSink;
    let mut eval_ctx = EvalContext::new(
        Environment::from_bindings(bindings),
        ctx.ops,
        ctx.gensym,
        &mut sink,
        DEFAULT_MAX_EVAL_DEPTH,
    );
    let replacement =
        eval::evaluate_body(&def.body, &mut eval_ctx).map_err(MantraError::surface_jump)?;

    ctx.trace.push(ExpansionStep {
        macro_name: name,
        input: call.clone(),
        output: replacement.clone(),
    });
    Ok(replacement)
}

/// Diagnostic alias: one expansion step without evaluation.
pub fn macroexpand_1(form: &Term, ctx: &mut ExpansionContext) -> Result<Term> {
    expand_one(form, ctx)
}

/// Diagnostic alias: full expansion without evaluation. Repeated calls may
/// yield different fresh names, since the gensym counter still advances.
pub fn macroexpand(form: &Term, ctx: &mut ExpansionContext) -> Result<Term> {
    expand_full(form, ctx)
}
