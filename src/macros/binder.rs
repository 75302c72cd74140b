//! Destructuring binder: matches a macro call's unevaluated argument terms
//! against the macro's parameter specification.
//!
//! This is the defining difference from ordinary application — every bound
//! value is a term, never an evaluated value. Required parameters consume
//! one argument each; optionals default to the empty marker; a rest
//! parameter takes whatever remains as one proper sequence. A structural dot
//! in the call form is only legal when the rest parameter is marked
//! `absorbs_tail`, in which case the dotted forms join the rest binding and
//! the macro body sees the complete ordered body.

use std::collections::HashMap;

use crate::errors::{MantraError, Result};
use crate::macros::definition::ParamSpec;
use crate::term::Term;

/// Binds `args` (the call items after the head) and the call's optional
/// dotted tail against `spec`, producing the expansion-time bindings.
pub fn bind(
    macro_name: &str,
    spec: &ParamSpec,
    args: &[Term],
    call_tail: Option<&Term>,
) -> Result<HashMap<String, Term>> {
    if args.len() < spec.required.len() {
        return Err(MantraError::Arity {
            callee: macro_name.to_string(),
            expected: spec.arity_description(),
            found: args.len(),
        });
    }

    let mut bindings = HashMap::new();
    for (name, value) in spec.required.iter().zip(args) {
        bindings.insert(name.clone(), value.clone());
    }

    let mut idx = spec.required.len();
    for name in &spec.optional {
        let value = args.get(idx).cloned().unwrap_or(Term::Nil);
        if idx < args.len() {
            idx += 1;
        }
        bindings.insert(name.clone(), value);
    }

    let mut remainder: Vec<Term> = args[idx..].to_vec();

    match (&spec.rest, call_tail) {
        (Some(rest), tail) => {
            if let Some(tail_term) = tail {
                if !rest.absorbs_tail {
                    return Err(MantraError::MalformedForm {
                        construct: format!("call to macro '{}'", macro_name),
                        reason: "structural dot requires a body parameter".to_string(),
                    });
                }
                let Some((tail_items, None)) = tail_term.as_sequence() else {
                    return Err(MantraError::MalformedForm {
                        construct: format!("call to macro '{}'", macro_name),
                        reason: format!(
                            "dotted tail must be a proper sequence of forms, got {}",
                            tail_term
                        ),
                    });
                };
                remainder.extend(tail_items.iter().cloned());
            }
            bindings.insert(rest.name.clone(), Term::list(remainder));
        }
        (None, Some(_)) => {
            return Err(MantraError::MalformedForm {
                construct: format!("call to macro '{}'", macro_name),
                reason: "structural dot requires a body parameter".to_string(),
            });
        }
        (None, None) => {
            if !remainder.is_empty() {
                return Err(MantraError::Arity {
                    callee: macro_name.to_string(),
                    expected: spec.arity_description(),
                    found: args.len(),
                });
            }
        }
    }

    Ok(bindings)
}
