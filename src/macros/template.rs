//! Quasiquote template expansion.
//!
//! A template is a term containing substitution markers: `(unquote e)`
//! replaces the marker with the result of evaluating `e` in the active
//! environment, and `(unquote-splicing e)` inlines the elements of the
//! resolved sequence in place. Everything else passes through verbatim —
//! element order and structural shape are preserved exactly, with no
//! reordering and no deduplication.
//!
//! One quoting level only: a `quasiquote` inside a template is rejected with
//! [`MantraError::NestedTemplate`]. A spliced value must be a proper
//! sequence unless it lands in the final element position of a proper
//! enclosing sequence, where an improper sequence (or a bare atom)
//! becomes the result's dotted tail.

use crate::errors::{MantraError, Result};
use crate::runtime::eval::{self, EvalContext};
use crate::term::Term;

pub const UNQUOTE: &str = "unquote";
pub const UNQUOTE_SPLICING: &str = "unquote-splicing";
pub const QUASIQUOTE: &str = "quasiquote";

/// Expands `template` against the environment carried by `ctx`, producing
/// the concrete replacement term.
pub fn expand_template(template: &Term, ctx: &mut EvalContext) -> Result<Term> {
    if let Some(operand) = marker_operand(template, UNQUOTE)? {
        return eval::evaluate(operand, ctx);
    }
    if marker_operand(template, QUASIQUOTE)?.is_some() {
        return Err(MantraError::NestedTemplate);
    }
    if marker_operand(template, UNQUOTE_SPLICING)?.is_some() {
        return Err(MantraError::MalformedForm {
            construct: UNQUOTE_SPLICING.to_string(),
            reason: "splice marker is only meaningful as a sequence element".to_string(),
        });
    }

    let Term::Sequence { items, tail } = template else {
        return Ok(template.clone());
    };

    let mut out_items: Vec<Term> = Vec::with_capacity(items.len());
    let mut out_tail: Option<Term> = None;

    for (index, element) in items.iter().enumerate() {
        let is_final = index + 1 == items.len() && tail.is_none();

        let Some(operand) = marker_operand(element, UNQUOTE_SPLICING)? else {
            out_items.push(expand_template(element, ctx)?);
            continue;
        };

        let value = eval::evaluate(operand, ctx)?;
        match value.as_sequence() {
            Some((spliced, None)) => out_items.extend(spliced.iter().cloned()),
            Some((spliced, Some(improper_tail))) if is_final => {
                out_items.extend(spliced.iter().cloned());
                out_tail = Some(improper_tail.clone());
            }
            None if is_final => out_tail = Some(value),
            _ => {
                return Err(MantraError::ImproperSplice {
                    operand: value.to_string(),
                })
            }
        }
    }

    if let Some(template_tail) = tail {
        out_tail = Some(expand_template(template_tail, ctx)?);
    }

    Ok(Term::improper(out_items, out_tail.unwrap_or(Term::Nil)))
}

/// If `term` is a `(marker operand)` form, returns the operand. A marker
/// with the wrong operand count is malformed rather than silently treated as
/// data.
fn marker_operand<'t>(term: &'t Term, marker: &str) -> Result<Option<&'t Term>> {
    let Term::Sequence { items, tail: None } = term else {
        return Ok(None);
    };
    if items.first().and_then(Term::as_symbol) != Some(marker) {
        return Ok(None);
    }
    match &items[1..] {
        [operand] => Ok(Some(operand)),
        rest => Err(MantraError::MalformedForm {
            construct: marker.to_string(),
            reason: format!("expected exactly one operand, got {}", rest.len()),
        }),
    }
}
