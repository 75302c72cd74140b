//! The term model: code represented as data.
//!
//! A [`Term`] is either an atom (symbol, number, string, or the distinguished
//! empty-sequence marker [`Term::Nil`]) or an ordered sequence with an
//! optional improper ("dotted") tail. Terms are immutable once constructed;
//! every pipeline stage produces new terms rather than mutating existing
//! ones.
//!
//! Construction validates nothing beyond structural shape. The one
//! normalization performed is that an explicit `Nil` tail collapses to a
//! proper sequence, so a proper sequence always has `tail: None`. Sequence
//! tails are deliberately *not* flattened: `(a b . (c d))` keeps its dotted
//! shape, which is what lets the destructuring binder see a structural dot
//! in a macro call.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A tagged code-as-data value.
///
/// Equality is structural, term-by-term and order-sensitive (derived
/// `PartialEq`). Truthiness follows the engine's convention: only
/// [`Term::Nil`] is falsy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Term {
    /// The empty-sequence marker; the only falsy value.
    Nil,
    Symbol(String),
    Number(i64),
    String(String),
    /// An ordered sequence. `tail: None` means the sequence is proper and
    /// terminates in the empty marker; `Some(t)` is an improper tail, which
    /// may be any non-Nil atom or another sequence.
    Sequence {
        items: Vec<Term>,
        tail: Option<Box<Term>>,
    },
}

/// The canonical truthy atom returned by predicates.
pub const TRUE_SYMBOL: &str = "t";

impl Term {
    pub fn symbol(name: impl Into<String>) -> Self {
        Term::Symbol(name.into())
    }

    pub fn number(n: i64) -> Self {
        Term::Number(n)
    }

    pub fn string(s: impl Into<String>) -> Self {
        Term::String(s.into())
    }

    /// A proper sequence. An empty item list yields [`Term::Nil`], keeping
    /// the invariant that a proper sequence terminates in the empty marker.
    pub fn list(items: Vec<Term>) -> Self {
        if items.is_empty() {
            Term::Nil
        } else {
            Term::Sequence { items, tail: None }
        }
    }

    /// A sequence with an explicit tail. A `Nil` tail collapses to a proper
    /// sequence, and a tail with no items in front of it is just the tail.
    pub fn improper(items: Vec<Term>, tail: Term) -> Self {
        if items.is_empty() {
            return tail;
        }
        match tail {
            Term::Nil => Term::list(items),
            other => Term::Sequence {
                items,
                tail: Some(Box::new(other)),
            },
        }
    }

    /// A call form: `(head args...)`.
    pub fn call(head: impl Into<String>, args: Vec<Term>) -> Self {
        let mut items = vec![Term::symbol(head)];
        items.extend(args);
        Term::list(items)
    }

    /// The canonical truth encoding: `t` for true, `Nil` for false.
    pub fn truth(value: bool) -> Self {
        if value {
            Term::symbol(TRUE_SYMBOL)
        } else {
            Term::Nil
        }
    }

    /// Only `Nil` is falsy; every other term, atom or sequence, is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Term::Nil)
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Term::Nil)
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Term::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            Term::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Items and tail of a sequence. `Nil` reads as the empty proper
    /// sequence.
    pub fn as_sequence(&self) -> Option<(&[Term], Option<&Term>)> {
        match self {
            Term::Nil => Some((&[], None)),
            Term::Sequence { items, tail } => Some((items, tail.as_deref())),
            _ => None,
        }
    }

    /// True for `Nil` and for sequences with no dotted tail.
    pub fn is_proper_sequence(&self) -> bool {
        matches!(self, Term::Nil | Term::Sequence { tail: None, .. })
    }

    /// The head symbol of a non-empty sequence, if it has one. This is what
    /// the expander and evaluator dispatch on.
    pub fn head_symbol(&self) -> Option<&str> {
        match self {
            Term::Sequence { items, .. } => items.first().and_then(Term::as_symbol),
            _ => None,
        }
    }

    /// Every symbol that appears literally anywhere in the term, in
    /// depth-first order. Used by tests to check gensym non-collision.
    pub fn symbols(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_symbols(&mut out);
        out
    }

    fn collect_symbols<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Term::Symbol(s) => out.push(s),
            Term::Sequence { items, tail } => {
                for item in items {
                    item.collect_symbols(out);
                }
                if let Some(t) = tail {
                    t.collect_symbols(out);
                }
            }
            _ => {}
        }
    }
}

impl fmt::Display for Term {
    /// Renders the conventional parenthesized form. This is a debugging aid
    /// for errors and tests; the real printer is an external collaborator.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Nil => write!(f, "()"),
            Term::Symbol(s) => write!(f, "{}", s),
            Term::Number(n) => write!(f, "{}", n),
            Term::String(s) => write!(f, "\"{}\"", s),
            Term::Sequence { items, tail } => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                if let Some(t) = tail {
                    write!(f, " . {}", t)?;
                }
                write!(f, ")")
            }
        }
    }
}
