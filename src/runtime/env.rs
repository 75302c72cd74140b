//! Lexical environments: a stack of symbol → term frames.
//!
//! A frame is owned by the binding construct that pushed it and discarded
//! when that construct's dynamic extent ends. Lookup and assignment walk
//! outward from the innermost frame, which gives shadowing.

use std::collections::HashMap;

use crate::errors::{MantraError, Result};
use crate::term::Term;

#[derive(Debug, Clone, Default)]
pub struct Environment {
    frames: Vec<HashMap<String, Term>>,
}

impl Environment {
    /// An empty environment with a single base frame.
    pub fn new() -> Self {
        Environment {
            frames: vec![HashMap::new()],
        }
    }

    /// The root runtime environment. `t` names the canonical truth atom and
    /// `nil` the empty marker, so both are writable in source position.
    pub fn root() -> Self {
        let mut env = Self::new();
        env.define("t", Term::truth(true));
        env.define("nil", Term::Nil);
        env
    }

    /// A one-frame environment seeded with `bindings`; used for the
    /// expansion-time environment a macro body runs in.
    pub fn from_bindings(bindings: HashMap<String, Term>) -> Self {
        Environment {
            frames: vec![bindings],
        }
    }

    pub fn push_frame(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub fn pop_frame(&mut self) {
        debug_assert!(self.frames.len() > 1, "cannot pop the base frame");
        self.frames.pop();
    }

    /// Defines (or redefines) a binding in the innermost frame.
    pub fn define(&mut self, name: impl Into<String>, value: Term) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.into(), value);
        }
    }

    /// Walks outward through enclosing frames for `name`.
    pub fn lookup(&self, name: &str) -> Option<&Term> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    /// Mutates the nearest enclosing binding of `name`. Fails if no frame
    /// defines it — assignment never creates bindings.
    pub fn assign(&mut self, name: &str, value: Term) -> Result<()> {
        for frame in self.frames.iter_mut().rev() {
            if let Some(slot) = frame.get_mut(name) {
                *slot = value;
                return Ok(());
            }
        }
        Err(MantraError::UnboundVariable {
            symbol: name.to_string(),
        })
    }
}
