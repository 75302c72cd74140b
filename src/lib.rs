//! # Mantra
//!
//! A macro-expansion and evaluation engine for a homoiconic, list-based
//! intermediate representation. Code arrives as [`term::Term`] trees (an
//! external reader produces them; an external printer consumes them), macros
//! rewrite macro-headed forms into replacement terms before any evaluation
//! happens, and a minimal evaluator runs the fully-expanded result.
//!
//! Hygiene is manual: [`gensym::GensymSession`] is the only
//! capture-avoidance mechanism, and macro authors must invoke it themselves.

pub use crate::errors::{MantraError, Result};

pub mod engine;
pub mod errors;
pub mod gensym;
pub mod macros;
pub mod runtime;
pub mod term;

pub use engine::Engine;
pub use term::Term;
