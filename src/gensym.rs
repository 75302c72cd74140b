//! Session-scoped generation of guaranteed-unique symbols.
//!
//! Hygiene in Mantra is manual: the engine never alpha-renames the symbols a
//! macro writes into its output. A macro author who needs a temporary binding
//! must ask the session for a fresh name via the `gensym` operation;
//! otherwise the template symbol can capture a caller's binding of the same
//! name. That hazard is part of the contract, not a bug.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::term::Term;

/// Prefix reserved for generated names. No legal source symbol may begin
/// with `#:`, which is what guarantees a fresh name never collides with a
/// symbol that appears literally in the input term tree.
pub const GENSYM_PREFIX: &str = "#:";

/// A process-wide-unique name source for one expansion session.
///
/// The counter is monotonic and never reset mid-session; resetting would
/// break the uniqueness guarantee. It is atomic, so a multi-threaded host
/// may share one session without extra locking, though distinct sessions
/// normally keep distinct counters.
#[derive(Debug, Default)]
pub struct GensymSession {
    counter: AtomicU64,
}

impl GensymSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a symbol distinct from every symbol this session has produced
    /// and from every legal source symbol.
    pub fn fresh(&self) -> Term {
        self.fresh_named("g")
    }

    /// Like [`GensymSession::fresh`], with a readable base name embedded in
    /// the generated symbol.
    pub fn fresh_named(&self, base: &str) -> Term {
        let id = self.counter.fetch_add(1, Ordering::SeqCst);
        Term::Symbol(format!("{}{}{}", GENSYM_PREFIX, base, id))
    }

    /// True if `name` was produced by some gensym session (it carries the
    /// reserved prefix).
    pub fn is_generated(name: &str) -> bool {
        name.starts_with(GENSYM_PREFIX)
    }
}
