//! Unified error type for the Mantra engine.
//!
//! Every stage of the pipeline (binding, template expansion, macro expansion,
//! evaluation) reports failures through [`MantraError`]. Errors are typed and
//! carry diagnostic codes; nothing is silently recovered. A failure aborts
//! the current top-level form only — the macro registry and any previously
//! produced results are unaffected.

use miette::Diagnostic;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MantraError>;

#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum MantraError {
    /// A call did not supply an acceptable number of arguments: a macro's
    /// required parameter was left unbound, arguments remained with no rest
    /// parameter to absorb them, or a native operation got the wrong count.
    #[error("{callee}: expected {expected} argument(s), got {found}")]
    #[diagnostic(
        code(mantra::bind::arity),
        help("check the callee's parameter specification against the call form")
    )]
    Arity {
        callee: String,
        expected: String,
        found: usize,
    },

    /// A splice marker resolved to something other than a proper sequence in
    /// non-final position.
    #[error("splice operand is not a proper sequence: {operand}")]
    #[diagnostic(
        code(mantra::template::improper_splice),
        help("an improper or atomic splice value is only permitted in the final element position")
    )]
    ImproperSplice { operand: String },

    /// A quasiquote template contained a second quoting level.
    #[error("nested quasiquote templates are not supported")]
    #[diagnostic(code(mantra::template::nested))]
    NestedTemplate,

    /// Macro rewriting did not reach a fixed point within the configured
    /// depth bound; almost always a self-recursive macro definition.
    #[error("macro expansion exceeded the depth limit of {limit}")]
    #[diagnostic(
        code(mantra::expand::depth),
        help("a macro is expanding into itself; raise the limit only if the recursion is genuine")
    )]
    ExpansionDepthExceeded { limit: usize },

    /// A `(go label)` named a label that its enclosing block does not define,
    /// or escaped every block.
    #[error("jump to undefined label '{label}'")]
    #[diagnostic(code(mantra::eval::undefined_label))]
    UndefinedLabel { label: String },

    /// A symbol was referenced or assigned with no binding in any enclosing
    /// frame.
    #[error("unbound variable '{symbol}'")]
    #[diagnostic(code(mantra::eval::unbound))]
    UnboundVariable { symbol: String },

    /// Application head named neither a special form nor a registered
    /// operation.
    #[error("undefined operation '{name}'")]
    #[diagnostic(code(mantra::eval::undefined_op))]
    UndefinedOperation { name: String },

    /// An operation received an operand of the wrong shape.
    #[error("{operation}: expected {expected}, got {actual}")]
    #[diagnostic(code(mantra::eval::type_mismatch))]
    TypeMismatch {
        operation: String,
        expected: String,
        actual: String,
    },

    /// A special form or macro definition was structurally invalid.
    #[error("malformed {construct}: {reason}")]
    #[diagnostic(code(mantra::eval::malformed))]
    MalformedForm { construct: String, reason: String },

    /// Integer arithmetic left the representable range.
    #[error("{operation}: integer overflow")]
    #[diagnostic(
        code(mantra::eval::overflow),
        help("numbers are 64-bit signed integers; the result does not fit")
    )]
    ArithmeticOverflow { operation: String },

    /// Runtime recursion limit reached while evaluating.
    #[error("evaluation exceeded the recursion limit of {limit}")]
    #[diagnostic(code(mantra::eval::depth))]
    EvalDepthExceeded { limit: usize },

    /// Internal control-transfer signal raised by `go` and intercepted by the
    /// innermost `tagbody`. An escaping jump is converted to
    /// [`MantraError::UndefinedLabel`] at the evaluation boundary.
    #[error("control transfer to label '{label}' escaped its block")]
    #[diagnostic(code(mantra::eval::jump_signal))]
    JumpSignal { label: String },
}

impl MantraError {
    /// True for the internal jump signal, which evaluation boundaries must
    /// translate rather than report.
    pub fn is_jump_signal(&self) -> bool {
        matches!(self, MantraError::JumpSignal { .. })
    }

    /// Converts an escaped jump signal into the user-visible error; leaves
    /// every other error untouched.
    pub fn surface_jump(self) -> Self {
        match self {
            MantraError::JumpSignal { label } => MantraError::UndefinedLabel { label },
            other => other,
        }
    }
}
