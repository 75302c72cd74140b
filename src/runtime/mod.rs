//! Runtime: lexical environments, native operations, and the evaluator for
//! fully-expanded terms.

pub mod env;
pub mod eval;
pub mod ops;

pub use env::Environment;
pub use eval::{evaluate, evaluate_body, EvalContext, DEFAULT_MAX_EVAL_DEPTH};
pub use ops::{build_default_op_registry, NativeFn, NullSink, OpRegistry, OutputSink, RecordingSink};
