//! The macro system: purely syntactic transformation of terms before
//! evaluation.
//!
//! Macros operate on unevaluated terms and have no access to runtime state.
//! The pipeline is: the [`binder`] destructures a call against the macro's
//! parameter specification, the macro body runs at expansion time in that
//! environment (typically building its replacement with a [`template`]),
//! and the [`expander`] drives rewriting to a fixed point with cycle
//! protection.

pub mod binder;
pub mod definition;
pub mod expander;
pub mod registry;
pub mod template;

pub use definition::{MacroDefinition, ParamSpec, RestParam};
pub use expander::{
    expand_full, expand_one, is_macro_call, macroexpand, macroexpand_1, ExpansionContext,
    ExpansionStep, DEFAULT_MAX_EXPANSION_DEPTH,
};
pub use registry::MacroRegistry;
pub use template::expand_template;
