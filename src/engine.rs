//! Engine façade: one place that owns the macro registry, the native
//! operation registry, the session name generator, and the resource limits,
//! and exposes the core entry points — register, expand, evaluate.
//!
//! Registries are built once here and passed by reference into every stage;
//! no stage constructs a hidden local registry. The registry may be mutated
//! only between top-level expansions: a failure while expanding or
//! evaluating one form aborts that form alone and leaves the registry and
//! all previously produced results untouched.

use crate::errors::{MantraError, Result};
use crate::gensym::GensymSession;
use crate::macros::{
    expander, ExpansionContext, ExpansionStep, MacroDefinition, MacroRegistry, ParamSpec,
    DEFAULT_MAX_EXPANSION_DEPTH,
};
use crate::runtime::{
    build_default_op_registry, evaluate, Environment, EvalContext, NullSink, OpRegistry,
    OutputSink, DEFAULT_MAX_EVAL_DEPTH,
};
use crate::term::Term;

pub struct Engine {
    macros: MacroRegistry,
    ops: OpRegistry,
    gensym: GensymSession,
    max_expansion_depth: usize,
    max_eval_depth: usize,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// An engine with the standard operations registered and default limits.
    pub fn new() -> Self {
        Engine {
            macros: MacroRegistry::new(),
            ops: build_default_op_registry(),
            gensym: GensymSession::new(),
            max_expansion_depth: DEFAULT_MAX_EXPANSION_DEPTH,
            max_eval_depth: DEFAULT_MAX_EVAL_DEPTH,
        }
    }

    pub fn with_max_expansion_depth(mut self, limit: usize) -> Self {
        self.max_expansion_depth = limit;
        self
    }

    pub fn with_max_eval_depth(mut self, limit: usize) -> Self {
        self.max_eval_depth = limit;
        self
    }

    pub fn macros(&self) -> &MacroRegistry {
        &self.macros
    }

    pub fn ops_mut(&mut self) -> &mut OpRegistry {
        &mut self.ops
    }

    pub fn gensym(&self) -> &GensymSession {
        &self.gensym
    }

    /// Registers (or replaces) a macro. The body is a sequence of terms
    /// evaluated at expansion time; the last result is the replacement term.
    pub fn register_macro(
        &mut self,
        name: impl Into<String>,
        params: ParamSpec,
        body: Vec<Term>,
    ) -> Option<MacroDefinition> {
        self.macros.register(MacroDefinition::new(name, params, body))
    }

    pub fn unregister_macro(&mut self, name: &str) -> Option<MacroDefinition> {
        self.macros.unregister(name)
    }

    fn expansion_context(&self) -> ExpansionContext<'_> {
        let mut ctx = ExpansionContext::new(&self.macros, &self.ops, &self.gensym);
        ctx.max_depth = self.max_expansion_depth;
        ctx
    }

    /// One rewrite of the outer form; non-macro forms come back unchanged.
    pub fn expand_one(&self, form: &Term) -> Result<Term> {
        expander::expand_one(form, &mut self.expansion_context())
    }

    /// Full expansion to a macro-free term.
    pub fn expand_full(&self, form: &Term) -> Result<Term> {
        expander::expand_full(form, &mut self.expansion_context())
    }

    /// Full expansion plus the ordered trace of every rewrite performed.
    pub fn expand_full_traced(&self, form: &Term) -> Result<(Term, Vec<ExpansionStep>)> {
        let mut ctx = self.expansion_context();
        let expanded = expander::expand_full(form, &mut ctx)?;
        Ok((expanded, ctx.trace))
    }

    /// Diagnostic alias for [`Engine::expand_one`]: inspection without
    /// evaluation. Fresh names may differ between repeated inspections.
    pub fn macroexpand_1(&self, form: &Term) -> Result<Term> {
        self.expand_one(form)
    }

    /// Diagnostic alias for [`Engine::expand_full`].
    pub fn macroexpand(&self, form: &Term) -> Result<Term> {
        self.expand_full(form)
    }

    /// Expands `form` fully, then evaluates the result in a fresh root
    /// environment, writing any output through `output`.
    pub fn evaluate(&self, form: &Term, output: &mut dyn OutputSink) -> Result<Term> {
        let expanded = self.expand_full(form)?;
        self.eval_expanded(&expanded, output)
    }

    /// Evaluates a term assumed to be fully expanded already.
    pub fn eval_expanded(&self, form: &Term, output: &mut dyn OutputSink) -> Result<Term> {
        let mut ctx = EvalContext::new(
            Environment::root(),
            &self.ops,
            &self.gensym,
            output,
            self.max_eval_depth,
        );
        evaluate(form, &mut ctx).map_err(MantraError::surface_jump)
    }

    /// Convenience: evaluate with output discarded.
    pub fn run(&self, form: &Term) -> Result<Term> {
        self.evaluate(form, &mut NullSink)
    }
}
