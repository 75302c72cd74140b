//! Macro definitions and their parameter specifications.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::errors::{MantraError, Result};
use crate::term::Term;

/// The trailing parameter of a [`ParamSpec`].
///
/// A plain rest parameter captures the remaining ordinary arguments of a
/// call as one proper sequence. With `absorbs_tail` set it additionally
/// captures the forms behind a structural dot in the call, which is how a
/// macro takes an implicit-sequencing body (`(with-x a b . body-forms)`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestParam {
    pub name: String,
    pub absorbs_tail: bool,
}

/// Ordered parameter specification for a macro: required positionals, then
/// optional positionals (implicit default: the empty marker), then at most
/// one rest parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub required: Vec<String>,
    pub optional: Vec<String>,
    pub rest: Option<RestParam>,
}

impl ParamSpec {
    /// Builds a spec, rejecting duplicate parameter names.
    pub fn new(
        required: Vec<String>,
        optional: Vec<String>,
        rest: Option<RestParam>,
    ) -> Result<Self> {
        let mut seen = HashSet::new();
        let rest_name = rest.as_ref().map(|r| r.name.as_str());
        for name in required
            .iter()
            .chain(optional.iter())
            .map(String::as_str)
            .chain(rest_name)
        {
            if !seen.insert(name) {
                return Err(MantraError::MalformedForm {
                    construct: "parameter specification".to_string(),
                    reason: format!("duplicate parameter name '{}'", name),
                });
            }
        }
        Ok(ParamSpec {
            required,
            optional,
            rest,
        })
    }

    /// Required positionals only.
    pub fn positional(required: &[&str]) -> Result<Self> {
        Self::new(
            required.iter().map(|s| s.to_string()).collect(),
            Vec::new(),
            None,
        )
    }

    /// Required positionals plus a body parameter that absorbs the
    /// structural-dot tail.
    pub fn with_body(required: &[&str], body: &str) -> Result<Self> {
        Self::new(
            required.iter().map(|s| s.to_string()).collect(),
            Vec::new(),
            Some(RestParam {
                name: body.to_string(),
                absorbs_tail: true,
            }),
        )
    }

    /// Human-readable arity description used in error messages.
    pub fn arity_description(&self) -> String {
        match (self.optional.len(), &self.rest) {
            (0, None) => format!("{}", self.required.len()),
            (0, Some(_)) => format!("at least {}", self.required.len()),
            (opt, None) => format!(
                "{} to {}",
                self.required.len(),
                self.required.len() + opt
            ),
            (_, Some(_)) => format!("at least {}", self.required.len()),
        }
    }
}

/// A registered transformation: a name, a parameter specification, and a
/// body of terms evaluated at expansion time. The last body result is the
/// replacement term, returned unevaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroDefinition {
    pub name: String,
    pub params: ParamSpec,
    pub body: Vec<Term>,
}

impl MacroDefinition {
    pub fn new(name: impl Into<String>, params: ParamSpec, body: Vec<Term>) -> Self {
        MacroDefinition {
            name: name.into(),
            params,
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_parameter_names_are_rejected() {
        let err = ParamSpec::new(
            vec!["x".to_string()],
            vec!["x".to_string()],
            None,
        )
        .unwrap_err();
        assert!(matches!(err, MantraError::MalformedForm { .. }));
    }

    #[test]
    fn rest_name_participates_in_duplicate_check() {
        let err = ParamSpec::new(
            vec!["x".to_string()],
            vec![],
            Some(RestParam {
                name: "x".to_string(),
                absorbs_tail: false,
            }),
        )
        .unwrap_err();
        assert!(matches!(err, MantraError::MalformedForm { .. }));
    }

    #[test]
    fn arity_description_covers_optionals_and_rest() {
        let fixed = ParamSpec::positional(&["a", "b"]).unwrap();
        assert_eq!(fixed.arity_description(), "2");

        let optional =
            ParamSpec::new(vec!["a".to_string()], vec!["b".to_string()], None).unwrap();
        assert_eq!(optional.arity_description(), "1 to 2");

        let body = ParamSpec::with_body(&["a"], "forms").unwrap();
        assert_eq!(body.arity_description(), "at least 1");
    }
}
