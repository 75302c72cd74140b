//! Macro registry: name → definition, pure mapping semantics.
//!
//! Re-registration under an existing name silently replaces (last write
//! wins); there is no local or lexical macro scoping. The registry is
//! populated before expansion begins and read-only while a top-level form is
//! being expanded — this engine deliberately excludes macros that register
//! new macros mid-expansion.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::macros::definition::MacroDefinition;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MacroRegistry {
    macros: HashMap<String, MacroDefinition>,
}

impl MacroRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a definition under its own name. Returns the displaced
    /// definition if one existed.
    pub fn register(&mut self, def: MacroDefinition) -> Option<MacroDefinition> {
        self.macros.insert(def.name.clone(), def)
    }

    pub fn lookup(&self, name: &str) -> Option<&MacroDefinition> {
        self.macros.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }

    pub fn unregister(&mut self, name: &str) -> Option<MacroDefinition> {
        self.macros.remove(name)
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.macros.keys()
    }

    pub fn clear(&mut self) {
        self.macros.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::macros::definition::ParamSpec;
    use crate::term::Term;

    fn def(name: &str, body: Term) -> MacroDefinition {
        MacroDefinition::new(name, ParamSpec::positional(&[]).unwrap(), vec![body])
    }

    #[test]
    fn register_and_lookup() {
        let mut reg = MacroRegistry::new();
        assert!(reg.register(def("m", Term::number(1))).is_none());
        assert!(reg.contains("m"));
        assert_eq!(reg.lookup("m").unwrap().body, vec![Term::number(1)]);
        assert!(reg.lookup("absent").is_none());
    }

    #[test]
    fn re_registration_replaces_silently() {
        let mut reg = MacroRegistry::new();
        reg.register(def("m", Term::number(1)));
        let old = reg.register(def("m", Term::number(2)));
        assert_eq!(old.unwrap().body, vec![Term::number(1)]);
        assert_eq!(reg.lookup("m").unwrap().body, vec![Term::number(2)]);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn registry_round_trips_through_json() {
        let mut reg = MacroRegistry::new();
        reg.register(def("m", Term::call("quote", vec![Term::symbol("x")])));
        let json = serde_json::to_string(&reg).unwrap();
        let back: MacroRegistry = serde_json::from_str(&json).unwrap();
        assert_eq!(back.lookup("m"), reg.lookup("m"));
    }
}
