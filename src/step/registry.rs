//! Step-type registry.
//!
//! A table of [`StepKind`] rows, each pairing a stable type id with a
//! plain constructor function.  The recipe names a kind by id; the
//! runner looks it up here when the recipe pointer reaches the step.

use std::collections::BTreeMap;

use log::debug;

use crate::error::ConfigError;

use super::Step;
use super::kinds;
use super::properties::{PropertyDef, StepProperties};

/// Build a step from its configured properties.
pub type StepConstructor = fn(&StepProperties) -> Result<Box<dyn Step>, ConfigError>;

/// One row of the registry.
pub struct StepKind {
    pub id: &'static str,
    pub name: &'static str,
    pub properties: &'static [PropertyDef],
    pub construct: StepConstructor,
}

#[derive(Default)]
pub struct StepRegistry {
    kinds: BTreeMap<&'static str, StepKind>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the six bundled step kinds.
    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        for kind in kinds::builtins() {
            reg.register(kind);
        }
        reg
    }

    /// Add or replace a kind.
    pub fn register(&mut self, kind: StepKind) {
        debug!("Registered step kind '{}'", kind.id);
        self.kinds.insert(kind.id, kind);
    }

    pub fn get(&self, id: &str) -> Option<&StepKind> {
        self.kinds.get(id)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &StepKind> {
        self.kinds.values()
    }

    pub fn construct(&self, id: &str, props: &StepProperties) -> Result<Box<dyn Step>, ConfigError> {
        let kind = self
            .get(id)
            .ok_or_else(|| ConfigError::UnknownStepKind(id.to_string()))?;
        (kind.construct)(props)
    }
}
