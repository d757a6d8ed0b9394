//! Typed, user-configurable step properties.
//!
//! Values arrive from the property store as JSON numbers or strings (the
//! step editor stores most numbers as text, e.g. `"66"`).  Accessors do
//! the coercion once, at step construction, and report bad values as
//! [`ConfigError`]s.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::app::ports::ActorId;
use crate::error::ConfigError;
use crate::kettle::KettleId;

/// One raw property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Number(f64),
    Text(String),
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<u32> for PropertyValue {
    fn from(v: u32) -> Self {
        Self::Number(f64::from(v))
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Property values configured for one recipe step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepProperties(BTreeMap<String, PropertyValue>);

impl StepProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, value: impl Into<PropertyValue>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.0.get(key)
    }

    /// Text value, if the property is set as a string.
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(PropertyValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Text value with a fallback.
    pub fn text_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.text(key).unwrap_or(default)
    }

    /// Single-select value: the configured text if it is one of
    /// `options`, otherwise `None`.
    pub fn select(&self, key: &str, options: &[&str]) -> Option<&str> {
        self.text(key).filter(|v| options.contains(v))
    }

    /// Numeric value.  Empty text counts as unset.
    pub fn number(&self, key: &str) -> Result<Option<f64>, ConfigError> {
        let value = match self.0.get(key) {
            None => return Ok(None),
            Some(PropertyValue::Number(n)) => *n,
            Some(PropertyValue::Text(s)) if s.trim().is_empty() => return Ok(None),
            Some(PropertyValue::Text(s)) => s.trim().parse::<f64>().map_err(|_| invalid(key, format!("'{s}' is not a number")))?,
        };
        if value.is_finite() {
            Ok(Some(value))
        } else {
            Err(invalid(key, format!("{value} is not finite")))
        }
    }

    pub fn require_number(&self, key: &str) -> Result<f64, ConfigError> {
        self.number(key)?
            .ok_or_else(|| ConfigError::MissingProperty(key.to_string()))
    }

    /// Kettle reference.  Unset, empty or `0` means "no kettle selected".
    pub fn kettle(&self, key: &str) -> Result<Option<KettleId>, ConfigError> {
        Ok(self.id(key)?.filter(|&id| id != 0).map(KettleId))
    }

    /// Actor reference.  Unset or empty means "no actor selected".
    pub fn actor(&self, key: &str) -> Result<Option<ActorId>, ConfigError> {
        Ok(self.id(key)?.map(ActorId))
    }

    fn id(&self, key: &str) -> Result<Option<u32>, ConfigError> {
        match self.number(key)? {
            None => Ok(None),
            Some(n) if n >= 0.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX) => Ok(Some(n as u32)),
            Some(n) => Err(invalid(key, format!("{n} is not a valid id"))),
        }
    }
}

fn invalid(key: &str, reason: String) -> ConfigError {
    ConfigError::InvalidProperty {
        name: key.to_string(),
        reason,
    }
}

// ---------------------------------------------------------------------------
// Property descriptors
// ---------------------------------------------------------------------------

/// Kind of value a step property holds, as the step editor presents it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertyKind {
    Text { default: &'static str },
    Number,
    Select(&'static [&'static str]),
    Kettle,
    Actor,
}

/// Static description of one configurable property of a step kind.
#[derive(Debug, Clone, Copy)]
pub struct PropertyDef {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: PropertyKind,
    pub description: &'static str,
}

impl PropertyDef {
    pub const fn new(key: &'static str, label: &'static str, kind: PropertyKind) -> Self {
        Self {
            key,
            label,
            kind,
            description: "",
        }
    }

    pub const fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }
}
