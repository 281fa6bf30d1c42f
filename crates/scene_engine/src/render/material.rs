//! Material parameters

use std::collections::BTreeMap;

use crate::foundation::math::Vec4;

/// Named shader parameters uploaded with each draw
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Material {
    params: BTreeMap<String, Vec4>,
}

impl Material {
    /// Create a material without parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter (builder pattern)
    pub fn with_param(mut self, name: impl Into<String>, value: Vec4) -> Self {
        self.set_param(name, value);
        self
    }

    /// Set a parameter
    pub fn set_param(&mut self, name: impl Into<String>, value: Vec4) {
        self.params.insert(name.into(), value);
    }

    /// Get a parameter
    pub fn param(&self, name: &str) -> Option<&Vec4> {
        self.params.get(name)
    }

    /// Iterate over parameters in name order
    pub fn params(&self) -> impl Iterator<Item = (&str, &Vec4)> {
        self.params.iter().map(|(name, value)| (name.as_str(), value))
    }
}
