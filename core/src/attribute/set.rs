use super::attribute::Attribute;
use crate::error::{Result, UcdmError};
use crate::scan::ScanIndex;
use crate::types::{AttributeValue, Tag};
use std::collections::BTreeSet;

/// Named, ordered collection of attributes
///
/// Names are unique; iteration and result columns follow insertion order.
#[derive(Debug, Clone, Default)]
pub struct AttributeSet {
    entries: Vec<(String, Attribute)>,
}

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `attribute` under `name`
    ///
    /// # Errors
    ///
    /// Returns [`UcdmError::Configuration`] if the name is taken
    pub fn insert(&mut self, name: impl Into<String>, attribute: Attribute) -> Result<()> {
        let name = name.into();
        if self.contains(&name) {
            return Err(UcdmError::Configuration(format!(
                "duplicate attribute name '{}'",
                name
            )));
        }
        self.entries.push((name, attribute));
        Ok(())
    }

    /// Adds `attribute` under its default name
    ///
    /// # Errors
    ///
    /// Returns [`UcdmError::Configuration`] if the attribute has no default
    /// name or the name is taken
    pub fn add(&mut self, attribute: Attribute) -> Result<()> {
        let name = attribute
            .default_name()
            .map(str::to_string)
            .ok_or_else(|| UcdmError::Configuration("attribute has no name".to_string()))?;
        self.insert(name, attribute)
    }

    /// Builder form of [`AttributeSet::insert`]
    pub fn with(mut self, name: impl Into<String>, attribute: Attribute) -> Result<Self> {
        self.insert(name, attribute)?;
        Ok(self)
    }

    /// Builds a set from attributes named by their default names
    pub fn from_attributes(attributes: impl IntoIterator<Item = Attribute>) -> Result<Self> {
        let mut set = Self::new();
        for attribute in attributes {
            set.add(attribute)?;
        }
        Ok(set)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, a)| a)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Attribute names in column order
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Attribute)> + '_ {
        self.entries.iter().map(|(n, a)| (n.as_str(), a))
    }

    /// Union of the members' tags
    pub fn required_tags(&self) -> BTreeSet<Tag> {
        self.entries
            .iter()
            .flat_map(|(_, a)| a.required_tags().iter().copied())
            .collect()
    }

    /// Evaluates every attribute against the same unit-local index
    ///
    /// # Errors
    ///
    /// Returns the first attribute error; no partial result is produced
    pub fn evaluate(&self, unit_index: &ScanIndex) -> Result<AttributeValues> {
        let values = self
            .entries
            .iter()
            .map(|(name, attribute)| Ok((name.clone(), attribute.evaluate(unit_index)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(AttributeValues { values })
    }
}

/// Name → value map of one unit, in attribute-set order
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct AttributeValues {
    values: Vec<(String, AttributeValue)>,
}

impl AttributeValues {
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.values.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> + '_ {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn into_values(self) -> Vec<AttributeValue> {
        self.values.into_iter().map(|(_, v)| v).collect()
    }
}
