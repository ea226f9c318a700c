//! Free-form, experiment-specific attributes attached to
//! genomes and populations, and the keys under which
//! numeric attributes are tracked by population statistics.
use crate::GenomeId;

use serde::{Deserialize, Serialize};

use std::collections::BTreeMap;
use std::fmt;

/// Attribute name under which reproduction records a child's parent ids.
pub const PARENTS: &str = "parents";
/// Attribute name under which reproduction records the applied operator.
pub const OPERATOR: &str = "operator";

/// A tagged attribute value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Float(f64),
    Integer(i64),
    Boolean(bool),
    Text(String),
    Genomes(Vec<GenomeId>),
}

impl AttributeValue {
    /// Returns the value as a real number, if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Float(value) => Some(*value),
            AttributeValue::Integer(value) => Some(*value as f64),
            _ => None,
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Float(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Integer(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Boolean(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_owned())
    }
}

impl From<Vec<GenomeId>> for AttributeValue {
    fn from(value: Vec<GenomeId>) -> Self {
        AttributeValue::Genomes(value)
    }
}

/// A name-keyed map of [`AttributeValue`]s.
///
/// Iteration is ordered by name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes(BTreeMap<String, AttributeValue>);

impl Attributes {
    /// Returns an empty attribute map.
    pub fn new() -> Attributes {
        Attributes::default()
    }

    /// Sets an attribute, returning the previous value if any.
    ///
    /// # Examples
    /// ```
    /// use oxigene::attributes::{AttributeValue, Attributes};
    ///
    /// let mut attributes = Attributes::new();
    /// attributes.set("lineage", "alpha");
    /// attributes.set("score", 2.5);
    ///
    /// assert_eq!(attributes.get("lineage"), Some(&AttributeValue::Text("alpha".into())));
    /// assert_eq!(attributes.numeric().collect::<Vec<_>>(), vec![("score", 2.5)]);
    /// ```
    pub fn set(
        &mut self,
        name: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Option<AttributeValue> {
        self.0.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.0.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<AttributeValue> {
        self.0.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Iterates over the attributes holding numeric values.
    pub fn numeric(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0
            .iter()
            .filter_map(|(name, value)| value.as_f64().map(|v| (name.as_str(), v)))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Identifies a numeric genome attribute for the
/// purposes of population statistics.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AttributeKey {
    Fitness,
    Complexity,
    Age,
    Evaluations,
    /// A numeric entry of the genome's free-form [`Attributes`].
    Named(String),
}

impl AttributeKey {
    pub fn named(name: impl Into<String>) -> AttributeKey {
        AttributeKey::Named(name.into())
    }
}

impl fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeKey::Fitness => write!(f, "fitness"),
            AttributeKey::Complexity => write!(f, "complexity"),
            AttributeKey::Age => write!(f, "age"),
            AttributeKey::Evaluations => write!(f, "evaluations"),
            AttributeKey::Named(name) => write!(f, "{}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_skips_non_numbers() {
        let mut attributes = Attributes::new();
        attributes.set(PARENTS, vec![1usize, 2]);
        attributes.set(OPERATOR, "add-node");
        attributes.set("depth", 3i64);
        attributes.set("novelty", 0.25);
        attributes.set("flagged", true);

        let numeric: Vec<_> = attributes.numeric().collect();
        assert_eq!(numeric, vec![("depth", 3.0), ("novelty", 0.25)]);
    }

    #[test]
    fn set_replaces() {
        let mut attributes = Attributes::new();
        assert_eq!(attributes.set("x", 1.0), None);
        assert_eq!(attributes.set("x", 2.0), Some(AttributeValue::Float(1.0)));
        assert_eq!(attributes.len(), 1);
        assert_eq!(attributes.remove("x"), Some(AttributeValue::Float(2.0)));
        assert!(attributes.is_empty());
    }
}
