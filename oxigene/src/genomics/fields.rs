use super::ConfigError;

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use std::collections::BTreeMap;
use std::fmt;

/// Name of the node field holding the neuron's initial activation.
pub const ACTIVATION: &str = "activation";
/// Name of the link field holding the connection weight.
pub const WEIGHT: &str = "weight";

/// The value of a single named gene field.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Float(f64),
    Boolean(bool),
    Integer(i64),
}

impl FieldValue {
    /// Returns the value as a real number, if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v),
            FieldValue::Integer(v) => Some(*v as f64),
            FieldValue::Boolean(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Float(v) => write!(f, "{:.3}", v),
            FieldValue::Boolean(v) => write!(f, "{}", v),
            FieldValue::Integer(v) => write!(f, "{}", v),
        }
    }
}

/// A closed interval of real values.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldRange {
    pub min: f64,
    pub max: f64,
}

impl FieldRange {
    pub const fn new(min: f64, max: f64) -> FieldRange {
        FieldRange { min, max }
    }

    /// A range containing only `value`.
    pub const fn point(value: f64) -> FieldRange {
        FieldRange {
            min: value,
            max: value,
        }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.min < self.max {
            rng.gen_range(self.min..=self.max)
        } else {
            self.min
        }
    }
}

/// Describes how a named field is initialized,
/// which values it may take over its lifetime,
/// and how it is perturbed by mutation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FieldSpec {
    /// A real-valued field. New genes draw uniformly from `initial`;
    /// mutation adds gaussian noise with standard deviation
    /// `mutation_power` and clamps to `lifetime`.
    Float {
        initial: FieldRange,
        lifetime: FieldRange,
        mutation_power: f64,
    },
    /// A flag, set on new genes with probability `initial_chance`.
    /// Mutation negates it.
    Boolean { initial_chance: f64 },
    /// An integer field. New genes draw uniformly from `initial`.
    /// Integer fields are never perturbed by mutation.
    Integer {
        initial: (i64, i64),
        lifetime: (i64, i64),
    },
}

impl FieldSpec {
    /// A float field fixed at `value` that mutation
    /// may move within `lifetime`.
    pub const fn float(value: f64, lifetime: FieldRange, mutation_power: f64) -> FieldSpec {
        FieldSpec::Float {
            initial: FieldRange::point(value),
            lifetime,
            mutation_power,
        }
    }

    /// Returns a freshly initialized value for a new gene.
    pub fn initial_value<R: Rng + ?Sized>(&self, rng: &mut R) -> FieldValue {
        match self {
            FieldSpec::Float { initial, .. } => FieldValue::Float(initial.sample(rng)),
            FieldSpec::Boolean { initial_chance } => {
                FieldValue::Boolean(rng.gen::<f64>() < *initial_chance)
            }
            FieldSpec::Integer { initial, .. } => {
                let (min, max) = *initial;
                FieldValue::Integer(if min < max {
                    rng.gen_range(min..=max)
                } else {
                    min
                })
            }
        }
    }

    /// Returns the perturbed version of `value`, or
    /// `None` if this kind of field is not mutable
    /// or the value does not match the spec.
    pub fn perturb<R: Rng + ?Sized>(&self, value: FieldValue, rng: &mut R) -> Option<FieldValue> {
        match (self, value) {
            (
                FieldSpec::Float {
                    lifetime,
                    mutation_power,
                    ..
                },
                FieldValue::Float(current),
            ) => {
                let noise = Normal::new(0.0, mutation_power.abs())
                    .map(|normal| normal.sample(rng))
                    .unwrap_or(0.0);
                Some(FieldValue::Float(lifetime.clamp(current + noise)))
            }
            (FieldSpec::Boolean { .. }, FieldValue::Boolean(current)) => {
                Some(FieldValue::Boolean(!current))
            }
            _ => None,
        }
    }

    /// Returns `true` if mutation can perturb `value`.
    pub fn mutates(&self, value: &FieldValue) -> bool {
        matches!(
            (self, value),
            (FieldSpec::Float { .. }, FieldValue::Float(_))
                | (FieldSpec::Boolean { .. }, FieldValue::Boolean(_))
        )
    }

    /// Returns `true` if `value` is of this spec's type
    /// and within its lifetime range.
    pub fn admits(&self, value: &FieldValue) -> bool {
        match (self, value) {
            (FieldSpec::Float { lifetime, .. }, FieldValue::Float(v)) => lifetime.contains(*v),
            (FieldSpec::Boolean { .. }, FieldValue::Boolean(_)) => true,
            (FieldSpec::Integer { lifetime, .. }, FieldValue::Integer(v)) => {
                (lifetime.0..=lifetime.1).contains(v)
            }
            _ => false,
        }
    }

    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        let sound = match self {
            FieldSpec::Float {
                initial,
                lifetime,
                mutation_power,
            } => {
                initial.min <= initial.max
                    && lifetime.min <= lifetime.max
                    && lifetime.contains(initial.min)
                    && lifetime.contains(initial.max)
                    && mutation_power.is_finite()
            }
            FieldSpec::Boolean { initial_chance } => (0.0..=1.0).contains(initial_chance),
            FieldSpec::Integer { initial, lifetime } => {
                initial.0 <= initial.1
                    && lifetime.0 <= lifetime.1
                    && lifetime.0 <= initial.0
                    && initial.1 <= lifetime.1
            }
        };
        if sound {
            Ok(())
        } else {
            Err(ConfigError::InvalidField(name.to_owned()))
        }
    }
}

/// The value ranges of every named field
/// carried by one kind of gene.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig(BTreeMap<String, FieldSpec>);

impl FieldConfig {
    pub fn new() -> FieldConfig {
        FieldConfig::default()
    }

    /// Adds (or replaces) a field, builder style.
    pub fn with(mut self, name: impl Into<String>, spec: FieldSpec) -> FieldConfig {
        self.0.insert(name.into(), spec);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, spec: FieldSpec) -> Option<FieldSpec> {
        self.0.insert(name.into(), spec)
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.0.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    /// Draws initial values for every configured field.
    pub fn initial_values<R: Rng + ?Sized>(&self, rng: &mut R) -> Fields {
        Fields(
            self.0
                .iter()
                .map(|(name, spec)| (name.clone(), spec.initial_value(rng)))
                .collect(),
        )
    }

    pub(crate) fn validate(&self, required: &str) -> Result<(), ConfigError> {
        match self.0.get(required) {
            Some(FieldSpec::Float { .. }) => {}
            _ => return Err(ConfigError::MissingField(required.to_owned())),
        }
        for (name, spec) in &self.0 {
            spec.validate(name)?;
        }
        Ok(())
    }
}

/// The named field values carried by a single gene.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Fields(BTreeMap<String, FieldValue>);

impl Fields {
    pub fn new() -> Fields {
        Fields::default()
    }

    pub fn get(&self, name: &str) -> Option<FieldValue> {
        self.0.get(name).copied()
    }

    /// Returns the named field as a real number,
    /// if present and numeric.
    pub fn float(&self, name: &str) -> Option<f64> {
        self.0.get(name).and_then(FieldValue::as_f64)
    }

    pub fn set(&mut self, name: impl Into<String>, value: FieldValue) -> Option<FieldValue> {
        self.0.insert(name.into(), value)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Fields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, value) in &self.0 {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", name, value)?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn float_spec() -> FieldSpec {
        FieldSpec::Float {
            initial: FieldRange::new(-1.0, 1.0),
            lifetime: FieldRange::new(-2.0, 2.0),
            mutation_power: 5.0,
        }
    }

    #[test]
    fn float_perturbation_stays_in_lifetime_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let spec = float_spec();
        let mut value = spec.initial_value(&mut rng);
        for _ in 0..500 {
            value = spec.perturb(value, &mut rng).unwrap();
            assert!(spec.admits(&value), "{:?}", value);
        }
    }

    #[test]
    fn boolean_perturbation_negates() {
        let mut rng = StdRng::seed_from_u64(1);
        let spec = FieldSpec::Boolean {
            initial_chance: 1.0,
        };
        assert_eq!(spec.initial_value(&mut rng), FieldValue::Boolean(true));
        assert_eq!(
            spec.perturb(FieldValue::Boolean(true), &mut rng),
            Some(FieldValue::Boolean(false))
        );
    }

    #[test]
    fn integers_are_never_perturbed() {
        let mut rng = StdRng::seed_from_u64(1);
        let spec = FieldSpec::Integer {
            initial: (0, 4),
            lifetime: (0, 10),
        };
        let value = spec.initial_value(&mut rng);
        assert!(spec.admits(&value));
        assert!(!spec.mutates(&value));
        assert_eq!(spec.perturb(value, &mut rng), None);
    }

    #[test]
    fn mismatched_kinds_are_not_perturbed() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(float_spec().perturb(FieldValue::Boolean(true), &mut rng), None);
    }

    #[test]
    fn validation_requires_float_field() {
        let config = FieldConfig::new().with(
            WEIGHT,
            FieldSpec::Boolean {
                initial_chance: 0.5,
            },
        );
        assert!(matches!(
            config.validate(WEIGHT),
            Err(ConfigError::MissingField(_))
        ));
        assert!(FieldConfig::new()
            .with(WEIGHT, float_spec())
            .validate(WEIGHT)
            .is_ok());
    }

    #[test]
    fn validation_rejects_initial_outside_lifetime() {
        let config = FieldConfig::new().with(
            WEIGHT,
            FieldSpec::Float {
                initial: FieldRange::new(-3.0, 1.0),
                lifetime: FieldRange::new(-2.0, 2.0),
                mutation_power: 0.5,
            },
        );
        assert!(matches!(
            config.validate(WEIGHT),
            Err(ConfigError::InvalidField(_))
        ));
    }
}
