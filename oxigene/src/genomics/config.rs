use super::errors::check_probability;
use super::{ConfigError, FieldConfig, FieldRange, FieldSpec, ACTIVATION, WEIGHT};

use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Configuration data for genome generation.
///
/// # Note
/// All quantities expressing probabilities
/// should be in the range [0.0, 1.0]; [`validate`]
/// rejects configurations where they are not.
///
/// [`validate`]: GeneticConfig::validate
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneticConfig {
    /// Number of genomes in a freshly created population.
    pub population_size: NonZeroUsize,
    /// Number of bias nodes in a genome.
    pub bias_count: usize,
    /// Number of input nodes in a genome.
    pub input_count: usize,
    /// Number of output nodes in a genome.
    pub output_count: NonZeroUsize,
    /// Chance that a link between a bias/input node
    /// and an output node is created during initial
    /// genome generation.
    pub initial_connection_probability: f64,
    /// Fields carried by every node gene. Must contain
    /// a float [`ACTIVATION`] field.
    pub node_fields: FieldConfig,
    /// Fields carried by every link gene. Must contain
    /// a float [`WEIGHT`] field.
    pub link_fields: FieldConfig,
}

impl GeneticConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0, or in the case of `NonZeroUsize`s, 1.
    /// The mandatory activation and weight fields are
    /// present, fixed at 0.
    ///
    /// # Examples
    /// ```
    /// use oxigene::genomics::{FieldRange, FieldSpec, GeneticConfig, WEIGHT};
    /// use std::num::NonZeroUsize;
    ///
    /// let mut config = GeneticConfig {
    ///     input_count: 2,
    ///     initial_connection_probability: 1.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// config.link_fields.insert(
    ///     WEIGHT,
    ///     FieldSpec::Float {
    ///         initial: FieldRange::new(-1.0, 1.0),
    ///         lifetime: FieldRange::new(-5.0, 5.0),
    ///         mutation_power: 0.5,
    ///     },
    /// );
    ///
    /// assert!(config.validate().is_ok());
    /// assert_eq!(config.output_count, NonZeroUsize::new(1).unwrap());
    /// ```
    pub fn zero() -> GeneticConfig {
        GeneticConfig {
            population_size: NonZeroUsize::MIN,
            bias_count: 0,
            input_count: 0,
            output_count: NonZeroUsize::MIN,
            initial_connection_probability: 0.0,
            node_fields: FieldConfig::new()
                .with(ACTIVATION, FieldSpec::float(0.0, FieldRange::point(0.0), 0.0)),
            link_fields: FieldConfig::new()
                .with(WEIGHT, FieldSpec::float(0.0, FieldRange::point(0.0), 0.0)),
        }
    }

    /// Number of bias, input and output nodes in every genome.
    pub fn interface_size(&self) -> usize {
        self.bias_count + self.input_count + self.output_count.get()
    }

    /// Checks that probabilities are in range and that
    /// the mandatory fields exist and are well-formed.
    ///
    /// # Errors
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_probability(
            "initial_connection_probability",
            self.initial_connection_probability,
        )?;
        self.node_fields.validate(ACTIVATION)?;
        self.link_fields.validate(WEIGHT)?;
        if self.bias_count + self.input_count == 0 && self.initial_connection_probability > 0.0 {
            log::warn!("initial connections requested, but genomes have no bias or input nodes");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_valid() {
        assert!(GeneticConfig::zero().validate().is_ok());
        assert_eq!(GeneticConfig::zero().interface_size(), 1);
    }

    #[test]
    fn rejects_bad_probability() {
        let config = GeneticConfig {
            initial_connection_probability: 1.5,
            ..GeneticConfig::zero()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Probability { .. })
        ));
    }

    #[test]
    fn rejects_missing_weight() {
        let config = GeneticConfig {
            link_fields: FieldConfig::new(),
            ..GeneticConfig::zero()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::MissingField(WEIGHT.to_owned()))
        );
    }
}
