use crate::genomics::{check_probability, ConfigError};

use serde::{Deserialize, Serialize};

/// Configuration data for reproduction and speciation.
///
/// # Note
/// All quantities expressing probabilities
/// should be in the range [0.0, 1.0]; [`validate`]
/// rejects configurations where they are not.
///
/// [`validate`]: PopulationConfig::validate
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Chance that a child is produced by mutation
    /// (as opposed to crossover).
    pub mutation_probability: f64,
    /// Consecutive failed reproduction attempts after which
    /// reproduction gives up. 0 means never give up.
    pub max_reproduction_attempts: usize,
    /// Compatibility distance below which a genome
    /// joins a species.
    pub compatibility_threshold: f64,
    /// Weight of excess genes in compatibility distance.
    pub excess_coefficient: f64,
    /// Weight of disjoint genes in compatibility distance.
    pub disjoint_coefficient: f64,
    /// Weight of the mean weight difference of matching
    /// genes in compatibility distance.
    pub weight_coefficient: f64,
    /// Number of generations without improvement after which
    /// a species is removed. 0 disables removal.
    pub species_dropoff_age: usize,
    /// Share of each species exempt from replacement
    /// under species elitism.
    pub elite_proportion: f64,
    /// Lower bound of the desired species count.
    pub target_species_min: usize,
    /// Upper bound of the desired species count.
    /// If zero, the compatibility threshold is never adjusted.
    pub target_species_max: usize,
    /// Amount by which the compatibility threshold is moved
    /// when the species count leaves the desired range.
    pub threshold_adjustment: f64,
    /// Chance that a crossover partner is drawn from the
    /// whole population instead of the first parent's species.
    pub interspecies_crossover_probability: f64,
}

impl PopulationConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to abbreviate configuration
    /// instantiation, or to fill in unused values.
    ///
    /// # Examples
    /// ```
    /// use oxigene::PopulationConfig;
    ///
    /// let config = PopulationConfig {
    ///     mutation_probability: 0.75,
    ///     ..PopulationConfig::zero()
    /// };
    /// assert!(config.validate().is_ok());
    /// ```
    pub const fn zero() -> PopulationConfig {
        PopulationConfig {
            mutation_probability: 0.0,
            max_reproduction_attempts: 0,
            compatibility_threshold: 0.0,
            excess_coefficient: 0.0,
            disjoint_coefficient: 0.0,
            weight_coefficient: 0.0,
            species_dropoff_age: 0,
            elite_proportion: 0.0,
            target_species_min: 0,
            target_species_max: 0,
            threshold_adjustment: 0.0,
            interspecies_crossover_probability: 0.0,
        }
    }

    /// Checks probabilities, coefficients and species count bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_probability("mutation_probability", self.mutation_probability)?;
        check_probability("elite_proportion", self.elite_proportion)?;
        check_probability(
            "interspecies_crossover_probability",
            self.interspecies_crossover_probability,
        )?;
        let non_negative = [
            ("compatibility_threshold", self.compatibility_threshold),
            ("excess_coefficient", self.excess_coefficient),
            ("disjoint_coefficient", self.disjoint_coefficient),
            ("weight_coefficient", self.weight_coefficient),
            ("threshold_adjustment", self.threshold_adjustment),
        ];
        for (name, value) in non_negative {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be finite and non-negative, got {}",
                    name, value
                )));
            }
        }
        if self.target_species_max > 0 && self.target_species_min > self.target_species_max {
            return Err(ConfigError::Invalid(format!(
                "target species range [{}, {}] is empty",
                self.target_species_min, self.target_species_max
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_valid() {
        assert!(PopulationConfig::zero().validate().is_ok());
    }

    #[test]
    fn rejects_inverted_species_range() {
        let config = PopulationConfig {
            target_species_min: 8,
            target_species_max: 4,
            ..PopulationConfig::zero()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_negative_coefficients() {
        let config = PopulationConfig {
            weight_coefficient: -0.4,
            ..PopulationConfig::zero()
        };
        assert!(config.validate().is_err());
    }
}
