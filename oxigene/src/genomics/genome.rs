use super::{GeneMap, GeneMapError};
use crate::attributes::{AttributeKey, Attributes};
use crate::{GenomeId, SpeciesId};

use serde::{Deserialize, Serialize};

use std::fmt;

/// A candidate solution: a [`GeneMap`] payload plus the
/// bookkeeping evolution needs to select and age it.
///
/// The payload is never edited in place once the genome
/// exists; operators build children from copies instead.
/// Only the evolutionary attributes change over a genome's life.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    id: GenomeId,
    data: GeneMap,
    fitness: f64,
    complexity: Option<f64>,
    age: usize,
    evaluations: usize,
    marked_for_death: bool,
    species: Option<SpeciesId>,
    attributes: Attributes,
}

impl Genome {
    /// Wraps `data` as a fresh genome: zero fitness,
    /// age and evaluations, no species.
    pub(crate) fn new(id: GenomeId, data: GeneMap) -> Genome {
        Genome {
            id,
            data,
            fitness: 0.0,
            complexity: None,
            age: 0,
            evaluations: 0,
            marked_for_death: false,
            species: None,
            attributes: Attributes::new(),
        }
    }

    pub fn id(&self) -> GenomeId {
        self.id
    }

    /// The genome's genes.
    pub fn data(&self) -> &GeneMap {
        &self.data
    }

    pub fn into_data(self) -> GeneMap {
        self.data
    }

    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness = fitness;
    }

    /// Records a completed evaluation, setting the
    /// genome's fitness and counting the evaluation.
    pub fn record_evaluation(&mut self, fitness: f64) {
        self.fitness = fitness;
        self.evaluations += 1;
    }

    /// The genome's complexity: its total gene
    /// count, unless explicitly overridden.
    ///
    /// # Examples
    /// ```
    /// use oxigene::genomics::{GeneMap, GeneticConfig, GeneticsFactory};
    /// use oxigene::History;
    ///
    /// let factory = GeneticsFactory::new(GeneticConfig::zero(), History::new()).unwrap();
    /// let mut genome = factory.create_genome_with(0, GeneMap::new());
    /// assert_eq!(genome.complexity(), 0.0);
    ///
    /// genome.set_complexity(Some(2.5));
    /// assert_eq!(genome.complexity(), 2.5);
    /// ```
    pub fn complexity(&self) -> f64 {
        self.complexity
            .unwrap_or_else(|| self.data.gene_count() as f64)
    }

    /// Overrides the derived complexity, or restores it with `None`.
    pub fn set_complexity(&mut self, complexity: Option<f64>) {
        self.complexity = complexity;
    }

    /// Number of generations the genome has survived.
    pub fn age(&self) -> usize {
        self.age
    }

    pub fn increment_age(&mut self) {
        self.age += 1;
    }

    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    pub fn is_marked_for_death(&self) -> bool {
        self.marked_for_death
    }

    /// Flags the genome for removal at the next purge.
    pub fn mark_for_death(&mut self) {
        self.marked_for_death = true;
    }

    /// Clears a previous death mark.
    pub fn spare(&mut self) {
        self.marked_for_death = false;
    }

    pub fn species(&self) -> Option<SpeciesId> {
        self.species
    }

    pub(crate) fn set_species(&mut self, species: Option<SpeciesId>) {
        self.species = species;
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    /// Returns the numeric value of the given attribute, if the genome has it.
    pub fn attribute(&self, key: &AttributeKey) -> Option<f64> {
        match key {
            AttributeKey::Fitness => Some(self.fitness),
            AttributeKey::Complexity => Some(self.complexity()),
            AttributeKey::Age => Some(self.age as f64),
            AttributeKey::Evaluations => Some(self.evaluations as f64),
            AttributeKey::Named(name) => self.attributes.get(name).and_then(|v| v.as_f64()),
        }
    }

    /// Every numeric attribute of the genome, well-known ones first.
    pub fn numeric_attributes(&self) -> impl Iterator<Item = (AttributeKey, f64)> + '_ {
        [
            (AttributeKey::Fitness, self.fitness),
            (AttributeKey::Complexity, self.complexity()),
            (AttributeKey::Age, self.age as f64),
            (AttributeKey::Evaluations, self.evaluations as f64),
        ]
        .into_iter()
        .chain(
            self.attributes
                .numeric()
                .map(|(name, value)| (AttributeKey::named(name), value)),
        )
    }

    /// Checks the structural invariants of the genome's genes.
    pub fn validate(&self) -> Result<(), GeneMapError> {
        self.data.validate()
    }
}

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Genome {} (fitness {:.4}, species {:?}, age {}): {}",
            self.id, self.fitness, self.species, self.age, self.data
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::OPERATOR;

    #[test]
    fn fresh_genome_bookkeeping() {
        let genome = Genome::new(3, GeneMap::new());
        assert_eq!(genome.id(), 3);
        assert_eq!(genome.fitness(), 0.0);
        assert_eq!(genome.age(), 0);
        assert_eq!(genome.species(), None);
        assert!(!genome.is_marked_for_death());
    }

    #[test]
    fn evaluations_are_counted() {
        let mut genome = Genome::new(0, GeneMap::new());
        genome.record_evaluation(1.5);
        genome.record_evaluation(2.0);
        assert_eq!(genome.fitness(), 2.0);
        assert_eq!(genome.evaluations(), 2);
    }

    #[test]
    fn numeric_attributes_include_named_extras() {
        let mut genome = Genome::new(0, GeneMap::new());
        genome.attributes_mut().set("novelty", 0.5);
        genome.attributes_mut().set(OPERATOR, "add-link");
        let keys: Vec<_> = genome.numeric_attributes().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec![
                AttributeKey::Fitness,
                AttributeKey::Complexity,
                AttributeKey::Age,
                AttributeKey::Evaluations,
                AttributeKey::named("novelty"),
            ]
        );
        assert_eq!(genome.attribute(&AttributeKey::named("novelty")), Some(0.5));
        assert_eq!(genome.attribute(&AttributeKey::named(OPERATOR)), None);
    }

    #[test]
    fn death_mark_can_be_cleared() {
        let mut genome = Genome::new(0, GeneMap::new());
        genome.mark_for_death();
        assert!(genome.is_marked_for_death());
        genome.spare();
        assert!(!genome.is_marked_for_death());
    }
}
