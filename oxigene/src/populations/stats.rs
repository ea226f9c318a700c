use crate::genomics::Genome;
use crate::GenomeId;

use serde::{Deserialize, Serialize};

/// Statistics of one numeric attribute over the
/// current members of a population.
///
/// Extremes are stored as genome ids, resolved
/// through the population when read.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttributeStats {
    pub highest: GenomeId,
    pub highest_value: f64,
    pub lowest: GenomeId,
    pub lowest_value: f64,
    pub average: f64,
    /// Number of members carrying the attribute.
    pub count: usize,
}

impl AttributeStats {
    /// Computes statistics from `(genome id, value)` pairs.
    /// Returns `None` for an empty sequence.
    ///
    /// Members are ordered by decreasing value (ties by
    /// increasing id), and the ends of that order taken.
    pub fn from_values(values: impl IntoIterator<Item = (GenomeId, f64)>) -> Option<AttributeStats> {
        let mut values: Vec<(GenomeId, f64)> = values.into_iter().collect();
        values.sort_by(|(a_id, a), (b_id, b)| b.total_cmp(a).then(a_id.cmp(b_id)));
        let (highest, highest_value) = *values.first()?;
        let (lowest, lowest_value) = *values.last()?;
        let average = values.iter().map(|(_, v)| v).sum::<f64>() / values.len() as f64;
        Some(AttributeStats {
            highest,
            highest_value,
            lowest,
            lowest_value,
            average,
            count: values.len(),
        })
    }
}

/// A copy of the genome that held an attribute's
/// extreme value, kept after the genome itself is gone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub value: f64,
    pub genome: Genome,
}

/// The highest and lowest values an attribute ever took.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Records {
    pub highest_ever: Record,
    pub lowest_ever: Record,
}

impl Records {
    pub(super) fn new(highest: Record, lowest: Record) -> Records {
        Records {
            highest_ever: highest,
            lowest_ever: lowest,
        }
    }

    /// Replaces the records beaten by the current extremes.
    pub(super) fn update(&mut self, highest: Record, lowest: Record) {
        if highest.value > self.highest_ever.value {
            self.highest_ever = highest;
        }
        if lowest.value < self.lowest_ever.value {
            self.lowest_ever = lowest;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extremes_and_average() {
        let stats = AttributeStats::from_values([(0, 1.0), (1, 4.0), (2, -2.0), (3, 1.0)]).unwrap();
        assert_eq!((stats.highest, stats.highest_value), (1, 4.0));
        assert_eq!((stats.lowest, stats.lowest_value), (2, -2.0));
        assert_eq!(stats.average, 1.0);
        assert_eq!(stats.count, 4);
    }

    #[test]
    fn ties_resolve_by_id() {
        let stats = AttributeStats::from_values([(5, 1.0), (2, 1.0), (9, 1.0)]).unwrap();
        assert_eq!(stats.highest, 2);
        assert_eq!(stats.lowest, 9);
    }

    #[test]
    fn empty_has_no_stats() {
        assert_eq!(AttributeStats::from_values(Vec::new()), None);
    }
}
