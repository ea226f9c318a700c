use crate::genomics::ConfigError;

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

/// A weighted pool of operators.
///
/// The pool itself is never modified by selection: each
/// reproduction attempt opens its own [`Selection`], which
/// tracks the operators that already failed during that attempt.
#[derive(Debug)]
pub struct OperatorSelecter<O> {
    entries: Vec<(O, f64)>,
}

impl<O> Default for OperatorSelecter<O> {
    fn default() -> Self {
        OperatorSelecter { entries: vec![] }
    }
}

impl<O> OperatorSelecter<O> {
    pub fn new() -> OperatorSelecter<O> {
        OperatorSelecter::default()
    }

    /// Adds an operator with the given selection weight.
    ///
    /// # Errors
    /// Returns an error if `weight` is negative or not finite.
    pub fn insert(&mut self, operator: O, weight: f64) -> Result<(), ConfigError> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "operator weight must be finite and non-negative, got {}",
                weight
            )));
        }
        self.entries.push((operator, weight));
        Ok(())
    }

    /// Builder-style [`insert`](OperatorSelecter::insert).
    pub fn with(mut self, operator: O, weight: f64) -> Result<OperatorSelecter<O>, ConfigError> {
        self.insert(operator, weight)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_weight(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w).sum()
    }

    pub fn operators(&self) -> impl Iterator<Item = (&O, f64)> {
        self.entries.iter().map(|(o, w)| (o, *w))
    }

    /// Opens a selection over the full pool.
    ///
    /// # Examples
    /// ```
    /// use oxigene::operators::OperatorSelecter;
    ///
    /// let selecter = OperatorSelecter::new()
    ///     .with("add-link", 1.0).unwrap()
    ///     .with("add-node", 3.0).unwrap();
    /// let mut rng = rand::thread_rng();
    ///
    /// let mut selection = selecter.selection();
    /// let (index, _) = selection.select(&mut rng).unwrap();
    /// selection.reject(index);
    /// let (other, _) = selection.select(&mut rng).unwrap();
    /// assert_ne!(index, other);
    ///
    /// selection.reject(other);
    /// assert!(selection.select(&mut rng).is_none());
    /// ```
    pub fn selection(&self) -> Selection<'_, O> {
        Selection {
            selecter: self,
            rejected: vec![false; self.entries.len()],
        }
    }
}

/// One attempt's view over an [`OperatorSelecter`].
#[derive(Debug)]
pub struct Selection<'a, O> {
    selecter: &'a OperatorSelecter<O>,
    rejected: Vec<bool>,
}

impl<'a, O> Selection<'a, O> {
    /// Draws one of the operators not rejected so far,
    /// according to their weights. Returns `None` once
    /// every operator with a positive weight was rejected.
    pub fn select<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<(usize, &'a O)> {
        let selecter = self.selecter;
        let weights = selecter
            .entries
            .iter()
            .zip(&self.rejected)
            .map(|((_, w), &rejected)| if rejected { 0.0 } else { *w });
        let index = WeightedIndex::new(weights).ok()?.sample(rng);
        Some((index, &selecter.entries[index].0))
    }

    /// Excludes an operator from the rest of this selection.
    pub fn reject(&mut self, index: usize) {
        if let Some(rejected) = self.rejected.get_mut(index) {
            *rejected = true;
        }
    }

    /// Makes every operator available again.
    pub fn reset(&mut self) {
        self.rejected.iter_mut().for_each(|r| *r = false);
    }

    /// Returns `true` if no operator can be drawn anymore.
    pub fn is_exhausted(&self) -> bool {
        self.selecter
            .entries
            .iter()
            .zip(&self.rejected)
            .all(|((_, w), &rejected)| rejected || *w <= 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::testing::seeded;

    #[test]
    fn weights_drive_selection() {
        let mut rng = seeded(17);
        let selecter = OperatorSelecter::new()
            .with('a', 1.0)
            .unwrap()
            .with('b', 9.0)
            .unwrap();
        let mut counts = [0; 2];
        for _ in 0..1000 {
            let (index, _) = selecter.selection().select(&mut rng).unwrap();
            counts[index] += 1;
        }
        assert!(counts[1] > counts[0] * 4, "{:?}", counts);
    }

    #[test]
    fn zero_weights_are_never_drawn() {
        let mut rng = seeded(1);
        let selecter = OperatorSelecter::new()
            .with('a', 0.0)
            .unwrap()
            .with('b', 1.0)
            .unwrap();
        let mut selection = selecter.selection();
        assert_eq!(selection.select(&mut rng), Some((1, &'b')));
        selection.reject(1);
        assert!(selection.is_exhausted());
        assert_eq!(selection.select(&mut rng), None);
    }

    #[test]
    fn rejection_is_local_to_a_selection() {
        let mut rng = seeded(2);
        let selecter = OperatorSelecter::new().with('a', 1.0).unwrap();
        let mut selection = selecter.selection();
        selection.reject(0);
        assert_eq!(selection.select(&mut rng), None);
        assert_eq!(selecter.selection().select(&mut rng), Some((0, &'a')));
        selection.reset();
        assert_eq!(selection.select(&mut rng), Some((0, &'a')));
    }

    #[test]
    fn rejects_negative_weights() {
        assert!(OperatorSelecter::new().with('a', -1.0).is_err());
        assert!(OperatorSelecter::new().with('a', f64::NAN).is_err());
    }

    #[test]
    fn empty_pool_selects_nothing() {
        let mut rng = seeded(2);
        let selecter = OperatorSelecter::<char>::new();
        assert!(selecter.selection().select(&mut rng).is_none());
    }
}
