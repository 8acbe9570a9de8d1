//! Fixed-size ensemble of estimators sharing one step counter

use crate::error::{Error, Result};
use crate::estimator::{Batch, Estimator, Forward};
use crate::optimizer::StepCounter;
use rand::Rng;
use tracing::info;

#[derive(Debug, Clone)]
pub struct Ensemble {
    size: usize,
    members: Vec<Estimator>,
    counter: StepCounter,
}

impl Ensemble {
    /// An empty ensemble; members are allocated by `initialize` once the width is known.
    pub fn new(size: usize, step_ceiling: u32) -> Self {
        Self {
            size,
            members: Vec::new(),
            counter: StepCounter::new(step_ceiling),
        }
    }

    /// Allocates every member for measurements of `width` values.
    ///
    /// Returns `true` when the members were allocated by this call. Later calls with the
    /// same width are no-ops; a different width is a shape error.
    pub fn initialize<R: Rng>(&mut self, width: usize, rng: &mut R) -> Result<bool> {
        if let Some(current) = self.width() {
            if current != width {
                return Err(Error::shape("measurement width", current, width));
            }
            return Ok(false);
        }
        let mut members = Vec::with_capacity(self.size);
        for _ in 0..self.size {
            members.push(Estimator::new(width, rng)?);
        }
        self.members = members;
        info!(
            "Allocated {} estimators for width {} (hidden {})",
            self.size,
            width,
            crate::estimator::hidden_width(width)
        );
        Ok(true)
    }

    pub fn is_initialized(&self) -> bool {
        !self.members.is_empty()
    }

    pub fn width(&self) -> Option<usize> {
        self.members.first().map(Estimator::width)
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn members(&self) -> &[Estimator] {
        &self.members
    }

    pub fn counter(&self) -> &StepCounter {
        &self.counter
    }

    /// Mutable access to one member together with the shared step counter.
    pub fn member_and_counter(
        &mut self,
        index: usize,
    ) -> Result<(&mut Estimator, &mut StepCounter)> {
        let len = self.members.len();
        let member = self
            .members
            .get_mut(index)
            .ok_or_else(|| Error::NotInitialized(format!("no member {} of {}", index, len)))?;
        Ok((member, &mut self.counter))
    }

    /// Runs `forward` for every member over the same batch.
    pub fn evaluate(&mut self, batch: &Batch) -> Result<Vec<Forward>> {
        if !self.is_initialized() {
            return Err(Error::NotInitialized(
                "ensemble has no members yet".to_string(),
            ));
        }
        self.members.iter_mut().map(|m| m.forward(batch)).collect()
    }
}

/// Index of the smallest variance; the first minimum wins ties.
///
/// Comparison is strict against a running minimum that starts at `f64::MAX`, so NaN and
/// infinite variances are never selected and member 0 is the fallback.
pub fn select_min_variance(variances: &[f64]) -> usize {
    let mut selected = 0;
    let mut min = f64::MAX;
    for (n, v) in variances.iter().enumerate() {
        if *v < min {
            min = *v;
            selected = n;
        }
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_initialize_once() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut ensemble = Ensemble::new(3, 1000);
        assert!(!ensemble.is_initialized());
        assert_eq!(ensemble.width(), None);
        assert!(ensemble.initialize(4, &mut rng).unwrap());
        assert!(ensemble.is_initialized());
        assert_eq!(ensemble.members().len(), 3);
        let snapshot = ensemble.members()[0].params()[0].values.clone();
        assert!(!ensemble.initialize(4, &mut rng).unwrap());
        assert_eq!(ensemble.members()[0].params()[0].values, snapshot);
    }

    #[test]
    fn test_initialize_width_change_is_error() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut ensemble = Ensemble::new(2, 1000);
        ensemble.initialize(4, &mut rng).unwrap();
        assert!(matches!(
            ensemble.initialize(5, &mut rng),
            Err(Error::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_members_are_independent() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut ensemble = Ensemble::new(3, 1000);
        ensemble.initialize(6, &mut rng).unwrap();
        let a = &ensemble.members()[0].params()[0].values;
        let b = &ensemble.members()[1].params()[0].values;
        assert_ne!(a, b);
    }

    #[test]
    fn test_evaluate_requires_members() {
        let mut ensemble = Ensemble::new(3, 1000);
        assert!(ensemble.evaluate(&Batch::new(4, 2)).is_err());
    }

    #[test]
    fn test_select_min_variance_tie_break() {
        assert_eq!(select_min_variance(&[0.3, 0.1, 0.2]), 1);
        assert_eq!(select_min_variance(&[0.1, 0.1, 0.1]), 0);
        assert_eq!(select_min_variance(&[0.5, 0.2, 0.2]), 1);
    }

    #[test]
    fn test_select_min_variance_non_finite() {
        assert_eq!(select_min_variance(&[f64::NAN, 0.4, 0.4]), 1);
        assert_eq!(select_min_variance(&[f64::NAN, f64::NAN, f64::NAN]), 0);
        assert_eq!(select_min_variance(&[f64::INFINITY, f64::INFINITY, 2.0]), 2);
        assert_eq!(select_min_variance(&[]), 0);
    }
}
