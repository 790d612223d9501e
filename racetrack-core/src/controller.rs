//! Decision contract between the simulation and whatever drives a vehicle.

use crate::constants::ACTION_COUNT;

/// Maps one tick of sensor readings to per-action scores.
///
/// `readings` holds one bucket in `0..=10` per radar ray. The returned vector
/// is indexed by [`crate::vehicle::Action`] discriminant; the highest score wins.
pub trait Controller {
    fn decide(&mut self, readings: &[u8]) -> Vec<f64>;

    /// Declared length of every vector `decide` returns. Closures always
    /// report [`ACTION_COUNT`]. The evaluator checks this value and also the
    /// length of the first decision before a generation starts.
    fn output_len(&self) -> usize {
        ACTION_COUNT
    }
}

impl<F> Controller for F
where
    F: FnMut(&[u8]) -> Vec<f64>,
{
    fn decide(&mut self, readings: &[u8]) -> Vec<f64> {
        self(readings)
    }
}

impl Controller for Box<dyn Controller + Send> {
    fn decide(&mut self, readings: &[u8]) -> Vec<f64> {
        (**self).decide(readings)
    }

    fn output_len(&self) -> usize {
        (**self).output_len()
    }
}

/// Index of the highest score. Ties go to the lowest index and NaN never wins.
/// `None` when no score is comparable.
pub fn select_action(scores: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((index, score)),
        }
    }
    best.map(|(index, _)| index)
}
