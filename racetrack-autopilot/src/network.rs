//! Fixed-topology feed-forward network: readings -> tanh hidden layer -> action scores.

use racetrack_core::constants::{ACTION_COUNT, RADAR_COUNT, RADAR_MAX_BUCKET};
use racetrack_core::Controller;
use serde::Serialize;

use crate::rng::SeededRng;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeedForwardNet {
    hidden: usize,
    /// Input->hidden weights followed by hidden biases, then hidden->output
    /// weights followed by output biases.
    genome: Vec<f64>,
}

impl FeedForwardNet {
    pub const INPUTS: usize = RADAR_COUNT;
    pub const OUTPUTS: usize = ACTION_COUNT;

    pub fn genome_len(hidden: usize) -> usize {
        hidden * (Self::INPUTS + 1) + Self::OUTPUTS * (hidden + 1)
    }

    pub fn zeroed(hidden: usize) -> Self {
        Self {
            hidden,
            genome: vec![0.0; Self::genome_len(hidden)],
        }
    }

    pub fn random(hidden: usize, rng: &mut SeededRng) -> Self {
        let genome = (0..Self::genome_len(hidden))
            .map(|_| rng.next_signed())
            .collect();
        Self { hidden, genome }
    }

    pub fn hidden(&self) -> usize {
        self.hidden
    }

    pub fn genome(&self) -> &[f64] {
        &self.genome
    }

    /// Perturbs each gene with probability `rate` by gaussian noise scaled by
    /// `strength`. Returns the number of genes changed.
    pub fn mutate(&mut self, rng: &mut SeededRng, rate: f64, strength: f64) -> usize {
        let mut changed = 0;
        for gene in &mut self.genome {
            if rng.chance(rate) {
                *gene += rng.next_gaussian() * strength;
                changed += 1;
            }
        }
        changed
    }

    /// Uniform crossover; genes come from either parent with equal odds.
    pub fn crossover(&self, other: &Self, rng: &mut SeededRng) -> Self {
        debug_assert_eq!(self.hidden, other.hidden);
        let genome = self
            .genome
            .iter()
            .zip(&other.genome)
            .map(|(a, b)| if rng.chance(0.5) { *a } else { *b })
            .collect();
        Self {
            hidden: self.hidden,
            genome,
        }
    }

    pub fn forward(&self, readings: &[u8]) -> Vec<f64> {
        let (first, second) = self.genome.split_at(self.hidden * (Self::INPUTS + 1));
        let (w1, b1) = first.split_at(self.hidden * Self::INPUTS);
        let (w2, b2) = second.split_at(Self::OUTPUTS * self.hidden);

        let hidden: Vec<f64> = (0..self.hidden)
            .map(|h| {
                let row = &w1[h * Self::INPUTS..(h + 1) * Self::INPUTS];
                let sum = row
                    .iter()
                    .zip(readings)
                    .map(|(w, r)| w * (*r as f64 / RADAR_MAX_BUCKET as f64))
                    .sum::<f64>();
                (sum + b1[h]).tanh()
            })
            .collect();

        (0..Self::OUTPUTS)
            .map(|o| {
                let row = &w2[o * self.hidden..(o + 1) * self.hidden];
                let sum = row.iter().zip(&hidden).map(|(w, h)| w * h).sum::<f64>();
                (sum + b2[o]).tanh()
            })
            .collect()
    }
}

impl Controller for FeedForwardNet {
    fn decide(&mut self, readings: &[u8]) -> Vec<f64> {
        self.forward(readings)
    }
}
