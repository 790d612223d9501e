use crate::network::FeedForwardNet;
use crate::rng::SeededRng;
use crate::util::{seed_to_hex, write_json};
use anyhow::{anyhow, Context, Result};
use racetrack_core::{Evaluator, GenerationOutcome, SimConfig, Track};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub population: usize,
    pub generations: u32,
    pub hidden: usize,

    // Selection
    pub elite: usize,
    pub tournament: usize,

    // Variation
    pub crossover_rate: f64,
    pub mutation_rate: f64,
    pub mutation_strength: f64,

    /// Stop once any agent reaches this fitness.
    pub target_fitness: Option<f64>,
    pub seed: u32,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population: 30,
            generations: 50,
            hidden: 6,
            elite: 2,
            tournament: 3,
            crossover_rate: 0.3,
            mutation_rate: 0.2,
            mutation_strength: 0.5,
            target_fitness: None,
            seed: 0x7AC0_0001,
        }
    }
}

impl EvolutionConfig {
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::default()),
            "quick" => Some(Self {
                population: 12,
                generations: 8,
                hidden: 4,
                ..Self::default()
            }),
            "wide" => Some(Self {
                population: 80,
                generations: 100,
                hidden: 10,
                elite: 4,
                tournament: 5,
                mutation_rate: 0.15,
                mutation_strength: 0.35,
                ..Self::default()
            }),
            _ => None,
        }
    }

    pub fn preset_names() -> &'static [&'static str] {
        &["default", "quick", "wide"]
    }

    pub fn clamp(&mut self) {
        self.population = self.population.clamp(2, 1_000);
        self.generations = self.generations.clamp(1, 1_000);
        self.hidden = self.hidden.clamp(1, 64);
        self.elite = self.elite.clamp(1, self.population - 1);
        self.tournament = self.tournament.clamp(1, self.population);
        self.crossover_rate = clamp_unit(self.crossover_rate);
        self.mutation_rate = clamp_unit(self.mutation_rate);
        self.mutation_strength = if self.mutation_strength.is_finite() {
            self.mutation_strength.clamp(0.0, 5.0)
        } else {
            0.0
        };
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub generation: u32,
    pub ticks: u32,
    pub termination: String,
    pub survivors: usize,
    pub best_index: usize,
    pub best_fitness: f64,
    pub best_distance: f64,
    pub mean_fitness: f64,
    pub median_fitness: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvolutionReport {
    pub generated_unix_s: u64,
    pub seed: u32,
    pub seed_hex: String,
    pub config: EvolutionConfig,
    pub sim: SimConfig,
    pub generations_run: u32,
    pub best_fitness: f64,
    pub best_generation: u32,
    pub reached_target: bool,
    pub generations: Vec<GenerationSummary>,
}

impl GenerationSummary {
    fn from_outcome(outcome: &GenerationOutcome, ranked: &[usize]) -> Result<Self> {
        let best = ranked
            .first()
            .and_then(|index| outcome.agents.get(*index))
            .ok_or_else(|| anyhow!("generation {} had no agents", outcome.generation))?;
        let count = outcome.agents.len() as f64;
        let total: f64 = outcome.agents.iter().map(|agent| agent.fitness).sum();
        let mean_fitness = total / count;
        let median_fitness = outcome.agents[ranked[ranked.len() / 2]].fitness;

        Ok(Self {
            generation: outcome.generation,
            ticks: outcome.ticks,
            termination: outcome.termination.as_str().to_string(),
            survivors: outcome.survivors(),
            best_index: best.index,
            best_fitness: best.fitness,
            best_distance: best.distance,
            mean_fitness,
            median_fitness,
        })
    }
}

/// Indices ordered by fitness, best first; ties keep index order.
fn rank(fitness: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..fitness.len()).collect();
    order.sort_by(|a, b| fitness[*b].total_cmp(&fitness[*a]).then_with(|| a.cmp(b)));
    order
}

fn tournament_pick(fitness: &[f64], size: usize, rng: &mut SeededRng) -> usize {
    let mut best = rng.next_int(fitness.len() as u32) as usize;
    for _ in 1..size {
        let candidate = rng.next_int(fitness.len() as u32) as usize;
        if fitness[candidate] > fitness[best] {
            best = candidate;
        }
    }
    best
}

fn breed(
    population: &[FeedForwardNet],
    fitness: &[f64],
    ranked: &[usize],
    config: &EvolutionConfig,
    rng: &mut SeededRng,
) -> Vec<FeedForwardNet> {
    let mut next: Vec<FeedForwardNet> = ranked
        .iter()
        .take(config.elite)
        .map(|index| population[*index].clone())
        .collect();

    while next.len() < config.population {
        let parent = &population[tournament_pick(fitness, config.tournament, rng)];
        let mut child = if rng.chance(config.crossover_rate) {
            let other = &population[tournament_pick(fitness, config.tournament, rng)];
            parent.crossover(other, rng)
        } else {
            parent.clone()
        };
        child.mutate(rng, config.mutation_rate, config.mutation_strength);
        next.push(child);
    }
    next
}

/// Evolves network controllers against `track`. Elites carry over unchanged,
/// so the best fitness per generation never drops. Only the score report is
/// written to `out_dir`.
pub fn run_evolution(
    config: &EvolutionConfig,
    sim: &SimConfig,
    track: &Track,
    out_dir: Option<&Path>,
) -> Result<EvolutionReport> {
    let mut cfg = config.clone();
    cfg.clamp();

    let mut rng = SeededRng::new(cfg.seed);
    let mut evaluator = Evaluator::new(sim.clone()).context("invalid simulation config")?;
    let mut population: Vec<FeedForwardNet> = (0..cfg.population)
        .map(|_| FeedForwardNet::random(cfg.hidden, &mut rng))
        .collect();
    let mut fitness = vec![0.0; cfg.population];

    let mut summaries = Vec::with_capacity(cfg.generations as usize);
    let mut best_fitness = f64::NEG_INFINITY;
    let mut best_generation = 0;
    let mut reached_target = false;

    for round in 0..cfg.generations {
        let outcome = evaluator
            .run_generation(track, &mut population, &mut fitness)
            .with_context(|| format!("generation {} failed", evaluator.generation() + 1))?;
        let ranked = rank(&fitness);
        let summary = GenerationSummary::from_outcome(&outcome, &ranked)?;

        tracing::info!(
            generation = summary.generation,
            best = summary.best_fitness,
            mean = summary.mean_fitness,
            survivors = summary.survivors,
            ticks = summary.ticks,
            "evolution step"
        );

        if summary.best_fitness > best_fitness {
            best_fitness = summary.best_fitness;
            best_generation = summary.generation;
        }
        summaries.push(summary);

        reached_target = cfg.target_fitness.is_some_and(|goal| best_fitness >= goal);
        if reached_target {
            break;
        }
        if round + 1 < cfg.generations {
            population = breed(&population, &fitness, &ranked, &cfg, &mut rng);
        }
    }

    let report = EvolutionReport {
        generated_unix_s: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs(),
        seed: cfg.seed,
        seed_hex: seed_to_hex(cfg.seed),
        sim: sim.clone(),
        generations_run: evaluator.generation(),
        best_fitness,
        best_generation,
        reached_target,
        generations: summaries,
        config: cfg,
    };

    if let Some(dir) = out_dir {
        write_json(&dir.join("evolution.json"), &report)?;
    }

    Ok(report)
}
