//! Lockstep generation loop.

use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::constants::ACTION_COUNT;
use crate::controller::{select_action, Controller};
use crate::error::SimError;
use crate::track::Track;
use crate::vehicle::{Action, Vehicle};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationState {
    Running,
    AllDead,
    BudgetExhausted,
}

impl GenerationState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::AllDead => "all_dead",
            Self::BudgetExhausted => "budget_exhausted",
        }
    }
}

/// Final state of one agent, keyed by its controller index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentReport {
    pub index: usize,
    pub fitness: f64,
    pub distance: f64,
    pub steps: u32,
    pub alive: bool,
    pub x: f64,
    pub y: f64,
    pub heading_deg: f64,
    pub speed: f64,
}

impl AgentReport {
    fn capture(index: usize, fitness: f64, vehicle: &Vehicle) -> Self {
        let (x, y) = vehicle.position();
        Self {
            index,
            fitness,
            distance: vehicle.distance(),
            steps: vehicle.steps(),
            alive: vehicle.is_alive(),
            x,
            y,
            heading_deg: vehicle.heading_deg(),
            speed: vehicle.speed(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationOutcome {
    pub generation: u32,
    pub ticks: u32,
    pub termination: GenerationState,
    pub agents: Vec<AgentReport>,
}

impl GenerationOutcome {
    /// Highest-fitness agent; the lowest index wins ties.
    pub fn best(&self) -> Option<&AgentReport> {
        self.agents.iter().fold(None, |best, agent| match best {
            Some(top) if agent.fitness <= top.fitness => Some(top),
            _ => Some(agent),
        })
    }

    pub fn survivors(&self) -> usize {
        self.agents.iter().filter(|agent| agent.alive).count()
    }

    pub fn fitness(&self) -> Vec<f64> {
        self.agents.iter().map(|agent| agent.fitness).collect()
    }
}

/// Runs generations against a fixed [`SimConfig`] and counts them.
#[derive(Clone, Debug)]
pub struct Evaluator {
    config: SimConfig,
    generation: u32,
}

impl Evaluator {
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self {
            config,
            generation: 0,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Number of generations started so far.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Steps one vehicle per controller until every vehicle is dead or the
    /// step budget runs out.
    ///
    /// `fitness` must have one slot per controller. Slots are zeroed before
    /// the first tick, then each live agent adds its current reward once per
    /// tick.
    ///
    /// Setup asks every controller for its first decision on the spawn
    /// readings and rejects the generation with
    /// [`SimError::DegenerateController`] if any score vector has the wrong
    /// length. Those scores drive tick 0, so each controller is still called
    /// exactly once per tick. Neither `fitness` nor the generation counter is
    /// touched when setup fails.
    pub fn run_generation<C: Controller>(
        &mut self,
        track: &Track,
        controllers: &mut [C],
        fitness: &mut [f64],
    ) -> Result<GenerationOutcome, SimError> {
        if controllers.is_empty() {
            return Err(SimError::EmptyPopulation);
        }
        if fitness.len() != controllers.len() {
            return Err(SimError::FitnessLenMismatch {
                controllers: controllers.len(),
                fitness: fitness.len(),
            });
        }
        for (index, controller) in controllers.iter().enumerate() {
            let actual = controller.output_len();
            if actual != ACTION_COUNT {
                return Err(SimError::DegenerateController {
                    index,
                    expected: ACTION_COUNT,
                    actual,
                });
            }
        }

        let mut vehicles: Vec<Vehicle> = controllers
            .iter()
            .map(|_| Vehicle::spawn(&self.config, track))
            .collect();

        let mut opening = Vec::with_capacity(controllers.len());
        for (index, (vehicle, controller)) in
            vehicles.iter().zip(controllers.iter_mut()).enumerate()
        {
            let scores = controller.decide(&vehicle.readings());
            if scores.len() != ACTION_COUNT {
                return Err(SimError::DegenerateController {
                    index,
                    expected: ACTION_COUNT,
                    actual: scores.len(),
                });
            }
            opening.push(Some(scores));
        }

        fitness.fill(0.0);
        self.generation += 1;
        let generation = self.generation;
        let budget = self.config.step_budget;
        let mut alive = vehicles.len();

        tracing::info!(
            generation,
            agents = vehicles.len(),
            step_budget = budget,
            "generation started"
        );

        let mut ticks = 0u32;
        let mut state = GenerationState::Running;
        while state == GenerationState::Running {
            for (index, (vehicle, controller)) in
                vehicles.iter_mut().zip(controllers.iter_mut()).enumerate()
            {
                if !vehicle.is_alive() {
                    continue;
                }

                let scores = match opening[index].take() {
                    Some(scores) => scores,
                    None => controller.decide(&vehicle.readings()),
                };
                let action = resolve_action(index, ticks, &scores);

                vehicle.step(action, track);
                if !vehicle.is_alive() {
                    alive -= 1;
                    tracing::debug!(
                        generation,
                        agent = index,
                        tick = ticks,
                        distance = vehicle.distance(),
                        "vehicle crashed"
                    );
                }

                fitness[index] += vehicle.reward();
            }

            ticks += 1;
            state = if alive == 0 {
                GenerationState::AllDead
            } else if ticks >= budget {
                GenerationState::BudgetExhausted
            } else {
                GenerationState::Running
            };
        }

        let agents: Vec<AgentReport> = vehicles
            .iter()
            .zip(fitness.iter())
            .enumerate()
            .map(|(index, (vehicle, &score))| AgentReport::capture(index, score, vehicle))
            .collect();
        let outcome = GenerationOutcome {
            generation,
            ticks,
            termination: state,
            agents,
        };

        let best_fitness = outcome.best().map_or(0.0, |agent| agent.fitness);
        tracing::info!(
            generation,
            ticks,
            termination = state.as_str(),
            survivors = outcome.survivors(),
            best_fitness,
            "generation finished"
        );

        Ok(outcome)
    }
}

/// Maps a score vector to an action. Anything unusable is a no-op tick.
fn resolve_action(index: usize, tick: u32, scores: &[f64]) -> Option<Action> {
    if scores.len() != ACTION_COUNT {
        tracing::warn!(
            agent = index,
            tick,
            len = scores.len(),
            expected = ACTION_COUNT,
            "controller returned wrong score count; skipping action"
        );
        return None;
    }

    let action = select_action(scores).and_then(Action::from_index);
    if action.is_none() {
        tracing::warn!(
            agent = index,
            tick,
            "controller returned no comparable score; skipping action"
        );
    }
    action
}
