use crate::drivers::{create_driver, driver_fingerprint};
use anyhow::{anyhow, Context, Result};
use racetrack_core::constants::ACTION_COUNT;
use racetrack_core::{select_action, Controller, Evaluator, SimConfig, Track};
use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
pub struct RunMetrics {
    pub driver_id: String,
    pub driver_fingerprint: String,
    pub start_x: f64,
    pub start_y: f64,
    pub start_heading_deg: f64,
    pub step_budget: u32,
    pub ticks: u32,
    pub termination: String,
    pub fitness: f64,
    pub distance: f64,
    pub steps: u32,
    pub crashed: bool,
    pub final_x: f64,
    pub final_y: f64,
    pub final_heading_deg: f64,
    pub final_speed: f64,
    pub turn_left_ticks: u32,
    pub turn_right_ticks: u32,
    pub decelerate_ticks: u32,
    pub accelerate_ticks: u32,
    pub idle_ticks: u32,
}

/// Tallies which action each decision resolves to.
struct CountingController<'a> {
    inner: &'a mut dyn Controller,
    counts: [u32; ACTION_COUNT],
    idle: u32,
}

impl Controller for CountingController<'_> {
    fn decide(&mut self, readings: &[u8]) -> Vec<f64> {
        let scores = self.inner.decide(readings);
        match select_action(&scores) {
            Some(index) if scores.len() == ACTION_COUNT => self.counts[index] += 1,
            _ => self.idle += 1,
        }
        scores
    }

    fn output_len(&self) -> usize {
        self.inner.output_len()
    }
}

pub fn run_driver(driver_id: &str, config: &SimConfig, track: &Track) -> Result<RunMetrics> {
    let mut driver =
        create_driver(driver_id).ok_or_else(|| anyhow!("unknown driver '{driver_id}'"))?;
    run_controller_instance(driver_id, driver.as_mut(), config, track)
}

/// Runs a single-agent generation and summarises it.
pub fn run_controller_instance(
    driver_id: &str,
    controller: &mut dyn Controller,
    config: &SimConfig,
    track: &Track,
) -> Result<RunMetrics> {
    let mut evaluator = Evaluator::new(config.clone()).context("invalid simulation config")?;
    let mut counted = [CountingController {
        inner: controller,
        counts: [0; ACTION_COUNT],
        idle: 0,
    }];
    let mut fitness = [0.0];

    let outcome = evaluator
        .run_generation(track, &mut counted, &mut fitness)
        .with_context(|| format!("run failed for driver={driver_id}"))?;
    let agent = outcome
        .agents
        .first()
        .ok_or_else(|| anyhow!("generation returned no agents"))?;
    let [turn_left, turn_right, decelerate, accelerate] = counted[0].counts;

    Ok(RunMetrics {
        driver_id: driver_id.to_string(),
        driver_fingerprint: driver_fingerprint(driver_id).unwrap_or_else(|| "custom".to_string()),
        start_x: config.start_x,
        start_y: config.start_y,
        start_heading_deg: config.start_heading_deg,
        step_budget: config.step_budget,
        ticks: outcome.ticks,
        termination: outcome.termination.as_str().to_string(),
        fitness: agent.fitness,
        distance: agent.distance,
        steps: agent.steps,
        crashed: !agent.alive,
        final_x: agent.x,
        final_y: agent.y,
        final_heading_deg: agent.heading_deg,
        final_speed: agent.speed,
        turn_left_ticks: turn_left,
        turn_right_ticks: turn_right,
        decelerate_ticks: decelerate,
        accelerate_ticks: accelerate,
        idle_ticks: counted[0].idle,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walled_track() -> Track {
        Track::from_fn(1920, 1080, |x, _| x >= 1000).expect("track")
    }

    #[test]
    fn cruise_hits_the_wall() -> Result<()> {
        let metrics = run_driver("cruise", &SimConfig::default(), &walled_track())?;
        assert!(metrics.crashed);
        assert_eq!(metrics.termination, "all_dead");
        assert_eq!(metrics.steps, 12);
        assert_eq!(metrics.accelerate_ticks, 12);
        assert_eq!(metrics.turn_left_ticks + metrics.turn_right_ticks, 0);
        assert!(metrics.fitness > 0.0);
        Ok(())
    }

    #[test]
    fn action_counts_cover_every_step() -> Result<()> {
        let config = SimConfig {
            step_budget: 200,
            ..SimConfig::default()
        };
        let metrics = run_driver("centerline", &config, &walled_track())?;
        let counted = metrics.turn_left_ticks
            + metrics.turn_right_ticks
            + metrics.decelerate_ticks
            + metrics.accelerate_ticks
            + metrics.idle_ticks;
        assert_eq!(counted, metrics.steps);
        Ok(())
    }

    #[test]
    fn unknown_driver_is_an_error() {
        let err = run_driver("ghost", &SimConfig::default(), &walled_track())
            .expect_err("unknown driver");
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn invalid_config_is_reported() {
        let config = SimConfig {
            step_budget: 0,
            ..SimConfig::default()
        };
        assert!(run_driver("cruise", &config, &walled_track()).is_err());
    }
}
