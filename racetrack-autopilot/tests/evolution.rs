use anyhow::Result;
use racetrack_autopilot::evolution::{run_evolution, EvolutionConfig, EvolutionReport};
use racetrack_core::{SimConfig, Track};
use std::fs;

fn small_run() -> EvolutionConfig {
    EvolutionConfig {
        population: 8,
        generations: 5,
        hidden: 3,
        seed: 0xC0FF_EE01,
        ..EvolutionConfig::default()
    }
}

fn sim() -> SimConfig {
    SimConfig {
        step_budget: 150,
        ..SimConfig::default()
    }
}

fn track() -> Result<Track> {
    Ok(Track::from_fn(1920, 1080, |x, y| {
        x < 40 || y < 40 || y >= 1040 || (x >= 1100 && y > 400)
    })?)
}

#[test]
fn best_fitness_never_drops_with_elitism() -> Result<()> {
    let report = run_evolution(&small_run(), &sim(), &track()?, None)?;

    assert_eq!(report.generations_run, 5);
    assert_eq!(report.generations.len(), 5);
    for pair in report.generations.windows(2) {
        assert!(
            pair[1].best_fitness >= pair[0].best_fitness,
            "generation {} regressed: {} < {}",
            pair[1].generation,
            pair[1].best_fitness,
            pair[0].best_fitness
        );
    }
    let last = report.generations.last().map(|g| g.best_fitness);
    assert_eq!(last, Some(report.best_fitness));
    Ok(())
}

#[test]
fn evolution_is_deterministic_for_a_seed() -> Result<()> {
    let track = track()?;
    let first = run_evolution(&small_run(), &sim(), &track, None)?;
    let second = run_evolution(&small_run(), &sim(), &track, None)?;

    let curve = |report: &EvolutionReport| -> Vec<u64> {
        report
            .generations
            .iter()
            .map(|g| g.best_fitness.to_bits() ^ g.mean_fitness.to_bits())
            .collect()
    };
    assert_eq!(curve(&first), curve(&second));
    Ok(())
}

#[test]
fn target_fitness_stops_early_and_report_is_written() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = EvolutionConfig {
        target_fitness: Some(1.0),
        ..small_run()
    };
    let report = run_evolution(&config, &sim(), &track()?, Some(dir.path()))?;

    assert!(report.reached_target);
    assert_eq!(report.generations_run, 1);

    let written_bytes = fs::read(dir.path().join("evolution.json"))?;
    let written: EvolutionReport = serde_json::from_slice(&written_bytes)?;
    assert_eq!(written.generations_run, 1);
    assert_eq!(written.seed_hex, "0xc0ffee01");
    assert_eq!(written.config, report.config);
    Ok(())
}
