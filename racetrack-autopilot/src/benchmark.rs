use crate::drivers::driver_ids;
use crate::runner::{run_driver, RunMetrics};
use crate::util::write_json;
use anyhow::{anyhow, Context, Result};
use racetrack_core::{SimConfig, Track};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    Fitness,
    Distance,
    Survival,
}

impl Objective {
    pub fn run_value(self, metrics: &RunMetrics) -> f64 {
        match self {
            Self::Fitness => metrics.fitness,
            Self::Distance => metrics.distance,
            Self::Survival => {
                let bonus = if metrics.crashed { 0.0 } else { 0.5 };
                metrics.steps as f64 + bonus
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fitness => "fitness",
            Self::Distance => "distance",
            Self::Survival => "survival",
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct StartPose {
    pub x: f64,
    pub y: f64,
    pub heading_deg: f64,
}

impl StartPose {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            x: config.start_x,
            y: config.start_y,
            heading_deg: config.start_heading_deg,
        }
    }

    pub fn apply(&self, config: &SimConfig) -> SimConfig {
        config
            .clone()
            .with_start(self.x, self.y)
            .with_heading(self.heading_deg)
    }
}

#[derive(Clone, Debug)]
pub struct BenchmarkConfig {
    pub drivers: Vec<String>,
    pub starts: Vec<StartPose>,
    pub sim: SimConfig,
    pub objective: Objective,
    pub out_dir: PathBuf,
    pub jobs: Option<usize>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunRecord {
    pub driver_id: String,
    pub driver_fingerprint: String,
    pub start_index: usize,
    pub start: StartPose,
    pub ticks: u32,
    pub fitness: f64,
    pub distance: f64,
    pub steps: u32,
    pub crashed: bool,
    pub objective_value: f64,
    pub turn_ticks: u32,
    pub accelerate_ticks: u32,
    pub decelerate_ticks: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DriverAggregate {
    pub driver_id: String,
    pub driver_fingerprint: String,
    pub runs: usize,
    pub avg_fitness: f64,
    pub max_fitness: f64,
    pub avg_distance: f64,
    pub avg_steps: f64,
    pub max_steps: u32,
    pub crash_rate: f64,
    pub objective_value: f64,
    pub avg_turn_ticks: f64,
    pub avg_accelerate_ticks: f64,
    pub avg_decelerate_ticks: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub generated_unix_s: u64,
    pub objective: Objective,
    pub step_budget: u32,
    pub jobs: Option<usize>,
    pub drivers: Vec<String>,
    pub starts: Vec<StartPose>,
    pub run_count: usize,
    pub driver_rankings: Vec<DriverAggregate>,
    pub runs: Vec<RunRecord>,
}

#[derive(Clone, Debug)]
struct InternalRun {
    start_index: usize,
    start: StartPose,
    metrics: RunMetrics,
    objective_value: f64,
}

pub fn resolve_drivers(input: Option<&str>) -> Result<Vec<String>> {
    match input {
        None => Ok(driver_ids().iter().map(|id| (*id).to_string()).collect()),
        Some(raw) => {
            let known = driver_ids();
            let mut drivers = Vec::new();
            for token in raw.split(',') {
                let token = token.trim();
                if token.is_empty() {
                    continue;
                }
                if !known.iter().any(|id| *id == token) {
                    return Err(anyhow!(
                        "unknown driver '{token}'. available: {}",
                        known.join(", ")
                    ));
                }
                drivers.push(token.to_string());
            }
            if drivers.is_empty() {
                return Err(anyhow!("--drivers resolved to empty list"));
            }
            Ok(drivers)
        }
    }
}

pub fn run_benchmark(config: BenchmarkConfig, track: &Track) -> Result<BenchmarkReport> {
    if config.starts.is_empty() {
        return Err(anyhow!("benchmark requires at least one start pose"));
    }
    if config.drivers.is_empty() {
        return Err(anyhow!("benchmark requires at least one driver"));
    }
    if let Some(jobs) = config.jobs {
        if jobs == 0 {
            return Err(anyhow!("benchmark --jobs must be >= 1 when provided"));
        }
    }
    config.sim.validate().context("invalid simulation config")?;
    fs::create_dir_all(&config.out_dir)
        .with_context(|| format!("failed creating {}", config.out_dir.display()))?;

    let run_jobs: Vec<(String, usize, StartPose)> = config
        .drivers
        .iter()
        .flat_map(|driver| {
            config
                .starts
                .iter()
                .enumerate()
                .map(move |(index, start)| (driver.clone(), index, *start))
        })
        .collect();

    tracing::info!(
        runs = run_jobs.len(),
        drivers = config.drivers.len(),
        starts = config.starts.len(),
        objective = config.objective.as_str(),
        "benchmark started"
    );

    let run_one = |job: &(String, usize, StartPose)| -> Result<InternalRun> {
        let (driver_id, start_index, start) = job;
        let sim = start.apply(&config.sim);
        let metrics = run_driver(driver_id, &sim, track).with_context(|| {
            format!("benchmark run failed for driver={driver_id} start={start_index}")
        })?;
        let objective_value = config.objective.run_value(&metrics);
        Ok(InternalRun {
            start_index: *start_index,
            start: *start,
            metrics,
            objective_value,
        })
    };

    let run_results: Vec<Result<InternalRun>> = if let Some(jobs) = config.jobs {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .context("failed to build rayon threadpool")?;
        pool.install(|| run_jobs.par_iter().map(run_one).collect())
    } else {
        run_jobs.par_iter().map(run_one).collect()
    };

    let mut runs = Vec::with_capacity(run_results.len());
    for result in run_results {
        runs.push(result?);
    }

    let mut grouped: BTreeMap<String, Vec<&InternalRun>> = BTreeMap::new();
    for run in &runs {
        grouped
            .entry(run.metrics.driver_id.clone())
            .or_default()
            .push(run);
    }

    let mut rankings = Vec::new();
    for (driver_id, driver_runs) in grouped {
        let count = driver_runs.len() as f64;
        let mean = |value: fn(&InternalRun) -> f64| {
            driver_runs.iter().map(|run| value(run)).sum::<f64>() / count
        };
        let driver_fingerprint = driver_runs
            .first()
            .map(|run| run.metrics.driver_fingerprint.clone())
            .unwrap_or_else(|| "unknown".to_string());
        let max_fitness = driver_runs
            .iter()
            .map(|run| run.metrics.fitness)
            .fold(0.0, f64::max);
        let max_steps = driver_runs
            .iter()
            .map(|run| run.metrics.steps)
            .max()
            .unwrap_or_default();
        let crashes = driver_runs.iter().filter(|run| run.metrics.crashed).count();

        rankings.push(DriverAggregate {
            driver_id,
            driver_fingerprint,
            runs: driver_runs.len(),
            avg_fitness: mean(|run| run.metrics.fitness),
            max_fitness,
            avg_distance: mean(|run| run.metrics.distance),
            avg_steps: mean(|run| run.metrics.steps as f64),
            max_steps,
            crash_rate: crashes as f64 / count,
            objective_value: mean(|run| run.objective_value),
            avg_turn_ticks: mean(|run| {
                (run.metrics.turn_left_ticks + run.metrics.turn_right_ticks) as f64
            }),
            avg_accelerate_ticks: mean(|run| run.metrics.accelerate_ticks as f64),
            avg_decelerate_ticks: mean(|run| run.metrics.decelerate_ticks as f64),
        });
    }

    rankings.sort_by(|a, b| {
        b.objective_value
            .total_cmp(&a.objective_value)
            .then_with(|| b.avg_fitness.total_cmp(&a.avg_fitness))
            .then_with(|| a.driver_id.cmp(&b.driver_id))
    });

    let mut run_records: Vec<RunRecord> = runs
        .iter()
        .map(|run| RunRecord {
            driver_id: run.metrics.driver_id.clone(),
            driver_fingerprint: run.metrics.driver_fingerprint.clone(),
            start_index: run.start_index,
            start: run.start,
            ticks: run.metrics.ticks,
            fitness: run.metrics.fitness,
            distance: run.metrics.distance,
            steps: run.metrics.steps,
            crashed: run.metrics.crashed,
            objective_value: run.objective_value,
            turn_ticks: run.metrics.turn_left_ticks + run.metrics.turn_right_ticks,
            accelerate_ticks: run.metrics.accelerate_ticks,
            decelerate_ticks: run.metrics.decelerate_ticks,
        })
        .collect();

    run_records.sort_by(|a, b| {
        b.objective_value
            .total_cmp(&a.objective_value)
            .then_with(|| a.driver_id.cmp(&b.driver_id))
            .then_with(|| a.start_index.cmp(&b.start_index))
    });

    write_runs_csv(&config.out_dir.join("runs.csv"), &run_records)?;
    write_rankings_csv(&config.out_dir.join("rankings.csv"), &rankings)?;

    let report = BenchmarkReport {
        generated_unix_s: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs(),
        objective: config.objective,
        step_budget: config.sim.step_budget,
        jobs: config.jobs,
        drivers: config.drivers,
        starts: config.starts,
        run_count: run_records.len(),
        driver_rankings: rankings,
        runs: run_records,
    };

    write_json(&config.out_dir.join("summary.json"), &report)?;

    if let Some(top) = report.driver_rankings.first() {
        tracing::info!(
            runs = report.run_count,
            leader = %top.driver_id,
            objective_value = top.objective_value,
            "benchmark finished"
        );
    }

    Ok(report)
}

fn write_runs_csv(path: &Path, rows: &[RunRecord]) -> Result<()> {
    let mut csv = String::from(
        "driver_id,driver_fingerprint,start_index,start_x,start_y,start_heading_deg,ticks,fitness,distance,steps,crashed,objective_value,turn_ticks,accelerate_ticks,decelerate_ticks\n",
    );
    for row in rows {
        csv.push_str(&format!(
            "{},{},{},{},{},{},{},{:.4},{},{},{},{:.4},{},{},{}\n",
            row.driver_id,
            row.driver_fingerprint,
            row.start_index,
            row.start.x,
            row.start.y,
            row.start.heading_deg,
            row.ticks,
            row.fitness,
            row.distance,
            row.steps,
            row.crashed,
            row.objective_value,
            row.turn_ticks,
            row.accelerate_ticks,
            row.decelerate_ticks
        ));
    }
    fs::write(path, csv).with_context(|| format!("failed writing {}", path.display()))
}

fn write_rankings_csv(path: &Path, rows: &[DriverAggregate]) -> Result<()> {
    let mut csv = String::from(
        "rank,driver_id,driver_fingerprint,runs,avg_fitness,max_fitness,avg_distance,avg_steps,max_steps,crash_rate,objective_value,avg_turn_ticks,avg_accelerate_ticks,avg_decelerate_ticks\n",
    );
    for (idx, row) in rows.iter().enumerate() {
        csv.push_str(&format!(
            "{},{},{},{},{:.4},{:.4},{:.2},{:.2},{},{:.4},{:.4},{:.2},{:.2},{:.2}\n",
            idx + 1,
            row.driver_id,
            row.driver_fingerprint,
            row.runs,
            row.avg_fitness,
            row.max_fitness,
            row.avg_distance,
            row.avg_steps,
            row.max_steps,
            row.crash_rate,
            row.objective_value,
            row.avg_turn_ticks,
            row.avg_accelerate_ticks,
            row.avg_decelerate_ticks
        ));
    }
    fs::write(path, csv).with_context(|| format!("failed writing {}", path.display()))
}
