use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use racetrack_autopilot::benchmark::{
    resolve_drivers, run_benchmark, BenchmarkConfig, Objective, StartPose,
};
use racetrack_autopilot::drivers::{
    create_driver, describe_drivers, driver_ids, driver_manifest_entries,
};
use racetrack_autopilot::evolution::{run_evolution, EvolutionConfig};
use racetrack_autopilot::runner::run_driver;
use racetrack_autopilot::util::{
    parse_seed, parse_start, parse_start_list, seed_to_hex, write_json,
};
use racetrack_core::constants::{TRACK_HEIGHT, TRACK_WIDTH};
use racetrack_core::{SimConfig, Track};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Wall thickness of the synthetic track used when no image is given.
const FALLBACK_BORDER_PX: u32 = 40;

#[derive(Parser, Debug)]
#[command(name = "racetrack-autopilot")]
#[command(about = "Racetrack driver lab: runs, benchmarks and evolution")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct SimArgs {
    /// Track image; boundary pixels match the configured color exactly
    #[arg(long)]
    track: Option<PathBuf>,
    /// Simulation preset (reference, capped, sprint)
    #[arg(long, default_value = "reference")]
    preset: String,
    /// JSON simulation config; missing fields fall back to defaults
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    step_budget: Option<u32>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List available drivers
    ListDrivers,
    /// Export the driver manifest (including config fingerprints)
    DriverManifest {
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the resolved simulation and evolution configs as JSON
    ShowConfig {
        #[command(flatten)]
        sim: SimArgs,
        #[arg(long, default_value = "default")]
        evolution_preset: String,
    },
    /// Run one driver from one start pose
    Run {
        #[arg(long)]
        driver: String,
        #[command(flatten)]
        sim: SimArgs,
        /// Start pose as x,y or x,y,heading
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run every driver from every start pose in parallel
    Benchmark {
        #[arg(long)]
        drivers: Option<String>,
        /// Start poses separated by ';', e.g. "580,755;600,700,90"
        #[arg(long)]
        starts: Option<String>,
        #[command(flatten)]
        sim: SimArgs,
        #[arg(long, value_enum, default_value_t = CliObjective::Fitness)]
        objective: CliObjective,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[arg(long)]
        jobs: Option<usize>,
    },
    /// Evolve network controllers generation by generation
    Evolve {
        #[command(flatten)]
        sim: SimArgs,
        #[arg(long, default_value = "default")]
        evolution_preset: String,
        /// JSON evolution config; overrides the preset
        #[arg(long)]
        evolution_config: Option<PathBuf>,
        #[arg(long)]
        generations: Option<u32>,
        #[arg(long)]
        population: Option<usize>,
        #[arg(long)]
        seed: Option<String>,
        #[arg(long)]
        target_fitness: Option<f64>,
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliObjective {
    Fitness,
    Distance,
    Survival,
}

impl From<CliObjective> for Objective {
    fn from(value: CliObjective) -> Self {
        match value {
            CliObjective::Fitness => Objective::Fitness,
            CliObjective::Distance => Objective::Distance,
            CliObjective::Survival => Objective::Survival,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let Cli { command } = Cli::parse();

    match command {
        Commands::ListDrivers => {
            for (id, description) in describe_drivers() {
                println!("{id:12} {description}");
            }
        }
        Commands::DriverManifest { output } => {
            let manifest = driver_manifest_entries();
            if let Some(path) = output {
                write_json(&path, &manifest)?;
                println!("wrote={}", path.display());
                println!("drivers={}", manifest.len());
            } else {
                println!("{}", serde_json::to_string_pretty(&manifest)?);
            }
        }
        Commands::ShowConfig {
            sim,
            evolution_preset,
        } => {
            let sim = resolve_sim_config(&sim)?;
            let evolution = EvolutionConfig::preset(&evolution_preset).ok_or_else(|| {
                anyhow!(
                    "unknown evolution preset '{evolution_preset}'. available: {}",
                    EvolutionConfig::preset_names().join(", ")
                )
            })?;
            let resolved = serde_json::json!({
                "sim": sim,
                "evolution": evolution,
            });
            println!("{}", serde_json::to_string_pretty(&resolved)?);
        }
        Commands::Run {
            driver,
            sim,
            start,
            output,
        } => {
            if create_driver(&driver).is_none() {
                let available = driver_ids().join(", ");
                return Err(anyhow!("unknown driver '{driver}'. available: {available}"));
            }
            let mut config = resolve_sim_config(&sim)?;
            if let Some(start) = start {
                config = parse_start(&start)?.apply(&config);
            }
            let track = load_track(sim.track.as_deref(), &config)?;
            let metrics = run_driver(&driver, &config, &track)?;

            println!("driver={}", metrics.driver_id);
            println!("driver_fingerprint={}", metrics.driver_fingerprint);
            println!(
                "start={},{},{}",
                metrics.start_x, metrics.start_y, metrics.start_heading_deg
            );
            println!("ticks={}", metrics.ticks);
            println!("termination={}", metrics.termination);
            println!("fitness={:.4}", metrics.fitness);
            println!("distance={:.1}", metrics.distance);
            println!("crashed={}", metrics.crashed);
            println!(
                "final=({:.1}, {:.1}) heading={:.0} speed={:.0}",
                metrics.final_x, metrics.final_y, metrics.final_heading_deg, metrics.final_speed
            );
            println!(
                "actions=left:{} right:{} brake:{} throttle:{} idle:{}",
                metrics.turn_left_ticks,
                metrics.turn_right_ticks,
                metrics.decelerate_ticks,
                metrics.accelerate_ticks,
                metrics.idle_ticks
            );
            if let Some(path) = output {
                write_json(&path, &metrics)?;
                println!("output={}", path.display());
            }
        }
        Commands::Benchmark {
            drivers,
            starts,
            sim,
            objective,
            out_dir,
            jobs,
        } => {
            let drivers = resolve_drivers(drivers.as_deref())?;
            let config = resolve_sim_config(&sim)?;
            let starts = match starts {
                Some(raw) => parse_start_list(&raw)?,
                None => vec![StartPose::from_config(&config)],
            };
            let objective: Objective = objective.into();
            let track = load_track(sim.track.as_deref(), &config)?;

            let out_dir = out_dir.unwrap_or_else(|| {
                PathBuf::from(format!(
                    "benchmarks/{}-{}",
                    objective.as_str(),
                    timestamp_suffix()
                ))
            });

            let report = run_benchmark(
                BenchmarkConfig {
                    drivers,
                    starts,
                    sim: config,
                    objective,
                    out_dir: out_dir.clone(),
                    jobs,
                },
                &track,
            )?;

            println!("objective={}", objective.as_str());
            println!("runs={}", report.run_count);
            println!(
                "jobs={}",
                report
                    .jobs
                    .map(|value| value.to_string())
                    .unwrap_or_else(|| "auto".to_string())
            );
            println!("out_dir={}", out_dir.display());
            println!("rankings:");
            for (idx, driver) in report.driver_rankings.iter().enumerate() {
                println!(
                    "  {}. {:12} objective={:.2} avg_fitness={:.2} avg_steps={:.1} crash_rate={:.0}%",
                    idx + 1,
                    driver.driver_id,
                    driver.objective_value,
                    driver.avg_fitness,
                    driver.avg_steps,
                    driver.crash_rate * 100.0,
                );
            }
        }
        Commands::Evolve {
            sim,
            evolution_preset,
            evolution_config,
            generations,
            population,
            seed,
            target_fitness,
            out_dir,
        } => {
            let config = resolve_sim_config(&sim)?;
            let mut evolution = match evolution_config {
                Some(path) => read_json::<EvolutionConfig>(&path)?,
                None => EvolutionConfig::preset(&evolution_preset).ok_or_else(|| {
                    anyhow!(
                        "unknown evolution preset '{evolution_preset}'. available: {}",
                        EvolutionConfig::preset_names().join(", ")
                    )
                })?,
            };
            if let Some(generations) = generations {
                evolution.generations = generations;
            }
            if let Some(population) = population {
                evolution.population = population;
            }
            if let Some(seed) = seed {
                evolution.seed = parse_seed(&seed)?;
            }
            if target_fitness.is_some() {
                evolution.target_fitness = target_fitness;
            }

            let track = load_track(sim.track.as_deref(), &config)?;
            let out_dir = out_dir
                .unwrap_or_else(|| PathBuf::from(format!("evolution/{}", timestamp_suffix())));

            println!("=== Evolution ===");
            println!("seed={}", seed_to_hex(evolution.seed));
            println!("population={}", evolution.population);
            println!("generations={}", evolution.generations);
            println!("hidden={}", evolution.hidden);
            println!("out_dir={}", out_dir.display());
            println!();

            let report = run_evolution(&evolution, &config, &track, Some(&out_dir))?;

            for summary in &report.generations {
                println!(
                    "gen={:4} best={:10.2} mean={:10.2} median={:10.2} survivors={:3} ticks={}",
                    summary.generation,
                    summary.best_fitness,
                    summary.mean_fitness,
                    summary.median_fitness,
                    summary.survivors,
                    summary.ticks,
                );
            }
            println!();
            println!("generations_run={}", report.generations_run);
            println!(
                "best_fitness={:.4} (generation {})",
                report.best_fitness, report.best_generation
            );
            println!("reached_target={}", report.reached_target);
            println!("report={}", out_dir.join("evolution.json").display());
        }
    }

    Ok(())
}

fn resolve_sim_config(args: &SimArgs) -> Result<SimConfig> {
    let mut config = match &args.config {
        Some(path) => read_json::<SimConfig>(path)?,
        None => SimConfig::preset(&args.preset).ok_or_else(|| {
            anyhow!(
                "unknown preset '{}'. available: {}",
                args.preset,
                SimConfig::preset_names().join(", ")
            )
        })?,
    };
    if let Some(step_budget) = args.step_budget {
        config.step_budget = step_budget;
    }
    config.validate()?;
    Ok(config)
}

fn load_track(path: Option<&Path>, config: &SimConfig) -> Result<Track> {
    match path {
        Some(path) => Ok(Track::load(path, config.boundary_color)?),
        None => {
            tracing::info!(
                width = TRACK_WIDTH,
                height = TRACK_HEIGHT,
                border = FALLBACK_BORDER_PX,
                "no --track given, using open rectangle"
            );
            Ok(Track::bordered(
                TRACK_WIDTH,
                TRACK_HEIGHT,
                FALLBACK_BORDER_PX,
            )?)
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let data = fs::read(path).with_context(|| format!("failed reading {}", path.display()))?;
    serde_json::from_slice(&data).with_context(|| format!("failed parsing {}", path.display()))
}

fn timestamp_suffix() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("{now}")
}
