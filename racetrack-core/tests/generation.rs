use racetrack_core::constants::{ACTION_COUNT, STEP_BUDGET};
use racetrack_core::{
    Action, Controller, Evaluator, GenerationOutcome, GenerationState, SimConfig, SimError, Track,
};

/// Votes for the same action every tick.
#[derive(Clone, Copy, Debug)]
struct Scripted(Action);

impl Controller for Scripted {
    fn decide(&mut self, _readings: &[u8]) -> Vec<f64> {
        let mut scores = vec![0.0; ACTION_COUNT];
        scores[self.0.index()] = 1.0;
        scores
    }
}

/// Turns left every third tick, otherwise accelerates.
#[derive(Clone, Debug, Default)]
struct Weaver {
    tick: u32,
}

impl Controller for Weaver {
    fn decide(&mut self, readings: &[u8]) -> Vec<f64> {
        self.tick += 1;
        let mut scores = vec![0.0; ACTION_COUNT];
        if self.tick % 3 == 0 || readings[2] < 3 {
            scores[Action::TurnLeft.index()] = 1.0;
        } else {
            scores[Action::Accelerate.index()] = 1.0;
        }
        scores
    }
}

struct Narrow;

impl Controller for Narrow {
    fn decide(&mut self, _readings: &[u8]) -> Vec<f64> {
        vec![0.0; 3]
    }

    fn output_len(&self) -> usize {
        3
    }
}

fn mix_u64(hash: u64, value: u64) -> u64 {
    hash.wrapping_mul(0x0000_0100_0000_01B3) ^ value
}

fn outcome_fingerprint(outcome: &GenerationOutcome) -> u64 {
    let mut hash = 0xCBF2_9CE4_8422_2325u64;
    hash = mix_u64(hash, outcome.ticks as u64);
    for agent in &outcome.agents {
        hash = mix_u64(hash, agent.fitness.to_bits());
        hash = mix_u64(hash, agent.x.to_bits());
        hash = mix_u64(hash, agent.y.to_bits());
        hash = mix_u64(hash, agent.heading_deg.to_bits());
        hash = mix_u64(hash, agent.steps as u64);
        hash = mix_u64(hash, agent.alive as u64);
    }
    hash
}

// Open field with a vertical wall from x = 1000 to the right edge.
fn walled_track() -> Track {
    Track::from_fn(1920, 1080, |x, _| x >= 1000).expect("track")
}

#[test]
fn straight_run_into_wall_matches_tick_accrual() {
    let track = walled_track();
    let mut evaluator = Evaluator::new(SimConfig::default()).expect("evaluator");
    let mut controllers = vec![Scripted(Action::Accelerate)];
    let mut fitness = vec![0.0];

    let outcome = evaluator
        .run_generation(&track, &mut controllers, &mut fitness)
        .expect("generation");

    // x_k = 580 + 20k + k(k-1); the front probe (x + 50) first reaches 1000 at k = 12.
    assert_eq!(outcome.termination, GenerationState::AllDead);
    assert_eq!(outcome.ticks, 12);

    let agent = &outcome.agents[0];
    assert!(!agent.alive);
    assert_eq!(agent.steps, 12);
    assert_eq!(agent.x, 952.0);
    assert_eq!(agent.speed, 42.0);

    let mut expected = 0.0;
    let mut distance = 0.0;
    for tick in 1..=12u32 {
        distance += 20.0 + 2.0 * (tick - 1) as f64;
        expected += distance / 25.0;
    }
    assert_eq!(agent.distance, distance);
    let drift = (fitness[0] - expected).abs();
    assert!(drift < 1e-9, "fitness={}", fitness[0]);
    assert_eq!(agent.fitness, fitness[0]);
}

#[test]
fn early_crash_scores_far_below_survivors() {
    // Wall below the start row as well as to the right.
    let track = Track::from_fn(1920, 1080, |x, y| x >= 1000 || y >= 820).expect("track");
    let mut evaluator = Evaluator::new(SimConfig::default()).expect("evaluator");
    let mut controllers = vec![
        Scripted(Action::Accelerate),
        Scripted(Action::Accelerate),
        Scripted(Action::TurnRight),
        Scripted(Action::Accelerate),
        Scripted(Action::Accelerate),
    ];
    let mut fitness = vec![0.0; controllers.len()];

    let outcome = evaluator
        .run_generation(&track, &mut controllers, &mut fitness)
        .expect("generation");

    assert_eq!(outcome.termination, GenerationState::AllDead);
    assert_eq!(outcome.ticks, 12);

    let crashed = &outcome.agents[2];
    assert!(!crashed.alive);
    assert!(crashed.steps < 6, "steps={}", crashed.steps);

    for index in [0, 1, 3, 4] {
        let agent = &outcome.agents[index];
        assert_eq!(agent.steps, 12, "agent {index}");
        assert!(fitness[index] > 0.0);
        assert!(fitness[index] > 5.0 * fitness[2], "agent {index}");
    }
    assert_eq!(fitness[0], fitness[4]);
    assert_eq!(outcome.best().map(|agent| agent.index), Some(0));
}

#[test]
fn generation_stops_at_step_budget() {
    // No interior walls: the position clamp keeps every probe on canvas.
    let track = Track::from_fn(1920, 1080, |_, _| false).expect("track");
    let mut evaluator = Evaluator::new(SimConfig::default()).expect("evaluator");
    let mut controllers = vec![Scripted(Action::Accelerate); 3];
    let mut fitness = vec![0.0; 3];

    let outcome = evaluator
        .run_generation(&track, &mut controllers, &mut fitness)
        .expect("generation");

    assert_eq!(outcome.termination, GenerationState::BudgetExhausted);
    assert_eq!(outcome.ticks, STEP_BUDGET);
    assert_eq!(outcome.survivors(), 3);
    for agent in &outcome.agents {
        assert_eq!(agent.steps, STEP_BUDGET);
        assert_eq!(agent.x, 1800.0);
        assert_eq!(agent.speed, 20.0 + 2.0 * (STEP_BUDGET - 1) as f64);
    }
}

#[test]
fn capped_preset_limits_speed() {
    let track = Track::from_fn(1920, 1080, |_, _| false).expect("track");
    let config = SimConfig::preset("sprint").expect("preset");
    let cap = SimConfig::preset("capped")
        .and_then(|capped| capped.max_speed)
        .expect("cap");
    let config = SimConfig {
        max_speed: Some(cap),
        ..config
    };
    let mut evaluator = Evaluator::new(config).expect("evaluator");
    let mut controllers = vec![Scripted(Action::Accelerate)];
    let mut fitness = vec![0.0];

    let outcome = evaluator
        .run_generation(&track, &mut controllers, &mut fitness)
        .expect("generation");
    assert_eq!(outcome.ticks, STEP_BUDGET / 4);
    assert_eq!(outcome.agents[0].speed, cap);
}

#[test]
fn degenerate_controller_rejected_before_any_tick() {
    let track = walled_track();
    let mut evaluator = Evaluator::new(SimConfig::default()).expect("evaluator");
    let mut controllers: Vec<Box<dyn Controller + Send>> =
        vec![Box::new(Scripted(Action::Accelerate)), Box::new(Narrow)];
    let mut fitness = vec![7.0; 2];

    let err = evaluator
        .run_generation(&track, &mut controllers, &mut fitness)
        .expect_err("narrow controller must be rejected");

    assert!(matches!(
        err,
        SimError::DegenerateController {
            index: 1,
            expected: ACTION_COUNT,
            actual: 3
        }
    ));
    assert_eq!(fitness, vec![7.0; 2]);
    assert_eq!(evaluator.generation(), 0);
}

#[test]
fn closure_with_short_scores_is_rejected_at_setup() {
    let track = walled_track();
    let mut evaluator = Evaluator::new(SimConfig::default()).expect("evaluator");
    let mut controllers = vec![|_: &[u8]| vec![0.0, 0.0, 1.0]];
    let mut fitness = vec![0.0];

    let err = evaluator
        .run_generation(&track, &mut controllers, &mut fitness)
        .expect_err("three scores must be rejected");

    assert!(matches!(
        err,
        SimError::DegenerateController {
            index: 0,
            expected: ACTION_COUNT,
            actual: 3
        }
    ));
    assert_eq!(fitness, vec![0.0]);
    assert_eq!(evaluator.generation(), 0);
}

#[test]
fn mixed_boxed_population_runs() {
    let track = walled_track();
    let mut evaluator = Evaluator::new(SimConfig::default()).expect("evaluator");
    let mut controllers: Vec<Box<dyn Controller + Send>> = vec![
        Box::new(Scripted(Action::Accelerate)),
        Box::new(Weaver::default()),
        Box::new(|_: &[u8]| vec![0.0, 0.0, 1.0, 0.0]),
    ];
    let mut fitness = vec![0.0; 3];

    let outcome = evaluator
        .run_generation(&track, &mut controllers, &mut fitness)
        .expect("generation");
    assert_eq!(outcome.agents.len(), 3);
    assert!(outcome.ticks <= STEP_BUDGET);
    assert!(fitness.iter().all(|score| *score > 0.0));
}

#[test]
fn repeated_generations_are_deterministic() {
    let track = Track::from_fn(1920, 1080, |x, y| {
        x < 40 || y < 40 || x >= 1700 || y >= 1000 || (x > 900 && x < 960 && y > 500)
    })
    .expect("track");

    let run = || {
        let mut evaluator = Evaluator::new(SimConfig::default()).expect("evaluator");
        let mut controllers = vec![Weaver::default(); 4];
        controllers[1].tick = 1;
        controllers[2].tick = 2;
        let mut fitness = vec![0.0; 4];
        let outcome = evaluator
            .run_generation(&track, &mut controllers, &mut fitness)
            .expect("generation");
        (outcome_fingerprint(&outcome), fitness)
    };

    let (first_hash, first_fitness) = run();
    let (second_hash, second_fitness) = run();
    assert_eq!(first_hash, second_hash);
    assert_eq!(first_fitness, second_fitness);
}
