//! Hand-written drivers used as baselines next to evolved networks.

use racetrack_core::constants::{ACTION_COUNT, RADAR_COUNT};
use racetrack_core::{Action, Controller};
use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
pub struct DriverManifestEntry {
    pub id: String,
    pub family: String,
    pub description: String,
    pub config_hash: String,
    pub config: serde_json::Value,
}

/// Readings are ordered right-to-left: -90, -45, 0, +45, +90 degrees.
const RIGHT: usize = 0;
const FRONT_RIGHT: usize = 1;
const FRONT: usize = 2;
const FRONT_LEFT: usize = 3;
const LEFT: usize = 4;

fn vote(action: Action) -> Vec<f64> {
    let mut scores = vec![0.0; ACTION_COUNT];
    scores[action.index()] = 1.0;
    scores
}

#[derive(Clone, Copy, Debug, Serialize)]
struct FixedConfig {
    id: &'static str,
    description: &'static str,
    action: &'static str,
}

/// Votes for one action every tick regardless of readings.
struct FixedDriver {
    action: Action,
}

impl Controller for FixedDriver {
    fn decide(&mut self, _readings: &[u8]) -> Vec<f64> {
        vote(self.action)
    }
}

#[derive(Clone, Copy, Debug, Serialize)]
struct RuleConfig {
    id: &'static str,
    description: &'static str,
    /// Front bucket below which the driver always steers away.
    danger_front: u8,
    /// Left/right bucket imbalance that triggers a correction.
    steer_margin: i32,
    /// Front bucket below which the driver brakes instead of accelerating.
    brake_below: u8,
}

/// Steers toward the side with more clearance, throttles on the front ray.
struct RuleDriver {
    cfg: RuleConfig,
}

impl Controller for RuleDriver {
    fn decide(&mut self, readings: &[u8]) -> Vec<f64> {
        if readings.len() < RADAR_COUNT {
            return vote(Action::Decelerate);
        }

        let right = readings[RIGHT] as i32 + readings[FRONT_RIGHT] as i32;
        let left = readings[LEFT] as i32 + readings[FRONT_LEFT] as i32;
        let front = readings[FRONT];

        let lopsided = (left - right).abs() >= self.cfg.steer_margin;
        let action = if front < self.cfg.danger_front || lopsided {
            if left >= right {
                Action::TurnLeft
            } else {
                Action::TurnRight
            }
        } else if front < self.cfg.brake_below {
            Action::Decelerate
        } else {
            Action::Accelerate
        };
        vote(action)
    }
}

const FIXED_DRIVERS: [FixedConfig; 2] = [
    FixedConfig {
        id: "cruise",
        description: "Full throttle every tick, never steers.",
        action: "accelerate",
    },
    FixedConfig {
        id: "crawler",
        description: "Brakes every tick and settles at the minimum speed.",
        action: "decelerate",
    },
];

const RULE_DRIVERS: [RuleConfig; 2] = [
    RuleConfig {
        id: "centerline",
        description: "Keeps left/right clearance balanced, accelerates on open road.",
        danger_front: 4,
        steer_margin: 2,
        brake_below: 6,
    },
    RuleConfig {
        id: "cautious",
        description: "Corrects on any imbalance and brakes unless the road ahead is clear.",
        danger_front: 5,
        steer_margin: 1,
        brake_below: 9,
    },
];

fn fixed_action(name: &str) -> Option<Action> {
    Action::ALL
        .into_iter()
        .find(|action| action.as_str() == name)
}

pub fn driver_ids() -> Vec<&'static str> {
    FIXED_DRIVERS
        .iter()
        .map(|cfg| cfg.id)
        .chain(RULE_DRIVERS.iter().map(|cfg| cfg.id))
        .collect()
}

pub fn describe_drivers() -> Vec<(&'static str, &'static str)> {
    FIXED_DRIVERS
        .iter()
        .map(|cfg| (cfg.id, cfg.description))
        .chain(RULE_DRIVERS.iter().map(|cfg| (cfg.id, cfg.description)))
        .collect()
}

pub fn create_driver(id: &str) -> Option<Box<dyn Controller + Send>> {
    if let Some(cfg) = FIXED_DRIVERS.iter().find(|cfg| cfg.id == id) {
        let action = fixed_action(cfg.action)?;
        return Some(Box::new(FixedDriver { action }));
    }
    RULE_DRIVERS
        .iter()
        .find(|cfg| cfg.id == id)
        .map(|cfg| Box::new(RuleDriver { cfg: *cfg }) as Box<dyn Controller + Send>)
}

pub fn driver_manifest_entries() -> Vec<DriverManifestEntry> {
    let fixed = FIXED_DRIVERS
        .iter()
        .map(|cfg| manifest_entry("fixed", cfg.id, cfg.description, cfg));
    let rules = RULE_DRIVERS
        .iter()
        .map(|cfg| manifest_entry("rule", cfg.id, cfg.description, cfg));
    fixed.chain(rules).collect()
}

pub fn driver_fingerprint(id: &str) -> Option<String> {
    driver_manifest_entries()
        .into_iter()
        .find(|entry| entry.id == id)
        .map(|entry| entry.config_hash)
}

fn manifest_entry<T: Serialize>(
    family: &str,
    id: &str,
    description: &str,
    cfg: &T,
) -> DriverManifestEntry {
    let config = serde_json::to_value(cfg).unwrap_or(serde_json::Value::Null);
    DriverManifestEntry {
        id: id.to_string(),
        family: family.to_string(),
        description: description.to_string(),
        config_hash: format!("{:016x}", fnv1a64(config.to_string().as_bytes())),
        config,
    }
}

fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut hash = 0xCBF2_9CE4_8422_2325u64;
    for byte in bytes {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01B3);
    }
    hash
}
