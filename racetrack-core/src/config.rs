use serde::{Deserialize, Serialize};

use crate::constants::{
    BOUNDARY_COLOR, CAR_SIZE_X, CAR_SIZE_Y, MIN_SPEED, POSITION_MARGIN_HIGH, POSITION_MARGIN_LOW,
    RADAR_MAX_RANGE, SPEED_STEP, STARTING_SPEED, START_POSITION, STEP_BUDGET, TURN_STEP_DEG,
};
use crate::error::SimError;

/// Tunable simulation parameters. Defaults reproduce the reference track setup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub car_size_x: f64,
    pub car_size_y: f64,
    pub start_x: f64,
    pub start_y: f64,
    pub start_heading_deg: f64,
    pub margin_low: f64,
    pub margin_high: f64,
    pub starting_speed: f64,
    pub min_speed: f64,
    pub speed_step: f64,
    pub turn_step_deg: f64,
    /// `None` keeps acceleration unbounded.
    pub max_speed: Option<f64>,
    pub radar_max_range: i32,
    pub step_budget: u32,
    pub boundary_color: [u8; 4],
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            car_size_x: CAR_SIZE_X,
            car_size_y: CAR_SIZE_Y,
            start_x: START_POSITION.0,
            start_y: START_POSITION.1,
            start_heading_deg: 0.0,
            margin_low: POSITION_MARGIN_LOW,
            margin_high: POSITION_MARGIN_HIGH,
            starting_speed: STARTING_SPEED,
            min_speed: MIN_SPEED,
            speed_step: SPEED_STEP,
            turn_step_deg: TURN_STEP_DEG,
            max_speed: None,
            radar_max_range: RADAR_MAX_RANGE,
            step_budget: STEP_BUDGET,
            boundary_color: BOUNDARY_COLOR,
        }
    }
}

impl SimConfig {
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "reference" => Some(Self::default()),
            // Per-step displacement stays below the footprint width.
            "capped" => Some(Self {
                max_speed: Some(CAR_SIZE_X * 0.9),
                ..Self::default()
            }),
            "sprint" => Some(Self {
                step_budget: STEP_BUDGET / 4,
                ..Self::default()
            }),
            _ => None,
        }
    }

    pub fn preset_names() -> &'static [&'static str] {
        &["reference", "capped", "sprint"]
    }

    pub fn with_start(mut self, x: f64, y: f64) -> Self {
        self.start_x = x;
        self.start_y = y;
        self
    }

    pub fn with_heading(mut self, heading_deg: f64) -> Self {
        self.start_heading_deg = heading_deg;
        self
    }

    pub fn validate(&self) -> Result<(), SimError> {
        let positive = [
            ("car_size_x", self.car_size_x),
            ("car_size_y", self.car_size_y),
            ("starting_speed", self.starting_speed),
            ("speed_step", self.speed_step),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                let message = format!("{name} must be positive, got {value}");
                return Err(SimError::InvalidConfig(message));
            }
        }

        let non_negative = [
            ("margin_low", self.margin_low),
            ("margin_high", self.margin_high),
            ("min_speed", self.min_speed),
            ("turn_step_deg", self.turn_step_deg),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                let message = format!("{name} must be >= 0, got {value}");
                return Err(SimError::InvalidConfig(message));
            }
        }

        if !(self.start_x.is_finite()
            && self.start_y.is_finite()
            && self.start_heading_deg.is_finite())
        {
            return Err(SimError::InvalidConfig("start pose must be finite".into()));
        }

        if let Some(max_speed) = self.max_speed {
            if !(max_speed.is_finite() && max_speed >= self.starting_speed) {
                return Err(SimError::InvalidConfig(format!(
                    "max_speed ({max_speed}) must be >= starting_speed ({})",
                    self.starting_speed
                )));
            }
        }

        if self.radar_max_range <= 0 {
            return Err(SimError::InvalidConfig(format!(
                "radar_max_range must be > 0, got {}",
                self.radar_max_range
            )));
        }

        if self.step_budget == 0 {
            return Err(SimError::InvalidConfig("step_budget must be > 0".into()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        SimConfig::default()
            .validate()
            .expect("default must validate");
        for name in SimConfig::preset_names() {
            let cfg = SimConfig::preset(name).expect("preset exists");
            cfg.validate().expect("preset must validate");
        }
    }

    #[test]
    fn unknown_preset_is_none() {
        assert!(SimConfig::preset("warp-speed").is_none());
    }

    #[test]
    fn rejects_zero_step_budget() {
        let cfg = SimConfig {
            step_budget: 0,
            ..SimConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_max_speed_below_start() {
        let cfg = SimConfig {
            max_speed: Some(5.0),
            ..SimConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg: SimConfig =
            serde_json::from_str(r#"{"step_budget": 300, "max_speed": 40.0}"#).expect("parse");
        assert_eq!(cfg.step_budget, 300);
        assert_eq!(cfg.max_speed, Some(40.0));
        assert_eq!(cfg.car_size_x, CAR_SIZE_X);
        assert_eq!(cfg.boundary_color, BOUNDARY_COLOR);
    }
}
