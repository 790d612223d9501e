//! Vehicle kinematics and corner-sampled collision.

use crate::config::SimConfig;
use crate::constants::{ACTION_COUNT, RADAR_COUNT};
use crate::sensor::{Radar, SensorArray};
use crate::track::Track;

/// Discrete controller command. Discriminants are the controller output indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    TurnLeft = 0,
    TurnRight = 1,
    Decelerate = 2,
    Accelerate = 3,
}

impl Action {
    pub const ALL: [Action; ACTION_COUNT] = [
        Action::TurnLeft,
        Action::TurnRight,
        Action::Decelerate,
        Action::Accelerate,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TurnLeft => "turn_left",
            Self::TurnRight => "turn_right",
            Self::Decelerate => "decelerate",
            Self::Accelerate => "accelerate",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Kinematics {
    size_x: f64,
    size_y: f64,
    min_x: f64,
    max_x: f64,
    min_y: f64,
    max_y: f64,
    starting_speed: f64,
    min_speed: f64,
    speed_step: f64,
    turn_step_deg: f64,
    max_speed: Option<f64>,
}

#[derive(Clone, Debug)]
pub struct Vehicle {
    kin: Kinematics,
    x: f64,
    y: f64,
    heading_deg: f64,
    speed: f64,
    speed_latched: bool,
    alive: bool,
    distance: f64,
    steps: u32,
    sensors: SensorArray,
}

impl Vehicle {
    /// Spawns at the configured start pose. Sensors are read once so the
    /// first decision has input; collision is not checked until the first move.
    pub fn spawn(config: &SimConfig, track: &Track) -> Self {
        let kin = Kinematics {
            size_x: config.car_size_x,
            size_y: config.car_size_y,
            min_x: config.margin_low,
            max_x: track.width() as f64 - config.margin_high,
            min_y: config.margin_low,
            max_y: track.height() as f64 - config.margin_high,
            starting_speed: config.starting_speed,
            min_speed: config.min_speed,
            speed_step: config.speed_step,
            turn_step_deg: config.turn_step_deg,
            max_speed: config.max_speed,
        };

        let mut vehicle = Self {
            kin,
            x: config.start_x,
            y: config.start_y,
            heading_deg: config.start_heading_deg.rem_euclid(360.0),
            speed: 0.0,
            speed_latched: false,
            alive: true,
            distance: 0.0,
            steps: 0,
            sensors: SensorArray::new(config.radar_max_range),
        };
        vehicle.sense(track);
        vehicle
    }

    /// One full simulation step: steer/throttle, move, collide, re-sense.
    pub fn step(&mut self, action: Option<Action>, track: &Track) {
        self.advance(action);
        self.check_collision(track);
        self.sense(track);
    }

    /// Applies `action` (if any) then moves one step along the heading.
    pub fn advance(&mut self, action: Option<Action>) {
        if let Some(action) = action {
            self.apply(action);
        }

        if !self.speed_latched {
            self.speed = self.kin.starting_speed;
            self.speed_latched = true;
        }

        let (sin, cos) = (360.0 - self.heading_deg).to_radians().sin_cos();
        self.x = clamp_axis(self.x + cos * self.speed, self.kin.min_x, self.kin.max_x);
        self.y = clamp_axis(self.y + sin * self.speed, self.kin.min_y, self.kin.max_y);

        self.distance += self.speed;
        self.steps += 1;
    }

    pub fn apply(&mut self, action: Action) {
        match action {
            Action::TurnLeft => self.turn(self.kin.turn_step_deg),
            Action::TurnRight => self.turn(-self.kin.turn_step_deg),
            Action::Decelerate => {
                let slower = self.speed - self.kin.speed_step;
                if slower >= self.kin.min_speed {
                    self.speed = slower;
                }
            }
            Action::Accelerate => {
                let faster = self.speed + self.kin.speed_step;
                self.speed = match self.kin.max_speed {
                    Some(cap) => faster.min(cap),
                    None => faster,
                };
            }
        }
    }

    fn turn(&mut self, delta_deg: f64) {
        self.heading_deg = (self.heading_deg + delta_deg).rem_euclid(360.0);
    }

    /// Marks the vehicle dead if any corner sits on a boundary pixel.
    /// Never revives a dead vehicle.
    pub fn check_collision(&mut self, track: &Track) -> bool {
        if self.alive {
            let hit = self
                .corners()
                .iter()
                .any(|&(x, y)| track.is_boundary(x as i64, y as i64));
            if hit {
                self.alive = false;
            }
        }
        self.alive
    }

    pub fn sense(&mut self, track: &Track) {
        let (cx, cy) = self.center();
        self.sensors.sense(track, cx, cy, self.heading_deg);
    }

    #[inline]
    pub fn center(&self) -> (f64, f64) {
        (
            self.x + self.kin.size_x / 2.0,
            self.y + self.kin.size_y / 2.0,
        )
    }

    /// Collision probe points: center offset by half the width along the
    /// heading axis and its perpendicular.
    pub fn corners(&self) -> [(f64, f64); 4] {
        let (cx, cy) = self.center();
        let length = 0.5 * self.kin.size_x;
        let (sin, cos) = (360.0 - self.heading_deg).to_radians().sin_cos();

        [
            (cx + cos * length, cy + sin * length),
            (cx - sin * length, cy + cos * length),
            (cx - cos * length, cy - sin * length),
            (cx + sin * length, cy - cos * length),
        ]
    }

    pub fn readings(&self) -> [u8; RADAR_COUNT] {
        self.sensors.readings()
    }

    pub fn radars(&self) -> &[Radar; RADAR_COUNT] {
        self.sensors.radars()
    }

    /// Distance-based progress score for the current step.
    #[inline]
    pub fn reward(&self) -> f64 {
        self.distance / (self.kin.size_x / 2.0)
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    #[inline]
    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    #[inline]
    pub fn heading_deg(&self) -> f64 {
        self.heading_deg
    }

    #[inline]
    pub fn speed(&self) -> f64 {
        self.speed
    }

    #[inline]
    pub fn distance(&self) -> f64 {
        self.distance
    }

    #[inline]
    pub fn steps(&self) -> u32 {
        self.steps
    }
}

// An inverted range (tiny canvas) pins to the low margin.
#[inline]
fn clamp_axis(value: f64, low: f64, high: f64) -> f64 {
    value.min(high).max(low)
}
