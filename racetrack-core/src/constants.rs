//! Simulation constants.
//!
//! Defaults for [`crate::config::SimConfig`]. Controllers trained against these
//! values depend on them exactly (sensor bucketing in particular).

// Canvas
pub const TRACK_WIDTH: u32 = 1920;
pub const TRACK_HEIGHT: u32 = 1080;

/// Exact RGBA value marking an impassable track edge (opaque white).
pub const BOUNDARY_COLOR: [u8; 4] = [255, 255, 255, 255];

// Vehicle footprint (square sprite)
pub const CAR_SIZE_X: f64 = 50.0;
pub const CAR_SIZE_Y: f64 = 50.0;

pub const START_POSITION: (f64, f64) = (580.0, 755.0);

// Position clamp: x in [LOW, width - HIGH], y in [LOW, height - HIGH]
pub const POSITION_MARGIN_LOW: f64 = 20.0;
pub const POSITION_MARGIN_HIGH: f64 = 120.0;

// Kinematics
pub const STARTING_SPEED: f64 = 20.0;
pub const MIN_SPEED: f64 = 12.0;
pub const SPEED_STEP: f64 = 2.0;
pub const TURN_STEP_DEG: f64 = 10.0;

// Sensors
pub const RADAR_ANGLES_DEG: [i32; 5] = [-90, -45, 0, 45, 90];
pub const RADAR_COUNT: usize = RADAR_ANGLES_DEG.len();
pub const RADAR_MAX_RANGE: i32 = 300;
pub const RADAR_BUCKET_WIDTH: i32 = 30;
pub const RADAR_MAX_BUCKET: u8 = 10;

/// Number of discrete actions a controller scores.
pub const ACTION_COUNT: usize = 4;

// Generation loop
pub const STEPS_PER_SECOND: u32 = 60;
pub const STEP_BUDGET: u32 = 20 * STEPS_PER_SECOND;
