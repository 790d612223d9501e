pub mod config;
pub mod constants;
pub mod controller;
pub mod error;
pub mod evaluator;
pub mod sensor;
pub mod track;
pub mod vehicle;

pub use config::SimConfig;
pub use controller::{select_action, Controller};
pub use error::SimError;
pub use evaluator::{AgentReport, Evaluator, GenerationOutcome, GenerationState};
pub use track::Track;
pub use vehicle::{Action, Vehicle};
