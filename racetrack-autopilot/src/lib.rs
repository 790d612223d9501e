pub mod benchmark;
pub mod drivers;
pub mod evolution;
pub mod network;
pub mod rng;
pub mod runner;
pub mod util;
