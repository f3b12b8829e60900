mod error;
pub mod generator;
mod runner;
pub mod scheduler;

pub use error::RunnerError;
pub use generator::generate;
pub use runner::{ExerciseRunner, TimerTask};
