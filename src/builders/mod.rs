pub mod scheduler;

pub use scheduler::{SchedulerBuilder, DEFAULT_EPISODES, DEFAULT_MIN_BATCH, DEFAULT_WORKERS};
