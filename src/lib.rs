//! # qrace - Concurrent Tabular Q-Learning Benchmark Engine
//!
//! qrace studies how memory-access patterns and the (deliberate) absence of
//! synchronisation affect tabular value learning. A fixed pool of worker
//! threads splits an immutable experience trace into contiguous ranges and
//! replays it for many episodes, updating a value table with Q-learning or
//! SARSA.
//!
//! ## Key Features
//!
//! - **Sampling policies**: sequential, random-with-replacement and strided
//!   visit orders over each worker's range
//! - **Update rules**: off-policy Q-learning and on-policy epsilon-greedy SARSA
//! - **Table modes**: one shared table (racy, mutex-locked or CAS-atomic) or a
//!   private table per worker with an optional averaging merge
//! - **Reproducibility**: explicit per-worker random streams, with a
//!   deterministic LCG as the default generator
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use qrace::builders::SchedulerBuilder;
//! use qrace::sampling::SamplingKind;
//! use qrace::table::Consistency;
//! use qrace::trace::load_experiences;
//!
//! let buffer = load_experiences("FrozenLake_trajectories_1m.txt", None).unwrap();
//!
//! let scheduler = SchedulerBuilder::new()
//!     .dimensions(16, 4)
//!     .workers(16)
//!     .episodes(2000)
//!     .sampling(SamplingKind::Stride)
//!     .shared(Consistency::Racy)
//!     .build()
//!     .unwrap();
//!
//! let outcome = scheduler.run(&buffer).unwrap();
//! println!("{:?}", outcome.elapsed);
//! ```
//!
//! ## Module Organization
//!
//! - [`algorithms`] - Q-learning and SARSA update rules
//! - [`builders`] - Builder for the worker pool
//! - [`config`] - Serializable run configuration
//! - [`error`] - Error types and result handling
//! - [`experience`] - Transitions and the immutable experience buffer
//! - [`metrics`] - Table statistics and divergence checks
//! - [`partition`] - Per-worker index ranges
//! - [`policy`] - Epsilon-greedy action selection
//! - [`report`] - Text and JSON result rendering
//! - [`rng`] - Per-worker random sources
//! - [`sampling`] - Visit orders over a range
//! - [`scheduler`] - The worker pool
//! - [`table`] - Shared and private value tables
//! - [`trace`] - Experience trace loading

pub mod algorithms;
pub mod builders;
pub mod config;
pub mod error;
pub mod experience;
pub mod metrics;
pub mod partition;
pub mod policy;
pub mod report;
pub mod rng;
pub mod sampling;
pub mod scheduler;
pub mod table;
pub mod trace;

pub use error::{QraceError, Result};
