//! Supervision of the per-environment schedulers
//!
//! - Scheduler drives discovery ticks on a fixed period
//! - Restart policy brings a crashed tick loop back without overlapping runs

pub mod restart;
pub mod scheduler;

pub use restart::{supervise, RestartPolicy};
pub use scheduler::{tick_loop, Scheduler};
