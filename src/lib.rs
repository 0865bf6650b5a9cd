pub mod adapters;
pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod signing;
pub mod supervisor;

pub use config::AppConfig;
pub use domain::{AccountKind, Address, Category, Cluster, HistoryEntry, Payload, Record};
pub use engine::{EnvironmentContext, Environments};
pub use error::{MirrorError, Result};
pub use signing::Identity;
pub use supervisor::{RestartPolicy, Scheduler};
