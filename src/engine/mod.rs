//! Synchronization engine: discovery, cascade into dependents, and the
//! per-environment state they maintain.

pub mod bootstrap;
pub mod cascade;
pub mod context;
pub mod discovery;
pub mod query;
pub mod tick;

#[cfg(test)]
pub(crate) mod testing;

pub use bootstrap::{build_environment, build_environments};
pub use cascade::{discover_dependents, CascadeReport};
pub use context::{CategorySets, EnvironmentContext, Environments, TickGuard};
pub use discovery::{discover_category, DiscoveryReport};
pub use query::{category_payloads, histories, stats, EnvironmentStats};
pub use tick::{run_tick, TickOutcome};
