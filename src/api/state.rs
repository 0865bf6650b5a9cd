use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::engine::{EnvironmentContext, Environments};
use crate::error::Result;

/// Shared application state for API handlers
#[derive(Clone)]
pub struct AppState {
    /// Mirrored environments, read-only from the API's point of view
    pub environments: Arc<Environments>,

    /// Application start time
    pub start_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(environments: Arc<Environments>) -> Self {
        Self {
            environments,
            start_time: Utc::now(),
        }
    }

    /// Resolve the environment named in a request path
    pub fn environment(&self, name: &str) -> Result<&Arc<EnvironmentContext>> {
        self.environments.resolve(name)
    }

    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.start_time).num_seconds()
    }
}
