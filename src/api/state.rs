//! Application state for the Payroll Computation Engine API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use crate::config::ConfigLoader;

/// Shared application state.
///
/// Holds the loaded payroll configuration: rate tables, pay policy,
/// statutory tables and the holiday seed.
#[derive(Clone)]
pub struct AppState {
    config: Arc<ConfigLoader>,
}

impl AppState {
    /// Creates a new application state with the given configuration loader.
    pub fn new(config: ConfigLoader) -> Self {
        Self::from_shared(Arc::new(config))
    }

    /// Creates a new application state sharing an existing configuration.
    pub fn from_shared(config: Arc<ConfigLoader>) -> Self {
        Self { config }
    }

    /// Returns a reference to the configuration loader.
    pub fn config(&self) -> &ConfigLoader {
        &self.config
    }
}
