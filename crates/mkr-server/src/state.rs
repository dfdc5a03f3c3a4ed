//! Application state shared across handlers.

use std::sync::Arc;

use mkr_api::MkrApi;

use crate::config::ServerConfig;

/// Application state shared across all handlers.
///
/// The timetable client carries its own caches and session state behind an
/// `Arc`, so cloning the state per request stays cheap.
#[derive(Clone)]
pub struct AppState {
    /// Timetable client all handlers query through.
    pub api: MkrApi,

    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(api: MkrApi, config: ServerConfig) -> Self {
        Self {
            api,
            config: Arc::new(config),
        }
    }
}
