use crate::config::ServerConfig;
use crate::repositories::Database;

/// Application state shared across all handlers
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub config: ServerConfig,
}

impl AppState {
    /// Fresh state with empty tables
    pub fn new(config: ServerConfig) -> Self {
        Self {
            db: Database::new(),
            config,
        }
    }
}
