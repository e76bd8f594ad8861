//! Server state and configuration.

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: String,
    /// Largest canvas width a request may ask for, in pixels
    pub max_width: usize,
    /// Largest canvas height a request may ask for, in pixels
    pub max_height: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            max_width: 4096,
            max_height: 4096,
        }
    }
}

impl ServerConfig {
    /// Largest quiet zone a request may ask for, in modules.
    ///
    /// Modules are at least one pixel, so a quiet zone of this size alone
    /// already spans the smaller canvas limit.
    pub fn max_margin(&self) -> usize {
        self.max_width.min(self.max_height) / 2
    }
}

/// Application state shared across handlers.
pub struct AppState {
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }
}
