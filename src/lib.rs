pub mod config;
pub mod core_state; // Explicit capability object: config, store, session provider
pub mod models;
pub mod store; // Record Store: REST + in-memory
pub mod auth; // Session Provider, session events, auth screens
pub mod notice;
pub mod routes;
pub mod access; // Access gate for protected routes
pub mod datetime;
pub mod dashboard; // View-model assembler: patient + admin
pub mod booking; // Patient appointment booking
pub mod scheduling; // Admin OT scheduling
pub mod registration; // Admin doctor registration

use tracing_subscriber::EnvFilter;

use crate::config::ClientConfig;
use crate::core_state::{CoreError, CoreState};

/// Install the global tracing subscriber. `RUST_LOG` wins over the default
/// filter. A second call is a no-op.
pub fn init_tracing() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
    }
}

/// Load settings from the environment and wire the HTTP backends.
pub fn connect_from_env() -> Result<CoreState, StartupError> {
    let config = ClientConfig::from_env()?;
    Ok(CoreState::connect(config)?)
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Core(#[from] CoreError),
}
