pub mod api;
pub mod auth;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod menu;

pub use api::{ApiClient, ConnectApi};
pub use auth::{AuthFlow, AuthStage, AuthState, ResendState, Session};
pub use config::ConnectConfig;
pub use coordinator::{AppCoordinator, Route};
pub use error::{ConnectError, NetworkError};
pub use menu::{Loadable, MenuFlow, MenuState};

/// Install the global tracing subscriber. Call once from the embedding app,
/// before any flow is constructed. Filtering defaults to `info` and can be
/// overridden through `RUST_LOG`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
