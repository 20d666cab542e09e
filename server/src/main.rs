#![cfg_attr(test, allow(clippy::disallowed_methods))]
// Forbid unwrap() in production code.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
use std::net::SocketAddr;
use std::sync::Arc;

use gatehouse::{
    AppState,
    auth::{CredentialBackend, CredentialVerifier, ensure_secret},
    config::ServerConfig,
    router,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gatehouse=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment variables
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Loaded configuration: secret_directory={}, listen_port={}, pam_service={}",
        config.secret_directory.display(),
        config.listen_port,
        config.pam_service
    );

    if config.debug_mode {
        tracing::warn!("Debug mode enabled - insecure authentication is active");
    }

    // The secret must exist before any connection is accepted.
    let secret = match ensure_secret(config.secret_override.as_deref(), &config.secret_directory)
    {
        Ok((secret, source)) => {
            tracing::debug!("session secret source: {source:?}");
            secret
        }
        Err(e) => {
            tracing::error!("Failed to secure session secret: {e}");
            std::process::exit(1);
        }
    };

    let verifier = CredentialVerifier::new(
        host_backend(&config),
        config.debug_mode,
        config.auth_timeout,
    );
    let app = router(AppState::new(&secret, verifier));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.listen_port));
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to bind: {e}");
            std::process::exit(1);
        });

    axum::serve(listener, app).await.unwrap_or_else(|e| {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    });
}

#[cfg(feature = "pam")]
fn host_backend(config: &ServerConfig) -> Arc<dyn CredentialBackend> {
    Arc::new(gatehouse::auth::PamBackend::new(config.pam_service.as_str()))
}

#[cfg(not(feature = "pam"))]
fn host_backend(_config: &ServerConfig) -> Arc<dyn CredentialBackend> {
    tracing::warn!("Built without the `pam` feature; only the debug login can succeed");
    Arc::new(gatehouse::auth::UnavailableBackend)
}
