// Infrastructure: Server setup and configuration
// Single Responsibility: Manage server lifecycle and configuration

use std::net::SocketAddr;
use std::num::NonZeroUsize;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::application::{router, AppState, OptimizationService};
use crate::solver::SolverCapability;

const ADDRESS_VAR: &str = "OPTSOLVE_ADDR";
const WORKERS_VAR: &str = "OPTSOLVE_MAX_CONCURRENT_SOLVES";
const DEFAULT_ADDRESS: &str = "0.0.0.0:8000";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

pub struct ServerConfig {
    pub address: SocketAddr,
    pub capability: SolverCapability,
    pub max_concurrent_solves: usize,
}

impl ServerConfig {
    pub fn new(address: SocketAddr, capability: SolverCapability) -> Self {
        Self {
            address,
            capability,
            max_concurrent_solves: default_workers(),
        }
    }

    pub fn with_max_concurrent_solves(mut self, max_concurrent_solves: usize) -> Self {
        self.max_concurrent_solves = max_concurrent_solves;
        self
    }

    /// Read `OPTSOLVE_ADDR` and `OPTSOLVE_MAX_CONCURRENT_SOLVES`, falling back to defaults
    pub fn from_env(capability: SolverCapability) -> Result<Self, ConfigError> {
        Self::from_lookup(capability, |key| std::env::var(key).ok())
    }

    fn from_lookup(
        capability: SolverCapability,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let raw_address = lookup(ADDRESS_VAR).unwrap_or_else(|| DEFAULT_ADDRESS.to_string());
        let address = raw_address
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                key: ADDRESS_VAR,
                value: raw_address.clone(),
                reason: e.to_string(),
            })?;

        let mut config = Self::new(address, capability);

        if let Some(raw_workers) = lookup(WORKERS_VAR) {
            let workers = raw_workers
                .parse::<NonZeroUsize>()
                .map_err(|e| ConfigError::Invalid {
                    key: WORKERS_VAR,
                    value: raw_workers.clone(),
                    reason: e.to_string(),
                })?;
            config = config.with_max_concurrent_solves(workers.get());
        }

        Ok(config)
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

pub async fn start_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    print_banner(&config);

    let service = OptimizationService::new(config.capability, config.max_concurrent_solves);
    let app = router(AppState::new(service))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = TcpListener::bind(config.address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => warn!(error = %e, "Could not listen for shutdown signal"),
    }
}

fn print_banner(config: &ServerConfig) {
    info!("optsolve - bounded nonlinear optimization over HTTP");
    info!(address = %config.address, "Listening");
    info!(
        engine = config.capability.engine(),
        available = config.capability.is_available(),
        max_concurrent_solves = config.max_concurrent_solves,
        "Solver engine"
    );
    if !config.capability.is_available() {
        warn!("POST /ai/optimization/solve will answer 503 until the preferred engine is installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn uses_defaults_without_environment() {
        let config = ServerConfig::from_lookup(SolverCapability::none(), lookup_from(&[])).unwrap();
        assert_eq!(config.address, DEFAULT_ADDRESS.parse::<SocketAddr>().unwrap());
        assert!(config.max_concurrent_solves >= 1);
    }

    #[test]
    fn reads_environment_overrides() {
        let config = ServerConfig::from_lookup(
            SolverCapability::none(),
            lookup_from(&[(ADDRESS_VAR, "127.0.0.1:9100"), (WORKERS_VAR, "3")]),
        )
        .unwrap();
        assert_eq!(config.address, "127.0.0.1:9100".parse::<SocketAddr>().unwrap());
        assert_eq!(config.max_concurrent_solves, 3);
    }

    #[test]
    fn rejects_invalid_values() {
        let err = ServerConfig::from_lookup(
            SolverCapability::none(),
            lookup_from(&[(ADDRESS_VAR, "not an address")]),
        )
        .err()
        .unwrap();
        assert!(err.to_string().contains(ADDRESS_VAR));

        let err = ServerConfig::from_lookup(
            SolverCapability::none(),
            lookup_from(&[(WORKERS_VAR, "0")]),
        )
        .err()
        .unwrap();
        assert!(err.to_string().contains(WORKERS_VAR));
    }
}
