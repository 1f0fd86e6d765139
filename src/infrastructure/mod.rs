// Infrastructure module: configuration, logging and server lifecycle

pub mod server;
pub mod telemetry;

pub use server::{start_server, ConfigError, ServerConfig};
pub use telemetry::init_tracing;
