// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Constants Module
//!
//! Application constants and environment-based configuration values.

/// Protocol-related constants
pub mod protocol {
    /// JSON-RPC version (standard, not configurable)
    pub const JSONRPC_VERSION: &str = "2.0";

    /// Server name used in logs and health responses
    pub const SERVER_NAME: &str = "exercise-bridge-server";

    /// Server version from Cargo.toml
    pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
}

/// Environment-based configuration
pub mod env_config {
    use std::env;

    /// Bridge (JSON-RPC) port from environment or default
    pub fn bridge_port() -> u16 {
        env::var("BRIDGE_PORT")
            .unwrap_or_else(|_| "8090".to_string())
            .parse()
            .unwrap_or(8090)
    }

    /// HTTP health-endpoint port from environment or default
    pub fn health_port() -> u16 {
        env::var("HEALTH_PORT")
            .unwrap_or_else(|_| "8091".to_string())
            .parse()
            .unwrap_or(8091)
    }

    /// Store backend (`agent` or `memory`) from environment or default
    pub fn store_backend() -> String {
        env::var("STORE_BACKEND").unwrap_or_else(|_| "agent".to_string())
    }

    /// Native agent base URL from environment or default
    pub fn agent_base_url() -> String {
        env::var("AGENT_BASE_URL").unwrap_or_else(|_| "http://127.0.0.1:9700/".to_string())
    }

    /// Platform version string from environment or default
    pub fn platform_version() -> String {
        env::var("PLATFORM_VERSION").unwrap_or_else(|_| "17.0".to_string())
    }

    /// Memory-store seed file path from environment
    pub fn seed_path() -> Option<String> {
        env::var("SEED_PATH").ok()
    }

    /// Log level from environment or default
    pub fn log_level() -> String {
        env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string())
    }
}
