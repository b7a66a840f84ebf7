//! Configuration module for the CRM core.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Onboarding stages used when the deployment does not configure its own flow.
const DEFAULT_PROCESS_FLOW: &[&str] = &[
    "Document Collection",
    "KYC Verification",
    "Proposal Drafting",
    "Premium Payment",
    "Policy Issued",
];

/// Core configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Days without a mutation before a board card is flagged stale
    pub stale_after_days: i64,
    /// Ordered member-onboarding stage list
    pub process_flow: Vec<String>,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let stale_after_days = env::var("CRM_STALE_AFTER_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|days| *days > 0)
            .unwrap_or(7);

        let process_flow = env::var("CRM_PROCESS_FLOW")
            .ok()
            .map(|v| parse_flow(&v))
            .filter(|flow| !flow.is_empty())
            .unwrap_or_else(default_process_flow);

        let log_level = env::var("CRM_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Self {
            stale_after_days,
            process_flow,
            log_level,
        }
    }

    /// Install the global tracing subscriber, honoring `RUST_LOG` over the
    /// configured level. The hosting shell calls this once at startup; later
    /// calls are no-ops.
    pub fn init_tracing(&self) {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.log_level));

        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .ok();
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stale_after_days: 7,
            process_flow: default_process_flow(),
            log_level: "info".to_string(),
        }
    }
}

fn default_process_flow() -> Vec<String> {
    DEFAULT_PROCESS_FLOW.iter().map(|s| s.to_string()).collect()
}

/// Parse a comma-separated stage list, trimming whitespace and dropping
/// empty segments.
fn parse_flow(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // Clear any existing env vars
        env::remove_var("CRM_STALE_AFTER_DAYS");
        env::remove_var("CRM_PROCESS_FLOW");
        env::remove_var("CRM_LOG_LEVEL");

        let config = Config::from_env();

        assert_eq!(config.stale_after_days, 7);
        assert_eq!(config.process_flow.len(), 5);
        assert_eq!(config.process_flow[0], "Document Collection");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_parse_flow_trims_and_drops_empty() {
        let flow = parse_flow(" Docs , Review ,, Issue ");
        assert_eq!(flow, vec!["Docs", "Review", "Issue"]);

        assert!(parse_flow("  ,  ,").is_empty());
    }
}
