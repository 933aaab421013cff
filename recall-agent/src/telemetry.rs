//! Logging setup.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use recall_core::GeneralConfig;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins over the configured level. Output is JSON lines when
/// `json_logs` is set. Calling this again after a subscriber is installed
/// does nothing.
pub fn init(config: &GeneralConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if config.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true).compact())
            .try_init()
    };
    if installed.is_ok() {
        tracing::debug!(level = %config.log_level, json = config.json_logs, "Logging initialised");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let config = GeneralConfig::default();
        init(&config);
        init(&GeneralConfig {
            log_level: "not a level ((".into(),
            json_logs: true,
        });
    }
}
