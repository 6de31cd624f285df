use crate::config::MetricsConfig;
use metrics_exporter_statsd::StatsdBuilder;
use shared::metrics_defs::describe_all;

const PREFIX: &str = "product_group_reads";

#[derive(thiserror::Error, Debug)]
pub enum MetricsError {
    #[error("could not build statsd recorder: {0}")]
    Statsd(#[from] metrics_exporter_statsd::StatsdError),
    #[error("a global metrics recorder is already installed")]
    AlreadyInstalled,
}

/// Installs the StatsD recorder when metrics are configured. Without a
/// recorder every metric is discarded.
pub fn init(config: Option<&MetricsConfig>) -> Result<(), MetricsError> {
    let Some(config) = config else {
        return Ok(());
    };

    let recorder =
        StatsdBuilder::from(config.statsd_host.clone(), config.statsd_port).build(Some(PREFIX))?;
    metrics::set_global_recorder(recorder).map_err(|_| MetricsError::AlreadyInstalled)?;

    describe_all(sap_api_caller::metrics_defs::ALL_METRICS);
    tracing::info!(
        host = %config.statsd_host,
        port = config.statsd_port,
        "Sending metrics to statsd"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_config_is_noop() {
        assert!(init(None).is_ok());
    }
}
