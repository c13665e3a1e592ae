//! Checks that must pass before a logger is built.

use tracelog_core::Level;

use crate::error::ConfigError;
use crate::policy::SeverityAction;
use crate::schema::{Encoding, OutputConfiguration};

/// Validate the configuration, returning the first fatal error found.
pub fn validate(config: &OutputConfiguration) -> Result<(), ConfigError> {
    if config.component.trim().is_empty() {
        return Err(ConfigError::EmptyComponent);
    }
    validate_encoding(config)?;
    validate_sampling(config)?;
    validate_rotation(config)?;
    validate_policy(config)?;
    validate_alert(config)
}

fn validate_encoding(config: &OutputConfiguration) -> Result<(), ConfigError> {
    if config.encoding == Encoding::Console && !config.run_mode.allows_console_encoding() {
        return Err(ConfigError::InvalidEncoder {
            encoding: config.encoding,
            run_mode: config.run_mode,
        });
    }
    Ok(())
}

fn validate_sampling(config: &OutputConfiguration) -> Result<(), ConfigError> {
    let Some(sampling) = &config.sampling else { return Ok(()) };
    if sampling.initial == 0 && sampling.thereafter == 0 {
        return Err(ConfigError::InvalidSampling(
            "initial and thereafter are both 0; every record would be dropped".into(),
        ));
    }
    Ok(())
}

fn validate_rotation(config: &OutputConfiguration) -> Result<(), ConfigError> {
    if config.rotation.max_file_bytes == 0 {
        return Err(ConfigError::InvalidRotation("maxFileBytes must be > 0".into()));
    }
    Ok(())
}

/// Only error severities may forward or abort.
fn validate_policy(config: &OutputConfiguration) -> Result<(), ConfigError> {
    for level in [Level::Debug, Level::Info, Level::Warn] {
        let action = config.severity_policy.action_for(level);
        if action != SeverityAction::Record {
            return Err(ConfigError::InvalidSeverityPolicy(format!(
                "{level} records can only be recorded, not {action:?}"
            )));
        }
    }
    Ok(())
}

fn validate_alert(config: &OutputConfiguration) -> Result<(), ConfigError> {
    let Some(alert) = &config.alert else { return Ok(()) };
    if alert.endpoint.trim().is_empty() {
        return Err(ConfigError::InvalidAlert("endpoint must not be empty".into()));
    }
    if alert.queue_capacity == 0 {
        return Err(ConfigError::InvalidAlert("queueCapacity must be > 0".into()));
    }
    if alert.max_in_flight == 0 {
        return Err(ConfigError::InvalidAlert("maxInFlight must be > 0".into()));
    }
    if alert.timeout_ms == 0 {
        return Err(ConfigError::InvalidAlert("timeoutMs must be > 0".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::SeverityPolicy;
    use crate::run_mode::RunMode;
    use crate::schema::{AlertConfig, SamplingConfig};

    #[test]
    fn accepts_defaults() {
        assert!(validate(&OutputConfiguration::new("svc", RunMode::Prod)).is_ok());
    }

    #[test]
    fn console_only_in_dev_and_debug() {
        for mode in [RunMode::Dev, RunMode::Debug] {
            let cfg = OutputConfiguration::new("svc", mode).with_encoding(Encoding::Console);
            assert!(validate(&cfg).is_ok(), "{mode} should allow console");
        }
        for mode in [RunMode::Test, RunMode::Pre, RunMode::Prod, RunMode::Release] {
            let cfg = OutputConfiguration::new("svc", mode).with_encoding(Encoding::Console);
            let err = validate(&cfg).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidEncoder { .. }), "{mode}: {err}");
        }
    }

    #[test]
    fn rejects_empty_component() {
        let cfg = OutputConfiguration::new("  ", RunMode::Prod);
        assert!(matches!(validate(&cfg), Err(ConfigError::EmptyComponent)));
    }

    #[test]
    fn rejects_sampling_that_drops_everything() {
        let cfg = OutputConfiguration::new("svc", RunMode::Prod)
            .with_sampling(Some(SamplingConfig { initial: 0, thereafter: 0 }));
        assert!(matches!(validate(&cfg), Err(ConfigError::InvalidSampling(_))));
    }

    #[test]
    fn rejects_zero_sized_alert_queue() {
        let mut alert = AlertConfig::new("127.0.0.1:8031");
        alert.queue_capacity = 0;
        let cfg = OutputConfiguration::new("svc", RunMode::Prod).with_alert(alert);
        assert!(matches!(validate(&cfg), Err(ConfigError::InvalidAlert(_))));
    }

    #[test]
    fn rejects_forwarding_below_error() {
        let policy = SeverityPolicy::default().with_action(Level::Warn, SeverityAction::RecordAndForward);
        let cfg = OutputConfiguration::new("svc", RunMode::Prod).with_severity_policy(policy);
        assert!(matches!(validate(&cfg), Err(ConfigError::InvalidSeverityPolicy(_))));

        let relaxed = SeverityPolicy::default().with_action(Level::Critical, SeverityAction::Record);
        let cfg = OutputConfiguration::new("svc", RunMode::Prod).with_severity_policy(relaxed);
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn rejects_zero_file_cap() {
        let cfg = OutputConfiguration::new("svc", RunMode::Prod).with_max_file_bytes(0);
        assert!(matches!(validate(&cfg), Err(ConfigError::InvalidRotation(_))));
    }
}
