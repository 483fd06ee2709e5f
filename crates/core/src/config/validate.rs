use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - The tile server bucket is set (no default exists)
/// - Local execution has at least one core and 1 GB of memory
/// - Retry policies allow at least one attempt
/// - Cluster polling intervals are non-zero and ordered
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.output.tile_server_bucket.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "output.tile_server_bucket must be set (TILE_SERVER_BUCKET)".to_string(),
        ));
    }

    if config.local.cores == 0 || config.local.memory_gb == 0 {
        return Err(ConfigError::ValidationError(
            "local.cores and local.memory_gb must be greater than 0".to_string(),
        ));
    }

    for (name, policy) in [
        ("retry.submission", &config.retry.submission),
        ("retry.status_wait", &config.retry.status_wait),
    ] {
        if policy.max_attempts == 0 {
            return Err(ConfigError::ValidationError(format!(
                "{}.max_attempts cannot be 0",
                name
            )));
        }
    }

    let cluster = &config.cluster;
    if cluster.poll_initial_secs == 0 || cluster.poll_max_secs < cluster.poll_initial_secs {
        return Err(ConfigError::ValidationError(
            "cluster.poll_initial_secs must be > 0 and <= cluster.poll_max_secs".to_string(),
        ));
    }

    if config.datasources.landsat8.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "datasources.landsat8 cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.output.tile_server_bucket = "tiles".to_string();
        config
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_missing_bucket_fails() {
        let config = Config::default();
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(err.to_string().contains("tile_server_bucket"));
    }

    #[test]
    fn test_validate_zero_cores_fails() {
        let mut config = valid_config();
        config.local.cores = 0;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_zero_attempts_fails() {
        let mut config = valid_config();
        config.retry.status_wait.max_attempts = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("retry.status_wait"));
    }

    #[test]
    fn test_validate_poll_bounds() {
        let mut config = valid_config();
        config.cluster.poll_initial_secs = 120;
        config.cluster.poll_max_secs = 60;
        assert!(validate_config(&config).is_err());
    }
}
