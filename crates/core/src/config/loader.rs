use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Environment variables the batch tooling has always read, and the config
/// key each one now sets.
const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("BATCH_JAR_PATH", "batch.jar_path"),
    ("LOCAL_INGEST_CORES", "local.cores"),
    ("LOCAL_INGEST_MEM_GB", "local.memory_gb"),
    ("TILE_SERVER_BUCKET", "output.tile_server_bucket"),
    ("ROLLBAR_SERVER_TOKEN", "reporting.rollbar_token"),
    ("ENVIRONMENT", "reporting.environment"),
];

/// Load configuration from defaults, an optional TOML file and the environment.
///
/// Precedence (lowest first): built-in defaults, the TOML file, the legacy
/// variables in [`LEGACY_ENV_KEYS`], then `RF_`-prefixed variables using `__`
/// as the nesting separator (`RF_LOCAL__CORES=8`).
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        figment = figment.merge(Toml::file(path));
    }

    let config: Config = figment
        .merge(legacy_env())
        .merge(Env::prefixed("RF_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

fn legacy_env() -> Env {
    let names: Vec<&str> = LEGACY_ENV_KEYS.iter().map(|(name, _)| *name).collect();
    Env::raw().only(&names).map(|key| {
        legacy_env_key(key.as_str())
            .map(Into::into)
            .unwrap_or_else(|| key.as_str().into())
    })
}

fn legacy_env_key(name: &str) -> Option<&'static str> {
    LEGACY_ENV_KEYS
        .iter()
        .find(|(legacy, _)| legacy.eq_ignore_ascii_case(name))
        .map(|(_, key)| *key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[output]
tile_server_bucket = "tiles"

[cluster]
name = "rf-ingest"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.output.tile_server_bucket, "tiles");
        assert_eq!(config.cluster.name.as_deref(), Some("rf-ingest"));
    }

    #[test]
    fn test_load_config_from_str_bad_type() {
        let toml = r#"
[local]
cores = "many"
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Some(Path::new("/nonexistent/rf-tasks.toml")));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[output]
tile_server_bucket = "tiles-from-file"

[database]
path = "/data/scenes.db"
"#
        )
        .unwrap();

        let config = load_config(Some(temp_file.path())).unwrap();
        assert_eq!(config.database.path.to_str().unwrap(), "/data/scenes.db");
        assert_eq!(config.local.cores, 32);
    }

    #[test]
    fn test_legacy_env_key_mapping() {
        assert_eq!(legacy_env_key("BATCH_JAR_PATH"), Some("batch.jar_path"));
        assert_eq!(legacy_env_key("local_ingest_cores"), Some("local.cores"));
        assert_eq!(
            legacy_env_key("TILE_SERVER_BUCKET"),
            Some("output.tile_server_bucket")
        );
        assert_eq!(legacy_env_key("HOME"), None);
    }
}
