//! Configuration layering, file discovery, and environment overrides

use crate::server::{self, ServerConfig};
use crate::ConfigResult;
use camino::{Utf8Path, Utf8PathBuf};
use pkgcdn_core::error::CdnError;
use std::collections::HashMap;

/// File name searched for when no explicit path is given
pub const CONFIG_FILE_NAME: &str = "pkgcdn.toml";

/// Prefix of environment variables that override configuration
pub const ENV_PREFIX: &str = "PKGCDN_";

/// Main configuration loading interface
pub struct ConfigLoader {
    /// Current working directory
    cwd: Utf8PathBuf,
}

/// Configuration source tracking
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// Built-in defaults, no file found
    Defaults,
    /// Explicit `--config` path
    Explicit(Utf8PathBuf),
    /// pkgcdn.toml discovered by walking up from the working directory
    Discovered(Utf8PathBuf),
}

/// Configuration layering: file, then environment, then command line
pub struct ConfigLayering;

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new(cwd: Utf8PathBuf) -> Self {
        Self { cwd }
    }

    /// Load the file layer: an explicit path must exist, otherwise
    /// pkgcdn.toml is looked up from the working directory upwards.
    pub async fn load_file_config(&self, explicit: Option<&Utf8Path>) -> ConfigResult<(ServerConfig, ConfigSource)> {
        if let Some(path) = explicit {
            let config = server::load_from_file(path).await?;
            return Ok((config, ConfigSource::Explicit(path.to_path_buf())));
        }

        match self.find_config_file(CONFIG_FILE_NAME) {
            Some(path) => {
                let config = server::load_from_file(&path).await?;
                Ok((config, ConfigSource::Discovered(path)))
            }
            None => Ok((ServerConfig::default(), ConfigSource::Defaults)),
        }
    }

    /// Find configuration file in the working directory or its ancestors
    pub fn find_config_file(&self, filename: &str) -> Option<Utf8PathBuf> {
        let mut current = Some(self.cwd.as_path());

        while let Some(dir) = current {
            let candidate = dir.join(filename);
            if candidate.exists() {
                return Some(candidate);
            }
            current = dir.parent();
        }

        None
    }
}

impl ConfigLayering {
    /// Apply every override layer to a file config and validate the result
    pub fn merge_configs(
        file_config: ServerConfig,
        env_overrides: HashMap<String, String>,
        cli_overrides: HashMap<String, String>,
    ) -> ConfigResult<ServerConfig> {
        let mut merged = file_config;

        // Apply environment variable overrides
        Self::apply_env_overrides(&mut merged, &env_overrides)?;

        // Apply CLI flag overrides (highest priority)
        Self::apply_cli_overrides(&mut merged, &cli_overrides)?;

        server::validate_config(&merged)?;

        Ok(merged)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(config: &mut ServerConfig, overrides: &HashMap<String, String>) -> ConfigResult<()> {
        for (key, value) in overrides {
            match key.as_str() {
                "PKGCDN_PORT" => config.port = parse_field(key, value)?,
                "PKGCDN_ORIGIN" => config.origin = value.clone(),
                "PKGCDN_PUBLIC_REGISTRY_URL" => config.registry.public_url = value.clone(),
                "PKGCDN_PRIVATE_REGISTRY_URL" => config.registry.private_url = Some(value.clone()),
                "PKGCDN_PRIVATE_REGISTRY_PORT" => config.registry.private_port = Some(parse_field(key, value)?),
                "PKGCDN_PRIVATE_SCOPES" => {
                    config.registry.private_scopes = value
                        .split(',')
                        .map(str::trim)
                        .filter(|scope| !scope.is_empty())
                        .map(String::from)
                        .collect();
                }
                "PKGCDN_CACHE_CAPACITY_BYTES" => config.cache.capacity_bytes = parse_field(key, value)?,
                "PKGCDN_CACHE_TTL_SECS" => config.cache.ttl_secs = parse_field(key, value)?,
                _ => {
                    // Unknown environment variable, ignore
                }
            }
        }

        Ok(())
    }

    /// Apply CLI flag overrides
    fn apply_cli_overrides(config: &mut ServerConfig, overrides: &HashMap<String, String>) -> ConfigResult<()> {
        for (key, value) in overrides {
            match key.as_str() {
                "port" => config.port = parse_field("--port", value)?,
                "origin" => config.origin = value.clone(),
                _ => {
                    // Unknown CLI override, ignore
                }
            }
        }

        Ok(())
    }

    /// Collect environment variable overrides
    pub fn collect_env_overrides() -> HashMap<String, String> {
        std::env::vars().filter(|(key, _)| key.starts_with(ENV_PREFIX)).collect()
    }
}

fn parse_field<T>(field: &str, value: &str) -> ConfigResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| CdnError::ConfigValidation {
        field: field.to_string(),
        reason: format!("invalid value '{}': {}", value, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_root() -> (TempDir, Utf8PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        (temp_dir, path)
    }

    #[tokio::test]
    async fn test_discovers_config_in_parent() {
        let (_guard, root) = temp_root();
        tokio::fs::write(root.join(CONFIG_FILE_NAME), "port = 7000\n").await.unwrap();
        let nested = root.join("a").join("b");
        tokio::fs::create_dir_all(&nested).await.unwrap();

        let loader = ConfigLoader::new(nested);
        let (config, source) = loader.load_file_config(None).await.unwrap();

        assert_eq!(config.port, 7000);
        assert_eq!(source, ConfigSource::Discovered(root.join(CONFIG_FILE_NAME)));
    }

    #[tokio::test]
    async fn test_explicit_path_must_exist() {
        let (_guard, root) = temp_root();
        let loader = ConfigLoader::new(root.clone());
        let missing = root.join("missing.toml");

        let err = loader.load_file_config(Some(&missing)).await.unwrap_err();
        assert!(matches!(err, CdnError::Io { .. }));
    }

    #[tokio::test]
    async fn test_explicit_path_reports_file_in_errors() {
        let (_guard, root) = temp_root();
        let path = root.join("bad.toml");
        tokio::fs::write(&path, "[cache]\ncapacity_bytes = 0\n").await.unwrap();

        let loader = ConfigLoader::new(root);
        let err = loader.load_file_config(Some(&path)).await.unwrap_err();
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn test_merge_precedence() {
        let file_config = ServerConfig {
            port: 7000,
            ..ServerConfig::default()
        };

        let env_overrides = HashMap::from([
            ("PKGCDN_PORT".to_string(), "7100".to_string()),
            ("PKGCDN_ORIGIN".to_string(), "https://env.example".to_string()),
            ("PKGCDN_PRIVATE_REGISTRY_URL".to_string(), "http://npm.internal:4873".to_string()),
            ("PKGCDN_PRIVATE_SCOPES".to_string(), "@corp, @team".to_string()),
            ("PKGCDN_CACHE_TTL_SECS".to_string(), "30".to_string()),
        ]);
        let cli_overrides = HashMap::from([("port".to_string(), "7200".to_string())]);

        let merged = ConfigLayering::merge_configs(file_config, env_overrides, cli_overrides).unwrap();

        // CLI wins over environment
        assert_eq!(merged.port, 7200);
        assert_eq!(merged.origin, "https://env.example");
        assert_eq!(merged.registry.private_scopes, vec!["@corp".to_string(), "@team".to_string()]);
        assert_eq!(merged.cache.ttl_secs, 30);
    }

    #[test]
    fn test_invalid_env_value() {
        let env_overrides = HashMap::from([("PKGCDN_PORT".to_string(), "eighty".to_string())]);
        let err = ConfigLayering::merge_configs(ServerConfig::default(), env_overrides, HashMap::new()).unwrap_err();
        assert!(matches!(err, CdnError::ConfigValidation { ref field, .. } if field == "PKGCDN_PORT"));
    }

    #[test]
    fn test_merged_config_is_validated() {
        let env_overrides = HashMap::from([("PKGCDN_PRIVATE_SCOPES".to_string(), "@corp".to_string())]);
        let err = ConfigLayering::merge_configs(ServerConfig::default(), env_overrides, HashMap::new()).unwrap_err();
        assert!(matches!(err, CdnError::ConfigValidation { .. }));
    }
}
