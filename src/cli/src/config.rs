use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use color_eyre::eyre::WrapErr;
use serde::{Deserialize, Serialize};
use twophase::DirStore;

pub const DEFAULT_MAX_LENGTH: usize = 20;
pub const DEFAULT_TIMEOUT_SECS: f64 = 3.0;
pub const DEFAULT_PORT: u16 = 8080;

/// Settings read from the configuration file. Anything left out falls back to
/// the command line or the defaults.
#[derive(Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory the solver tables are kept in.
    pub table_dir: Option<PathBuf>,
    /// Stop searching as soon as a solution this short is found.
    pub max_length: Option<usize>,
    pub timeout_secs: Option<f64>,
    /// Port of the `serve` command.
    pub port: Option<u16>,
}

/// What a search runs with once the command line, the configuration file and
/// the defaults are merged.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchSettings {
    pub max_length: usize,
    pub timeout: Duration,
}

impl Config {
    /// Reads the configuration file, or the empty configuration without one.
    pub fn load(path: Option<&Path>) -> color_eyre::Result<Config> {
        let Some(path) = path else {
            return Ok(Config::default());
        };
        let text = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read configuration file {}", path.display()))?;
        toml::from_str::<Config>(&text)
            .wrap_err_with(|| format!("Failed to parse configuration file {}", path.display()))
    }

    #[must_use]
    pub fn table_store(&self, table_dir: Option<PathBuf>) -> DirStore {
        table_dir
            .or_else(|| self.table_dir.clone())
            .map_or_else(DirStore::default_location, DirStore::new)
    }

    pub fn search_settings(
        &self,
        max_length: Option<usize>,
        timeout_secs: Option<f64>,
    ) -> color_eyre::Result<SearchSettings> {
        let timeout_secs = timeout_secs
            .or(self.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Ok(SearchSettings {
            max_length: max_length.or(self.max_length).unwrap_or(DEFAULT_MAX_LENGTH),
            timeout: Duration::try_from_secs_f64(timeout_secs)
                .wrap_err_with(|| format!("Invalid timeout of {timeout_secs} seconds"))?,
        })
    }

    #[must_use]
    pub fn port(&self, port: Option<u16>) -> u16 {
        port.or(self.port).unwrap_or(DEFAULT_PORT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn test_parse_partial_config() {
        let config = toml::from_str::<Config>("max_length = 24\nport = 9000\n").unwrap();
        assert_eq!(
            config,
            Config {
                table_dir: None,
                max_length: Some(24),
                timeout_secs: None,
                port: Some(9000),
            }
        );
        assert!(toml::from_str::<Config>("maxlen = 24\n").is_err());
    }

    #[test_log::test]
    fn test_precedence() {
        let config = Config {
            table_dir: Some(PathBuf::from("/from/file")),
            max_length: Some(24),
            timeout_secs: Some(0.5),
            port: None,
        };

        let settings = config.search_settings(None, None).unwrap();
        assert_eq!(settings.max_length, 24);
        assert_eq!(settings.timeout, Duration::from_millis(500));

        let settings = config.search_settings(Some(18), Some(2.0)).unwrap();
        assert_eq!(settings.max_length, 18);
        assert_eq!(settings.timeout, Duration::from_secs(2));

        assert_eq!(config.port(None), DEFAULT_PORT);
        assert_eq!(config.port(Some(1234)), 1234);

        assert_eq!(config.table_store(None).dir(), Path::new("/from/file"));
        assert_eq!(
            config.table_store(Some(PathBuf::from("/from/cli"))).dir(),
            Path::new("/from/cli")
        );
    }

    #[test_log::test]
    fn test_defaults() {
        let settings = Config::default().search_settings(None, None).unwrap();
        assert_eq!(settings.max_length, DEFAULT_MAX_LENGTH);
        assert_eq!(settings.timeout, Duration::from_secs(3));
        assert!(Config::default().search_settings(None, Some(-1.0)).is_err());
        assert_eq!(Config::load(None).unwrap(), Config::default());
    }
}
