use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Number of messages shown in the dashboard's recent activity list
pub const DEFAULT_RECENT_MESSAGES: usize = 10;

/// Settings read from `~/.leadline/rc`
///
/// The rc file holds `key=value` lines; unknown keys and `#` comments are ignored.
///
/// ```text
/// data.location=./crm.db
/// dashboard.recent_messages=20
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_location: PathBuf,
    pub recent_messages: usize,
}

impl Config {
    /// Directory holding the rc file and the default database
    pub fn home_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".leadline"))
    }

    pub fn rc_path() -> Result<PathBuf> {
        Ok(Self::home_dir()?.join("rc"))
    }

    pub fn default_data_location() -> Result<PathBuf> {
        Ok(Self::home_dir()?.join("crm.db"))
    }

    /// Load configuration, falling back to defaults when no rc file exists
    pub fn load() -> Result<Config> {
        let rc_path = Self::rc_path()?;
        let defaults = Config {
            data_location: Self::default_data_location()?,
            recent_messages: DEFAULT_RECENT_MESSAGES,
        };

        if !rc_path.exists() {
            return Ok(defaults);
        }

        let content = std::fs::read_to_string(&rc_path)
            .with_context(|| format!("Failed to read config file: {}", rc_path.display()))?;
        let base_dir = rc_path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::parse(&content, &base_dir, defaults)
    }

    /// Apply rc file content on top of `defaults`.
    /// Relative `data.location` values resolve against `base_dir`.
    pub fn parse(content: &str, base_dir: &Path, defaults: Config) -> Result<Config> {
        let mut config = defaults;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                log::warn!("Ignoring malformed config line: {}", line);
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "data.location" => {
                    let path = PathBuf::from(value);
                    config.data_location = if path.is_relative() {
                        base_dir.join(path)
                    } else {
                        path
                    };
                }
                "dashboard.recent_messages" => {
                    config.recent_messages = value
                        .parse::<i64>()
                        .ok()
                        .and_then(|n| usize::try_from(n).ok())
                        .with_context(|| {
                            format!("Invalid dashboard.recent_messages value: '{}'", value)
                        })?;
                }
                other => log::debug!("Ignoring unknown config key: {}", other),
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> Config {
        Config {
            data_location: PathBuf::from("/home/u/.leadline/crm.db"),
            recent_messages: DEFAULT_RECENT_MESSAGES,
        }
    }

    #[test]
    fn test_parse_relative_location() {
        let config = Config::parse(
            "data.location=./custom.db\n",
            Path::new("/home/u/.leadline"),
            defaults(),
        )
        .unwrap();
        assert_eq!(config.data_location, PathBuf::from("/home/u/.leadline/./custom.db"));
        assert_eq!(config.recent_messages, 10);
    }

    #[test]
    fn test_parse_absolute_location_and_limit() {
        let config = Config::parse(
            "# comment\ndata.location=/tmp/crm.db\ndashboard.recent_messages = 3\nunknown=1\n",
            Path::new("/home/u/.leadline"),
            defaults(),
        )
        .unwrap();
        assert_eq!(config.data_location, PathBuf::from("/tmp/crm.db"));
        assert_eq!(config.recent_messages, 3);
    }

    #[test]
    fn test_parse_rejects_bad_limit() {
        let result = Config::parse(
            "dashboard.recent_messages=lots\n",
            Path::new("/"),
            defaults(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_rejects_out_of_range_limit() {
        for value in ["-1", "18446744073709551615"] {
            let result = Config::parse(
                &format!("dashboard.recent_messages={}\n", value),
                Path::new("/"),
                defaults(),
            );
            assert!(result.is_err(), "accepted {}", value);
        }
    }
}
