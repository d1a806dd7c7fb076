use std::{fs, path::Path, path::PathBuf, time::Duration};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::error::ConfigError;
use crate::jobs::lpstat::DEFAULT_COMMAND_TIMEOUT_SECS;
use crate::rules::RuleSet;

pub const DEFAULT_INTERVAL_SECS: i64 = 60;
pub const DEFAULT_LOG_FILE: &str = "printer_monitor.log";
pub const DEFAULT_SENSITIVE_KEYWORDS: [&str; 2] = ["confidential", "secret"];
pub const DEFAULT_MAX_PAGES: i64 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Console,
    Json,
}

/// On-disk settings. Every key is optional and uses the same name as its flag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsFile {
    pub interval: Option<i64>,
    pub log_file: Option<PathBuf>,
    pub sensitive_keywords: Option<Vec<String>>,
    pub suspicious_user: Option<Vec<String>>,
    pub max_pages: Option<i64>,
    pub output_format: Option<OutputFormat>,
    pub command_timeout: Option<i64>,
}

impl SettingsFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|err| ConfigError::SettingsFile {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        serde_json::from_str(&contents).map_err(|err| ConfigError::SettingsFile {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })
    }
}

/// Validated monitor configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub interval: Duration,
    pub log_file: PathBuf,
    pub sensitive_keywords: Vec<String>,
    pub suspicious_users: Vec<String>,
    pub max_pages: i64,
    pub output_format: OutputFormat,
    pub command_timeout: Duration,
}

impl Settings {
    /// Merge flags over the settings file (if any) over defaults, then validate.
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => SettingsFile::load(path)?,
            None => SettingsFile::default(),
        };
        Self::merge(cli.clone(), file)
    }

    pub fn merge(cli: Cli, file: SettingsFile) -> Result<Self, ConfigError> {
        let interval = cli
            .interval
            .or(file.interval)
            .unwrap_or(DEFAULT_INTERVAL_SECS);
        if interval <= 0 {
            return Err(ConfigError::IntervalNotPositive { value: interval });
        }

        let max_pages = cli.max_pages.or(file.max_pages).unwrap_or(DEFAULT_MAX_PAGES);
        if max_pages <= 0 {
            return Err(ConfigError::MaxPagesNotPositive { value: max_pages });
        }

        let command_timeout = cli
            .command_timeout
            .or(file.command_timeout)
            .unwrap_or(DEFAULT_COMMAND_TIMEOUT_SECS as i64);
        if command_timeout <= 0 {
            return Err(ConfigError::CommandTimeoutNotPositive);
        }

        Ok(Self {
            interval: Duration::from_secs(interval as u64),
            log_file: cli
                .log_file
                .or(file.log_file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
            sensitive_keywords: cli
                .sensitive_keywords
                .or(file.sensitive_keywords)
                .unwrap_or_else(|| DEFAULT_SENSITIVE_KEYWORDS.map(String::from).to_vec()),
            suspicious_users: cli.suspicious_user.or(file.suspicious_user).unwrap_or_default(),
            max_pages,
            output_format: cli.output_format.or(file.output_format).unwrap_or_default(),
            command_timeout: Duration::from_secs(command_timeout as u64),
        })
    }

    pub fn rules(&self) -> RuleSet {
        RuleSet::new(
            &self.sensitive_keywords,
            self.suspicious_users.iter().cloned(),
            self.max_pages,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let settings = Settings::merge(Cli::default(), SettingsFile::default()).unwrap();
        assert_eq!(settings.interval, Duration::from_secs(60));
        assert_eq!(settings.log_file, PathBuf::from("printer_monitor.log"));
        assert_eq!(settings.sensitive_keywords, vec!["confidential", "secret"]);
        assert!(settings.suspicious_users.is_empty());
        assert_eq!(settings.max_pages, 100);
        assert_eq!(settings.output_format, OutputFormat::Console);
        assert_eq!(settings.command_timeout, Duration::from_secs(30));
    }

    #[test]
    fn flags_override_file_and_file_overrides_defaults() {
        let cli = Cli {
            interval: Some(5),
            ..Cli::default()
        };
        let file = SettingsFile {
            interval: Some(10),
            max_pages: Some(7),
            ..SettingsFile::default()
        };
        let settings = Settings::merge(cli, file).unwrap();
        assert_eq!(settings.interval, Duration::from_secs(5));
        assert_eq!(settings.max_pages, 7);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let cli = Cli {
            interval: Some(0),
            ..Cli::default()
        };
        let err = Settings::merge(cli, SettingsFile::default()).unwrap_err();
        assert_eq!(err, ConfigError::IntervalNotPositive { value: 0 });
        assert_eq!(err.to_string(), "Interval must be a positive integer.");
    }

    #[test]
    fn negative_max_pages_is_rejected() {
        let cli = Cli {
            max_pages: Some(-1),
            ..Cli::default()
        };
        assert_eq!(
            Settings::merge(cli, SettingsFile::default()),
            Err(ConfigError::MaxPagesNotPositive { value: -1 })
        );
    }

    #[test]
    fn interval_is_checked_before_max_pages() {
        let cli = Cli {
            interval: Some(-3),
            max_pages: Some(0),
            ..Cli::default()
        };
        assert!(matches!(
            Settings::merge(cli, SettingsFile::default()),
            Err(ConfigError::IntervalNotPositive { .. })
        ));
    }

    #[test]
    fn settings_file_is_loaded_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("printwatch.json");
        fs::write(
            &path,
            r#"{"suspicious_user": ["mallory"], "output_format": "json"}"#,
        )
        .unwrap();

        let cli = Cli {
            config: Some(path),
            ..Cli::default()
        };
        let settings = Settings::resolve(&cli).unwrap();
        assert_eq!(settings.suspicious_users, vec!["mallory"]);
        assert_eq!(settings.output_format, OutputFormat::Json);
    }

    #[test]
    fn unknown_settings_keys_are_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("printwatch.json");
        fs::write(&path, r#"{"intervall": 5}"#).unwrap();

        let cli = Cli {
            config: Some(path),
            ..Cli::default()
        };
        assert!(matches!(
            Settings::resolve(&cli),
            Err(ConfigError::SettingsFile { .. })
        ));
    }
}
