use std::path::PathBuf;

use clap::Parser;

use crate::settings::OutputFormat;

/// Flags left unset fall back to the settings file, then to built-in defaults.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "printwatch",
    version,
    about = "Monitors print jobs and detects unusual printing patterns."
)]
pub struct Cli {
    /// Interval in seconds to check for print jobs (default: 60). Must be a positive integer.
    #[arg(long, value_name = "SECONDS", allow_negative_numbers = true)]
    pub interval: Option<i64>,

    /// Path to the log file (default: printer_monitor.log).
    #[arg(long = "log_file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Keywords that indicate a sensitive document (default: confidential secret).
    #[arg(long = "sensitive_keywords", value_name = "KEYWORD", num_args = 1..)]
    pub sensitive_keywords: Option<Vec<String>>,

    /// Users to monitor for suspicious activity.
    #[arg(long = "suspicious_user", value_name = "USER", num_args = 1..)]
    pub suspicious_user: Option<Vec<String>>,

    /// Page count above which a job is reported (default: 100). Must be a positive integer.
    #[arg(long = "max_pages", value_name = "PAGES", allow_negative_numbers = true)]
    pub max_pages: Option<i64>,

    /// Log line layout (default: console).
    #[arg(long = "output_format", value_enum)]
    pub output_format: Option<OutputFormat>,

    /// JSON settings file supplying defaults for the flags above.
    #[arg(long, value_name = "PATH", env = "PRINTWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Seconds to wait for the job listing command before killing it (default: 30).
    #[arg(long = "command_timeout", value_name = "SECONDS", allow_negative_numbers = true)]
    pub command_timeout: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_underscore_flags_and_multiple_values() {
        let cli = Cli::try_parse_from([
            "printwatch",
            "--interval",
            "5",
            "--log_file",
            "/tmp/pw.log",
            "--sensitive_keywords",
            "payroll",
            "hr",
            "--suspicious_user",
            "mallory",
            "--max_pages",
            "20",
            "--output_format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.interval, Some(5));
        assert_eq!(cli.log_file, Some(PathBuf::from("/tmp/pw.log")));
        assert_eq!(
            cli.sensitive_keywords,
            Some(vec!["payroll".to_string(), "hr".to_string()])
        );
        assert_eq!(cli.suspicious_user, Some(vec!["mallory".to_string()]));
        assert_eq!(cli.max_pages, Some(20));
        assert_eq!(cli.output_format, Some(OutputFormat::Json));
    }

    #[test]
    fn negative_numbers_reach_validation() {
        let cli = Cli::try_parse_from(["printwatch", "--interval", "-5"]).unwrap();
        assert_eq!(cli.interval, Some(-5));
    }

    #[test]
    fn rejects_unknown_output_format() {
        assert!(Cli::try_parse_from(["printwatch", "--output_format", "xml"]).is_err());
    }
}
