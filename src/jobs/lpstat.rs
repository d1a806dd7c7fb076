//! Unix job source backed by the CUPS `lpstat` command.

use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

use super::{JobSource, PrintJob, UNKNOWN_PAGES, UNKNOWN_PRINTER, UNKNOWN_SUBMITTED};
use crate::error::SourceError;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_info;

const COMMAND: &str = "lpstat";
const DEFAULT_ARGS: [&str; 3] = ["-W", "completed", "-o"];
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30;

/// Lines with this many tokens or fewer are not job rows.
const MIN_TOKENS: usize = 4;

#[derive(Debug, Clone)]
pub struct LpstatSource {
    program: String,
    args: Vec<String>,
    limit: Duration,
}

impl Default for LpstatSource {
    fn default() -> Self {
        Self {
            program: COMMAND.to_string(),
            args: DEFAULT_ARGS.iter().map(|arg| arg.to_string()).collect(),
            limit: Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS),
        }
    }
}

impl LpstatSource {
    pub fn new(limit: Duration) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Run a different binary in place of `lpstat`.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_args<I, T>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    async fn run(&self) -> Result<String, SourceError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match timeout(self.limit, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(err)) if err.kind() == ErrorKind::NotFound => {
                return Err(SourceError::CommandNotFound { command: COMMAND })
            }
            Ok(Err(err)) => {
                return Err(SourceError::Spawn {
                    command: COMMAND,
                    source: err,
                })
            }
            Err(_) => {
                return Err(SourceError::Timeout {
                    command: COMMAND,
                    limit: self.limit,
                })
            }
        };

        if !output.status.success() {
            return Err(SourceError::NonZeroExit {
                command: COMMAND,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl JobSource for LpstatSource {
    fn describe(&self) -> &'static str {
        COMMAND
    }

    async fn fetch(&self) -> Result<Vec<PrintJob>, SourceError> {
        let stdout = self.run().await?;
        let jobs = parse_lpstat_output(&stdout);
        log_info!("[lpstat] parsed {} job rows from {} bytes", jobs.len(), stdout.len());
        Ok(jobs)
    }
}

/// Turn `lpstat -o` text into job records, dropping rows that are too short.
pub fn parse_lpstat_output(stdout: &str) -> Vec<PrintJob> {
    stdout.trim().lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<PrintJob> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() <= MIN_TOKENS {
        return None;
    }

    let last = parts[parts.len() - 1];
    let total_pages = if !last.is_empty() && last.bytes().all(|b| b.is_ascii_digit()) {
        last.parse().unwrap_or(UNKNOWN_PAGES)
    } else {
        UNKNOWN_PAGES
    };

    Some(PrintJob {
        document_name: parts[2].to_string(),
        user_name: parts[1].to_string(),
        pages_printed: 0,
        total_pages,
        submitted_time: UNKNOWN_SUBMITTED.to_string(),
        printer_name: parts
            .get(3)
            .map(|p| p.to_string())
            .unwrap_or_else(|| UNKNOWN_PRINTER.to_string()),
    })
}
