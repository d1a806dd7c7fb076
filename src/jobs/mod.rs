pub mod lpstat;
#[cfg(windows)]
pub mod spooler;

use std::future::Future;

use serde::Serialize;

use crate::error::SourceError;

pub use lpstat::{parse_lpstat_output, LpstatSource};
#[cfg(windows)]
pub use spooler::SpoolerSource;

pub const UNKNOWN_PAGES: i64 = -1;
pub const UNKNOWN_SUBMITTED: &str = "N/A";
pub const UNKNOWN_PRINTER: &str = "Unknown";

/// One print job as seen by a single poll. Unknown values use the sentinels
/// above rather than being left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrintJob {
    pub document_name: String,
    pub user_name: String,
    pub pages_printed: i64,
    pub total_pages: i64,
    pub submitted_time: String,
    pub printer_name: String,
}

impl PrintJob {
    pub fn new(document_name: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            document_name: document_name.into(),
            user_name: user_name.into(),
            pages_printed: 0,
            total_pages: UNKNOWN_PAGES,
            submitted_time: UNKNOWN_SUBMITTED.to_string(),
            printer_name: UNKNOWN_PRINTER.to_string(),
        }
    }

    pub fn with_total_pages(mut self, total_pages: i64) -> Self {
        self.total_pages = total_pages;
        self
    }

    pub fn with_printer(mut self, printer_name: impl Into<String>) -> Self {
        self.printer_name = printer_name.into();
        self
    }
}

/// Anything that can list the host's print jobs.
pub trait JobSource: Send + Sync + 'static {
    /// Short name used in log lines.
    fn describe(&self) -> &'static str;

    fn fetch(&self) -> impl Future<Output = Result<Vec<PrintJob>, SourceError>> + Send;
}

/// Job source for the platform this binary was built for, chosen once at startup.
#[derive(Debug, Clone)]
pub enum PlatformSource {
    #[cfg(windows)]
    Spooler(SpoolerSource),
    Lpstat(LpstatSource),
}

impl PlatformSource {
    /// Windows builds use the spooler API; every other OS is treated as Unix-like.
    pub fn detect(lpstat: LpstatSource) -> Self {
        #[cfg(windows)]
        {
            let _ = lpstat;
            PlatformSource::Spooler(SpoolerSource::new())
        }

        #[cfg(not(windows))]
        {
            PlatformSource::Lpstat(lpstat)
        }
    }
}

impl JobSource for PlatformSource {
    fn describe(&self) -> &'static str {
        match self {
            #[cfg(windows)]
            PlatformSource::Spooler(source) => source.describe(),
            PlatformSource::Lpstat(source) => source.describe(),
        }
    }

    async fn fetch(&self) -> Result<Vec<PrintJob>, SourceError> {
        match self {
            #[cfg(windows)]
            PlatformSource::Spooler(source) => source.fetch().await,
            PlatformSource::Lpstat(source) => source.fetch().await,
        }
    }
}

/// Fetch the current job listing. Any source failure is logged once at error
/// level and reported as an empty listing.
pub async fn fetch_jobs<S: JobSource>(source: &S) -> Vec<PrintJob> {
    match source.fetch().await {
        Ok(jobs) => jobs,
        Err(err) => {
            log::error!("{err}");
            Vec::new()
        }
    }
}
