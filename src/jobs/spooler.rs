//! Windows job source backed by the print spooler API.

use windows_sys::Win32::Foundation::{GetLastError, ERROR_INSUFFICIENT_BUFFER, HANDLE, SYSTEMTIME};
use windows_sys::Win32::Graphics::Printing::{
    ClosePrinter, GetDefaultPrinterW, GetJobW, GetPrinterW, OpenPrinterW, JOB_INFO_2W,
    PRINTER_INFO_2W,
};

use super::{JobSource, PrintJob, UNKNOWN_SUBMITTED};
use crate::error::{JobError, SourceError};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_info;

#[derive(Debug, Clone, Default)]
pub struct SpoolerSource;

impl SpoolerSource {
    pub fn new() -> Self {
        Self
    }
}

impl JobSource for SpoolerSource {
    fn describe(&self) -> &'static str {
        "spooler"
    }

    async fn fetch(&self) -> Result<Vec<PrintJob>, SourceError> {
        tokio::task::spawn_blocking(fetch_blocking)
            .await
            .map_err(|err| SourceError::Unavailable {
                reason: format!("spooler worker join failed: {err}"),
            })?
    }
}

/// Printer handle closed on drop, so every return path after a successful
/// open releases it.
struct PrinterHandle(HANDLE);

impl Drop for PrinterHandle {
    fn drop(&mut self) {
        unsafe {
            ClosePrinter(self.0);
        }
    }
}

fn last_error() -> u32 {
    unsafe { GetLastError() }
}

fn fetch_blocking() -> Result<Vec<PrintJob>, SourceError> {
    let printer_name = default_printer()?;
    let wide_name = to_wide(&printer_name);

    let mut raw: HANDLE = 0;
    let opened = unsafe { OpenPrinterW(wide_name.as_ptr(), &mut raw, std::ptr::null()) };
    if opened == 0 {
        return Err(SourceError::QueryFailed {
            op: "OpenPrinterW",
            code: last_error(),
        });
    }
    let handle = PrinterHandle(raw);

    let info = query_buffer("GetPrinterW", |buf, len, needed| unsafe {
        GetPrinterW(handle.0, 2, buf, len, needed)
    })?;
    // SAFETY: GetPrinterW level 2 fills the buffer with a PRINTER_INFO_2W header.
    let job_count = unsafe { (*(info.as_ptr() as *const PRINTER_INFO_2W)).cJobs };
    log_info!("[spooler] printer '{}' reports {} jobs", printer_name, job_count);

    let mut jobs = Vec::with_capacity(job_count as usize);
    for job_id in 1..=job_count {
        match read_job(&handle, job_id, &printer_name) {
            Ok(job) => jobs.push(job),
            Err(err) => log::warn!("{err}"),
        }
    }

    Ok(jobs)
}

fn read_job(handle: &PrinterHandle, job_id: u32, printer_name: &str) -> Result<PrintJob, JobError> {
    let buf = query_buffer("GetJobW", |buf, len, needed| unsafe {
        GetJobW(handle.0, job_id, 2, buf, len, needed)
    })
    .map_err(|err| JobError {
        job_id,
        reason: err.to_string(),
    })?;

    // SAFETY: GetJobW level 2 fills the buffer with a JOB_INFO_2W header whose
    // string pointers point into the same buffer.
    let info = unsafe { &*(buf.as_ptr() as *const JOB_INFO_2W) };
    Ok(PrintJob {
        document_name: unsafe { from_wide_ptr(info.pDocument) },
        user_name: unsafe { from_wide_ptr(info.pUserName) },
        pages_printed: i64::from(info.PagesPrinted),
        total_pages: i64::from(info.TotalPages),
        submitted_time: format_systemtime(&info.Submitted),
        printer_name: printer_name.to_string(),
    })
}

/// Two-call pattern: ask for the size, then fill a buffer of that size.
fn query_buffer<F>(op: &'static str, mut call: F) -> Result<Vec<u64>, SourceError>
where
    F: FnMut(*mut u8, u32, *mut u32) -> i32,
{
    let mut needed = 0u32;
    if call(std::ptr::null_mut(), 0, &mut needed) == 0 {
        let code = last_error();
        if code != ERROR_INSUFFICIENT_BUFFER {
            return Err(SourceError::QueryFailed { op, code });
        }
    }

    // u64 storage keeps the struct header suitably aligned.
    let mut buf = vec![0u64; (needed as usize).div_ceil(8).max(1)];
    let len = (buf.len() * 8) as u32;
    if call(buf.as_mut_ptr() as *mut u8, len, &mut needed) == 0 {
        return Err(SourceError::QueryFailed {
            op,
            code: last_error(),
        });
    }
    Ok(buf)
}

fn default_printer() -> Result<String, SourceError> {
    let mut len = 0u32;
    unsafe { GetDefaultPrinterW(std::ptr::null_mut(), &mut len) };
    if len == 0 {
        return Err(SourceError::Unavailable {
            reason: format!("no default printer (os error {})", last_error()),
        });
    }

    let mut buf = vec![0u16; len as usize];
    if unsafe { GetDefaultPrinterW(buf.as_mut_ptr(), &mut len) } == 0 {
        return Err(SourceError::Unavailable {
            reason: format!("GetDefaultPrinterW failed (os error {})", last_error()),
        });
    }
    Ok(String::from_utf16_lossy(&buf[..len.saturating_sub(1) as usize]))
}

fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

unsafe fn from_wide_ptr(ptr: *const u16) -> String {
    if ptr.is_null() {
        return String::new();
    }
    let mut len = 0;
    while *ptr.add(len) != 0 {
        len += 1;
    }
    String::from_utf16_lossy(std::slice::from_raw_parts(ptr, len))
}

fn format_systemtime(st: &SYSTEMTIME) -> String {
    if st.wYear == 0 {
        return UNKNOWN_SUBMITTED.to_string();
    }
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        st.wYear, st.wMonth, st.wDay, st.wHour, st.wMinute, st.wSecond
    )
}
