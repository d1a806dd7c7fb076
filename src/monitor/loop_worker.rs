use std::sync::Arc;

use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::jobs::{fetch_jobs, JobSource};
use crate::rules::{RuleSet, Warning};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

// Import the logging macros (exported at crate root)
use crate::log_info;

/// Outcome of one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickReport {
    NoJobs,
    Jobs { count: usize, warnings: Vec<Warning> },
}

impl TickReport {
    pub fn warnings(&self) -> &[Warning] {
        match self {
            TickReport::NoJobs => &[],
            TickReport::Jobs { warnings, .. } => warnings,
        }
    }
}

/// Fetch once and evaluate every job, keeping warnings in job order then rule order.
pub async fn run_tick<S: JobSource>(source: &S, rules: &RuleSet) -> TickReport {
    let jobs = fetch_jobs(source).await;
    if jobs.is_empty() {
        return TickReport::NoJobs;
    }

    for job in &jobs {
        log::debug!("job {}", serde_json::to_string(job).unwrap_or_default());
    }

    let warnings = jobs.iter().flat_map(|job| rules.evaluate(job)).collect();
    TickReport::Jobs {
        count: jobs.len(),
        warnings,
    }
}

pub fn log_report(report: &TickReport) {
    match report {
        TickReport::NoJobs => log::info!("No print jobs found."),
        TickReport::Jobs { warnings, .. } => {
            for warning in warnings {
                log::warn!("{warning}");
            }
        }
    }
}

/// Poll until `cancel_token` fires. The first poll runs immediately and each
/// later one starts a full `interval` after the previous one finished. Returns
/// the number of completed ticks.
pub async fn monitor_loop<S: JobSource>(
    source: Arc<S>,
    rules: Arc<RuleSet>,
    interval: Duration,
    cancel_token: CancellationToken,
) -> u64 {
    let mut ticks = 0u64;
    while !cancel_token.is_cancelled() {
        let tick = tokio::spawn({
            let source = Arc::clone(&source);
            let rules = Arc::clone(&rules);
            async move { run_tick(source.as_ref(), &rules).await }
        });

        match tick.await {
            Ok(report) => log_report(&report),
            Err(err) => log::error!("Error during print job monitoring: {err}"),
        }
        ticks += 1;

        tokio::select! {
            biased;

            _ = cancel_token.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    log_info!("monitor loop shutting down after {} ticks", ticks);
    ticks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::jobs::PrintJob;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct PanicsFirst {
        calls: AtomicUsize,
    }

    impl JobSource for PanicsFirst {
        fn describe(&self) -> &'static str {
            "panics-first"
        }

        async fn fetch(&self) -> Result<Vec<PrintJob>, SourceError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("spooler exploded");
            }
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn failed_tick_does_not_stop_the_loop() {
        let source = Arc::new(PanicsFirst::default());
        let rules = Arc::new(RuleSet::new(["secret"], Vec::<String>::new(), 100));
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(monitor_loop(
            Arc::clone(&source),
            rules,
            Duration::from_millis(10),
            cancel.clone(),
        ));

        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
        let ticks = handle.await.unwrap();

        assert!(ticks >= 2, "only {ticks} ticks");
        assert!(source.calls.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn cancelled_before_start_runs_no_ticks() {
        let source = Arc::new(PanicsFirst::default());
        let rules = Arc::new(RuleSet::new(["secret"], Vec::<String>::new(), 100));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let ticks = monitor_loop(Arc::clone(&source), rules, Duration::from_secs(60), cancel).await;

        assert_eq!(ticks, 0);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[derive(Default)]
    struct Slow {
        starts: std::sync::Mutex<Vec<tokio::time::Instant>>,
    }

    impl JobSource for Slow {
        fn describe(&self) -> &'static str {
            "slow"
        }

        async fn fetch(&self) -> Result<Vec<PrintJob>, SourceError> {
            self.starts.lock().unwrap().push(tokio::time::Instant::now());
            tokio::time::sleep(Duration::from_millis(150)).await;
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn full_interval_elapses_after_each_tick() {
        let source = Arc::new(Slow::default());
        let rules = Arc::new(RuleSet::new(["secret"], Vec::<String>::new(), 100));
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(monitor_loop(
            Arc::clone(&source),
            rules,
            Duration::from_millis(200),
            cancel.clone(),
        ));

        tokio::time::sleep(Duration::from_millis(600)).await;
        cancel.cancel();
        handle.await.unwrap();

        let starts = source.starts.lock().unwrap().clone();
        assert!(starts.len() >= 2, "only {} ticks started", starts.len());
        let gap = starts[1] - starts[0];
        assert!(gap >= Duration::from_millis(340), "gap between tick starts was {gap:?}");
    }

    #[test]
    fn no_jobs_report_has_no_warnings() {
        assert!(TickReport::NoJobs.warnings().is_empty());
    }
}
