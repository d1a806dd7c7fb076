use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::info;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::jobs::JobSource;
use crate::rules::RuleSet;

use super::loop_worker::monitor_loop;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Running,
    Stopped,
}

pub struct MonitorController {
    handle: Option<JoinHandle<u64>>,
    cancel_token: Option<CancellationToken>,
}

impl Default for MonitorController {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn state(&self) -> MonitorState {
        if self.handle.is_some() {
            MonitorState::Running
        } else {
            MonitorState::Stopped
        }
    }

    pub fn start<S: JobSource>(&mut self, source: S, rules: RuleSet, interval: Duration) -> Result<()> {
        if self.handle.is_some() {
            bail!("monitor already running");
        }

        let cancel_token = CancellationToken::new();
        let token_clone = cancel_token.clone();

        info!("Polling {} every {}s", source.describe(), interval.as_secs());
        let handle = tokio::spawn(monitor_loop(
            Arc::new(source),
            Arc::new(rules),
            interval,
            token_clone,
        ));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    /// Cancel the loop and wait for it to finish. Returns the number of ticks run.
    pub async fn stop(&mut self) -> Result<u64> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle.await.context("monitor loop task failed to join")
        } else {
            Ok(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::jobs::PrintJob;

    struct Empty;

    impl JobSource for Empty {
        fn describe(&self) -> &'static str {
            "empty"
        }

        async fn fetch(&self) -> Result<Vec<PrintJob>, SourceError> {
            Ok(Vec::new())
        }
    }

    fn rules() -> RuleSet {
        RuleSet::new(["secret"], Vec::<String>::new(), 100)
    }

    #[tokio::test]
    async fn start_then_stop_transitions_state() {
        let mut controller = MonitorController::new();
        assert_eq!(controller.state(), MonitorState::Stopped);

        controller
            .start(Empty, rules(), Duration::from_secs(3600))
            .unwrap();
        assert_eq!(controller.state(), MonitorState::Running);

        tokio::time::sleep(Duration::from_millis(20)).await;
        let ticks = controller.stop().await.unwrap();
        assert_eq!(ticks, 1);
        assert_eq!(controller.state(), MonitorState::Stopped);
    }

    #[tokio::test]
    async fn second_start_is_rejected() {
        let mut controller = MonitorController::new();
        controller
            .start(Empty, rules(), Duration::from_secs(3600))
            .unwrap();
        assert!(controller
            .start(Empty, rules(), Duration::from_secs(3600))
            .is_err());
        controller.stop().await.unwrap();
    }

    #[tokio::test]
    async fn stop_without_start_is_a_no_op() {
        let mut controller = MonitorController::new();
        assert_eq!(controller.stop().await.unwrap(), 0);
    }
}
