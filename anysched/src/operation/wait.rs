//! Blocking wait on an operation

use std::future::Future;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::errors::SchedError;
use crate::models::OperationStatus;
use crate::operation::Operation;

/// Wait loop options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitOptions {
    /// Delay between two polls
    pub poll_interval: Duration,

    /// Timeout used when the service spec does not carry one
    pub default_timeout: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            default_timeout: Duration::from_secs(60),
        }
    }
}

impl Operation {
    /// Poll until the operation is done, fails, or the effective timeout expires
    pub async fn wait(&self) -> Result<OperationStatus, SchedError> {
        self.wait_until(std::future::pending::<()>()).await
    }

    /// Like [`Operation::wait`], but also gives up as soon as `cancel` resolves
    ///
    /// The pending poll and the timer are dropped on every return path.
    pub async fn wait_until<F>(&self, cancel: F) -> Result<OperationStatus, SchedError>
    where
        F: Future<Output = ()>,
    {
        let started = Instant::now();
        let timeout = self.timeout();
        info!(
            "Waiting up to {:?} for {} operation (polling every {:?})",
            timeout,
            self.backend(),
            self.poll_interval()
        );

        tokio::select! {
            result = tokio::time::timeout(timeout, self.poll_until_done()) => {
                match result {
                    Ok(outcome) => {
                        if let Ok(status) = &outcome {
                            info!("Operation finished after {:?}: {}", started.elapsed(), status.message);
                        }
                        outcome
                    }
                    Err(elapsed) => Err(SchedError::TimedOut { timeout, source: elapsed }),
                }
            }
            _ = cancel => {
                info!("Wait cancelled by caller after {:?}", started.elapsed());
                Err(SchedError::Cancelled { elapsed: started.elapsed() })
            }
        }
    }

    async fn poll_until_done(&self) -> Result<OperationStatus, SchedError> {
        loop {
            let status = self.status().await?;
            if status.done {
                return Ok(status);
            }
            debug!("{}", status.message);
            tokio::time::sleep(self.poll_interval()).await;
        }
    }
}
