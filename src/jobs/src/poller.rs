// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Drives the status polling loop for a submitted bulk mutate job.
//!
//! The loop queries the job status up to a bounded number of times, sleeping
//! a fixed interval between queries, until the job reaches a terminal
//! status. Exhausting the attempt budget is an orchestration-level signal
//! ([AwaitOutcome::TimedOut]), not an error: the caller decides whether to
//! keep polling, abandon the job, or treat the timeout as a failure.

use crate::client::MutateJobService;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use types::{Error, JobHandle, JobResult, JobStatus};

/// Configuration for the polling loop.
///
/// # Example
/// ```
/// # use mutate_jobs::poller::{PollConfig, PollConfigError};
/// use std::time::Duration;
/// let config = PollConfig::new(Duration::from_secs(10), 20)?;
/// assert_eq!(config.poll_interval(), Duration::from_secs(10));
/// # Ok::<(), PollConfigError>(())
/// ```
#[derive(Clone, Debug)]
pub struct PollConfig {
    poll_interval: Duration,
    max_attempts: u32,
}

/// The error type for polling configuration validation.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum PollConfigError {
    #[error("the poll interval ({0:?}) should be greater than zero")]
    InvalidInterval(Duration),
    #[error("the attempt budget ({0}) should be at least 1")]
    InvalidAttempts(u32),
}

impl PollConfig {
    /// Creates a new configuration.
    ///
    /// `poll_interval` must be greater than zero and `max_attempts` at
    /// least 1.
    pub fn new(poll_interval: Duration, max_attempts: u32) -> Result<Self, PollConfigError> {
        if poll_interval.is_zero() {
            return Err(PollConfigError::InvalidInterval(poll_interval));
        }
        if max_attempts < 1 {
            return Err(PollConfigError::InvalidAttempts(max_attempts));
        }
        Ok(Self {
            poll_interval,
            max_attempts,
        })
    }

    /// The delay between consecutive status queries.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// The maximum number of status queries per wait.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl Default for PollConfig {
    /// Thirty polls, thirty seconds apart.
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            max_attempts: 30,
        }
    }
}

/// The disposition of one wait on a job.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum AwaitOutcome {
    /// The job completed; its result can be retrieved.
    Completed,
    /// The job finished without producing a result.
    Failed { reason: Option<String> },
    /// The attempt budget expired while the job remained in progress.
    /// Carries the last observed status; the handle stays valid and the
    /// caller may wait again.
    TimedOut { last: JobStatus },
    /// The cancellation token fired between polls.
    Cancelled,
}

/// Waits for `handle` to reach a terminal status.
///
/// Queries the job status up to `config.max_attempts()` times, sleeping
/// `config.poll_interval()` between queries (never after the last one). A
/// terminal status short-circuits the loop.
///
/// A transport fault aborts the wait immediately: this function does not
/// distinguish transient from permanent faults, that policy belongs to the
/// service client or the caller.
///
/// Cancelling `cancel` stops the loop at the next suspension point and
/// returns [AwaitOutcome::Cancelled] without issuing further remote calls;
/// an in-flight status query is not aborted.
pub async fn await_job<C>(
    client: &C,
    handle: &JobHandle,
    config: &PollConfig,
    cancel: &CancellationToken,
) -> crate::Result<AwaitOutcome>
where
    C: MutateJobService,
{
    let mut last = JobStatus::Pending;
    for attempt in 1..=config.max_attempts {
        if cancel.is_cancelled() {
            return Ok(AwaitOutcome::Cancelled);
        }
        let job = client.get_job_status(handle).await?;
        last = job.status;
        match job.status {
            JobStatus::Completed => return Ok(AwaitOutcome::Completed),
            JobStatus::Failed => {
                return Ok(AwaitOutcome::Failed {
                    reason: job.failure_reason,
                });
            }
            _ => {}
        }
        tracing::debug!(
            job = %handle,
            attempt,
            status = ?job.status,
            "job still in progress"
        );
        if attempt < config.max_attempts {
            tokio::select! {
                _ = cancel.cancelled() => return Ok(AwaitOutcome::Cancelled),
                _ = tokio::time::sleep(config.poll_interval) => {}
            }
        }
    }
    Ok(AwaitOutcome::TimedOut { last })
}

/// The disposition of one wait-and-fetch on a job.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum JobWait {
    /// The job completed; holds its result.
    Ready(JobResult),
    /// The attempt budget expired while the job remained in progress.
    TimedOut { last: JobStatus },
    /// The cancellation token fired between polls.
    Cancelled,
}

/// Waits for `handle` to reach a terminal status and fetches its result.
///
/// A convenience wrapper over [await_job]: a completed job yields
/// [JobWait::Ready] with the retrieved [JobResult], while a failed job
/// becomes [Error::job_failed] carrying the reported reason. Timeouts and
/// cancellation pass through so callers can resume the wait.
pub async fn await_result<C>(
    client: &C,
    handle: &JobHandle,
    config: &PollConfig,
    cancel: &CancellationToken,
) -> crate::Result<JobWait>
where
    C: MutateJobService,
{
    match await_job(client, handle, config, cancel).await? {
        AwaitOutcome::Completed => Ok(JobWait::Ready(client.get_job_result(handle).await?)),
        AwaitOutcome::Failed { reason } => Err(Error::job_failed(reason)),
        AwaitOutcome::TimedOut { last } => Ok(JobWait::TimedOut { last }),
        AwaitOutcome::Cancelled => Ok(JobWait::Cancelled),
    }
}
