//! Polling of asynchronous device jobs.
//!
//! Downloads, installs and commits run as jobs on the appliance. The
//! command that starts one returns immediately with a job id; completion is
//! observed by polling `show jobs id <id>`.

use std::time::Duration;

use log::{debug, info};
use serde::Deserialize;

use super::session::Session;
use crate::error::{JobError, Result};
use crate::transport::Transport;

/// Retry budget for job polling.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JobPolicy {
    /// Pause between two status checks.
    pub interval: Duration,

    /// Status checks after the initial one before giving up.
    pub retries: u32,

    /// Pause after a job finishes, before the next command.
    pub settle: Duration,
}

impl Default for JobPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            retries: 25,
            settle: Duration::from_secs(10),
        }
    }
}

/// Job state as reported by `show jobs id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Queued or running.
    Pending,
    /// Finished.
    Finished,
    /// The device does not know the job.
    Absent,
    /// None of the above; polled again like a pending job.
    Unknown,
}

impl JobState {
    /// Classify a `show jobs id` response.
    pub fn parse(output: &str) -> Self {
        if output.contains("not found") {
            JobState::Absent
        } else if output.contains("FIN") {
            JobState::Finished
        } else if output.contains("PEND") {
            JobState::Pending
        } else {
            JobState::Unknown
        }
    }
}

/// A polled job.
#[derive(Debug, Clone)]
pub struct Job {
    /// Device job id.
    pub id: String,

    /// Last observed state.
    pub state: JobState,

    /// Retries left when the state was observed.
    pub remaining: u32,

    /// Pause between checks.
    pub interval: Duration,
}

/// Polls one job on a session until it finishes or the budget runs out.
pub struct JobPoller<'a, T: Transport> {
    session: &'a mut Session<T>,
    policy: JobPolicy,
}

impl<'a, T: Transport> JobPoller<'a, T> {
    /// Create a poller.
    pub fn new(session: &'a mut Session<T>, policy: JobPolicy) -> Self {
        Self { session, policy }
    }

    async fn query(&mut self, id: &str) -> Result<JobState> {
        let output = self.session.send_command(&format!("show jobs id {id}")).await?;
        let state = JobState::parse(&output.result);
        debug!("{}: job {} is {:?}", self.session.host, id, state);
        Ok(state)
    }

    /// Wait for job `id` to finish.
    ///
    /// A job the device does not know on the first check fails at once.
    /// Otherwise the job is re-checked every `interval`, at most `retries`
    /// times; a job that disappears mid-poll runs out the budget.
    pub async fn check_job(&mut self, id: &str) -> Result<Job> {
        let mut job = Job {
            id: id.to_string(),
            state: self.query(id).await?,
            remaining: self.policy.retries,
            interval: self.policy.interval,
        };
        if job.state == JobState::Absent {
            return Err(JobError::NotFound { id: job.id }.into());
        }

        loop {
            match job.state {
                JobState::Finished => {
                    info!("{}: job {} complete", self.session.host, job.id);
                    tokio::time::sleep(self.policy.settle).await;
                    return Ok(job);
                }
                _ if job.remaining > 0 => {
                    info!(
                        "{}: job {} is incomplete, checking again in {:?}",
                        self.session.host, job.id, job.interval
                    );
                    tokio::time::sleep(job.interval).await;
                    job.remaining -= 1;
                    job.state = self.query(id).await?;
                }
                _ => {
                    return Err(JobError::Timeout {
                        id: job.id,
                        checks: self.policy.retries,
                    }
                    .into());
                }
            }
        }
    }
}
