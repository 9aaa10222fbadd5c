/*
 *  Copyright 2025-2026 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Parallel execution group for extraction jobs.
//!
//! The group owns submitted jobs and runs them concurrently against a
//! [`JobRunner`], bounded by a semaphore. Jobs are independent: a failure
//! or panic in one is recorded in the [`GroupReport`] and never stops the
//! others. Dropping the future returned by [`ParallelTaskGroup::run`]
//! aborts every job that has not finished.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut group = ParallelTaskGroup::new("redshift-raw-logs", 4);
//! plan.submit_to(&mut group);
//!
//! let report = group.run(Arc::new(MyRunner::connect(url).await?)).await;
//! if !report.is_success() {
//!     for failure in report.failed() {
//!         eprintln!("{}", failure.error);
//!     }
//! }
//! ```

use async_trait::async_trait;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::ExtractionConfig;
use crate::error::JobError;
use crate::template::ExtractionJob;

/// Executes a single extraction job.
///
/// Implementations own everything about running the query: connections,
/// retries, timeouts and writing the output artifact.
#[async_trait]
pub trait JobRunner: Send + Sync {
    async fn run(&self, job: &ExtractionJob) -> Result<(), JobError>;
}

/// A failed job in a [`GroupReport`].
#[derive(Debug)]
pub struct JobFailureReport {
    pub output_id: String,
    pub error: JobError,
}

/// Aggregate outcome of running a [`ParallelTaskGroup`].
///
/// Both lists follow submission order.
#[derive(Debug)]
pub struct GroupReport {
    name: String,
    succeeded: Vec<String>,
    failed: Vec<JobFailureReport>,
}

impl GroupReport {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Output identifiers of the jobs that completed.
    pub fn succeeded(&self) -> &[String] {
        &self.succeeded
    }

    pub fn failed(&self) -> &[JobFailureReport] {
        &self.failed
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Pairs each submitted id with its outcome. A job whose task never
    /// reported back counts as failed.
    fn collect(
        name: String,
        output_ids: Vec<String>,
        outcomes: Vec<Option<Result<(), JobError>>>,
    ) -> Self {
        let mut report = GroupReport {
            name,
            succeeded: Vec::new(),
            failed: Vec::new(),
        };
        for (output_id, outcome) in output_ids.into_iter().zip(outcomes) {
            let result = outcome.unwrap_or_else(|| {
                Err(JobError::Failed {
                    output_id: output_id.clone(),
                    message: "job task did not complete".into(),
                })
            });
            match result {
                Ok(()) => report.succeeded.push(output_id),
                Err(error) => {
                    warn!(group = %report.name, output_id = %output_id, error = %error, "Job failed");
                    report.failed.push(JobFailureReport { output_id, error });
                }
            }
        }
        report
    }
}

/// A named set of independent jobs run concurrently to completion.
#[derive(Debug)]
pub struct ParallelTaskGroup {
    name: String,
    max_concurrent: usize,
    jobs: Vec<ExtractionJob>,
}

impl ParallelTaskGroup {
    /// Creates an empty group. The concurrency is clamped to
    /// `1..=Semaphore::MAX_PERMITS`.
    pub fn new(name: impl Into<String>, max_concurrent: usize) -> Self {
        Self {
            name: name.into(),
            max_concurrent: max_concurrent.clamp(1, Semaphore::MAX_PERMITS),
            jobs: Vec::new(),
        }
    }

    pub fn from_config(name: impl Into<String>, config: &ExtractionConfig) -> Self {
        Self::new(name, config.max_concurrent_jobs())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Submits a job. Submission order is preserved in the report.
    pub fn add_job(&mut self, job: ExtractionJob) {
        debug!(group = %self.name, output_id = %job.output_id(), "Job submitted");
        self.jobs.push(job);
    }

    pub fn jobs(&self) -> &[ExtractionJob] {
        &self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Runs every submitted job and waits for all of them.
    pub async fn run(self, runner: Arc<dyn JobRunner>) -> GroupReport {
        info!(
            group = %self.name,
            jobs = self.jobs.len(),
            max_concurrent = self.max_concurrent,
            "Starting execution group"
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let output_ids: Vec<String> = self
            .jobs
            .iter()
            .map(|job| job.output_id().to_string())
            .collect();
        let mut outcomes: Vec<Option<Result<(), JobError>>> =
            (0..self.jobs.len()).map(|_| None).collect();
        let mut set = JoinSet::new();

        for (index, job) in self.jobs.into_iter().enumerate() {
            let semaphore = semaphore.clone();
            let runner = runner.clone();
            set.spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => run_guarded(runner.as_ref(), &job).await,
                    Err(_) => Err(JobError::Failed {
                        output_id: job.output_id().to_string(),
                        message: "execution group closed before the job started".into(),
                    }),
                };
                (index, result)
            });
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, result)) => outcomes[index] = Some(result),
                Err(e) => warn!(group = %self.name, error = %e, "Job task did not complete"),
            }
        }

        let report = GroupReport::collect(self.name, output_ids, outcomes);

        info!(
            group = %report.name,
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "Execution group finished"
        );
        report
    }
}

async fn run_guarded(runner: &dyn JobRunner, job: &ExtractionJob) -> Result<(), JobError> {
    match AssertUnwindSafe(runner.run(job)).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(JobError::Panicked {
                output_id: job.output_id().to_string(),
                message,
            })
        }
    }
}
