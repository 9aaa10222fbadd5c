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

//! Implementation of the `run` command.
//!
//! Runs the plan through a [`ParallelTaskGroup`] whose runner writes each
//! job's query to `<out-dir>/<output_id>.sql`, next to a `manifest.json`.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sluice::{ExtractionConfig, ExtractionJob, JobError, JobRunner, ParallelTaskGroup, PlanManifest};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Materializes each job's query as a file under `out_dir`.
pub struct QueryFileRunner {
    out_dir: PathBuf,
}

impl QueryFileRunner {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    /// Resolves the query file for `job`, refusing ids that would land
    /// outside `out_dir`.
    fn path_for(&self, job: &ExtractionJob) -> Result<PathBuf, JobError> {
        let relative = Path::new(job.output_id());
        let escapes = relative.components().any(|component| {
            matches!(
                component,
                Component::RootDir | Component::Prefix(_) | Component::ParentDir
            )
        });
        if escapes {
            return Err(JobError::Failed {
                output_id: job.output_id().to_string(),
                message: format!(
                    "output id does not stay inside {}",
                    self.out_dir.display()
                ),
            });
        }
        Ok(self.out_dir.join(format!("{}.sql", job.output_id())))
    }
}

#[async_trait]
impl JobRunner for QueryFileRunner {
    async fn run(&self, job: &ExtractionJob) -> Result<(), JobError> {
        let path = self.path_for(job)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, job.query()).await?;
        debug!(output_id = %job.output_id(), path = %path.display(), "Wrote query file");
        Ok(())
    }
}

/// Run the run command.
///
/// # Arguments
///
/// * `args` - Window, floor, mode and catalog arguments
/// * `out_dir` - Destination directory
/// * `max_concurrent` - Execution group concurrency
pub async fn run(args: &super::PlanArgs, out_dir: &Path, max_concurrent: usize) -> Result<()> {
    let config = ExtractionConfig::builder()
        .bucket_width(args.bucket)
        .max_concurrent_jobs(max_concurrent)
        .build();
    let catalog = args.load_catalog()?;
    let plan = args.build_plan(&config, &catalog)?;

    tokio::fs::create_dir_all(out_dir)
        .await
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let manifest = PlanManifest::new(&catalog.format, &plan, Utc::now())
        .to_json()
        .context("Failed to serialize plan manifest")?;
    tokio::fs::write(out_dir.join("manifest.json"), manifest)
        .await
        .context("Failed to write manifest")?;

    let mut group = ParallelTaskGroup::from_config(catalog.format.as_str(), &config);
    plan.submit_to(&mut group);
    let report = group.run(Arc::new(QueryFileRunner::new(out_dir))).await;

    for failure in report.failed() {
        error!("{}", failure.error);
    }
    for failure in plan.failures() {
        error!(
            "Template {} could not be expanded for interval starting {}: {}",
            failure.source,
            failure.interval.start(),
            failure.error
        );
    }

    info!(
        "Completed {} of {} job(s) into {}",
        report.succeeded().len(),
        report.total(),
        out_dir.display()
    );

    if !report.is_success() || !plan.is_complete() {
        return Err(anyhow!(
            "{} job(s) failed to run and {} job(s) failed to build",
            report.failed().len(),
            plan.failures().len()
        ));
    }

    Ok(())
}
