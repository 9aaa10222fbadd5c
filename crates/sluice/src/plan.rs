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

//! Extraction plan construction.
//!
//! [`ExtractionPlanBuilder`] turns a time range, an optional floor and an
//! ordered list of [`TemplateDescriptor`]s into an [`ExtractionPlan`]: one
//! job per template per interval, plus an optional reference dump that is
//! not tied to any interval. Building is synchronous and pure; handing the
//! jobs to an execution group is a separate, explicit step
//! ([`ExtractionPlan::submit_to`]).
//!
//! A template that fails to expand is reported per job in
//! [`ExtractionPlan::failures`]; every job that did expand is still part
//! of the plan.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::catalog::TemplateCatalog;
use crate::config::ExtractionConfig;
use crate::error::{ConfigError, PlanError, TemplateError};
use crate::group::ParallelTaskGroup;
use crate::interval::{Interval, IntervalIterator, TimeRange};
use crate::predicate::compose_predicate;
use crate::template::{ExtractionJob, JobTemplateExpander, QueryTemplate};

/// A query template together with how its jobs are named and ordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDescriptor {
    #[serde(flatten)]
    pub template: QueryTemplate,
    pub output_prefix: String,
    /// Appended to every job of this template in strict mode.
    #[serde(default)]
    pub strict_order_by: Option<String>,
    /// Only planned in strict mode.
    #[serde(default)]
    pub strict_only: bool,
}

/// A table dumped in full, once per plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceDump {
    pub name: String,
    pub output_id: String,
    pub query: String,
}

impl ReferenceDump {
    pub fn to_job(&self) -> ExtractionJob {
        ExtractionJob::new(self.name.as_str(), self.output_id.as_str(), self.query.as_str())
    }
}

/// A job that could not be built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFailure {
    pub source: String,
    pub interval: Interval,
    pub error: TemplateError,
}

/// The jobs derived from one request, in submission order.
#[derive(Debug, Clone)]
pub struct ExtractionPlan {
    range: TimeRange,
    floor: Option<DateTime<Utc>>,
    strict: bool,
    jobs: Vec<ExtractionJob>,
    failures: Vec<JobFailure>,
}

impl ExtractionPlan {
    pub fn range(&self) -> TimeRange {
        self.range
    }

    pub fn floor(&self) -> Option<DateTime<Utc>> {
        self.floor
    }

    pub fn strict(&self) -> bool {
        self.strict
    }

    pub fn jobs(&self) -> &[ExtractionJob] {
        &self.jobs
    }

    pub fn failures(&self) -> &[JobFailure] {
        &self.failures
    }

    /// Whether every requested job was built.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Submits every built job to `group`, in plan order.
    ///
    /// Returns the number of jobs submitted.
    pub fn submit_to(&self, group: &mut ParallelTaskGroup) -> usize {
        for job in &self.jobs {
            group.add_job(job.clone());
        }
        info!(
            group = %group.name(),
            submitted = self.jobs.len(),
            failed = self.failures.len(),
            "Extraction plan submitted"
        );
        self.jobs.len()
    }
}

/// Builder for [`ExtractionPlan`].
///
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use sluice::{ExtractionConfig, ExtractionPlanBuilder, TemplateCatalog, TimeRange};
///
/// let range = TimeRange::new(
///     Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap(),
///     Utc.with_ymd_and_hms(2022, 1, 3, 0, 0, 0).unwrap(),
/// )
/// .unwrap();
///
/// let plan = ExtractionPlanBuilder::new(ExtractionConfig::default(), range)
///     .catalog(&TemplateCatalog::redshift_raw_logs())
///     .build()
///     .unwrap();
///
/// // pg_user, then two days each of DDL and query history
/// assert_eq!(plan.jobs().len(), 5);
/// ```
#[derive(Debug, Clone)]
pub struct ExtractionPlanBuilder {
    config: ExtractionConfig,
    range: TimeRange,
    floor: Option<DateTime<Utc>>,
    strict: bool,
    templates: Vec<TemplateDescriptor>,
    reference: Option<ReferenceDump>,
}

impl ExtractionPlanBuilder {
    pub fn new(config: ExtractionConfig, range: TimeRange) -> Self {
        Self {
            config,
            range,
            floor: None,
            strict: false,
            templates: Vec::new(),
            reference: None,
        }
    }

    /// Sets the global floor ANDed into every interval predicate.
    pub fn floor(mut self, floor: Option<DateTime<Utc>>) -> Self {
        self.floor = floor;
        self
    }

    /// Enables strict (assessment) mode.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Appends a template; templates are planned in the order added.
    pub fn template(mut self, descriptor: TemplateDescriptor) -> Self {
        self.templates.push(descriptor);
        self
    }

    pub fn reference(mut self, reference: Option<ReferenceDump>) -> Self {
        self.reference = reference;
        self
    }

    /// Appends the catalog's templates and replaces the reference dump.
    pub fn catalog(mut self, catalog: &TemplateCatalog) -> Self {
        self.templates.extend(catalog.templates.iter().cloned());
        self.reference = catalog.reference.clone();
        self
    }

    /// Builds the plan.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError`] if the configuration or range is unusable, or
    /// if two planned templates share an output prefix. Nothing has been
    /// built at that point. Template errors do not fail the build; they are
    /// collected in [`ExtractionPlan::failures`], as are jobs whose output
    /// id is already taken by an earlier job.
    pub fn build(self) -> Result<ExtractionPlan, PlanError> {
        self.config.validate()?;

        let mut prefixes: HashMap<&str, &str> = HashMap::new();
        for descriptor in self
            .templates
            .iter()
            .filter(|descriptor| self.strict || !descriptor.strict_only)
        {
            if let Some(first) = prefixes.insert(
                descriptor.output_prefix.as_str(),
                descriptor.template.name.as_str(),
            ) {
                return Err(ConfigError::DuplicateOutputPrefix {
                    prefix: descriptor.output_prefix.clone(),
                    first: first.to_string(),
                    second: descriptor.template.name.clone(),
                }
                .into());
            }
        }

        let iterator = IntervalIterator::new(self.config.bucket_width());
        // Surface range errors before any job exists.
        iterator.iterate(&self.range)?;

        let expander = JobTemplateExpander::from_config(&self.config);
        let mut jobs = Vec::new();
        let mut failures = Vec::new();
        let mut taken_ids = HashSet::new();

        if let Some(reference) = &self.reference {
            debug!(source = %reference.name, output_id = %reference.output_id, "Planned reference dump");
            taken_ids.insert(reference.output_id.clone());
            jobs.push(reference.to_job());
        }

        for descriptor in &self.templates {
            if descriptor.strict_only && !self.strict {
                debug!(source = %descriptor.template.name, "Skipping strict-only template");
                continue;
            }

            let order_by = if self.strict {
                descriptor.strict_order_by.as_deref()
            } else {
                None
            };

            for interval in iterator.iterate(&self.range)? {
                let predicate =
                    compose_predicate(self.floor, &interval, &descriptor.template.time_field);
                let expanded = expander
                    .expand(
                        &descriptor.template,
                        &predicate.to_string(),
                        &descriptor.output_prefix,
                        &interval,
                        order_by,
                    )
                    .and_then(|job| {
                        if taken_ids.insert(job.output_id().to_string()) {
                            Ok(job)
                        } else {
                            Err(TemplateError::DuplicateOutputId {
                                template: descriptor.template.name.clone(),
                                output_id: job.output_id().to_string(),
                            })
                        }
                    });
                match expanded {
                    Ok(job) => {
                        debug!(source = %job.source(), output_id = %job.output_id(), "Planned job");
                        jobs.push(job);
                    }
                    Err(error) => {
                        warn!(
                            source = %descriptor.template.name,
                            interval_start = %interval.start(),
                            error = %error,
                            "Template expansion failed"
                        );
                        failures.push(JobFailure {
                            source: descriptor.template.name.clone(),
                            interval,
                            error,
                        });
                    }
                }
            }
        }

        info!(
            start = %self.range.start(),
            end = %self.range.end_exclusive(),
            strict = self.strict,
            jobs = jobs.len(),
            failures = failures.len(),
            "Built extraction plan"
        );

        Ok(ExtractionPlan {
            range: self.range,
            floor: self.floor,
            strict: self.strict,
            jobs,
            failures,
        })
    }
}
