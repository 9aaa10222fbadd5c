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

//! # Sluice
//!
//! Sluice plans the extraction of time-partitioned logs from an analytical
//! warehouse. A plan takes a (possibly open-ended) log window, splits it
//! into half-open intervals and, for every configured query template,
//! produces one self-contained job per interval: a query filtered to that
//! interval and a deterministic output identifier. The jobs are then handed
//! to a [`ParallelTaskGroup`] which runs them concurrently.
//!
//! ## Core Components
//!
//! - [`IntervalIterator`]: partitions a [`TimeRange`] into [`Interval`]s
//! - [`compose_predicate`]: builds the per-interval filter, with an optional floor
//! - [`JobTemplateExpander`]: substitutes the filter into a [`QueryTemplate`]
//! - [`ExtractionPlanBuilder`]: drives the above across a [`TemplateCatalog`]
//! - [`ParallelTaskGroup`]: runs the planned jobs through a [`JobRunner`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sluice::*;
//!
//! let config = ExtractionConfig::default();
//! let range = LogWindow { days: Some(7), ..Default::default() }
//!     .resolve(chrono::Utc::now(), config.default_log_days())?;
//!
//! let plan = ExtractionPlanBuilder::new(config.clone(), range)
//!     .catalog(&TemplateCatalog::redshift_raw_logs())
//!     .strict(true)
//!     .build()?;
//!
//! let mut group = ParallelTaskGroup::from_config("redshift-raw-logs", &config);
//! plan.submit_to(&mut group);
//! let report = group.run(runner).await;
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod group;
pub mod interval;
pub mod manifest;
pub mod plan;
pub mod predicate;
pub mod template;

pub use catalog::{TemplateCatalog, REDSHIFT_RAW_LOGS_FORMAT};
pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use error::{ConfigError, JobError, PlanError, TemplateError};
pub use group::{GroupReport, JobFailureReport, JobRunner, ParallelTaskGroup};
pub use interval::{bucket_count, Interval, IntervalIterator, Intervals, LogWindow, TimeRange};
pub use manifest::{ManifestFailure, PlanManifest};
pub use plan::{
    ExtractionPlan, ExtractionPlanBuilder, JobFailure, ReferenceDump, TemplateDescriptor,
};
pub use predicate::{compose_predicate, sql_timestamp, Bound, Comparison, Predicate};
pub use template::{output_id, ExtractionJob, JobTemplateExpander, QueryTemplate};
