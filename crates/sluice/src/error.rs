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

//! Error types for extraction planning and execution.
//!
//! Plan construction distinguishes between fatal errors ([`PlanError`]),
//! which abort before any job is submitted, and per-job errors
//! ([`TemplateError`]), which are collected alongside the jobs that did
//! expand. Errors raised while a job runs belong to the execution group
//! and are reported as [`JobError`].

use chrono::{DateTime, Duration, Utc};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort plan construction.
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Invalid time range: start {start} is after end {end_exclusive}")]
    InvalidRange {
        start: DateTime<Utc>,
        end_exclusive: DateTime<Utc>,
    },

    #[error("Invalid bucket width: {width} (must be positive)")]
    InvalidBucketWidth { width: Duration },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised while substituting a predicate into a query template.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Template '{template}' does not contain the substitution marker '{marker}'")]
    MissingMarker { template: String, marker: String },

    #[error("Template '{template}' contains the substitution marker '{marker}' {count} times")]
    AmbiguousMarker {
        template: String,
        marker: String,
        count: usize,
    },

    #[error("Template '{template}' produces output id '{output_id}', which is already used in this plan")]
    DuplicateOutputId { template: String, output_id: String },
}

/// Configuration and catalog loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid bucket width: {width} (must be at least one second)")]
    InvalidBucketWidth { width: Duration },

    #[error("Substitution marker must not be empty")]
    EmptyMarker,

    #[error("Invalid concurrency: {value} (must be between 1 and {max})", max = tokio::sync::Semaphore::MAX_PERMITS)]
    InvalidConcurrency { value: usize },

    #[error("Invalid log window: {days} days (must be at least 1 and stay within the supported date range)")]
    InvalidLogDays { days: u32 },

    #[error("Templates '{first}' and '{second}' share the output prefix '{prefix}'")]
    DuplicateOutputPrefix {
        prefix: String,
        first: String,
        second: String,
    },

    #[error("Log window start and day count are mutually exclusive")]
    ConflictingWindow,

    #[error("Failed to read catalog file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse TOML catalog: {0}")]
    TomlParseError(#[from] toml::de::Error),
}

/// Errors reported by the execution group for a single job.
#[derive(Error, Debug)]
pub enum JobError {
    #[error("Job '{output_id}' failed: {message}")]
    Failed { output_id: String, message: String },

    #[error("Job '{output_id}' panicked: {message}")]
    Panicked { output_id: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
