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

//! Configuration types for extraction planning.
//!
//! [`ExtractionConfig`] carries the knobs that are not part of a single
//! plan request: the bucket width used to partition the log window, the
//! substitution marker recognised in query templates, the suffix appended
//! to every output identifier and the concurrency of the execution group.

use chrono::Duration;
use tokio::sync::Semaphore;

use crate::error::ConfigError;

/// Configuration for extraction planning
///
/// # Construction
///
/// Use [`ExtractionConfig::builder()`] to create a configuration:
///
/// ```rust
/// use chrono::Duration;
/// use sluice::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .bucket_width(Duration::hours(6))
///     .max_concurrent_jobs(8)
///     .build();
/// assert_eq!(config.bucket_width(), Duration::hours(6));
/// ```
///
/// Or use the default configuration:
///
/// ```rust
/// let config = sluice::ExtractionConfig::default();
/// assert_eq!(config.marker(), "##");
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ExtractionConfig {
    bucket_width: Duration,
    marker: String,
    output_suffix: String,
    max_concurrent_jobs: usize,
    default_log_days: u32,
}

impl ExtractionConfig {
    /// Creates a new configuration builder with default values.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder::default()
    }

    /// Width of each interval the log window is partitioned into.
    pub fn bucket_width(&self) -> Duration {
        self.bucket_width
    }

    /// Marker replaced by the composed predicate in each template.
    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Suffix appended to every interval output identifier.
    pub fn output_suffix(&self) -> &str {
        &self.output_suffix
    }

    /// Maximum number of jobs the execution group runs at once.
    pub fn max_concurrent_jobs(&self) -> usize {
        self.max_concurrent_jobs
    }

    /// Days covered by the log window when neither a start nor a day
    /// count is supplied.
    pub fn default_log_days(&self) -> u32 {
        self.default_log_days
    }

    /// Checks the configuration for values planning cannot work with.
    ///
    /// Bucket widths below one second are rejected because output
    /// identifiers carry whole seconds only.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket_width < Duration::seconds(1) {
            return Err(ConfigError::InvalidBucketWidth {
                width: self.bucket_width,
            });
        }
        if self.marker.is_empty() {
            return Err(ConfigError::EmptyMarker);
        }
        if self.max_concurrent_jobs == 0 || self.max_concurrent_jobs > Semaphore::MAX_PERMITS {
            return Err(ConfigError::InvalidConcurrency {
                value: self.max_concurrent_jobs,
            });
        }
        if self.default_log_days == 0 {
            return Err(ConfigError::InvalidLogDays {
                days: self.default_log_days,
            });
        }
        Ok(())
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug, Clone)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl Default for ExtractionConfigBuilder {
    fn default() -> Self {
        Self {
            config: ExtractionConfig {
                bucket_width: Duration::days(1),
                marker: "##".to_string(),
                output_suffix: ".csv".to_string(),
                max_concurrent_jobs: 4,
                default_log_days: 7,
            },
        }
    }
}

impl ExtractionConfigBuilder {
    /// Sets the interval bucket width.
    pub fn bucket_width(mut self, value: Duration) -> Self {
        self.config.bucket_width = value;
        self
    }

    /// Sets the template substitution marker.
    pub fn marker(mut self, value: impl Into<String>) -> Self {
        self.config.marker = value.into();
        self
    }

    /// Sets the output identifier suffix.
    pub fn output_suffix(mut self, value: impl Into<String>) -> Self {
        self.config.output_suffix = value.into();
        self
    }

    /// Sets the execution group concurrency.
    pub fn max_concurrent_jobs(mut self, value: usize) -> Self {
        self.config.max_concurrent_jobs = value;
        self
    }

    /// Sets the default log window length in days.
    pub fn default_log_days(mut self, value: u32) -> Self {
        self.config.default_log_days = value;
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> ExtractionConfig {
        self.config
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        ExtractionConfigBuilder::default().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ExtractionConfig::default();
        assert_eq!(config.bucket_width(), Duration::days(1));
        assert_eq!(config.marker(), "##");
        assert_eq!(config.output_suffix(), ".csv");
        assert_eq!(config.max_concurrent_jobs(), 4);
        assert_eq!(config.default_log_days(), 7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_overrides() {
        let config = ExtractionConfig::builder()
            .bucket_width(Duration::hours(1))
            .marker("@@WHERE@@")
            .output_suffix(".tsv")
            .max_concurrent_jobs(16)
            .default_log_days(30)
            .build();

        assert_eq!(config.bucket_width(), Duration::hours(1));
        assert_eq!(config.marker(), "@@WHERE@@");
        assert_eq!(config.output_suffix(), ".tsv");
        assert_eq!(config.max_concurrent_jobs(), 16);
        assert_eq!(config.default_log_days(), 30);
    }

    #[test]
    fn test_sub_second_bucket_rejected() {
        let config = ExtractionConfig::builder()
            .bucket_width(Duration::milliseconds(500))
            .build();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBucketWidth { .. })
        ));
    }

    #[test]
    fn test_empty_marker_rejected() {
        let config = ExtractionConfig::builder().marker("").build();
        assert!(matches!(config.validate(), Err(ConfigError::EmptyMarker)));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let config = ExtractionConfig::builder().max_concurrent_jobs(0).build();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConcurrency { value: 0 })
        ));
    }

    #[test]
    fn test_oversized_concurrency_rejected() {
        let config = ExtractionConfig::builder()
            .max_concurrent_jobs(usize::MAX)
            .build();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConcurrency { value: usize::MAX })
        ));
    }

    #[test]
    fn test_zero_default_days_rejected() {
        let config = ExtractionConfig::builder().default_log_days(0).build();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLogDays { days: 0 })
        ));
    }
}
