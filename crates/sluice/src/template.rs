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

//! Query templates and their expansion into extraction jobs.
//!
//! A template body carries exactly one substitution marker (`##` by
//! default) that is replaced by the interval predicate. Templates with no
//! marker or with more than one are rejected rather than guessed at.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ExtractionConfig;
use crate::error::TemplateError;
use crate::interval::Interval;

/// A declarative query for one log source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryTemplate {
    pub name: String,
    pub body: String,
    pub time_field: String,
}

impl QueryTemplate {
    pub fn new(name: &str, body: &str, time_field: &str) -> Self {
        Self {
            name: name.to_string(),
            body: body.to_string(),
            time_field: time_field.to_string(),
        }
    }

    /// Replaces the single occurrence of `marker` in the body with `predicate`.
    ///
    /// # Errors
    ///
    /// * [`TemplateError::MissingMarker`] if the marker does not occur
    /// * [`TemplateError::AmbiguousMarker`] if it occurs more than once
    pub fn substitute(&self, marker: &str, predicate: &str) -> Result<String, TemplateError> {
        match self.body.matches(marker).count() {
            0 => Err(TemplateError::MissingMarker {
                template: self.name.clone(),
                marker: marker.to_string(),
            }),
            1 => Ok(self.body.replacen(marker, predicate, 1)),
            count => Err(TemplateError::AmbiguousMarker {
                template: self.name.clone(),
                marker: marker.to_string(),
                count,
            }),
        }
    }
}

/// A self-contained unit of extraction work: one query, one output artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionJob {
    source: String,
    output_id: String,
    query: String,
}

impl ExtractionJob {
    pub fn new(
        source: impl Into<String>,
        output_id: impl Into<String>,
        query: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            output_id: output_id.into(),
            query: query.into(),
        }
    }

    /// Name of the template or reference dump that produced the job.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn output_id(&self) -> &str {
        &self.output_id
    }

    pub fn query(&self) -> &str {
        &self.query
    }
}

/// Expands templates into [`ExtractionJob`]s for single intervals.
#[derive(Debug, Clone)]
pub struct JobTemplateExpander {
    marker: String,
    output_suffix: String,
}

impl JobTemplateExpander {
    pub fn new(marker: impl Into<String>, output_suffix: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            output_suffix: output_suffix.into(),
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(config.marker(), config.output_suffix())
    }

    /// Builds the job for `interval`.
    ///
    /// `strict_order_by`, when given, is appended to the expanded query
    /// after a single space.
    pub fn expand(
        &self,
        template: &QueryTemplate,
        predicate: &str,
        output_prefix: &str,
        interval: &Interval,
        strict_order_by: Option<&str>,
    ) -> Result<ExtractionJob, TemplateError> {
        let mut query = template.substitute(&self.marker, predicate)?;
        if let Some(order_by) = strict_order_by {
            if !order_by.starts_with(char::is_whitespace) {
                query.push(' ');
            }
            query.push_str(order_by);
        }

        Ok(ExtractionJob::new(
            template.name.as_str(),
            output_id(output_prefix, interval.start(), &self.output_suffix),
            query,
        ))
    }
}

/// Derives the output identifier for an interval starting at `start`.
///
/// The timestamp is RFC 3339 in UTC with whole seconds, so identifiers of
/// one prefix sort lexicographically in chronological order.
pub fn output_id(prefix: &str, start: DateTime<Utc>, suffix: &str) -> String {
    format!(
        "{}{}{}",
        prefix,
        start.to_rfc3339_opts(SecondsFormat::Secs, true),
        suffix
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::TimeRange;
    use chrono::{Duration, TimeZone};

    fn intervals(days: i64) -> Vec<Interval> {
        let start = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();
        TimeRange::new(start, start + Duration::days(days))
            .unwrap()
            .intervals(Duration::days(1))
            .unwrap()
            .collect()
    }

    fn template(body: &str) -> QueryTemplate {
        QueryTemplate::new("t", body, "starttime")
    }

    #[test]
    fn test_substitute_single_marker() {
        let query = template("SELECT * FROM T WHERE ##")
            .substitute("##", "a = 1")
            .unwrap();
        assert_eq!(query, "SELECT * FROM T WHERE a = 1");
    }

    #[test]
    fn test_substitute_missing_marker() {
        let err = template("SELECT * FROM T").substitute("##", "a = 1").unwrap_err();
        assert_eq!(
            err,
            TemplateError::MissingMarker {
                template: "t".into(),
                marker: "##".into(),
            }
        );
    }

    #[test]
    fn test_substitute_duplicated_marker() {
        let err = template("SELECT * FROM T WHERE ## OR ##")
            .substitute("##", "a = 1")
            .unwrap_err();
        assert!(matches!(err, TemplateError::AmbiguousMarker { count: 2, .. }));
    }

    #[test]
    fn test_expand_builds_output_id_and_query() {
        let expander = JobTemplateExpander::new("##", ".csv");
        let interval = intervals(1)[0];

        let job = expander
            .expand(
                &template("SELECT * FROM T WHERE ##"),
                "x",
                "t/",
                &interval,
                None,
            )
            .unwrap();

        assert_eq!(job.output_id(), "t/2022-01-01T00:00:00Z.csv");
        assert_eq!(job.query(), "SELECT * FROM T WHERE x");
        assert_eq!(job.source(), "t");
    }

    #[test]
    fn test_expand_appends_order_by_once() {
        let expander = JobTemplateExpander::new("##", ".csv");
        let interval = intervals(1)[0];

        let job = expander
            .expand(
                &template("SELECT * FROM T WHERE ##"),
                "x",
                "t/",
                &interval,
                Some("ORDER BY starttime"),
            )
            .unwrap();
        assert_eq!(job.query(), "SELECT * FROM T WHERE x ORDER BY starttime");

        let job = expander
            .expand(
                &template("SELECT * FROM T WHERE ##"),
                "x",
                "t/",
                &interval,
                Some(" ORDER BY starttime"),
            )
            .unwrap();
        assert_eq!(job.query(), "SELECT * FROM T WHERE x ORDER BY starttime");
        assert_eq!(job.query().matches("ORDER BY").count(), 1);
    }

    #[test]
    fn test_output_ids_sort_chronologically() {
        let expander = JobTemplateExpander::new("##", ".csv");
        let ids: Vec<String> = intervals(40)
            .iter()
            .map(|interval| {
                expander
                    .expand(&template("##"), "x", "p/", interval, None)
                    .unwrap()
                    .output_id()
                    .to_string()
            })
            .collect();

        let mut sorted = ids.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted, ids);
    }

    #[test]
    fn test_output_id_drops_subsecond_precision() {
        let start = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap() + Duration::milliseconds(5);
        assert_eq!(output_id("p/", start, ""), "p/2022-01-01T00:00:00Z");
    }
}
