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

//! Shared plan arguments and argument parsers.

pub mod plan;
pub mod run;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use clap::Args;
use sluice::{
    ExtractionConfig, ExtractionPlan, ExtractionPlanBuilder, LogWindow, TemplateCatalog,
};
use std::path::PathBuf;

/// Arguments that determine which jobs a plan contains.
#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    /// Number of days of logs to extract, ending at the top of the current hour
    #[arg(long, conflicts_with = "query_log_start")]
    pub query_log_days: Option<u32>,

    /// Inclusive start of the log window (RFC 3339 or YYYY-MM-DD)
    #[arg(long, value_parser = parse_timestamp)]
    pub query_log_start: Option<DateTime<Utc>>,

    /// Exclusive end of the log window (RFC 3339 or YYYY-MM-DD)
    #[arg(long, value_parser = parse_timestamp)]
    pub query_log_end: Option<DateTime<Utc>>,

    /// Do not extract anything logged before this instant
    #[arg(long)]
    pub query_log_earliest_timestamp: Option<String>,

    /// Produce deterministically ordered output suitable for assessment
    #[arg(long)]
    pub assessment: bool,

    /// Width of each extraction interval (e.g. "1d", "6h")
    #[arg(long, default_value = "1d", value_parser = parse_duration)]
    pub bucket: Duration,

    /// TOML template catalog; the built-in Redshift catalog when absent
    #[arg(long)]
    pub catalog: Option<PathBuf>,
}

impl PlanArgs {
    /// The catalog named on the command line, or the built-in one.
    pub fn load_catalog(&self) -> Result<TemplateCatalog> {
        match &self.catalog {
            Some(path) => TemplateCatalog::from_path(path)
                .with_context(|| format!("Failed to load catalog {}", path.display())),
            None => Ok(TemplateCatalog::redshift_raw_logs()),
        }
    }

    /// The floor timestamp; a blank value means no floor.
    pub fn floor(&self) -> Result<Option<DateTime<Utc>>> {
        match self.query_log_earliest_timestamp.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => parse_timestamp(value).map(Some),
        }
    }

    /// Resolves the window against the current time and builds the plan.
    pub fn build_plan(
        &self,
        config: &ExtractionConfig,
        catalog: &TemplateCatalog,
    ) -> Result<ExtractionPlan> {
        let window = LogWindow {
            days: self.query_log_days,
            start: self.query_log_start,
            end: self.query_log_end,
        };
        let range = window
            .resolve(Utc::now(), config.default_log_days())
            .context("Invalid log window")?;

        ExtractionPlanBuilder::new(config.clone(), range)
            .catalog(catalog)
            .floor(self.floor()?)
            .strict(self.assessment)
            .build()
            .context("Failed to build extraction plan")
    }
}

/// Parse a timestamp given as RFC 3339 or as a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(s) {
        return Ok(instant.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid timestamp '{}': expected RFC 3339 or YYYY-MM-DD", s))?;
    date.and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .ok_or_else(|| anyhow!("Invalid timestamp '{}'", s))
}

/// Parse a duration string like "1d", "6h", "1d12h" into a chrono::Duration.
///
/// Supported units:
/// - `d` - days
/// - `h` - hours
/// - `m` - minutes
/// - `s` - seconds
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim().to_lowercase();
    if s.is_empty() {
        return Err(anyhow!("Duration string cannot be empty"));
    }

    let mut total = Duration::zero();
    let mut current_num = String::new();

    for c in s.chars() {
        if c.is_ascii_digit() {
            current_num.push(c);
        } else {
            if current_num.is_empty() {
                return Err(anyhow!(
                    "Invalid duration format: expected number before '{}'",
                    c
                ));
            }

            let num: i64 = current_num
                .parse()
                .with_context(|| format!("Invalid number in duration: {}", current_num))?;
            current_num.clear();

            let duration = match c {
                'd' => Duration::try_days(num),
                'h' => Duration::try_hours(num),
                'm' => Duration::try_minutes(num),
                's' => Duration::try_seconds(num),
                _ => return Err(anyhow!("Unknown duration unit: '{}'. Use d, h, m, or s", c)),
            }
            .ok_or_else(|| anyhow!("Duration component out of range: {}{}", num, c))?;

            total = total
                .checked_add(&duration)
                .ok_or_else(|| anyhow!("Duration '{}' is out of range", s))?;
        }
    }

    if !current_num.is_empty() {
        return Err(anyhow!(
            "Duration '{}' is missing a unit. Use d (days), h (hours), m (minutes), or s (seconds)",
            s
        ));
    }

    if total == Duration::zero() {
        return Err(anyhow!("Duration must be greater than zero"));
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn args() -> PlanArgs {
        PlanArgs {
            query_log_days: None,
            query_log_start: Some(Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap()),
            query_log_end: Some(Utc.with_ymd_and_hms(2022, 1, 3, 0, 0, 0).unwrap()),
            query_log_earliest_timestamp: None,
            assessment: false,
            bucket: Duration::days(1),
            catalog: None,
        }
    }

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("1d").unwrap(), Duration::days(1));
        assert_eq!(parse_duration("6h").unwrap(), Duration::hours(6));
        assert_eq!(parse_duration("30m").unwrap(), Duration::minutes(30));
        assert_eq!(parse_duration("90S").unwrap(), Duration::seconds(90));
        assert_eq!(
            parse_duration("1d12h").unwrap(),
            Duration::days(1) + Duration::hours(12)
        );
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("12").is_err());
        assert!(parse_duration("3w").is_err());
        assert!(parse_duration("0h").is_err());
        assert!(parse_duration("h").is_err());
        assert!(parse_duration("100000000000d100000000000d").is_err());
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let midnight = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2022-01-01").unwrap(), midnight);
        assert_eq!(parse_timestamp("2022-01-01T00:00:00Z").unwrap(), midnight);
        assert_eq!(
            parse_timestamp("2022-01-01T02:00:00+02:00").unwrap(),
            midnight
        );
        assert!(parse_timestamp("01/01/2022").is_err());
    }

    #[test]
    fn test_blank_floor_is_absent() {
        let mut args = args();
        assert_eq!(args.floor().unwrap(), None);

        args.query_log_earliest_timestamp = Some("   ".into());
        assert_eq!(args.floor().unwrap(), None);

        args.query_log_earliest_timestamp = Some("2022-01-01T12:00:00Z".into());
        assert_eq!(
            args.floor().unwrap(),
            Some(Utc.with_ymd_and_hms(2022, 1, 1, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_build_plan_from_args() {
        let mut args = args();
        args.assessment = true;
        let config = ExtractionConfig::builder().bucket_width(args.bucket).build();
        let catalog = args.load_catalog().unwrap();

        let plan = args.build_plan(&config, &catalog).unwrap();
        assert!(plan.strict());
        assert_eq!(plan.jobs().len(), 1 + 3 * 2);
    }
}
