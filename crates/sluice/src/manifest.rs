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

//! Plan manifests.
//!
//! A manifest records what a plan asked for and what it produced: the
//! archive format, when it was generated, the strict flag, the range and
//! floor, every job in submission order and every job that failed to
//! build. It is written next to the extracted artifacts so a dump is
//! self-describing.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::interval::TimeRange;
use crate::plan::ExtractionPlan;
use crate::template::ExtractionJob;

#[derive(Debug, Clone, Serialize)]
pub struct ManifestFailure {
    pub source: String,
    pub interval_start: DateTime<Utc>,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanManifest {
    pub format: String,
    pub generated_at: DateTime<Utc>,
    pub strict: bool,
    pub range: TimeRange,
    pub floor: Option<DateTime<Utc>>,
    pub jobs: Vec<ExtractionJob>,
    pub failures: Vec<ManifestFailure>,
}

impl PlanManifest {
    pub fn new(format: &str, plan: &ExtractionPlan, generated_at: DateTime<Utc>) -> Self {
        Self {
            format: format.to_string(),
            generated_at,
            strict: plan.strict(),
            range: plan.range(),
            floor: plan.floor(),
            jobs: plan.jobs().to_vec(),
            failures: plan
                .failures()
                .iter()
                .map(|failure| ManifestFailure {
                    source: failure.source.clone(),
                    interval_start: failure.interval.start(),
                    error: failure.error.to_string(),
                })
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
