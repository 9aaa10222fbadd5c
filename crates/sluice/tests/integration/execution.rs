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

//! Running planned jobs through the parallel execution group.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use sluice::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct RecordingRunner {
    seen: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl JobRunner for RecordingRunner {
    async fn run(&self, job: &ExtractionJob) -> Result<(), JobError> {
        tokio::task::yield_now().await;
        if job.output_id().starts_with("query-history/2022-01-02") {
            return Err(JobError::Failed {
                output_id: job.output_id().to_string(),
                message: "permission denied for relation stl_querytext".into(),
            });
        }
        self.seen
            .lock()
            .unwrap()
            .insert(job.output_id().to_string(), job.query().to_string());
        Ok(())
    }
}

#[tokio::test]
async fn test_plan_runs_to_completion_with_isolated_failure() {
    let range = TimeRange::new(
        Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2022, 1, 4, 0, 0, 0).unwrap(),
    )
    .unwrap();
    let config = ExtractionConfig::builder().max_concurrent_jobs(3).build();

    let plan = ExtractionPlanBuilder::new(config.clone(), range)
        .catalog(&TemplateCatalog::redshift_raw_logs())
        .build()
        .unwrap();

    let mut group = ParallelTaskGroup::from_config("redshift-raw-logs", &config);
    assert_eq!(plan.submit_to(&mut group), 7);

    let runner = Arc::new(RecordingRunner::default());
    let report = group.run(runner.clone()).await;

    assert_eq!(report.total(), 7);
    assert_eq!(report.succeeded().len(), 6);
    assert_eq!(report.failed().len(), 1);
    assert_eq!(
        report.failed()[0].output_id,
        "query-history/2022-01-02T00:00:00Z.csv"
    );

    let seen = runner.seen.lock().unwrap();
    assert_eq!(seen["pg_user.csv"], "select * from pg_user");
    let ddl = &seen["ddl-history/2022-01-03T00:00:00Z.csv"];
    assert!(ddl.contains("FROM STL_DDLTEXT WHERE starttime >= TIMESTAMP '2022-01-03 00:00:00'"));
    assert!(ddl.ends_with("starttime < TIMESTAMP '2022-01-04 00:00:00'"));
}
