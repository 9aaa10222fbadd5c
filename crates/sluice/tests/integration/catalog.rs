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

//! End-to-end planning from TOML catalogs.

use chrono::{TimeZone, Utc};
use sluice::*;
use std::io::Write;

fn catalog_file(text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

#[test]
fn test_toml_catalog_plans_with_partial_failure() {
    let file = catalog_file(
        r#"
        format = "audit.logs.zip"

        [[templates]]
        name = "broken"
        body = "SELECT * FROM audit WHERE ## OR ##"
        time_field = "ts"
        output_prefix = "broken/"

        [[templates]]
        name = "audit"
        body = "SELECT * FROM audit WHERE ##"
        time_field = "ts"
        output_prefix = "audit/"
        strict_order_by = "ORDER BY ts, id"
        "#,
    );
    let catalog = TemplateCatalog::from_path(file.path()).unwrap();

    let window = LogWindow {
        start: Some(Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap()),
        end: Some(Utc.with_ymd_and_hms(2022, 1, 4, 0, 0, 0).unwrap()),
        ..Default::default()
    };
    let config = ExtractionConfig::default();
    let range = window.resolve(Utc::now(), config.default_log_days()).unwrap();

    let plan = ExtractionPlanBuilder::new(config, range)
        .catalog(&catalog)
        .strict(true)
        .floor(Some(Utc.with_ymd_and_hms(2022, 1, 2, 0, 0, 0).unwrap()))
        .build()
        .unwrap();

    assert_eq!(plan.failures().len(), 3);
    assert_eq!(plan.jobs().len(), 3);
    for job in plan.jobs() {
        assert!(job
            .query()
            .starts_with("SELECT * FROM audit WHERE ts >= TIMESTAMP '2022-01-02 00:00:00' AND ts >= "));
        assert!(job.query().ends_with(" ORDER BY ts, id"));
    }

    let manifest = PlanManifest::new(&catalog.format, &plan, Utc::now());
    assert_eq!(manifest.jobs.len(), 3);
    assert_eq!(manifest.failures.len(), 3);
}

#[test]
fn test_output_ids_are_unique_across_a_redshift_plan() {
    let range = TimeRange::new(
        Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2022, 3, 1, 0, 0, 0).unwrap(),
    )
    .unwrap();

    let plan = ExtractionPlanBuilder::new(ExtractionConfig::default(), range)
        .catalog(&TemplateCatalog::redshift_raw_logs())
        .strict(true)
        .build()
        .unwrap();

    assert!(plan.is_complete());
    assert_eq!(plan.jobs().len(), 1 + 3 * 59);

    let mut ids: Vec<_> = plan.jobs().iter().map(|j| j.output_id()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), plan.jobs().len());
}

#[test]
fn test_toml_catalog_with_shared_output_prefix_is_rejected() {
    let file = catalog_file(
        r#"
        format = "audit.logs.zip"

        [[templates]]
        name = "a"
        body = "SELECT * FROM a WHERE ##"
        time_field = "ts"
        output_prefix = "logs/"

        [[templates]]
        name = "b"
        body = "SELECT * FROM b WHERE ##"
        time_field = "ts"
        output_prefix = "logs/"
        "#,
    );
    let catalog = TemplateCatalog::from_path(file.path()).unwrap();
    let range = TimeRange::new(
        Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2022, 1, 2, 0, 0, 0).unwrap(),
    )
    .unwrap();

    let result = ExtractionPlanBuilder::new(ExtractionConfig::default(), range)
        .catalog(&catalog)
        .build();

    assert!(matches!(
        result,
        Err(PlanError::Config(ConfigError::DuplicateOutputPrefix { .. }))
    ));
}
