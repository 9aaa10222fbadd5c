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

//! Implementation of the `plan` command.
//!
//! Builds the extraction plan and prints its manifest as JSON.

use anyhow::{Context, Result};
use chrono::Utc;
use sluice::{ExtractionConfig, PlanManifest};
use std::path::Path;
use tracing::{info, warn};

use super::PlanArgs;

/// Run the plan command.
///
/// # Arguments
///
/// * `args` - Window, floor, mode and catalog arguments
/// * `output` - File to write the manifest to; stdout when `None`
pub fn run(args: &PlanArgs, output: Option<&Path>) -> Result<()> {
    let config = ExtractionConfig::builder().bucket_width(args.bucket).build();
    let catalog = args.load_catalog()?;
    let plan = args.build_plan(&config, &catalog)?;

    for failure in plan.failures() {
        warn!(
            "Skipping {} interval starting {}: {}",
            failure.source,
            failure.interval.start(),
            failure.error
        );
    }

    let json = PlanManifest::new(&catalog.format, &plan, Utc::now())
        .to_json()
        .context("Failed to serialize plan manifest")?;

    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write manifest to {}", path.display()))?;
            info!(
                "Wrote manifest with {} job(s) to {}",
                plan.jobs().len(),
                path.display()
            );
        }
        None => println!("{}", json),
    }

    Ok(())
}
