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

//! Template catalogs: the set of log sources a plan extracts.
//!
//! A catalog names the archive format, an optional reference table dumped
//! once per plan, and the ordered list of per-interval templates. The
//! built-in Redshift catalog covers DDL history, query history and, in
//! assessment mode, per-step query metrics. Other sources can be
//! described in TOML:
//!
//! ```toml
//! format = "custom.logs.zip"
//!
//! [reference]
//! name = "users"
//! output_id = "users.csv"
//! query = "select * from users"
//!
//! [[templates]]
//! name = "audit"
//! body = "SELECT * FROM audit_log WHERE ##"
//! time_field = "event_time"
//! output_prefix = "audit/"
//! strict_order_by = "ORDER BY event_time, id"
//! ```

use serde::Deserialize;
use std::path::Path;

use crate::error::ConfigError;
use crate::plan::{ReferenceDump, TemplateDescriptor};
use crate::template::QueryTemplate;

/// Format name recorded in manifests produced from the Redshift catalog.
pub const REDSHIFT_RAW_LOGS_FORMAT: &str = "redshift.logs.zip";

const REDSHIFT_DDL_QUERY: &str = "SELECT userid, xid, pid, trim(label) as label, starttime, endtime, \
     sequence, text FROM STL_DDLTEXT WHERE ##";

const REDSHIFT_QUERY_TEXT_QUERY: &str =
    "SELECT userid, xid, pid, query, trim(label) as label, starttime, endtime, sequence, text \
     FROM STL_QUERY join STL_QUERYTEXT using (userid, xid, pid, query) WHERE ##";

const REDSHIFT_QUERY_METRICS_QUERY: &str =
    "SELECT userid, service_class, query, segment, step_type, starttime, slices, \
     max_rows, rows, max_cpu_time, cpu_time, max_blocks_read, blocks_read, \
     max_run_time, run_time, max_blocks_to_disk, blocks_to_disk, step, \
     max_query_scan_size, query_scan_size, query_priority, query_queue_time, \
     service_class_name FROM STL_QUERY_METRICS WHERE ##";

/// An ordered collection of template descriptors plus an optional reference dump.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TemplateCatalog {
    pub format: String,
    #[serde(default)]
    pub reference: Option<ReferenceDump>,
    #[serde(default)]
    pub templates: Vec<TemplateDescriptor>,
}

impl TemplateCatalog {
    /// The Redshift system-table log catalog.
    pub fn redshift_raw_logs() -> Self {
        Self {
            format: REDSHIFT_RAW_LOGS_FORMAT.to_string(),
            reference: Some(ReferenceDump {
                name: "pg_user".to_string(),
                output_id: "pg_user.csv".to_string(),
                query: "select * from pg_user".to_string(),
            }),
            templates: vec![
                TemplateDescriptor {
                    template: QueryTemplate::new("ddl_history", REDSHIFT_DDL_QUERY, "starttime"),
                    output_prefix: "ddl-history/".to_string(),
                    strict_order_by: Some("ORDER BY starttime, xid, pid, sequence".to_string()),
                    strict_only: false,
                },
                TemplateDescriptor {
                    template: QueryTemplate::new(
                        "query_history",
                        REDSHIFT_QUERY_TEXT_QUERY,
                        "starttime",
                    ),
                    output_prefix: "query-history/".to_string(),
                    strict_order_by: Some("ORDER BY starttime, query, sequence".to_string()),
                    strict_only: false,
                },
                TemplateDescriptor {
                    template: QueryTemplate::new(
                        "query_metrics",
                        REDSHIFT_QUERY_METRICS_QUERY,
                        "starttime",
                    ),
                    output_prefix: "query-metrics/".to_string(),
                    strict_order_by: None,
                    strict_only: true,
                },
            ],
        }
    }

    /// Parses a catalog from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a TOML catalog file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}
