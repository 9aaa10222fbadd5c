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

//! Composition of per-interval filter predicates.
//!
//! Every interval job filters its time field with two bounds,
//! `field >= start` and `field < end_exclusive`. When the caller supplies a
//! floor timestamp, `field >= floor` is placed in front of them. The floor
//! is not reconciled with the interval: an interval that ends before the
//! floor simply receives a predicate that matches nothing.

use chrono::{DateTime, Utc};
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::interval::Interval;

/// Comparison applied by a single [`Bound`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// `field >= instant`
    AtLeast,
    /// `field < instant`
    Before,
}

/// One clause of a predicate: a comparison of a time field against an instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bound {
    field: String,
    comparison: Comparison,
    instant: DateTime<Utc>,
}

impl Bound {
    pub fn at_least(field: &str, instant: DateTime<Utc>) -> Self {
        Self {
            field: field.to_string(),
            comparison: Comparison::AtLeast,
            instant,
        }
    }

    pub fn before(field: &str, instant: DateTime<Utc>) -> Self {
        Self {
            field: field.to_string(),
            comparison: Comparison::Before,
            instant,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn comparison(&self) -> Comparison {
        self.comparison
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }

    /// Evaluates the clause for a row whose time field holds `value`.
    pub fn matches(&self, value: DateTime<Utc>) -> bool {
        match self.comparison {
            Comparison::AtLeast => value >= self.instant,
            Comparison::Before => value < self.instant,
        }
    }
}

impl Display for Bound {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let operator = match self.comparison {
            Comparison::AtLeast => ">=",
            Comparison::Before => "<",
        };
        write!(
            f,
            "{} {} {}",
            self.field,
            operator,
            sql_timestamp(self.instant)
        )
    }
}

/// A conjunction of bounds, rendered as a SQL `WHERE` fragment.
///
/// A composed predicate always carries at least the two interval bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    bounds: Vec<Bound>,
}

impl Predicate {
    pub fn bounds(&self) -> &[Bound] {
        &self.bounds
    }

    /// Evaluates the conjunction for a row whose time field holds `value`.
    pub fn matches(&self, value: DateTime<Utc>) -> bool {
        self.bounds.iter().all(|bound| bound.matches(value))
    }
}

impl Display for Predicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for (index, bound) in self.bounds.iter().enumerate() {
            if index > 0 {
                f.write_str(" AND ")?;
            }
            write!(f, "{bound}")?;
        }
        Ok(())
    }
}

/// Builds the predicate for one interval.
///
/// # Examples
///
/// ```rust
/// use chrono::{Duration, TimeZone, Utc};
/// use sluice::{compose_predicate, TimeRange};
///
/// let range = TimeRange::new(
///     Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap(),
///     Utc.with_ymd_and_hms(2022, 1, 2, 0, 0, 0).unwrap(),
/// )
/// .unwrap();
/// let interval = range.intervals(Duration::days(1)).unwrap().next().unwrap();
///
/// let predicate = compose_predicate(None, &interval, "starttime");
/// assert_eq!(
///     predicate.to_string(),
///     "starttime >= TIMESTAMP '2022-01-01 00:00:00' AND starttime < TIMESTAMP '2022-01-02 00:00:00'"
/// );
/// ```
pub fn compose_predicate(
    floor: Option<DateTime<Utc>>,
    interval: &Interval,
    field: &str,
) -> Predicate {
    let mut bounds = Vec::with_capacity(3);
    if let Some(floor) = floor {
        bounds.push(Bound::at_least(field, floor));
    }
    bounds.push(Bound::at_least(field, interval.start()));
    bounds.push(Bound::before(field, interval.end_exclusive()));
    Predicate { bounds }
}

/// Renders an instant as a SQL timestamp literal in UTC.
///
/// Fractional seconds are only printed when present.
pub fn sql_timestamp(instant: DateTime<Utc>) -> String {
    format!("TIMESTAMP '{}'", instant.format("%Y-%m-%d %H:%M:%S%.f"))
}
