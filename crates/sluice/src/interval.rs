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

//! Time ranges and their partitioning into half-open intervals.
//!
//! A [`TimeRange`] is the global `[start, end_exclusive)` window a plan
//! extracts. [`IntervalIterator`] splits it into contiguous buckets of a
//! fixed width; the last bucket is clipped to the end of the range so the
//! union of all intervals is exactly the range.
//!
//! ```rust
//! use chrono::{Duration, TimeZone, Utc};
//! use sluice::{IntervalIterator, TimeRange};
//!
//! let range = TimeRange::new(
//!     Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap(),
//!     Utc.with_ymd_and_hms(2022, 1, 3, 12, 0, 0).unwrap(),
//! )
//! .unwrap();
//!
//! let intervals: Vec<_> = IntervalIterator::new(Duration::days(1))
//!     .iterate(&range)
//!     .unwrap()
//!     .collect();
//! assert_eq!(intervals.len(), 3);
//! assert_eq!(intervals[2].end_exclusive(), range.end_exclusive());
//! ```

use chrono::{DateTime, Duration, DurationRound, Utc};
use serde::Serialize;
use std::iter::FusedIterator;

use crate::error::{ConfigError, PlanError};

/// The global `[start, end_exclusive)` window of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TimeRange {
    start: DateTime<Utc>,
    end_exclusive: DateTime<Utc>,
}

impl TimeRange {
    /// Creates a range, rejecting `start > end_exclusive`.
    ///
    /// An empty range (`start == end_exclusive`) is valid and partitions
    /// into zero intervals.
    pub fn new(start: DateTime<Utc>, end_exclusive: DateTime<Utc>) -> Result<Self, PlanError> {
        if start > end_exclusive {
            return Err(PlanError::InvalidRange {
                start,
                end_exclusive,
            });
        }
        Ok(Self {
            start,
            end_exclusive,
        })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end_exclusive(&self) -> DateTime<Utc> {
        self.end_exclusive
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end_exclusive
    }

    /// Partitions the range into buckets of `width`.
    pub fn intervals(&self, width: Duration) -> Result<Intervals, PlanError> {
        IntervalIterator::new(width).iterate(self)
    }
}

/// One half-open sub-range `[start, end_exclusive)` bounding a single job.
///
/// Intervals are only produced by [`Intervals`], which guarantees
/// `start < end_exclusive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Interval {
    start: DateTime<Utc>,
    end_exclusive: DateTime<Utc>,
}

impl Interval {
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end_exclusive(&self) -> DateTime<Utc> {
        self.end_exclusive
    }

    /// Whether `instant` falls inside the interval.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end_exclusive
    }
}

/// Partitioning policy: splits ranges into buckets of a fixed width.
///
/// The iterator is restartable; calling [`iterate`](Self::iterate) twice
/// with the same range yields identical sequences.
#[derive(Debug, Clone, Copy)]
pub struct IntervalIterator {
    width: Duration,
}

impl IntervalIterator {
    pub fn new(width: Duration) -> Self {
        Self { width }
    }

    pub fn width(&self) -> Duration {
        self.width
    }

    /// Returns a lazy, ordered sequence of intervals covering `range`.
    ///
    /// # Errors
    ///
    /// * [`PlanError::InvalidBucketWidth`] if the width is zero or negative
    /// * [`PlanError::InvalidRange`] if the range starts after it ends
    pub fn iterate(&self, range: &TimeRange) -> Result<Intervals, PlanError> {
        if self.width <= Duration::zero() {
            return Err(PlanError::InvalidBucketWidth { width: self.width });
        }
        if range.start > range.end_exclusive {
            return Err(PlanError::InvalidRange {
                start: range.start,
                end_exclusive: range.end_exclusive,
            });
        }
        Ok(Intervals {
            cursor: range.start,
            end_exclusive: range.end_exclusive,
            width: self.width,
        })
    }
}

/// Iterator over the intervals of a [`TimeRange`].
#[derive(Debug, Clone)]
pub struct Intervals {
    cursor: DateTime<Utc>,
    end_exclusive: DateTime<Utc>,
    width: Duration,
}

impl Iterator for Intervals {
    type Item = Interval;

    fn next(&mut self) -> Option<Interval> {
        if self.cursor >= self.end_exclusive {
            return None;
        }

        // Clip the final bucket; overflow past the representable range clips too.
        let next = self
            .cursor
            .checked_add_signed(self.width)
            .filter(|next| *next < self.end_exclusive)
            .unwrap_or(self.end_exclusive);

        let interval = Interval {
            start: self.cursor,
            end_exclusive: next,
        };
        self.cursor = next;
        Some(interval)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = bucket_count(self.end_exclusive - self.cursor, self.width);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Intervals {}

impl FusedIterator for Intervals {}

/// Number of intervals a range of `span` splits into: `ceil(span / width)`.
pub fn bucket_count(span: Duration, width: Duration) -> usize {
    let span = total_nanos(span);
    let width = total_nanos(width);
    if span <= 0 || width <= 0 {
        return 0;
    }
    usize::try_from((span + width - 1) / width).unwrap_or(usize::MAX)
}

fn total_nanos(duration: Duration) -> i128 {
    i128::from(duration.num_seconds()) * 1_000_000_000 + i128::from(duration.subsec_nanos())
}

/// The log window requested by a caller, before it is pinned to a clock.
///
/// Either a day count or an explicit start may be given, not both. When
/// the end is absent the window ends at the top of the current hour.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogWindow {
    pub days: Option<u32>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl LogWindow {
    /// Resolves the window against `now`.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::ConflictingWindow`] if both `days` and `start` are set
    /// * [`ConfigError::InvalidLogDays`] if the day count is zero or reaches
    ///   before the earliest representable instant
    /// * [`PlanError::InvalidRange`] if the resolved start is after the end
    pub fn resolve(&self, now: DateTime<Utc>, default_days: u32) -> Result<TimeRange, PlanError> {
        let end = self
            .end
            .unwrap_or_else(|| now.duration_trunc(Duration::hours(1)).unwrap_or(now));

        match (self.start, self.days) {
            (Some(_), Some(_)) => Err(ConfigError::ConflictingWindow.into()),
            (Some(start), None) => TimeRange::new(start, end),
            (None, days) => {
                let days = days.unwrap_or(default_days);
                if days == 0 {
                    return Err(ConfigError::InvalidLogDays { days }.into());
                }
                let start = Duration::try_days(i64::from(days))
                    .and_then(|span| end.checked_sub_signed(span))
                    .ok_or(ConfigError::InvalidLogDays { days })?;
                TimeRange::new(start, end)
            }
        }
    }
}
