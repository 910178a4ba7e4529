//! Display limiter
//!
//! After sorting (and grouping), only the first N rows are charted. N comes
//! from a fixed set of choices.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Allowed display counts
pub const DISPLAY_COUNTS: [usize; 7] = [10, 20, 50, 100, 200, 500, 1000];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct DisplayCount(usize);

impl DisplayCount {
    pub fn get(self) -> usize {
        self.0
    }

    /// Parse from a property string, falling back to 50 on anything outside
    /// the allowed set
    pub fn parse(s: &str) -> Self {
        s.trim()
            .parse::<usize>()
            .ok()
            .and_then(|n| Self::try_from(n).ok())
            .unwrap_or_default()
    }
}

impl Default for DisplayCount {
    fn default() -> Self {
        DisplayCount(50)
    }
}

impl TryFrom<usize> for DisplayCount {
    type Error = String;

    fn try_from(n: usize) -> Result<Self, Self::Error> {
        if DISPLAY_COUNTS.contains(&n) {
            Ok(DisplayCount(n))
        } else {
            Err(format!(
                "display count {} is not one of {:?}",
                n, DISPLAY_COUNTS
            ))
        }
    }
}

impl From<DisplayCount> for usize {
    fn from(count: DisplayCount) -> usize {
        count.0
    }
}

impl fmt::Display for DisplayCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Keep the first `count` rows
pub fn limit_rows<T>(mut rows: Vec<T>, count: DisplayCount) -> Vec<T> {
    rows.truncate(count.get());
    rows
}
