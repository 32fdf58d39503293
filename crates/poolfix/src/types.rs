use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cache key of the fixture table shown on the site's root page.
pub const LATEST_WEEK: &str = "latest";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureRecord {
    pub number: String,
    pub home: String,
    pub away: String,
    pub result: String,
    pub status: String,
}

impl Display for FixtureRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:>3}. {} vs {}", self.number, self.home, self.away)?;
        if !self.result.is_empty() {
            write!(f, " [{}]", self.result)?;
        }
        if !self.status.is_empty() {
            write!(f, " ({})", self.status)?;
        }
        Ok(())
    }
}

/// A selectable week from the listing page's week picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekEntry {
    pub date: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedFixtureSet {
    pub key: String,
    pub fixtures: Vec<FixtureRecord>,
    pub updated_at: DateTime<Utc>,
}

/// Body returned by both fixture endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixturesResponse {
    pub week: String,
    pub fixtures: Vec<FixtureRecord>,
    pub cached: bool,
}

impl FixturesResponse {
    pub fn fresh(week: impl Into<String>, fixtures: Vec<FixtureRecord>) -> Self {
        Self {
            week: week.into(),
            fixtures,
            cached: false,
        }
    }

    pub fn from_cache(set: CachedFixtureSet) -> Self {
        Self {
            week: set.key,
            fixtures: set.fixtures,
            cached: true,
        }
    }
}
