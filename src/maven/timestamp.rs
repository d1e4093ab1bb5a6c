use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TIMESTAMP_REGEX: Regex = Regex::new(r"^\d{8}\.\d{6}$").unwrap();
}

const TIMESTAMP_FORMAT: &str = "%Y%m%d.%H%M%S";

/// Source of the "current build time". All timestamps of a single publish are derived from one
///  call-independent instant, so every artifact and metadata document agrees on it.
pub trait BuildTimeProvider: Send + Sync {
    fn current_time(&self) -> DateTime<Utc>;
}

/// Captures the instant the build started and returns it for every call
#[derive(Clone, Copy, Debug)]
pub struct BuildCommencedTime {
    commenced: DateTime<Utc>,
}
impl BuildCommencedTime {
    pub fn now() -> BuildCommencedTime {
        BuildCommencedTime::at(Utc::now())
    }

    pub fn at(commenced: DateTime<Utc>) -> BuildCommencedTime {
        BuildCommencedTime { commenced }
    }
}
impl BuildTimeProvider for BuildCommencedTime {
    fn current_time(&self) -> DateTime<Utc> {
        self.commenced
    }
}

/// A snapshot timestamp in the UTC format `yyyyMMdd.HHmmss`, e.g. `20230615.120000`
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct SnapshotTimestamp(String);
impl SnapshotTimestamp {
    pub fn from_time(time: DateTime<Utc>) -> SnapshotTimestamp {
        SnapshotTimestamp(time.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn from_provider(provider: &dyn BuildTimeProvider) -> SnapshotTimestamp {
        SnapshotTimestamp::from_time(provider.current_time())
    }

    /// Accepts only the exact `yyyyMMdd.HHmmss` shape
    pub fn parse(s: &str) -> Option<SnapshotTimestamp> {
        if TIMESTAMP_REGEX.is_match(s) {
            Some(SnapshotTimestamp(s.to_string()))
        }
        else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The timestamp without the '.' separator, as used for `lastUpdated`
    pub fn compact(&self) -> String {
        self.0.replace('.', "")
    }
}
impl Display for SnapshotTimestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
