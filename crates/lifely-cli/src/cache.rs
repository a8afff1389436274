//! On-disk raw event cache and stats export.
//!
//! Files live in the data directory:
//! - `raw_events_{year}.json`: the events as returned by the API
//! - `stats_{year}.json`: the computed summary

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use lifely_core::{CalendarEvent, FriendStats, TimeStats};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};

/// A year of raw events together with the account they belong to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvents {
    pub year: i32,
    pub user_email: String,
    pub fetched_at: DateTime<Utc>,
    pub events: Vec<CalendarEvent>,
}

/// The exported summary for a year.
#[derive(Debug, Serialize)]
pub struct StatsReport<'a> {
    pub year: i32,
    pub time_stats: &'a TimeStats,
    pub friend_stats: &'a [FriendStats],
}

/// Reads and writes cache files under one directory.
#[derive(Debug, Clone)]
pub struct EventCache {
    dir: PathBuf,
}

impl EventCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn raw_path(&self, year: i32) -> PathBuf {
        self.dir.join(format!("raw_events_{}.json", year))
    }

    pub fn stats_path(&self, year: i32) -> PathBuf {
        self.dir.join(format!("stats_{}.json", year))
    }

    /// Loads cached events for `year`.
    ///
    /// A missing file is a miss. An unreadable or stale file is logged and
    /// also treated as a miss so the caller refetches.
    pub fn load_raw(&self, year: i32) -> ClientResult<Option<RawEvents>> {
        let path = self.raw_path(year);
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)?;
        match serde_json::from_str::<RawEvents>(&content) {
            Ok(raw) if raw.year == year => {
                debug!("loaded {} cached events from {}", raw.events.len(), path.display());
                Ok(Some(raw))
            }
            Ok(raw) => {
                warn!(
                    "{} holds events for {}, ignoring it",
                    path.display(),
                    raw.year
                );
                Ok(None)
            }
            Err(e) => {
                warn!("ignoring unreadable cache {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    /// Writes the raw events for their year.
    pub fn save_raw(&self, raw: &RawEvents) -> ClientResult<PathBuf> {
        let path = self.raw_path(raw.year);
        self.write_json(&path, raw)?;
        Ok(path)
    }

    /// Writes the summary for its year.
    pub fn save_stats(&self, report: &StatsReport<'_>) -> ClientResult<PathBuf> {
        let path = self.stats_path(report.year);
        self.write_json(&path, report)?;
        Ok(path)
    }

    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> ClientResult<()> {
        std::fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| ClientError::Config(format!("failed to serialize {}: {}", path.display(), e)))?;
        std::fs::write(path, json)?;
        debug!("wrote {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use lifely_core::EventDateTime;

    fn raw_events(year: i32) -> RawEvents {
        let day = NaiveDate::from_ymd_opt(year, 3, 14).unwrap();
        let mut event = CalendarEvent::new(
            "evt-1",
            EventDateTime::date(day),
            EventDateTime::date(day.succ_opt().unwrap()),
        );
        event.summary = Some("Pi day".to_string());
        RawEvents {
            year,
            user_email: "me@example.com".to_string(),
            fetched_at: Utc::now(),
            events: vec![event],
        }
    }

    #[test]
    fn missing_cache_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = EventCache::new(dir.path());
        assert!(cache.load_raw(2024).unwrap().is_none());
    }

    #[test]
    fn raw_events_survive_a_reload() {
        let dir = tempfile::tempdir().unwrap();
        let cache = EventCache::new(dir.path().join("data"));
        let raw = raw_events(2024);

        let path = cache.save_raw(&raw).unwrap();
        assert!(path.ends_with("raw_events_2024.json"));

        let loaded = cache.load_raw(2024).unwrap().unwrap();
        assert_eq!(loaded, raw);
        assert!(cache.load_raw(2023).unwrap().is_none());
    }

    #[test]
    fn corrupt_cache_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = EventCache::new(dir.path());
        std::fs::write(cache.raw_path(2024), "{not json").unwrap();
        assert!(cache.load_raw(2024).unwrap().is_none());
    }

    #[test]
    fn cache_for_another_year_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = EventCache::new(dir.path());
        let raw = raw_events(2023);
        let json = serde_json::to_string(&raw).unwrap();
        std::fs::write(cache.raw_path(2024), json).unwrap();
        assert!(cache.load_raw(2024).unwrap().is_none());
    }

    #[test]
    fn stats_report_shape() {
        let dir = tempfile::tempdir().unwrap();
        let cache = EventCache::new(dir.path());
        let time_stats = lifely_core::compute_time_stats(&[]);
        let report = StatsReport {
            year: 2024,
            time_stats: &time_stats,
            friend_stats: &[],
        };

        let path = cache.save_stats(&report).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(value["year"], 2024);
        assert_eq!(value["time_stats"]["total_events"], 0);
        assert!(value["friend_stats"].as_array().unwrap().is_empty());
    }
}
