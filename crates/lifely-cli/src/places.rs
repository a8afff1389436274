//! Coordinates for event locations.
//!
//! `places_cache.json` in the data directory maps a location string, exactly
//! as written on the event, to a resolved place. A location typed as a bare
//! `lat,lng` pair needs no cache entry.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use lifely_core::NormalizedEvent;
use lifely_render::Point;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const PLACES_CACHE_FILENAME: &str = "places_cache.json";

/// A resolved place. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceEntry {
    #[serde(default)]
    pub venue_name: Option<String>,
    #[serde(default)]
    pub neighborhood: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub cuisine: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl PlaceEntry {
    /// Latitude and longitude, when both are present and in range.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        valid_coordinates(self.latitude?, self.longitude?)
    }
}

/// Location string to place lookups.
#[derive(Debug, Clone, Default)]
pub struct PlacesCache {
    entries: HashMap<String, PlaceEntry>,
}

impl PlacesCache {
    pub fn path(dir: &Path) -> PathBuf {
        dir.join(PLACES_CACHE_FILENAME)
    }

    /// Loads the cache from `dir`.
    ///
    /// A missing file gives an empty cache. So does an unreadable one, after
    /// a warning.
    pub fn load(dir: &Path) -> Self {
        let path = Self::path(dir);
        if !path.exists() {
            debug!("no places cache at {}", path.display());
            return Self::default();
        }

        let parsed = std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|content| {
                serde_json::from_str::<HashMap<String, PlaceEntry>>(&content)
                    .map_err(|e| e.to_string())
            });
        match parsed {
            Ok(entries) => {
                debug!("loaded {} places from {}", entries.len(), path.display());
                Self { entries }
            }
            Err(e) => {
                warn!("ignoring unreadable places cache {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, location: &str) -> Option<&PlaceEntry> {
        self.entries.get(location)
    }

    /// Coordinates and label for `location`.
    ///
    /// Cached entries win over a literal `lat,lng`. The label is the venue
    /// name, or the location string itself.
    pub fn resolve(&self, location: &str) -> Option<(f64, f64, String)> {
        let location = location.trim();
        if let Some(entry) = self.get(location)
            && let Some((lat, lng)) = entry.coordinates()
        {
            let label = entry.venue_name.clone().unwrap_or_else(|| location.to_string());
            return Some((lat, lng, label));
        }
        let (lat, lng) = parse_coordinates(location)?;
        Some((lat, lng, location.to_string()))
    }
}

impl FromIterator<(String, PlaceEntry)> for PlacesCache {
    fn from_iter<I: IntoIterator<Item = (String, PlaceEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Parses `"40.71, -74.00"` style locations.
fn parse_coordinates(location: &str) -> Option<(f64, f64)> {
    let (lat, lng) = location.split_once(',')?;
    valid_coordinates(lat.trim().parse().ok()?, lng.trim().parse().ok()?)
}

fn valid_coordinates(lat: f64, lng: f64) -> Option<(f64, f64)> {
    let valid = (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng);
    valid.then_some((lat, lng))
}

/// One heat map point per distinct resolvable location.
///
/// Visits count the events held at that location. Locations that resolve
/// to nothing are skipped.
pub fn points_from_events(events: &[NormalizedEvent], places: &PlacesCache) -> Vec<Point> {
    let mut visits: BTreeMap<&str, u32> = BTreeMap::new();
    for location in events.iter().filter_map(|e| e.location_raw.as_deref()) {
        let location = location.trim();
        if !location.is_empty() {
            *visits.entry(location).or_default() += 1;
        }
    }

    let total = visits.len();
    let points: Vec<Point> = visits
        .into_iter()
        .filter_map(|(location, count)| {
            let (lat, lng, label) = places.resolve(location)?;
            Some(Point::new(lat, lng, count).with_label(label))
        })
        .collect();

    debug!("resolved {} of {} distinct locations", points.len(), total);
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use lifely_core::{CalendarEvent, EventDateTime, normalize_events};

    fn events(locations: &[Option<&str>]) -> Vec<NormalizedEvent> {
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let raw: Vec<CalendarEvent> = locations
            .iter()
            .enumerate()
            .map(|(i, location)| {
                let mut event = CalendarEvent::new(
                    format!("evt-{}", i),
                    EventDateTime::date(day),
                    EventDateTime::date(day.succ_opt().unwrap()),
                );
                event.location = location.map(str::to_string);
                event
            })
            .collect();
        normalize_events(&raw, "me@example.com", chrono_tz::UTC)
    }

    fn cafe() -> PlaceEntry {
        PlaceEntry {
            venue_name: Some("Blue Bottle".to_string()),
            latitude: Some(40.72),
            longitude: Some(-73.99),
            ..Default::default()
        }
    }

    #[test]
    fn parses_literal_coordinates() {
        assert_eq!(parse_coordinates("40.7128, -74.0060"), Some((40.7128, -74.006)));
        assert_eq!(parse_coordinates("91,0"), None);
        assert_eq!(parse_coordinates("0,181"), None);
        assert_eq!(parse_coordinates("Conference Room B"), None);
        assert_eq!(parse_coordinates("Paris, France"), None);
    }

    #[test]
    fn cached_entry_wins_and_labels_with_venue() {
        let places: PlacesCache = [
            ("123 Main St".to_string(), cafe()),
            (
                "somewhere".to_string(),
                PlaceEntry {
                    latitude: Some(1.0),
                    ..Default::default()
                },
            ),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            places.resolve(" 123 Main St "),
            Some((40.72, -73.99, "Blue Bottle".to_string()))
        );
        assert_eq!(places.resolve("somewhere"), None);
        assert_eq!(places.resolve("1.5,2.5"), Some((1.5, 2.5, "1.5,2.5".to_string())));
    }

    #[test]
    fn points_count_visits_per_location() {
        let places: PlacesCache = [("123 Main St".to_string(), cafe())].into_iter().collect();
        let events = events(&[
            Some("123 Main St"),
            Some("123 Main St "),
            Some("10.0,20.0"),
            Some("Zoom"),
            Some("  "),
            None,
        ]);

        let points = points_from_events(&events, &places);
        assert_eq!(points.len(), 2);

        let cafe = points.iter().find(|p| p.label.as_deref() == Some("Blue Bottle")).unwrap();
        assert_eq!(cafe.visits, 2);
        assert_eq!((cafe.lat, cafe.lng), (40.72, -73.99));

        let literal = points.iter().find(|p| p.label.as_deref() == Some("10.0,20.0")).unwrap();
        assert_eq!(literal.visits, 1);
    }

    #[test]
    fn load_reads_the_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(PlacesCache::load(dir.path()).is_empty());

        std::fs::write(
            PlacesCache::path(dir.path()),
            r#"{
                "123 Main St": {"venue_name": "Blue Bottle", "neighborhood": null,
                                "city": "New York", "cuisine": "cafe",
                                "place_id": "abc", "latitude": 40.72, "longitude": -73.99}
            }"#,
        )
        .unwrap();
        let places = PlacesCache::load(dir.path());
        assert_eq!(places.len(), 1);
        assert_eq!(places.get("123 Main St").unwrap().city.as_deref(), Some("New York"));

        std::fs::write(PlacesCache::path(dir.path()), "[1, 2").unwrap();
        assert!(PlacesCache::load(dir.path()).is_empty());
    }
}
