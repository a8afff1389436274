//! Heat map command.

use std::path::Path;

use lifely_core::normalize_events;
use lifely_render::{HeatOptions, HeatRender, Point, load_points, render_constellation_heat};
use tracing::info;

use crate::cache::EventCache;
use crate::cli::HeatmapArgs;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::places::{PlacesCache, points_from_events};

const PAGE_STYLE: &str = "\
body{margin:0;background:#0b1020;color:#e8ecf8;font-family:system-ui,sans-serif}
.constellation{position:relative;width:100vw;height:100vh;overflow:hidden}
.constellation--empty{display:flex;align-items:center;justify-content:center}
.constellation__dot{position:absolute;border-radius:50%;background:#ffd166;transform:translate(-50%,-50%)}";

/// Renders the places from a points file or a cached year and writes the page.
pub fn run(args: HeatmapArgs, config: &ClientConfig) -> ClientResult<()> {
    let points = match (&args.points, args.year) {
        (Some(path), _) => load_points(&std::fs::read_to_string(path)?)?,
        (None, Some(year)) => year_points(year, config)?,
        (None, None) => return Err(ClientError::Config("heatmap needs --points or --year".into())),
    };

    let mut options = HeatOptions::default();
    if let Some(min_points) = args.min_points {
        options.min_points = min_points;
    }

    let render = render_constellation_heat(&points, &options, &mut rand::rng());
    if let Some(message) = render.message() {
        eprintln!("{}", message);
    }

    let page = render_page(&render);
    match args.output {
        Some(ref path) => write_page(path, &page)?,
        None => print!("{}", page),
    }
    Ok(())
}

/// Points for the locations of a year's cached events.
fn year_points(year: i32, config: &ClientConfig) -> ClientResult<Vec<Point>> {
    let tz = config.wrapped.timezone().map_err(ClientError::Config)?;
    let cache = EventCache::new(config.wrapped.data_dir());
    let raw = cache.load_raw(year)?.ok_or_else(|| {
        ClientError::Config(format!(
            "no cached events for {}, run 'lifely wrapped --year {}' first",
            year, year
        ))
    })?;

    let events = normalize_events(&raw.events, &raw.user_email, tz);
    let places = PlacesCache::load(cache.dir());
    let points = points_from_events(&events, &places);
    info!("placed {} locations from {} events", points.len(), events.len());
    Ok(points)
}

fn write_page(path: &Path, page: &str) -> ClientResult<()> {
    std::fs::write(path, page)?;
    info!("heat map written to {}", path.display());
    println!("Heat map written to {}", path.display());
    Ok(())
}

/// Wraps the map fragment in a standalone HTML page.
fn render_page(render: &HeatRender) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Your places</title>\n<style>\n{}\n</style>\n</head>\n<body>\n{}</body>\n</html>\n",
        PAGE_STYLE,
        render.to_html()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::RawEvents;
    use crate::config::WrappedSettings;
    use chrono::{NaiveDate, Utc};
    use lifely_core::{CalendarEvent, EventDateTime};
    use std::path::PathBuf;

    fn args(points: PathBuf, output: Option<PathBuf>, min_points: Option<usize>) -> HeatmapArgs {
        HeatmapArgs {
            points: Some(points),
            year: None,
            min_points,
            output,
        }
    }

    fn config_in(dir: &Path) -> ClientConfig {
        ClientConfig {
            wrapped: WrappedSettings {
                data_dir: Some(dir.to_path_buf()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn writes_dots_to_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let points = dir.path().join("places.json");
        std::fs::write(
            &points,
            r#"[
                {"lat": 40.7, "lng": -74.0, "visits": 3, "label": "Home <3"},
                {"lat": 40.8, "lng": -73.9},
                {"lat": 41.0, "lng": -73.5, "visits": 1}
            ]"#,
        )
        .unwrap();
        let output = dir.path().join("map.html");

        run(args(points, Some(output.clone()), Some(2)), &ClientConfig::default()).unwrap();

        let page = std::fs::read_to_string(output).unwrap();
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert_eq!(page.matches("class=\"constellation__dot\"").count(), 3);
        assert!(page.contains("Home &lt;3"));
    }

    #[test]
    fn sparse_points_render_the_message() {
        let dir = tempfile::tempdir().unwrap();
        let points = dir.path().join("places.json");
        std::fs::write(&points, r#"[{"lat": 1.0, "lng": 2.0}]"#).unwrap();
        let output = dir.path().join("map.html");

        run(args(points, Some(output.clone()), None), &ClientConfig::default()).unwrap();

        let page = std::fs::read_to_string(output).unwrap();
        assert!(page.contains(lifely_render::SPARSE_MESSAGE));
    }

    #[test]
    fn invalid_points_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::default();
        let points = dir.path().join("places.json");
        std::fs::write(&points, "{\"lat\": 1}").unwrap();

        let err = run(args(points, None, None), &config).unwrap_err();
        assert!(matches!(err, ClientError::Render(_)));

        let missing = dir.path().join("missing.json");
        let err = run(args(missing, None, None), &config).unwrap_err();
        assert!(matches!(err, ClientError::Io(_)));
    }

    #[test]
    fn year_places_cached_event_locations() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let cache = EventCache::new(dir.path());

        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let events = ["Cafe", "Cafe", "40.7,-74.0", "Zoom"]
            .iter()
            .enumerate()
            .map(|(i, location)| {
                let mut event = CalendarEvent::new(
                    format!("evt-{}", i),
                    EventDateTime::date(day),
                    EventDateTime::date(day.succ_opt().unwrap()),
                );
                event.location = Some(location.to_string());
                event
            })
            .collect();
        cache
            .save_raw(&RawEvents {
                year: 2024,
                user_email: "me@example.com".to_string(),
                fetched_at: Utc::now(),
                events,
            })
            .unwrap();
        std::fs::write(
            PlacesCache::path(dir.path()),
            r#"{"Cafe": {"venue_name": "Cafe Lux", "latitude": 40.72, "longitude": -73.99}}"#,
        )
        .unwrap();

        let output = dir.path().join("map.html");
        let heatmap = HeatmapArgs {
            points: None,
            year: Some(2024),
            min_points: Some(2),
            output: Some(output.clone()),
        };
        run(heatmap, &config).unwrap();

        let page = std::fs::read_to_string(output).unwrap();
        assert_eq!(page.matches("class=\"constellation__dot\"").count(), 2);
        assert!(page.contains("Cafe Lux"));
    }

    #[test]
    fn year_without_cached_events_errors() {
        let dir = tempfile::tempdir().unwrap();
        let heatmap = HeatmapArgs {
            points: None,
            year: Some(2019),
            min_points: None,
            output: None,
        };
        let err = run(heatmap, &config_in(dir.path())).unwrap_err();
        assert!(err.to_string().contains("lifely wrapped --year 2019"));
    }
}
