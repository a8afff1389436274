//! The "constellation" heat map: visited places projected into a box.
//!
//! Longitude maps to `left` and latitude (inverted) to `top`, both as
//! percentages with 5% padding on each side. Visit counts drive dot size
//! and opacity on a square-root scale.

use std::fmt::Write as _;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RenderError;

/// Shown when no point has usable coordinates.
pub const NO_DATA_MESSAGE: &str = "No places to show yet.";

/// Shown when there are too few points to draw a meaningful map.
pub const SPARSE_MESSAGE: &str = "Not enough places yet to draw your map.";

const PADDING: f64 = 5.0;
const MIN_SPAN: f64 = 0.001;
const JITTER: f64 = 0.4;
const MIN_SIZE_PX: f64 = 8.0;
const MAX_SIZE_PX: f64 = 14.0;
const MIN_OPACITY: f64 = 0.45;
const MAX_OPACITY: f64 = 0.85;

/// A visited place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lat: f64,
    pub lng: f64,
    #[serde(default = "default_visits")]
    pub visits: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

fn default_visits() -> u32 {
    1
}

impl Point {
    pub fn new(lat: f64, lng: f64, visits: u32) -> Self {
        Self {
            lat,
            lng,
            visits,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// Parses a JSON array of points.
pub fn load_points(json: &str) -> Result<Vec<Point>, RenderError> {
    serde_json::from_str(json).map_err(RenderError::InvalidPoints)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeatOptions {
    /// Below this many valid points the map is replaced by a message.
    pub min_points: usize,
    /// Points beyond this many (after filtering) are not drawn.
    pub max_points: usize,
}

impl Default for HeatOptions {
    fn default() -> Self {
        Self {
            min_points: 15,
            max_points: 300,
        }
    }
}

/// One positioned dot. Coordinates are percentages of the container.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dot {
    pub left: f64,
    pub top: f64,
    pub size_px: f64,
    pub opacity: f64,
    pub visits: u32,
    pub label: Option<String>,
}

/// Result of [`render_constellation_heat`].
#[derive(Debug, Clone, PartialEq)]
pub enum HeatRender {
    NoData,
    Sparse { valid: usize, required: usize },
    Dots(Vec<Dot>),
}

impl HeatRender {
    /// Number of dots drawn (zero for the message variants).
    pub fn dot_count(&self) -> usize {
        match self {
            Self::Dots(dots) => dots.len(),
            _ => 0,
        }
    }

    /// The fallback message, if no dots are drawn.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Self::NoData => Some(NO_DATA_MESSAGE),
            Self::Sparse { .. } => Some(SPARSE_MESSAGE),
            Self::Dots(_) => None,
        }
    }

    /// Renders the map container as an HTML fragment.
    pub fn to_html(&self) -> String {
        let dots = match self {
            Self::Dots(dots) => dots,
            _ => {
                return format!(
                    "<div class=\"constellation constellation--empty\"><p>{}</p></div>\n",
                    self.message().unwrap_or_default()
                );
            }
        };

        let mut html = String::from("<div class=\"constellation\">\n");
        for dot in dots {
            let title = dot
                .label
                .as_deref()
                .map(|label| format!(" title=\"{}\"", escape_html(label)))
                .unwrap_or_default();
            let _ = writeln!(
                html,
                "  <span class=\"constellation__dot\"{} style=\"left:{:.2}%;top:{:.2}%;\
                 width:{:.1}px;height:{:.1}px;opacity:{:.2}\"></span>",
                title, dot.left, dot.top, dot.size_px, dot.size_px, dot.opacity
            );
        }
        html.push_str("</div>\n");
        html
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Projects `points` into dots.
///
/// Points with non-finite coordinates are dropped. Zero survivors yield
/// [`HeatRender::NoData`]; fewer than `min_points` yield
/// [`HeatRender::Sparse`]. Otherwise the first `max_points` survivors are
/// drawn, each nudged by up to ±0.4 on both axes so stacked places stay
/// visible.
pub fn render_constellation_heat<R: Rng>(
    points: &[Point],
    options: &HeatOptions,
    rng: &mut R,
) -> HeatRender {
    let valid: Vec<&Point> = points.iter().filter(|p| p.is_finite()).collect();
    debug!(
        "heat map: {} of {} points have coordinates",
        valid.len(),
        points.len()
    );

    if valid.is_empty() {
        return HeatRender::NoData;
    }
    if valid.len() < options.min_points {
        return HeatRender::Sparse {
            valid: valid.len(),
            required: options.min_points,
        };
    }

    let kept = &valid[..valid.len().min(options.max_points)];

    let (mut min_lat, mut max_lat) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_lng, mut max_lng) = (f64::INFINITY, f64::NEG_INFINITY);
    let mut max_visits = 0u32;
    for p in kept {
        min_lat = min_lat.min(p.lat);
        max_lat = max_lat.max(p.lat);
        min_lng = min_lng.min(p.lng);
        max_lng = max_lng.max(p.lng);
        max_visits = max_visits.max(p.visits);
    }
    let lat_span = (max_lat - min_lat).max(MIN_SPAN);
    let lng_span = (max_lng - min_lng).max(MIN_SPAN);
    let usable = 100.0 - 2.0 * PADDING;
    let max_root = f64::from(max_visits).sqrt();

    let dots = kept
        .iter()
        .map(|p| {
            let left = PADDING + (p.lng - min_lng) / lng_span * usable;
            let top = PADDING + (max_lat - p.lat) / lat_span * usable;
            let ratio = if max_root > 0.0 {
                f64::from(p.visits).sqrt() / max_root
            } else {
                0.0
            };

            Dot {
                left: left + rng.random_range(-JITTER..=JITTER),
                top: top + rng.random_range(-JITTER..=JITTER),
                size_px: MIN_SIZE_PX + (MAX_SIZE_PX - MIN_SIZE_PX) * ratio,
                opacity: (MIN_OPACITY + (MAX_OPACITY - MIN_OPACITY) * ratio)
                    .clamp(MIN_OPACITY, MAX_OPACITY),
                visits: p.visits,
                label: p.label.clone(),
            }
        })
        .collect();

    HeatRender::Dots(dots)
}
