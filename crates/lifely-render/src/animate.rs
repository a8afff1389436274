//! Frame-driven reveal helpers.
//!
//! Each helper pushes successive states into a caller-supplied sink on a
//! tokio timer. Under [`MotionPreference::Reduced`] the final state is
//! shown at once. Dropping the returned future stops the animation.

use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior, interval};

/// Interval between animation frames (about 60 fps).
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Whether the viewer wants animations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionPreference {
    #[default]
    Full,
    Reduced,
}

impl MotionPreference {
    /// Picks [`Reduced`](Self::Reduced) when `reduced` is set.
    pub fn from_flag(reduced: bool) -> Self {
        if reduced { Self::Reduced } else { Self::Full }
    }

    pub fn is_reduced(self) -> bool {
        self == Self::Reduced
    }
}

/// Ease-out cubic: fast start, gentle landing.
fn ease_out(progress: f64) -> f64 {
    1.0 - (1.0 - progress).powi(3)
}

/// Counts the displayed number up from 0 to `target` over `duration`.
///
/// The sink receives one value per frame and always ends on exactly
/// `target`.
pub async fn count_up<F>(target: u64, duration: Duration, motion: MotionPreference, mut sink: F)
where
    F: FnMut(u64),
{
    if motion.is_reduced() || duration.is_zero() || target == 0 {
        sink(target);
        return;
    }

    let mut ticker = interval(FRAME_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let start = Instant::now();

    loop {
        ticker.tick().await;
        let progress = start.elapsed().as_secs_f64() / duration.as_secs_f64();
        if progress >= 1.0 {
            sink(target);
            return;
        }
        let value = (target as f64 * ease_out(progress)).round() as u64;
        sink(value.min(target));
    }
}

/// Reveals `text` one character per `step`.
///
/// The sink receives the growing prefix; the last call carries the whole
/// text. A zero `step` shows the whole text at once.
pub async fn typewriter<F>(text: &str, step: Duration, motion: MotionPreference, mut sink: F)
where
    F: FnMut(&str),
{
    if motion.is_reduced() || step.is_zero() || text.is_empty() {
        sink(text);
        return;
    }

    let mut ticker = interval(step);
    for (idx, ch) in text.char_indices() {
        ticker.tick().await;
        sink(&text[..idx + ch.len_utf8()]);
    }
}

/// A bar whose target width comes from its `data-width` attribute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bar {
    data_width: Option<String>,
    width: Option<String>,
}

impl Bar {
    /// Creates a bar with the given `data-width` attribute value.
    pub fn new(data_width: impl Into<String>) -> Self {
        Self {
            data_width: Some(data_width.into()),
            width: None,
        }
    }

    /// A bar for `value` relative to `max`.
    pub fn proportional(value: f64, max: f64) -> Self {
        let percent = if max > 0.0 { value / max * 100.0 } else { 0.0 };
        Self::new(format!("{:.0}", percent))
    }

    /// The raw `data-width` attribute, if any.
    pub fn data_width(&self) -> Option<&str> {
        self.data_width.as_deref()
    }

    /// The applied width, e.g. `"42%"`. `None` until animated.
    pub fn width(&self) -> Option<&str> {
        self.width.as_deref()
    }

    /// The target percentage in 0..=100, if the attribute parses.
    pub fn target_percent(&self) -> Option<f64> {
        let raw = self.data_width.as_deref()?.trim();
        let value: f64 = raw.strip_suffix('%').unwrap_or(raw).trim().parse().ok()?;
        value.is_finite().then(|| value.clamp(0.0, 100.0))
    }
}

/// Applies each bar's target width.
///
/// Does nothing under reduced motion. Bars without a usable `data-width`
/// are left as they are. Returns how many bars were updated.
pub fn animate_bars(bars: &mut [Bar], motion: MotionPreference) -> usize {
    if motion.is_reduced() {
        return 0;
    }

    let mut updated = 0;
    for bar in bars.iter_mut() {
        if let Some(percent) = bar.target_percent() {
            bar.width = Some(format!("{}%", percent));
            updated += 1;
        }
    }
    updated
}

/// State of one step indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DotState {
    Done,
    Active,
    Pending,
}

/// A row of step indicators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressDots {
    total: usize,
    current: usize,
}

impl ProgressDots {
    pub fn new(total: usize) -> Self {
        Self { total, current: 0 }
    }

    /// Index of the active step.
    pub fn current(&self) -> usize {
        self.current
    }

    /// Marks step `index` as active, clamped to the last step.
    pub fn set_current(&mut self, index: usize) {
        self.current = index.min(self.total.saturating_sub(1));
    }

    /// Moves to the next step. Returns false on the last one.
    pub fn advance(&mut self) -> bool {
        if self.current + 1 < self.total {
            self.current += 1;
            true
        } else {
            false
        }
    }

    pub fn states(&self) -> Vec<DotState> {
        (0..self.total)
            .map(|i| match i.cmp(&self.current) {
                std::cmp::Ordering::Less => DotState::Done,
                std::cmp::Ordering::Equal => DotState::Active,
                std::cmp::Ordering::Greater => DotState::Pending,
            })
            .collect()
    }

    /// Terminal rendering, e.g. `"● ◉ ○ ○"`.
    pub fn render(&self) -> String {
        self.states()
            .into_iter()
            .map(|state| match state {
                DotState::Done => "●",
                DotState::Active => "◉",
                DotState::Pending => "○",
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}
