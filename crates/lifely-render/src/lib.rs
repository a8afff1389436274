//! Presentation helpers for the year summary.
//!
//! - [`count_up`], [`typewriter`] and [`animate_bars`] reveal numbers, text
//!   and bars, honouring a [`MotionPreference`]
//! - [`ProgressDots`] tracks multi-step progress
//! - [`render_constellation_heat`] projects visited places into a heat map

pub mod animate;
pub mod error;
pub mod heat;

pub use animate::{
    Bar, DotState, FRAME_INTERVAL, MotionPreference, ProgressDots, animate_bars, count_up,
    typewriter,
};
pub use error::RenderError;
pub use heat::{
    Dot, HeatOptions, HeatRender, NO_DATA_MESSAGE, Point, SPARSE_MESSAGE, load_points,
    render_constellation_heat,
};
