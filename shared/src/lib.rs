pub mod aggregate;
pub mod colors;
pub mod stats;
pub mod style;
pub mod thresholds;

pub use aggregate::AggregatePoint;
pub use colors::{PaletteMode, Rgb, Rgba, fill_color, line_color};
pub use stats::{ViewportFeature, ViewportStats};
pub use style::*;
pub use thresholds::{bucket_index, thresholds_for};
