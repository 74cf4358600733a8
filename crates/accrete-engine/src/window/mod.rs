//! Sliding-window engines
//!
//! Both engines re-evaluate a trailing window once per calendar day against a
//! shared [`ActivityIndex`]. Each day depends only on the index, so days are
//! evaluated in parallel and collected in date order.

pub mod frequency;
pub mod index;
pub mod rolling;

pub use frequency::{
    FrequencyRow, ThresholdBreakout, evaluate_frequency, frequency_report, frequency_window_ends,
};
pub use index::{ActivityIndex, IndexedActivity};
pub use rolling::{
    RollingWindowRow, WindowBounds, WindowBuckets, evaluate_window, rolling_quick_ratio,
    rolling_window_count,
};
