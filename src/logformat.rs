//! Log-format awareness: severity levels and timestamps.
//!
//! Both detectors are pure functions over a line's content. Level detection
//! matches configurable patterns against the line prefix; timestamp parsing
//! tries a fixed, ordered list of common formats.

pub mod level;
pub mod timestamp;

pub use level::{Level, LevelDetector};
pub use timestamp::{parse_time_input, TimestampParser};
