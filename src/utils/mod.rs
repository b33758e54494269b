//! Utility functions.

pub mod duration;
pub mod target;

pub use duration::{format_duration, parse_duration};
pub use target::get_target_from_msg;
