//! Small shared helpers.
//!
//! Currently only width-aware text utilities used by the terminal presenter.

mod text;

pub use text::{clip_summary, display_width, truncate_to_width};
