//! General utilities for tokenforge Core.
//!
//! - [`fs`]: filesystem helpers mapping `std::io::Error` into [`crate::CoreError`].
//! - [`paths`]: XDG base directories and application-specific paths.

pub mod fs;
pub mod paths;

pub use fs::{ensure_dir_exists, read_file_to_string, write_string_to_file};
