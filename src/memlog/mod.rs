//! Planner memory log parsing.
//!
//! This module turns the `<prefix>:<key>_mem_GB = <value>` lines a planner
//! prints after each return into a table of sections, one row per return.
//!
//! # Usage
//!
//! ```no_run
//! use std::path::Path;
//! use memplot::memlog::{ParseOptions, parse_file};
//!
//! let table = parse_file(Path::new("log.txt"), &ParseOptions::default())?;
//! println!("{}", table.render_text());
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod error;
pub mod parse;
pub mod table;

// Re-export main types for convenience
pub use error::{MemLogError, is_no_sections};
pub use parse::{
    DEFAULT_PREFIX, DEFAULT_START_KEY, DEFAULT_TERMINATOR, MemSample, ParseOptions, SectionParser,
    parse_file, parse_line, parse_sections, parse_str,
};
pub use table::{Section, SectionTable};
