//! Parse planner memory log lines into per-iteration sections.
//!
//! After every return the planner prints one line per tracked structure:
//! ```text
//! TrajLNS:heuristics_mem_GB = 0.412
//! TrajLNS:trajs_mem_GB = 0.031
//! TrajLNS:total_mem_GB = 0.5
//! ```
//!
//! The log has no explicit section delimiter. A section closes when the
//! terminator metric (`total`) is recorded, or when a start key
//! (`heuristics`) shows up again while a section is already open.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::Context;
use regex::Regex;

use super::error::MemLogError;
use super::table::{Section, SectionTable};

/// Tag printed before every memory metric.
pub const DEFAULT_PREFIX: &str = "TrajLNS";

/// First metric the planner reports on each return.
pub const DEFAULT_START_KEY: &str = "heuristics";

/// Aggregate metric that ends a section.
pub const DEFAULT_TERMINATOR: &str = "total";

/// One matched `<prefix>:<key>_mem_GB = <value>` line.
#[derive(Debug, Clone, PartialEq)]
pub struct MemSample {
    /// Metric name without the `_mem_GB` suffix (e.g., "heuristics")
    pub key: String,
    /// Parsed value; `None` if the literal matched but did not parse
    pub value: Option<f64>,
}

/// Line format and section boundary keys.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    prefix: String,
    start_keys: HashSet<String>,
    terminator: String,
    pattern: Regex,
}

impl ParseOptions {
    pub fn new<I, S>(prefix: impl Into<String>, start_keys: I, terminator: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let prefix = prefix.into();
        let pattern = format!(
            r"^\s*{}:(?P<key>\w+)_mem_GB\s*=\s*(?P<val>[-+]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][-+]?[0-9]+)?)\s*$",
            regex::escape(&prefix)
        );
        Self {
            pattern: Regex::new(&pattern).expect("escaped prefix always forms a valid pattern"),
            prefix,
            start_keys: start_keys.into_iter().map(Into::into).collect(),
            terminator: terminator.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn terminator(&self) -> &str {
        &self.terminator
    }

    pub fn is_start_key(&self, key: &str) -> bool {
        self.start_keys.contains(key)
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX, [DEFAULT_START_KEY], DEFAULT_TERMINATOR)
    }
}

/// Parse a single log line.
///
/// Returns `None` if the line doesn't match the expected format. Surrounding
/// whitespace, including the line terminator, is ignored. Values must use
/// ASCII digits.
pub fn parse_line(line: &str, options: &ParseOptions) -> Option<MemSample> {
    let captures = options.pattern.captures(line)?;
    let key = captures.name("key")?.as_str();
    let value = captures.name("val")?.as_str();

    Some(MemSample {
        key: key.to_string(),
        value: value.parse().ok(),
    })
}

/// Incremental section builder.
///
/// Feed samples in log order with [`push`](Self::push), then call
/// [`finish`](Self::finish) to get the table.
#[derive(Debug)]
pub struct SectionParser<'a> {
    options: &'a ParseOptions,
    sections: Vec<Section>,
    current: Section,
    start_key_seen: bool,
}

impl<'a> SectionParser<'a> {
    pub fn new(options: &'a ParseOptions) -> Self {
        Self {
            options,
            sections: Vec::new(),
            current: Section::new(),
            start_key_seen: false,
        }
    }

    /// Record one sample, closing sections as the boundary keys dictate.
    ///
    /// Order matters: a repeated start key closes the open section before
    /// its value is stored, while the terminator closes the section after.
    pub fn push(&mut self, sample: MemSample) {
        let is_start_key = self.options.is_start_key(&sample.key);

        if is_start_key && self.start_key_seen && !self.current.is_empty() {
            self.close_section();
        }

        if is_start_key {
            self.start_key_seen = true;
        }

        let is_terminator = sample.key == self.options.terminator;
        if self.current.insert(sample.key.as_str(), sample.value) {
            log::trace!("Overwrote {} within section {}", sample.key, self.sections.len());
        }

        if is_terminator {
            self.close_section();
        }
    }

    /// Close the trailing section and build the table.
    pub fn finish(mut self) -> Result<SectionTable, MemLogError> {
        if !self.current.is_empty() {
            self.close_section();
        }

        if self.sections.is_empty() {
            return Err(MemLogError::NoSections {
                prefix: self.options.prefix.clone(),
            });
        }

        Ok(SectionTable::from_sections(
            self.sections,
            self.options.terminator.as_str(),
        ))
    }

    fn close_section(&mut self) {
        let section = std::mem::take(&mut self.current);
        log::debug!(
            "Section {} closed with {} metrics",
            self.sections.len(),
            section.len()
        );
        self.sections.push(section);
        self.start_key_seen = false;
    }
}

/// Read `reader` to completion and split its memory lines into sections.
///
/// Bytes that are not valid UTF-8 are dropped rather than failing the read.
/// A bare `\r` ends a line just like `\n` or `\r\n`, so progress output that
/// rewrites the terminal line doesn't swallow the metric printed after it.
pub fn parse_sections<R: BufRead>(
    mut reader: R,
    options: &ParseOptions,
) -> anyhow::Result<SectionTable> {
    let mut parser = SectionParser::new(options);
    let mut buf = Vec::new();
    let mut line = String::new();
    let mut line_no = 0usize;

    loop {
        buf.clear();
        if reader
            .read_until(b'\n', &mut buf)
            .context("Failed to read log")?
            == 0
        {
            break;
        }
        line_no += 1;

        line.clear();
        for chunk in buf.utf8_chunks() {
            line.push_str(chunk.valid());
        }

        for part in line.split('\r') {
            match parse_line(part, options) {
                Some(sample) => parser.push(sample),
                None => log::trace!("Skipped line {line_no}"),
            }
        }
    }

    Ok(parser.finish()?)
}

/// Parse an in-memory log.
pub fn parse_str(input: &str, options: &ParseOptions) -> anyhow::Result<SectionTable> {
    parse_sections(input.as_bytes(), options)
}

/// Open and parse the log at `path`.
pub fn parse_file(path: &Path, options: &ParseOptions) -> anyhow::Result<SectionTable> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;
    let table = parse_sections(BufReader::new(file), options)?;
    log::info!("Parsed {} sections from {}", table.len(), path.display());
    Ok(table)
}
