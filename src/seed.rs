//! Seed point text files.
//!
//! Each matched pair is given by an optional birth time followed by four
//! seed points, one item per line:
//!
//! ```text
//! 2017-09-08T02:10:00.000
//! 10.0 0.0 2.5
//! 10.0 0.0 -2.5
//! 10.5 0.0 2.5
//! 10.5 0.0 -2.5
//! 3600
//! ...
//! ```
//!
//! A line containing a space is a point. A line containing `:` is an
//! absolute birth time. Any other line is a birth time in seconds after the
//! source start time. Pairs without an explicit birth time start at the
//! source start time.

use std::path::Path;

use glam::Vec3;

use crate::error::FieldlinesError;

/// Seed points per matched pair: the two reconnecting lines followed by
/// their two flow partners.
pub const SEEDS_PER_PAIR: usize = 4;

/// Parsed seed point file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedPoints {
    /// All points in file order.
    pub points: Vec<Vec3>,
    /// One birth time (J2000 seconds) per complete group of four points.
    pub birth_times: Vec<f64>,
}

impl SeedPoints {
    /// Number of complete seed groups.
    #[must_use]
    pub fn n_pairs(&self) -> usize {
        self.points.len() / SEEDS_PER_PAIR
    }
}

fn parse_error(line_number: usize, line: &str, what: &str) -> FieldlinesError {
    FieldlinesError::SeedFile(format!("line {line_number} '{line}': {what}"))
}

fn parse_point(line_number: usize, line: &str) -> Result<Vec3, FieldlinesError> {
    let values = line
        .split_whitespace()
        .map(str::parse::<f32>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| parse_error(line_number, line, &e.to_string()))?;
    match values.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(parse_error(
            line_number,
            line,
            &format!("expected 3 coordinates, found {}", values.len()),
        )),
    }
}

/// Parse seed point text. `start_time` anchors relative birth times and is
/// the default birth time.
pub fn parse_seed_points(text: &str, start_time: f64) -> Result<SeedPoints, FieldlinesError> {
    let mut seeds = SeedPoints::default();
    for (i, raw) in text.lines().enumerate() {
        let line_number = i + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if line.contains(' ') || line.contains('\t') {
            seeds.points.push(parse_point(line_number, line)?);
        } else if line.contains(':') {
            seeds.birth_times.push(crate::time::j2000_from_iso(line)?);
        } else {
            let offset: f64 = line
                .parse()
                .map_err(|e: std::num::ParseFloatError| {
                    parse_error(line_number, line, &e.to_string())
                })?;
            seeds.birth_times.push(start_time + offset);
        }

        if seeds.n_pairs() > seeds.birth_times.len() {
            seeds.birth_times.push(start_time);
        }
    }

    if seeds.points.is_empty() {
        return Err(FieldlinesError::SeedFile("found no seed points".to_owned()));
    }
    Ok(seeds)
}

/// Read and parse a `.txt` seed point file.
pub fn read_seed_point_file(path: &Path, start_time: f64) -> Result<SeedPoints, FieldlinesError> {
    let is_txt = path.extension().is_some_and(|ext| ext == "txt");
    if !path.is_file() || !is_txt {
        return Err(FieldlinesError::SeedFile(format!(
            "{} must be an existing .txt file",
            path.display()
        )));
    }
    let text = std::fs::read_to_string(path)?;
    let seeds = parse_seed_points(&text, start_time).map_err(|e| match e {
        FieldlinesError::SeedFile(msg) => {
            FieldlinesError::SeedFile(format!("{}: {msg}", path.display()))
        }
        other => other,
    })?;
    log::info!(
        "Read {} seed points ({} pairs) from {}",
        seeds.points.len(),
        seeds.n_pairs(),
        path.display()
    );
    Ok(seeds)
}
