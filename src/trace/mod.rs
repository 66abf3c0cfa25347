//! Field tracing collaborator and the geometry helpers applied to its
//! output.
//!
//! The tracer itself (CDF reading, field interpolation, streamline
//! integration) lives outside this crate behind [`FieldTracer`].

pub mod matching;

use std::path::{Path, PathBuf};

use glam::Vec3;

pub use matching::{convert_to_matching_state, MatchingTraceConfig};

use crate::error::FieldlinesError;
use crate::state::Model;

/// Direction of a unidirectional trace along the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceDirection {
    /// Along the field vector.
    Forward,
    /// Against the field vector.
    Reverse,
}

/// A source of traced field lines, typically one simulation output file.
pub trait FieldTracer {
    /// Model the source was produced by.
    fn model(&self) -> Model;

    /// Start time of the source in J2000 seconds, if recorded.
    fn start_time(&self) -> Option<f64>;

    /// Make `variable` available for tracing and sampling.
    fn load_variable(&mut self, variable: &str) -> Result<(), FieldlinesError>;

    /// Tracing stops when a line comes closer than `radius` to the origin.
    fn set_inner_boundary(&mut self, radius: f32);

    /// Trace `variable` from `seed` in one direction. The returned vertices
    /// start at the seed.
    fn trace(
        &mut self,
        seed: Vec3,
        variable: &str,
        direction: TraceDirection,
    ) -> Result<Vec<Vec3>, FieldlinesError>;

    /// Trace in both directions and join the halves into one line running
    /// from the reverse end through the seed to the forward end.
    fn trace_bidirectional(
        &mut self,
        seed: Vec3,
        variable: &str,
    ) -> Result<Vec<Vec3>, FieldlinesError> {
        let mut line = self.trace(seed, variable, TraceDirection::Reverse)?;
        line.reverse();
        let forward = self.trace(seed, variable, TraceDirection::Forward)?;
        let skip = usize::from(!line.is_empty() && forward.first() == line.last());
        line.extend(forward.into_iter().skip(skip));
        Ok(line)
    }

    /// Value of vector `variable` at `point`.
    fn sample(&self, variable: &str, point: Vec3) -> Result<Vec3, FieldlinesError>;
}

/// Resample `points` to exactly `n` vertices spaced uniformly by arc length.
/// Both endpoints are kept. Fewer than two input points (or a zero-length
/// line) repeat the first point.
#[must_use]
pub fn resample(points: &[Vec3], n: usize) -> Vec<Vec3> {
    let Some(&first) = points.first() else {
        return Vec::new();
    };
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![first];
    }

    let mut cumulative = Vec::with_capacity(points.len());
    let mut total = 0.0f32;
    cumulative.push(0.0);
    for pair in points.windows(2) {
        total += pair[0].distance(pair[1]);
        cumulative.push(total);
    }
    if total <= f32::EPSILON {
        return vec![first; n];
    }

    let mut result = Vec::with_capacity(n);
    let mut segment = 0usize;
    for i in 0..n {
        let target = total * i as f32 / (n - 1) as f32;
        while segment + 2 < points.len() && cumulative[segment + 1] < target {
            segment += 1;
        }
        let span = cumulative[segment + 1] - cumulative[segment];
        let t = if span > 0.0 {
            ((target - cumulative[segment]) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        result.push(points[segment].lerp(points[segment + 1], t));
    }
    if let (Some(slot), Some(&last)) = (result.last_mut(), points.last()) {
        *slot = last;
    }
    result
}

/// All files in `dir` with extension `extension`, sorted by path.
pub fn collect_source_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, FieldlinesError> {
    if !dir.is_dir() {
        return Err(FieldlinesError::NoSourceFiles(format!(
            "{} is not a directory",
            dir.display()
        )));
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
            files.push(path);
        }
    }
    if files.is_empty() {
        return Err(FieldlinesError::NoSourceFiles(format!(
            "{} holds no .{extension} files",
            dir.display()
        )));
    }
    files.sort();
    Ok(files)
}
