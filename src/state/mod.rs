//! Field-line state: flat vertex storage, extra scalar quantities and the
//! matched path-line pairs that drive moving field lines.
//!
//! Each line owns the half-open range `[line_start[i], line_start[i] +
//! line_count[i])` of [`FieldlinesState::vertex_positions`]. Every extra
//! quantity array is index-aligned with the vertex positions.

mod json;
mod keyframe;
mod osfls;

use std::ops::Range;
use std::path::{Path, PathBuf};

use glam::Vec3;
use rustc_hash::FxHashMap;

pub use keyframe::{
    Fieldline, MatchingFieldlines, Model, PathLine, Topology, NO_NEXT_KEY_FRAME,
};
pub use osfls::{read_osfls, write_osfls, CURRENT_VERSION, OSFLS_EXTENSION};

use crate::error::FieldlinesError;

/// Earth radius in meters; BATS-R-US positions are given in Earth radii.
pub const RE_TO_METER: f32 = 6_371_000.0;

/// All geometry and metadata for one field-line state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldlinesState {
    trigger_time: f64,
    model: Model,
    is_morphable: bool,
    line_start: Vec<u32>,
    line_count: Vec<u32>,
    vertex_positions: Vec<Vec3>,
    extra_quantities: Vec<Vec<f32>>,
    extra_quantity_names: Vec<String>,
    extra_quantity_lookup: FxHashMap<String, usize>,
    matching_fieldlines: Vec<MatchingFieldlines>,
}

impl FieldlinesState {
    /// An empty state with no model and trigger time 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -- Lines ----------------------------------------------------------

    /// Move `vertices` to the end of the vertex array as a new line.
    /// `vertices` is left empty.
    pub fn add_line(&mut self, vertices: &mut Vec<Vec3>) {
        self.line_start.push(self.vertex_positions.len() as u32);
        self.line_count.push(vertices.len() as u32);
        self.vertex_positions.append(vertices);
    }

    /// Number of lines.
    #[must_use]
    pub fn n_lines(&self) -> usize {
        self.line_start.len()
    }

    /// Vertex index range of line `index`, if it exists.
    #[must_use]
    pub fn line_range(&self, index: usize) -> Option<Range<usize>> {
        let start = *self.line_start.get(index)? as usize;
        let count = *self.line_count.get(index)? as usize;
        Some(start..start + count)
    }

    /// Vertices of line `index`, if it exists.
    #[must_use]
    pub fn line(&self, index: usize) -> Option<&[Vec3]> {
        self.line_range(index)
            .and_then(|range| self.vertex_positions.get(range))
    }

    // -- Extra quantities -----------------------------------------------

    /// Replace the extra quantity names, resizing the quantity arrays to
    /// match.
    pub fn set_extra_quantity_names(&mut self, names: Vec<String>) {
        self.extra_quantities.resize_with(names.len(), Vec::new);
        // Reversed so the first of any repeated names wins.
        self.extra_quantity_lookup = names
            .iter()
            .enumerate()
            .rev()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        self.extra_quantity_names = names;
    }

    /// Append one value to extra quantity `index`.
    pub fn append_to_extra(&mut self, index: usize, value: f32) -> Result<(), FieldlinesError> {
        let n = self.extra_quantities.len();
        self.extra_quantities
            .get_mut(index)
            .map(|quantity| quantity.push(value))
            .ok_or_else(|| {
                FieldlinesError::InconsistentState(format!(
                    "extra quantity index {index} out of range ({n} quantities)"
                ))
            })
    }

    /// The stored array for extra quantity `index`, or `None` if the index
    /// is out of range.
    #[must_use]
    pub fn extra_quantity(&self, index: usize) -> Option<&[f32]> {
        let quantity = self.extra_quantities.get(index).map(Vec::as_slice);
        if quantity.is_none() {
            log::error!(
                "Extra quantity index {index} out of range ({} quantities)",
                self.extra_quantities.len()
            );
        }
        quantity
    }

    /// Index of the extra quantity called `name`.
    #[must_use]
    pub fn extra_quantity_index(&self, name: &str) -> Option<usize> {
        self.extra_quantity_lookup.get(name).copied()
    }

    // -- Matching path lines --------------------------------------------

    /// Register a new matched pair of path lines. The split indices mark
    /// where the reverse-traced half meets the forward-traced half.
    pub fn add_matching_path_lines(
        &mut self,
        line1: Vec<Vec3>,
        split_index1: usize,
        line2: Vec<Vec3>,
        split_index2: usize,
        birth_time: f64,
    ) {
        self.is_morphable = true;
        self.matching_fieldlines.push(MatchingFieldlines {
            first: PathLine::new(line1, split_index1, birth_time),
            second: PathLine::new(line2, split_index2, birth_time),
        });
    }

    /// Append one key frame to each path line of pair `pair_index`.
    pub fn add_matching_key_frames(
        &mut self,
        key_frame1: Fieldline,
        key_frame2: Fieldline,
        pair_index: usize,
    ) -> Result<(), FieldlinesError> {
        let pair = self.pair_mut(pair_index)?;
        pair.first.key_frames.push(key_frame1);
        pair.second.key_frames.push(key_frame2);
        Ok(())
    }

    /// Finalize the lifetimes of pair `pair_index`.
    pub fn set_death_times(
        &mut self,
        death_time1: f64,
        death_time2: f64,
        pair_index: usize,
    ) -> Result<(), FieldlinesError> {
        let pair = self.pair_mut(pair_index)?;
        pair.first.death_time = death_time1;
        pair.second.death_time = death_time2;
        Ok(())
    }

    /// Append the first key frame of every path line as a render line, so
    /// pair `i` owns lines `2i` and `2i + 1`.
    pub fn initialize_rendered_matching_fieldlines(&mut self) -> Result<(), FieldlinesError> {
        let mut initial = Vec::with_capacity(self.matching_fieldlines.len() * 2);
        for pair in &self.matching_fieldlines {
            for path_line in [&pair.first, &pair.second] {
                let key_frame = path_line.key_frames.first().ok_or(
                    FieldlinesError::TooFewKeyFrames { found: 0 },
                )?;
                initial.push(key_frame.vertices.clone());
            }
        }
        for mut vertices in initial {
            self.add_line(&mut vertices);
        }
        Ok(())
    }

    /// All matched pairs.
    #[must_use]
    pub fn matching_fieldlines(&self) -> &[MatchingFieldlines] {
        &self.matching_fieldlines
    }

    fn pair_mut(&mut self, pair_index: usize) -> Result<&mut MatchingFieldlines, FieldlinesError> {
        let len = self.matching_fieldlines.len();
        self.matching_fieldlines
            .get_mut(pair_index)
            .ok_or(FieldlinesError::PairIndexOutOfRange {
                index: pair_index,
                len,
            })
    }

    // -- Unit conversions -----------------------------------------------

    /// Multiply every position by `scale`, including path lines and key
    /// frames.
    pub fn scale_positions(&mut self, scale: f32) {
        for p in &mut self.vertex_positions {
            *p *= scale;
        }
        for pair in &mut self.matching_fieldlines {
            for path_line in [&mut pair.first, &mut pair.second] {
                for p in &mut path_line.line {
                    *p *= scale;
                }
                for key_frame in &mut path_line.key_frames {
                    for p in &mut key_frame.vertices {
                        *p *= scale;
                    }
                }
            }
        }
    }

    /// Reinterpret every position as `(radius, latitude°, longitude°)` and
    /// overwrite it with Cartesian coordinates. `scale` multiplies the
    /// radius.
    pub fn convert_lat_lon_to_cartesian(&mut self, scale: f32) {
        for p in &mut self.vertex_positions {
            let r = p.x * scale;
            let lat = p.y.to_radians();
            let lon = p.z.to_radians();
            let r_cos_lat = r * lat.cos();
            *p = Vec3::new(r_cos_lat * lon.cos(), r_cos_lat * lon.sin(), r * lat.sin());
        }
    }

    // -- Invariants -----------------------------------------------------

    /// Check the structural invariants: parallel line arrays, contiguous
    /// line ranges covering every vertex, and index-aligned quantities.
    pub fn validate(&self) -> Result<(), FieldlinesError> {
        if self.line_start.len() != self.line_count.len() {
            return Err(FieldlinesError::InconsistentState(format!(
                "{} line starts but {} line counts",
                self.line_start.len(),
                self.line_count.len()
            )));
        }
        let mut expected_start = 0usize;
        for (i, (&start, &count)) in self.line_start.iter().zip(&self.line_count).enumerate() {
            if start as usize != expected_start {
                return Err(FieldlinesError::InconsistentState(format!(
                    "line {i} starts at {start}, expected {expected_start}"
                )));
            }
            expected_start += count as usize;
        }
        if expected_start != self.vertex_positions.len() {
            return Err(FieldlinesError::InconsistentState(format!(
                "lines cover {expected_start} vertices but {} are stored",
                self.vertex_positions.len()
            )));
        }
        if self.extra_quantities.len() != self.extra_quantity_names.len() {
            return Err(FieldlinesError::InconsistentState(format!(
                "{} extra quantities but {} names",
                self.extra_quantities.len(),
                self.extra_quantity_names.len()
            )));
        }
        for (name, quantity) in self.extra_quantity_names.iter().zip(&self.extra_quantities) {
            if quantity.len() != self.vertex_positions.len() {
                return Err(FieldlinesError::InconsistentState(format!(
                    "extra quantity '{name}' has {} values for {} vertices",
                    quantity.len(),
                    self.vertex_positions.len()
                )));
            }
        }
        Ok(())
    }

    // -- Files ----------------------------------------------------------

    /// Read a binary `.osfls` state file.
    pub fn load_osfls(path: &Path) -> Result<Self, FieldlinesError> {
        let file = std::fs::File::open(path)?;
        let state = read_osfls(&mut std::io::BufReader::new(file))?;
        log::info!(
            "Loaded {} lines ({} vertices) from {}",
            state.n_lines(),
            state.vertex_positions.len(),
            path.display()
        );
        Ok(state)
    }

    /// Write a binary state file into `dir`, named after the trigger time.
    /// Returns the path written.
    pub fn save_osfls(&self, dir: &Path) -> Result<PathBuf, FieldlinesError> {
        let file_name = format!(
            "{}.{OSFLS_EXTENSION}",
            crate::time::path_safe_iso(self.trigger_time)?
        );
        let path = dir.join(file_name);
        let file = std::fs::File::create(&path)?;
        let mut writer = std::io::BufWriter::new(file);
        write_osfls(self, &mut writer)?;
        std::io::Write::flush(&mut writer)?;
        log::info!("Saved fieldline state to: {}", path.display());
        Ok(path)
    }

    /// Read a JSON state file, multiplying positions by `coord_to_meters`.
    pub fn load_json(
        path: &Path,
        model: Model,
        coord_to_meters: f32,
    ) -> Result<Self, FieldlinesError> {
        let file = std::fs::File::open(path)?;
        let state = json::read_json(std::io::BufReader::new(file), model, coord_to_meters)?;
        log::info!("Loaded {} lines from {}", state.n_lines(), path.display());
        Ok(state)
    }

    /// Write `<path_without_extension>.json`. Returns the path written.
    pub fn save_json(&self, path_without_extension: &Path) -> Result<PathBuf, FieldlinesError> {
        let mut path = path_without_extension.as_os_str().to_owned();
        path.push(".json");
        let path = PathBuf::from(path);
        let file = std::fs::File::create(&path)?;
        let mut writer = std::io::BufWriter::new(file);
        json::write_json(self, &mut writer)?;
        std::io::Write::flush(&mut writer)?;
        log::info!("Saved fieldline state to: {}", path.display());
        Ok(path)
    }

    // -- Accessors ------------------------------------------------------

    /// Simulation time (J2000 seconds) this state belongs to.
    #[must_use]
    pub fn trigger_time(&self) -> f64 {
        self.trigger_time
    }

    /// Set the trigger time.
    pub fn set_trigger_time(&mut self, time: f64) {
        self.trigger_time = time;
    }

    /// Model the state was traced from.
    #[must_use]
    pub fn model(&self) -> Model {
        self.model
    }

    /// Set the model.
    pub fn set_model(&mut self, model: Model) {
        self.model = model;
    }

    /// Whether the state carries matched path lines.
    #[must_use]
    pub fn is_morphable(&self) -> bool {
        self.is_morphable
    }

    /// First vertex index of every line.
    #[must_use]
    pub fn line_start(&self) -> &[u32] {
        &self.line_start
    }

    /// Vertex count of every line.
    #[must_use]
    pub fn line_count(&self) -> &[u32] {
        &self.line_count
    }

    /// All vertex positions.
    #[must_use]
    pub fn vertex_positions(&self) -> &[Vec3] {
        &self.vertex_positions
    }

    /// All extra quantity arrays.
    #[must_use]
    pub fn extra_quantities(&self) -> &[Vec<f32>] {
        &self.extra_quantities
    }

    /// Names of the extra quantities.
    #[must_use]
    pub fn extra_quantity_names(&self) -> &[String] {
        &self.extra_quantity_names
    }

    /// Number of extra quantities.
    #[must_use]
    pub fn n_extra_quantities(&self) -> usize {
        self.extra_quantities.len()
    }
}
