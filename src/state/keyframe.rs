//! Key frames, path lines and matched path-line pairs.

use glam::Vec3;

/// Sentinel `time_to_next_key_frame` for the last key frame of a path line.
pub const NO_NEXT_KEY_FRAME: f32 = -1.0;

/// Simulation model a state was traced from.
///
/// Stored as an `i32` in binary state files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum Model {
    /// BATS-R-US global magnetosphere model.
    Batsrus = 0,
    /// ENLIL heliosphere model.
    Enlil = 1,
    /// Potential field source surface model.
    Pfss = 2,
    /// Unknown or unset model.
    #[default]
    Invalid = 3,
}

impl Model {
    /// Decode the on-disk integer tag.
    #[must_use]
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Batsrus),
            1 => Some(Self::Enlil),
            2 => Some(Self::Pfss),
            3 => Some(Self::Invalid),
            _ => None,
        }
    }

    /// The on-disk integer tag.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Map a model name reported by a data source. Unknown names map to
    /// [`Model::Invalid`].
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "batsrus" => Self::Batsrus,
            "enlil" => Self::Enlil,
            "pfss" => Self::Pfss,
            _ => Self::Invalid,
        }
    }

    /// Radius (in planetary radii) within which a line endpoint counts as
    /// attached to the planet.
    #[must_use]
    pub fn attachment_radius(self) -> f32 {
        match self {
            Self::Batsrus => 3.5,
            Self::Enlil | Self::Pfss | Self::Invalid => 1.0,
        }
    }
}

/// Magnetic connectivity of a traced field line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    /// Both ends attached to the planet.
    Closed,
    /// One end attached, one end in the solar wind.
    Open,
    /// Interplanetary magnetic field: neither end attached.
    Imf,
}

impl Topology {
    /// Classify a line by whether its endpoints lie within
    /// `attachment_radius` of the origin.
    #[must_use]
    pub fn classify(vertices: &[Vec3], attachment_radius: f32) -> Self {
        let attached = |p: &Vec3| p.length() <= attachment_radius;
        let first = vertices.first().is_some_and(attached);
        let last = vertices.last().is_some_and(attached);
        match (first, last) {
            (true, true) => Self::Closed,
            (true, false) | (false, true) => Self::Open,
            (false, false) => Self::Imf,
        }
    }

    /// Scalar written next to each rendered vertex for topology debugging.
    #[must_use]
    pub fn debug_color(self) -> f32 {
        match self {
            Self::Closed => 0.0,
            Self::Open => 1.0,
            Self::Imf => -0.5,
        }
    }
}

/// One time sample of a field line.
#[derive(Debug, Clone, PartialEq)]
pub struct Fieldline {
    /// Vertex positions of the line at this instant.
    pub vertices: Vec<Vec3>,
    /// Connectivity of the line at this instant.
    pub topology: Topology,
    /// Simulation seconds until the next key frame, or
    /// [`NO_NEXT_KEY_FRAME`] on the last one.
    pub time_to_next_key_frame: f32,
}

impl Fieldline {
    /// A key frame from its parts.
    #[must_use]
    pub fn new(vertices: Vec<Vec3>, topology: Topology, time_to_next_key_frame: f32) -> Self {
        Self {
            vertices,
            topology,
            time_to_next_key_frame,
        }
    }

    /// Whether another key frame follows this one.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.time_to_next_key_frame >= 0.0
    }
}

/// The time-ordered key frames of one physical field line.
#[derive(Debug, Clone, PartialEq)]
pub struct PathLine {
    /// Path-line vertices the key frames were seeded from.
    pub line: Vec<Vec3>,
    /// Key frames, one per path-line vertex.
    pub key_frames: Vec<Fieldline>,
    /// Simulation time the line appears.
    pub birth_time: f64,
    /// Simulation time the line disappears.
    pub death_time: f64,
    /// Index where the reverse-traced half meets the forward-traced half;
    /// the vertex where reconnection is expected.
    pub dayside_reconnection_start: usize,
}

impl PathLine {
    /// A path line with no key frames yet; death time starts at birth.
    #[must_use]
    pub fn new(line: Vec<Vec3>, dayside_reconnection_start: usize, birth_time: f64) -> Self {
        Self {
            key_frames: Vec::with_capacity(line.len()),
            line,
            birth_time,
            death_time: birth_time,
            dayside_reconnection_start,
        }
    }

    /// Sum of all key-frame durations, ignoring the end sentinel.
    #[must_use]
    pub fn travel_time(&self) -> f64 {
        self.key_frames
            .iter()
            .filter(|k| k.has_next())
            .map(|k| f64::from(k.time_to_next_key_frame))
            .sum()
    }

    /// Whether `time` lies within `[birth_time, death_time]`.
    #[must_use]
    pub fn is_alive_at(&self, time: f64) -> bool {
        time >= self.birth_time && time <= self.death_time
    }
}

/// Two path lines coupled through a reconnection event.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchingFieldlines {
    /// First path line of the pair.
    pub first: PathLine,
    /// Second path line of the pair.
    pub second: PathLine,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_by_endpoints() {
        let closed = [Vec3::new(1.0, 0.0, 1.0), Vec3::new(6.0, 0.0, 0.0), Vec3::new(1.0, 0.0, -1.0)];
        let open = [Vec3::new(1.0, 0.0, 1.0), Vec3::new(20.0, 0.0, 5.0)];
        let imf = [Vec3::new(15.0, 0.0, 10.0), Vec3::new(15.0, 0.0, -10.0)];
        assert_eq!(Topology::classify(&closed, 3.5), Topology::Closed);
        assert_eq!(Topology::classify(&open, 3.5), Topology::Open);
        assert_eq!(Topology::classify(&open.iter().rev().copied().collect::<Vec<_>>(), 3.5), Topology::Open);
        assert_eq!(Topology::classify(&imf, 3.5), Topology::Imf);
        assert_eq!(Topology::classify(&[], 3.5), Topology::Imf);
    }

    #[test]
    fn model_tags_round_trip() {
        for model in [Model::Batsrus, Model::Enlil, Model::Pfss, Model::Invalid] {
            assert_eq!(Model::from_i32(model.as_i32()), Some(model));
        }
        assert_eq!(Model::from_i32(17), None);
        assert_eq!(Model::from_name("BATSRUS"), Model::Batsrus);
        assert_eq!(Model::from_name("mas"), Model::Invalid);
    }

    #[test]
    fn travel_time_skips_sentinel() {
        let mut p = PathLine::new(vec![Vec3::ZERO; 3], 1, 10.0);
        p.key_frames.push(Fieldline::new(vec![], Topology::Imf, 2.0));
        p.key_frames.push(Fieldline::new(vec![], Topology::Imf, 3.0));
        p.key_frames.push(Fieldline::new(vec![], Topology::Closed, NO_NEXT_KEY_FRAME));
        assert_eq!(p.travel_time(), 5.0);
        assert!(p.is_alive_at(10.0));
        assert!(!p.is_alive_at(10.5));
    }
}
