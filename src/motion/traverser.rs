//! Cursor over one path line's key frames.
//!
//! A traverser brackets the current instant between a back and a front key
//! frame (`front == back + 1` except while a partner's topology change is
//! being caught up with) and tracks how far the line has travelled into the
//! bracketed interval. Key frames are borrowed per call; the traverser
//! stores indices only.
//!
//! At either end of the sequence the traverser parks: it stays on the last
//! (or first) interval with its normalized time pinned to 1 (or 0), so the
//! line stops moving instead of running past its data.

use glam::Vec3;

use crate::error::FieldlinesError;
use crate::state::{Fieldline, Topology};

/// Whether a traverser is interpolating between its key frames or from a
/// synthesized frame during a topology transition.
#[derive(Debug, Clone, PartialEq)]
pub enum TraverserMode {
    /// Interpolating between the back and front key frames.
    Normal,
    /// Interpolating from `blended`, which stands in for the back key
    /// frame until the front key frame is passed.
    InTransition {
        /// Vertices of the synthesized key frame.
        blended: Vec<Vec3>,
    },
}

/// Per-path-line cursor state.
#[derive(Debug, Clone, PartialEq)]
pub struct PathLineTraverser {
    back: usize,
    front: usize,
    forward: bool,
    time_since_interpolation: f64,
    time_interpolation_denominator: f64,
    mode: TraverserMode,
}

impl PathLineTraverser {
    /// A traverser at the first interval of `key_frames`.
    pub fn new(key_frames: &[Fieldline]) -> Result<Self, FieldlinesError> {
        if key_frames.len() < 2 {
            return Err(FieldlinesError::TooFewKeyFrames {
                found: key_frames.len(),
            });
        }
        Ok(Self {
            back: 0,
            front: 1,
            forward: true,
            time_since_interpolation: 0.0,
            time_interpolation_denominator: f64::from(key_frames[0].time_to_next_key_frame),
            mode: TraverserMode::Normal,
        })
    }

    // ── Accessors ───────────────────────────────────────────────────

    /// Index of the back key frame.
    #[must_use]
    pub fn back_index(&self) -> usize {
        self.back
    }

    /// Index of the front key frame.
    #[must_use]
    pub fn front_index(&self) -> usize {
        self.front
    }

    /// Whether simulation time last moved forward.
    #[must_use]
    pub fn is_forward(&self) -> bool {
        self.forward
    }

    /// Set the travel direction.
    pub fn set_forward(&mut self, forward: bool) {
        self.forward = forward;
    }

    /// Seconds elapsed since the back key frame.
    #[must_use]
    pub fn time_since_interpolation(&self) -> f64 {
        self.time_since_interpolation
    }

    /// Length in seconds of the current interpolation interval.
    #[must_use]
    pub fn time_interpolation_denominator(&self) -> f64 {
        self.time_interpolation_denominator
    }

    /// Current mode.
    #[must_use]
    pub fn mode(&self) -> &TraverserMode {
        &self.mode
    }

    /// Whether a topology transition is in progress.
    #[must_use]
    pub fn is_in_transition(&self) -> bool {
        matches!(self.mode, TraverserMode::InTransition { .. })
    }

    /// Position within the current interval in `[0, 1]`. A non-positive
    /// interval counts as complete.
    #[must_use]
    pub fn normalized_time(&self) -> f32 {
        if self.time_interpolation_denominator <= 0.0 {
            return 1.0;
        }
        (self.time_since_interpolation / self.time_interpolation_denominator).clamp(0.0, 1.0)
            as f32
    }

    /// Vertices the interpolation starts from: the blended frame during a
    /// transition, otherwise the back key frame.
    #[must_use]
    pub fn origin_vertices<'a>(&'a self, key_frames: &'a [Fieldline]) -> &'a [Vec3] {
        match &self.mode {
            TraverserMode::InTransition { blended } => blended,
            TraverserMode::Normal => key_frames
                .get(self.back)
                .map_or(&[][..], |k| k.vertices.as_slice()),
        }
    }

    // ── Topology ────────────────────────────────────────────────────

    /// Whether the bracketing key frames differ in topology.
    #[must_use]
    pub fn is_new_topology(&self, key_frames: &[Fieldline]) -> bool {
        match (key_frames.get(self.back), key_frames.get(self.front)) {
            (Some(back), Some(front)) => back.topology != front.topology,
            _ => false,
        }
    }

    /// Topology of the key frame the traverser is heading towards.
    #[must_use]
    pub fn leading_topology(&self, key_frames: &[Fieldline]) -> Option<Topology> {
        let leading = if self.forward { self.front } else { self.back };
        key_frames.get(leading).map(|k| k.topology)
    }

    /// Topology the partner line must be moved towards when this line
    /// reaches its leading key frame. Reconnection pairs `Imf` with
    /// `Closed`; `Open` stays `Open`.
    #[must_use]
    pub fn decide_topology(&self, key_frames: &[Fieldline]) -> Option<Topology> {
        self.leading_topology(key_frames).map(partner_topology)
    }

    // ── Cursor movement ─────────────────────────────────────────────

    /// Move the bracketing pair one key frame in the current direction.
    /// Returns `false` and parks the traverser if there is no key frame to
    /// move to.
    pub fn advance_key_frames(&mut self, key_frames: &[Fieldline]) -> bool {
        if self.forward {
            if self.front + 1 >= key_frames.len() {
                self.park(key_frames.len());
                return false;
            }
            self.time_since_interpolation -= self.time_interpolation_denominator;
            self.time_interpolation_denominator =
                f64::from(key_frames[self.front].time_to_next_key_frame);
            self.back = self.front;
            self.front += 1;
        } else {
            if self.back == 0 {
                self.park(key_frames.len());
                return false;
            }
            self.front = self.back;
            self.back -= 1;
            self.time_interpolation_denominator =
                f64::from(key_frames[self.back].time_to_next_key_frame);
            self.time_since_interpolation += self.time_interpolation_denominator;
        }
        true
    }

    fn park(&mut self, n_key_frames: usize) {
        if self.forward {
            self.time_since_interpolation = self.time_interpolation_denominator;
            log::debug!("Traverser parked at key frame {} of {n_key_frames}", self.front);
        } else {
            self.time_since_interpolation = 0.0;
            log::debug!("Traverser parked at key frame {} of {n_key_frames}", self.back);
        }
    }

    /// Move the leading cursor until its key frame has `desired` topology,
    /// adding every skipped interval to the interpolation denominator.
    /// Stops at the last (or first) key frame.
    pub fn skip_key_frame(&mut self, key_frames: &[Fieldline], desired: Topology) {
        if self.forward {
            while key_frames.get(self.front).is_some_and(|k| k.topology != desired) {
                if self.front + 1 >= key_frames.len() {
                    break;
                }
                self.front += 1;
                self.time_interpolation_denominator +=
                    f64::from(key_frames[self.front - 1].time_to_next_key_frame);
            }
        } else {
            while key_frames.get(self.back).is_some_and(|k| k.topology != desired) {
                if self.back == 0 {
                    break;
                }
                self.back -= 1;
                self.time_interpolation_denominator +=
                    f64::from(key_frames[self.back].time_to_next_key_frame);
            }
        }
    }

    /// Advance the clock by `dt` seconds, crossing as many key frames as the
    /// step covers. Crossing a key frame ends a transition.
    pub fn step(&mut self, key_frames: &[Fieldline], dt: f64) {
        self.forward = !dt.is_sign_negative();
        self.time_since_interpolation += dt;
        while self.is_past_interval() {
            self.mode = TraverserMode::Normal;
            if !self.advance_key_frames(key_frames) {
                break;
            }
        }
    }

    fn is_past_interval(&self) -> bool {
        if self.forward {
            self.time_since_interpolation > self.time_interpolation_denominator
        } else {
            self.time_since_interpolation < 0.0
        }
    }

    /// Start a topology transition from `blended`. The remaining interval
    /// is what is left of the current one, counted from now.
    pub fn begin_transition(&mut self, blended: Vec<Vec3>) {
        self.time_interpolation_denominator -= self.time_since_interpolation;
        self.time_since_interpolation = 0.0;
        self.mode = TraverserMode::InTransition { blended };
    }

    // ── Synchronization ─────────────────────────────────────────────

    /// Seconds from the first key frame to key frame `index`. Indices past
    /// the last key frame are clamped to it.
    #[must_use]
    pub fn time_to_reconnection_point(key_frames: &[Fieldline], index: usize) -> f64 {
        let end = index.min(key_frames.len().saturating_sub(1));
        key_frames[..end]
            .iter()
            .map(|k| f64::from(k.time_to_next_key_frame))
            .sum()
    }

    /// Seconds from the back key frame to the last key frame.
    #[must_use]
    pub fn time_to_end_key_frame(&self, key_frames: &[Fieldline]) -> f64 {
        let end = key_frames.len().saturating_sub(1);
        key_frames
            .get(self.back..end)
            .unwrap_or_default()
            .iter()
            .map(|k| f64::from(k.time_to_next_key_frame))
            .sum()
    }

    /// Place the traverser so that it reaches key frame `reconnection_index`
    /// after `other_time_to_reconnection` seconds, the time the partner
    /// line needs to reach its own reconnection point. Leaves the traverser
    /// unchanged if the whole path before the reconnection point is
    /// shorter than that.
    pub fn set_start_point(
        &mut self,
        key_frames: &[Fieldline],
        other_time_to_reconnection: f64,
        reconnection_index: usize,
    ) {
        let reconnection_index = reconnection_index.min(key_frames.len().saturating_sub(1));
        let mut time_since_reconnection = 0.0;
        for index in (0..reconnection_index).rev() {
            let duration = f64::from(key_frames[index].time_to_next_key_frame);
            time_since_reconnection += duration;
            if time_since_reconnection >= other_time_to_reconnection {
                self.back = index;
                self.front = index + 1;
                self.time_interpolation_denominator = duration;
                self.time_since_interpolation =
                    time_since_reconnection - other_time_to_reconnection;
                self.mode = TraverserMode::Normal;
                return;
            }
        }
    }
}

/// Topology a partner line must take when this line changes to `topology`.
#[must_use]
pub fn partner_topology(topology: Topology) -> Topology {
    match topology {
        Topology::Imf => Topology::Closed,
        Topology::Closed => Topology::Imf,
        Topology::Open => Topology::Open,
    }
}
