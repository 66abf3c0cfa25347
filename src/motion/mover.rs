//! Per-frame motion of matched field lines.
//!
//! Render line `2i` follows the first path line of pair `i` and render line
//! `2i + 1` the second. Each frame every line's traverser is stepped by the
//! elapsed simulation time (clamped to the line's lifetime) and its
//! vertices are interpolated into the render buffer. When either line of a
//! pair reaches a topology change, its partner is pulled forward to the
//! matching topology and both lines morph from a blended key frame so the
//! reconnection happens at the same instant for both.

use glam::Vec3;

use super::blend::blend_key_frame;
use super::buffer::{RenderVertex, FLOW_LINE_COLOR};
use super::traverser::PathLineTraverser;
use crate::error::FieldlinesError;
use crate::state::{Fieldline, FieldlinesState, PathLine};

/// Default fade-in/fade-out window in seconds.
pub const DEFAULT_FADE_TIME: f64 = 5.0;

/// Renders the lines of a matched state at the current simulation time.
#[derive(Debug, Clone)]
pub struct LineMover {
    traversers: Vec<PathLineTraverser>,
    rendered: Vec<Vec3>,
    topology_colors: Vec<f32>,
    alpha: Vec<f32>,
    n_points_on_fieldlines: usize,
    fade_time: f64,
}

/// Visibility multiplier for a line alive in `[birth, death]` at `time`:
/// ramps up over `fade_time` after birth and down over `fade_time` before
/// death.
#[must_use]
pub fn fade_alpha(time: f64, birth: f64, death: f64, fade_time: f64) -> f32 {
    if fade_time <= 0.0 {
        return if time >= birth && time <= death { 1.0 } else { 0.0 };
    }
    let birth_alpha = ((time - birth) / fade_time).clamp(0.0, 1.0);
    let death_alpha = ((death - time) / fade_time).clamp(0.0, 1.0);
    (birth_alpha * death_alpha) as f32
}

/// Step to apply to a line at `current_time` for a frame step of `dt`, or
/// `None` if the line is not alive. A step that would carry the line past
/// its birth or death is shortened to land on it.
#[must_use]
pub fn lifetime_step(path_line: &PathLine, current_time: f64, dt: f64) -> Option<f64> {
    if !path_line.is_alive_at(current_time) {
        return None;
    }
    let new_time = current_time + dt;
    let mut step = dt;
    if new_time < path_line.birth_time {
        step += path_line.birth_time - new_time;
    }
    if new_time > path_line.death_time {
        step += path_line.death_time - new_time;
    }
    Some(step)
}

/// Step `traverser` by `dt` and write the interpolated line into
/// `positions` and `colors`.
pub fn move_line(
    traverser: &mut PathLineTraverser,
    key_frames: &[Fieldline],
    dt: f64,
    positions: &mut [Vec3],
    colors: &mut [f32],
) {
    traverser.step(key_frames, dt);
    write_line(traverser, key_frames, positions, colors);
}

fn write_line(
    traverser: &PathLineTraverser,
    key_frames: &[Fieldline],
    positions: &mut [Vec3],
    colors: &mut [f32],
) {
    let (Some(back), Some(front)) = (
        key_frames.get(traverser.back_index()),
        key_frames.get(traverser.front_index()),
    ) else {
        return;
    };
    let t = traverser.normalized_time();
    let origin = traverser.origin_vertices(key_frames);
    let color = back.topology.debug_color() * (1.0 - t) + front.topology.debug_color() * t;

    for (position, (from, to)) in positions.iter_mut().zip(origin.iter().zip(&front.vertices)) {
        *position = from.lerp(*to, t);
    }
    colors.fill(color);
}

impl LineMover {
    /// Build traversers for every pair of `state`, synchronize each pair at
    /// its reconnection point and render the starting positions.
    ///
    /// Every key frame and every render line must hold the same number of
    /// vertices. A morphable state without pairs, as decoded from
    /// `.osfls`, is rejected.
    pub fn new(state: &FieldlinesState, fade_time: f64) -> Result<Self, FieldlinesError> {
        let pairs = state.matching_fieldlines();
        if state.is_morphable() && pairs.is_empty() {
            return Err(FieldlinesError::InconsistentState(
                "morphable state carries no matched path lines".to_owned(),
            ));
        }
        let n_points_on_fieldlines = pairs
            .first()
            .and_then(|pair| pair.first.key_frames.first())
            .map_or(0, |k| k.vertices.len());

        let mut traversers = Vec::with_capacity(pairs.len() * 2);
        for (i, pair) in pairs.iter().enumerate() {
            for (offset, path_line) in [&pair.first, &pair.second].into_iter().enumerate() {
                let line = 2 * i + offset;
                if let Some(k) = path_line
                    .key_frames
                    .iter()
                    .find(|k| k.vertices.len() != n_points_on_fieldlines)
                {
                    return Err(FieldlinesError::InconsistentState(format!(
                        "pair {i} has a key frame with {} vertices, expected {n_points_on_fieldlines}",
                        k.vertices.len()
                    )));
                }
                let rendered_len = state.line_range(line).map(|r| r.len());
                if rendered_len != Some(n_points_on_fieldlines) {
                    return Err(FieldlinesError::InconsistentState(format!(
                        "render line {line} does not hold {n_points_on_fieldlines} vertices"
                    )));
                }
                traversers.push(PathLineTraverser::new(&path_line.key_frames)?);
            }

            let time1 = PathLineTraverser::time_to_reconnection_point(
                &pair.first.key_frames,
                pair.first.dayside_reconnection_start,
            );
            let time2 = PathLineTraverser::time_to_reconnection_point(
                &pair.second.key_frames,
                pair.second.dayside_reconnection_start,
            );
            // The line with the longer way to go starts closer to the event.
            if time1 > time2 {
                traversers[2 * i].set_start_point(
                    &pair.first.key_frames,
                    time2,
                    pair.first.dayside_reconnection_start,
                );
            } else {
                traversers[2 * i + 1].set_start_point(
                    &pair.second.key_frames,
                    time1,
                    pair.second.dayside_reconnection_start,
                );
            }
        }

        let n_vertices = state.vertex_positions().len();
        let mut mover = Self {
            traversers,
            rendered: state.vertex_positions().to_vec(),
            topology_colors: vec![FLOW_LINE_COLOR; n_vertices],
            alpha: vec![0.0; n_vertices],
            n_points_on_fieldlines,
            fade_time,
        };
        for (i, pair) in pairs.iter().enumerate() {
            for (offset, path_line) in [&pair.first, &pair.second].into_iter().enumerate() {
                let line = 2 * i + offset;
                if let Some(range) = state.line_range(line) {
                    write_line(
                        &mover.traversers[line],
                        &path_line.key_frames,
                        &mut mover.rendered[range.clone()],
                        &mut mover.topology_colors[range],
                    );
                }
            }
        }
        log::info!(
            "Moving {} matched pairs with {} vertices per line",
            pairs.len(),
            n_points_on_fieldlines
        );
        Ok(mover)
    }

    /// Advance every line from `previous_time` to `current_time` and
    /// refresh the alpha buffer.
    pub fn update(&mut self, state: &FieldlinesState, current_time: f64, previous_time: f64) {
        self.move_lines(state, current_time, previous_time);
        self.update_alpha(state, current_time);
    }

    /// Advance every line by `current_time - previous_time`. Steps too
    /// small to represent are ignored.
    pub fn move_lines(&mut self, state: &FieldlinesState, current_time: f64, previous_time: f64) {
        let dt = current_time - previous_time;
        if dt.abs() <= f64::EPSILON {
            return;
        }
        let forward = !dt.is_sign_negative();

        for (i, pair) in state.matching_fieldlines().iter().enumerate() {
            let (Some(range1), Some(range2)) =
                (state.line_range(2 * i), state.line_range(2 * i + 1))
            else {
                continue;
            };
            let Some([traverser1, traverser2]) = self.traversers.get_mut(2 * i..2 * i + 2) else {
                continue;
            };
            let key_frames1 = &pair.first.key_frames;
            let key_frames2 = &pair.second.key_frames;
            traverser1.set_forward(forward);
            traverser2.set_forward(forward);

            let new_topology1 = traverser1.is_new_topology(key_frames1);
            let new_topology2 = traverser2.is_new_topology(key_frames2);
            let in_transition = traverser1.is_in_transition() || traverser2.is_in_transition();

            if (new_topology1 || new_topology2) && !in_transition {
                if new_topology1 {
                    if let Some(desired) = traverser1.decide_topology(key_frames1) {
                        traverser2.skip_key_frame(key_frames2, desired);
                    }
                } else if let Some(desired) = traverser2.decide_topology(key_frames2) {
                    traverser1.skip_key_frame(key_frames1, desired);
                }

                if forward {
                    let half = self.n_points_on_fieldlines / 2;
                    let n = self.n_points_on_fieldlines;
                    let rendered = &self.rendered;
                    let blend = |own: usize, partner: usize| {
                        Some(blend_key_frame(
                            rendered.get(own..own + half)?,
                            rendered.get(partner + half..partner + n)?,
                            n,
                        ))
                    };
                    if let (Some(blended1), Some(blended2)) =
                        (blend(range1.start, range2.start), blend(range2.start, range1.start))
                    {
                        traverser1.begin_transition(blended1);
                        traverser2.begin_transition(blended2);
                        log::debug!("Pair {i} started a topology transition");
                    }
                }
            }

            if let Some(step) = lifetime_step(&pair.first, current_time, dt) {
                if let (Some(positions), Some(colors)) = (
                    self.rendered.get_mut(range1.clone()),
                    self.topology_colors.get_mut(range1),
                ) {
                    move_line(traverser1, key_frames1, step, positions, colors);
                }
            }
            if let Some(step) = lifetime_step(&pair.second, current_time, dt) {
                if let (Some(positions), Some(colors)) = (
                    self.rendered.get_mut(range2.clone()),
                    self.topology_colors.get_mut(range2),
                ) {
                    move_line(traverser2, key_frames2, step, positions, colors);
                }
            }
        }
    }

    /// Recompute per-vertex alpha from each line's lifetime at
    /// `current_time`.
    pub fn update_alpha(&mut self, state: &FieldlinesState, current_time: f64) {
        for (i, pair) in state.matching_fieldlines().iter().enumerate() {
            for (offset, path_line) in [&pair.first, &pair.second].into_iter().enumerate() {
                let Some(range) = state.line_range(2 * i + offset) else {
                    continue;
                };
                let alpha = fade_alpha(
                    current_time,
                    path_line.birth_time,
                    path_line.death_time,
                    self.fade_time,
                );
                if let Some(slots) = self.alpha.get_mut(range) {
                    slots.fill(alpha);
                }
            }
        }
    }

    // ── Render buffers ──────────────────────────────────────────────

    /// Rendered field-line vertices, followed by every path line when
    /// `render_flow_line` is set.
    #[must_use]
    pub fn render_vertices(
        &self,
        state: &FieldlinesState,
        render_flow_line: bool,
    ) -> Vec<RenderVertex> {
        let mut vertices: Vec<RenderVertex> = self
            .rendered
            .iter()
            .zip(&self.topology_colors)
            .map(|(&p, &c)| RenderVertex::new(p, c))
            .collect();
        if render_flow_line {
            for pair in state.matching_fieldlines() {
                for path_line in [&pair.first, &pair.second] {
                    vertices.extend(
                        path_line
                            .line
                            .iter()
                            .map(|&p| RenderVertex::new(p, FLOW_LINE_COLOR)),
                    );
                }
            }
        }
        vertices
    }

    /// Per-vertex alpha matching [`Self::render_vertices`]; flow lines are
    /// fully opaque.
    #[must_use]
    pub fn alpha_buffer(&self, state: &FieldlinesState, render_flow_line: bool) -> Vec<f32> {
        let mut alpha = self.alpha.clone();
        if render_flow_line {
            let n_flow: usize = state
                .matching_fieldlines()
                .iter()
                .map(|pair| pair.first.line.len() + pair.second.line.len())
                .sum();
            alpha.resize(alpha.len() + n_flow, 1.0);
        }
        alpha
    }

    /// `(first vertex, vertex count)` per drawn line, matching
    /// [`Self::render_vertices`].
    #[must_use]
    pub fn draw_ranges(
        &self,
        state: &FieldlinesState,
        render_flow_line: bool,
    ) -> (Vec<u32>, Vec<u32>) {
        let mut starts = state.line_start().to_vec();
        let mut counts = state.line_count().to_vec();
        if render_flow_line {
            let mut next = self.rendered.len() as u32;
            for pair in state.matching_fieldlines() {
                for path_line in [&pair.first, &pair.second] {
                    let count = path_line.line.len() as u32;
                    starts.push(next);
                    counts.push(count);
                    next += count;
                }
            }
        }
        (starts, counts)
    }

    // ── Accessors ───────────────────────────────────────────────────

    /// Current vertex positions of every render line.
    #[must_use]
    pub fn rendered_lines(&self) -> &[Vec3] {
        &self.rendered
    }

    /// Current topology color of every rendered vertex.
    #[must_use]
    pub fn topology_colors(&self) -> &[f32] {
        &self.topology_colors
    }

    /// Current alpha of every rendered vertex.
    #[must_use]
    pub fn alpha(&self) -> &[f32] {
        &self.alpha
    }

    /// Traversers, two per pair.
    #[must_use]
    pub fn traversers(&self) -> &[PathLineTraverser] {
        &self.traversers
    }

    /// Vertices per key frame and render line.
    #[must_use]
    pub fn n_points_on_fieldlines(&self) -> usize {
        self.n_points_on_fieldlines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Topology, NO_NEXT_KEY_FRAME};

    const EPSILON: f32 = 1e-5;

    /// Key frame `j` of a line is `n` vertices along y at x = `x0 + j`.
    fn frames(x0: f32, topologies: &[Topology], dt: f32, n: usize) -> Vec<Fieldline> {
        let last = topologies.len() - 1;
        topologies
            .iter()
            .enumerate()
            .map(|(j, &topology)| {
                let vertices = (0..n).map(|v| Vec3::new(x0 + j as f32, v as f32, 0.0)).collect();
                Fieldline::new(vertices, topology, if j == last { NO_NEXT_KEY_FRAME } else { dt })
            })
            .collect()
    }

    /// One pair alive in `[birth, death]` with the given key frames and
    /// reconnection at the middle key frame.
    fn state_with(
        first: Vec<Fieldline>,
        second: Vec<Fieldline>,
        birth: f64,
        death: f64,
    ) -> FieldlinesState {
        let mut state = FieldlinesState::new();
        let reconnection = first.len() / 2;
        state.add_matching_path_lines(
            first.iter().map(|k| k.vertices[0]).collect(),
            reconnection,
            second.iter().map(|k| k.vertices[0]).collect(),
            reconnection,
            birth,
        );
        for (k1, k2) in first.into_iter().zip(second) {
            state.add_matching_key_frames(k1, k2, 0).unwrap();
        }
        state.set_death_times(death, death, 0).unwrap();
        state.initialize_rendered_matching_fieldlines().unwrap();
        state
    }

    fn imf_pair(n_frames: usize) -> FieldlinesState {
        let topologies = vec![Topology::Imf; n_frames];
        state_with(
            frames(0.0, &topologies, 2.0, 4),
            frames(100.0, &topologies, 2.0, 4),
            0.0,
            1000.0,
        )
    }

    // =========================================================================
    // Lifetime
    // =========================================================================

    #[test]
    fn alpha_fades_in_and_out() {
        assert_eq!(fade_alpha(0.0, 0.0, 100.0, 5.0), 0.0);
        assert!((fade_alpha(2.5, 0.0, 100.0, 5.0) - 0.5).abs() < EPSILON);
        assert_eq!(fade_alpha(5.0, 0.0, 100.0, 5.0), 1.0);
        assert_eq!(fade_alpha(95.0, 0.0, 100.0, 5.0), 1.0);
        assert_eq!(fade_alpha(100.0, 0.0, 100.0, 5.0), 0.0);
        assert_eq!(fade_alpha(-3.0, 0.0, 100.0, 5.0), 0.0);
        assert_eq!(fade_alpha(50.0, 0.0, 100.0, 0.0), 1.0);
    }

    #[test]
    fn lifetime_step_clamps_to_bounds() {
        let mut p = PathLine::new(vec![], 0, 10.0);
        p.death_time = 20.0;
        assert_eq!(lifetime_step(&p, 5.0, 1.0), None);
        assert_eq!(lifetime_step(&p, 21.0, -1.0), None);
        assert_eq!(lifetime_step(&p, 12.0, 1.0), Some(1.0));
        // 19 + 2 would overshoot death by 1.
        assert_eq!(lifetime_step(&p, 19.0, 2.0), Some(1.0));
        // 11 - 2 would undershoot birth by 1.
        assert_eq!(lifetime_step(&p, 11.0, -2.0), Some(-1.0));
    }

    #[test]
    fn update_writes_alpha_per_line() {
        let state = imf_pair(4);
        let mut mover = LineMover::new(&state, DEFAULT_FADE_TIME).unwrap();
        assert!(mover.alpha().iter().all(|&a| a == 0.0));
        mover.update(&state, 2.5, 2.0);
        assert!(mover.alpha().iter().all(|&a| (a - 0.5).abs() < EPSILON));
    }

    // =========================================================================
    // Interpolation
    // =========================================================================

    #[test]
    fn midpoint_of_interval_is_mean_of_key_frames() {
        let kf = frames(0.0, &[Topology::Closed, Topology::Closed, Topology::Closed], 4.0, 3);
        let mut t = PathLineTraverser::new(&kf).unwrap();
        let mut positions = vec![Vec3::ZERO; 3];
        let mut colors = vec![0.0; 3];
        move_line(&mut t, &kf, 2.0, &mut positions, &mut colors);
        for (v, p) in positions.iter().enumerate() {
            let mean = (kf[0].vertices[v] + kf[1].vertices[v]) * 0.5;
            assert!((*p - mean).length() < EPSILON);
        }
        assert!(colors.iter().all(|&c| c == Topology::Closed.debug_color()));
    }

    #[test]
    fn topology_color_is_interpolated() {
        let kf = frames(0.0, &[Topology::Closed, Topology::Open], 2.0, 2);
        let mut t = PathLineTraverser::new(&kf).unwrap();
        let mut positions = vec![Vec3::ZERO; 2];
        let mut colors = vec![0.0; 2];
        move_line(&mut t, &kf, 0.5, &mut positions, &mut colors);
        assert!((colors[0] - 0.25).abs() < EPSILON);
    }

    #[test]
    fn lines_move_with_time_and_back() {
        let state = imf_pair(5);
        let mut mover = LineMover::new(&state, DEFAULT_FADE_TIME).unwrap();
        let start = mover.rendered_lines().to_vec();

        mover.move_lines(&state, 11.0, 10.0);
        let line0 = state.line_range(0).unwrap();
        let moved = mover.rendered_lines()[line0.start];
        assert!((moved.x - (start[line0.start].x + 0.5)).abs() < EPSILON);

        mover.move_lines(&state, 10.0, 11.0);
        assert!((mover.rendered_lines()[line0.start] - start[line0.start]).length() < EPSILON);
    }

    #[test]
    fn tiny_steps_are_ignored() {
        let state = imf_pair(3);
        let mut mover = LineMover::new(&state, DEFAULT_FADE_TIME).unwrap();
        let before = mover.rendered_lines().to_vec();
        mover.move_lines(&state, 5.0, 5.0);
        assert_eq!(mover.rendered_lines(), before.as_slice());
    }

    #[test]
    fn dead_lines_do_not_move() {
        let topologies = [Topology::Imf; 3];
        let state = state_with(
            frames(0.0, &topologies, 1.0, 2),
            frames(5.0, &topologies, 1.0, 2),
            100.0,
            200.0,
        );
        let mut mover = LineMover::new(&state, DEFAULT_FADE_TIME).unwrap();
        let before = mover.rendered_lines().to_vec();
        mover.move_lines(&state, 51.0, 50.0);
        assert_eq!(mover.rendered_lines(), before.as_slice());
    }

    // =========================================================================
    // Synchronization and transitions
    // =========================================================================

    #[test]
    fn longer_path_starts_closer_to_reconnection() {
        // First line needs 4 * 2 s to reach its reconnection frame, the
        // second 4 * 1 s, so the first starts 4 s ahead.
        let topologies = vec![Topology::Imf; 9];
        let state = state_with(
            frames(0.0, &topologies, 2.0, 4),
            frames(50.0, &topologies, 1.0, 4),
            0.0,
            1000.0,
        );
        let mover = LineMover::new(&state, DEFAULT_FADE_TIME).unwrap();
        let first = &mover.traversers()[0];
        assert_eq!((first.back_index(), first.front_index()), (2, 3));
        assert!(first.time_since_interpolation().abs() < 1e-9);
        assert_eq!(mover.traversers()[1].back_index(), 0);
        // The first render line shows key frame 2.
        assert!((mover.rendered_lines()[0].x - 2.0).abs() < EPSILON);
    }

    #[test]
    fn topology_change_blends_and_pulls_partner_forward() {
        let first = frames(
            0.0,
            &[Topology::Imf, Topology::Closed, Topology::Closed, Topology::Closed],
            2.0,
            4,
        );
        let second = frames(
            10.0,
            &[Topology::Closed, Topology::Closed, Topology::Imf, Topology::Imf],
            2.0,
            4,
        );
        // Equal travel times to reconnection: both lines start at frame 0.
        let state = state_with(first, second, 0.0, 1000.0);

        let mut mover = LineMover::new(&state, DEFAULT_FADE_TIME).unwrap();
        mover.move_lines(&state, 1.0, 0.5);

        let [t1, t2] = mover.traversers() else {
            panic!("expected two traversers");
        };
        assert!(t1.is_in_transition());
        assert!(t2.is_in_transition());
        // Imf -> Closed on the first line asks the second for Imf at frame 2.
        assert_eq!(t2.front_index(), 2);
        assert!((t2.time_interpolation_denominator() - 4.0).abs() < 1e-9);
        assert!((t1.time_interpolation_denominator() - 2.0).abs() < 1e-9);
        assert!((t1.time_since_interpolation() - 0.5).abs() < 1e-9);

        // Blended frame of line 1: first half of line 1 then second half of
        // line 2, both as rendered at x = 0 and x = 10.
        if let crate::motion::TraverserMode::InTransition { blended } = t1.mode() {
            assert_eq!(blended.len(), 4);
            assert_eq!(blended[0], Vec3::new(0.0, 0.0, 0.0));
            assert_eq!(blended[3], Vec3::new(10.0, 3.0, 0.0));
        } else {
            panic!("first traverser is not in transition");
        }
    }

    #[test]
    fn reverse_motion_does_not_start_transitions() {
        let first = frames(0.0, &[Topology::Imf, Topology::Closed, Topology::Closed], 2.0, 4);
        let second = frames(10.0, &[Topology::Closed, Topology::Imf, Topology::Imf], 2.0, 4);
        let state = state_with(first, second, 0.0, 1000.0);
        let mut mover = LineMover::new(&state, DEFAULT_FADE_TIME).unwrap();
        mover.move_lines(&state, 0.5, 1.0);
        assert!(mover.traversers().iter().all(|t| !t.is_in_transition()));
    }

    // =========================================================================
    // Render buffers
    // =========================================================================

    #[test]
    fn flow_lines_are_appended_to_buffers() {
        let state = imf_pair(3);
        let mut mover = LineMover::new(&state, DEFAULT_FADE_TIME).unwrap();
        mover.update(&state, 10.0, 9.0);

        let plain = mover.render_vertices(&state, false);
        assert_eq!(plain.len(), 8);
        let with_flow = mover.render_vertices(&state, true);
        assert_eq!(with_flow.len(), 8 + 6);
        assert_eq!(with_flow[8].topology_color, FLOW_LINE_COLOR);

        let alpha = mover.alpha_buffer(&state, true);
        assert_eq!(alpha.len(), 14);
        assert!(alpha[8..].iter().all(|&a| a == 1.0));

        let (starts, counts) = mover.draw_ranges(&state, true);
        assert_eq!(starts, vec![0, 4, 8, 11]);
        assert_eq!(counts, vec![4, 4, 3, 3]);
    }

    #[test]
    fn morphable_state_without_pairs_is_rejected() {
        let state = imf_pair(3);
        let mut buf = Vec::new();
        crate::state::write_osfls(&state, &mut buf).unwrap();
        let decoded = crate::state::read_osfls(&mut buf.as_slice()).unwrap();
        assert!(decoded.is_morphable());
        assert!(decoded.matching_fieldlines().is_empty());
        assert!(matches!(
            LineMover::new(&decoded, DEFAULT_FADE_TIME),
            Err(FieldlinesError::InconsistentState(_))
        ));
        assert!(LineMover::new(&FieldlinesState::new(), DEFAULT_FADE_TIME).is_ok());
    }

    #[test]
    fn foreign_state_with_longer_lines_is_skipped() {
        let state = imf_pair(3);
        let mut mover = LineMover::new(&state, DEFAULT_FADE_TIME).unwrap();
        let topologies = [Topology::Imf; 3];
        let longer = state_with(
            frames(0.0, &topologies, 2.0, 6),
            frames(100.0, &topologies, 2.0, 6),
            0.0,
            1000.0,
        );
        let tail = mover.rendered_lines()[6..].to_vec();
        mover.update(&longer, 1.0, 0.0);
        assert_eq!(mover.rendered_lines().len(), 8);
        // Line 0 (0..6) fits, line 1 (6..12) does not and is left alone.
        assert!((mover.rendered_lines()[0].x - 0.5).abs() < EPSILON);
        assert_eq!(&mover.rendered_lines()[6..], tail.as_slice());
    }

    #[test]
    fn mismatched_vertex_counts_are_rejected() {
        let topologies = [Topology::Imf; 2];
        let mut second = frames(5.0, &topologies, 1.0, 4);
        let _ = second[1].vertices.pop();
        let state = state_with(frames(0.0, &topologies, 1.0, 4), second, 0.0, 10.0);
        assert!(matches!(
            LineMover::new(&state, DEFAULT_FADE_TIME),
            Err(FieldlinesError::InconsistentState(_))
        ));
    }
}
