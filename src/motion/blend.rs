//! Synthesized key frames for topology transitions.
//!
//! When one line of a matched pair changes topology, its on-screen geometry
//! is replaced by a blend of two half lines: the first half of one rendered
//! line followed by the second half of its partner. The blend is resampled
//! to a uniform vertex spacing so it can be interpolated against a regular
//! key frame.

use glam::Vec3;

/// Length of the polyline through `points`.
#[must_use]
pub fn polyline_length(points: &[Vec3]) -> f32 {
    points.windows(2).map(|w| w[0].distance(w[1])).sum()
}

/// Join `first` and `second` into one line of exactly `n_points` vertices.
///
/// The combined length counts the gap between the end of `first` and the
/// start of `second` as one more segment. Target spacing is
/// `total_length / n_points`; the first and last output vertices are pinned
/// to the first vertex of `first` and the last vertex of `second`, and every
/// interior vertex is placed by walking that spacing along the joined
/// polyline. Vertices the walk cannot reach repeat the last vertex.
#[must_use]
pub fn blend_key_frame(first: &[Vec3], second: &[Vec3], n_points: usize) -> Vec<Vec3> {
    let joined: Vec<Vec3> = first.iter().chain(second).copied().collect();
    let (Some(&start), Some(&end)) = (joined.first(), joined.last()) else {
        return Vec::new();
    };
    if n_points == 0 {
        return Vec::new();
    }
    if n_points == 1 {
        return vec![start];
    }

    let spacing = polyline_length(&joined) / n_points as f32;
    let mut blended = vec![end; n_points];
    blended[0] = start;
    if spacing <= 0.0 {
        return blended;
    }

    // Walk the joined polyline one target spacing at a time.
    let mut segment = 1usize;
    let mut walked_before_segment = 0.0f32;
    let mut target = 0.0f32;
    'vertices: for slot in blended.iter_mut().take(n_points - 1).skip(1) {
        target += spacing;
        loop {
            let Some(&to) = joined.get(segment) else {
                break 'vertices;
            };
            let from = joined[segment - 1];
            let length = from.distance(to);
            let along = target - walked_before_segment;
            if along <= length {
                let t = if length > 0.0 { along / length } else { 0.0 };
                *slot = from.lerp(to, t);
                break;
            }
            walked_before_segment += length;
            segment += 1;
        }
    }
    blended
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn straight(from: f32, to: f32, n: usize) -> Vec<Vec3> {
        (0..n)
            .map(|i| Vec3::new(from + (to - from) * i as f32 / (n - 1) as f32, 0.0, 0.0))
            .collect()
    }

    #[test]
    fn length_of_polyline() {
        assert_eq!(polyline_length(&[]), 0.0);
        assert_eq!(polyline_length(&[Vec3::ONE]), 0.0);
        let l = polyline_length(&[Vec3::ZERO, Vec3::X, Vec3::new(1.0, 2.0, 0.0)]);
        assert!((l - 3.0).abs() < EPSILON);
    }

    #[test]
    fn ends_are_pinned_and_count_is_exact() {
        let first = [Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.5, 1.5, 0.0), Vec3::new(1.0, 1.0, 0.0)];
        let second = [Vec3::new(2.0, -1.0, 0.0), Vec3::new(3.0, -3.0, 1.0)];
        for n in [2, 3, 7, 50] {
            let blended = blend_key_frame(&first, &second, n);
            assert_eq!(blended.len(), n);
            assert_eq!(blended[0], first[0]);
            assert_eq!(blended[n - 1], second[1]);
        }
    }

    #[test]
    fn spacing_spans_the_gap() {
        // Halves on one straight line with a unit gap: 0..2, gap, 3..5.
        let first = straight(0.0, 2.0, 3);
        let second = straight(3.0, 5.0, 3);
        let blended = blend_key_frame(&first, &second, 5);
        // Total length 5, spacing 1: interior points at 1, 2, 3.
        for (i, expected) in [0.0, 1.0, 2.0, 3.0, 5.0].iter().enumerate() {
            assert!(
                (blended[i].x - expected).abs() < EPSILON,
                "vertex {i}: {} != {expected}",
                blended[i].x
            );
        }
    }

    #[test]
    fn vertices_stay_on_the_joined_line() {
        let first = straight(0.0, 4.0, 10);
        let second = straight(4.5, 9.0, 10);
        let blended = blend_key_frame(&first, &second, 20);
        assert!(blended.windows(2).all(|w| w[1].x >= w[0].x - EPSILON));
        assert!(blended.iter().all(|p| p.y == 0.0 && p.z == 0.0));
    }

    #[test]
    fn degenerate_inputs() {
        assert!(blend_key_frame(&[], &[], 4).is_empty());
        assert_eq!(blend_key_frame(&[Vec3::ONE], &[Vec3::ONE], 3), vec![Vec3::ONE; 3]);
        assert_eq!(blend_key_frame(&[Vec3::X], &[], 1), vec![Vec3::X]);
    }
}
