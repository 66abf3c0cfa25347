//! Upload-ready render vertex packing.

use glam::Vec3;

/// Topology color written for path-line (flow line) vertices.
pub const FLOW_LINE_COLOR: f32 = -1.0;

/// 16-byte render vertex: position plus the topology debug color.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RenderVertex {
    /// Position in meters.
    pub position: [f32; 3],
    /// Interpolated topology color (see [`crate::state::Topology::debug_color`]).
    pub topology_color: f32,
}

impl RenderVertex {
    /// Vertex at `position` with `topology_color`.
    #[must_use]
    pub fn new(position: Vec3, topology_color: f32) -> Self {
        Self {
            position: position.to_array(),
            topology_color,
        }
    }
}

/// Reinterpret render vertices as bytes for a GPU upload.
#[must_use]
pub fn vertex_bytes(vertices: &[RenderVertex]) -> &[u8] {
    bytemuck::cast_slice(vertices)
}

/// Reinterpret per-vertex alpha values as bytes for a GPU upload.
#[must_use]
pub fn alpha_bytes(alpha: &[f32]) -> &[u8] {
    bytemuck::cast_slice(alpha)
}
