//! Time-driven motion of matched field lines.
//!
//! - [`traverser`]: per-path-line key-frame cursor
//! - [`blend`]: synthesized key frames for topology transitions
//! - [`mover`]: the per-frame update over all pairs
//! - [`buffer`]: packing for GPU upload

pub mod blend;
pub mod buffer;
pub mod mover;
pub mod traverser;

pub use blend::{blend_key_frame, polyline_length};
pub use buffer::{RenderVertex, FLOW_LINE_COLOR};
pub use mover::{fade_alpha, lifetime_step, move_line, LineMover, DEFAULT_FADE_TIME};
pub use traverser::{partner_topology, PathLineTraverser, TraverserMode};
