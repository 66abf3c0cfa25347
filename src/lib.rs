// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Function signature hygiene
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]

//! Moving and matching magnetic field lines.
//!
//! A sequence of traced field lines (key frames) is stored in a
//! [`FieldlinesState`] together with the path lines that carry them through
//! time. Matched pairs of field lines exchange segments when they reach a
//! reconnection point; the [`LineMover`] advances every pair in lockstep
//! with simulation time and blends the two lines across the exchange.
//!
//! # Key entry points
//!
//! - [`FieldlinesState`] - key frames, path lines and the `.osfls`/JSON codecs
//! - [`PathLineTraverser`] - cursor over one path line's key frames
//! - [`LineMover`] - per-frame motion, lifetime clamping and alpha fade
//! - [`MovingFieldlines`] - background ingestion plus the update loop
//! - [`Options`] - tracing and motion configuration (TOML)
//!
//! # Architecture
//!
//! Source files are traced on a background [`StateLoader`] thread that
//! publishes the finished state through a lock-free triple buffer. The
//! update loop only ever sees a complete state; it moves the rendered
//! lines and exposes vertex, alpha and draw-range buffers for upload.

pub mod error;
pub mod loader;
pub mod motion;
pub mod moving;
pub mod options;
pub mod seed;
pub mod state;
pub mod time;
pub mod trace;

pub use error::FieldlinesError;
pub use loader::{load_state_file, CancelToken, LoadStatus, StateLoader};
pub use motion::{LineMover, PathLineTraverser, RenderVertex, TraverserMode};
pub use moving::MovingFieldlines;
pub use options::{MotionOptions, Options, TracingOptions};
pub use seed::SeedPoints;
pub use state::{
    FieldlinesState, Fieldline, MatchingFieldlines, Model, PathLine, Topology,
};
pub use trace::{FieldTracer, TraceDirection};
