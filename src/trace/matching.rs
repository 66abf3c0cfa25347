//! Ingestion of matched path-line pairs.
//!
//! Every group of four seed points yields one [`MatchingFieldlines`] pair.
//! Each path line is the flow line of the tracing variable through the
//! reconnection region: the reverse trace of one seed joined to the forward
//! trace of another. Every path-line vertex then seeds one magnetic field
//! line, which becomes a key frame.
//!
//! [`MatchingFieldlines`]: crate::state::MatchingFieldlines

use std::path::{Path, PathBuf};

use glam::Vec3;

use super::{resample, FieldTracer, TraceDirection};
use crate::error::FieldlinesError;
use crate::loader::CancelToken;
use crate::options::TracingOptions;
use crate::seed::{read_seed_point_file, SeedPoints, SEEDS_PER_PAIR};
use crate::state::{
    Fieldline, FieldlinesState, Model, Topology, NO_NEXT_KEY_FRAME, RE_TO_METER,
};

/// Earth radius in kilometers; flow speeds are given in km/s.
pub const RE_TO_KM: f32 = 6371.0;

/// Tracing variable that matched ingestion requires.
pub const MATCHING_TRACING_VARIABLE: &str = "u_perp_b";

const MAGNETIC_FIELD_VARIABLE: &str = "b";
const FLOW_VELOCITY_VARIABLE: &str = "u";
const BATSRUS_INNER_BOUNDARY: f32 = 0.5;

/// Parameters of one matched ingestion run.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchingTraceConfig {
    /// Variable traced to build path lines.
    pub tracing_variable: String,
    /// Vertices per path-line half.
    pub n_points_on_path_line: usize,
    /// Vertices per key frame.
    pub n_points_on_fieldlines: usize,
    /// Seconds added to the source start time to form the trigger time.
    pub manual_time_offset: f64,
}

impl Default for MatchingTraceConfig {
    fn default() -> Self {
        Self::from(&TracingOptions::default())
    }
}

impl From<&TracingOptions> for MatchingTraceConfig {
    fn from(options: &TracingOptions) -> Self {
        Self {
            tracing_variable: options.tracing_variable.clone(),
            n_points_on_path_line: options.number_of_points_on_path_line,
            n_points_on_fieldlines: options.number_of_points_on_fieldlines,
            manual_time_offset: options.manual_time_offset,
        }
    }
}

/// Trace one half of a path line. Reverse halves are flipped so both halves
/// run in the forward flow direction.
fn trace_path_half(
    tracer: &mut dyn FieldTracer,
    variable: &str,
    seed: Vec3,
    direction: TraceDirection,
    n_points: usize,
) -> Result<Vec<Vec3>, FieldlinesError> {
    let mut half = tracer.trace(seed, variable, direction)?;
    if half.is_empty() {
        return Err(FieldlinesError::Tracing(format!(
            "'{variable}' trace from {seed} produced no vertices"
        )));
    }
    if direction == TraceDirection::Reverse {
        half.reverse();
    }
    Ok(resample(&half, n_points))
}

fn trace_key_frame(
    tracer: &mut dyn FieldTracer,
    seed: Vec3,
    n_points: usize,
    attachment_radius: f32,
) -> Result<(Vec<Vec3>, Topology), FieldlinesError> {
    let line = tracer.trace_bidirectional(seed, MAGNETIC_FIELD_VARIABLE)?;
    if line.is_empty() {
        return Err(FieldlinesError::Tracing(format!(
            "field line trace from {seed} produced no vertices"
        )));
    }
    let vertices = resample(&line, n_points);
    let topology = Topology::classify(&vertices, attachment_radius);
    Ok((vertices, topology))
}

/// Plasma travel time in seconds between two path-line vertices given in
/// Earth radii, using the mean flow speed at both ends.
fn travel_time(tracer: &dyn FieldTracer, from: Vec3, to: Vec3) -> Result<f32, FieldlinesError> {
    let speed_from = tracer.sample(FLOW_VELOCITY_VARIABLE, from)?.length();
    let speed_to = tracer.sample(FLOW_VELOCITY_VARIABLE, to)?.length();
    let speed = 0.5 * (speed_from + speed_to);
    if !(speed.is_finite() && speed > 0.0) {
        return Err(FieldlinesError::Tracing(format!(
            "no flow between {from} and {to} (speed {speed})"
        )));
    }
    Ok(from.distance(to) * RE_TO_KM / speed)
}

/// Key-frame durations along `line`; the last vertex gets the end sentinel.
fn key_frame_durations(
    tracer: &dyn FieldTracer,
    line: &[Vec3],
) -> Result<Vec<f32>, FieldlinesError> {
    let mut durations = Vec::with_capacity(line.len());
    for pair in line.windows(2) {
        durations.push(travel_time(tracer, pair[0], pair[1])?);
    }
    if !line.is_empty() {
        durations.push(NO_NEXT_KEY_FRAME);
    }
    Ok(durations)
}

/// Trace every complete seed group into a matched pair and append it to
/// `state`. Positions stay in Earth radii.
pub fn convert_to_matching_state(
    state: &mut FieldlinesState,
    tracer: &mut dyn FieldTracer,
    seeds: &SeedPoints,
    config: &MatchingTraceConfig,
    cancel: &CancelToken,
) -> Result<(), FieldlinesError> {
    if state.model() != Model::Batsrus {
        return Err(FieldlinesError::UnsupportedModel(format!(
            "moving field lines need BATSRUS sources, got {:?}",
            state.model()
        )));
    }
    if config.tracing_variable != MATCHING_TRACING_VARIABLE {
        return Err(FieldlinesError::UnsupportedVariable(format!(
            "'{}' (matching requires '{MATCHING_TRACING_VARIABLE}')",
            config.tracing_variable
        )));
    }
    if seeds.points.len() % SEEDS_PER_PAIR != 0 {
        return Err(FieldlinesError::SeedFile(format!(
            "{} seed points is not a multiple of {SEEDS_PER_PAIR}",
            seeds.points.len()
        )));
    }

    tracer.set_inner_boundary(BATSRUS_INNER_BOUNDARY);
    tracer.load_variable(MAGNETIC_FIELD_VARIABLE)?;
    tracer.load_variable(FLOW_VELOCITY_VARIABLE)?;
    tracer.load_variable(&config.tracing_variable)?;

    let attachment_radius = state.model().attachment_radius();
    let first_pair = state.matching_fieldlines().len();
    let variable = config.tracing_variable.as_str();
    let n_path = config.n_points_on_path_line;

    for (group, chunk) in seeds.points.chunks_exact(SEEDS_PER_PAIR).enumerate() {
        if cancel.is_cancelled() {
            return Err(FieldlinesError::Cancelled);
        }
        let &[s0, s1, s2, s3] = chunk else {
            continue;
        };
        let birth_time = seeds.birth_times.get(group).copied().ok_or_else(|| {
            FieldlinesError::SeedFile(format!("no birth time for seed group {group}"))
        })?;

        let mut line1 = trace_path_half(tracer, variable, s0, TraceDirection::Reverse, n_path)?;
        let split1 = line1.len();
        line1.extend(trace_path_half(tracer, variable, s2, TraceDirection::Forward, n_path)?);
        let mut line2 = trace_path_half(tracer, variable, s1, TraceDirection::Reverse, n_path)?;
        let split2 = line2.len();
        line2.extend(trace_path_half(tracer, variable, s3, TraceDirection::Forward, n_path)?);

        let durations1 = key_frame_durations(tracer, &line1)?;
        let durations2 = key_frame_durations(tracer, &line2)?;
        let seeds1 = line1.clone();
        let seeds2 = line2.clone();

        let pair_index = first_pair + group;
        state.add_matching_path_lines(line1, split1, line2, split2, birth_time);

        for ((&seed1, &seed2), (&dt1, &dt2)) in seeds1
            .iter()
            .zip(&seeds2)
            .zip(durations1.iter().zip(&durations2))
        {
            let (vertices1, topology1) =
                trace_key_frame(tracer, seed1, config.n_points_on_fieldlines, attachment_radius)?;
            let (vertices2, topology2) =
                trace_key_frame(tracer, seed2, config.n_points_on_fieldlines, attachment_radius)?;
            state.add_matching_key_frames(
                Fieldline::new(vertices1, topology1, dt1),
                Fieldline::new(vertices2, topology2, dt2),
                pair_index,
            )?;
        }

        let pair = &state.matching_fieldlines()[pair_index];
        let death1 = birth_time + pair.first.travel_time();
        let death2 = birth_time + pair.second.travel_time();
        state.set_death_times(death1, death2, pair_index)?;
        log::debug!(
            "Traced pair {pair_index}: {} + {} key frames, alive {birth_time:.1}..{:.1}",
            seeds1.len(),
            seeds2.len(),
            death1.max(death2)
        );
    }
    Ok(())
}

/// Build a complete matched state from simulation sources: read the seed
/// file relative to the first source's start time, trace every pair, lay
/// out the initial render lines and convert to meters.
///
/// Only the first source is traced.
pub fn ingest_matching_sources(
    sources: &[PathBuf],
    seed_file: &Path,
    config: &MatchingTraceConfig,
    open_tracer: &dyn Fn(&Path) -> Result<Box<dyn FieldTracer>, FieldlinesError>,
    cancel: &CancelToken,
) -> Result<FieldlinesState, FieldlinesError> {
    let Some(source) = sources.first() else {
        return Err(FieldlinesError::NoSourceFiles(
            "no simulation sources were given".to_owned(),
        ));
    };
    if sources.len() > 1 {
        log::warn!(
            "Moving field lines trace a single source; ignoring {} additional files",
            sources.len() - 1
        );
    }

    let mut tracer = open_tracer(source)?;
    let start_time = tracer.start_time().unwrap_or_else(|| {
        log::warn!("{} has no start time, using J2000", source.display());
        0.0
    });
    let seeds = read_seed_point_file(seed_file, start_time)?;

    let mut state = FieldlinesState::new();
    state.set_model(tracer.model());
    state.set_trigger_time(start_time + config.manual_time_offset);
    convert_to_matching_state(&mut state, tracer.as_mut(), &seeds, config, cancel)?;
    if state.matching_fieldlines().is_empty() {
        return Err(FieldlinesError::Tracing(format!(
            "no matching pairs traced from {}",
            source.display()
        )));
    }
    state.initialize_rendered_matching_fieldlines()?;
    state.scale_positions(RE_TO_METER);
    log::info!(
        "Ingested {} matching pairs from {}",
        state.matching_fieldlines().len(),
        source.display()
    );
    Ok(state)
}
