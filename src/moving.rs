//! Moving field lines: ingestion in the background, then per-frame motion.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::FieldlinesError;
use crate::loader::{LoadStatus, StateLoader};
use crate::motion::{LineMover, RenderVertex};
use crate::options::Options;
use crate::state::FieldlinesState;
use crate::trace::matching::{ingest_matching_sources, MatchingTraceConfig};
use crate::trace::FieldTracer;

/// Drives a set of matched field lines from source files to render
/// buffers.
///
/// ```no_run
/// # use fieldlines::{MovingFieldlines, Options};
/// # fn open(_: &std::path::Path) -> Result<Box<dyn fieldlines::FieldTracer>, fieldlines::FieldlinesError> { unimplemented!() }
/// let mut lines = MovingFieldlines::new(Options::default());
/// lines.initialize(vec!["run/3d__var_1.cdf".into()], "seeds.txt".into(), open)?;
/// lines.update(1.0, 0.0);
/// if lines.is_ready() {
///     let _vertices = lines.render_vertices();
/// }
/// # Ok::<(), fieldlines::FieldlinesError>(())
/// ```
pub struct MovingFieldlines {
    options: Options,
    loader: Option<StateLoader>,
    state: Option<Arc<FieldlinesState>>,
    mover: Option<LineMover>,
    error: Option<Arc<FieldlinesError>>,
}

impl MovingFieldlines {
    /// A driver with no data yet. Out-of-range options fall back to their
    /// defaults.
    #[must_use]
    pub fn new(options: Options) -> Self {
        Self {
            options: options.validated(),
            loader: None,
            state: None,
            mover: None,
            error: None,
        }
    }

    /// Start tracing `sources` in the background, seeded from `seed_file`.
    /// `open_tracer` is called on the loader thread to open a source.
    pub fn initialize<F>(
        &mut self,
        sources: Vec<PathBuf>,
        seed_file: PathBuf,
        open_tracer: F,
    ) -> Result<(), FieldlinesError>
    where
        F: Fn(&Path) -> Result<Box<dyn FieldTracer>, FieldlinesError> + Send + 'static,
    {
        let config = MatchingTraceConfig::from(&self.options.tracing);
        let loader = StateLoader::spawn("fieldlines-ingest", move |cancel| {
            ingest_matching_sources(&sources, &seed_file, &config, &open_tracer, cancel)
        })?;
        self.reset();
        self.loader = Some(loader);
        Ok(())
    }

    /// Use an already traced state.
    pub fn initialize_with_state(&mut self, state: FieldlinesState) -> Result<(), FieldlinesError> {
        self.reset();
        self.install(Arc::new(state))
    }

    fn reset(&mut self) {
        self.loader = None;
        self.state = None;
        self.mover = None;
        self.error = None;
    }

    fn install(&mut self, state: Arc<FieldlinesState>) -> Result<(), FieldlinesError> {
        let mover = LineMover::new(&state, self.options.motion.fade_time)?;
        self.state = Some(state);
        self.mover = Some(mover);
        Ok(())
    }

    fn poll_loader(&mut self) {
        let Some(loader) = self.loader.as_mut() else {
            return;
        };
        let outcome = match loader.poll() {
            LoadStatus::Pending => return,
            LoadStatus::Ready(state) => Ok(Arc::clone(state)),
            LoadStatus::Failed(e) => Err(Arc::clone(e)),
        };
        self.loader = None;
        match outcome {
            Ok(state) => {
                if let Err(e) = self.install(state) {
                    log::error!("Cannot move loaded field lines: {e}");
                    self.error = Some(Arc::new(e));
                }
            }
            Err(e) => self.error = Some(e),
        }
    }

    /// Advance to `current_time` (J2000 seconds) from `previous_time`.
    /// Before ingestion has finished this only polls the loader.
    pub fn update(&mut self, current_time: f64, previous_time: f64) {
        self.poll_loader();
        if let (Some(state), Some(mover)) = (self.state.as_deref(), self.mover.as_mut()) {
            mover.update(state, current_time, previous_time);
        }
    }

    /// Whether lines are available to render.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.mover.is_some()
    }

    /// Whether a background ingestion is still running.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loader.is_some()
    }

    /// The loaded state.
    #[must_use]
    pub fn state(&self) -> Option<&FieldlinesState> {
        self.state.as_deref()
    }

    /// The line mover, once the state is loaded.
    #[must_use]
    pub fn mover(&self) -> Option<&LineMover> {
        self.mover.as_ref()
    }

    /// Take the error that stopped ingestion, if any.
    pub fn take_error(&mut self) -> Option<Arc<FieldlinesError>> {
        self.error.take()
    }

    /// Active options.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Render vertices for the current frame.
    #[must_use]
    pub fn render_vertices(&self) -> Option<Vec<RenderVertex>> {
        let (state, mover) = (self.state.as_deref()?, self.mover.as_ref()?);
        Some(mover.render_vertices(state, self.options.motion.render_flow_line))
    }

    /// Per-vertex alpha for the current frame.
    #[must_use]
    pub fn alpha_buffer(&self) -> Option<Vec<f32>> {
        let (state, mover) = (self.state.as_deref()?, self.mover.as_ref()?);
        Some(mover.alpha_buffer(state, self.options.motion.render_flow_line))
    }

    /// Line draw ranges for the current frame.
    #[must_use]
    pub fn draw_ranges(&self) -> Option<(Vec<u32>, Vec<u32>)> {
        let (state, mover) = (self.state.as_deref()?, self.mover.as_ref()?);
        Some(mover.draw_ranges(state, self.options.motion.render_flow_line))
    }
}
