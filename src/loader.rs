//! One-shot background ingestion.
//!
//! A [`StateLoader`] runs a single load job on its own thread. The finished
//! state (or the error that stopped it) is published once through a triple
//! buffer; the caller polls without blocking and never sees a partially
//! built state.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::FieldlinesError;
use crate::state::{FieldlinesState, Model, OSFLS_EXTENSION};

/// Shared cancellation flag checked by long-running jobs.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Published result of a load job.
type LoadOutcome = Result<Arc<FieldlinesState>, Arc<FieldlinesError>>;

/// Progress of a [`StateLoader`].
#[derive(Debug, Clone)]
pub enum LoadStatus {
    /// The job is still running.
    Pending,
    /// The job finished with a complete state.
    Ready(Arc<FieldlinesState>),
    /// The job failed or was cancelled.
    Failed(Arc<FieldlinesError>),
}

/// Background thread running one load job.
pub struct StateLoader {
    result: triple_buffer::Output<Option<LoadOutcome>>,
    status: LoadStatus,
    cancel: CancelToken,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl StateLoader {
    /// Run `job` on a thread called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`FieldlinesError::ThreadSpawn`] if the thread fails to
    /// spawn.
    pub fn spawn<F>(name: &str, job: F) -> Result<Self, FieldlinesError>
    where
        F: FnOnce(&CancelToken) -> Result<FieldlinesState, FieldlinesError> + Send + 'static,
    {
        let (mut input, output) = triple_buffer::triple_buffer(&None);
        let cancel = CancelToken::new();
        let job_cancel = cancel.clone();
        let job_name = name.to_owned();

        let thread = std::thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || {
                log::info!("{job_name}: started");
                let outcome = match job(&job_cancel) {
                    Ok(state) => {
                        log::info!(
                            "{job_name}: finished with {} lines",
                            state.n_lines()
                        );
                        Ok(Arc::new(state))
                    }
                    Err(e) => {
                        log::error!("{job_name}: {e}");
                        Err(Arc::new(e))
                    }
                };
                input.write(Some(outcome));
            })
            .map_err(FieldlinesError::ThreadSpawn)?;

        Ok(Self {
            result: output,
            status: LoadStatus::Pending,
            cancel,
            thread: Some(thread),
        })
    }

    /// Load a state file in the background. See [`load_state_file`].
    pub fn load_file(
        path: PathBuf,
        json_model: Model,
        json_coord_to_meters: f32,
    ) -> Result<Self, FieldlinesError> {
        Self::spawn("state-loader", move |_| {
            load_state_file(&path, json_model, json_coord_to_meters)
        })
    }

    /// Non-blocking check for the job's result.
    pub fn poll(&mut self) -> &LoadStatus {
        if matches!(self.status, LoadStatus::Pending) {
            let _ = self.result.update();
            if let Some(outcome) = self.result.output_buffer_mut().take() {
                self.status = match outcome {
                    Ok(state) => LoadStatus::Ready(state),
                    Err(e) => LoadStatus::Failed(e),
                };
                self.join();
            }
        }
        &self.status
    }

    /// Ask the job to stop at its next cancellation check.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    fn join(&mut self) {
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                log::error!("State loader thread panicked");
            }
        }
    }
}

impl Drop for StateLoader {
    fn drop(&mut self) {
        self.cancel();
        self.join();
    }
}

/// Load a `.osfls` or `.json` state file, chosen by extension. JSON files
/// carry no model, so `json_model` is assigned and positions are scaled by
/// `json_coord_to_meters`.
pub fn load_state_file(
    path: &Path,
    json_model: Model,
    json_coord_to_meters: f32,
) -> Result<FieldlinesState, FieldlinesError> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(OSFLS_EXTENSION) => FieldlinesState::load_osfls(path),
        Some("json") => FieldlinesState::load_json(path, json_model, json_coord_to_meters),
        _ => Err(FieldlinesError::MalformedFile(format!(
            "{} is neither a .{OSFLS_EXTENSION} nor a .json file",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn wait(loader: &mut StateLoader) -> LoadStatus {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            let status = loader.poll().clone();
            if !matches!(status, LoadStatus::Pending) || Instant::now() > deadline {
                return status;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    fn one_line_state() -> FieldlinesState {
        let mut state = FieldlinesState::new();
        state.set_model(Model::Pfss);
        let mut line = vec![glam::Vec3::X, glam::Vec3::Y];
        state.add_line(&mut line);
        state
    }

    #[test]
    fn publishes_the_finished_state() {
        let mut loader = StateLoader::spawn("test-loader", |_| Ok(one_line_state())).unwrap();
        match wait(&mut loader) {
            LoadStatus::Ready(state) => assert_eq!(state.n_lines(), 1),
            other => panic!("unexpected status {other:?}"),
        }
        // The result stays available after it was taken.
        assert!(matches!(loader.poll(), LoadStatus::Ready(_)));
    }

    #[test]
    fn publishes_failures() {
        let mut loader = StateLoader::spawn("test-loader", |_| {
            Err(FieldlinesError::Tracing("no field".to_owned()))
        })
        .unwrap();
        assert!(matches!(wait(&mut loader), LoadStatus::Failed(_)));
    }

    #[test]
    fn cancellation_reaches_the_job() {
        let (started_tx, started_rx) = std::sync::mpsc::channel();
        let mut loader = StateLoader::spawn("test-loader", move |cancel| {
            let _ = started_tx.send(());
            while !cancel.is_cancelled() {
                std::thread::sleep(Duration::from_millis(1));
            }
            Err(FieldlinesError::Cancelled)
        })
        .unwrap();
        started_rx.recv().unwrap();
        loader.cancel();
        match wait(&mut loader) {
            LoadStatus::Failed(e) => assert!(matches!(*e, FieldlinesError::Cancelled)),
            other => panic!("unexpected status {other:?}"),
        }
    }

    #[test]
    fn loads_files_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let state = one_line_state();
        let osfls = state.save_osfls(dir.path()).unwrap();
        let json = state.save_json(&dir.path().join("state")).unwrap();

        let mut loader = StateLoader::load_file(osfls, Model::Invalid, 1.0).unwrap();
        match wait(&mut loader) {
            LoadStatus::Ready(loaded) => assert_eq!(loaded.model(), Model::Pfss),
            other => panic!("unexpected status {other:?}"),
        }

        let loaded = load_state_file(&json, Model::Enlil, 2.0).unwrap();
        assert_eq!(loaded.model(), Model::Enlil);
        assert_eq!(loaded.vertex_positions()[0], glam::Vec3::new(2.0, 0.0, 0.0));

        assert!(load_state_file(&dir.path().join("state.txt"), Model::Enlil, 1.0).is_err());
    }
}
