//! Background model loading.
//!
//! The import runs on its own thread; the render thread polls the returned
//! [`PendingModel`] once per event-loop iteration and never blocks on it.

use super::error::LoadError;
use super::import::import_model;
use super::model::LoadedModel;
use std::path::PathBuf;
use std::thread;
use tokio::sync::oneshot::{self, error::TryRecvError};

pub type LoadResult = Result<LoadedModel, LoadError>;

/// A load in flight. Yields its result exactly once.
#[derive(Debug)]
pub struct PendingModel {
    rx: Option<oneshot::Receiver<LoadResult>>,
}

impl PendingModel {
    /// An already-completed load.
    pub fn ready(result: LoadResult) -> Self {
        let (tx, rx) = oneshot::channel();
        // The receiver is alive right here, so this cannot fail.
        let _ = tx.send(result);
        Self { rx: Some(rx) }
    }

    /// Returns the result once the loader has finished, then `None` forever.
    pub fn poll(&mut self) -> Option<LoadResult> {
        let rx = self.rx.as_mut()?;
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Closed) => Err(LoadError::LoaderVanished),
        };
        self.rx = None;
        Some(result)
    }

    pub fn is_finished(&self) -> bool {
        self.rx.is_none()
    }
}

/// Starts importing `path` on a background thread.
pub fn spawn_model_load(path: PathBuf) -> PendingModel {
    let (tx, rx) = oneshot::channel();
    let spawned = thread::Builder::new()
        .name("model-loader".into())
        .spawn(move || {
            log::info!("Loading model from {:?}", path);
            let result = import_model(&path);
            if tx.send(result).is_err() {
                log::debug!("Model finished loading after the viewer went away");
            }
        });

    match spawned {
        Ok(_) => PendingModel { rx: Some(rx) },
        Err(e) => PendingModel::ready(Err(LoadError::Spawn(e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn ready_result_is_delivered_once() {
        let mut pending = PendingModel::ready(Ok(LoadedModel::default()));
        assert!(matches!(pending.poll(), Some(Ok(_))));
        assert!(pending.is_finished());
        assert!(pending.poll().is_none());
    }

    #[test]
    fn dropped_sender_reports_vanished_loader() {
        let (tx, rx) = oneshot::channel::<LoadResult>();
        drop(tx);
        let mut pending = PendingModel { rx: Some(rx) };
        assert!(matches!(pending.poll(), Some(Err(LoadError::LoaderVanished))));
    }

    #[test]
    fn empty_channel_is_still_pending() {
        let (_tx, rx) = oneshot::channel::<LoadResult>();
        let mut pending = PendingModel { rx: Some(rx) };
        assert!(pending.poll().is_none());
        assert!(!pending.is_finished());
    }

    #[test]
    fn missing_file_fails_in_background() {
        let mut pending = spawn_model_load(PathBuf::from("no/such/city.glb"));
        let deadline = Instant::now() + Duration::from_secs(10);
        let result = loop {
            if let Some(r) = pending.poll() {
                break r;
            }
            assert!(Instant::now() < deadline, "loader never finished");
            std::thread::sleep(Duration::from_millis(5));
        };
        assert!(matches!(result, Err(LoadError::Import { .. })));
    }
}
