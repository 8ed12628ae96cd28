use crate::fetch::{AssetSource, ModelCache};
use crate::import::load_model;
use crate::model::{ModelAsset, TARGET_MODEL_SIZE};
use crate::AssetError;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::Instant;

/// Settings for a background load.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Cache directory for remote models. `None` always downloads.
    pub cache_dir: Option<PathBuf>,
    pub target_size: f32,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            cache_dir: None,
            target_size: TARGET_MODEL_SIZE,
        }
    }
}

/// Result of polling an [`AssetLoader`].
#[derive(Debug)]
pub enum LoadStatus {
    /// Still running.
    Pending,
    /// Finished; reported exactly once.
    Ready(Box<ModelAsset>),
    /// Failed; reported exactly once.
    Failed(AssetError),
    /// The result was already taken.
    Done,
}

/// Loads a model on a worker thread. The frame loop calls [`poll`] once per
/// frame; it never blocks.
///
/// [`poll`]: AssetLoader::poll
pub struct AssetLoader {
    source: AssetSource,
    rx: Option<Receiver<Result<ModelAsset, AssetError>>>,
    started: Instant,
}

impl AssetLoader {
    pub fn spawn(source: AssetSource, options: LoadOptions) -> Result<Self, AssetError> {
        let (tx, rx) = mpsc::channel();
        let job_source = source.clone();
        std::thread::Builder::new()
            .name("asset-loader".into())
            .spawn(move || {
                let cache = options.cache_dir.map(ModelCache::new);
                let result = load_model(&job_source, cache.as_ref(), options.target_size);
                // The receiver may be gone if the app closed mid-load.
                let _ = tx.send(result);
            })?;
        tracing::info!("loading model from {source}");
        Ok(Self {
            source,
            rx: Some(rx),
            started: Instant::now(),
        })
    }

    pub fn source(&self) -> &AssetSource {
        &self.source
    }

    pub fn is_pending(&self) -> bool {
        self.rx.is_some()
    }

    pub fn poll(&mut self) -> LoadStatus {
        let Some(rx) = &self.rx else {
            return LoadStatus::Done;
        };
        let status = match rx.try_recv() {
            Ok(Ok(model)) => {
                tracing::info!(
                    "model ready after {:.2}s",
                    self.started.elapsed().as_secs_f32()
                );
                LoadStatus::Ready(Box::new(model))
            }
            Ok(Err(e)) => {
                tracing::error!("failed to load {}: {e}", self.source);
                LoadStatus::Failed(e)
            }
            Err(TryRecvError::Empty) => return LoadStatus::Pending,
            Err(TryRecvError::Disconnected) => LoadStatus::Failed(AssetError::LoaderDisconnected),
        };
        self.rx = None;
        status
    }
}
