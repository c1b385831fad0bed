//! Classification adapter
//!
//! Wraps the pretrained label model behind an async trait so handlers
//! and tests never touch the inference machinery directly. Model
//! failure is a distinct service-unavailable condition, never a
//! negative classification.

pub mod mobilenet;

pub use mobilenet::MobileNet;

use async_trait::async_trait;
use hivewatch_common::models::Prediction;
use hivewatch_common::{Error, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// Black-box image label model: image bytes in, ranked labels out.
#[async_trait]
pub trait LabelModel: Send + Sync {
    /// Classify raw image bytes; highest probability first.
    async fn classify(&self, image: &[u8]) -> Result<Vec<Prediction>>;

    /// Whether the model has finished loading (health reporting).
    fn is_loaded(&self) -> bool;
}

/// Process-lifetime model handle with lazy, singleton-guarded
/// initialization.
///
/// The first caller triggers the (slow) load; concurrent callers
/// arriving during that window await the same in-flight
/// initialization instead of each loading their own copy. Once loaded
/// the instance is reused until shutdown. A failed load leaves the
/// cell empty so a later request can try again.
pub struct SharedModel {
    model_path: PathBuf,
    labels_path: PathBuf,
    cell: OnceCell<Arc<MobileNet>>,
}

impl SharedModel {
    pub fn new(model_path: PathBuf, labels_path: PathBuf) -> Self {
        SharedModel {
            model_path,
            labels_path,
            cell: OnceCell::new(),
        }
    }

    /// Kick off the load without waiting for a request to pay for it.
    pub async fn warm(&self) {
        if let Err(e) = self.model().await {
            warn!("Model warm-up failed: {}", e);
        }
    }

    async fn model(&self) -> Result<Arc<MobileNet>> {
        let model = self
            .cell
            .get_or_try_init(|| async {
                let model_path = self.model_path.clone();
                let labels_path = self.labels_path.clone();
                info!("Loading label model from {}", model_path.display());
                let started = std::time::Instant::now();
                let model = tokio::task::spawn_blocking(move || {
                    MobileNet::load(&model_path, &labels_path)
                })
                .await
                .map_err(|e| Error::Internal(format!("Model load task failed: {}", e)))??;
                info!("Label model loaded in {:.1}s", started.elapsed().as_secs_f64());
                Ok::<_, Error>(Arc::new(model))
            })
            .await?;
        Ok(model.clone())
    }
}

#[async_trait]
impl LabelModel for SharedModel {
    async fn classify(&self, image: &[u8]) -> Result<Vec<Prediction>> {
        let model = self.model().await?;
        let bytes = image.to_vec();
        // Inference is CPU-bound; keep it off the async runtime. The
        // decoded tensor lives only inside this call.
        tokio::task::spawn_blocking(move || model.classify_blocking(&bytes))
            .await
            .map_err(|e| Error::Internal(format!("Classification task failed: {}", e)))?
    }

    fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }
}
