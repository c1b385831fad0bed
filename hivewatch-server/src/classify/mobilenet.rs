//! MobileNet V2 ONNX classifier
//!
//! General object recognition over the ImageNet label set. The model
//! and its labels file (one label per line, index-aligned with the
//! output vector) are loaded from configured paths.

use hivewatch_common::models::Prediction;
use hivewatch_common::{Error, Result};
use std::path::Path;
use tract_onnx::prelude::*;

/// Fixed square input resolution required by the model
const INPUT_SIZE: u32 = 224;
/// Ranked predictions returned per image
const TOP_K: usize = 5;
// ImageNet normalization constants
const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD: [f32; 3] = [0.229, 0.224, 0.225];

type OnnxPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

pub struct MobileNet {
    plan: OnnxPlan,
    labels: Vec<String>,
}

impl MobileNet {
    /// Load the ONNX model and its labels file.
    ///
    /// A missing or unreadable model is a service-availability
    /// problem for the caller, so everything here maps to
    /// `Error::Unavailable`.
    pub fn load(model_path: &Path, labels_path: &Path) -> Result<Self> {
        if !model_path.exists() {
            return Err(Error::Unavailable(format!(
                "Model file not found: {}",
                model_path.display()
            )));
        }

        let labels = std::fs::read_to_string(labels_path).map_err(|e| {
            Error::Unavailable(format!(
                "Labels file unreadable: {}: {}",
                labels_path.display(),
                e
            ))
        })?;
        let labels: Vec<String> = labels
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        if labels.is_empty() {
            return Err(Error::Unavailable(format!(
                "Labels file is empty: {}",
                labels_path.display()
            )));
        }

        let plan = tract_onnx::onnx()
            .model_for_path(model_path)
            .map_err(|e| Error::Unavailable(format!("Failed to read model: {}", e)))?
            .with_input_fact(
                0,
                f32::fact([1, 3, INPUT_SIZE as usize, INPUT_SIZE as usize]).into(),
            )
            .map_err(|e| Error::Unavailable(format!("Failed to shape model input: {}", e)))?
            .into_optimized()
            .map_err(|e| Error::Unavailable(format!("Failed to optimize model: {}", e)))?
            .into_runnable()
            .map_err(|e| Error::Unavailable(format!("Failed to prepare model: {}", e)))?;

        Ok(MobileNet { plan, labels })
    }

    /// Decode, resize, normalize and classify one image.
    pub fn classify_blocking(&self, image_bytes: &[u8]) -> Result<Vec<Prediction>> {
        let img = image::load_from_memory(image_bytes)
            .map_err(|e| Error::Validation(format!("Unreadable image data: {}", e)))?;

        // Fixed square input; the RGB conversion drops any alpha channel
        let resized = img.resize_exact(INPUT_SIZE, INPUT_SIZE, image::imageops::FilterType::Triangle);
        let rgb = resized.to_rgb8();

        let tensor: Tensor = tract_ndarray::Array4::from_shape_fn(
            (1, 3, INPUT_SIZE as usize, INPUT_SIZE as usize),
            |(_, c, y, x)| {
                let value = rgb.get_pixel(x as u32, y as u32)[c] as f32 / 255.0;
                (value - MEAN[c]) / STD[c]
            },
        )
        .into();

        let outputs = self
            .plan
            .run(tvec!(tensor.into()))
            .map_err(|e| Error::Internal(format!("Inference failed: {}", e)))?;

        let scores = outputs[0]
            .to_array_view::<f32>()
            .map_err(|e| Error::Internal(format!("Unexpected model output: {}", e)))?;
        let scores = scores
            .as_slice()
            .ok_or_else(|| Error::Internal("Non-contiguous model output".to_string()))?;

        Ok(rank(scores, &self.labels))
    }
}

/// Softmax the raw scores and return the top-k (label, probability)
/// pairs, highest first.
fn rank(scores: &[f32], labels: &[String]) -> Vec<Prediction> {
    let max = scores.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exp_sum: f32 = scores.iter().map(|s| (s - max).exp()).sum();

    let mut ranked: Vec<(usize, f32)> = scores
        .iter()
        .enumerate()
        .map(|(i, s)| (i, (s - max).exp() / exp_sum))
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    ranked
        .into_iter()
        .take(TOP_K)
        .map(|(idx, probability)| Prediction {
            label: labels
                .get(idx)
                .cloned()
                .unwrap_or_else(|| format!("class {}", idx)),
            probability,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_orders_by_probability_and_maps_labels() {
        let labels = vec!["ant".to_string(), "bee".to_string(), "wasp".to_string()];
        let ranked = rank(&[0.1, 2.0, 0.5], &labels);
        assert_eq!(ranked[0].label, "bee");
        assert_eq!(ranked[1].label, "wasp");
        assert_eq!(ranked[2].label, "ant");
        let total: f32 = ranked.iter().map(|p| p.probability).sum();
        assert!((total - 1.0).abs() < 1e-5);
    }

    #[test]
    fn rank_survives_missing_labels() {
        let labels = vec!["bee".to_string()];
        let ranked = rank(&[0.2, 3.0], &labels);
        assert_eq!(ranked[0].label, "class 1");
        assert_eq!(ranked[1].label, "bee");
    }

    #[test]
    fn missing_model_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = MobileNet::load(
            &dir.path().join("absent.onnx"),
            &dir.path().join("absent.txt"),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Unavailable(_)));
    }
}
