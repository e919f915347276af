//! ONNX inference using tract
//!
//! Runs the exported gestational-age regressor. The model is read from disk
//! once, optimized, and then only ever read; a single instance is shared by
//! every request for the life of the process.

use super::{tree_ensemble, Predictor};
use crate::models::{FeatureVector, NUM_FEATURES};
use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tract_onnx::prelude::*;
use tracing::{debug, info, warn};

/// Maximum inference latency before warning
const MAX_INFERENCE_MS: u128 = 5;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// ONNX-based predictor using tract for lightweight inference
pub struct OnnxPredictor {
    model: TractModel,
    model_version: String,
    checksum: String,
    inference_count: AtomicU64,
    slow_inference_count: AtomicU64,
}

impl std::fmt::Debug for OnnxPredictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxPredictor")
            .field("model_version", &self.model_version)
            .field("checksum", &self.checksum)
            .finish_non_exhaustive()
    }
}

impl OnnxPredictor {
    /// Create a predictor from model bytes
    pub fn new(model_bytes: &[u8], model_version: impl Into<String>) -> Result<Self> {
        let checksum = compute_checksum(model_bytes);
        let model = Self::load_model(model_bytes)?;
        Ok(Self {
            model,
            model_version: model_version.into(),
            checksum,
            inference_count: AtomicU64::new(0),
            slow_inference_count: AtomicU64::new(0),
        })
    }

    /// Load a model file, optionally verifying its SHA-256 first
    pub fn from_file(
        path: &Path,
        model_version: impl Into<String>,
        expected_checksum: Option<&str>,
    ) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read model file {:?}", path))?;

        if let Some(expected) = expected_checksum {
            verify_checksum(&bytes, expected)?;
        }

        let predictor = Self::new(&bytes, model_version)?;
        info!(
            path = %path.display(),
            size = bytes.len(),
            checksum = %predictor.checksum,
            version = %predictor.model_version,
            "Loaded model"
        );
        Ok(predictor)
    }

    /// Parse and optimize an ONNX model from bytes
    fn load_model(model_bytes: &[u8]) -> Result<TractModel> {
        let mut onnx = tract_onnx::onnx();
        tree_ensemble::register(&mut onnx.op_register);

        let model = onnx
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?
            .with_input_fact(0, f32::fact([1, NUM_FEATURES]).into())
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;
        Ok(model)
    }

    /// Convert feature vector to a [1, 8] input tensor
    fn features_to_tensor(features: &FeatureVector) -> Result<Tensor> {
        let data = features.to_array().to_vec();
        let array = tract_ndarray::Array2::from_shape_vec((1, NUM_FEATURES), data)
            .context("Failed to shape input tensor")?;
        Ok(array.into())
    }

    /// Extract the single regression output
    fn tensor_to_days(output: &Tensor) -> Result<f32> {
        let output = output.cast_to::<f32>()?;
        let view = output.to_array_view::<f32>()?;
        view.iter()
            .next()
            .copied()
            .context("Model produced an empty output")
    }

    /// SHA-256 of the loaded model, hex encoded
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    /// Get inference statistics
    pub fn stats(&self) -> InferenceStats {
        InferenceStats {
            total_inferences: self.inference_count.load(Ordering::Relaxed),
            slow_inferences: self.slow_inference_count.load(Ordering::Relaxed),
        }
    }
}

impl Predictor for OnnxPredictor {
    fn predict(&self, features: &FeatureVector) -> Result<f32> {
        let start = Instant::now();

        let input = Self::features_to_tensor(features)?;
        let result = self.model.run(tvec!(input.into()))?;
        let output = result.first().context("No output from model")?;
        let days = Self::tensor_to_days(output)?;

        let elapsed = start.elapsed();
        self.inference_count.fetch_add(1, Ordering::Relaxed);

        if elapsed.as_millis() > MAX_INFERENCE_MS {
            self.slow_inference_count.fetch_add(1, Ordering::Relaxed);
            warn!(elapsed_ms = elapsed.as_millis(), "Inference exceeded {}ms target", MAX_INFERENCE_MS);
        } else {
            debug!(elapsed_us = elapsed.as_micros(), "Inference completed");
        }

        Ok(days)
    }

    fn model_version(&self) -> &str {
        &self.model_version
    }
}

/// Inference statistics
#[derive(Debug, Clone)]
pub struct InferenceStats {
    pub total_inferences: u64,
    pub slow_inferences: u64,
}

/// Compute SHA256 checksum of data
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn verify_checksum(data: &[u8], expected: &str) -> Result<()> {
    let computed = compute_checksum(data);
    if !computed.eq_ignore_ascii_case(expected.trim()) {
        anyhow::bail!("Checksum mismatch: expected {}, got {}", expected, computed);
    }
    Ok(())
}
