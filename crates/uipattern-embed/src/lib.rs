//! uipattern-embed
//!
//! Embedding providers for the semantic retriever: the local BGE-M3 model
//! (XLM-RoBERTa on candle) and a deterministic hashed embedder.

pub mod device;
pub mod hashed;
pub mod pool;
pub mod tokenize;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, ensure, Context};
use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use uipattern_core::config::{expand_path, EmbedderKind, SemanticSettings};
use uipattern_core::traits::EmbeddingProvider;
use uipattern_core::{Error, Result};

pub use hashed::HashedEmbedder;
pub use pool::masked_mean_l2;

use crate::device::select_device;
use crate::tokenize::encode_fixed;

struct ModelParts {
    model: XLMRobertaModel,
    tokenizer: Tokenizer,
    device: Device,
    max_len: usize,
    dim: usize,
}

impl ModelParts {
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let start = Instant::now();
        let (input_ids, attention_mask) = encode_fixed(&self.tokenizer, text, self.max_len, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &attention_mask, &token_type_ids, None, None, None)?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let v: Vec<f32> = pooled.to_device(&Device::Cpu)?.squeeze(0)?.to_vec1()?;
        ensure!(v.len() == self.dim, "expected {} dims, model produced {}", self.dim, v.len());
        let elapsed = start.elapsed();
        if elapsed.as_millis() > 100 {
            warn!(elapsed_ms = elapsed.as_millis() as u64, "slow embedding");
        }
        Ok(v)
    }
}

/// BGE-M3 sentence embeddings: masked mean pooling, L2-normalised.
///
/// Inference is CPU/GPU bound and runs on tokio's blocking pool so callers
/// awaiting an embedding never stall the async workers.
#[derive(Clone)]
pub struct EmbeddingModel {
    parts: Arc<ModelParts>,
    id: String,
}

impl EmbeddingModel {
    /// Load `tokenizer.json`, `config.json` and `pytorch_model.bin` from `model_dir`.
    pub fn load(model_dir: &Path, max_len: usize) -> anyhow::Result<Self> {
        let device = select_device();
        info!(dir = %model_dir.display(), "loading BGE-M3 model");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("failed to load tokenizer from {}: {e}", tokenizer_path.display()))?;

        let config_path = model_dir.join("config.json");
        let raw_config = std::fs::read_to_string(&config_path)
            .with_context(|| format!("reading {}", config_path.display()))?;
        let config: XLMRobertaConfig = serde_json::from_str(&raw_config)?;

        let weights_path = model_dir.join("pytorch_model.bin");
        let weights: HashMap<String, Tensor> = candle_core::pickle::read_all(&weights_path)
            .with_context(|| format!("reading {}", weights_path.display()))?
            .into_iter()
            .collect();
        let vb = VarBuilder::from_tensors(weights, DType::F32, &device);
        let model = XLMRobertaModel::new(&config, vb)?;

        let dim = config.hidden_size;
        info!(dim, max_len, "BGE-M3 model loaded");
        Ok(Self {
            parts: Arc::new(ModelParts { model, tokenizer, device, max_len, dim }),
            id: format!("bge-m3:d{dim}"),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for EmbeddingModel {
    fn provider_id(&self) -> &str {
        &self.id
    }

    fn dim(&self) -> usize {
        self.parts.dim
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let parts = Arc::clone(&self.parts);
        let text = text.to_owned();
        tokio::task::spawn_blocking(move || parts.embed(&text))
            .await
            .map_err(|e| Error::EmbeddingProvider(format!("embedding task failed: {e}")))?
            .map_err(|e| Error::EmbeddingProvider(format!("{e:#}")))
    }
}

/// Build the provider selected by `semantic.embedder`.
pub fn provider_from_settings(settings: &SemanticSettings) -> Result<Arc<dyn EmbeddingProvider>> {
    match settings.embedder {
        EmbedderKind::Hashed => {
            debug!(dim = settings.dim, "using hashed embedder");
            Ok(Arc::new(HashedEmbedder::new(settings.dim)))
        }
        EmbedderKind::Model => {
            let dir = resolve_model_dir(settings.model_dir.as_deref())?;
            let model = EmbeddingModel::load(&dir, settings.max_len)
                .map_err(|e| Error::EmbeddingProvider(format!("{e:#}")))?;
            Ok(Arc::new(model))
        }
    }
}

fn resolve_model_dir(configured: Option<&str>) -> Result<PathBuf> {
    if let Some(dir) = configured {
        let p = expand_path(dir);
        if p.exists() {
            return Ok(p);
        }
        warn!(dir = %p.display(), "configured model_dir does not exist");
    }
    ["models/bge-m3", "../models/bge-m3"]
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .ok_or_else(|| Error::NotFound("BGE-M3 model directory".to_string()))
}
