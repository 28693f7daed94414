//! Local Marian (opus-mt) translation via Candle
//!
//! Only compiled with the `local-inference` feature, and only attempted when
//! the operator opts in. Each call loads a fresh pipeline from the Hugging
//! Face hub cache unless `cache_pipelines` is set, in which case loaded
//! pipelines are kept per model id.
//!
//! Loading per call is slow (seconds per request). Turn on
//! `cache_pipelines` for anything beyond occasional use.

/// Whether the local inference runtime is compiled into this binary
pub const RUNTIME_AVAILABLE: bool = cfg!(feature = "local-inference");

/// Local pipeline configuration
#[derive(Debug, Clone)]
pub struct LocalPipelineConfig {
    /// Operator opt-in
    pub enabled: bool,
    /// Maximum generated tokens
    pub max_length: usize,
    /// Reuse loaded pipelines across requests
    pub cache_pipelines: bool,
}

impl Default for LocalPipelineConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_length: translate_relay_config::constants::local::MAX_LENGTH,
            cache_pipelines: false,
        }
    }
}

impl From<&translate_relay_config::LocalInferenceConfig> for LocalPipelineConfig {
    fn from(config: &translate_relay_config::LocalInferenceConfig) -> Self {
        Self {
            enabled: config.enabled,
            max_length: config.max_length,
            cache_pipelines: config.cache_pipelines,
        }
    }
}

#[cfg(feature = "local-inference")]
mod candle_impl {
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Arc;

    use async_trait::async_trait;
    use candle_core::{DType, Device, Tensor};
    use candle_nn::VarBuilder;
    use candle_transformers::models::marian;
    use dashmap::DashMap;
    use parking_lot::Mutex;
    use sentencepiece::SentencePieceProcessor;
    use serde_json::{json, Value};
    use translate_relay_core::{
        BackendKind, ModelIdentifier, TranslationRequest, TranslationResult,
    };

    use super::LocalPipelineConfig;
    use crate::backend::TranslationBackend;
    use crate::normalize::{extract_pipeline_text, PIPELINE_TEXT_KEY};
    use crate::BackendError;

    type Result<T> = std::result::Result<T, BackendError>;

    fn candle_error(e: candle_core::Error) -> BackendError {
        BackendError::Inference(format!("Candle error: {}", e))
    }

    fn load_error(what: &str, e: impl std::fmt::Display) -> BackendError {
        BackendError::Inference(format!("Failed to load {}: {}", what, e))
    }

    // ========================================================================
    // Tokenizer
    // ========================================================================

    /// SentencePiece tokenizer with the model's shared vocabulary
    struct MarianTokenizer {
        source_spm: SentencePieceProcessor,
        vocab: HashMap<String, u32>,
        vocab_rev: HashMap<u32, String>,
        unk_token_id: u32,
    }

    impl MarianTokenizer {
        fn new(source_spm: &Path, vocab_path: &Path) -> Result<Self> {
            let source_spm = SentencePieceProcessor::open(source_spm)
                .map_err(|e| load_error("source SPM", e))?;

            let vocab: HashMap<String, u32> = serde_json::from_str(
                &std::fs::read_to_string(vocab_path).map_err(|e| load_error("vocab", e))?,
            )
            .map_err(|e| load_error("vocab", e))?;

            let vocab_rev = vocab.iter().map(|(k, v)| (*v, k.clone())).collect();
            let unk_token_id = *vocab.get("<unk>").unwrap_or(&1);

            Ok(Self {
                source_spm,
                vocab,
                vocab_rev,
                unk_token_id,
            })
        }

        fn encode(&self, text: &str) -> Result<Vec<u32>> {
            let pieces = self
                .source_spm
                .encode(text)
                .map_err(|e| BackendError::Inference(format!("SPM encode failed: {}", e)))?;

            Ok(pieces
                .iter()
                .map(|piece| {
                    *self
                        .vocab
                        .get(piece.piece.as_str())
                        .unwrap_or(&self.unk_token_id)
                })
                .collect())
        }

        fn decode(&self, ids: &[u32], skip: &[u32]) -> String {
            let joined: String = ids
                .iter()
                .filter(|id| !skip.contains(id))
                .filter_map(|id| self.vocab_rev.get(id).map(String::as_str))
                .collect();

            joined.replace('\u{2581}', " ").trim().to_string()
        }
    }

    // ========================================================================
    // Pipeline
    // ========================================================================

    /// A loaded Marian model plus tokenizer for one language pair
    pub struct MarianPipeline {
        model: marian::MTModel,
        config: marian::Config,
        tokenizer: MarianTokenizer,
        device: Device,
    }

    impl MarianPipeline {
        /// Download (or reuse from the hub cache) and load a model
        pub fn load(model_id: &str) -> Result<Self> {
            let device = Device::Cpu;
            let api = hf_hub::api::sync::Api::new().map_err(|e| load_error("hub client", e))?;
            let repo = api.model(model_id.to_string());

            tracing::info!(model = %model_id, "Loading local translation pipeline");

            let config_path = repo.get("config.json").map_err(|e| load_error("config", e))?;
            let config = Self::read_config(&config_path)?;

            let vb = match repo.get("model.safetensors") {
                Ok(weights) => {
                    let tensors = candle_core::safetensors::load(&weights, &device)
                        .map_err(|e| load_error("weights", e))?;
                    VarBuilder::from_tensors(tensors, DType::F32, &device)
                }
                Err(_) => {
                    let weights = repo
                        .get("pytorch_model.bin")
                        .map_err(|e| load_error("weights", e))?;
                    VarBuilder::from_pth(&weights, DType::F32, &device)
                        .map_err(|e| load_error("weights", e))?
                }
            };
            let model = marian::MTModel::new(&config, vb).map_err(candle_error)?;

            let source_spm = repo.get("source.spm").map_err(|e| load_error("source SPM", e))?;
            let vocab = repo.get("vocab.json").map_err(|e| load_error("vocab", e))?;
            let tokenizer = MarianTokenizer::new(&source_spm, &vocab)?;

            Ok(Self {
                model,
                config,
                tokenizer,
                device,
            })
        }

        /// Older opus-mt configs omit fields newer loaders expect
        fn read_config(path: &Path) -> Result<marian::Config> {
            let raw = std::fs::read_to_string(path).map_err(|e| load_error("config", e))?;
            let mut value: Value =
                serde_json::from_str(&raw).map_err(|e| load_error("config", e))?;

            if let Some(obj) = value.as_object_mut() {
                let vocab_size = obj.get("vocab_size").cloned().unwrap_or(Value::Null);
                obj.entry("decoder_vocab_size").or_insert(vocab_size);
                obj.entry("share_encoder_decoder_embeddings")
                    .or_insert(Value::Bool(true));
                obj.entry("use_cache").or_insert(Value::Bool(true));
                obj.entry("is_encoder_decoder").or_insert(Value::Bool(true));
            }

            serde_json::from_value(value).map_err(|e| load_error("config", e))
        }

        /// Translate one text, emitting `[{"translation_text": ...}]`
        pub fn run(&mut self, text: &str, max_length: usize) -> Result<Value> {
            self.model.reset_kv_cache();

            let eos = self.config.eos_token_id;
            let mut input_ids = self.tokenizer.encode(text)?;
            input_ids.truncate(self.config.max_position_embeddings.saturating_sub(1));
            input_ids.push(eos);

            let input = Tensor::new(input_ids.as_slice(), &self.device)
                .and_then(|t| t.unsqueeze(0))
                .map_err(candle_error)?;
            let encoder_xs = self
                .model
                .encoder()
                .forward(&input, 0)
                .map_err(candle_error)?;

            let mut tokens = vec![self.config.decoder_start_token_id];
            let steps = max_length.min(self.config.max_position_embeddings);

            for index in 0..steps {
                let context_size = if index >= 1 { 1 } else { tokens.len() };
                let start_pos = tokens.len().saturating_sub(context_size);
                let step_input = Tensor::new(&tokens[start_pos..], &self.device)
                    .and_then(|t| t.unsqueeze(0))
                    .map_err(candle_error)?;

                let logits = self
                    .model
                    .decode(&step_input, &encoder_xs, start_pos)
                    .and_then(|l| l.squeeze(0))
                    .map_err(candle_error)?;
                let last = logits
                    .dim(0)
                    .and_then(|len| logits.get(len - 1))
                    .map_err(candle_error)?;

                let next = self.greedy(&last)?;
                if next == eos || next == self.config.forced_eos_token_id {
                    break;
                }
                tokens.push(next);
            }

            let skip = [self.config.pad_token_id, eos];
            let translated = self.tokenizer.decode(&tokens[1..], &skip);
            Ok(json!([{ PIPELINE_TEXT_KEY: translated }]))
        }

        /// Argmax over the vocabulary with padding suppressed
        fn greedy(&self, logits: &Tensor) -> Result<u32> {
            let mut scores: Vec<f32> = logits
                .to_dtype(DType::F32)
                .and_then(|l| l.to_vec1())
                .map_err(candle_error)?;

            if let Some(pad) = scores.get_mut(self.config.pad_token_id as usize) {
                *pad = f32::NEG_INFINITY;
            }

            scores
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(index, _)| index as u32)
                .ok_or_else(|| BackendError::Inference("empty logits".to_string()))
        }
    }

    type PipelineCache = DashMap<String, Arc<Mutex<MarianPipeline>>>;

    // ========================================================================
    // Backend
    // ========================================================================

    /// Local transformers backend
    pub struct LocalTransformersBackend {
        config: LocalPipelineConfig,
        cache: Option<Arc<PipelineCache>>,
    }

    impl LocalTransformersBackend {
        pub fn new(config: LocalPipelineConfig) -> Result<Self> {
            let cache = config
                .cache_pipelines
                .then(|| Arc::new(PipelineCache::new()));
            Ok(Self { config, cache })
        }

        /// Number of pipelines currently held in the cache
        pub fn cached_pipelines(&self) -> usize {
            self.cache.as_ref().map(|c| c.len()).unwrap_or(0)
        }

        fn run_blocking(
            cache: Option<Arc<PipelineCache>>,
            model: &str,
            text: &str,
            max_length: usize,
        ) -> Result<Value> {
            let Some(cache) = cache else {
                return MarianPipeline::load(model)?.run(text, max_length);
            };

            let existing = cache.get(model).map(|entry| Arc::clone(entry.value()));
            let pipeline = match existing {
                Some(pipeline) => pipeline,
                None => {
                    let loaded = Arc::new(Mutex::new(MarianPipeline::load(model)?));
                    Arc::clone(cache.entry(model.to_string()).or_insert(loaded).value())
                }
            };

            let mut guard = pipeline.lock();
            guard.run(text, max_length)
        }
    }

    #[async_trait]
    impl TranslationBackend for LocalTransformersBackend {
        fn kind(&self) -> BackendKind {
            BackendKind::LocalTransformers
        }

        fn is_available(&self) -> bool {
            self.config.enabled
        }

        async fn translate(
            &self,
            request: &TranslationRequest,
            model: Option<&ModelIdentifier>,
        ) -> Result<TranslationResult> {
            let model = model.ok_or(BackendError::MissingModel)?.clone();
            let model_name = model.to_string();
            let text = request.text().to_string();
            let max_length = self.config.max_length;
            let cache = self.cache.clone();

            let output = tokio::task::spawn_blocking(move || {
                Self::run_blocking(cache, &model_name, &text, max_length)
            })
            .await
            .map_err(|e| BackendError::Inference(format!("Inference task failed: {}", e)))??;

            Ok(TranslationResult::from_model(
                extract_pipeline_text(&output),
                self.kind(),
                &model,
            ))
        }
    }

}

#[cfg(feature = "local-inference")]
pub use candle_impl::{LocalTransformersBackend, MarianPipeline};

#[cfg(not(feature = "local-inference"))]
pub mod stub {
    use async_trait::async_trait;
    use translate_relay_core::{
        BackendKind, ModelIdentifier, TranslationRequest, TranslationResult,
    };

    use super::LocalPipelineConfig;
    use crate::backend::TranslationBackend;
    use crate::BackendError;

    /// Placeholder used when the local runtime is not compiled in
    pub struct LocalTransformersBackend;

    impl LocalTransformersBackend {
        pub fn new(config: LocalPipelineConfig) -> Result<Self, BackendError> {
            if config.enabled {
                tracing::warn!(
                    "Local inference requested but the local-inference feature is not enabled"
                );
            }
            Ok(Self)
        }
    }

    #[async_trait]
    impl TranslationBackend for LocalTransformersBackend {
        fn kind(&self) -> BackendKind {
            BackendKind::LocalTransformers
        }

        fn is_available(&self) -> bool {
            false
        }

        async fn translate(
            &self,
            _request: &TranslationRequest,
            _model: Option<&ModelIdentifier>,
        ) -> Result<TranslationResult, BackendError> {
            Err(BackendError::Unavailable(
                "built without the local-inference feature".to_string(),
            ))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_unavailable_even_when_opted_in() {
            let backend = LocalTransformersBackend::new(LocalPipelineConfig {
                enabled: true,
                ..Default::default()
            })
            .unwrap();
            assert!(!backend.is_available());
        }
    }
}

#[cfg(not(feature = "local-inference"))]
pub use stub::LocalTransformersBackend;
