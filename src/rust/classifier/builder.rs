use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex};
use log::{info, warn};

use super::classifier::Classifier;
use super::encoder::{EncoderConfig, TextEncoder};
use super::engine::{InferenceEngine, OnnxEngine};
use super::error::ClassifierError;
use super::ranker::{RankerConfig, ResultRanker};
use super::vocabulary::{Sentinel, Vocabulary};
use crate::{bundle::ModelBundle, runtime::RuntimeConfig};

/// A builder for constructing a Classifier with a fluent interface.
///
/// A classifier needs a vocabulary (dictionary plus labels) and an
/// inference engine. Everything else has defaults: sequences of 256
/// positions and every label returned in ranked order.
#[derive(Default)]
pub struct ClassifierBuilder {
    model_path: Option<String>,
    engine: Option<Box<dyn InferenceEngine>>,
    vocabulary: Option<Arc<Vocabulary>>,
    encoder_config: EncoderConfig,
    ranker_config: RankerConfig,
    runtime_config: RuntimeConfig,
}

impl fmt::Debug for ClassifierBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifierBuilder")
            .field("model_path", &self.model_path)
            .field("has_engine", &self.engine.is_some())
            .field("vocabulary", &self.vocabulary)
            .field("encoder_config", &self.encoder_config)
            .field("ranker_config", &self.ranker_config)
            .field("runtime_config", &self.runtime_config)
            .finish()
    }
}

impl ClassifierBuilder {
    /// Creates a new empty ClassifierBuilder instance with default configuration
    ///
    /// # Example
    /// ```
    /// use emojiml::ClassifierBuilder;
    ///
    /// let builder = ClassifierBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime configuration for ONNX model execution.
    /// Must be called before [`ClassifierBuilder::with_model`] to take effect.
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Loads an ONNX model file as the inference engine
    ///
    /// # Returns
    /// * `Result<Self, ClassifierError>` - The builder instance if successful, or an error if:
    ///   - The path is empty
    ///   - An engine is already set
    ///   - The file doesn't exist or fails to load
    ///   - The model structure is invalid
    pub fn with_model<P: AsRef<Path>>(mut self, model_path: P) -> Result<Self, ClassifierError> {
        let model_path = model_path.as_ref();
        if model_path.as_os_str().is_empty() {
            return Err(ClassifierError::BuildError("Model path cannot be empty".to_string()));
        }
        if self.engine.is_some() {
            return Err(ClassifierError::BuildError("Inference engine already set".to_string()));
        }

        let engine = OnnxEngine::from_file(model_path, &self.runtime_config)?;
        info!("Model structure validated successfully");

        self.model_path = Some(model_path.to_string_lossy().to_string());
        self.engine = Some(Box::new(engine));
        Ok(self)
    }

    /// Uses a caller-supplied inference engine instead of an ONNX model.
    ///
    /// # Errors
    /// - `BuildError` if an engine is already set
    pub fn with_engine<E: InferenceEngine + 'static>(mut self, engine: E) -> Result<Self, ClassifierError> {
        if self.engine.is_some() {
            return Err(ClassifierError::BuildError("Inference engine already set".to_string()));
        }
        self.engine = Some(Box::new(engine));
        Ok(self)
    }

    pub fn with_vocabulary(mut self, vocabulary: impl Into<Arc<Vocabulary>>) -> Self {
        self.vocabulary = Some(vocabulary.into());
        self
    }

    /// Reads the dictionary and label files.
    pub fn with_vocabulary_files<P: AsRef<Path>, Q: AsRef<Path>>(
        self,
        dictionary_path: P,
        labels_path: Q,
    ) -> Result<Self, ClassifierError> {
        let vocabulary = Vocabulary::from_files(dictionary_path, labels_path)?;
        Ok(self.with_vocabulary(vocabulary))
    }

    /// Loads the vocabulary, labels and model of a bundle.
    pub fn with_bundle(self, bundle: &ModelBundle) -> Result<Self, ClassifierError> {
        let vocabulary = bundle.load_vocabulary()?;
        self.with_vocabulary(vocabulary).with_model(bundle.model_path())
    }

    pub fn with_encoder_config(mut self, config: EncoderConfig) -> Result<Self, ClassifierError> {
        if config.sequence_length == 0 {
            return Err(ClassifierError::ValidationError("Sequence length must be at least 1".into()));
        }
        self.encoder_config = config;
        Ok(self)
    }

    /// Sets the number of positions in every encoded sequence.
    pub fn with_sequence_length(self, sequence_length: usize) -> Result<Self, ClassifierError> {
        let config = EncoderConfig {
            sequence_length,
            ..self.encoder_config.clone()
        };
        self.with_encoder_config(config)
    }

    /// Pads the final sequence position as well, instead of leaving it at 0.
    pub fn pad_final_position(mut self, enabled: bool) -> Self {
        self.encoder_config.pad_final_position = enabled;
        self
    }

    pub fn with_ranker_config(mut self, config: RankerConfig) -> Result<Self, ClassifierError> {
        if config.max_results == 0 {
            return Err(ClassifierError::ValidationError("Maximum number of results must be at least 1".into()));
        }
        self.ranker_config = config;
        Ok(self)
    }

    /// Returns at most `max_results` results per call.
    pub fn with_top_k(self, max_results: usize) -> Result<Self, ClassifierError> {
        self.with_ranker_config(RankerConfig { max_results, truncate: true })
    }

    /// Builds and returns the final Classifier instance
    ///
    /// # Returns
    /// * `Result<Classifier, ClassifierError>` - The constructed Classifier if successful, or an error if:
    ///   - No inference engine is set
    ///   - No vocabulary is set
    ///   - The vocabulary has no labels
    pub fn build(self) -> Result<Classifier, ClassifierError> {
        let engine = self.engine
            .ok_or_else(|| ClassifierError::BuildError("An inference engine must be set".to_string()))?;
        let vocabulary = self.vocabulary
            .ok_or_else(|| ClassifierError::BuildError("A vocabulary must be set".to_string()))?;
        if vocabulary.label_count() == 0 {
            return Err(ClassifierError::BuildError("At least one label must be loaded".to_string()));
        }

        for sentinel in [Sentinel::Pad, Sentinel::Unknown] {
            if !vocabulary.contains(sentinel.as_str()) {
                warn!("Vocabulary has no {} entry; classification will fail when it is needed", sentinel.as_str());
            }
        }

        info!(
            "Classifier ready: {} words, {} labels, sequence length {}",
            vocabulary.len(),
            vocabulary.label_count(),
            self.encoder_config.sequence_length
        );

        Ok(Classifier {
            model_path: self.model_path,
            vocabulary,
            encoder: TextEncoder::new(self.encoder_config),
            ranker: ResultRanker::new(self.ranker_config),
            engine: Mutex::new(engine),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EncodedInput;

    fn vocabulary() -> Vocabulary {
        Vocabulary::from_readers("<PAD> 0\n<UNKNOWN> 1\n".as_bytes(), "only\n".as_bytes()).unwrap()
    }

    fn constant(_: &EncodedInput) -> Result<Vec<f32>, ClassifierError> {
        Ok(vec![1.0])
    }

    #[test]
    fn test_build_requires_engine_and_vocabulary() {
        assert!(matches!(
            ClassifierBuilder::new().with_vocabulary(vocabulary()).build(),
            Err(ClassifierError::BuildError(_))
        ));
        assert!(matches!(
            ClassifierBuilder::new().with_engine(constant).unwrap().build(),
            Err(ClassifierError::BuildError(_))
        ));
    }

    #[test]
    fn test_build_requires_labels() {
        let empty = Vocabulary::from_readers("<PAD> 0\n".as_bytes(), "".as_bytes()).unwrap();
        let result = ClassifierBuilder::new().with_vocabulary(empty).with_engine(constant).unwrap().build();
        assert!(matches!(result, Err(ClassifierError::BuildError(_))));
    }

    #[test]
    fn test_engine_set_twice() {
        let result = ClassifierBuilder::new()
            .with_engine(constant)
            .unwrap()
            .with_engine(constant);
        assert!(matches!(result, Err(ClassifierError::BuildError(_))));
    }

    #[test]
    fn test_config_validation() {
        assert!(matches!(
            ClassifierBuilder::new().with_sequence_length(0),
            Err(ClassifierError::ValidationError(_))
        ));
        assert!(matches!(
            ClassifierBuilder::new().with_top_k(0),
            Err(ClassifierError::ValidationError(_))
        ));
    }

    #[test]
    fn test_encoder_settings_reach_classifier() {
        let classifier = ClassifierBuilder::new()
            .with_vocabulary(vocabulary())
            .with_engine(constant)
            .unwrap()
            .pad_final_position(true)
            .with_sequence_length(3)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(classifier.encode("").unwrap().row(0).to_vec(), vec![0, 0, 0]);
        assert_eq!(classifier.encode("x").unwrap().row(0).to_vec(), vec![1, 0, 0]);
    }
}
