use serde::Serialize;

mod error;
mod vocabulary;
mod encoder;
mod ranker;
mod engine;
mod classifier;
pub mod builder;

pub use error::ClassifierError;
pub use vocabulary::{Vocabulary, Sentinel, load_dictionary, load_labels};
pub use encoder::{TextEncoder, EncoderConfig, EncodedInput, split_words};
pub use ranker::{ResultRanker, RankerConfig, ClassificationResult};
pub use engine::{InferenceEngine, OnnxEngine};
pub use classifier::Classifier;
pub use builder::ClassifierBuilder;

/// Information about the current state and configuration of a classifier
#[derive(Debug, Clone, Serialize)]
pub struct ClassifierInfo {
    /// Path to the ONNX model file, when the engine was loaded from one
    pub model_path: Option<String>,
    /// Number of dictionary entries
    pub vocabulary_size: usize,
    /// Output labels, in model column order
    pub labels: Vec<String>,
    /// Length of every encoded sequence
    pub sequence_length: usize,
    /// Number of results callers are expected to show
    pub max_results: usize,
    /// Whether results are cut to `max_results`
    pub truncate_results: bool,
}
