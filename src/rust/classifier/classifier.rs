use std::fmt;
use std::sync::{Arc, Mutex};
use log::debug;

use super::encoder::{EncodedInput, TextEncoder};
use super::engine::InferenceEngine;
use super::error::ClassifierError;
use super::ranker::{ClassificationResult, ResultRanker};
use super::vocabulary::Vocabulary;

/// A thread-safe text classifier: encodes text with a fixed vocabulary, runs
/// the model and ranks the per-label scores.
///
/// # Thread Safety
///
/// `Classifier` is `Send + Sync`. The vocabulary and configuration are
/// read-only and shared freely. The inference engine sits behind a mutex
/// that is held only while the model runs, so concurrent `classify` calls
/// encode and rank in parallel but take turns on the engine.
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use emojiml::{Classifier, ClassifierError, EncodedInput, Vocabulary};
///
/// let vocabulary = Vocabulary::from_readers(
///     "<PAD> 0\n<START> 1\n<UNKNOWN> 2\ngood 3\n".as_bytes(),
///     "negative\npositive\n".as_bytes(),
/// )?;
/// let classifier = Classifier::builder()
///     .with_vocabulary(vocabulary)
///     .with_engine(|_: &EncodedInput| -> Result<Vec<f32>, ClassifierError> { Ok(vec![0.2, 0.8]) })?
///     .build()?;
///
/// let results = classifier.classify("good")?;
/// assert_eq!(results[0].label, "positive");
/// # Ok(())
/// # }
/// ```
pub struct Classifier {
    pub(crate) model_path: Option<String>,
    pub(crate) vocabulary: Arc<Vocabulary>,
    pub(crate) encoder: TextEncoder,
    pub(crate) ranker: ResultRanker,
    pub(crate) engine: Mutex<Box<dyn InferenceEngine>>,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Classifier>();
    }
};

impl fmt::Debug for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Classifier")
            .field("model_path", &self.model_path)
            .field("vocabulary", &self.vocabulary)
            .field("encoder", &self.encoder)
            .field("ranker", &self.ranker)
            .finish_non_exhaustive()
    }
}

impl Classifier {
    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::new()
    }

    /// Returns information about the classifier's current state
    pub fn info(&self) -> super::ClassifierInfo {
        super::ClassifierInfo {
            model_path: self.model_path.clone(),
            vocabulary_size: self.vocabulary.len(),
            labels: self.vocabulary.labels().to_vec(),
            sequence_length: self.encoder.sequence_length(),
            max_results: self.ranker.config().max_results,
            truncate_results: self.ranker.config().truncate,
        }
    }

    pub fn vocabulary(&self) -> &Arc<Vocabulary> {
        &self.vocabulary
    }

    /// Encodes text exactly as `classify` would, without running the model.
    pub fn encode(&self, text: &str) -> Result<EncodedInput, ClassifierError> {
        self.encoder.encode(text, &self.vocabulary)
    }

    /// Classifies `text`, returning labeled scores from most to least confident.
    ///
    /// # Errors
    /// - `MissingSentinel` if the vocabulary lacks a reserved token the text needs
    /// - `ModelError` if the inference engine fails
    /// - `PredictionError` if the engine returns the wrong number of scores
    pub fn classify(&self, text: &str) -> Result<Vec<ClassificationResult>, ClassifierError> {
        let input = self.encode(text)?;

        debug!("Classifying text ({} bytes)", text.len());
        let scores = {
            let mut engine = self.engine.lock()
                .map_err(|_| ClassifierError::PredictionError("Inference engine lock poisoned".into()))?;
            engine.run(&input)?
        };

        self.ranker.rank(&scores, self.vocabulary.labels())
    }

    /// Returns only the most confident result.
    pub fn predict(&self, text: &str) -> Result<ClassificationResult, ClassifierError> {
        self.classify(text)?
            .into_iter()
            .next()
            .ok_or_else(|| ClassifierError::PredictionError("No labels to rank".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use crate::RankerConfig;

    fn vocabulary() -> Vocabulary {
        let words: HashMap<String, i32> = [("<START>", 1), ("<PAD>", 0), ("<UNKNOWN>", 2), ("good", 3), ("bad", 4)]
            .into_iter()
            .map(|(w, i)| (w.to_string(), i))
            .collect();
        Vocabulary::new(words, vec!["negative".into(), "positive".into(), "neutral".into()])
    }

    /// Scores positive when the text starts with "good", negative otherwise.
    fn sentiment(input: &EncodedInput) -> Result<Vec<f32>, ClassifierError> {
        if input[[0, 1]] == 3 {
            Ok(vec![0.1, 0.7, 0.2])
        } else {
            Ok(vec![0.6, 0.1, 0.3])
        }
    }

    #[test]
    fn test_classify_orders_all_labels() {
        let classifier = Classifier::builder()
            .with_vocabulary(vocabulary())
            .with_engine(sentiment)
            .unwrap()
            .build()
            .unwrap();

        let results = classifier.classify("good movie").unwrap();
        let labels: Vec<_> = results.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["positive", "neutral", "negative"]);
        assert_eq!(results[0].id, "1");

        assert_eq!(classifier.predict("bad movie").unwrap().label, "negative");
    }

    #[test]
    fn test_classify_with_truncation() {
        let classifier = Classifier::builder()
            .with_vocabulary(vocabulary())
            .with_engine(sentiment)
            .unwrap()
            .with_ranker_config(RankerConfig { max_results: 1, truncate: true })
            .unwrap()
            .build()
            .unwrap();

        let results = classifier.classify("good").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].label, "positive");
    }

    #[test]
    fn test_engine_error_propagates() {
        let classifier = Classifier::builder()
            .with_vocabulary(vocabulary())
            .with_engine(|_: &EncodedInput| -> Result<Vec<f32>, ClassifierError> {
                Err(ClassifierError::ModelError("boom".into()))
            })
            .unwrap()
            .build()
            .unwrap();
        assert!(matches!(classifier.classify("good"), Err(ClassifierError::ModelError(_))));
    }

    #[test]
    fn test_poisoned_engine_lock() {
        let classifier = Arc::new(
            Classifier::builder()
                .with_vocabulary(vocabulary())
                .with_engine(|_: &EncodedInput| -> Result<Vec<f32>, ClassifierError> {
                    panic!("engine crashed")
                })
                .unwrap()
                .build()
                .unwrap(),
        );

        let crashed = {
            let classifier = Arc::clone(&classifier);
            std::thread::spawn(move || classifier.classify("good")).join()
        };
        assert!(crashed.is_err());

        let result = classifier.classify("good");
        assert!(matches!(result, Err(ClassifierError::PredictionError(_))));
    }

    #[test]
    fn test_info() {
        let classifier = Classifier::builder()
            .with_vocabulary(vocabulary())
            .with_engine(sentiment)
            .unwrap()
            .build()
            .unwrap();
        let info = classifier.info();
        assert_eq!(info.model_path, None);
        assert_eq!(info.vocabulary_size, 5);
        assert_eq!(info.labels.len(), 3);
        assert_eq!(info.sequence_length, 256);
        assert_eq!(info.max_results, 3);
        assert!(!info.truncate_results);
    }
}
