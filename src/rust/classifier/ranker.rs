use std::cmp::Ordering;
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;

/// One labeled score produced by a classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Position of the label in the label list, as a string
    pub id: String,
    pub label: String,
    pub confidence: f32,
}

impl ClassificationResult {
    pub fn new(id: impl Into<String>, label: impl Into<String>, confidence: f32) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            confidence,
        }
    }
}

/// Settings for ordering and capping results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankerConfig {
    /// Number of results a caller is expected to show
    pub max_results: usize,
    /// Cut the ranked list to `max_results` entries. Off by default, in which
    /// case every label is returned.
    pub truncate: bool,
}

impl RankerConfig {
    pub const DEFAULT_MAX_RESULTS: usize = 3;
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            max_results: Self::DEFAULT_MAX_RESULTS,
            truncate: false,
        }
    }
}

/// Orders per-label scores from most to least confident.
#[derive(Debug, Clone, Default)]
pub struct ResultRanker {
    config: RankerConfig,
}

impl ResultRanker {
    pub fn new(config: RankerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RankerConfig {
        &self.config
    }

    /// Pairs each score with its label and sorts by descending confidence.
    ///
    /// Equal confidences keep label order. NaN ranks above every number.
    ///
    /// # Errors
    /// - `PredictionError` if `scores` and `labels` differ in length
    pub fn rank(&self, scores: &[f32], labels: &[String]) -> Result<Vec<ClassificationResult>, ClassifierError> {
        if scores.len() != labels.len() {
            return Err(ClassifierError::PredictionError(format!(
                "Model produced {} scores for {} labels",
                scores.len(),
                labels.len()
            )));
        }

        let mut candidates: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
        candidates.sort_by(|a, b| by_confidence(a, b));

        if self.config.truncate {
            candidates.truncate(self.config.max_results);
        }

        Ok(candidates
            .into_iter()
            .map(|(i, confidence)| ClassificationResult::new(i.to_string(), labels[i].clone(), confidence))
            .collect())
    }
}

/// Descending confidence, then ascending index. Every NaN, whatever its sign
/// bit, counts as equal to other NaNs and greater than any number.
fn by_confidence(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    let by_score = match (a.1.is_nan(), b.1.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => b.1.total_cmp(&a.1),
    };
    by_score.then(a.0.cmp(&b.0))
}
