use ort::Error as OrtError;
use std::fmt;

use crate::bundle::BundleError;

/// Represents the different types of errors that can occur in the text classifier.
#[derive(Debug)]
pub enum ClassifierError {
    /// The vocabulary or label source could not be read or parsed
    VocabularyError(String),
    /// A reserved token (`<START>`, `<PAD>`, `<UNKNOWN>`) is required but absent from the vocabulary
    MissingSentinel(String),
    /// Error occurred while loading or running the ONNX model
    ModelError(String),
    /// Error occurred during the build phase
    BuildError(String),
    /// Error occurred while making predictions
    PredictionError(String),
    /// Error occurred due to invalid input parameters
    ValidationError(String),
    /// A model bundle file is missing or failed verification
    BundleError(BundleError),
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VocabularyError(msg) => write!(f, "Vocabulary error: {}", msg),
            Self::MissingSentinel(token) => write!(f, "Vocabulary has no entry for reserved token {}", token),
            Self::ModelError(msg) => write!(f, "Model error: {}", msg),
            Self::BuildError(msg) => write!(f, "Build error: {}", msg),
            Self::PredictionError(msg) => write!(f, "Prediction error: {}", msg),
            Self::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            Self::BundleError(err) => write!(f, "Bundle error: {}", err),
        }
    }
}

impl std::error::Error for ClassifierError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::BundleError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<OrtError> for ClassifierError {
    fn from(err: OrtError) -> Self {
        ClassifierError::BuildError(err.to_string())
    }
}

impl From<BundleError> for ClassifierError {
    fn from(err: BundleError) -> Self {
        ClassifierError::BundleError(err)
    }
}
