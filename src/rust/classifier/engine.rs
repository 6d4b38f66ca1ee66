use std::collections::HashMap;
use std::path::Path;
use ndarray::{ArrayViewD, Axis};
use ort::session::Session;
use ort::value::Tensor;
use log::{debug, info};

use super::encoder::EncodedInput;
use super::error::ClassifierError;
use crate::runtime::{create_session_builder, RuntimeConfig};

/// Runs the classification model on encoded text.
///
/// Implementations are handed one `[1, sequence_length]` batch at a time and
/// return one score per label, in label order. Calls are blocking. The
/// classifier never invokes `run` concurrently on the same engine.
pub trait InferenceEngine: Send {
    fn run(&mut self, input: &EncodedInput) -> Result<Vec<f32>, ClassifierError>;
}

impl<F> InferenceEngine for F
where
    F: FnMut(&EncodedInput) -> Result<Vec<f32>, ClassifierError> + Send,
{
    fn run(&mut self, input: &EncodedInput) -> Result<Vec<f32>, ClassifierError> {
        self(input)
    }
}

/// [`InferenceEngine`] backed by an ONNX Runtime session.
///
/// The model is expected to:
/// - Accept one `int32` input of shape `[batch_size, sequence_length]`
/// - Output `float32` scores of shape `[batch_size, num_labels]`
#[derive(Debug)]
pub struct OnnxEngine {
    session: Session,
    input_name: String,
}

impl OnnxEngine {
    /// Loads a model file into a new session.
    ///
    /// # Errors
    /// - `BuildError` if the file does not exist or the session cannot be created
    /// - `ModelError` if the model has no inputs or no outputs
    pub fn from_file<P: AsRef<Path>>(model_path: P, config: &RuntimeConfig) -> Result<Self, ClassifierError> {
        let model_path = model_path.as_ref();
        if !model_path.exists() {
            return Err(ClassifierError::BuildError(format!("Model file not found: {}", model_path.display())));
        }

        let session = create_session_builder(config)?.commit_from_file(model_path)?;
        let engine = Self::from_session(session)?;
        info!("Model loaded from {}", model_path.display());
        Ok(engine)
    }

    /// Wraps an existing session after checking its structure.
    pub fn from_session(session: Session) -> Result<Self, ClassifierError> {
        Self::validate_model(&session)?;
        let input_name = session.inputs[0].name.clone();
        Ok(Self { session, input_name })
    }

    fn validate_model(session: &Session) -> Result<(), ClassifierError> {
        if session.inputs.is_empty() {
            return Err(ClassifierError::ModelError("Model must have an input for token indices".to_string()));
        }
        if session.outputs.is_empty() {
            return Err(ClassifierError::ModelError("Model must have at least 1 output for label scores".to_string()));
        }
        Ok(())
    }
}

impl InferenceEngine for OnnxEngine {
    fn run(&mut self, input: &EncodedInput) -> Result<Vec<f32>, ClassifierError> {
        debug!("Running model on input of shape {:?}", input.shape());
        let input_dyn = input.clone().into_dyn();
        let input_ids = input_dyn.as_standard_layout();

        let mut input_tensors = HashMap::new();
        input_tensors.insert(self.input_name.as_str(), Tensor::from_array(&input_ids)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to create input tensor: {}", e)))?);

        let outputs = self.session.run(input_tensors)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to run model: {}", e)))?;
        let output_tensor = outputs[0].try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::ModelError(format!("Failed to extract output tensor: {}", e)))?;

        first_row(output_tensor.view())
    }
}

/// Scores for the single batch entry: the whole output when it is 1-D, the
/// first row otherwise.
fn first_row(output: ArrayViewD<'_, f32>) -> Result<Vec<f32>, ClassifierError> {
    match output.ndim() {
        0 => Err(ClassifierError::ModelError("Model produced a scalar output".into())),
        1 => Ok(output.iter().copied().collect()),
        _ if output.shape()[0] == 0 => {
            Err(ClassifierError::ModelError("Model produced an empty batch".into()))
        }
        _ => Ok(output.index_axis(Axis(0), 0).iter().copied().collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, ArrayD, IxDyn};

    #[test]
    fn test_missing_model_file() {
        let result = OnnxEngine::from_file("/nonexistent/model.onnx", &RuntimeConfig::default());
        assert!(matches!(result, Err(ClassifierError::BuildError(_))));
    }

    #[test]
    fn test_first_row() {
        let batch = ArrayD::from_shape_vec(IxDyn(&[2, 3]), vec![0.1, 0.2, 0.7, 9.0, 9.0, 9.0]).unwrap();
        assert_eq!(first_row(batch.view()).unwrap(), vec![0.1, 0.2, 0.7]);

        let flat = ArrayD::from_shape_vec(IxDyn(&[2]), vec![0.4, 0.6]).unwrap();
        assert_eq!(first_row(flat.view()).unwrap(), vec![0.4, 0.6]);

        let empty = ArrayD::<f32>::zeros(IxDyn(&[0, 3]));
        assert!(matches!(first_row(empty.view()), Err(ClassifierError::ModelError(_))));

        let scalar = ArrayD::from_elem(IxDyn(&[]), 1.0f32);
        assert!(matches!(first_row(scalar.view()), Err(ClassifierError::ModelError(_))));
    }

    #[test]
    fn test_closure_engine() {
        let mut calls = 0;
        let mut engine = |input: &EncodedInput| -> Result<Vec<f32>, ClassifierError> {
            calls += 1;
            Ok(vec![input[[0, 0]] as f32])
        };
        let input = Array2::from_shape_vec((1, 2), vec![4, 0]).unwrap();
        assert_eq!(InferenceEngine::run(&mut engine, &input).unwrap(), vec![4.0]);
        drop(engine);
        assert_eq!(calls, 1);
    }
}
