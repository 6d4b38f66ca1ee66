//! A text classifier that maps words to vocabulary indices, runs an ONNX
//! model over the fixed-length index sequence and ranks the per-label scores.
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use emojiml::{Classifier, ModelBundle};
//!
//! // A bundle directory holds model.onnx, vocab.txt and labels.txt
//! let bundle = ModelBundle::open("path/to/bundle")?;
//! bundle.verify()?;
//!
//! let classifier = Classifier::builder()
//!     .with_bundle(&bundle)?
//!     .build()?;
//!
//! for result in classifier.classify("What a great day!")? {
//!     println!("{} ({}): {:.2}", result.label, result.id, result.confidence);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! The classifier can be shared across threads using `Arc`. Calls run in
//! parallel except for the model itself, which serves one call at a time.
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use emojiml::{Classifier, ModelBundle};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let classifier = Arc::new(Classifier::builder()
//!     .with_bundle(&ModelBundle::open_default()?)?
//!     .build()?);
//!
//! let mut handles = vec![];
//! for text in ["good", "bad", "meh"] {
//!     let classifier = Arc::clone(&classifier);
//!     handles.push(thread::spawn(move || {
//!         classifier.classify(text).unwrap();
//!     }));
//! }
//!
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//! # Ok(())
//! # }
//! ```

pub mod classifier;
mod runtime;
pub mod bundle;

pub use classifier::{
    Classifier, ClassifierBuilder, ClassifierError, ClassifierInfo, ClassificationResult,
    EncodedInput, EncoderConfig, InferenceEngine, OnnxEngine, RankerConfig, ResultRanker,
    Sentinel, TextEncoder, Vocabulary,
};
pub use runtime::{RuntimeConfig, create_session_builder};
pub use bundle::{ModelBundle, BundleError};

pub fn init_logger() {
    env_logger::init();
}
