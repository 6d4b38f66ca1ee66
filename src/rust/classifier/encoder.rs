use ndarray::Array2;

use super::error::ClassifierError;
use super::vocabulary::{Sentinel, Vocabulary};

/// Characters that end a token. Each occurrence is a delimiter of its own.
const DELIMITERS: [char; 6] = [' ', ',', '.', '!', '?', '\n'];

/// Model input for a single text: shape `[1, sequence_length]`.
pub type EncodedInput = Array2<i32>;

/// Settings for turning text into model input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Fixed number of positions in every encoded sequence
    pub sequence_length: usize,
    /// Whether padding also covers the last position.
    ///
    /// When `false` the final position keeps its initial value (0) unless a
    /// token landed there.
    pub pad_final_position: bool,
}

impl EncoderConfig {
    pub const DEFAULT_SEQUENCE_LENGTH: usize = 256;
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            sequence_length: Self::DEFAULT_SEQUENCE_LENGTH,
            pad_final_position: false,
        }
    }
}

/// Splits text into word tokens.
///
/// Consecutive delimiters produce empty tokens, which are kept except at the
/// end of the text: trailing empty tokens are dropped, so `""` and `"?!"`
/// produce no tokens at all.
pub fn split_words(text: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = text.split(&DELIMITERS[..]).collect();
    while tokens.last().is_some_and(|token| token.is_empty()) {
        tokens.pop();
    }
    tokens
}

/// Maps text onto a fixed-length sequence of vocabulary indices.
#[derive(Debug, Clone, Default)]
pub struct TextEncoder {
    config: EncoderConfig,
}

impl TextEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    pub fn sequence_length(&self) -> usize {
        self.config.sequence_length
    }

    /// Encodes `text` as a batch of one sequence.
    ///
    /// The sequence starts with `<START>` when the vocabulary has it, then one
    /// index per token (`<UNKNOWN>` for words not in the vocabulary) until the
    /// sequence is full, then `<PAD>` up to the last position.
    ///
    /// # Errors
    /// - `MissingSentinel` if the vocabulary has no `<PAD>` entry
    /// - `MissingSentinel` if a token is unknown and the vocabulary has no `<UNKNOWN>` entry
    pub fn encode(&self, text: &str, vocabulary: &Vocabulary) -> Result<EncodedInput, ClassifierError> {
        let length = self.config.sequence_length;
        let pad = vocabulary.sentinel(Sentinel::Pad)?;
        let mut sequence = vec![0i32; length];
        let mut cursor = 0;

        if let Some(start) = vocabulary.index_of(Sentinel::Start.as_str()) {
            if length > 0 {
                sequence[cursor] = start;
                cursor += 1;
            }
        }

        for word in split_words(text) {
            if cursor >= length {
                break;
            }
            sequence[cursor] = match vocabulary.index_of(word) {
                Some(index) => index,
                None => vocabulary.sentinel(Sentinel::Unknown)?,
            };
            cursor += 1;
        }

        let pad_end = if self.config.pad_final_position {
            length
        } else {
            length.saturating_sub(1)
        };
        if cursor < pad_end {
            sequence[cursor..pad_end].fill(pad);
        }

        Array2::from_shape_vec((1, length), sequence)
            .map_err(|e| ClassifierError::PredictionError(format!("Failed to shape encoded input: {}", e)))
    }
}
