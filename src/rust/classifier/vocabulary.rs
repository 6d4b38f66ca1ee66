use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use log::{debug, info};

use super::error::ClassifierError;

/// Reserved vocabulary entries with a special meaning during encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sentinel {
    /// Written at position 0 when present in the vocabulary
    Start,
    /// Fills the positions after the last token
    Pad,
    /// Stands in for any token the vocabulary does not contain
    Unknown,
}

impl Sentinel {
    /// The literal key this sentinel is stored under in the vocabulary file
    pub const fn as_str(self) -> &'static str {
        match self {
            Sentinel::Start => "<START>",
            Sentinel::Pad => "<PAD>",
            Sentinel::Unknown => "<UNKNOWN>",
        }
    }
}

/// Immutable word-to-index mapping plus the ordered list of output labels.
///
/// The position of a label in [`Vocabulary::labels`] is the model output
/// column holding its score. A `Vocabulary` is built once and shared
/// read-only, usually behind an `Arc`.
///
/// ```
/// use emojiml::Vocabulary;
///
/// let vocab = Vocabulary::from_readers(
///     "<PAD> 0\n<START> 1\n<UNKNOWN> 2\ngood 3\n".as_bytes(),
///     "negative\npositive\n".as_bytes(),
/// ).unwrap();
/// assert_eq!(vocab.index_of("good"), Some(3));
/// assert_eq!(vocab.labels(), ["negative", "positive"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    words: HashMap<String, i32>,
    labels: Vec<String>,
}

impl Vocabulary {
    pub fn new(words: HashMap<String, i32>, labels: Vec<String>) -> Self {
        Self { words, labels }
    }

    /// Parses a dictionary source and a label source.
    pub fn from_readers<V: BufRead, L: BufRead>(dictionary: V, labels: L) -> Result<Self, ClassifierError> {
        let words = load_dictionary(dictionary)?;
        info!("Dictionary loaded ({} entries)", words.len());
        let labels = load_labels(labels)?;
        info!("Labels loaded ({} labels)", labels.len());
        Ok(Self::new(words, labels))
    }

    /// Reads the dictionary and label files from disk.
    ///
    /// # Errors
    /// - `VocabularyError` if either file cannot be opened or read
    /// - `VocabularyError` if a dictionary line carries a non-numeric index
    pub fn from_files<P: AsRef<Path>, Q: AsRef<Path>>(
        dictionary_path: P,
        labels_path: Q,
    ) -> Result<Self, ClassifierError> {
        let open = |path: &Path| {
            File::open(path)
                .map(BufReader::new)
                .map_err(|e| ClassifierError::VocabularyError(format!("Failed to open {}: {}", path.display(), e)))
        };
        Self::from_readers(open(dictionary_path.as_ref())?, open(labels_path.as_ref())?)
    }

    pub fn index_of(&self, word: &str) -> Option<i32> {
        self.words.get(word).copied()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains_key(word)
    }

    /// Looks up a reserved token, failing when the vocabulary lacks it.
    pub fn sentinel(&self, sentinel: Sentinel) -> Result<i32, ClassifierError> {
        self.index_of(sentinel.as_str())
            .ok_or_else(|| ClassifierError::MissingSentinel(sentinel.as_str().to_string()))
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    /// Number of dictionary entries.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Reads `"<word> <index>"` lines into a map.
///
/// Fields are separated by a single space and trailing empty fields are
/// dropped. Lines left with fewer than two fields are skipped. A later line
/// for the same word overwrites the earlier index.
///
/// # Errors
/// - `VocabularyError` if the source cannot be read
/// - `VocabularyError` if the second field of a line is not an integer
pub fn load_dictionary<R: BufRead>(reader: R) -> Result<HashMap<String, i32>, ClassifierError> {
    let mut words = HashMap::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| ClassifierError::VocabularyError(format!("Failed to read dictionary: {}", e)))?;

        let mut fields: Vec<&str> = line.split(' ').collect();
        while fields.last().is_some_and(|field| field.is_empty()) {
            fields.pop();
        }
        if fields.len() < 2 {
            debug!("Skipping dictionary line {}: {:?}", number + 1, line);
            continue;
        }

        let index = fields[1].parse::<i32>().map_err(|e| {
            ClassifierError::VocabularyError(format!(
                "Invalid index {:?} on dictionary line {}: {}",
                fields[1],
                number + 1,
                e
            ))
        })?;
        words.insert(fields[0].to_string(), index);
    }
    Ok(words)
}

/// Reads one label per line, in file order.
///
/// A trailing empty line (`"a\nb\n\n"`) yields an empty label; a final
/// line without a terminator is kept as is.
pub fn load_labels<R: BufRead>(reader: R) -> Result<Vec<String>, ClassifierError> {
    reader
        .lines()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ClassifierError::VocabularyError(format!("Failed to read labels: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dictionary_skips_short_lines() {
        let words = load_dictionary("only-one-field\ngood 3\n\n".as_bytes()).unwrap();
        assert_eq!(words.len(), 1);
        assert_eq!(words["good"], 3);
    }

    #[test]
    fn test_dictionary_rejects_non_numeric_index() {
        let result = load_dictionary("good 3\nbad notanumber\n".as_bytes());
        match result {
            Err(ClassifierError::VocabularyError(msg)) => assert!(msg.contains("line 2")),
            other => panic!("expected a vocabulary error, got {:?}", other),
        }
    }

    #[test]
    fn test_dictionary_last_occurrence_wins() {
        let words = load_dictionary("good 3\ngood 7\n".as_bytes()).unwrap();
        assert_eq!(words["good"], 7);
    }

    #[test]
    fn test_dictionary_field_splitting() {
        // Trailing separators do not count as fields, extra fields are ignored,
        // and a leading separator maps the empty word.
        let words = load_dictionary("word \nthree 3 extra\n 9\n".as_bytes()).unwrap();
        assert!(!words.contains_key("word"));
        assert_eq!(words["three"], 3);
        assert_eq!(words[""], 9);

        // A doubled separator makes the index field empty.
        assert!(load_dictionary("two  2\n".as_bytes()).is_err());
    }

    #[test]
    fn test_labels_keep_order_and_duplicates() {
        let labels = load_labels("b\na\nb".as_bytes()).unwrap();
        assert_eq!(labels, vec!["b", "a", "b"]);
    }

    #[test]
    fn test_labels_trailing_empty_line() {
        assert_eq!(load_labels("a\nb\n".as_bytes()).unwrap(), vec!["a", "b"]);
        assert_eq!(load_labels("a\nb\n\n".as_bytes()).unwrap(), vec!["a", "b", ""]);
        assert_eq!(load_labels("a\r\nb\r\n".as_bytes()).unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_missing_sentinel() {
        let vocab = Vocabulary::from_readers("good 3\n".as_bytes(), "x\n".as_bytes()).unwrap();
        assert!(matches!(vocab.sentinel(Sentinel::Pad), Err(ClassifierError::MissingSentinel(t)) if t == "<PAD>"));
    }
}
