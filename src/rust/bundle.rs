use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use sha2::{Digest, Sha256};

use crate::classifier::{ClassifierError, Vocabulary};

#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("Bundle directory not found: {0:?}")]
    NotFound(PathBuf),
    #[error("Bundle file missing: {0:?}")]
    MissingFile(PathBuf),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Malformed checksum entry on line {line}: {content:?}")]
    MalformedChecksum { line: usize, content: String },
    #[error("Hash mismatch: expected {expected}, got {actual} for {file_name}")]
    HashMismatch {
        file_name: String,
        expected: String,
        actual: String,
    },
}

/// A directory holding everything a classifier needs: the model, the
/// dictionary and the label list, plus optional SHA-256 checksums in
/// `sha256sum` format.
#[derive(Debug, Clone)]
pub struct ModelBundle {
    root: PathBuf,
}

impl ModelBundle {
    pub const MODEL_FILE: &'static str = "model.onnx";
    pub const VOCAB_FILE: &'static str = "vocab.txt";
    pub const LABELS_FILE: &'static str = "labels.txt";
    pub const CHECKSUM_FILE: &'static str = "checksums.sha256";

    /// Opens the bundle at `root`, requiring the model, vocabulary and label files.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, BundleError> {
        let bundle = Self { root: root.as_ref().to_path_buf() };
        if !bundle.root.is_dir() {
            return Err(BundleError::NotFound(bundle.root));
        }
        for path in bundle.required_files() {
            if !path.is_file() {
                log::error!("Bundle file missing: {:?}", path);
                return Err(BundleError::MissingFile(path));
            }
        }
        log::info!("Opened model bundle at {:?}", bundle.root);
        Ok(bundle)
    }

    /// Opens the bundle in [`ModelBundle::default_dir`].
    pub fn open_default() -> Result<Self, BundleError> {
        Self::open(Self::default_dir())
    }

    /// Returns the default bundle directory path
    pub fn default_dir() -> PathBuf {
        if let Ok(path) = env::var("EMOJIML_HOME") {
            return PathBuf::from(path).join("bundle");
        }
        if let Some(data_dir) = dirs::data_dir() {
            return data_dir.join("emojiml").join("bundle");
        }
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".emojiml").join("bundle");
        }
        env::temp_dir().join("emojiml").join("bundle")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn model_path(&self) -> PathBuf {
        self.root.join(Self::MODEL_FILE)
    }

    pub fn vocab_path(&self) -> PathBuf {
        self.root.join(Self::VOCAB_FILE)
    }

    pub fn labels_path(&self) -> PathBuf {
        self.root.join(Self::LABELS_FILE)
    }

    pub fn checksum_path(&self) -> PathBuf {
        self.root.join(Self::CHECKSUM_FILE)
    }

    fn required_files(&self) -> [PathBuf; 3] {
        [self.model_path(), self.vocab_path(), self.labels_path()]
    }

    /// Reads the dictionary and labels shipped with the bundle.
    pub fn load_vocabulary(&self) -> Result<Vocabulary, ClassifierError> {
        Vocabulary::from_files(self.vocab_path(), self.labels_path())
    }

    /// Checks every file listed in the checksum file against its SHA-256.
    ///
    /// A bundle without a checksum file passes with a warning.
    pub fn verify(&self) -> Result<(), BundleError> {
        let checksum_path = self.checksum_path();
        if !checksum_path.exists() {
            log::warn!("No checksum file at {:?}, skipping verification", checksum_path);
            return Ok(());
        }

        let content = fs::read_to_string(&checksum_path)?;
        for (number, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let (expected, file_name) = parse_checksum_line(line).ok_or_else(|| BundleError::MalformedChecksum {
                line: number + 1,
                content: line.to_string(),
            })?;

            let path = self.root.join(file_name);
            if !path.is_file() {
                return Err(BundleError::MissingFile(path));
            }
            let actual = file_sha256(&path)?;
            log::debug!("Verifying {}: expected {}, got {}", file_name, expected, actual);
            if !actual.eq_ignore_ascii_case(expected) {
                log::error!("{} hash mismatch: expected {}, got {}", file_name, expected, actual);
                return Err(BundleError::HashMismatch {
                    file_name: file_name.to_string(),
                    expected: expected.to_string(),
                    actual,
                });
            }
        }
        log::info!("Bundle at {:?} verified", self.root);
        Ok(())
    }

    /// Records the SHA-256 of the model, vocabulary and label files.
    pub fn write_checksums(&self) -> Result<(), BundleError> {
        let mut content = String::new();
        for name in [Self::MODEL_FILE, Self::VOCAB_FILE, Self::LABELS_FILE] {
            let hash = file_sha256(&self.root.join(name))?;
            content.push_str(&format!("{}  {}\n", hash, name));
        }
        fs::write(self.checksum_path(), content)?;
        log::info!("Wrote checksums to {:?}", self.checksum_path());
        Ok(())
    }
}

/// Accepts `<hex>  <name>` and the binary-mode `<hex> *<name>`. Names must be
/// plain file names inside the bundle.
fn parse_checksum_line(line: &str) -> Option<(&str, &str)> {
    let (hash, rest) = line.split_once(' ')?;
    let name = rest.strip_prefix(' ').or_else(|| rest.strip_prefix('*'))?.trim_end();
    let valid_hash = hash.len() == 64 && hash.bytes().all(|b| b.is_ascii_hexdigit());
    let valid_name = !name.is_empty() && !name.contains(['/', '\\']) && name != "." && name != "..";
    (valid_hash && valid_name).then_some((hash, name))
}

fn file_sha256(path: &Path) -> Result<String, BundleError> {
    let bytes = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_checksum_line() {
        let hash = "a".repeat(64);
        assert_eq!(parse_checksum_line(&format!("{}  vocab.txt", hash)), Some((hash.as_str(), "vocab.txt")));
        assert_eq!(parse_checksum_line(&format!("{} *model.onnx", hash)), Some((hash.as_str(), "model.onnx")));
        assert_eq!(parse_checksum_line(&format!("{}  ../secret", hash)), None);
        assert_eq!(parse_checksum_line("abc  vocab.txt"), None);
        assert_eq!(parse_checksum_line(&hash), None);
    }

    #[test]
    fn test_verify_accepts_uppercase_digest() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        for name in [ModelBundle::MODEL_FILE, ModelBundle::VOCAB_FILE, ModelBundle::LABELS_FILE] {
            fs::write(dir.path().join(name), name)?;
        }
        let bundle = ModelBundle::open(dir.path())?;
        let hash = file_sha256(&bundle.vocab_path())?.to_ascii_uppercase();
        fs::write(bundle.checksum_path(), format!("{}  {}\n", hash, ModelBundle::VOCAB_FILE))?;
        bundle.verify()?;
        Ok(())
    }

    #[test]
    fn test_default_dir() {
        env::set_var("EMOJIML_HOME", "/tmp/test-emojiml");
        let path = ModelBundle::default_dir();
        assert_eq!(path, PathBuf::from("/tmp/test-emojiml/bundle"));
        env::remove_var("EMOJIML_HOME");

        let path = ModelBundle::default_dir();
        assert!(path.ends_with("bundle"));
    }
}
