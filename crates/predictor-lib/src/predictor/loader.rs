//! Model artifact loading
//!
//! Reads the artifact once at startup, verifies its checksum when one is
//! configured, picks the backend from the file extension and checks the model
//! against the patient schema. Every failure here is a `ModelLoad` error.

use super::{Classifier, LogisticClassifier, OnnxClassifier, PredictorAdapter};
use crate::error::{PredictorError, Result};
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{error, info};

/// Supported artifact formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Onnx,
    Logistic,
}

impl ModelFormat {
    /// Infer the format from the file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "onnx" => Some(ModelFormat::Onnx),
            "json" => Some(ModelFormat::Logistic),
            _ => None,
        }
    }
}

/// Calculate SHA256 checksum of data
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Load the model artifact and wrap it in an adapter
pub fn load_model(path: &Path, expected_sha256: Option<&str>) -> Result<PredictorAdapter> {
    let result = load_model_inner(path, expected_sha256);
    match &result {
        Ok(adapter) => info!(
            path = %path.display(),
            format = %adapter.info().format,
            version = %adapter.info().version,
            "Model loaded"
        ),
        Err(e) => error!(path = %path.display(), error = %e, code = e.code(), "Model load failed"),
    }
    result
}

fn load_model_inner(path: &Path, expected_sha256: Option<&str>) -> Result<PredictorAdapter> {
    let format = ModelFormat::from_path(path).ok_or_else(|| {
        PredictorError::model_load(path, "unsupported file extension, expected .onnx or .json")
    })?;

    let bytes = std::fs::read(path).map_err(|e| PredictorError::model_load(path, e))?;
    if bytes.is_empty() {
        return Err(PredictorError::model_load(path, "artifact is empty"));
    }

    let checksum = sha256_hex(&bytes);
    if let Some(expected) = expected_sha256 {
        if !checksum.eq_ignore_ascii_case(expected.trim()) {
            return Err(PredictorError::model_load(
                path,
                format!("checksum mismatch: expected {}, got {}", expected, checksum),
            ));
        }
    }

    let classifier: Box<dyn Classifier> = match format {
        ModelFormat::Onnx => {
            let version = checksum[..12].to_string();
            let model = OnnxClassifier::from_bytes(&bytes, version)
                .map_err(|e| PredictorError::model_load(path, format!("{:#}", e)))?;
            Box::new(model)
        }
        ModelFormat::Logistic => {
            let model = LogisticClassifier::from_json(&bytes)
                .map_err(|e| PredictorError::model_load(path, format!("{:#}", e)))?;
            Box::new(model)
        }
    };

    let adapter = PredictorAdapter::new(classifier)
        .map_err(|e| PredictorError::model_load(path, format!("schema check failed: {}", e)))?;

    Ok(adapter.with_checksum(checksum))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::LOGISTIC_ARTIFACT;
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_artifact(dir: &TempDir, name: &str, contents: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents).unwrap();
        path
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ModelFormat::from_path(Path::new("m.onnx")), Some(ModelFormat::Onnx));
        assert_eq!(ModelFormat::from_path(Path::new("m.JSON")), Some(ModelFormat::Logistic));
        assert_eq!(ModelFormat::from_path(Path::new("m.pkl")), None);
        assert_eq!(ModelFormat::from_path(Path::new("model")), None);
    }

    #[test]
    fn test_sha256_known_value() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_load_logistic_artifact() {
        let dir = TempDir::new().unwrap();
        let path = write_artifact(&dir, "model.json", LOGISTIC_ARTIFACT.as_bytes());

        let adapter = load_model(&path, None).unwrap();
        assert_eq!(adapter.info().format, "logistic");
        assert_eq!(
            adapter.info().sha256.as_deref(),
            Some(sha256_hex(LOGISTIC_ARTIFACT.as_bytes()).as_str())
        );
    }

    #[test]
    fn test_checksum_verified() {
        let dir = TempDir::new().unwrap();
        let path = write_artifact(&dir, "model.json", LOGISTIC_ARTIFACT.as_bytes());
        let good = sha256_hex(LOGISTIC_ARTIFACT.as_bytes()).to_uppercase();

        assert!(load_model(&path, Some(good.as_str())).is_ok());

        let err = load_model(&path, Some("00ff")).unwrap_err();
        assert_eq!(err.code(), "MODEL_LOAD_FAILURE");
        assert!(err.to_string().contains("checksum mismatch"));
    }

    #[test]
    fn test_missing_file_is_load_failure() {
        let dir = TempDir::new().unwrap();
        let err = load_model(&dir.path().join("absent.onnx"), None).unwrap_err();
        assert_eq!(err.code(), "MODEL_LOAD_FAILURE");
    }

    #[test]
    fn test_corrupt_onnx_is_load_failure() {
        let dir = TempDir::new().unwrap();
        let path = write_artifact(&dir, "model.onnx", b"\xde\xad\xbe\xef not a model");
        let err = load_model(&path, None).unwrap_err();
        assert_eq!(err.code(), "MODEL_LOAD_FAILURE");
    }

    #[test]
    fn test_unsupported_extension_is_load_failure() {
        let dir = TempDir::new().unwrap();
        let path = write_artifact(&dir, "best_diabetes_model.pkl", b"\x80\x04pickle");
        let err = load_model(&path, None).unwrap_err();
        assert!(err.to_string().contains("unsupported file extension"));
    }

    #[test]
    fn test_schema_mismatch_is_load_failure() {
        let dir = TempDir::new().unwrap();
        let swapped = LOGISTIC_ARTIFACT.replacen("\"Pregnancies\", \"Glucose\"", "\"Glucose\", \"Pregnancies\"", 1);
        assert_ne!(swapped, LOGISTIC_ARTIFACT);
        let path = write_artifact(&dir, "model.json", swapped.as_bytes());

        let err = load_model(&path, None).unwrap_err();
        assert_eq!(err.code(), "MODEL_LOAD_FAILURE");
        assert!(err.to_string().contains("schema check failed"));
    }

    #[test]
    fn test_empty_artifact_is_load_failure() {
        let dir = TempDir::new().unwrap();
        let path = write_artifact(&dir, "model.json", b"");
        assert_eq!(load_model(&path, None).unwrap_err().code(), "MODEL_LOAD_FAILURE");
    }
}
