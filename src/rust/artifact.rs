use std::fs;
use std::io;
use std::path::Path;

use log::info;
use sha2::{Digest, Sha256};

use crate::classifier::LoadError;

/// Hex SHA-256 of a file's contents.
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Checks a model artifact against an expected SHA-256 before it is handed to
/// a runtime.
///
/// # Errors
/// - `ArtifactUnreadable` if the file cannot be read
/// - `ArtifactIncompatible` if the digest differs
pub fn verify_artifact(path: &Path, expected_hash: &str) -> Result<(), LoadError> {
    info!("Verifying artifact: {:?}", path);
    let actual = sha256_file(path).map_err(|e| LoadError::ArtifactUnreadable {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let expected = expected_hash.trim().to_ascii_lowercase();
    info!("Calculated hash: {}", actual);
    info!("Expected hash:   {}", expected);

    if actual != expected {
        return Err(LoadError::ArtifactIncompatible {
            path: path.to_path_buf(),
            message: format!("hash mismatch: expected {}, got {}", expected, actual),
        });
    }
    Ok(())
}
