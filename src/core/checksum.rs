/*!
 * Streaming content digests for artifact integrity metadata
 */

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{DistroError, Result};

/// Digest written to an artifact's checksum field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// What the launcher checks today
    #[default]
    Md5,
    Sha256,
    Blake3,
}

impl HashAlgorithm {
    /// Length of the lowercase hex digest
    pub fn hex_len(&self) -> usize {
        match self {
            HashAlgorithm::Md5 => 32,
            HashAlgorithm::Sha256 | HashAlgorithm::Blake3 => 64,
        }
    }

    /// All-zero checksum recorded for files that could not be read
    pub fn sentinel(&self) -> String {
        "0".repeat(self.hex_len())
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::Md5 => write!(f, "md5"),
            HashAlgorithm::Sha256 => write!(f, "sha256"),
            HashAlgorithm::Blake3 => write!(f, "blake3"),
        }
    }
}

impl std::str::FromStr for HashAlgorithm {
    type Err = DistroError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "md5" => Ok(HashAlgorithm::Md5),
            "sha256" | "sha-256" => Ok(HashAlgorithm::Sha256),
            "blake3" => Ok(HashAlgorithm::Blake3),
            other => Err(DistroError::Config(format!("unknown hash algorithm: {}", other))),
        }
    }
}

/// Size and checksum of one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDigest {
    pub size: u64,
    pub checksum: String,
}

/// Streaming hasher over any supported algorithm
pub enum StreamingHasher {
    Md5(md5::Md5),
    Sha256(Sha256),
    Blake3(Box<blake3::Hasher>),
}

impl StreamingHasher {
    /// Create a new streaming hasher
    pub fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Md5 => StreamingHasher::Md5(md5::Md5::new()),
            HashAlgorithm::Sha256 => StreamingHasher::Sha256(Sha256::new()),
            HashAlgorithm::Blake3 => StreamingHasher::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    /// Update the hash with new data
    pub fn update(&mut self, data: &[u8]) {
        match self {
            StreamingHasher::Md5(h) => h.update(data),
            StreamingHasher::Sha256(h) => h.update(data),
            StreamingHasher::Blake3(h) => {
                h.update(data);
            }
        }
    }

    /// Finalize into a lowercase hex string
    pub fn finalize_hex(self) -> String {
        match self {
            StreamingHasher::Md5(h) => hex::encode(h.finalize()),
            StreamingHasher::Sha256(h) => hex::encode(h.finalize()),
            StreamingHasher::Blake3(h) => h.finalize().to_hex().to_string(),
        }
    }
}

/// Compute size and checksum of a file in 64 KiB reads
pub fn compute_digest(path: &Path, algorithm: HashAlgorithm) -> Result<FileDigest> {
    let mut file = BufReader::new(File::open(path)?);
    let mut hasher = StreamingHasher::new(algorithm);
    let mut buffer = [0u8; 64 * 1024];
    let mut size = 0u64;

    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
        size += n as u64;
    }

    Ok(FileDigest {
        size,
        checksum: hasher.finalize_hex(),
    })
}

/// Checksum of an in-memory buffer
pub fn digest_bytes(data: &[u8], algorithm: HashAlgorithm) -> String {
    let mut hasher = StreamingHasher::new(algorithm);
    hasher.update(data);
    hasher.finalize_hex()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_known_digests() {
        assert_eq!(
            digest_bytes(b"hello world", HashAlgorithm::Md5),
            "5eb63bbbe01eeed093cb22bb8f5acdc3"
        );
        assert_eq!(
            digest_bytes(b"hello world", HashAlgorithm::Sha256),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
        assert_eq!(digest_bytes(b"", HashAlgorithm::Blake3).len(), 64);
    }

    #[test]
    fn test_streaming_matches_one_shot() {
        let mut hasher = StreamingHasher::new(HashAlgorithm::Md5);
        hasher.update(b"hello ");
        hasher.update(b"world");
        assert_eq!(
            hasher.finalize_hex(),
            digest_bytes(b"hello world", HashAlgorithm::Md5)
        );
    }

    #[test]
    fn test_compute_digest() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"test data").unwrap();
        temp.flush().unwrap();

        let digest = compute_digest(temp.path(), HashAlgorithm::Md5).unwrap();
        assert_eq!(digest.size, 9);
        assert_eq!(digest.checksum, digest_bytes(b"test data", HashAlgorithm::Md5));

        let digest = compute_digest(temp.path(), HashAlgorithm::Sha256).unwrap();
        assert_eq!(digest.checksum.len(), 64);
    }

    #[test]
    fn test_larger_than_buffer() {
        let data = vec![7u8; 64 * 1024 * 2 + 17];
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(&data).unwrap();
        temp.flush().unwrap();

        let digest = compute_digest(temp.path(), HashAlgorithm::Blake3).unwrap();
        assert_eq!(digest.size, data.len() as u64);
        assert_eq!(digest.checksum, digest_bytes(&data, HashAlgorithm::Blake3));
    }

    #[test]
    fn test_missing_file() {
        let err = compute_digest(Path::new("/definitely/not/here.jar"), HashAlgorithm::Md5)
            .unwrap_err();
        assert!(matches!(err, DistroError::Io(_)));
    }

    #[test]
    fn test_sentinel_and_parse() {
        assert_eq!(HashAlgorithm::Md5.sentinel(), "0".repeat(32));
        assert_eq!(HashAlgorithm::Blake3.sentinel().len(), 64);
        assert_eq!("SHA256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert!("crc32".parse::<HashAlgorithm>().is_err());
    }
}
