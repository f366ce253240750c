//! Streaming SHA-256 over quarantined files.

use std::io;
use std::path::Path;

use intake_core::constants::HASH_CHUNK_SIZE;
use intake_core::ContentHash;
use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;

/// Hash the full contents of `path` in fixed-size chunks.
///
/// Returns the digest and the number of bytes hashed.
pub async fn hash_file(path: &Path) -> io::Result<(ContentHash, u64)> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; HASH_CHUNK_SIZE];
    let mut total = 0u64;

    loop {
        let read = file.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
        total += read as u64;
    }

    Ok((ContentHash::from_digest(&hasher.finalize()), total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn hashes_known_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hello.txt");
        tokio::fs::write(&path, b"hello world").await.unwrap();

        let (hash, size) = hash_file(&path).await.unwrap();
        assert_eq!(
            hash.as_hex(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
        assert_eq!(size, 11);
    }

    #[tokio::test]
    async fn hashes_across_chunk_boundaries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.bin");
        let data = vec![0xABu8; HASH_CHUNK_SIZE * 3 + 17];
        tokio::fs::write(&path, &data).await.unwrap();

        let (hash, size) = hash_file(&path).await.unwrap();
        assert_eq!(hash, ContentHash::from_digest(&Sha256::digest(&data)));
        assert_eq!(size, data.len() as u64);
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(hash_file(&dir.path().join("gone")).await.is_err());
    }
}
