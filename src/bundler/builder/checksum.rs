//! Bundle checksum calculation.
//!
//! A bundle is a directory tree, so its checksum covers the relative path
//! and content of every file and the target of every symlink, visited in
//! sorted order. Two runs over unchanged inputs produce the same value.

use crate::bundler::{Error, Result, error::ErrorExt};
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

/// Calculates the SHA-256 of a file or directory tree.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash (64 characters)
/// * `Err` - If the path cannot be read
pub async fn calculate_sha256(path: &Path) -> Result<String> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || hash_tree(&path))
        .await
        .map_err(|e| Error::GenericError(format!("Checksum task panicked: {}", e)))?
}

fn hash_tree(root: &Path) -> Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 8192];

    for entry in walkdir::WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry?;
        let rel_path = entry.path().strip_prefix(root)?;
        let file_type = entry.file_type();

        if file_type.is_symlink() {
            let target = std::fs::read_link(entry.path()).fs_context("reading symlink", entry.path())?;
            hasher.update(b"L");
            hasher.update(rel_path.to_string_lossy().as_bytes());
            hasher.update([0]);
            hasher.update(target.to_string_lossy().as_bytes());
        } else if file_type.is_file() {
            hasher.update(b"F");
            hasher.update(rel_path.to_string_lossy().as_bytes());
            hasher.update([0]);
            hash_file(&mut hasher, entry.path(), &mut buffer)?;
        } else if file_type.is_dir() {
            hasher.update(b"D");
            hasher.update(rel_path.to_string_lossy().as_bytes());
        }
        hasher.update([0]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

fn hash_file(hasher: &mut Sha256, path: &Path, buffer: &mut [u8]) -> Result<()> {
    let mut file = std::fs::File::open(path).fs_context("opening file for hashing", path)?;
    loop {
        let n = file
            .read(buffer)
            .fs_context("reading file for hash calculation", path)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_checksum_is_stable_and_content_sensitive() {
        let temp = tempfile::tempdir().unwrap();
        let bundle = temp.path().join("Demo.app");
        std::fs::create_dir_all(bundle.join("Contents/MacOS")).unwrap();
        std::fs::write(bundle.join("Contents/MacOS/Demo"), b"exe").unwrap();

        let first = calculate_sha256(&bundle).await.unwrap();
        assert_eq!(first.len(), 64);
        assert_eq!(first, calculate_sha256(&bundle).await.unwrap());

        std::fs::write(bundle.join("Contents/MacOS/Demo"), b"exe2").unwrap();
        assert_ne!(first, calculate_sha256(&bundle).await.unwrap());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_checksum_covers_symlink_targets() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("Foo.framework/Versions");
        std::fs::create_dir_all(dir.join("A")).unwrap();
        std::fs::create_dir_all(dir.join("B")).unwrap();
        std::os::unix::fs::symlink("A", dir.join("Current")).unwrap();
        let root = temp.path().join("Foo.framework");
        let before = calculate_sha256(&root).await.unwrap();

        std::fs::remove_file(dir.join("Current")).unwrap();
        std::os::unix::fs::symlink("B", dir.join("Current")).unwrap();
        assert_ne!(before, calculate_sha256(&root).await.unwrap());
    }
}
