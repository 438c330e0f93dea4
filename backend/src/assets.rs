//! Local Asset Store
//!
//! Writes uploaded images under `<root>/<folder>/<owner>/` named by content
//! hash, and hands back a public URL for them.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::path::{Path, PathBuf};

use crate::domain::{DomainError, DomainResult};

/// Characters left as-is in `file://` path segments
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b':');

/// Default upload limit: 10 MiB
pub const DEFAULT_MAX_ASSET_BYTES: u64 = 10 * 1024 * 1024;

/// Result of a stored upload
#[derive(Debug, Clone, PartialEq)]
pub struct StoredAsset {
    pub url: String,
    pub path: PathBuf,
    pub bytes: u64,
}

/// Directory-backed asset host
#[derive(Debug, Clone)]
pub struct AssetStore {
    root: PathBuf,
    public_base: String,
    max_bytes: u64,
}

impl AssetStore {
    /// `public_base` defaults to a `file://` URL of `root`
    pub fn new(root: impl Into<PathBuf>, public_base: Option<String>, max_bytes: u64) -> Self {
        let root = root.into();
        let public_base = public_base
            .unwrap_or_else(|| file_url(&root))
            .trim_end_matches('/')
            .to_string();
        Self {
            root,
            public_base,
            max_bytes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Store raw bytes uploaded under `file_name`
    pub async fn store(&self, folder: &str, owner_id: &str, file_name: &str, bytes: &[u8]) -> DomainResult<StoredAsset> {
        let mime = mime_guess::from_path(file_name).first_or_octet_stream();
        if mime.type_() != mime_guess::mime::IMAGE {
            return Err(DomainError::InvalidInput(format!(
                "'{}' is not an image ({})",
                file_name, mime
            )));
        }

        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .ok_or_else(|| DomainError::InvalidInput(format!("'{}' has no extension", file_name)))?;

        self.write(folder, owner_id, &extension, bytes).await
    }

    async fn write(&self, folder: &str, owner_id: &str, extension: &str, bytes: &[u8]) -> DomainResult<StoredAsset> {
        let size = bytes.len() as u64;
        if size == 0 {
            return Err(DomainError::InvalidInput("Empty upload".to_string()));
        }
        if size > self.max_bytes {
            return Err(DomainError::PayloadTooLarge {
                size,
                limit: self.max_bytes,
            });
        }
        check_segment("folder", folder)?;
        check_segment("owner", owner_id)?;

        let hash = blake3::hash(bytes).to_hex();
        let file_name = format!("{}.{}", &hash.as_str()[..32], extension);
        let dir = self.root.join(folder).join(owner_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| DomainError::Internal(format!("Failed to create asset directory: {}", e)))?;

        let path = dir.join(&file_name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| DomainError::Internal(format!("Failed to write asset: {}", e)))?;

        log::info!("Stored {} bytes at {}", size, path.display());
        Ok(StoredAsset {
            url: format!("{}/{}/{}/{}", self.public_base, folder, owner_id, file_name),
            path,
            bytes: size,
        })
    }
}

/// Percent-encoded `file://` URL for a local directory
fn file_url(root: &Path) -> String {
    let path = root.to_string_lossy().replace('\\', "/");
    let encoded = path
        .split('/')
        .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/");
    if encoded.starts_with('/') {
        format!("file://{}", encoded)
    } else {
        format!("file:///{}", encoded)
    }
}

fn check_segment(what: &str, segment: &str) -> DomainResult<()> {
    let valid = !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(DomainError::InvalidInput(format!("Invalid {} '{}'", what, segment)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &Path, max_bytes: u64) -> AssetStore {
        AssetStore::new(dir, Some("https://assets.example/".to_string()), max_bytes)
    }

    #[tokio::test]
    async fn test_store_writes_hash_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let assets = store(dir.path(), DEFAULT_MAX_ASSET_BYTES);

        let stored = assets.store("switches", "user-1", "U4.PNG", b"png-bytes").await.expect("store");

        assert!(stored.url.starts_with("https://assets.example/switches/user-1/"));
        assert!(stored.url.ends_with(".png"));
        assert_eq!(std::fs::read(&stored.path).unwrap(), b"png-bytes");

        // Same content lands on the same name
        let again = assets.store("switches", "user-1", "copy.png", b"png-bytes").await.unwrap();
        assert_eq!(again.url, stored.url);
    }

    #[tokio::test]
    async fn test_store_rejects_oversized() {
        let dir = tempfile::tempdir().unwrap();
        let assets = store(dir.path(), 4);

        let err = assets.store("switches", "user-1", "big.png", b"12345").await.unwrap_err();
        assert_eq!(err, DomainError::PayloadTooLarge { size: 5, limit: 4 });
    }

    #[tokio::test]
    async fn test_store_rejects_non_images_and_bad_segments() {
        let dir = tempfile::tempdir().unwrap();
        let assets = store(dir.path(), DEFAULT_MAX_ASSET_BYTES);

        assert!(assets.store("switches", "user-1", "notes.txt", b"hi").await.is_err());
        assert!(assets.store("../etc", "user-1", "a.png", b"hi").await.is_err());
        assert!(assets.store("switches", "", "a.png", b"hi").await.is_err());
        assert!(assets.store("switches", "user-1", "a.png", b"").await.is_err());
    }

    #[tokio::test]
    async fn test_default_file_urls_are_percent_encoded() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("My Data").join("assets");
        let assets = AssetStore::new(&root, None, DEFAULT_MAX_ASSET_BYTES);

        let stored = assets.store("switches", "user-1", "u4.png", b"png-bytes").await.expect("store");

        assert!(stored.url.starts_with("file:///"));
        assert!(stored.url.contains("/My%20Data/assets/switches/user-1/"));
        assert!(!stored.url.contains(' '));
        assert!(stored.path.starts_with(&root));
    }

    #[test]
    fn test_file_url_keeps_separators() {
        assert_eq!(file_url(Path::new("/srv/hobb data")), "file:///srv/hobb%20data");
        assert_eq!(file_url(Path::new("C:\\Users\\me")), "file:///C:/Users/me");
    }
}
