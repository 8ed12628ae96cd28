use crate::AssetError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where a model comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetSource {
    Url(String),
    Path(PathBuf),
}

impl AssetSource {
    /// `http://` and `https://` strings are URLs, anything else is a path.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.starts_with("http://") || s.starts_with("https://") {
            Self::Url(s.to_string())
        } else {
            Self::Path(PathBuf::from(s))
        }
    }

    /// Short human-readable name: the last path segment without query string
    /// or extension.
    pub fn display_name(&self) -> String {
        let last = match self {
            Self::Url(url) => {
                let no_query = url.split(['?', '#']).next().unwrap_or(url);
                no_query
                    .trim_end_matches('/')
                    .rsplit('/')
                    .next()
                    .unwrap_or(no_query)
                    .to_string()
            }
            Self::Path(path) => path
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        match last.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem.to_string(),
            _ if last.is_empty() => "model".to_string(),
            _ => last,
        }
    }
}

impl fmt::Display for AssetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Download a URL into memory.
pub fn fetch_url(url: &str) -> Result<Vec<u8>, AssetError> {
    tracing::info!("downloading {url}");
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(120))
        .build()?;
    let response = client.get(url).send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(AssetError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    let bytes = response.bytes()?.to_vec();
    tracing::info!("downloaded {} bytes", bytes.len());
    Ok(bytes)
}

/// On-disk model cache keyed by the SHA-256 of the source URL.
#[derive(Debug, Clone)]
pub struct ModelCache {
    dir: PathBuf,
}

impl ModelCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cache file location for a URL.
    pub fn path_for(&self, url: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        self.dir.join(format!("{:x}.glb", hasher.finalize()))
    }

    pub fn get(&self, url: &str) -> Option<Vec<u8>> {
        std::fs::read(self.path_for(url)).ok()
    }

    /// Drop the entry for a URL. A missing entry is not an error.
    pub fn evict(&self, url: &str) -> Result<(), AssetError> {
        match std::fs::remove_file(self.path_for(url)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Store bytes for a URL. Writes to a temporary file first so a crash
    /// never leaves a truncated cache entry.
    pub fn put(&self, url: &str, bytes: &[u8]) -> Result<PathBuf, AssetError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(url);
        let tmp = path.with_extension("part");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &path)?;
        Ok(path)
    }

    /// Cached bytes, downloading and storing them on a miss.
    pub fn fetch(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        if let Some(bytes) = self.get(url) {
            tracing::info!("cache hit for {url}");
            return Ok(bytes);
        }
        let bytes = fetch_url(url)?;
        if let Err(e) = self.put(url, &bytes) {
            tracing::warn!("failed to cache {url}: {e}");
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_source_kind() {
        assert!(matches!(
            AssetSource::parse("https://example.com/shirt.glb"),
            AssetSource::Url(_)
        ));
        assert_eq!(
            AssetSource::parse(" ./models/shirt.glb "),
            AssetSource::Path(PathBuf::from("./models/shirt.glb"))
        );
    }

    #[test]
    fn display_name_strips_query_and_extension() {
        let src = AssetSource::parse(
            "https://cdn.example.com/abc/t-shirt_polo_lengan_panjang.glb?v=1733598419760",
        );
        assert_eq!(src.display_name(), "t-shirt_polo_lengan_panjang");
        assert_eq!(AssetSource::parse("/tmp/hoodie.gltf").display_name(), "hoodie");
        assert_eq!(AssetSource::parse("https://example.com/").display_name(), "example");
    }

    #[test]
    fn cache_paths_are_content_addressed() {
        let cache = ModelCache::new("/tmp/cache");
        let a = cache.path_for("https://a.example/m.glb");
        let b = cache.path_for("https://b.example/m.glb");
        assert_ne!(a, b);
        assert_eq!(a, cache.path_for("https://a.example/m.glb"));
        assert_eq!(a.extension().unwrap(), "glb");
    }

    #[test]
    fn cache_put_then_get_skips_network() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ModelCache::new(dir.path().join("models"));
        let url = "https://unreachable.invalid/shirt.glb";
        assert!(cache.get(url).is_none());

        cache.put(url, b"glb bytes").unwrap();
        assert_eq!(cache.get(url).unwrap(), b"glb bytes");
        // A hit never reaches the (unresolvable) host.
        assert_eq!(cache.fetch(url).unwrap(), b"glb bytes");
        assert!(!cache.path_for(url).with_extension("part").exists());

        cache.evict(url).unwrap();
        assert!(cache.get(url).is_none());
        // Evicting twice is fine.
        cache.evict(url).unwrap();
    }
}
