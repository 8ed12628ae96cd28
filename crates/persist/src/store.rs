//! Sessions on disk.
//!
//! ```text
//! <root>/session.meta.json            schema version and snapshot count
//! <root>/snapshots/NNNNNN.session.cbor.zst
//! <root>/integrity/manifest.json      sha256 of each snapshot, chained
//! <root>/exports/paint-NNNNNN.png
//! ```

use crate::session::{SESSION_SCHEMA_VERSION, Session};
use garment_canvas::CanvasError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

const META_FILE: &str = "session.meta.json";
const SNAPSHOT_DIR: &str = "snapshots";
const INTEGRITY_DIR: &str = "integrity";
const MANIFEST_FILE: &str = "manifest.json";
const EXPORT_DIR: &str = "exports";
const ZSTD_LEVEL: i32 = 3;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode session: {0}")]
    Encode(String),
    #[error("failed to decode session: {0}")]
    Decode(String),
    #[error("bad store metadata: {0}")]
    Json(#[from] serde_json::Error),
    #[error("image: {0}")]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Canvas(#[from] CanvasError),
    #[error("{what}: expected {expected}, found {actual}")]
    IntegrityMismatch {
        what: String,
        expected: String,
        actual: String,
    },
    #[error("store uses session schema v{file_version}, this build reads v{expected_version}")]
    SchemaMismatch {
        file_version: u32,
        expected_version: u32,
    },
    #[error("{0} is not listed in the integrity manifest")]
    Unlisted(String),
    #[error("the store holds no sessions yet")]
    NoSnapshots,
}

/// Contents of `session.meta.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMeta {
    pub session_schema_version: u32,
    pub snapshot_count: u32,
}

impl Default for SessionMeta {
    fn default() -> Self {
        Self {
            session_schema_version: SESSION_SCHEMA_VERSION,
            snapshot_count: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub filename: String,
    pub sha256: String,
    /// Hash of the entry before this one.
    pub prev_hash: Option<String>,
}

/// Snapshot hashes in save order, each entry pointing at its predecessor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntegrityManifest {
    pub entries: Vec<ManifestEntry>,
}

impl IntegrityManifest {
    fn entry(&self, filename: &str) -> Result<&ManifestEntry, StoreError> {
        self.entries
            .iter()
            .find(|e| e.filename == filename)
            .ok_or_else(|| StoreError::Unlisted(filename.to_string()))
    }

    fn append(&mut self, filename: String, sha256: String) {
        let prev_hash = self.entries.last().map(|e| e.sha256.clone());
        self.entries.push(ManifestEntry {
            filename,
            sha256,
            prev_hash,
        });
    }

    /// Every entry must point at the hash of the one before it.
    fn check_chain(&self) -> Result<(), StoreError> {
        let mut expected: Option<&str> = None;
        for entry in &self.entries {
            if entry.prev_hash.as_deref() != expected {
                return Err(StoreError::IntegrityMismatch {
                    what: format!("chain link of {}", entry.filename),
                    expected: expected.unwrap_or("none").to_string(),
                    actual: entry.prev_hash.clone().unwrap_or_else(|| "none".into()),
                });
            }
            expected = Some(&entry.sha256);
        }
        Ok(())
    }
}

/// Append-only directory of painting sessions.
pub struct SessionStore {
    root: PathBuf,
    meta: SessionMeta,
    manifest: IntegrityManifest,
}

impl SessionStore {
    /// Open the store at `path`, creating it when missing. A store written
    /// with another schema version is refused.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = path.as_ref().to_path_buf();
        for dir in [SNAPSHOT_DIR, INTEGRITY_DIR, EXPORT_DIR] {
            std::fs::create_dir_all(root.join(dir))?;
        }

        let mut store = Self {
            meta: read_json(&root.join(META_FILE))?.unwrap_or_default(),
            manifest: read_json(&root.join(INTEGRITY_DIR).join(MANIFEST_FILE))?.unwrap_or_default(),
            root,
        };
        if store.meta.session_schema_version != SESSION_SCHEMA_VERSION {
            return Err(StoreError::SchemaMismatch {
                file_version: store.meta.session_schema_version,
                expected_version: SESSION_SCHEMA_VERSION,
            });
        }
        if !store.root.join(META_FILE).exists() {
            store.write_state(&store.meta, &store.manifest)?;
        }

        tracing::debug!(
            "session store at {} ({} snapshots)",
            store.root.display(),
            store.meta.snapshot_count
        );
        Ok(store)
    }

    /// Write `session` as the next snapshot and return its path.
    pub fn save(&mut self, session: &Session) -> Result<PathBuf, StoreError> {
        let index = self.meta.snapshot_count + 1;
        let filename = snapshot_filename(index);
        let path = self.snapshot_path(&filename);

        let bytes = encode_session(session)?;
        std::fs::write(&path, &bytes)?;

        let mut manifest = self.manifest.clone();
        manifest.append(filename, sha256_hex(&bytes));
        let meta = SessionMeta {
            snapshot_count: index,
            ..self.meta.clone()
        };
        if let Err(e) = self.write_state(&meta, &manifest) {
            // The snapshot is unreferenced until both files land.
            let _ = std::fs::remove_file(&path);
            return Err(e);
        }
        self.meta = meta;
        self.manifest = manifest;
        tracing::info!("session saved to {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }

    pub fn load_latest(&self) -> Result<Session, StoreError> {
        match self.meta.snapshot_count {
            0 => Err(StoreError::NoSnapshots),
            n => self.load(n),
        }
    }

    /// Read snapshot `index` (1-based). The file must match its manifest hash
    /// and the decoded pixels their own hash.
    pub fn load(&self, index: u32) -> Result<Session, StoreError> {
        let filename = snapshot_filename(index);
        let bytes = std::fs::read(self.snapshot_path(&filename))?;
        check_hash(self.manifest.entry(&filename)?, &bytes)?;

        let session = decode_session(&bytes)?;
        if !session.verify() {
            return Err(StoreError::IntegrityMismatch {
                what: format!("pixels of {filename}"),
                expected: session.pixel_hash.clone(),
                actual: session.compute_pixel_hash(),
            });
        }
        Ok(session)
    }

    /// Walk the whole manifest: chain links first, then every file's hash.
    pub fn verify_integrity(&self) -> Result<(), StoreError> {
        self.manifest.check_chain()?;
        for entry in &self.manifest.entries {
            let bytes = std::fs::read(self.snapshot_path(&entry.filename))?;
            check_hash(entry, &bytes)?;
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn meta(&self) -> &SessionMeta {
        &self.meta
    }

    pub fn manifest(&self) -> &IntegrityManifest {
        &self.manifest
    }

    pub fn exports_dir(&self) -> PathBuf {
        self.root.join(EXPORT_DIR)
    }

    /// First free `exports/paint-NNNNNN.png`.
    pub fn next_export_path(&self) -> PathBuf {
        let dir = self.exports_dir();
        (1u32..)
            .map(|i| dir.join(format!("paint-{i:06}.png")))
            .find(|p| !p.exists())
            .unwrap_or_else(|| dir.join("paint.png"))
    }

    fn snapshot_path(&self, filename: &str) -> PathBuf {
        self.root.join(SNAPSHOT_DIR).join(filename)
    }

    /// Manifest first: the meta snapshot count is what makes a snapshot current.
    fn write_state(&self, meta: &SessionMeta, manifest: &IntegrityManifest) -> Result<(), StoreError> {
        write_json(&self.root.join(INTEGRITY_DIR).join(MANIFEST_FILE), manifest)?;
        write_json(&self.root.join(META_FILE), meta)
    }
}

fn snapshot_filename(index: u32) -> String {
    format!("{index:06}.session.cbor.zst")
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    match std::fs::File::open(path) {
        Ok(file) => Ok(Some(serde_json::from_reader(std::io::BufReader::new(file))?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let text = serde_json::to_string_pretty(value)?;
    std::fs::write(path, text)?;
    Ok(())
}

/// CBOR streamed through a zstd encoder.
fn encode_session(session: &Session) -> Result<Vec<u8>, StoreError> {
    let mut encoder = zstd::Encoder::new(Vec::new(), ZSTD_LEVEL)?;
    ciborium::into_writer(session, &mut encoder).map_err(|e| StoreError::Encode(e.to_string()))?;
    Ok(encoder.finish()?)
}

fn decode_session(bytes: &[u8]) -> Result<Session, StoreError> {
    let decoder = zstd::Decoder::new(bytes)?;
    ciborium::from_reader(decoder).map_err(|e| StoreError::Decode(e.to_string()))
}

fn check_hash(entry: &ManifestEntry, bytes: &[u8]) -> Result<(), StoreError> {
    let actual = sha256_hex(bytes);
    if actual == entry.sha256 {
        Ok(())
    } else {
        Err(StoreError::IntegrityMismatch {
            what: format!("hash of {}", entry.filename),
            expected: entry.sha256.clone(),
            actual,
        })
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ViewState;
    use garment_canvas::PaintCanvas;
    use garment_common::Rgba;

    fn session(fill: Rgba) -> Session {
        let mut canvas = PaintCanvas::new(32, 32).unwrap();
        canvas.fill_rect(8.0, 8.0, 16.0, 16.0, fill);
        Session::capture(&canvas, ViewState::default(), None)
    }

    #[test]
    fn open_lays_out_fresh_store() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SessionStore::open(tmp.path().join("session_data")).unwrap();
        assert_eq!(store.meta().snapshot_count, 0);
        assert_eq!(store.meta().session_schema_version, SESSION_SCHEMA_VERSION);
        assert!(store.root().join(SNAPSHOT_DIR).is_dir());
        assert!(store.root().join(META_FILE).is_file());
        assert!(store.exports_dir().is_dir());
    }

    #[test]
    fn failed_save_leaves_store_unchanged() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("session_data");
        let mut store = SessionStore::open(&path).unwrap();
        store.save(&session(Rgba::rgb(255, 0, 0))).unwrap();

        // A directory in place of the manifest makes the write fail.
        let manifest_path = path.join(INTEGRITY_DIR).join(MANIFEST_FILE);
        std::fs::remove_file(&manifest_path).unwrap();
        std::fs::create_dir(&manifest_path).unwrap();

        assert!(matches!(store.save(&session(Rgba::rgb(0, 0, 255))), Err(StoreError::Io(_))));
        assert_eq!(store.meta().snapshot_count, 1);
        assert_eq!(store.manifest().entries.len(), 1);
        assert!(!store.snapshot_path(&snapshot_filename(2)).exists());
        let on_disk: SessionMeta = read_json(&path.join(META_FILE)).unwrap().unwrap();
        assert_eq!(on_disk.snapshot_count, 1);

        std::fs::remove_dir(&manifest_path).unwrap();
        let saved = store.save(&session(Rgba::rgb(0, 0, 255))).unwrap();
        assert!(saved.ends_with(snapshot_filename(2)));
        store.verify_integrity().unwrap();
        assert_eq!(store.load_latest().unwrap(), session(Rgba::rgb(0, 0, 255)));
    }

    #[test]
    fn save_and_load_latest_across_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("session_data");
        {
            let mut store = SessionStore::open(&path).unwrap();
            store.save(&session(Rgba::rgb(255, 0, 0))).unwrap();
            store.save(&session(Rgba::rgb(0, 255, 0))).unwrap();
        }

        let store = SessionStore::open(&path).unwrap();
        assert_eq!(store.meta().snapshot_count, 2);
        let latest = store.load_latest().unwrap();
        assert_eq!(latest, session(Rgba::rgb(0, 255, 0)));
        let first = store.load(1).unwrap();
        assert_eq!(first.restore_canvas().unwrap().pixel(10, 10), Rgba::rgb(255, 0, 0));
    }

    #[test]
    fn empty_store_has_no_snapshots() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SessionStore::open(tmp.path()).unwrap();
        assert!(matches!(store.load_latest(), Err(StoreError::NoSnapshots)));
        store.verify_integrity().unwrap();
    }

    #[test]
    fn manifest_is_hash_chained() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = SessionStore::open(tmp.path()).unwrap();
        store.save(&session(Rgba::WHITE)).unwrap();
        store.save(&session(Rgba::BLACK)).unwrap();
        let entries = &store.manifest().entries;
        assert!(entries[0].prev_hash.is_none());
        assert_eq!(entries[1].prev_hash.as_deref(), Some(entries[0].sha256.as_str()));
        store.verify_integrity().unwrap();
    }

    #[test]
    fn corrupted_snapshot_is_refused() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("session_data");
        let mut store = SessionStore::open(&path).unwrap();
        store.save(&session(Rgba::WHITE)).unwrap();

        let snap_path = path.join("snapshots").join("000001.session.cbor.zst");
        let mut data = std::fs::read(&snap_path).unwrap();
        let mid = data.len() / 2;
        data[mid] ^= 0x5a;
        std::fs::write(&snap_path, &data).unwrap();

        let store = SessionStore::open(&path).unwrap();
        assert!(store.verify_integrity().is_err());
        assert!(matches!(store.load_latest(), Err(StoreError::IntegrityMismatch { .. })));
    }

    #[test]
    fn unlisted_snapshot_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("session_data");
        let mut store = SessionStore::open(&path).unwrap();
        store.save(&session(Rgba::WHITE)).unwrap();
        std::fs::copy(
            path.join("snapshots").join("000001.session.cbor.zst"),
            path.join("snapshots").join("000002.session.cbor.zst"),
        )
        .unwrap();
        assert!(matches!(store.load(2), Err(StoreError::Unlisted(_))));
    }

    #[test]
    fn newer_schema_is_refused() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("session_data");
        SessionStore::open(&path).unwrap();

        let meta_path = path.join(META_FILE);
        let mut meta: SessionMeta = read_json(&meta_path).unwrap().unwrap();
        meta.session_schema_version = 999;
        write_json(&meta_path, &meta).unwrap();

        match SessionStore::open(&path) {
            Err(StoreError::SchemaMismatch {
                file_version,
                expected_version,
            }) => {
                assert_eq!(file_version, 999);
                assert_eq!(expected_version, SESSION_SCHEMA_VERSION);
            }
            other => panic!("unexpected open result: {:?}", other.err()),
        }
    }

    #[test]
    fn export_paths_do_not_collide() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SessionStore::open(tmp.path()).unwrap();
        let first = store.next_export_path();
        std::fs::write(&first, b"png").unwrap();
        let second = store.next_export_path();
        assert_ne!(first, second);
        assert!(second.ends_with("paint-000002.png"));
    }
}
