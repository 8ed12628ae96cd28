//! Persistence: painting sessions and PNG export of the paint texture.
//!
//! # Invariants
//! - Snapshots are append-only and hash-chained in the integrity manifest.
//! - Schema mismatches and corrupted files fail closed.
//! - A session restores the exact canvas pixels it captured.

mod png;
mod session;
mod store;

pub use png::{export_png, import_png};
pub use session::{SESSION_SCHEMA_VERSION, Session, ViewState};
pub use store::{IntegrityManifest, ManifestEntry, SessionMeta, SessionStore, StoreError};
