//! Core note-graph logic for PageNote.
//! Owns the persisted page table, its linearization into ordered page
//! sequences, and the inverse flattening used on save.

pub mod codec;
pub mod config;
pub mod graph;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod snapshot;

pub use codec::{decode, encode, DecodeError, EncodeError};
pub use config::{normalize_snapshot_interval_ms, ConfigError, DocumentConfig};
pub use graph::edit::EditError;
pub use graph::flatten::{
    flatten, FlattenError, FlattenOptions, FlattenWarning, Flattened, OwnerLinkMode,
};
pub use graph::linearize::{linearize, linearize_strict, Linearized, NoteView};
pub use graph::{ChainKind, GraphError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::node::{
    ListNode, NoteGraph, PageId, DEFAULT_EXTENSION_TAG, DEFAULT_HEAD_ID, MAIN_TAG,
};
pub use repo::document_store::{
    DocumentStore, FileDocumentStore, MemoryDocumentStore, StoreError, StoreResult,
};
pub use service::document_service::{
    DocumentService, DocumentServiceError, OpenedDocument, SaveReport,
};
pub use snapshot::{snapshot_target, SharedView, SnapshotTarget};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
