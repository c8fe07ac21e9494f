//! Document open/save use-case service.
//!
//! # Responsibility
//! - Run one load cycle: read -> decode -> linearize.
//! - Run one save cycle: flatten -> encode -> write.
//!
//! # Invariants
//! - Graph corruption never fails `open`; truncated chains are returned as
//!   issues alongside the view.
//! - A missing document opens as a synthesized single-page view.
//! - `save` writes nothing when flattening fails.

use crate::codec::{decode, encode, DecodeError, EncodeError};
use crate::config::{ConfigError, DocumentConfig};
use crate::graph::flatten::{flatten, FlattenError, FlattenWarning};
use crate::graph::linearize::{linearize, NoteView};
use crate::graph::GraphError;
use crate::model::node::NoteGraph;
use crate::repo::document_store::{DocumentStore, StoreError};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

#[derive(Debug)]
pub enum DocumentServiceError {
    Config(ConfigError),
    Store(StoreError),
    Decode(DecodeError),
    Encode(EncodeError),
    Flatten(FlattenError),
}

impl Display for DocumentServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "invalid document config: {err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Decode(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "{err}"),
            Self::Flatten(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DocumentServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Decode(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::Flatten(err) => Some(err),
        }
    }
}

impl From<ConfigError> for DocumentServiceError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<StoreError> for DocumentServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<DecodeError> for DocumentServiceError {
    fn from(value: DecodeError) -> Self {
        Self::Decode(value)
    }
}

impl From<EncodeError> for DocumentServiceError {
    fn from(value: EncodeError) -> Self {
        Self::Encode(value)
    }
}

impl From<FlattenError> for DocumentServiceError {
    fn from(value: FlattenError) -> Self {
        Self::Flatten(value)
    }
}

/// Result of opening one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedDocument {
    pub view: NoteView,
    /// No main head existed and a default page was created.
    pub synthesized: bool,
    /// Stored bytes could not be decoded and were replaced by a default page.
    pub recovered_from_decode_error: bool,
    /// Chains truncated during linearization.
    pub issues: Vec<GraphError>,
}

/// Result of saving one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    pub pages_written: usize,
    pub bytes_written: usize,
    pub warnings: Vec<FlattenWarning>,
}

/// Document service facade over a `DocumentStore`.
pub struct DocumentService<S: DocumentStore> {
    store: S,
    config: DocumentConfig,
}

impl<S: DocumentStore> DocumentService<S> {
    /// Creates a service after validating `config`.
    pub fn new(store: S, config: DocumentConfig) -> Result<Self, DocumentServiceError> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads and linearizes the stored document.
    ///
    /// # Errors
    /// - `Store` when the underlying read fails.
    /// - `Decode` when bytes are malformed and decode fallback is disabled.
    pub fn open(&self) -> Result<OpenedDocument, DocumentServiceError> {
        let started_at = Instant::now();
        let (graph, recovered_from_decode_error) = match self.store.read()? {
            None => (NoteGraph::default(), false),
            Some(bytes) => match decode(&bytes) {
                Ok(graph) => (graph, false),
                Err(err) if self.config.fallback_on_decode_error => {
                    warn!(
                        "event=document_open module=service status=warn reason=decode_fallback error={}",
                        err
                    );
                    (NoteGraph::default(), true)
                }
                Err(err) => {
                    error!(
                        "event=document_open module=service status=error error_code=decode_failed error={}",
                        err
                    );
                    return Err(err.into());
                }
            },
        };

        let linearized = linearize(&graph);
        for issue in &linearized.issues {
            warn!(
                "event=document_open module=service status=warn error_code={} detail={}",
                issue.code(),
                issue
            );
        }
        info!(
            "event=document_open module=service status=ok synthesized={} recovered={} main_pages={} issues={} duration_ms={}",
            linearized.synthesized,
            recovered_from_decode_error,
            linearized.view.main.len(),
            linearized.issues.len(),
            started_at.elapsed().as_millis()
        );

        Ok(OpenedDocument {
            view: linearized.view,
            synthesized: linearized.synthesized,
            recovered_from_decode_error,
            issues: linearized.issues,
        })
    }

    /// Flattens `view` and writes it back to the store.
    pub fn save(&self, view: &NoteView) -> Result<SaveReport, DocumentServiceError> {
        let started_at = Instant::now();
        let flattened = flatten(view, self.config.flatten_options()).map_err(|err| {
            error!(
                "event=document_save module=service status=error error_code=flatten_failed error={}",
                err
            );
            err
        })?;
        let json = encode(&flattened.graph)?;
        self.store.write(json.as_bytes())?;

        info!(
            "event=document_save module=service status=ok pages={} bytes={} warnings={} duration_ms={}",
            flattened.graph.len(),
            json.len(),
            flattened.warnings.len(),
            started_at.elapsed().as_millis()
        );
        Ok(SaveReport {
            pages_written: flattened.graph.len(),
            bytes_written: json.len(),
            warnings: flattened.warnings,
        })
    }
}
