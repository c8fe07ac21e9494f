//! Persisted byte format for `NoteGraph`.
//!
//! # Responsibility
//! - Decode stored JSON into a `NoteGraph` and encode it back.
//!
//! # Invariants
//! - Encoding is deterministic and contains no newlines.
//! - Decode never repairs data; malformed input is an error.

use crate::model::node::PageId;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod json;

pub use json::{decode, encode};

/// Errors from decoding persisted bytes.
#[derive(Debug)]
pub enum DecodeError {
    /// Bytes are not a structurally valid document (missing fields, wrong types).
    Malformed(serde_json::Error),
    /// Table entry is stored under a key other than its own `unique`.
    KeyMismatch { key: PageId, unique: PageId },
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(err) => write!(f, "malformed note document: {err}"),
            Self::KeyMismatch { key, unique } => write!(
                f,
                "note table entry `{key}` holds page with unique {unique}"
            ),
        }
    }
}

impl Error for DecodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Malformed(err) => Some(err),
            Self::KeyMismatch { .. } => None,
        }
    }
}

/// Error from encoding a `NoteGraph`.
#[derive(Debug)]
pub struct EncodeError(pub serde_json::Error);

impl Display for EncodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to encode note document: {}", self.0)
    }
}

impl Error for EncodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}
