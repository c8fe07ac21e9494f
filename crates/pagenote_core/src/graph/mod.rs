//! Note-graph linearization, flattening and in-memory page edits.
//!
//! # Responsibility
//! - Rebuild the ordered main sequence and per-page extension chains from a
//!   persisted `NoteGraph`.
//! - Fold an edited `NoteView` back into a `NoteGraph` for persistence.
//!
//! # Invariants
//! - Every traversal hop checks table membership and a visited-set; corruption
//!   becomes a `GraphError`, never a hang or panic.
//! - `NoteView::extensions` is keyed by the owner's positional rank, not by
//!   the owner's `unique`.
//! - Pages unreachable from the main head are dropped from the view and are
//!   lost on the next save. This is intentional lossy behavior.

use crate::model::node::PageId;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod edit;
pub mod flatten;
pub mod linearize;

/// Which chain a traversal was walking when it hit corruption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainKind {
    Main,
    /// Extension chain owned by the main page at `owner_position`.
    Extension { owner_position: usize },
}

impl Display for ChainKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Main => write!(f, "main"),
            Self::Extension { owner_position } => write!(f, "extension@{owner_position}"),
        }
    }
}

/// Chain corruption found during linearization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// `from` links to `missing`, which is not in the table.
    BrokenChain {
        chain: ChainKind,
        from: PageId,
        missing: PageId,
    },
    /// The chain reached `repeated` a second time.
    Cycle { chain: ChainKind, repeated: PageId },
}

impl GraphError {
    pub fn chain(&self) -> ChainKind {
        match self {
            Self::BrokenChain { chain, .. } | Self::Cycle { chain, .. } => *chain,
        }
    }

    /// Stable short code for log lines and FFI envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BrokenChain { .. } => "broken_chain",
            Self::Cycle { .. } => "cycle",
        }
    }
}

impl Display for GraphError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BrokenChain {
                chain,
                from,
                missing,
            } => write!(
                f,
                "{chain} chain broken: page {from} links to missing page {missing}"
            ),
            Self::Cycle { chain, repeated } => {
                write!(f, "{chain} chain cycles back to page {repeated}")
            }
        }
    }
}

impl Error for GraphError {}
