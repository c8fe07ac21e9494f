//! Ordered in-memory view -> persisted table.
//!
//! Main pages have their `key_index` cleared and are re-linked only when
//! they still own a non-empty extension chain. Extension pages store the
//! owner's positional rank in `key_index`.
//!
//! `OwnerLinkMode::PositionAsUnique` finds the owner by using that rank as a
//! table key. This is only correct while every owner's `unique` equals its
//! rank; mismatches are reported as `FlattenWarning::OwnerRankMismatch` and
//! written as-is. `OwnerLinkMode::ByRank` resolves the owner through the
//! main sequence instead.

use super::linearize::NoteView;
use crate::model::node::{NoteGraph, PageId};
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// How the flattener finds the main page that owns an extension chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OwnerLinkMode {
    /// Look the owner up in the output table using its rank as a `unique`.
    #[default]
    PositionAsUnique,
    /// Use `main[rank].unique` as the owner.
    ByRank,
}

impl OwnerLinkMode {
    /// Parses `position` or `rank` (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "position" | "position_as_unique" => Some(Self::PositionAsUnique),
            "rank" | "by_rank" => Some(Self::ByRank),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PositionAsUnique => "position",
            Self::ByRank => "rank",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlattenOptions {
    pub owner_link_mode: OwnerLinkMode,
}

/// Flatten failures. No partial graph is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlattenError {
    /// An extension chain is keyed by a rank past the end of the main sequence.
    OwnerPositionOutOfRange { position: usize, main_len: usize },
    /// No page is stored under the rank used as a `unique`.
    OwnerNotFound { position: usize },
}

impl Display for FlattenError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OwnerPositionOutOfRange { position, main_len } => write!(
                f,
                "extension chain owner position {position} is outside main sequence of {main_len} pages"
            ),
            Self::OwnerNotFound { position } => write!(
                f,
                "no page stored under key {position} to own its extension chain"
            ),
        }
    }
}

impl Error for FlattenError {}

/// Non-fatal findings while flattening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlattenWarning {
    /// The page stored under key `position` is not the page ranked there.
    OwnerRankMismatch {
        position: usize,
        ranked_owner: PageId,
        linked_page: PageId,
    },
    /// A non-empty chain has no head page; it will not be reachable on reload.
    HeadlessExtension { position: usize },
    /// The same `unique` was written more than once; the last write won.
    DuplicatePage(PageId),
}

impl Display for FlattenWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OwnerRankMismatch {
                position,
                ranked_owner,
                linked_page,
            } => write!(
                f,
                "extension at position {position} linked to page {linked_page}, ranked owner is {ranked_owner}"
            ),
            Self::HeadlessExtension { position } => {
                write!(f, "extension at position {position} has no head page")
            }
            Self::DuplicatePage(unique) => write!(f, "page {unique} written more than once"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flattened {
    pub graph: NoteGraph,
    pub warnings: Vec<FlattenWarning>,
}

/// Folds `view` back into a persisted `NoteGraph`.
///
/// # Errors
/// - `OwnerPositionOutOfRange` when `extensions` names a rank with no main page.
/// - `OwnerNotFound` in `PositionAsUnique` mode when the rank is not a table key.
pub fn flatten(view: &NoteView, options: FlattenOptions) -> Result<Flattened, FlattenError> {
    let started_at = Instant::now();
    let mut graph = NoteGraph::new(view.next_page);
    let mut warnings = Vec::new();

    for node in &view.main {
        let mut node = *node;
        node.key_index = None;
        if graph.insert(node).is_some() {
            warnings.push(FlattenWarning::DuplicatePage(node.unique));
        }
    }

    for (position, chain) in &view.extensions {
        if chain.is_empty() {
            continue;
        }
        let ranked_owner = view
            .main
            .get(*position)
            .ok_or(FlattenError::OwnerPositionOutOfRange {
                position: *position,
                main_len: view.main.len(),
            })?
            .unique;
        let rank_key = PageId::try_from(*position)
            .map_err(|_| FlattenError::OwnerNotFound { position: *position })?;

        let mut saw_head = false;
        for node in chain {
            let mut node = *node;
            node.key_index = Some(rank_key);

            if node.is_chain_head() {
                saw_head = true;
                let owner_key = match options.owner_link_mode {
                    OwnerLinkMode::PositionAsUnique => rank_key,
                    OwnerLinkMode::ByRank => ranked_owner,
                };
                let owner = graph
                    .table
                    .get_mut(&owner_key)
                    .ok_or(FlattenError::OwnerNotFound { position: *position })?;
                if owner.unique != ranked_owner {
                    warn!(
                        "event=graph_flatten module=graph status=warn reason=owner_rank_mismatch position={} ranked_owner={} linked_page={}",
                        position, ranked_owner, owner.unique
                    );
                    warnings.push(FlattenWarning::OwnerRankMismatch {
                        position: *position,
                        ranked_owner,
                        linked_page: owner.unique,
                    });
                }
                owner.key_index = Some(node.unique);
            }

            if graph.insert(node).is_some() {
                warnings.push(FlattenWarning::DuplicatePage(node.unique));
            }
        }

        if !saw_head {
            warn!(
                "event=graph_flatten module=graph status=warn reason=headless_extension position={}",
                position
            );
            warnings.push(FlattenWarning::HeadlessExtension {
                position: *position,
            });
        }
    }

    debug!(
        "event=graph_flatten module=graph status=ok mode={} pages={} warnings={} duration_us={}",
        options.owner_link_mode.as_str(),
        graph.len(),
        warnings.len(),
        started_at.elapsed().as_micros()
    );
    Ok(Flattened { graph, warnings })
}
