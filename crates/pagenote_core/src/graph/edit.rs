//! Page management on an in-memory `NoteView`.
//!
//! # Invariants
//! - `prev_index`/`next_index` stay consistent inside every edited chain.
//! - Extension chains follow their owner when the main sequence is reordered.
//! - The main sequence never becomes empty.

use super::linearize::NoteView;
use crate::model::node::{ListNode, PageId, MAIN_TAG};
use log::debug;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    PositionOutOfRange { position: usize, len: usize },
    /// Page is not part of the addressed chain.
    PageNotFound(PageId),
    /// Removing this page would leave the main sequence empty.
    LastMainPage,
    /// Extension pages cannot use the main-sequence tag.
    InvalidExtensionTag(i32),
    PageIdsExhausted,
}

impl Display for EditError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PositionOutOfRange { position, len } => {
                write!(f, "position {position} out of range for {len} main pages")
            }
            Self::PageNotFound(unique) => write!(f, "page not found: {unique}"),
            Self::LastMainPage => write!(f, "cannot remove the last main page"),
            Self::InvalidExtensionTag(tag) => {
                write!(f, "extension pages need a non-main tag, got {tag}")
            }
            Self::PageIdsExhausted => write!(f, "no page ids left to allocate"),
        }
    }
}

impl Error for EditError {}

impl NoteView {
    /// Hands out the next free page id and advances `next_page` past it.
    pub fn allocate_page_id(&mut self) -> Result<PageId, EditError> {
        let mut candidate = self.next_page;
        while self.contains_page(candidate) {
            candidate = candidate.checked_add(1).ok_or(EditError::PageIdsExhausted)?;
        }
        self.next_page = candidate.checked_add(1).ok_or(EditError::PageIdsExhausted)?;
        Ok(candidate)
    }

    /// Appends a blank page to the end of the main sequence.
    pub fn append_main_page(&mut self) -> Result<PageId, EditError> {
        let unique = self.allocate_page_id()?;
        self.main.push(ListNode::detached(unique, MAIN_TAG));
        relink(&mut self.main);
        debug!(
            "event=page_append module=graph status=ok chain=main unique={} main_pages={}",
            unique,
            self.main.len()
        );
        Ok(unique)
    }

    /// Appends a page to the extension chain of the main page at `position`.
    pub fn append_extension_page(&mut self, position: usize, tag: i32) -> Result<PageId, EditError> {
        self.ensure_position(position)?;
        if tag == MAIN_TAG {
            return Err(EditError::InvalidExtensionTag(tag));
        }
        let unique = self.allocate_page_id()?;
        let chain = self.extensions.entry(position).or_default();
        chain.push(ListNode::detached(unique, tag));
        relink(chain);
        debug!(
            "event=page_append module=graph status=ok chain=extension position={} unique={} chain_pages={}",
            position,
            unique,
            chain.len()
        );
        Ok(unique)
    }

    /// Removes one page from the extension chain at `position`.
    pub fn remove_extension_page(&mut self, position: usize, unique: PageId) -> Result<(), EditError> {
        self.ensure_position(position)?;
        let chain = self
            .extensions
            .get_mut(&position)
            .ok_or(EditError::PageNotFound(unique))?;
        let index = chain
            .iter()
            .position(|node| node.unique == unique)
            .ok_or(EditError::PageNotFound(unique))?;
        chain.remove(index);
        relink(chain);
        if chain.is_empty() {
            self.extensions.remove(&position);
        }
        Ok(())
    }

    /// Removes the main page at `position` together with its extension chain.
    pub fn remove_main_page(&mut self, position: usize) -> Result<ListNode, EditError> {
        self.ensure_position(position)?;
        if self.main.len() == 1 {
            return Err(EditError::LastMainPage);
        }
        let mut by_owner = self.take_extensions_by_owner();
        let removed = self.main.remove(position);
        by_owner.remove(&removed.unique);
        relink(&mut self.main);
        self.restore_extensions_by_owner(by_owner);
        debug!(
            "event=page_remove module=graph status=ok chain=main unique={} main_pages={}",
            removed.unique,
            self.main.len()
        );
        Ok(removed)
    }

    /// Moves the main page at `from` so it ends up at `to`.
    pub fn move_main_page(&mut self, from: usize, to: usize) -> Result<(), EditError> {
        self.ensure_position(from)?;
        self.ensure_position(to)?;
        if from == to {
            return Ok(());
        }
        let by_owner = self.take_extensions_by_owner();
        let node = self.main.remove(from);
        self.main.insert(to, node);
        relink(&mut self.main);
        self.restore_extensions_by_owner(by_owner);
        debug!(
            "event=page_move module=graph status=ok unique={} from={} to={}",
            node.unique, from, to
        );
        Ok(())
    }

    fn ensure_position(&self, position: usize) -> Result<(), EditError> {
        if position < self.main.len() {
            Ok(())
        } else {
            Err(EditError::PositionOutOfRange {
                position,
                len: self.main.len(),
            })
        }
    }

    fn take_extensions_by_owner(&mut self) -> BTreeMap<PageId, Vec<ListNode>> {
        let extensions = std::mem::take(&mut self.extensions);
        extensions
            .into_iter()
            .filter_map(|(position, chain)| {
                self.main
                    .get(position)
                    .map(|owner| (owner.unique, chain))
            })
            .collect()
    }

    fn restore_extensions_by_owner(&mut self, mut by_owner: BTreeMap<PageId, Vec<ListNode>>) {
        for (position, owner) in self.main.iter().enumerate() {
            if let Some(chain) = by_owner.remove(&owner.unique) {
                self.extensions.insert(position, chain);
            }
        }
    }
}

/// Rewrites prev/next links so they follow slice order.
fn relink(chain: &mut [ListNode]) {
    let ids = chain.iter().map(|node| node.unique).collect::<Vec<_>>();
    for (index, node) in chain.iter_mut().enumerate() {
        node.prev_index = index.checked_sub(1).map(|prev| ids[prev]);
        node.next_index = ids.get(index + 1).copied();
    }
}
