//! Persisted note-graph records.
//!
//! # Responsibility
//! - Define the flat keyed table (`NoteGraph`) exactly as stored on disk.
//! - Map the wire `-1` link sentinel onto `Option<PageId>`.
//!
//! # Invariants
//! - `unique` is the table key and is never reassigned by core.
//! - `tag == MAIN_TAG` marks a main-sequence page; any other tag marks an
//!   extension page and is otherwise opaque.
//! - Table order carries no meaning; `BTreeMap` only makes encoding stable.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stable page identity. Doubles as the table key.
pub type PageId = u32;

/// Tag value carried by main-sequence pages.
pub const MAIN_TAG: i32 = 0;

/// Tag assigned to newly created extension pages unless configured otherwise.
pub const DEFAULT_EXTENSION_TAG: i32 = 1;

/// `unique` of the page synthesized for documents without a main head.
pub const DEFAULT_HEAD_ID: PageId = 0;

/// One persisted page record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNode {
    /// Stable identity, equal to the table key.
    pub unique: PageId,
    /// Successor in the same chain. `None` terminates the chain.
    #[serde(with = "link")]
    pub next_index: Option<PageId>,
    /// Predecessor in the same chain. `None` marks the chain head.
    #[serde(with = "link")]
    pub prev_index: Option<PageId>,
    /// Main page: head of the owned extension chain.
    /// Extension page: positional rank of the owner at last save.
    #[serde(with = "link")]
    pub key_index: Option<PageId>,
    pub tag: i32,
}

impl ListNode {
    /// Creates an unlinked page.
    pub fn detached(unique: PageId, tag: i32) -> Self {
        Self {
            unique,
            next_index: None,
            prev_index: None,
            key_index: None,
            tag,
        }
    }

    /// Page synthesized when a document has no main-sequence head.
    pub fn default_head() -> Self {
        Self::detached(DEFAULT_HEAD_ID, MAIN_TAG)
    }

    pub fn is_main(&self) -> bool {
        self.tag == MAIN_TAG
    }

    /// Returns whether this page starts its chain.
    pub fn is_chain_head(&self) -> bool {
        self.prev_index.is_none()
    }

    /// Returns whether this page is a candidate main-sequence head.
    pub fn is_main_head(&self) -> bool {
        self.is_main() && self.is_chain_head()
    }
}

/// Root persisted object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteGraph {
    /// Next page id to allocate. Advisory; never validated against `table`.
    pub next_page: PageId,
    /// All pages keyed by `unique`.
    #[serde(rename = "noteMap")]
    pub table: BTreeMap<PageId, ListNode>,
}

impl NoteGraph {
    pub fn new(next_page: PageId) -> Self {
        Self {
            next_page,
            table: BTreeMap::new(),
        }
    }

    /// Single default page with the counter reset to 1.
    pub fn empty_document() -> Self {
        let mut graph = Self::new(DEFAULT_HEAD_ID + 1);
        graph.insert(ListNode::default_head());
        graph
    }

    /// Inserts a page under its own `unique`, returning the replaced page.
    pub fn insert(&mut self, node: ListNode) -> Option<ListNode> {
        self.table.insert(node.unique, node)
    }

    pub fn get(&self, unique: PageId) -> Option<&ListNode> {
        self.table.get(&unique)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Main-sequence head candidates in ascending `unique` order.
    pub fn main_heads(&self) -> Vec<&ListNode> {
        self.table
            .values()
            .filter(|node| node.is_main_head())
            .collect()
    }
}

/// Serde adapter for link fields stored as integers with `-1` meaning none.
mod link {
    use super::PageId;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    const NONE_SENTINEL: i64 = -1;

    pub fn serialize<S>(value: &Option<PageId>, ser: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(id) => ser.serialize_i64(i64::from(*id)),
            None => ser.serialize_i64(NONE_SENTINEL),
        }
    }

    pub fn deserialize<'de, D>(de: D) -> Result<Option<PageId>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = i64::deserialize(de)?;
        if raw == NONE_SENTINEL {
            return Ok(None);
        }
        PageId::try_from(raw)
            .map(Some)
            .map_err(|_| D::Error::custom(format!("link must be -1 or a page id, got {raw}")))
    }
}

#[cfg(test)]
mod tests {
    use super::{ListNode, NoteGraph, MAIN_TAG};

    #[test]
    fn link_sentinel_maps_to_none_on_the_wire() {
        let node = ListNode::default_head();
        let json = serde_json::to_value(node).unwrap();
        assert_eq!(json["unique"], 0);
        assert_eq!(json["nextIndex"], -1);
        assert_eq!(json["prevIndex"], -1);
        assert_eq!(json["keyIndex"], -1);
        assert_eq!(json["tag"], MAIN_TAG);
    }

    #[test]
    fn negative_link_other_than_sentinel_is_rejected() {
        let raw = r#"{"unique":3,"nextIndex":-2,"prevIndex":-1,"keyIndex":-1,"tag":0}"#;
        let err = serde_json::from_str::<ListNode>(raw).unwrap_err();
        assert!(err.to_string().contains("link must be -1"));
    }

    #[test]
    fn main_heads_are_sorted_by_unique() {
        let mut graph = NoteGraph::new(10);
        graph.insert(ListNode::detached(7, MAIN_TAG));
        graph.insert(ListNode::detached(2, MAIN_TAG));
        graph.insert(ListNode::detached(4, 1));

        let heads = graph
            .main_heads()
            .into_iter()
            .map(|node| node.unique)
            .collect::<Vec<_>>();
        assert_eq!(heads, vec![2, 7]);
    }

    #[test]
    fn empty_document_resets_counter() {
        let graph = NoteGraph::empty_document();
        assert_eq!(graph.next_page, 1);
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.get(0), Some(&ListNode::default_head()));
    }
}
