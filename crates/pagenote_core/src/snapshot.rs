//! Snapshot naming and the shared view read by the periodic capture task.
//!
//! # Responsibility
//! - Name the raster file captured for the page rendered at one position.
//! - Hand readers a consistent view while edits replace it.
//!
//! # Invariants
//! - Readers only ever see a whole `NoteView`; edits are applied to a copy and
//!   swapped in under the write lock.
//! - Snapshot files are named by page identity, so reordering pages never
//!   reassigns an existing snapshot.

use crate::graph::linearize::NoteView;
use crate::model::node::PageId;
use std::sync::{Arc, PoisonError, RwLock};

const SNAPSHOT_EXTENSION: &str = "png";

/// Where the capture task stores one page snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotTarget {
    /// Per-document folder name supplied by the host (e.g. a content hash).
    pub document_key: String,
    pub page: PageId,
    pub file_name: String,
}

impl SnapshotTarget {
    /// `document_key/file_name`, always with `/` separators.
    pub fn relative_path(&self) -> String {
        format!("{}/{}", self.document_key, self.file_name)
    }
}

/// Resolves the snapshot target for the main page rendered at `position`.
///
/// Returns `None` when `position` is past the end or `document_key` is blank.
pub fn snapshot_target(
    view: &NoteView,
    document_key: &str,
    position: usize,
) -> Option<SnapshotTarget> {
    let document_key = document_key.trim();
    if document_key.is_empty() {
        return None;
    }
    let page = view.main_page(position)?.unique;
    Some(SnapshotTarget {
        document_key: document_key.to_string(),
        page,
        file_name: format!("{page}.{SNAPSHOT_EXTENSION}"),
    })
}

/// Copy-on-write holder shared between the editor and the capture task.
#[derive(Debug, Clone)]
pub struct SharedView {
    inner: Arc<RwLock<Arc<NoteView>>>,
}

impl SharedView {
    pub fn new(view: NoteView) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(view))),
        }
    }

    /// Current view. Later edits do not affect the returned snapshot.
    pub fn snapshot(&self) -> Arc<NoteView> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Replaces the whole view.
    pub fn replace(&self, view: NoteView) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(view);
    }

    /// Applies `edit` to a copy and publishes it only when `edit` succeeds.
    pub fn update<T, E>(
        &self,
        edit: impl FnOnce(&mut NoteView) -> Result<T, E>,
    ) -> Result<T, E> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = NoteView::clone(&guard);
        let value = edit(&mut next)?;
        *guard = Arc::new(next);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{snapshot_target, SharedView};
    use crate::graph::edit::EditError;
    use crate::graph::linearize::NoteView;
    use crate::model::node::{ListNode, MAIN_TAG};
    use std::thread;

    fn two_page_view() -> NoteView {
        let mut view = NoteView::single_page();
        view.main.push(ListNode::detached(7, MAIN_TAG));
        view.main[0].next_index = Some(7);
        view.main[1].prev_index = Some(0);
        view.next_page = 8;
        view
    }

    #[test]
    fn snapshot_target_uses_page_identity() {
        let view = two_page_view();
        let target = snapshot_target(&view, "abc123", 1).unwrap();
        assert_eq!(target.page, 7);
        assert_eq!(target.file_name, "7.png");
        assert_eq!(target.relative_path(), "abc123/7.png");
    }

    #[test]
    fn snapshot_target_rejects_out_of_range_and_blank_key() {
        let view = two_page_view();
        assert!(snapshot_target(&view, "abc123", 2).is_none());
        assert!(snapshot_target(&view, "  ", 0).is_none());
    }

    #[test]
    fn earlier_snapshot_is_unaffected_by_update() {
        let shared = SharedView::new(NoteView::single_page());
        let before = shared.snapshot();

        shared
            .update(|view| view.append_main_page())
            .unwrap();

        assert_eq!(before.main.len(), 1);
        assert_eq!(shared.snapshot().main.len(), 2);
    }

    #[test]
    fn failed_update_publishes_nothing() {
        let shared = SharedView::new(NoteView::single_page());
        let err = shared
            .update(|view| {
                view.append_main_page()?;
                view.remove_main_page(9)
            })
            .unwrap_err();

        assert!(matches!(err, EditError::PositionOutOfRange { position: 9, .. }));
        assert_eq!(shared.snapshot().main.len(), 1);
    }

    #[test]
    fn readers_on_other_threads_see_whole_views() {
        let shared = SharedView::new(NoteView::single_page());
        let reader = {
            let shared = shared.clone();
            thread::spawn(move || {
                for _ in 0..200 {
                    let view = shared.snapshot();
                    let linked = view
                        .main
                        .windows(2)
                        .all(|pair| pair[0].next_index == Some(pair[1].unique));
                    assert!(linked);
                }
            })
        };

        for _ in 0..50 {
            shared.update(|view| view.append_main_page()).unwrap();
        }
        reader.join().unwrap();
        assert_eq!(shared.snapshot().main.len(), 51);
    }
}
