//! Persisted table -> ordered in-memory view.

use super::{ChainKind, GraphError};
use crate::model::node::{ListNode, NoteGraph, PageId, DEFAULT_HEAD_ID};
use log::{debug, warn};
use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

/// Ordered view of one document between load and save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteView {
    /// Main pages in traversal order. Index is the positional rank.
    pub main: Vec<ListNode>,
    /// Extension chains keyed by the owner's positional rank in `main`.
    pub extensions: BTreeMap<usize, Vec<ListNode>>,
    /// Page counter carried through to the next save.
    pub next_page: PageId,
}

impl NoteView {
    /// View of a fresh document: one default page, counter at 1.
    pub fn single_page() -> Self {
        Self {
            main: vec![ListNode::default_head()],
            extensions: BTreeMap::new(),
            next_page: DEFAULT_HEAD_ID + 1,
        }
    }

    pub fn main_page(&self, position: usize) -> Option<&ListNode> {
        self.main.get(position)
    }

    /// Extension pages for the main page at `position`; empty when none.
    pub fn extension_pages(&self, position: usize) -> &[ListNode] {
        self.extensions
            .get(&position)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Positional rank of the main page with `unique`.
    pub fn position_of(&self, unique: PageId) -> Option<usize> {
        self.main.iter().position(|node| node.unique == unique)
    }

    /// Owner `unique` -> extension head `unique` for every non-empty chain.
    pub fn owner_links(&self) -> BTreeMap<PageId, PageId> {
        self.extensions
            .iter()
            .filter_map(|(position, chain)| {
                let owner = self.main.get(*position)?;
                let head = chain.iter().find(|node| node.is_chain_head())?;
                Some((owner.unique, head.unique))
            })
            .collect()
    }

    /// Total pages held by the view, main and extension.
    pub fn page_count(&self) -> usize {
        self.main.len() + self.extensions.values().map(Vec::len).sum::<usize>()
    }

    /// Whether `unique` is held anywhere in the view, main or extension.
    pub fn contains_page(&self, unique: PageId) -> bool {
        self.main.iter().any(|node| node.unique == unique)
            || self
                .extensions
                .values()
                .flatten()
                .any(|node| node.unique == unique)
    }
}

/// Linearization output with any corruption found on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Linearized {
    pub view: NoteView,
    /// The table had no main head and a default page was synthesized.
    pub synthesized: bool,
    /// Chains truncated at the last valid page, in discovery order.
    pub issues: Vec<GraphError>,
}

impl Linearized {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns the view, or the first issue when any chain was truncated.
    pub fn into_strict(self) -> Result<NoteView, GraphError> {
        match self.issues.into_iter().next() {
            Some(issue) => Err(issue),
            None => Ok(self.view),
        }
    }
}

/// Rebuilds the main sequence and extension chains from `graph`.
///
/// Broken links and cycles truncate the affected chain at the last valid
/// page, whose `next_index` is cleared, and are reported in
/// `Linearized::issues`. Unreachable pages are dropped silently.
pub fn linearize(graph: &NoteGraph) -> Linearized {
    let started_at = Instant::now();
    let mut issues = Vec::new();

    let heads = graph.main_heads();
    if heads.len() > 1 {
        warn!(
            "event=graph_linearize module=graph status=warn reason=multiple_heads heads={} chosen={}",
            heads.len(),
            heads[0].unique
        );
    }

    let Some(head) = heads.first().copied() else {
        debug!(
            "event=graph_linearize module=graph status=ok synthesized=true table_pages={}",
            graph.len()
        );
        return Linearized {
            view: NoteView::single_page(),
            synthesized: true,
            issues,
        };
    };

    let main = walk_chain(graph, *head, ChainKind::Main, &mut issues);

    let mut extensions = BTreeMap::new();
    for (position, owner) in main.iter().enumerate() {
        let Some(head_id) = owner.key_index else {
            continue;
        };
        let chain = ChainKind::Extension {
            owner_position: position,
        };
        match graph.get(head_id) {
            Some(ext_head) => {
                extensions.insert(position, walk_chain(graph, *ext_head, chain, &mut issues));
            }
            None => {
                let issue = GraphError::BrokenChain {
                    chain,
                    from: owner.unique,
                    missing: head_id,
                };
                warn!(
                    "event=graph_linearize module=graph status=warn error_code={} chain={} from={} missing={}",
                    issue.code(),
                    chain,
                    owner.unique,
                    head_id
                );
                issues.push(issue);
            }
        }
    }

    let view = NoteView {
        main,
        extensions,
        next_page: graph.next_page,
    };
    let dropped = graph.len().saturating_sub(view.page_count());
    debug!(
        "event=graph_linearize module=graph status=ok synthesized=false main_pages={} extension_chains={} dropped_pages={} issues={} duration_us={}",
        view.main.len(),
        view.extensions.len(),
        dropped,
        issues.len(),
        started_at.elapsed().as_micros()
    );

    Linearized {
        view,
        synthesized: false,
        issues,
    }
}

/// Like [`linearize`], but any truncated chain is an error.
pub fn linearize_strict(graph: &NoteGraph) -> Result<NoteView, GraphError> {
    linearize(graph).into_strict()
}

fn walk_chain(
    graph: &NoteGraph,
    head: ListNode,
    chain: ChainKind,
    issues: &mut Vec<GraphError>,
) -> Vec<ListNode> {
    let issues_before = issues.len();
    let mut visited = HashSet::new();
    let mut nodes = Vec::new();
    let mut current = head;

    loop {
        if !visited.insert(current.unique) {
            warn!(
                "event=graph_walk module=graph status=warn error_code=cycle chain={} repeated={}",
                chain, current.unique
            );
            issues.push(GraphError::Cycle {
                chain,
                repeated: current.unique,
            });
            break;
        }
        nodes.push(current);

        let Some(next_id) = current.next_index else {
            break;
        };
        match graph.get(next_id) {
            Some(next) => current = *next,
            None => {
                warn!(
                    "event=graph_walk module=graph status=warn error_code=broken_chain chain={} from={} missing={}",
                    chain, current.unique, next_id
                );
                issues.push(GraphError::BrokenChain {
                    chain,
                    from: current.unique,
                    missing: next_id,
                });
                break;
            }
        }
    }

    if issues.len() > issues_before {
        if let Some(last) = nodes.last_mut() {
            last.next_index = None;
        }
    }
    nodes
}
