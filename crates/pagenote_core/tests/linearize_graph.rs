use pagenote_core::{
    linearize, linearize_strict, ChainKind, GraphError, ListNode, NoteGraph, PageId,
};

fn link(raw: i64) -> Option<PageId> {
    if raw == -1 {
        None
    } else {
        Some(PageId::try_from(raw).unwrap())
    }
}

fn node(unique: PageId, next: i64, prev: i64, key: i64, tag: i32) -> ListNode {
    ListNode {
        unique,
        next_index: link(next),
        prev_index: link(prev),
        key_index: link(key),
        tag,
    }
}

fn graph(next_page: PageId, nodes: &[ListNode]) -> NoteGraph {
    let mut graph = NoteGraph::new(next_page);
    for node in nodes {
        graph.insert(*node);
    }
    graph
}

fn uniques(nodes: &[ListNode]) -> Vec<PageId> {
    nodes.iter().map(|node| node.unique).collect()
}

#[test]
fn two_page_document_linearizes_in_link_order() {
    let g = graph(2, &[node(0, 1, -1, -1, 0), node(1, -1, 0, -1, 0)]);

    let result = linearize(&g);
    assert!(result.is_clean());
    assert!(!result.synthesized);
    assert_eq!(result.view.main, vec![node(0, 1, -1, -1, 0), node(1, -1, 0, -1, 0)]);
    assert!(result.view.extensions.is_empty());
    assert_eq!(result.view.next_page, 2);
}

#[test]
fn main_order_follows_links_not_ids() {
    let g = graph(
        40,
        &[
            node(30, -1, 10, -1, 0),
            node(20, 10, -1, -1, 0),
            node(10, 30, 20, -1, 0),
        ],
    );

    let view = linearize_strict(&g).unwrap();
    assert_eq!(uniques(&view.main), vec![20, 10, 30]);
}

#[test]
fn missing_head_synthesizes_default_page_and_resets_counter() {
    let g = graph(
        17,
        &[
            node(4, -1, 3, -1, 0),
            node(5, 6, -1, -1, 2),
            node(6, -1, 5, -1, 2),
        ],
    );

    let result = linearize(&g);
    assert!(result.synthesized);
    assert!(result.is_clean());
    assert_eq!(result.view.main, vec![ListNode::default_head()]);
    assert!(result.view.extensions.is_empty());
    assert_eq!(result.view.next_page, 1);
}

#[test]
fn empty_table_synthesizes_default_page() {
    let result = linearize(&NoteGraph::default());
    assert!(result.synthesized);
    assert_eq!(uniques(&result.view.main), vec![0]);
    assert_eq!(result.view.next_page, 1);
}

#[test]
fn extensions_are_keyed_by_owner_position_not_owner_id() {
    let g = graph(
        50,
        &[
            node(10, 20, -1, -1, 0),
            node(20, 30, 10, 40, 0),
            node(30, -1, 20, -1, 0),
            node(40, 41, -1, 1, 1),
            node(41, -1, 40, 1, 1),
        ],
    );

    let view = linearize_strict(&g).unwrap();
    assert_eq!(uniques(&view.main), vec![10, 20, 30]);
    assert_eq!(view.extensions.keys().copied().collect::<Vec<_>>(), vec![1]);
    assert!(!view.extensions.contains_key(&20));
    assert_eq!(uniques(&view.extensions[&1]), vec![40, 41]);
    assert_eq!(uniques(view.extension_pages(1)), vec![40, 41]);
    assert!(view.extension_pages(0).is_empty());
    assert_eq!(view.owner_links().get(&20), Some(&40));
}

#[test]
fn broken_main_link_truncates_at_last_valid_page() {
    let g = graph(3, &[node(0, 1, -1, -1, 0), node(1, 9, 0, -1, 0)]);

    let result = linearize(&g);
    assert_eq!(uniques(&result.view.main), vec![0, 1]);
    assert_eq!(result.view.main[1].next_index, None);
    assert_eq!(
        result.issues,
        vec![GraphError::BrokenChain {
            chain: ChainKind::Main,
            from: 1,
            missing: 9,
        }]
    );

    let err = linearize_strict(&g).unwrap_err();
    assert_eq!(err.code(), "broken_chain");
}

#[test]
fn two_page_cycle_terminates_with_cycle_error() {
    let g = graph(2, &[node(0, 1, -1, -1, 0), node(1, 0, 0, -1, 0)]);

    let result = linearize(&g);
    assert_eq!(uniques(&result.view.main), vec![0, 1]);
    assert_eq!(result.view.main[1].next_index, None);
    assert_eq!(
        result.issues,
        vec![GraphError::Cycle {
            chain: ChainKind::Main,
            repeated: 0,
        }]
    );
}

#[test]
fn self_loop_in_extension_chain_is_reported_for_that_chain() {
    let g = graph(
        3,
        &[
            node(0, -1, -1, 1, 0),
            node(1, 2, -1, 0, 1),
            node(2, 2, 1, 0, 1),
        ],
    );

    let result = linearize(&g);
    assert_eq!(uniques(&result.view.main), vec![0]);
    assert_eq!(uniques(&result.view.extensions[&0]), vec![1, 2]);
    assert_eq!(
        result.issues,
        vec![GraphError::Cycle {
            chain: ChainKind::Extension { owner_position: 0 },
            repeated: 2,
        }]
    );
}

#[test]
fn missing_extension_head_is_a_broken_chain_without_entry() {
    let g = graph(
        3,
        &[node(0, 1, -1, -1, 0), node(1, -1, 0, 77, 0)],
    );

    let result = linearize(&g);
    assert_eq!(uniques(&result.view.main), vec![0, 1]);
    assert!(result.view.extensions.is_empty());
    assert_eq!(
        result.issues,
        vec![GraphError::BrokenChain {
            chain: ChainKind::Extension { owner_position: 1 },
            from: 1,
            missing: 77,
        }]
    );
    assert!(result.issues[0].to_string().contains("extension@1"));
}

#[test]
fn unreachable_pages_are_dropped_from_view() {
    let g = graph(
        9,
        &[
            node(0, -1, -1, -1, 0),
            node(5, -1, 4, -1, 0),
            node(7, 8, -1, 0, 1),
            node(8, -1, 7, 0, 1),
        ],
    );

    let result = linearize(&g);
    assert!(result.is_clean());
    assert_eq!(uniques(&result.view.main), vec![0]);
    assert!(result.view.extensions.is_empty());
    assert_eq!(result.view.page_count(), 1);
}
