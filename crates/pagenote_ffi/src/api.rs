//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose document layout and page edits over the persisted JSON string.
//! - Keep error semantics simple: envelopes with `ok` + `message`.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Functions are stateless; the host owns the JSON between calls.
//! - Updated documents are returned as single-line JSON.

use log::warn;
use pagenote_core::{
    core_version as core_version_inner, decode, encode, flatten,
    init_logging as init_logging_inner, linearize, ping as ping_inner, snapshot_target,
    DocumentConfig, EditError, ListNode, NoteGraph, NoteView,
};

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// One page as seen by the host renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEntry {
    pub unique: u32,
    pub tag: i32,
}

/// Extension pages attached to the main page at `position`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedPages {
    pub position: u32,
    pub pages: Vec<PageEntry>,
}

/// Ordered layout of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLayoutResponse {
    pub ok: bool,
    /// Main pages; index is the render position.
    pub main_pages: Vec<PageEntry>,
    pub extended_pages: Vec<ExtendedPages>,
    pub next_page: u32,
    /// A default page was created because the document had none.
    pub synthesized: bool,
    /// Truncated-chain diagnostics, one per issue.
    pub issues: Vec<String>,
    pub message: String,
}

impl DocumentLayoutResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            main_pages: Vec::new(),
            extended_pages: Vec::new(),
            next_page: 0,
            synthesized: false,
            issues: Vec::new(),
            message: message.into(),
        }
    }
}

/// Result of one page edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpdateResponse {
    pub ok: bool,
    /// Updated document JSON, ready to be written back.
    pub json: Option<String>,
    /// Id of the page created by the edit.
    pub page_id: Option<u32>,
    /// Save-time findings, one per warning. Present on failure too.
    pub warnings: Vec<String>,
    pub message: String,
}

impl DocumentUpdateResponse {
    fn success(
        json: String,
        page_id: u32,
        warnings: Vec<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            ok: true,
            json: Some(json),
            page_id: Some(page_id),
            warnings,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self::failure_with_warnings(Vec::new(), message)
    }

    fn failure_with_warnings(warnings: Vec<String>, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            json: None,
            page_id: None,
            warnings,
            message: message.into(),
        }
    }
}

/// Encoded single-page document for hosts creating a new note file.
#[flutter_rust_bridge::frb(sync)]
pub fn empty_document_json() -> String {
    encode(&NoteGraph::empty_document()).unwrap_or_default()
}

/// Linearizes a persisted document for rendering.
///
/// # FFI contract
/// - Sync call, pure computation.
/// - Undecodable JSON returns `ok=false`; corrupt chains return `ok=true`
///   with the truncated layout and `issues` populated.
#[flutter_rust_bridge::frb(sync)]
pub fn document_layout(json: String) -> DocumentLayoutResponse {
    let graph = match decode(json.as_bytes()) {
        Ok(graph) => graph,
        Err(err) => return DocumentLayoutResponse::failure(format!("document_layout failed: {err}")),
    };
    let linearized = linearize(&graph);
    let view = &linearized.view;

    let main_pages = view.main.iter().map(to_page_entry).collect::<Vec<_>>();
    let extended_pages = view
        .extensions
        .iter()
        .filter(|(_, chain)| !chain.is_empty())
        .map(|(position, chain)| ExtendedPages {
            position: u32::try_from(*position).unwrap_or(u32::MAX),
            pages: chain.iter().map(to_page_entry).collect(),
        })
        .collect::<Vec<_>>();
    let issues = linearized
        .issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();
    let message = if issues.is_empty() {
        format!("Loaded {} page(s).", main_pages.len())
    } else {
        format!(
            "Loaded {} page(s) with {} repaired chain(s).",
            main_pages.len(),
            issues.len()
        )
    };

    DocumentLayoutResponse {
        ok: true,
        main_pages,
        extended_pages,
        next_page: view.next_page,
        synthesized: linearized.synthesized,
        issues,
        message,
    }
}

/// Appends a blank page to the main sequence.
#[flutter_rust_bridge::frb(sync)]
pub fn document_append_main_page(json: String) -> DocumentUpdateResponse {
    edit_document(json.as_str(), "document_append_main_page", |view, _| {
        view.append_main_page()
    })
}

/// Appends an extension page to the main page at `position`.
///
/// # FFI contract
/// - `position` is the render position, not the page id.
/// - Out-of-range positions return `ok=false`.
#[flutter_rust_bridge::frb(sync)]
pub fn document_append_extension_page(json: String, position: u32) -> DocumentUpdateResponse {
    edit_document(
        json.as_str(),
        "document_append_extension_page",
        |view, config| {
            let position = usize::try_from(position).unwrap_or(usize::MAX);
            view.append_extension_page(position, config.extension_tag)
        },
    )
}

/// Returns `document_key/<page id>.png` for the page rendered at `position`.
///
/// Empty string when the document cannot be decoded, the position is out of
/// range, or `document_key` is blank.
#[flutter_rust_bridge::frb(sync)]
pub fn snapshot_file_name(json: String, document_key: String, position: u32) -> String {
    let Ok(graph) = decode(json.as_bytes()) else {
        return String::new();
    };
    let view = linearize(&graph).view;
    let position = usize::try_from(position).unwrap_or(usize::MAX);
    snapshot_target(&view, document_key.as_str(), position)
        .map(|target| target.relative_path())
        .unwrap_or_default()
}

fn edit_document(
    json: &str,
    operation: &str,
    edit: impl FnOnce(&mut NoteView, &DocumentConfig) -> Result<u32, EditError>,
) -> DocumentUpdateResponse {
    let config = DocumentConfig::default();
    let graph = match decode(json.as_bytes()) {
        Ok(graph) => graph,
        Err(err) => return DocumentUpdateResponse::failure(format!("{operation} failed: {err}")),
    };
    let mut view = linearize(&graph).view;
    let page_id = match edit(&mut view, &config) {
        Ok(page_id) => page_id,
        Err(err) => return DocumentUpdateResponse::failure(format!("{operation} failed: {err}")),
    };

    let flattened = match flatten(&view, config.flatten_options()) {
        Ok(flattened) => flattened,
        Err(err) => return DocumentUpdateResponse::failure(format!("{operation} failed: {err}")),
    };
    let warnings = flattened
        .warnings
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();
    for warning in &warnings {
        warn!("event={operation} module=ffi status=warn detail={warning}");
    }

    // The saved table must still reach the new page, or the edit is lost on reload.
    if !linearize(&flattened.graph).view.contains_page(page_id) {
        warn!("event={operation} module=ffi status=error reason=page_unreachable page_id={page_id}");
        return DocumentUpdateResponse::failure_with_warnings(
            warnings,
            format!("{operation} failed: page {page_id} would not survive reload"),
        );
    }

    match encode(&flattened.graph) {
        Ok(json) => DocumentUpdateResponse::success(json, page_id, warnings, "Page added."),
        Err(err) => DocumentUpdateResponse::failure(format!("{operation} failed: {err}")),
    }
}

fn to_page_entry(node: &ListNode) -> PageEntry {
    PageEntry {
        unique: node.unique,
        tag: node.tag,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, document_append_extension_page, document_append_main_page,
        document_layout, empty_document_json, init_logging, ping, snapshot_file_name,
    };

    const TWO_PAGES: &str = r#"{"nextPage":2,"noteMap":{"0":{"unique":0,"nextIndex":1,"prevIndex":-1,"keyIndex":-1,"tag":0},"1":{"unique":1,"nextIndex":-1,"prevIndex":0,"keyIndex":-1,"tag":0}}}"#;

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn document_layout_lists_main_pages_in_order() {
        let response = document_layout(TWO_PAGES.to_string());
        assert!(response.ok, "{}", response.message);
        assert_eq!(
            response
                .main_pages
                .iter()
                .map(|page| page.unique)
                .collect::<Vec<_>>(),
            vec![0, 1]
        );
        assert!(response.extended_pages.is_empty());
        assert!(!response.synthesized);
        assert_eq!(response.next_page, 2);
    }

    #[test]
    fn document_layout_rejects_malformed_json() {
        let response = document_layout("{".to_string());
        assert!(!response.ok);
        assert!(response.message.contains("document_layout failed"));
    }

    #[test]
    fn empty_document_round_trips_through_layout() {
        let response = document_layout(empty_document_json());
        assert!(response.ok);
        assert_eq!(response.main_pages.len(), 1);
        assert!(!response.synthesized);
    }

    #[test]
    fn extension_page_appears_in_layout_after_update() {
        let update = document_append_extension_page(TWO_PAGES.to_string(), 0);
        assert!(update.ok, "{}", update.message);
        assert_eq!(update.page_id, Some(2));
        assert!(update.warnings.is_empty());

        let layout = document_layout(update.json.unwrap());
        assert_eq!(layout.extended_pages.len(), 1);
        assert_eq!(layout.extended_pages[0].position, 0);
        assert_eq!(layout.extended_pages[0].pages[0].unique, 2);
        assert_eq!(layout.extended_pages[0].pages[0].tag, 1);
        assert_eq!(layout.next_page, 3);
    }

    #[test]
    fn extension_page_rejects_out_of_range_position() {
        let update = document_append_extension_page(TWO_PAGES.to_string(), 5);
        assert!(!update.ok);
        assert!(update.json.is_none());
        assert!(update.message.contains("out of range"));
    }

    #[test]
    fn main_page_append_extends_sequence() {
        let update = document_append_main_page(TWO_PAGES.to_string());
        assert!(update.ok, "{}", update.message);
        let json = update.json.unwrap();
        assert!(!json.contains('\n'));

        let layout = document_layout(json);
        assert_eq!(layout.main_pages.len(), 3);
        assert_eq!(layout.main_pages[2].unique, 2);
    }

    #[test]
    fn extension_page_lost_on_reload_is_reported_as_failure() {
        let first = document_append_extension_page(TWO_PAGES.to_string(), 0);
        assert!(first.ok, "{}", first.message);
        assert!(first.warnings.is_empty());
        let third_main = document_append_main_page(first.json.unwrap());
        assert!(third_main.ok, "{}", third_main.message);
        let json = third_main.json.unwrap();

        // Page 3 ranks at position 2, but key 2 holds the extension page 2.
        let update = document_append_extension_page(json.clone(), 2);
        assert!(!update.ok);
        assert!(update.json.is_none());
        assert!(update.page_id.is_none());
        assert!(update.message.contains("page 4 would not survive reload"));
        assert_eq!(update.warnings.len(), 1);
        assert!(update.warnings[0].contains("ranked owner is 3"));

        let layout = document_layout(json);
        assert_eq!(
            layout
                .main_pages
                .iter()
                .map(|page| page.unique)
                .collect::<Vec<_>>(),
            vec![0, 1, 3]
        );
        assert_eq!(layout.extended_pages.len(), 1);
        assert_eq!(layout.extended_pages[0].pages[0].unique, 2);
    }

    #[test]
    fn snapshot_file_name_resolves_page_identity() {
        assert_eq!(
            snapshot_file_name(TWO_PAGES.to_string(), "hash01".to_string(), 1),
            "hash01/1.png"
        );
        assert_eq!(
            snapshot_file_name(TWO_PAGES.to_string(), "hash01".to_string(), 2),
            ""
        );
    }
}
