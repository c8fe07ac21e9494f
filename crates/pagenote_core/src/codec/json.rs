use super::{DecodeError, EncodeError};
use crate::model::node::NoteGraph;
use log::{debug, error};

/// Decodes persisted bytes into a `NoteGraph`.
///
/// # Errors
/// - `DecodeError::Malformed` on invalid JSON, missing members or wrong types.
/// - `DecodeError::KeyMismatch` when a table key disagrees with its page.
pub fn decode(bytes: &[u8]) -> Result<NoteGraph, DecodeError> {
    let graph: NoteGraph = serde_json::from_slice(bytes).map_err(|err| {
        error!(
            "event=document_decode module=codec status=error error_code=malformed line={} column={}",
            err.line(),
            err.column()
        );
        DecodeError::Malformed(err)
    })?;

    if let Some((key, node)) = graph.table.iter().find(|(key, node)| **key != node.unique) {
        error!(
            "event=document_decode module=codec status=error error_code=key_mismatch key={} unique={}",
            key, node.unique
        );
        return Err(DecodeError::KeyMismatch {
            key: *key,
            unique: node.unique,
        });
    }

    debug!(
        "event=document_decode module=codec status=ok pages={} next_page={}",
        graph.len(),
        graph.next_page
    );
    Ok(graph)
}

/// Encodes a `NoteGraph` as single-line JSON.
///
/// Member order is `nextPage`, `noteMap`; table keys ascend numerically.
pub fn encode(graph: &NoteGraph) -> Result<String, EncodeError> {
    let json = serde_json::to_string(graph).map_err(EncodeError)?;
    debug!(
        "event=document_encode module=codec status=ok pages={} bytes={}",
        graph.len(),
        json.len()
    );
    Ok(json)
}
