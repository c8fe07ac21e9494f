//! Document storage abstractions.
//!
//! # Responsibility
//! - Define the byte-stream contract the host fulfils for one document.
//! - Keep file/URI access out of graph and service logic.
//!
//! # Invariants
//! - Stores move whole documents; they never interpret the bytes.

pub mod document_store;
