//! Persisted note-graph data model.
//!
//! # Responsibility
//! - Define the records that cross the persistence boundary.
//!
//! # Invariants
//! - `unique` values share one namespace across main and extension pages.
//! - Positional rank is derived during traversal and never stored here.

pub mod node;
