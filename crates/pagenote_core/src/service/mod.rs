//! Use-case services built on storage and graph primitives.
//!
//! # Responsibility
//! - Orchestrate load/save cycles and emit lifecycle log events.

pub mod document_service;
