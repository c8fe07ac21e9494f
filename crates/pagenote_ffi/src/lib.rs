//! Flutter-facing bridge over `pagenote_core`.

pub mod api;
