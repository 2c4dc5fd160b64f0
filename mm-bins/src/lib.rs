//! Shared scaffolding for the `paper` and `live` binaries.

pub mod common;
