//! Shared domain types for the gesture desk workspace.

pub mod domain;
