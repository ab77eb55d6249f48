//! CVS Annotator — annotation record store for surgical frame review.
//!
//! A human annotator steps through still frames extracted from surgical
//! videos, toggles categorical flags and three ordinal criteria scores, and
//! attaches free-text comments. This crate is the core behind that tool: it
//! discovers frames on disk, maintains the per-frame annotation table,
//! exposes cursor-based navigation over it (sequential, shuffled, and
//! filtered), and persists the table together with an append-only undo
//! history after every edit. Rendering and input handling live in a separate
//! display layer that drives [`AnnotationStore`].

pub mod config;
pub mod discover;
pub mod history;
pub mod model;
pub mod storage;
pub mod store;

pub use store::{AnnotationStore, Direction, StoreError};
