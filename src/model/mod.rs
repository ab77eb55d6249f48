//! Data models for the annotation store.

mod modes;
mod record;

pub use modes::TraversalModes;
pub use record::{AnnotationRecord, CRITERIA_COUNT};
