//! Tree diff engine.
//!
//! Sibling lists are aligned by content rather than by position, so an
//! inserted provision does not make every later (renumbered) sibling look
//! modified.

mod align;
mod change;
mod engine;
mod similarity;

pub use align::{align, AlignStep};
pub use change::{ChangeRecord, ChangeSet, ChangeSummary, ChangeType};
pub use engine::{diff, DiffEngine};
pub use similarity::similarity;
