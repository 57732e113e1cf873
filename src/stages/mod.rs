//! Transform stages over the [`IdentifierStore`](crate::store::IdentifierStore).
//!
//! Each stage computes its pending deletions or reassignments from the full
//! tables first and applies them afterwards, writing what it discarded to the
//! report sink.

pub mod biotype;
pub mod clean;
pub mod dedup;
pub mod delink;
pub mod merge;

pub use biotype::{BiotypeOutcome, biotype_filter, filter_entities, filter_reference};
pub use clean::{CleanOptions, CleanOutcome, clean, clean_empties};
pub use dedup::{DedupOutcome, dedup};
pub use delink::{DelinkOutcome, delink};
pub use merge::{MergeOutcome, merge_by_name};
