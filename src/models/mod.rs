pub mod paper;
pub mod summary;

pub use paper::{
    ExtractionOutcome, PaperRecord, PaperReference, RecordField, SearchCriteria,
};
pub use summary::{HarvestRun, RunStatus, RunSummary};
