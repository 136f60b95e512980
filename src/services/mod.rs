pub mod detail_extractor;
pub mod diagnostics;
pub mod llm_service;
pub mod normalizer;
pub mod result_enumerator;
pub mod result_writer;
pub mod search_service;

pub use detail_extractor::DetailExtractor;
pub use diagnostics::{Category, DiagnosticEvent, DiagnosticsSink, RecordingSink, TracingSink};
pub use llm_service::LlmService;
pub use result_enumerator::{EnumerationOutcome, ResultEnumerator};
pub use result_writer::ResultWriter;
pub use search_service::SearchService;
