//! Upload-then-annotate flow and its duplicate-aware wrapper

mod orchestrator;
mod pipeline;

pub use orchestrator::UploadOrchestrator;
pub use pipeline::UploadPipeline;
