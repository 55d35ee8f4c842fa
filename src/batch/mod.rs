pub mod orchestrator;
pub mod state;

pub use orchestrator::{BatchOrchestrator, BatchReport, BatchStatus};
