//! Analysis pipeline.
//!
//! Analyzers produce per-dimension results; the remaining stages turn
//! their suggestions into a prioritized, themed list plus a summary:
//! aggregate → prioritize → group → summarize.

pub mod aggregator;
pub mod analyzers;
pub mod grouper;
pub mod prioritizer;
pub mod summary;

pub use aggregator::aggregate;
pub use analyzers::{run_all, AnalyzerKind};
pub use grouper::group;
pub use prioritizer::prioritize;
pub use summary::generate as generate_summary;
