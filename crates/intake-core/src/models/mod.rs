//! Data models shared by the pipeline stages
//!
//! Policy tables are plain immutable values: build them once (from defaults or configuration)
//! and hand them to the pipeline explicitly.

mod artifact;
mod hash;
mod policy;
mod rules;
mod scan;
mod verdict;

pub use artifact::ArtifactSummary;
pub use hash::ContentHash;
pub use policy::{PolicyError, TypePolicy};
pub use rules::{ContentRules, PatternCategory, SuspiciousPattern};
pub use scan::ScanOutcome;
pub use verdict::InspectionVerdict;
