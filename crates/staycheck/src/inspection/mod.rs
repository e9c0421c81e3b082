//! Inspection core: issue extraction from photo analyses, damage report
//! aggregation across a check-in/check-out pair, and the cost history
//! projection.

mod extractor;
mod report;
mod service;

pub use extractor::{extract_issues, PhotoIngest};
pub use report::{ComparisonEntry, CostHistoryEntry, DamageReport};
pub use service::{InspectionError, InspectionService};
