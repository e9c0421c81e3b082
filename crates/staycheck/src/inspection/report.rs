use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{Issue, RoomId};
use crate::vision::PhotoComparison;

/// Composed damage report for one check-in/check-out pair. Assembled on
/// demand; never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct DamageReport {
    pub property_name: String,
    pub guest_name: Option<String>,
    pub checkin_date: DateTime<Utc>,
    pub checkout_date: DateTime<Utc>,
    pub issues: Vec<Issue>,
    pub total_estimated_cost: f64,
    pub comparison_photos: Vec<ComparisonEntry>,
}

/// Result of contrasting a room's check-in photo with its check-out photo.
///
/// Comparisons are advisory: they never mutate stored issues and do not
/// contribute to the report total. `comparison_available` is false when the
/// vision backend was unreachable and the neutral comparison stands in.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonEntry {
    pub room_id: RoomId,
    pub room_name: String,
    pub before_photo: String,
    pub after_photo: String,
    pub comparison: PhotoComparison,
    pub comparison_available: bool,
}

/// One row of the per-property cost history: an issue joined to the check it
/// was recorded under.
#[derive(Debug, Clone, Serialize)]
pub struct CostHistoryEntry {
    pub issue: Issue,
    pub date: DateTime<Utc>,
    pub guest: Option<String>,
}
