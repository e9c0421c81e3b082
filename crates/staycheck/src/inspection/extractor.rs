use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::{CheckId, Issue, NewIssue, PhotoId, Severity};
use crate::vision::RoomAnalysis;

/// Outcome of ingesting one uploaded photo.
///
/// `analysis_available` is false when the vision backend could not be
/// reached and the recorded analysis is the neutral fallback — distinct from
/// a backend that genuinely found nothing.
#[derive(Debug, Clone, Serialize)]
pub struct PhotoIngest {
    pub photo_id: PhotoId,
    pub analysis: RoomAnalysis,
    pub analysis_available: bool,
    pub issues: Vec<Issue>,
}

/// Convert a single-photo analysis into issue records for a check.
///
/// Every missing item becomes a medium-severity issue costed by the room's
/// checklist (0 when the name is not on it); every damage finding becomes a
/// high-severity issue with no item name and no cost. Missing items come
/// first, then damage, each in source order. Repeated uploads for the same
/// room and check produce duplicate issues; nothing here deduplicates.
pub fn extract_issues(
    check_id: CheckId,
    analysis: &RoomAnalysis,
    replacement_costs: &BTreeMap<String, f64>,
) -> Vec<NewIssue> {
    let mut issues = Vec::new();

    for missing in &analysis.missing_items {
        let cost = replacement_costs.get(missing).copied().unwrap_or(0.0);
        issues.push(NewIssue {
            check_id,
            description: format!("Missing: {missing}"),
            item_name: Some(missing.clone()),
            estimated_cost: cost,
            severity: Severity::Medium,
        });
    }

    for damage in &analysis.damage_detected {
        issues.push(NewIssue {
            check_id,
            description: damage.clone(),
            item_name: None,
            estimated_cost: 0.0,
            severity: Severity::High,
        });
    }

    issues
}
