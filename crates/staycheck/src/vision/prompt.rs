//! Prompt construction and lenient response parsing shared by the HTTP
//! backends.

use super::{PhotoComparison, RoomAnalysis};

pub(crate) fn analysis_prompt(room_name: &str, checklist: &[String]) -> String {
    let checklist_block = checklist
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Analyze this photo of a {room_name} from a short-term-rental property.\n\
         \n\
         Expected items in this room:\n\
         {checklist_block}\n\
         \n\
         Please identify:\n\
         1. Which items from the checklist appear to be MISSING\n\
         2. Any visible DAMAGE to furniture, walls, floors, or items\n\
         3. Overall cleanliness issues\n\
         \n\
         Respond in JSON format:\n\
         {{\n\
             \"missing_items\": [\"item1\", \"item2\"],\n\
             \"damage_detected\": [\"description of damage 1\"],\n\
             \"cleanliness_issues\": [\"issue1\"],\n\
             \"condition_score\": 1-10\n\
         }}"
    )
}

pub(crate) fn comparison_prompt(room_name: &str) -> String {
    format!(
        "Compare these two photos of a {room_name}.\n\
         The first image is BEFORE the guest stay (check-in).\n\
         The second image is AFTER the guest stay (check-out).\n\
         \n\
         Identify:\n\
         1. Any NEW damage that appeared\n\
         2. Any items that are now MISSING\n\
         3. Significant changes in condition\n\
         \n\
         Respond in JSON format:\n\
         {{\n\
             \"new_damage\": [\"description\"],\n\
             \"missing_items\": [\"item\"],\n\
             \"condition_change\": \"better/same/worse\",\n\
             \"recommended_claim\": true/false,\n\
             \"estimated_damage_cost\": 0.00\n\
         }}"
    )
}

/// Parse a single-photo analysis, tolerating code fences, surrounding prose,
/// and missing fields. Anything unparseable becomes the neutral result.
pub(crate) fn parse_analysis(raw: &str) -> RoomAnalysis {
    extract_json(raw)
        .and_then(|json| serde_json::from_str(json).ok())
        .unwrap_or_else(RoomAnalysis::neutral)
}

/// Comparison counterpart of [`parse_analysis`].
pub(crate) fn parse_comparison(raw: &str) -> PhotoComparison {
    extract_json(raw)
        .and_then(|json| serde_json::from_str(json).ok())
        .unwrap_or_else(PhotoComparison::neutral)
}

fn extract_json(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}
