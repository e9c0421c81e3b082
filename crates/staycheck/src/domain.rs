use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned by the store for a property.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PropertyId(pub i64);

/// Identifier assigned by the store for a room.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoomId(pub i64);

/// Identifier assigned by the store for a checklist item.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ItemId(pub i64);

/// Identifier assigned by the store for a check-in/check-out event.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CheckId(pub i64);

/// Identifier assigned by the store for an uploaded photo.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PhotoId(pub i64);

/// Identifier assigned by the store for a detected issue.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct IssueId(pub i64);

/// Fixed room categories carried on every room record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomKind {
    Bedroom,
    Bathroom,
    Kitchen,
    LivingRoom,
    #[default]
    Other,
}

/// Whether a check records the start or the end of a stay. Immutable after
/// creation; determines which side of a photo comparison the check supplies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Checkin,
    Checkout,
}

/// Issue severity, ordered by concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// A managed rental property. Owns its rooms and checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub name: String,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProperty {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
}

/// A room within a property. Owns its checklist items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub property_id: PropertyId,
    pub name: String,
    #[serde(rename = "room_type")]
    pub kind: RoomKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRoom {
    pub name: String,
    #[serde(default, rename = "room_type")]
    pub kind: RoomKind,
}

/// An object expected in a room, with the cost of replacing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: ItemId,
    pub room_id: RoomId,
    pub name: String,
    pub replacement_cost: f64,
}

/// Create/replace payload for a checklist item. `PUT` replaces both fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistItemDraft {
    pub name: String,
    #[serde(default)]
    pub replacement_cost: f64,
}

/// A recorded check-in or check-out event for a stay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Check {
    pub id: CheckId,
    pub property_id: PropertyId,
    #[serde(rename = "check_type")]
    pub kind: CheckKind,
    pub guest_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckDraft {
    #[serde(rename = "check_type")]
    pub kind: CheckKind,
    #[serde(default)]
    pub guest_name: Option<String>,
}

/// An uploaded room photo together with the raw analysis the vision backend
/// produced for it. The analysis is stored verbatim as audit data, never
/// re-parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub id: PhotoId,
    pub check_id: CheckId,
    pub room_id: RoomId,
    pub file_path: String,
    pub analysis: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPhoto {
    pub check_id: CheckId,
    pub room_id: RoomId,
    pub file_path: String,
    pub analysis: serde_json::Value,
}

/// A detected discrepancy tied to a check, carrying its remediation cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: IssueId,
    pub check_id: CheckId,
    pub description: String,
    pub item_name: Option<String>,
    pub estimated_cost: f64,
    pub severity: Severity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewIssue {
    pub check_id: CheckId,
    pub description: String,
    pub item_name: Option<String>,
    pub estimated_cost: f64,
    pub severity: Severity,
}
