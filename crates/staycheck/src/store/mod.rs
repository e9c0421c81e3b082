//! Persistence gateway for the inspection entities.
//!
//! The trait is the seam the core logic is written against; the bundled
//! in-memory implementation backs the service wiring and the tests.

pub mod memory;

pub use memory::InMemoryStore;

use crate::domain::{
    Check, CheckDraft, CheckId, CheckKind, ChecklistItem, ChecklistItemDraft, Issue, ItemId,
    NewIssue, NewPhoto, NewProperty, NewRoom, Photo, Property, PropertyId, Room, RoomId,
};

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A check eagerly loaded with its photos and issues, as the report
/// aggregation query needs them.
#[derive(Debug, Clone)]
pub struct CheckRecord {
    pub check: Check,
    pub photos: Vec<Photo>,
    pub issues: Vec<Issue>,
}

/// Record store for the six inspection entities.
///
/// Inserts referencing a missing parent fail with [`StoreError::NotFound`];
/// deleting a property cascades along the ownership edges (rooms with their
/// checklist items, checks with their photos and issues).
pub trait InspectionStore: Send + Sync {
    fn insert_property(&self, draft: NewProperty) -> Result<Property, StoreError>;
    fn list_properties(&self) -> Result<Vec<Property>, StoreError>;
    fn fetch_property(&self, id: PropertyId) -> Result<Option<Property>, StoreError>;
    fn delete_property(&self, id: PropertyId) -> Result<(), StoreError>;

    fn insert_room(&self, property_id: PropertyId, draft: NewRoom) -> Result<Room, StoreError>;
    fn list_rooms(&self, property_id: PropertyId) -> Result<Vec<Room>, StoreError>;
    fn fetch_room(&self, id: RoomId) -> Result<Option<Room>, StoreError>;

    fn insert_item(
        &self,
        room_id: RoomId,
        draft: ChecklistItemDraft,
    ) -> Result<ChecklistItem, StoreError>;
    fn list_items(&self, room_id: RoomId) -> Result<Vec<ChecklistItem>, StoreError>;
    /// Full replace of the mutable fields. Fails with `NotFound` for an
    /// unknown item.
    fn update_item(
        &self,
        id: ItemId,
        draft: ChecklistItemDraft,
    ) -> Result<ChecklistItem, StoreError>;

    fn insert_check(&self, property_id: PropertyId, draft: CheckDraft)
        -> Result<Check, StoreError>;
    /// Checks for a property, newest first.
    fn list_checks(&self, property_id: PropertyId) -> Result<Vec<Check>, StoreError>;
    /// Eagerly load a check with its photos and issues, only when its kind
    /// matches the requested role. A kind mismatch reads as absent.
    fn fetch_check(&self, id: CheckId, kind: CheckKind) -> Result<Option<CheckRecord>, StoreError>;

    fn insert_photo(&self, draft: NewPhoto) -> Result<Photo, StoreError>;
    fn insert_issue(&self, draft: NewIssue) -> Result<Issue, StoreError>;
    /// Issues for a check in insertion order.
    fn issues_for_check(&self, id: CheckId) -> Result<Vec<Issue>, StoreError>;
}
