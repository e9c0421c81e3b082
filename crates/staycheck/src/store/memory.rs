use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;

use super::{CheckRecord, InspectionStore, StoreError};
use crate::domain::{
    Check, CheckDraft, CheckId, CheckKind, ChecklistItem, ChecklistItemDraft, Issue, IssueId,
    ItemId, NewIssue, NewPhoto, NewProperty, NewRoom, Photo, PhotoId, Property, PropertyId, Room,
    RoomId,
};

#[derive(Debug, Default)]
struct Tables {
    sequence: i64,
    properties: BTreeMap<i64, Property>,
    rooms: BTreeMap<i64, Room>,
    items: BTreeMap<i64, ChecklistItem>,
    checks: BTreeMap<i64, Check>,
    photos: BTreeMap<i64, Photo>,
    issues: BTreeMap<i64, Issue>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.sequence += 1;
        self.sequence
    }
}

/// Mutexed table store. Ids come from one shared sequence, so iteration in
/// key order is insertion order.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InspectionStore for InMemoryStore {
    fn insert_property(&self, draft: NewProperty) -> Result<Property, StoreError> {
        let mut guard = self.tables.lock().expect("store mutex poisoned");
        let id = guard.next_id();
        let property = Property {
            id: PropertyId(id),
            name: draft.name,
            address: draft.address,
            created_at: Utc::now(),
        };
        guard.properties.insert(id, property.clone());
        Ok(property)
    }

    fn list_properties(&self) -> Result<Vec<Property>, StoreError> {
        let guard = self.tables.lock().expect("store mutex poisoned");
        Ok(guard.properties.values().cloned().collect())
    }

    fn fetch_property(&self, id: PropertyId) -> Result<Option<Property>, StoreError> {
        let guard = self.tables.lock().expect("store mutex poisoned");
        Ok(guard.properties.get(&id.0).cloned())
    }

    fn delete_property(&self, id: PropertyId) -> Result<(), StoreError> {
        let mut guard = self.tables.lock().expect("store mutex poisoned");
        if guard.properties.remove(&id.0).is_none() {
            return Err(StoreError::NotFound);
        }

        let room_ids: Vec<i64> = guard
            .rooms
            .values()
            .filter(|room| room.property_id == id)
            .map(|room| room.id.0)
            .collect();
        for room_id in &room_ids {
            guard.rooms.remove(room_id);
        }
        guard
            .items
            .retain(|_, item| !room_ids.contains(&item.room_id.0));

        let check_ids: Vec<i64> = guard
            .checks
            .values()
            .filter(|check| check.property_id == id)
            .map(|check| check.id.0)
            .collect();
        for check_id in &check_ids {
            guard.checks.remove(check_id);
        }
        guard
            .photos
            .retain(|_, photo| !check_ids.contains(&photo.check_id.0));
        guard
            .issues
            .retain(|_, issue| !check_ids.contains(&issue.check_id.0));

        Ok(())
    }

    fn insert_room(&self, property_id: PropertyId, draft: NewRoom) -> Result<Room, StoreError> {
        let mut guard = self.tables.lock().expect("store mutex poisoned");
        if !guard.properties.contains_key(&property_id.0) {
            return Err(StoreError::NotFound);
        }
        let id = guard.next_id();
        let room = Room {
            id: RoomId(id),
            property_id,
            name: draft.name,
            kind: draft.kind,
        };
        guard.rooms.insert(id, room.clone());
        Ok(room)
    }

    fn list_rooms(&self, property_id: PropertyId) -> Result<Vec<Room>, StoreError> {
        let guard = self.tables.lock().expect("store mutex poisoned");
        Ok(guard
            .rooms
            .values()
            .filter(|room| room.property_id == property_id)
            .cloned()
            .collect())
    }

    fn fetch_room(&self, id: RoomId) -> Result<Option<Room>, StoreError> {
        let guard = self.tables.lock().expect("store mutex poisoned");
        Ok(guard.rooms.get(&id.0).cloned())
    }

    fn insert_item(
        &self,
        room_id: RoomId,
        draft: ChecklistItemDraft,
    ) -> Result<ChecklistItem, StoreError> {
        let mut guard = self.tables.lock().expect("store mutex poisoned");
        if !guard.rooms.contains_key(&room_id.0) {
            return Err(StoreError::NotFound);
        }
        let id = guard.next_id();
        let item = ChecklistItem {
            id: ItemId(id),
            room_id,
            name: draft.name,
            replacement_cost: draft.replacement_cost,
        };
        guard.items.insert(id, item.clone());
        Ok(item)
    }

    fn list_items(&self, room_id: RoomId) -> Result<Vec<ChecklistItem>, StoreError> {
        let guard = self.tables.lock().expect("store mutex poisoned");
        Ok(guard
            .items
            .values()
            .filter(|item| item.room_id == room_id)
            .cloned()
            .collect())
    }

    fn update_item(
        &self,
        id: ItemId,
        draft: ChecklistItemDraft,
    ) -> Result<ChecklistItem, StoreError> {
        let mut guard = self.tables.lock().expect("store mutex poisoned");
        let item = guard.items.get_mut(&id.0).ok_or(StoreError::NotFound)?;
        item.name = draft.name;
        item.replacement_cost = draft.replacement_cost;
        Ok(item.clone())
    }

    fn insert_check(
        &self,
        property_id: PropertyId,
        draft: CheckDraft,
    ) -> Result<Check, StoreError> {
        let mut guard = self.tables.lock().expect("store mutex poisoned");
        if !guard.properties.contains_key(&property_id.0) {
            return Err(StoreError::NotFound);
        }
        let id = guard.next_id();
        let check = Check {
            id: CheckId(id),
            property_id,
            kind: draft.kind,
            guest_name: draft.guest_name,
            created_at: Utc::now(),
        };
        guard.checks.insert(id, check.clone());
        Ok(check)
    }

    fn list_checks(&self, property_id: PropertyId) -> Result<Vec<Check>, StoreError> {
        let guard = self.tables.lock().expect("store mutex poisoned");
        let mut checks: Vec<Check> = guard
            .checks
            .values()
            .filter(|check| check.property_id == property_id)
            .cloned()
            .collect();
        // Newest first; id breaks timestamp ties from rapid inserts.
        checks.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(checks)
    }

    fn fetch_check(&self, id: CheckId, kind: CheckKind) -> Result<Option<CheckRecord>, StoreError> {
        let guard = self.tables.lock().expect("store mutex poisoned");
        let Some(check) = guard.checks.get(&id.0) else {
            return Ok(None);
        };
        if check.kind != kind {
            return Ok(None);
        }
        let photos = guard
            .photos
            .values()
            .filter(|photo| photo.check_id == id)
            .cloned()
            .collect();
        let issues = guard
            .issues
            .values()
            .filter(|issue| issue.check_id == id)
            .cloned()
            .collect();
        Ok(Some(CheckRecord {
            check: check.clone(),
            photos,
            issues,
        }))
    }

    fn insert_photo(&self, draft: NewPhoto) -> Result<Photo, StoreError> {
        let mut guard = self.tables.lock().expect("store mutex poisoned");
        if !guard.checks.contains_key(&draft.check_id.0) || !guard.rooms.contains_key(&draft.room_id.0)
        {
            return Err(StoreError::NotFound);
        }
        let id = guard.next_id();
        let photo = Photo {
            id: PhotoId(id),
            check_id: draft.check_id,
            room_id: draft.room_id,
            file_path: draft.file_path,
            analysis: draft.analysis,
            created_at: Utc::now(),
        };
        guard.photos.insert(id, photo.clone());
        Ok(photo)
    }

    fn insert_issue(&self, draft: NewIssue) -> Result<Issue, StoreError> {
        let mut guard = self.tables.lock().expect("store mutex poisoned");
        if !guard.checks.contains_key(&draft.check_id.0) {
            return Err(StoreError::NotFound);
        }
        let id = guard.next_id();
        let issue = Issue {
            id: IssueId(id),
            check_id: draft.check_id,
            description: draft.description,
            item_name: draft.item_name,
            estimated_cost: draft.estimated_cost,
            severity: draft.severity,
        };
        guard.issues.insert(id, issue.clone());
        Ok(issue)
    }

    fn issues_for_check(&self, id: CheckId) -> Result<Vec<Issue>, StoreError> {
        let guard = self.tables.lock().expect("store mutex poisoned");
        Ok(guard
            .issues
            .values()
            .filter(|issue| issue.check_id == id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RoomKind, Severity};

    fn store_with_property() -> (InMemoryStore, PropertyId) {
        let store = InMemoryStore::default();
        let property = store
            .insert_property(NewProperty {
                name: "Beach House".to_string(),
                address: Some("123 Ocean Ave".to_string()),
            })
            .expect("property inserts");
        (store, property.id)
    }

    #[test]
    fn inserts_assign_ids_and_fetch_round_trips() {
        let (store, property_id) = store_with_property();
        let fetched = store
            .fetch_property(property_id)
            .expect("fetch succeeds")
            .expect("property present");
        assert_eq!(fetched.name, "Beach House");
    }

    #[test]
    fn child_inserts_require_an_existing_parent() {
        let store = InMemoryStore::default();
        let orphan = store.insert_room(
            PropertyId(42),
            NewRoom {
                name: "Nowhere".to_string(),
                kind: RoomKind::Other,
            },
        );
        assert!(matches!(orphan, Err(StoreError::NotFound)));
    }

    #[test]
    fn update_item_replaces_both_fields() {
        let (store, property_id) = store_with_property();
        let room = store
            .insert_room(
                property_id,
                NewRoom {
                    name: "Kitchen".to_string(),
                    kind: RoomKind::Kitchen,
                },
            )
            .expect("room inserts");
        let item = store
            .insert_item(
                room.id,
                ChecklistItemDraft {
                    name: "Kettle".to_string(),
                    replacement_cost: 15.0,
                },
            )
            .expect("item inserts");

        let updated = store
            .update_item(
                item.id,
                ChecklistItemDraft {
                    name: "Electric Kettle".to_string(),
                    replacement_cost: 25.0,
                },
            )
            .expect("item updates");
        assert_eq!(updated.name, "Electric Kettle");
        assert_eq!(updated.replacement_cost, 25.0);

        let missing = store.update_item(
            ItemId(9999),
            ChecklistItemDraft {
                name: "Ghost".to_string(),
                replacement_cost: 0.0,
            },
        );
        assert!(matches!(missing, Err(StoreError::NotFound)));
    }

    #[test]
    fn checks_list_newest_first() {
        let (store, property_id) = store_with_property();
        let first = store
            .insert_check(
                property_id,
                CheckDraft {
                    kind: CheckKind::Checkin,
                    guest_name: Some("First".to_string()),
                },
            )
            .expect("check inserts");
        let second = store
            .insert_check(
                property_id,
                CheckDraft {
                    kind: CheckKind::Checkout,
                    guest_name: Some("Second".to_string()),
                },
            )
            .expect("check inserts");

        let checks = store.list_checks(property_id).expect("list succeeds");
        assert_eq!(checks[0].id, second.id);
        assert_eq!(checks[1].id, first.id);
    }

    #[test]
    fn fetch_check_filters_by_kind() {
        let (store, property_id) = store_with_property();
        let check = store
            .insert_check(
                property_id,
                CheckDraft {
                    kind: CheckKind::Checkout,
                    guest_name: None,
                },
            )
            .expect("check inserts");

        assert!(store
            .fetch_check(check.id, CheckKind::Checkout)
            .expect("fetch succeeds")
            .is_some());
        assert!(store
            .fetch_check(check.id, CheckKind::Checkin)
            .expect("fetch succeeds")
            .is_none());
    }

    #[test]
    fn delete_property_cascades_to_owned_records() {
        let (store, property_id) = store_with_property();
        let room = store
            .insert_room(
                property_id,
                NewRoom {
                    name: "Bedroom".to_string(),
                    kind: RoomKind::Bedroom,
                },
            )
            .expect("room inserts");
        store
            .insert_item(
                room.id,
                ChecklistItemDraft {
                    name: "Lamp".to_string(),
                    replacement_cost: 30.0,
                },
            )
            .expect("item inserts");
        let check = store
            .insert_check(
                property_id,
                CheckDraft {
                    kind: CheckKind::Checkout,
                    guest_name: None,
                },
            )
            .expect("check inserts");
        store
            .insert_photo(NewPhoto {
                check_id: check.id,
                room_id: room.id,
                file_path: "uploads/a.jpg".to_string(),
                analysis: serde_json::Value::Null,
            })
            .expect("photo inserts");
        store
            .insert_issue(NewIssue {
                check_id: check.id,
                description: "Broken lamp".to_string(),
                item_name: None,
                estimated_cost: 0.0,
                severity: Severity::High,
            })
            .expect("issue inserts");

        store.delete_property(property_id).expect("delete succeeds");

        assert!(store
            .fetch_property(property_id)
            .expect("fetch succeeds")
            .is_none());
        assert!(store.fetch_room(room.id).expect("fetch succeeds").is_none());
        assert!(store
            .fetch_check(check.id, CheckKind::Checkout)
            .expect("fetch succeeds")
            .is_none());
        assert!(store
            .issues_for_check(check.id)
            .expect("list succeeds")
            .is_empty());
    }
}
