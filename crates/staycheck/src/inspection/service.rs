use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use tracing::warn;

use super::extractor::{extract_issues, PhotoIngest};
use super::report::{ComparisonEntry, CostHistoryEntry, DamageReport};
use crate::domain::{CheckId, CheckKind, NewPhoto, Photo, PropertyId, RoomId};
use crate::store::{InspectionStore, StoreError};
use crate::vision::{PhotoComparison, RoomAnalysis, VisionAnalyzer};

/// Service composing the store and the vision port for the three inspection
/// operations: photo ingestion, damage report aggregation, and the cost
/// history projection.
pub struct InspectionService<S, V: ?Sized> {
    store: Arc<S>,
    vision: Arc<V>,
}

impl<S, V> InspectionService<S, V>
where
    S: InspectionStore,
    V: VisionAnalyzer + ?Sized,
{
    pub fn new(store: Arc<S>, vision: Arc<V>) -> Self {
        Self { store, vision }
    }

    /// Analyze a stored upload and persist the photo plus any derived
    /// issues.
    ///
    /// A vision transport failure does not fail the ingest: the neutral
    /// analysis is recorded with `analysis_available` unset so the outage
    /// stays distinguishable from an empty result. Repeated ingests for the
    /// same room and check accumulate duplicate photos and issues.
    pub async fn ingest_photo(
        &self,
        check_id: CheckId,
        room_id: RoomId,
        file_path: &str,
    ) -> Result<PhotoIngest, InspectionError> {
        let room = self
            .store
            .fetch_room(room_id)?
            .ok_or(InspectionError::NotFound("room"))?;

        let items = self.store.list_items(room_id)?;
        let names: Vec<String> = items.iter().map(|item| item.name.clone()).collect();
        let costs: BTreeMap<String, f64> = items
            .into_iter()
            .map(|item| (item.name, item.replacement_cost))
            .collect();

        let (analysis, available) = match self
            .vision
            .analyze(Path::new(file_path), &names, &room.name)
            .await
        {
            Ok(result) => (result, true),
            Err(err) => {
                warn!(
                    backend = self.vision.id(),
                    error = %err,
                    "vision analysis unavailable, recording neutral result"
                );
                (RoomAnalysis::neutral(), false)
            }
        };

        let raw = serde_json::to_value(&analysis).unwrap_or(serde_json::Value::Null);
        let photo = self.store.insert_photo(NewPhoto {
            check_id,
            room_id,
            file_path: file_path.to_string(),
            analysis: raw,
        })?;

        let mut issues = Vec::new();
        for draft in extract_issues(check_id, &analysis, &costs) {
            issues.push(self.store.insert_issue(draft)?);
        }

        Ok(PhotoIngest {
            photo_id: photo.id,
            analysis,
            analysis_available: available,
            issues,
        })
    }

    /// Compose the damage report for a check-in/check-out pair.
    ///
    /// Read-only: comparison results are returned, never persisted. A check
    /// that exists but has the wrong kind reads as absent.
    pub async fn damage_report(
        &self,
        property_id: PropertyId,
        checkin_id: CheckId,
        checkout_id: CheckId,
    ) -> Result<DamageReport, InspectionError> {
        let property = self
            .store
            .fetch_property(property_id)?
            .ok_or(InspectionError::NotFound("property"))?;
        let checkin = self
            .store
            .fetch_check(checkin_id, CheckKind::Checkin)?
            .ok_or(InspectionError::NotFound("check-in"))?;
        let checkout = self
            .store
            .fetch_check(checkout_id, CheckKind::Checkout)?
            .ok_or(InspectionError::NotFound("check-out"))?;

        // Last write wins, matching the one-photo-per-room intent.
        let mut before_by_room: HashMap<RoomId, &Photo> = HashMap::new();
        for photo in &checkin.photos {
            before_by_room.insert(photo.room_id, photo);
        }

        let mut comparisons = Vec::new();
        for after in &checkout.photos {
            let Some(before) = before_by_room.get(&after.room_id) else {
                // Rooms photographed only at check-out have nothing to
                // compare against.
                continue;
            };
            let room = self
                .store
                .fetch_room(after.room_id)?
                .ok_or(InspectionError::NotFound("room"))?;

            let (comparison, available) = match self
                .vision
                .compare(
                    Path::new(&before.file_path),
                    Path::new(&after.file_path),
                    &room.name,
                )
                .await
            {
                Ok(result) => (result, true),
                Err(err) => {
                    warn!(
                        backend = self.vision.id(),
                        room = %room.name,
                        error = %err,
                        "photo comparison unavailable, recording neutral result"
                    );
                    (PhotoComparison::neutral(), false)
                }
            };

            comparisons.push(ComparisonEntry {
                room_id: after.room_id,
                room_name: room.name,
                before_photo: before.file_path.clone(),
                after_photo: after.file_path.clone(),
                comparison,
                comparison_available: available,
            });
        }

        // Comparisons are advisory; the total comes from the recorded
        // check-out issues alone.
        let total_estimated_cost = checkout
            .issues
            .iter()
            .map(|issue| issue.estimated_cost)
            .sum();

        Ok(DamageReport {
            property_name: property.name,
            guest_name: checkout.check.guest_name,
            checkin_date: checkin.check.created_at,
            checkout_date: checkout.check.created_at,
            issues: checkout.issues,
            total_estimated_cost,
            comparison_photos: comparisons,
        })
    }

    /// Every issue of every check for a property, newest stay first.
    pub fn cost_history(
        &self,
        property_id: PropertyId,
    ) -> Result<Vec<CostHistoryEntry>, InspectionError> {
        let mut entries = Vec::new();
        for check in self.store.list_checks(property_id)? {
            for issue in self.store.issues_for_check(check.id)? {
                entries.push(CostHistoryEntry {
                    issue,
                    date: check.created_at,
                    guest: check.guest_name.clone(),
                });
            }
        }
        Ok(entries)
    }
}

/// Error raised by the inspection service.
#[derive(Debug, thiserror::Error)]
pub enum InspectionError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
}
