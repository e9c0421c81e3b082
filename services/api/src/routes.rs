use crate::infra::{store_upload, ApiContext, AppState};
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use staycheck::domain::{
    Check, CheckDraft, CheckId, ChecklistItem, ChecklistItemDraft, ItemId, NewProperty, NewRoom,
    Property, PropertyId, Room, RoomId,
};
use staycheck::error::ApiError;
use staycheck::inspection::{CostHistoryEntry, DamageReport};
use staycheck::store::{InspectionStore, StoreError};
use staycheck::vision::{RoomAnalysis, VisionAnalyzer};
use std::path::Path as FsPath;
use std::sync::Arc;
use tower_http::services::ServeDir;

/// Photo uploads carry full-resolution camera images, well past axum's
/// default 2 MB body cap.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[derive(Debug, Deserialize)]
pub(crate) struct ReportQuery {
    pub(crate) checkin_id: CheckId,
    pub(crate) checkout_id: CheckId,
}

#[derive(Debug, Serialize)]
pub(crate) struct PhotoUploadResponse {
    pub(crate) photo_id: staycheck::domain::PhotoId,
    pub(crate) analysis: RoomAnalysis,
    pub(crate) analysis_available: bool,
    pub(crate) issues_created: usize,
}

pub(crate) fn api_router<S, V>(ctx: Arc<ApiContext<S, V>>, upload_dir: &FsPath) -> Router
where
    S: InspectionStore + 'static,
    V: VisionAnalyzer + ?Sized + 'static,
{
    Router::new()
        .route(
            "/api/properties",
            post(create_property::<S, V>).get(list_properties::<S, V>),
        )
        .route("/api/properties/:property_id", get(get_property::<S, V>))
        .route(
            "/api/properties/:property_id/rooms",
            post(create_room::<S, V>).get(list_rooms::<S, V>),
        )
        .route(
            "/api/rooms/:room_id/items",
            post(create_item::<S, V>).get(list_items::<S, V>),
        )
        .route("/api/items/:item_id", put(update_item::<S, V>))
        .route(
            "/api/properties/:property_id/checks",
            post(create_check::<S, V>).get(list_checks::<S, V>),
        )
        .route(
            "/api/checks/:check_id/photos/:room_id",
            post(upload_photo::<S, V>).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/api/properties/:property_id/damage-report",
            get(damage_report::<S, V>),
        )
        .route(
            "/api/properties/:property_id/cost-history",
            get(cost_history::<S, V>),
        )
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .with_state(ctx)
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn create_property<S, V>(
    State(ctx): State<Arc<ApiContext<S, V>>>,
    Json(draft): Json<NewProperty>,
) -> Result<Json<Property>, ApiError>
where
    S: InspectionStore + 'static,
    V: VisionAnalyzer + ?Sized + 'static,
{
    Ok(Json(ctx.store.insert_property(draft)?))
}

pub(crate) async fn list_properties<S, V>(
    State(ctx): State<Arc<ApiContext<S, V>>>,
) -> Result<Json<Vec<Property>>, ApiError>
where
    S: InspectionStore + 'static,
    V: VisionAnalyzer + ?Sized + 'static,
{
    Ok(Json(ctx.store.list_properties()?))
}

pub(crate) async fn get_property<S, V>(
    State(ctx): State<Arc<ApiContext<S, V>>>,
    Path(property_id): Path<PropertyId>,
) -> Result<Json<Property>, ApiError>
where
    S: InspectionStore + 'static,
    V: VisionAnalyzer + ?Sized + 'static,
{
    let property = ctx
        .store
        .fetch_property(property_id)?
        .ok_or(StoreError::NotFound)?;
    Ok(Json(property))
}

pub(crate) async fn create_room<S, V>(
    State(ctx): State<Arc<ApiContext<S, V>>>,
    Path(property_id): Path<PropertyId>,
    Json(draft): Json<NewRoom>,
) -> Result<Json<Room>, ApiError>
where
    S: InspectionStore + 'static,
    V: VisionAnalyzer + ?Sized + 'static,
{
    Ok(Json(ctx.store.insert_room(property_id, draft)?))
}

pub(crate) async fn list_rooms<S, V>(
    State(ctx): State<Arc<ApiContext<S, V>>>,
    Path(property_id): Path<PropertyId>,
) -> Result<Json<Vec<Room>>, ApiError>
where
    S: InspectionStore + 'static,
    V: VisionAnalyzer + ?Sized + 'static,
{
    Ok(Json(ctx.store.list_rooms(property_id)?))
}

pub(crate) async fn create_item<S, V>(
    State(ctx): State<Arc<ApiContext<S, V>>>,
    Path(room_id): Path<RoomId>,
    Json(draft): Json<ChecklistItemDraft>,
) -> Result<Json<ChecklistItem>, ApiError>
where
    S: InspectionStore + 'static,
    V: VisionAnalyzer + ?Sized + 'static,
{
    Ok(Json(ctx.store.insert_item(room_id, draft)?))
}

pub(crate) async fn list_items<S, V>(
    State(ctx): State<Arc<ApiContext<S, V>>>,
    Path(room_id): Path<RoomId>,
) -> Result<Json<Vec<ChecklistItem>>, ApiError>
where
    S: InspectionStore + 'static,
    V: VisionAnalyzer + ?Sized + 'static,
{
    Ok(Json(ctx.store.list_items(room_id)?))
}

pub(crate) async fn update_item<S, V>(
    State(ctx): State<Arc<ApiContext<S, V>>>,
    Path(item_id): Path<ItemId>,
    Json(draft): Json<ChecklistItemDraft>,
) -> Result<Json<ChecklistItem>, ApiError>
where
    S: InspectionStore + 'static,
    V: VisionAnalyzer + ?Sized + 'static,
{
    Ok(Json(ctx.store.update_item(item_id, draft)?))
}

pub(crate) async fn create_check<S, V>(
    State(ctx): State<Arc<ApiContext<S, V>>>,
    Path(property_id): Path<PropertyId>,
    Json(draft): Json<CheckDraft>,
) -> Result<Json<Check>, ApiError>
where
    S: InspectionStore + 'static,
    V: VisionAnalyzer + ?Sized + 'static,
{
    Ok(Json(ctx.store.insert_check(property_id, draft)?))
}

pub(crate) async fn list_checks<S, V>(
    State(ctx): State<Arc<ApiContext<S, V>>>,
    Path(property_id): Path<PropertyId>,
) -> Result<Json<Vec<Check>>, ApiError>
where
    S: InspectionStore + 'static,
    V: VisionAnalyzer + ?Sized + 'static,
{
    Ok(Json(ctx.store.list_checks(property_id)?))
}

/// Store the uploaded file, then run analysis and issue extraction. The
/// upload succeeds with a neutral analysis even when the vision backend is
/// unreachable; only a missing room fails the request.
pub(crate) async fn upload_photo<S, V>(
    State(ctx): State<Arc<ApiContext<S, V>>>,
    Path((check_id, room_id)): Path<(CheckId, RoomId)>,
    mut multipart: Multipart,
) -> Result<Json<PhotoUploadResponse>, ApiError>
where
    S: InspectionStore + 'static,
    V: VisionAnalyzer + ?Sized + 'static,
{
    let mut stored = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::Validation(err.to_string()))?
    {
        if field.name() == Some("file") {
            let original_name = field.file_name().map(|name| name.to_string());
            let bytes = field
                .bytes()
                .await
                .map_err(|err| ApiError::Validation(err.to_string()))?;
            stored = Some(store_upload(&ctx.upload_dir, original_name.as_deref(), &bytes).await?);
            break;
        }
    }
    let path = stored.ok_or_else(|| ApiError::Validation("missing multipart field 'file'".to_string()))?;

    let ingest = ctx
        .inspections
        .ingest_photo(check_id, room_id, &path.to_string_lossy())
        .await?;

    Ok(Json(PhotoUploadResponse {
        photo_id: ingest.photo_id,
        analysis: ingest.analysis,
        analysis_available: ingest.analysis_available,
        issues_created: ingest.issues.len(),
    }))
}

pub(crate) async fn damage_report<S, V>(
    State(ctx): State<Arc<ApiContext<S, V>>>,
    Path(property_id): Path<PropertyId>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<DamageReport>, ApiError>
where
    S: InspectionStore + 'static,
    V: VisionAnalyzer + ?Sized + 'static,
{
    let report = ctx
        .inspections
        .damage_report(property_id, query.checkin_id, query.checkout_id)
        .await?;
    Ok(Json(report))
}

pub(crate) async fn cost_history<S, V>(
    State(ctx): State<Arc<ApiContext<S, V>>>,
    Path(property_id): Path<PropertyId>,
) -> Result<Json<Vec<CostHistoryEntry>>, ApiError>
where
    S: InspectionStore + 'static,
    V: VisionAnalyzer + ?Sized + 'static,
{
    Ok(Json(ctx.inspections.cost_history(property_id)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use staycheck::domain::{CheckKind, NewIssue, NewPhoto, RoomKind, Severity};
    use staycheck::store::InMemoryStore;
    use staycheck::vision::MockVision;
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        store: Arc<InMemoryStore>,
        // Holds the upload dir alive for the test's duration.
        _uploads: tempfile::TempDir,
    }

    fn test_app(vision: MockVision) -> TestApp {
        let store = Arc::new(InMemoryStore::default());
        let uploads = tempfile::tempdir().expect("temp dir creates");
        let ctx = Arc::new(ApiContext::new(
            store.clone(),
            Arc::new(vision),
            uploads.path().to_path_buf(),
        ));
        let router = api_router(ctx, uploads.path());
        TestApp {
            router,
            store,
            _uploads: uploads,
        }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        serde_json::from_slice(&bytes).expect("body is json")
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds")
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request builds")
    }

    fn multipart_upload(uri: &str, file_name: &str, payload: &[u8]) -> Request<Body> {
        let boundary = "staycheck-test-boundary";
        let mut body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: image/jpeg\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(payload);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .expect("request builds")
    }

    #[tokio::test]
    async fn property_crud_round_trips() {
        let app = test_app(MockVision::new());

        let created = app
            .router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/properties",
                json!({"name": "Beach House", "address": "123 Ocean Ave"}),
            ))
            .await
            .expect("request completes");
        assert_eq!(created.status(), StatusCode::OK);
        let created = body_json(created).await;
        assert_eq!(created["name"], "Beach House");
        let id = created["id"].as_i64().expect("id assigned");

        let fetched = app
            .router
            .clone()
            .oneshot(get_request(&format!("/api/properties/{id}")))
            .await
            .expect("request completes");
        assert_eq!(fetched.status(), StatusCode::OK);

        let missing = app
            .router
            .clone()
            .oneshot(get_request("/api/properties/99999"))
            .await
            .expect("request completes");
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn checklist_item_update_is_a_full_replace() {
        let app = test_app(MockVision::new());
        let property = app
            .store
            .insert_property(NewProperty {
                name: "Test Property".to_string(),
                address: None,
            })
            .expect("property inserts");
        let room = app
            .store
            .insert_room(
                property.id,
                NewRoom {
                    name: "Kitchen".to_string(),
                    kind: RoomKind::Kitchen,
                },
            )
            .expect("room inserts");

        let created = app
            .router
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/rooms/{}/items", room.id.0),
                json!({"name": "Coffee Maker", "replacement_cost": 50.0}),
            ))
            .await
            .expect("request completes");
        assert_eq!(created.status(), StatusCode::OK);
        let item_id = body_json(created).await["id"].as_i64().expect("id assigned");

        let updated = app
            .router
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/api/items/{item_id}"),
                json!({"name": "Espresso Machine", "replacement_cost": 120.0}),
            ))
            .await
            .expect("request completes");
        assert_eq!(updated.status(), StatusCode::OK);
        let updated = body_json(updated).await;
        assert_eq!(updated["name"], "Espresso Machine");
        assert_eq!(updated["replacement_cost"], 120.0);

        let missing = app
            .router
            .clone()
            .oneshot(json_request(
                "PUT",
                "/api/items/99999",
                json!({"name": "Ghost", "replacement_cost": 1.0}),
            ))
            .await
            .expect("request completes");
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn checks_list_newest_first() {
        let app = test_app(MockVision::new());
        let property = app
            .store
            .insert_property(NewProperty {
                name: "Test Property".to_string(),
                address: None,
            })
            .expect("property inserts");

        for guest in ["First", "Second"] {
            let response = app
                .router
                .clone()
                .oneshot(json_request(
                    "POST",
                    &format!("/api/properties/{}/checks", property.id.0),
                    json!({"check_type": "checkin", "guest_name": guest}),
                ))
                .await
                .expect("request completes");
            assert_eq!(response.status(), StatusCode::OK);
        }

        let listed = app
            .router
            .clone()
            .oneshot(get_request(&format!(
                "/api/properties/{}/checks",
                property.id.0
            )))
            .await
            .expect("request completes");
        let listed = body_json(listed).await;
        assert_eq!(listed[0]["guest_name"], "Second");
        assert_eq!(listed[1]["guest_name"], "First");
    }

    #[tokio::test]
    async fn photo_upload_extracts_issues() {
        let vision = MockVision::new().with_analysis(RoomAnalysis {
            missing_items: vec!["Towels".to_string()],
            damage_detected: vec!["Scratched table".to_string()],
            cleanliness_issues: Vec::new(),
            condition_score: 6,
        });
        let app = test_app(vision);

        let property = app
            .store
            .insert_property(NewProperty {
                name: "Test Property".to_string(),
                address: None,
            })
            .expect("property inserts");
        let room = app
            .store
            .insert_room(
                property.id,
                NewRoom {
                    name: "Bathroom".to_string(),
                    kind: RoomKind::Bathroom,
                },
            )
            .expect("room inserts");
        app.store
            .insert_item(
                room.id,
                ChecklistItemDraft {
                    name: "Towels".to_string(),
                    replacement_cost: 20.0,
                },
            )
            .expect("item inserts");
        let check = app
            .store
            .insert_check(
                property.id,
                CheckDraft {
                    kind: CheckKind::Checkout,
                    guest_name: Some("Jane".to_string()),
                },
            )
            .expect("check inserts");

        let response = app
            .router
            .clone()
            .oneshot(multipart_upload(
                &format!("/api/checks/{}/photos/{}", check.id.0, room.id.0),
                "bathroom.jpg",
                b"not-really-a-jpeg",
            ))
            .await
            .expect("request completes");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["issues_created"], 2);
        assert_eq!(body["analysis_available"], true);
        assert_eq!(body["analysis"]["missing_items"][0], "Towels");

        let issues = app
            .store
            .issues_for_check(check.id)
            .expect("issues list");
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].estimated_cost, 20.0);
        assert_eq!(issues[0].severity, Severity::Medium);
    }

    #[tokio::test]
    async fn photo_upload_to_unknown_room_is_404() {
        let app = test_app(MockVision::new());
        let response = app
            .router
            .clone()
            .oneshot(multipart_upload(
                "/api/checks/1/photos/999",
                "room.jpg",
                b"not-really-a-jpeg",
            ))
            .await
            .expect("request completes");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn multi_megabyte_photos_are_accepted() {
        let app = test_app(MockVision::new());
        let property = app
            .store
            .insert_property(NewProperty {
                name: "Test Property".to_string(),
                address: None,
            })
            .expect("property inserts");
        let room = app
            .store
            .insert_room(
                property.id,
                NewRoom {
                    name: "Bedroom".to_string(),
                    kind: RoomKind::Bedroom,
                },
            )
            .expect("room inserts");
        let check = app
            .store
            .insert_check(
                property.id,
                CheckDraft {
                    kind: CheckKind::Checkout,
                    guest_name: None,
                },
            )
            .expect("check inserts");

        let payload = vec![0xAB_u8; 3 * 1024 * 1024];
        let response = app
            .router
            .clone()
            .oneshot(multipart_upload(
                &format!("/api/checks/{}/photos/{}", check.id.0, room.id.0),
                "bedroom.jpg",
                &payload,
            ))
            .await
            .expect("request completes");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["analysis_available"], true);
    }

    #[tokio::test]
    async fn damage_report_pairs_rooms_and_sums_costs() {
        let app = test_app(MockVision::new());
        let store = &app.store;
        let property = store
            .insert_property(NewProperty {
                name: "Beach House".to_string(),
                address: None,
            })
            .expect("property inserts");
        let room_a = store
            .insert_room(
                property.id,
                NewRoom {
                    name: "Room A".to_string(),
                    kind: RoomKind::Bedroom,
                },
            )
            .expect("room inserts");
        let room_b = store
            .insert_room(
                property.id,
                NewRoom {
                    name: "Room B".to_string(),
                    kind: RoomKind::Bedroom,
                },
            )
            .expect("room inserts");
        let checkin = store
            .insert_check(
                property.id,
                CheckDraft {
                    kind: CheckKind::Checkin,
                    guest_name: Some("Jane".to_string()),
                },
            )
            .expect("check inserts");
        let checkout = store
            .insert_check(
                property.id,
                CheckDraft {
                    kind: CheckKind::Checkout,
                    guest_name: Some("Jane".to_string()),
                },
            )
            .expect("check inserts");

        for (check_id, room_id, path) in [
            (checkin.id, room_a.id, "uploads/a-before.jpg"),
            (checkin.id, room_b.id, "uploads/b-before.jpg"),
            (checkout.id, room_a.id, "uploads/a-after.jpg"),
        ] {
            store
                .insert_photo(NewPhoto {
                    check_id,
                    room_id,
                    file_path: path.to_string(),
                    analysis: serde_json::Value::Null,
                })
                .expect("photo inserts");
        }
        store
            .insert_issue(NewIssue {
                check_id: checkout.id,
                description: "Missing: Towels".to_string(),
                item_name: Some("Towels".to_string()),
                estimated_cost: 20.0,
                severity: Severity::Medium,
            })
            .expect("issue inserts");

        let response = app
            .router
            .clone()
            .oneshot(get_request(&format!(
                "/api/properties/{}/damage-report?checkin_id={}&checkout_id={}",
                property.id.0, checkin.id.0, checkout.id.0
            )))
            .await
            .expect("request completes");
        assert_eq!(response.status(), StatusCode::OK);
        let report = body_json(response).await;
        assert_eq!(report["property_name"], "Beach House");
        assert_eq!(report["total_estimated_cost"], 20.0);
        assert_eq!(report["comparison_photos"].as_array().map(Vec::len), Some(1));
        assert_eq!(report["comparison_photos"][0]["room_name"], "Room A");

        // The check-in id pointing at the checkout record is a lookup miss.
        let mistyped = app
            .router
            .clone()
            .oneshot(get_request(&format!(
                "/api/properties/{}/damage-report?checkin_id={}&checkout_id={}",
                property.id.0, checkout.id.0, checkout.id.0
            )))
            .await
            .expect("request completes");
        assert_eq!(mistyped.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn cost_history_is_empty_for_a_fresh_property() {
        let app = test_app(MockVision::new());
        let property = app
            .store
            .insert_property(NewProperty {
                name: "Quiet Cabin".to_string(),
                address: None,
            })
            .expect("property inserts");

        let response = app
            .router
            .clone()
            .oneshot(get_request(&format!(
                "/api/properties/{}/cost-history",
                property.id.0
            )))
            .await
            .expect("request completes");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!([]));
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let app = test_app(MockVision::new());
        let response = app
            .router
            .clone()
            .oneshot(get_request("/health"))
            .await
            .expect("request completes");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }
}
