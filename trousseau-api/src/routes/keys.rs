/// Key registry, sharing and visibility routes
///
/// Keys are owned by one company at a time; `entreprise_origine_id` records
/// the registering company and never changes after creation. Shares grant
/// other companies visibility, and `GET /visible` resolves the full
/// reason-tagged view for one company.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use trousseau_shared::models::key_share::{
    KeyShare, SharePermission, ShareWithCompany, SharedCompany, SharedKey, UpsertKeyShare,
};
use trousseau_shared::models::lock_key::{
    CreateLockKey, KeyFilter, KeyStats, KeyStatus, KeyWithCompany, LockKey, UpdateLockKey,
};
use trousseau_shared::visibility::{resolve_visible_keys, VisibleKey};

use crate::app::AppState;
use crate::error::{ApiError, ApiResult};

/// Request body for registering a key
#[derive(Debug, Deserialize, Validate)]
pub struct CreateKeyRequest {
    /// Registering company; defaults to `company_id` when omitted
    pub entreprise_origine_id: Option<i64>,

    pub company_id: i64,
    pub manager_id: Option<i64>,

    #[validate(length(min = 1, max = 500, message = "Address is required"))]
    pub address: String,

    #[validate(length(min = 1, max = 255, message = "Owner name is required"))]
    pub owner_name: String,

    pub owner_contact: Option<String>,
    pub house_manager_name: Option<String>,
    pub house_manager_contact: Option<String>,
    pub key_location: Option<String>,
    pub status: Option<KeyStatus>,
    pub notes: Option<String>,
}

/// Request body for a full-record key update
///
/// Provenance is immutable, so `entreprise_origine_id` is not accepted.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateKeyRequest {
    pub company_id: i64,
    pub manager_id: Option<i64>,

    #[validate(length(min = 1, max = 500, message = "Address is required"))]
    pub address: String,

    #[validate(length(min = 1, max = 255, message = "Owner name is required"))]
    pub owner_name: String,

    pub owner_contact: Option<String>,
    pub house_manager_name: Option<String>,
    pub house_manager_contact: Option<String>,
    pub key_location: Option<String>,
    pub status: KeyStatus,
    pub notes: Option<String>,
}

/// Request body for a status-only update
#[derive(Debug, Deserialize)]
pub struct UpdateKeyStatusRequest {
    pub status: KeyStatus,
}

/// Request body for sharing a key with a company
#[derive(Debug, Deserialize)]
pub struct ShareKeyRequest {
    pub shared_with_company_id: i64,
    pub permissions: SharePermission,
    pub shared_by_user_id: Option<i64>,
}

/// Query parameters for visibility resolution
#[derive(Debug, Deserialize)]
pub struct VisibleKeysQuery {
    pub company_id: i64,
}

/// Query parameters for the stats summary
#[derive(Debug, Default, Deserialize)]
pub struct KeyStatsQuery {
    pub company_id: Option<i64>,
}

/// GET /v1/keys?company_id=&status=
pub async fn list_keys(
    State(state): State<AppState>,
    Query(filter): Query<KeyFilter>,
) -> ApiResult<Json<Vec<KeyWithCompany>>> {
    let keys = LockKey::list(&state.db, filter).await?;
    Ok(Json(keys))
}

/// GET /v1/keys/visible?company_id=
///
/// Resolves the keys visible to one company: owned, then shared, then
/// hierarchy (agencies only), each entry tagged with its reason. A key
/// visible for two reasons appears once per reason.
pub async fn list_visible_keys(
    State(state): State<AppState>,
    Query(query): Query<VisibleKeysQuery>,
) -> ApiResult<Json<Vec<VisibleKey>>> {
    let visible = resolve_visible_keys(&state.db, query.company_id).await?;
    Ok(Json(visible))
}

/// GET /v1/keys/stats/summary?company_id=
pub async fn key_stats(
    State(state): State<AppState>,
    Query(query): Query<KeyStatsQuery>,
) -> ApiResult<Json<KeyStats>> {
    let stats = LockKey::stats(&state.db, query.company_id).await?;
    Ok(Json(stats))
}

/// GET /v1/keys/shared-with/:company_id
///
/// Keys another company granted to this one, newest grant first.
pub async fn list_keys_shared_with(
    State(state): State<AppState>,
    Path(company_id): Path<i64>,
) -> ApiResult<Json<Vec<SharedKey>>> {
    let keys = KeyShare::keys_shared_with(&state.db, company_id).await?;
    Ok(Json(keys))
}

/// GET /v1/keys/:id
pub async fn get_key(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<KeyWithCompany>> {
    let key = LockKey::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Key {} not found", id)))?;

    Ok(Json(key))
}

/// GET /v1/keys/:id/shares
pub async fn list_key_shares(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<ShareWithCompany>>> {
    require_key(&state, id).await?;

    let shares = KeyShare::list_for_key(&state.db, id).await?;
    Ok(Json(shares))
}

/// GET /v1/keys/:id/shared-with
///
/// Companies the key is currently shared with, alphabetically.
pub async fn list_shared_companies(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<SharedCompany>>> {
    require_key(&state, id).await?;

    let companies = KeyShare::companies_for_key(&state.db, id).await?;
    Ok(Json(companies))
}

/// POST /v1/keys
pub async fn create_key(
    State(state): State<AppState>,
    Json(request): Json<CreateKeyRequest>,
) -> ApiResult<(StatusCode, Json<KeyWithCompany>)> {
    request.validate()?;

    let entreprise_origine_id = request.entreprise_origine_id.unwrap_or(request.company_id);

    let key = LockKey::create(
        &state.db,
        CreateLockKey {
            entreprise_origine_id,
            company_id: request.company_id,
            manager_id: request.manager_id,
            address: request.address,
            owner_name: request.owner_name,
            owner_contact: request.owner_contact,
            house_manager_name: request.house_manager_name,
            house_manager_contact: request.house_manager_contact,
            key_location: request.key_location,
            status: request.status,
            notes: request.notes,
        },
    )
    .await?;

    state
        .audit
        .record(
            "KEY_CREATE",
            json!({
                "key_id": key.key.id,
                "company_id": key.key.company_id,
                "entreprise_origine_id": key.key.entreprise_origine_id,
            }),
        )
        .await;

    Ok((StatusCode::CREATED, Json(key)))
}

/// PUT /v1/keys/:id
pub async fn update_key(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateKeyRequest>,
) -> ApiResult<Json<KeyWithCompany>> {
    request.validate()?;

    let affected = LockKey::update(
        &state.db,
        id,
        UpdateLockKey {
            company_id: request.company_id,
            manager_id: request.manager_id,
            address: request.address,
            owner_name: request.owner_name,
            owner_contact: request.owner_contact,
            house_manager_name: request.house_manager_name,
            house_manager_contact: request.house_manager_contact,
            key_location: request.key_location,
            status: request.status,
            notes: request.notes,
        },
    )
    .await?;

    if affected == 0 {
        return Err(ApiError::NotFound(format!("Key {} not found", id)));
    }

    state
        .audit
        .record("KEY_UPDATE", json!({ "key_id": id }))
        .await;

    let key = LockKey::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Key {} not found", id)))?;

    Ok(Json(key))
}

/// PATCH /v1/keys/:id/status
pub async fn update_key_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateKeyStatusRequest>,
) -> ApiResult<Json<KeyWithCompany>> {
    let affected = LockKey::update_status(&state.db, id, request.status).await?;
    if affected == 0 {
        return Err(ApiError::NotFound(format!("Key {} not found", id)));
    }

    state
        .audit
        .record(
            "KEY_STATUS_CHANGE",
            json!({ "key_id": id, "status": request.status.as_str() }),
        )
        .await;

    let key = LockKey::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Key {} not found", id)))?;

    Ok(Json(key))
}

/// DELETE /v1/keys/:id
///
/// Cascades to the key's shares.
pub async fn delete_key(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    let affected = LockKey::delete(&state.db, id).await?;
    if affected == 0 {
        return Err(ApiError::NotFound(format!("Key {} not found", id)));
    }

    state
        .audit
        .record("KEY_DELETE", json!({ "key_id": id }))
        .await;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/keys/:id/share
///
/// Creates or updates the share for the (key, company) pair; sharing an
/// already-shared key overwrites the permission level.
pub async fn share_key(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<ShareKeyRequest>,
) -> ApiResult<Json<KeyShare>> {
    require_key(&state, id).await?;

    let share = KeyShare::upsert(
        &state.db,
        UpsertKeyShare {
            key_id: id,
            shared_with_company_id: request.shared_with_company_id,
            permissions: request.permissions,
            shared_by_user_id: request.shared_by_user_id,
        },
    )
    .await?;

    state
        .audit
        .record(
            "KEY_SHARE_UPDATE",
            json!({
                "key_id": id,
                "shared_with_company_id": share.shared_with_company_id,
                "permissions": share.permissions,
            }),
        )
        .await;

    Ok(Json(share))
}

/// DELETE /v1/keys/:id/share/:company_id
///
/// Removing a share that does not exist is a no-op, not an error.
pub async fn unshare_key(
    State(state): State<AppState>,
    Path((id, company_id)): Path<(i64, i64)>,
) -> ApiResult<StatusCode> {
    let removed = KeyShare::remove(&state.db, id, company_id).await?;

    state
        .audit
        .record(
            "KEY_SHARE_DELETE",
            json!({
                "key_id": id,
                "shared_with_company_id": company_id,
                "removed": removed > 0,
            }),
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}

/// Fails with NotFound when the key does not exist
async fn require_key(state: &AppState, id: i64) -> ApiResult<()> {
    LockKey::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Key {} not found", id)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_validation() {
        let request = CreateKeyRequest {
            entreprise_origine_id: None,
            company_id: 1,
            manager_id: None,
            address: String::new(),
            owner_name: String::new(),
            owner_contact: None,
            house_manager_name: None,
            house_manager_contact: None,
            key_location: None,
            status: None,
            notes: None,
        };

        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("address"));
        assert!(fields.contains_key("owner_name"));
    }

    #[test]
    fn test_share_request_deserializes_permission() {
        let request: ShareKeyRequest = serde_json::from_str(
            r#"{"shared_with_company_id": 1, "permissions": "edit"}"#,
        )
        .unwrap();

        assert_eq!(request.permissions, SharePermission::Edit);
        assert!(request.shared_by_user_id.is_none());
    }

    #[test]
    fn test_provenance_defaults_to_owner() {
        let request: CreateKeyRequest = serde_json::from_str(
            r#"{"company_id": 2, "address": "12 rue de la République", "owner_name": "M. Bernard"}"#,
        )
        .unwrap();

        let entreprise_origine_id = request.entreprise_origine_id.unwrap_or(request.company_id);
        assert_eq!(entreprise_origine_id, 2);
    }
}
