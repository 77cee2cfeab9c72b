/// Personnel directory routes
///
/// Staff records belong to one company each. Passwords are hashed with
/// Argon2id before they reach the model layer; the login handler answers
/// unknown-email and wrong-password with the same message, and burns a
/// dummy verification on the unknown-email path so the two failures take
/// comparable time.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use trousseau_shared::auth::password::{
    hash_password, verify_password, DEFAULT_PASSWORD, DUMMY_HASH,
};
use trousseau_shared::models::company::CompanyStatus;
use trousseau_shared::models::personnel::{
    AccessLevel, CreatePersonnel, Personnel, PersonnelFilter, PersonnelRole, PersonnelSummary,
    PersonnelWithCompany, UpdatePersonnel,
};

use crate::app::AppState;
use crate::error::{ApiError, ApiResult};

/// One message for both login failure modes, so a caller cannot probe
/// which emails exist.
const LOGIN_FAILED: &str = "Invalid email or password";

/// Request body for creating personnel
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePersonnelRequest {
    pub company_id: i64,

    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    pub phone: Option<String>,
    pub role: PersonnelRole,
    pub access_level: Option<AccessLevel>,

    /// Hashed before storage; a default is applied when omitted so bulk
    /// imports can create accounts first and set passwords later
    pub password: Option<String>,

    pub status: Option<CompanyStatus>,
}

/// Request body for updating personnel
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePersonnelRequest {
    pub company_id: i64,

    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    pub phone: Option<String>,
    pub role: PersonnelRole,
    pub access_level: AccessLevel,

    /// When present and non-empty, replaces the stored password
    pub password: Option<String>,

    pub status: CompanyStatus,
}

/// Login request body
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login response: the authenticated identity, no token
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub personnel: PersonnelWithCompany,
}

/// GET /v1/personnel?company_id=&role=&status=
pub async fn list_personnel(
    State(state): State<AppState>,
    Query(filter): Query<PersonnelFilter>,
) -> ApiResult<Json<Vec<PersonnelWithCompany>>> {
    let personnel = Personnel::list(&state.db, filter).await?;
    Ok(Json(personnel))
}

/// GET /v1/personnel/by-company/:company_id
///
/// Active personnel of one company, minimal projection for selection UIs.
pub async fn list_by_company(
    State(state): State<AppState>,
    Path(company_id): Path<i64>,
) -> ApiResult<Json<Vec<PersonnelSummary>>> {
    let personnel = Personnel::list_by_company(&state.db, company_id).await?;
    Ok(Json(personnel))
}

/// GET /v1/personnel/:id
pub async fn get_personnel(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<PersonnelWithCompany>> {
    let person = Personnel::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Personnel {} not found", id)))?;

    Ok(Json(person))
}

/// POST /v1/personnel
pub async fn create_personnel(
    State(state): State<AppState>,
    Json(request): Json<CreatePersonnelRequest>,
) -> ApiResult<(StatusCode, Json<PersonnelWithCompany>)> {
    request.validate()?;

    let password = request.password.as_deref().unwrap_or(DEFAULT_PASSWORD);
    let password_hash = hash_password(password)?;

    let person = Personnel::create(
        &state.db,
        CreatePersonnel {
            company_id: request.company_id,
            first_name: request.first_name,
            last_name: request.last_name,
            email: request.email,
            phone: request.phone,
            role: request.role,
            access_level: request.access_level,
            password_hash,
            status: request.status,
        },
    )
    .await?;

    state
        .audit
        .record(
            "PERSONNEL_CREATE",
            json!({
                "personnel_id": person.id,
                "company_id": person.company_id,
                "email": person.email,
            }),
        )
        .await;

    Ok((StatusCode::CREATED, Json(person)))
}

/// PUT /v1/personnel/:id
pub async fn update_personnel(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdatePersonnelRequest>,
) -> ApiResult<Json<PersonnelWithCompany>> {
    request.validate()?;

    // An absent or empty password leaves the stored hash untouched
    let password_hash = match request.password.as_deref() {
        Some(password) if !password.is_empty() => Some(hash_password(password)?),
        _ => None,
    };

    let affected = Personnel::update(
        &state.db,
        id,
        UpdatePersonnel {
            company_id: request.company_id,
            first_name: request.first_name,
            last_name: request.last_name,
            email: request.email,
            phone: request.phone,
            role: request.role,
            access_level: request.access_level,
            password_hash,
            status: request.status,
        },
    )
    .await?;

    if affected == 0 {
        return Err(ApiError::NotFound(format!("Personnel {} not found", id)));
    }

    state
        .audit
        .record("PERSONNEL_UPDATE", json!({ "personnel_id": id }))
        .await;

    let person = Personnel::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Personnel {} not found", id)))?;

    Ok(Json(person))
}

/// DELETE /v1/personnel/:id
pub async fn delete_personnel(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    let affected = Personnel::delete(&state.db, id).await?;
    if affected == 0 {
        return Err(ApiError::NotFound(format!("Personnel {} not found", id)));
    }

    state
        .audit
        .record("PERSONNEL_DELETE", json!({ "personnel_id": id }))
        .await;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/personnel/login
///
/// Verifies credentials against the active personnel directory and returns
/// the identity. No session or token is issued.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    request.validate()?;

    let person = match Personnel::find_active_by_email(&state.db, &request.email).await? {
        Some(person) => person,
        None => {
            // Burn a verification so this path costs as much as a real
            // hash check, then fail with the shared message
            let _ = verify_password(&request.password, DUMMY_HASH);
            return Err(ApiError::Unauthorized(LOGIN_FAILED.to_string()));
        }
    };

    if !verify_password(&request.password, &person.password_hash)? {
        return Err(ApiError::Unauthorized(LOGIN_FAILED.to_string()));
    }

    state
        .audit
        .record(
            "PERSONNEL_LOGIN",
            json!({
                "personnel_id": person.id,
                "company_id": person.company_id,
            }),
        )
        .await;

    let personnel = Personnel::find_by_id(&state.db, person.id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Personnel {} not found", person.id)))?;

    Ok(Json(LoginResponse { personnel }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_failure_message_is_shared() {
        // Both failure paths must produce this exact message; probing which
        // emails exist must be impossible from the response alone.
        let unknown_email = ApiError::Unauthorized(LOGIN_FAILED.to_string());
        let wrong_password = ApiError::Unauthorized(LOGIN_FAILED.to_string());

        assert_eq!(unknown_email.to_string(), wrong_password.to_string());
    }

    #[test]
    fn test_create_request_validation() {
        let request = CreatePersonnelRequest {
            company_id: 1,
            first_name: String::new(),
            last_name: "Dupont".to_string(),
            email: "not-an-email".to_string(),
            phone: None,
            role: PersonnelRole::Employee,
            access_level: None,
            password: None,
            status: None,
        };

        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("first_name"));
        assert!(fields.contains_key("email"));
    }

    #[test]
    fn test_login_request_requires_password() {
        let request = LoginRequest {
            email: "marie@example.com".to_string(),
            password: String::new(),
        };

        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }
}
