/// Company directory routes
///
/// Companies are agencies and conciergeries. A conciergerie may hang under
/// one parent agency; that link drives hierarchy-based key visibility, so
/// the handlers enforce its shape: only conciergeries carry a parent, and a
/// parent must be an existing agency.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use trousseau_shared::models::company::{
    Company, CompanyFilter, CompanyHierarchy, CompanyStatus, CompanyType, CreateCompany,
    UpdateCompany,
};

use crate::app::AppState;
use crate::error::{ApiError, ApiResult};

/// Request body for creating a company
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCompanyRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,

    #[serde(rename = "type")]
    pub company_type: CompanyType,

    pub parent_id: Option<i64>,
    pub siret: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,

    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,

    pub status: Option<CompanyStatus>,
}

/// Request body for updating a company
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCompanyRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,

    #[serde(rename = "type")]
    pub company_type: CompanyType,

    pub parent_id: Option<i64>,
    pub siret: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,

    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,

    pub status: CompanyStatus,
}

/// GET /v1/companies?type=&status=
pub async fn list_companies(
    State(state): State<AppState>,
    Query(filter): Query<CompanyFilter>,
) -> ApiResult<Json<Vec<Company>>> {
    let companies = Company::list(&state.db, filter).await?;
    Ok(Json(companies))
}

/// GET /v1/companies/parents
///
/// Active agencies, i.e. the companies eligible to parent a conciergerie.
pub async fn list_parents(State(state): State<AppState>) -> ApiResult<Json<Vec<Company>>> {
    let parents = Company::parents(&state.db).await?;
    Ok(Json(parents))
}

/// GET /v1/companies/hierarchy
pub async fn get_hierarchy(State(state): State<AppState>) -> ApiResult<Json<CompanyHierarchy>> {
    let hierarchy = Company::hierarchy(&state.db).await?;
    Ok(Json(hierarchy))
}

/// GET /v1/companies/:id
pub async fn get_company(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Company>> {
    let company = Company::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Company {} not found", id)))?;

    Ok(Json(company))
}

/// GET /v1/companies/:id/children
pub async fn list_children(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<Company>>> {
    Company::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Company {} not found", id)))?;

    let children = Company::children(&state.db, id).await?;
    Ok(Json(children))
}

/// POST /v1/companies
pub async fn create_company(
    State(state): State<AppState>,
    Json(request): Json<CreateCompanyRequest>,
) -> ApiResult<(StatusCode, Json<Company>)> {
    request.validate()?;
    check_parent_link(&state, request.company_type, request.parent_id, None).await?;

    let company = Company::create(
        &state.db,
        CreateCompany {
            name: request.name,
            company_type: request.company_type,
            parent_id: request.parent_id,
            siret: request.siret,
            address: request.address,
            phone: request.phone,
            email: request.email,
            status: request.status,
        },
    )
    .await?;

    state
        .audit
        .record(
            "COMPANY_CREATE",
            json!({
                "company_id": company.id,
                "name": company.name,
                "type": company.company_type,
            }),
        )
        .await;

    Ok((StatusCode::CREATED, Json(company)))
}

/// PUT /v1/companies/:id
pub async fn update_company(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateCompanyRequest>,
) -> ApiResult<Json<Company>> {
    request.validate()?;
    check_parent_link(&state, request.company_type, request.parent_id, Some(id)).await?;

    let affected = Company::update(
        &state.db,
        id,
        UpdateCompany {
            name: request.name,
            company_type: request.company_type,
            parent_id: request.parent_id,
            siret: request.siret,
            address: request.address,
            phone: request.phone,
            email: request.email,
            status: request.status,
        },
    )
    .await?;

    if affected == 0 {
        return Err(ApiError::NotFound(format!("Company {} not found", id)));
    }

    state
        .audit
        .record("COMPANY_UPDATE", json!({ "company_id": id }))
        .await;

    let company = Company::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Company {} not found", id)))?;

    Ok(Json(company))
}

/// DELETE /v1/companies/:id
///
/// Cascades to the company's personnel and keys; child companies are
/// detached, not deleted.
pub async fn delete_company(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    let affected = Company::delete(&state.db, id).await?;
    if affected == 0 {
        return Err(ApiError::NotFound(format!("Company {} not found", id)));
    }

    state
        .audit
        .record("COMPANY_DELETE", json!({ "company_id": id }))
        .await;

    Ok(StatusCode::NO_CONTENT)
}

/// Validates the parent link of a create or update request
///
/// Only a conciergerie may carry a parent, the parent must be an existing
/// agency, and a company cannot be its own parent.
async fn check_parent_link(
    state: &AppState,
    company_type: CompanyType,
    parent_id: Option<i64>,
    own_id: Option<i64>,
) -> ApiResult<()> {
    let Some(parent_id) = parent_id else {
        return Ok(());
    };

    if company_type == CompanyType::Agency {
        return Err(ApiError::BadRequest(
            "An agency cannot have a parent company".to_string(),
        ));
    }
    if own_id == Some(parent_id) {
        return Err(ApiError::BadRequest(
            "A company cannot be its own parent".to_string(),
        ));
    }

    let parent = Company::find_by_id(&state.db, parent_id)
        .await?
        .ok_or_else(|| {
            ApiError::BadRequest(format!("Parent company {} does not exist", parent_id))
        })?;

    if !parent.is_agency() {
        return Err(ApiError::BadRequest(
            "Parent company must be an agency".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_validation() {
        let request = CreateCompanyRequest {
            name: String::new(),
            company_type: CompanyType::Agency,
            parent_id: None,
            siret: None,
            address: None,
            phone: None,
            email: Some("not-an-email".to_string()),
            status: None,
        };

        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("email"));
    }

    #[test]
    fn test_create_request_deserializes_type_field() {
        let request: CreateCompanyRequest = serde_json::from_str(
            r#"{"name": "Conciergerie Sud", "type": "conciergerie", "parent_id": 1}"#,
        )
        .unwrap();

        assert_eq!(request.company_type, CompanyType::Conciergerie);
        assert_eq!(request.parent_id, Some(1));
        assert!(request.validate().is_ok());
    }
}
