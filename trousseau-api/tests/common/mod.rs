/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - Test database setup and cleanup
/// - Seed companies (one agency with one child conciergerie)
/// - Seed personnel and keys
/// - API request helpers

use axum::body::Body;
use axum::http::{Request, Response};
use sqlx::MySqlPool;
use tower::Service as _;

use trousseau_api::app::{build_router, AppState};
use trousseau_api::config::Config;
use trousseau_shared::auth::password::hash_password;
use trousseau_shared::models::company::{Company, CompanyType, CreateCompany};
use trousseau_shared::models::lock_key::{CreateLockKey, KeyWithCompany, LockKey};
use trousseau_shared::models::personnel::{CreatePersonnel, PersonnelRole, PersonnelWithCompany};

/// Test context containing all necessary resources
///
/// Seeds one agency and one conciergerie attached to it; every test's data
/// hangs off those two companies, so dropping them cleans everything up via
/// the schema's cascades.
pub struct TestContext {
    pub db: MySqlPool,
    pub app: axum::Router,
    pub agency: Company,
    pub conciergerie: Company,
}

impl TestContext {
    /// Creates a new test context against the database in `DATABASE_URL`
    pub async fn new() -> anyhow::Result<Self> {
        let config = Config::from_env()?;

        let db = MySqlPool::connect(&config.database.url).await?;

        // Run migrations (path relative to Cargo.toml, not this file)
        sqlx::migrate!("../migrations").run(&db).await?;

        // Unique names so parallel test runs cannot collide
        let suffix = unique_suffix();

        let agency = Company::create(
            &db,
            CreateCompany {
                name: format!("Agence Test {}", suffix),
                company_type: CompanyType::Agency,
                parent_id: None,
                siret: None,
                address: None,
                phone: None,
                email: None,
                status: None,
            },
        )
        .await?;

        let conciergerie = Company::create(
            &db,
            CreateCompany {
                name: format!("Conciergerie Test {}", suffix),
                company_type: CompanyType::Conciergerie,
                parent_id: Some(agency.id),
                siret: None,
                address: None,
                phone: None,
                email: None,
                status: None,
            },
        )
        .await?;

        let state = AppState::new(db.clone(), config);
        let app = build_router(state);

        Ok(TestContext {
            db,
            app,
            agency,
            conciergerie,
        })
    }

    /// Sends a request through the router and returns the raw response
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> anyhow::Result<Response<Body>> {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self.app.clone().call(builder.body(body)?).await?;
        Ok(response)
    }

    /// Cleans up test data
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        // Dropping the conciergerie first, then the agency, cascades to
        // personnel, keys and shares
        Company::delete(&self.db, self.conciergerie.id).await?;
        Company::delete(&self.db, self.agency.id).await?;
        Ok(())
    }
}

/// Reads a response body as JSON
pub async fn body_json(response: Response<Body>) -> anyhow::Result<serde_json::Value> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Helper to seed a key owned by a company
pub async fn create_test_key(
    ctx: &TestContext,
    company_id: i64,
    address: &str,
) -> anyhow::Result<KeyWithCompany> {
    let key = LockKey::create(
        &ctx.db,
        CreateLockKey {
            entreprise_origine_id: company_id,
            company_id,
            manager_id: None,
            address: address.to_string(),
            owner_name: "M. Propriétaire".to_string(),
            owner_contact: None,
            house_manager_name: None,
            house_manager_contact: None,
            key_location: None,
            status: None,
            notes: None,
        },
    )
    .await?;

    Ok(key)
}

/// Helper to seed an active person with a known password
pub async fn create_test_personnel(
    ctx: &TestContext,
    company_id: i64,
    email: &str,
    password: &str,
) -> anyhow::Result<PersonnelWithCompany> {
    let person = trousseau_shared::models::personnel::Personnel::create(
        &ctx.db,
        CreatePersonnel {
            company_id,
            first_name: "Marie".to_string(),
            last_name: "Dupont".to_string(),
            email: email.to_string(),
            phone: None,
            role: PersonnelRole::Manager,
            access_level: None,
            password_hash: hash_password(password)?,
            status: None,
        },
    )
    .await?;

    Ok(person)
}

/// Short unique suffix for seed names and emails
pub fn unique_suffix() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock before epoch")
        .subsec_nanos();
    format!("{}-{}", std::process::id(), nanos)
}
