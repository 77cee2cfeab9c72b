/// Personnel model and database operations
///
/// Personnel belong to exactly one company (cascade-deleted with it) and
/// carry an Argon2id password hash. The hash never leaves the data layer:
/// read projections omit the column, and the full row skips it during
/// serialization.
///
/// # Example
///
/// ```no_run
/// use trousseau_shared::models::personnel::{CreatePersonnel, Personnel, PersonnelRole};
/// use trousseau_shared::auth::password::hash_password;
/// use sqlx::MySqlPool;
///
/// # async fn example(pool: MySqlPool) -> Result<(), Box<dyn std::error::Error>> {
/// let person = Personnel::create(
///     &pool,
///     CreatePersonnel {
///         company_id: 1,
///         first_name: "Marie".to_string(),
///         last_name: "Dupont".to_string(),
///         email: "marie@example.com".to_string(),
///         phone: None,
///         role: PersonnelRole::Manager,
///         access_level: None,
///         password_hash: hash_password("S3cret!")?,
///         status: None,
///     },
/// )
/// .await?;
/// println!("Created personnel {}", person.id);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;

use super::company::CompanyStatus;

/// Personnel role within a company
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonnelRole {
    Admin,
    Manager,
    Employee,
}

impl PersonnelRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            PersonnelRole::Admin => "admin",
            PersonnelRole::Manager => "manager",
            PersonnelRole::Employee => "employee",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(PersonnelRole::Admin),
            "manager" => Some(PersonnelRole::Manager),
            "employee" => Some(PersonnelRole::Employee),
            _ => None,
        }
    }
}

/// Access level granted to a person
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Full,
    Limited,
    Restricted,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Full => "full",
            AccessLevel::Limited => "limited",
            AccessLevel::Restricted => "restricted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "full" => Some(AccessLevel::Full),
            "limited" => Some(AccessLevel::Limited),
            "restricted" => Some(AccessLevel::Restricted),
            _ => None,
        }
    }
}

/// Full personnel row
///
/// `password_hash` is needed for credential verification but is never
/// serialized into responses.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Personnel {
    pub id: i64,
    pub company_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,

    /// 'admin', 'manager' or 'employee'
    pub role: String,

    /// 'full', 'limited' or 'restricted'
    pub access_level: String,

    #[serde(skip_serializing)]
    pub password_hash: String,

    /// 'active' or 'inactive'
    pub status: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Read projection: personnel joined with the company name, without the
/// password hash
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PersonnelWithCompany {
    pub id: i64,
    pub company_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: String,
    pub access_level: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Name of the employing company (null if the join finds nothing)
    pub company_name: Option<String>,
}

/// Minimal projection for selection UIs (dropdowns)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PersonnelSummary {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
}

/// Optional filters for listing personnel
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonnelFilter {
    pub company_id: Option<i64>,
    pub role: Option<PersonnelRole>,
    pub status: Option<CompanyStatus>,
}

/// Input for creating personnel
///
/// The caller hashes the password; the model only ever sees the digest.
#[derive(Debug, Clone)]
pub struct CreatePersonnel {
    pub company_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: PersonnelRole,

    /// Defaults to limited when omitted
    pub access_level: Option<AccessLevel>,

    pub password_hash: String,

    /// Defaults to active when omitted
    pub status: Option<CompanyStatus>,
}

/// Input for a full-record personnel update
///
/// `password_hash` is `Some` only when the caller supplied a new password;
/// `None` leaves the stored hash untouched.
#[derive(Debug, Clone)]
pub struct UpdatePersonnel {
    pub company_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: PersonnelRole,
    pub access_level: AccessLevel,
    pub password_hash: Option<String>,
    pub status: CompanyStatus,
}

const PERSONNEL_PROJECTION: &str = "p.id, p.company_id, p.first_name, p.last_name, p.email, \
     p.phone, p.role, p.access_level, p.status, p.created_at, p.updated_at";

impl Personnel {
    /// Lists personnel, optionally filtered by company, role and/or status,
    /// ordered by last then first name, with the company name joined in
    pub async fn list(
        pool: &MySqlPool,
        filter: PersonnelFilter,
    ) -> Result<Vec<PersonnelWithCompany>, sqlx::Error> {
        let mut sql = format!(
            "SELECT {}, c.name AS company_name
             FROM personnel p
             LEFT JOIN companies c ON p.company_id = c.id
             WHERE 1=1",
            PERSONNEL_PROJECTION
        );

        if filter.company_id.is_some() {
            sql.push_str(" AND p.company_id = ?");
        }
        if filter.role.is_some() {
            sql.push_str(" AND p.role = ?");
        }
        if filter.status.is_some() {
            sql.push_str(" AND p.status = ?");
        }
        sql.push_str(" ORDER BY p.last_name, p.first_name");

        let mut query = sqlx::query_as::<_, PersonnelWithCompany>(&sql);
        if let Some(company_id) = filter.company_id {
            query = query.bind(company_id);
        }
        if let Some(role) = filter.role {
            query = query.bind(role.as_str());
        }
        if let Some(status) = filter.status {
            query = query.bind(status.as_str());
        }

        query.fetch_all(pool).await
    }

    /// Lists the active personnel of a company, minimal projection
    pub async fn list_by_company(
        pool: &MySqlPool,
        company_id: i64,
    ) -> Result<Vec<PersonnelSummary>, sqlx::Error> {
        sqlx::query_as::<_, PersonnelSummary>(
            r#"
            SELECT id, first_name, last_name, email, role
            FROM personnel
            WHERE company_id = ? AND status = 'active'
            ORDER BY last_name, first_name
            "#,
        )
        .bind(company_id)
        .fetch_all(pool)
        .await
    }

    /// Finds a person by ID, with the company name joined in
    pub async fn find_by_id(
        pool: &MySqlPool,
        id: i64,
    ) -> Result<Option<PersonnelWithCompany>, sqlx::Error> {
        let sql = format!(
            "SELECT {}, c.name AS company_name
             FROM personnel p
             LEFT JOIN companies c ON p.company_id = c.id
             WHERE p.id = ?",
            PERSONNEL_PROJECTION
        );

        sqlx::query_as::<_, PersonnelWithCompany>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds an active person by email, including the password hash
    ///
    /// Login support only; the returned row must not be serialized as-is
    /// (its serde impl skips the hash regardless).
    pub async fn find_active_by_email(
        pool: &MySqlPool,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Personnel>(
            r#"
            SELECT id, company_id, first_name, last_name, email, phone, role,
                   access_level, password_hash, status, created_at, updated_at
            FROM personnel
            WHERE email = ? AND status = 'active'
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    /// Creates a new person
    ///
    /// Email is unique across all personnel; a duplicate surfaces as a
    /// database constraint violation.
    pub async fn create(
        pool: &MySqlPool,
        data: CreatePersonnel,
    ) -> Result<PersonnelWithCompany, sqlx::Error> {
        let access_level = data.access_level.unwrap_or(AccessLevel::Limited);
        let status = data.status.unwrap_or(CompanyStatus::Active);

        let result = sqlx::query(
            r#"
            INSERT INTO personnel
                (company_id, first_name, last_name, email, phone, role,
                 access_level, password_hash, status)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(data.company_id)
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(data.role.as_str())
        .bind(access_level.as_str())
        .bind(&data.password_hash)
        .bind(status.as_str())
        .execute(pool)
        .await?;

        let id = result.last_insert_id() as i64;

        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Applies a full-record update
    ///
    /// The stored password hash is replaced only when `data.password_hash`
    /// is `Some`. Returns the number of affected rows.
    pub async fn update(
        pool: &MySqlPool,
        id: i64,
        data: UpdatePersonnel,
    ) -> Result<u64, sqlx::Error> {
        let mut sql = String::from(
            "UPDATE personnel
             SET company_id = ?, first_name = ?, last_name = ?, email = ?,
                 phone = ?, role = ?, access_level = ?, status = ?",
        );
        if data.password_hash.is_some() {
            sql.push_str(", password_hash = ?");
        }
        sql.push_str(" WHERE id = ?");

        let mut query = sqlx::query(&sql)
            .bind(data.company_id)
            .bind(&data.first_name)
            .bind(&data.last_name)
            .bind(&data.email)
            .bind(&data.phone)
            .bind(data.role.as_str())
            .bind(data.access_level.as_str())
            .bind(data.status.as_str());
        if let Some(hash) = &data.password_hash {
            query = query.bind(hash);
        }

        let result = query.bind(id).execute(pool).await?;

        Ok(result.rows_affected())
    }

    /// Deletes a person; returns the number of affected rows
    pub async fn delete(pool: &MySqlPool, id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM personnel WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_roundtrip() {
        for role in [
            PersonnelRole::Admin,
            PersonnelRole::Manager,
            PersonnelRole::Employee,
        ] {
            assert_eq!(PersonnelRole::parse(role.as_str()), Some(role));
        }
        assert_eq!(PersonnelRole::parse("owner"), None);
    }

    #[test]
    fn test_access_level_roundtrip() {
        for level in [
            AccessLevel::Full,
            AccessLevel::Limited,
            AccessLevel::Restricted,
        ] {
            assert_eq!(AccessLevel::parse(level.as_str()), Some(level));
        }
        assert_eq!(AccessLevel::parse(""), None);
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let person = Personnel {
            id: 1,
            company_id: 2,
            first_name: "Marie".to_string(),
            last_name: "Dupont".to_string(),
            email: "marie@example.com".to_string(),
            phone: None,
            role: "manager".to_string(),
            access_level: "full".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            status: "active".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&person).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("argon2id"));
        assert!(json.contains("marie@example.com"));
    }
}
