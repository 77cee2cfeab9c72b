/// Company model and database operations
///
/// Companies come in two types: real-estate agencies (`agency`) and
/// conciergeries. A conciergerie may be attached to one parent agency via
/// `parent_id`; visibility resolution traverses that link exactly one level
/// deep. Deleting a parent detaches its children (SET NULL in the schema),
/// while deleting a company cascades to its personnel and keys.
///
/// # Example
///
/// ```no_run
/// use trousseau_shared::models::company::{Company, CompanyType, CreateCompany};
/// use sqlx::MySqlPool;
///
/// # async fn example(pool: MySqlPool) -> Result<(), sqlx::Error> {
/// let agency = Company::create(
///     &pool,
///     CreateCompany {
///         name: "Agence du Port".to_string(),
///         company_type: CompanyType::Agency,
///         parent_id: None,
///         siret: Some("123 456 789 00010".to_string()),
///         address: None,
///         phone: None,
///         email: None,
///         status: None,
///     },
/// )
/// .await?;
/// println!("Created company {}", agency.id);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;

/// Company type, fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompanyType {
    /// Real-estate agency; may have child conciergeries
    Agency,

    /// Property-management unit, optionally attached to one parent agency
    Conciergerie,
}

impl CompanyType {
    /// Converts the type to its database representation
    pub fn as_str(&self) -> &'static str {
        match self {
            CompanyType::Agency => "agency",
            CompanyType::Conciergerie => "conciergerie",
        }
    }

    /// Parses a type from its database representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "agency" => Some(CompanyType::Agency),
            "conciergerie" => Some(CompanyType::Conciergerie),
            _ => None,
        }
    }
}

/// Company status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompanyStatus {
    Active,
    Inactive,
}

impl CompanyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompanyStatus::Active => "active",
            CompanyStatus::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(CompanyStatus::Active),
            "inactive" => Some(CompanyStatus::Inactive),
            _ => None,
        }
    }
}

/// Company row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Company {
    /// Unique company ID
    pub id: i64,

    /// Display name
    pub name: String,

    /// Company type ('agency' or 'conciergerie')
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub company_type: String,

    /// Parent company, only meaningful for a conciergerie under an agency
    pub parent_id: Option<i64>,

    /// French business registration number
    pub siret: Option<String>,

    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,

    /// 'active' or 'inactive'
    pub status: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Company {
    /// Gets the parsed type enum
    pub fn get_type(&self) -> Option<CompanyType> {
        CompanyType::parse(&self.company_type)
    }

    /// Whether this company is an agency (and thus eligible for
    /// hierarchy-based key visibility)
    pub fn is_agency(&self) -> bool {
        self.get_type() == Some(CompanyType::Agency)
    }
}

/// Company row joined with its parent's name, for hierarchy display
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CompanyWithParent {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub company: Company,

    /// Name of the parent company, if any
    pub parent_name: Option<String>,
}

/// Full hierarchy listing, partitioned by type for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyHierarchy {
    pub agencies: Vec<CompanyWithParent>,
    pub conciergeries: Vec<CompanyWithParent>,
}

/// Optional filters for listing companies
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyFilter {
    #[serde(rename = "type")]
    pub company_type: Option<CompanyType>,
    pub status: Option<CompanyStatus>,
}

/// Input for creating a company
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCompany {
    pub name: String,

    #[serde(rename = "type")]
    pub company_type: CompanyType,

    pub parent_id: Option<i64>,
    pub siret: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,

    /// Defaults to active when omitted
    pub status: Option<CompanyStatus>,
}

/// Input for a full-record company update
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCompany {
    pub name: String,

    #[serde(rename = "type")]
    pub company_type: CompanyType,

    pub parent_id: Option<i64>,
    pub siret: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub status: CompanyStatus,
}

const COMPANY_COLUMNS: &str =
    "id, name, type, parent_id, siret, address, phone, email, status, created_at, updated_at";

impl Company {
    /// Lists companies, optionally filtered by type and/or status,
    /// ordered alphabetically by name
    pub async fn list(pool: &MySqlPool, filter: CompanyFilter) -> Result<Vec<Self>, sqlx::Error> {
        let mut sql = format!("SELECT {} FROM companies WHERE 1=1", COMPANY_COLUMNS);

        if filter.company_type.is_some() {
            sql.push_str(" AND type = ?");
        }
        if filter.status.is_some() {
            sql.push_str(" AND status = ?");
        }
        sql.push_str(" ORDER BY name");

        let mut query = sqlx::query_as::<_, Company>(&sql);
        if let Some(company_type) = filter.company_type {
            query = query.bind(company_type.as_str());
        }
        if let Some(status) = filter.status {
            query = query.bind(status.as_str());
        }

        query.fetch_all(pool).await
    }

    /// Lists active agencies, i.e. companies eligible to parent a
    /// conciergerie
    pub async fn parents(pool: &MySqlPool) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM companies WHERE type = 'agency' AND status = 'active' ORDER BY name",
            COMPANY_COLUMNS
        );

        sqlx::query_as::<_, Company>(&sql).fetch_all(pool).await
    }

    /// Lists the direct children of a parent company
    pub async fn children(pool: &MySqlPool, parent_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM companies WHERE parent_id = ? ORDER BY name",
            COMPANY_COLUMNS
        );

        sqlx::query_as::<_, Company>(&sql)
            .bind(parent_id)
            .fetch_all(pool)
            .await
    }

    /// Finds a company by ID
    ///
    /// Returns `None` when no row matches.
    pub async fn find_by_id(pool: &MySqlPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {} FROM companies WHERE id = ?", COMPANY_COLUMNS);

        sqlx::query_as::<_, Company>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Returns all companies joined with their parent's name, partitioned
    /// into agencies and conciergeries
    pub async fn hierarchy(pool: &MySqlPool) -> Result<CompanyHierarchy, sqlx::Error> {
        let rows = sqlx::query_as::<_, CompanyWithParent>(
            r#"
            SELECT c.id, c.name, c.type, c.parent_id, c.siret, c.address, c.phone,
                   c.email, c.status, c.created_at, c.updated_at,
                   p.name AS parent_name
            FROM companies c
            LEFT JOIN companies p ON c.parent_id = p.id
            ORDER BY c.type, c.name
            "#,
        )
        .fetch_all(pool)
        .await?;

        let (agencies, conciergeries) = rows
            .into_iter()
            .partition(|row| row.company.is_agency());

        Ok(CompanyHierarchy {
            agencies,
            conciergeries,
        })
    }

    /// Creates a new company
    ///
    /// Status defaults to active when omitted. The referenced parent must
    /// exist (enforced by the schema's foreign key).
    pub async fn create(pool: &MySqlPool, data: CreateCompany) -> Result<Self, sqlx::Error> {
        let status = data.status.unwrap_or(CompanyStatus::Active);

        let result = sqlx::query(
            r#"
            INSERT INTO companies (name, type, parent_id, siret, address, phone, email, status)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&data.name)
        .bind(data.company_type.as_str())
        .bind(data.parent_id)
        .bind(&data.siret)
        .bind(&data.address)
        .bind(&data.phone)
        .bind(&data.email)
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
    /// Returns the number of affected rows (0 when the company does not
    /// exist).
    pub async fn update(
        pool: &MySqlPool,
        id: i64,
        data: UpdateCompany,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE companies
            SET name = ?, type = ?, parent_id = ?, siret = ?, address = ?,
                phone = ?, email = ?, status = ?
            WHERE id = ?
            "#,
        )
        .bind(&data.name)
        .bind(data.company_type.as_str())
        .bind(data.parent_id)
        .bind(&data.siret)
        .bind(&data.address)
        .bind(&data.phone)
        .bind(&data.email)
        .bind(data.status.as_str())
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Deletes a company
    ///
    /// The store cascades to personnel and keys, and detaches child
    /// companies (their parent_id becomes NULL). Returns the number of
    /// affected rows.
    pub async fn delete(pool: &MySqlPool, id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM companies WHERE id = ?")
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
    fn test_company_type_roundtrip() {
        for t in [CompanyType::Agency, CompanyType::Conciergerie] {
            assert_eq!(CompanyType::parse(t.as_str()), Some(t));
        }
        assert_eq!(CompanyType::parse("agence_imobiliere"), None);
    }

    #[test]
    fn test_company_status_roundtrip() {
        for s in [CompanyStatus::Active, CompanyStatus::Inactive] {
            assert_eq!(CompanyStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(CompanyStatus::parse("archived"), None);
    }

    #[test]
    fn test_company_type_serde_names() {
        assert_eq!(
            serde_json::to_string(&CompanyType::Agency).unwrap(),
            "\"agency\""
        );
        assert_eq!(
            serde_json::to_string(&CompanyType::Conciergerie).unwrap(),
            "\"conciergerie\""
        );
    }

    #[test]
    fn test_is_agency() {
        let mut company = sample_company();
        assert!(company.is_agency());

        company.company_type = "conciergerie".to_string();
        assert!(!company.is_agency());

        company.company_type = "garbage".to_string();
        assert!(!company.is_agency());
    }

    #[test]
    fn test_create_company_deserializes_type_field() {
        let data: CreateCompany = serde_json::from_str(
            r#"{"name": "Conciergerie Sud", "type": "conciergerie", "parent_id": 1}"#,
        )
        .unwrap();

        assert_eq!(data.company_type, CompanyType::Conciergerie);
        assert_eq!(data.parent_id, Some(1));
        assert!(data.status.is_none());
    }

    fn sample_company() -> Company {
        Company {
            id: 1,
            name: "Agence du Port".to_string(),
            company_type: "agency".to_string(),
            parent_id: None,
            siret: None,
            address: None,
            phone: None,
            email: None,
            status: "active".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}
