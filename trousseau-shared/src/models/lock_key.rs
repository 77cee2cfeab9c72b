/// Key registry model and database operations
///
/// A lock key is a physical property key held by a company. Two company
/// references exist on every row: `entreprise_origine_id` records which
/// company originally registered the key (immutable provenance) and
/// `company_id` is the current custodian. Only the latter participates in
/// visibility resolution.
///
/// The table is `lock_keys` because `keys` is reserved in MySQL.
///
/// # Example
///
/// ```no_run
/// use trousseau_shared::models::lock_key::{CreateLockKey, KeyFilter, LockKey};
/// use sqlx::MySqlPool;
///
/// # async fn example(pool: MySqlPool) -> Result<(), sqlx::Error> {
/// let key = LockKey::create(
///     &pool,
///     CreateLockKey {
///         entreprise_origine_id: 2,
///         company_id: 2,
///         manager_id: None,
///         address: "12 rue de la République, Lyon".to_string(),
///         owner_name: "M. Bernard".to_string(),
///         owner_contact: None,
///         house_manager_name: None,
///         house_manager_contact: None,
///         key_location: Some("Casier 4".to_string()),
///         status: None,
///         notes: None,
///     },
/// )
/// .await?;
///
/// let keys = LockKey::list(&pool, KeyFilter::default()).await?;
/// assert!(keys.iter().any(|k| k.key.id == key.key.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;

/// Key lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStatus {
    Available,
    Borrowed,
    Returned,
    Lost,
}

impl KeyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyStatus::Available => "available",
            KeyStatus::Borrowed => "borrowed",
            KeyStatus::Returned => "returned",
            KeyStatus::Lost => "lost",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "available" => Some(KeyStatus::Available),
            "borrowed" => Some(KeyStatus::Borrowed),
            "returned" => Some(KeyStatus::Returned),
            "lost" => Some(KeyStatus::Lost),
            _ => None,
        }
    }
}

/// Lock key row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LockKey {
    pub id: i64,

    /// Company that originally registered the key (provenance, immutable)
    pub entreprise_origine_id: i64,

    /// Current owning/custodial company
    pub company_id: i64,

    /// Responsible person, nulled if that person is removed
    pub manager_id: Option<i64>,

    /// Property address
    pub address: String,

    pub owner_name: String,
    pub owner_contact: Option<String>,
    pub house_manager_name: Option<String>,
    pub house_manager_contact: Option<String>,

    /// Physical storage location of the key
    pub key_location: Option<String>,

    /// 'available', 'borrowed', 'returned' or 'lost'
    pub status: String,

    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Key row denormalized with the owning company's name for display
///
/// The company is left-joined: a missing company yields a null name, not an
/// error.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct KeyWithCompany {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub key: LockKey,

    pub company_name: Option<String>,
}

/// Optional filters for listing keys
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeyFilter {
    pub company_id: Option<i64>,
    pub status: Option<KeyStatus>,
}

/// Input for creating a key
#[derive(Debug, Clone)]
pub struct CreateLockKey {
    pub entreprise_origine_id: i64,
    pub company_id: i64,
    pub manager_id: Option<i64>,
    pub address: String,
    pub owner_name: String,
    pub owner_contact: Option<String>,
    pub house_manager_name: Option<String>,
    pub house_manager_contact: Option<String>,
    pub key_location: Option<String>,

    /// Defaults to available when omitted
    pub status: Option<KeyStatus>,

    pub notes: Option<String>,
}

/// Input for a full-record key update
///
/// Provenance (`entreprise_origine_id`) is immutable and deliberately
/// absent.
#[derive(Debug, Clone)]
pub struct UpdateLockKey {
    pub company_id: i64,
    pub manager_id: Option<i64>,
    pub address: String,
    pub owner_name: String,
    pub owner_contact: Option<String>,
    pub house_manager_name: Option<String>,
    pub house_manager_contact: Option<String>,
    pub key_location: Option<String>,
    pub status: KeyStatus,
    pub notes: Option<String>,
}

/// Per-status key counts for a dashboard summary
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct KeyStats {
    pub total: i64,
    pub available: i64,
    pub borrowed: i64,
    pub returned: i64,
    pub lost: i64,
}

const KEY_PROJECTION: &str = "k.id, k.entreprise_origine_id, k.company_id, k.manager_id, \
     k.address, k.owner_name, k.owner_contact, k.house_manager_name, \
     k.house_manager_contact, k.key_location, k.status, k.notes, \
     k.created_at, k.updated_at";

impl LockKey {
    /// Lists keys, optionally filtered by owning company and/or status,
    /// newest first, with the owning company's name joined in
    pub async fn list(
        pool: &MySqlPool,
        filter: KeyFilter,
    ) -> Result<Vec<KeyWithCompany>, sqlx::Error> {
        let mut sql = format!(
            "SELECT {}, c.name AS company_name
             FROM lock_keys k
             LEFT JOIN companies c ON k.company_id = c.id
             WHERE 1=1",
            KEY_PROJECTION
        );

        if filter.company_id.is_some() {
            sql.push_str(" AND k.company_id = ?");
        }
        if filter.status.is_some() {
            sql.push_str(" AND k.status = ?");
        }
        sql.push_str(" ORDER BY k.created_at DESC");

        let mut query = sqlx::query_as::<_, KeyWithCompany>(&sql);
        if let Some(company_id) = filter.company_id {
            query = query.bind(company_id);
        }
        if let Some(status) = filter.status {
            query = query.bind(status.as_str());
        }

        query.fetch_all(pool).await
    }

    /// Lists keys owned by the direct children of a parent company,
    /// newest first
    ///
    /// This is the hierarchy leg of visibility resolution: exactly one
    /// level deep, no recursion into grandchildren.
    pub async fn list_owned_by_children(
        pool: &MySqlPool,
        parent_id: i64,
    ) -> Result<Vec<KeyWithCompany>, sqlx::Error> {
        let sql = format!(
            "SELECT {}, c.name AS company_name
             FROM lock_keys k
             LEFT JOIN companies c ON k.company_id = c.id
             WHERE c.parent_id = ?
             ORDER BY k.created_at DESC",
            KEY_PROJECTION
        );

        sqlx::query_as::<_, KeyWithCompany>(&sql)
            .bind(parent_id)
            .fetch_all(pool)
            .await
    }

    /// Finds a key by ID, with the owning company's name joined in
    pub async fn find_by_id(
        pool: &MySqlPool,
        id: i64,
    ) -> Result<Option<KeyWithCompany>, sqlx::Error> {
        let sql = format!(
            "SELECT {}, c.name AS company_name
             FROM lock_keys k
             LEFT JOIN companies c ON k.company_id = c.id
             WHERE k.id = ?",
            KEY_PROJECTION
        );

        sqlx::query_as::<_, KeyWithCompany>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Creates a new key
    ///
    /// Status defaults to available when omitted.
    pub async fn create(
        pool: &MySqlPool,
        data: CreateLockKey,
    ) -> Result<KeyWithCompany, sqlx::Error> {
        let status = data.status.unwrap_or(KeyStatus::Available);

        let result = sqlx::query(
            r#"
            INSERT INTO lock_keys
                (entreprise_origine_id, company_id, manager_id, address, owner_name,
                 owner_contact, house_manager_name, house_manager_contact,
                 key_location, status, notes)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(data.entreprise_origine_id)
        .bind(data.company_id)
        .bind(data.manager_id)
        .bind(&data.address)
        .bind(&data.owner_name)
        .bind(&data.owner_contact)
        .bind(&data.house_manager_name)
        .bind(&data.house_manager_contact)
        .bind(&data.key_location)
        .bind(status.as_str())
        .bind(&data.notes)
        .execute(pool)
        .await?;

        let id = result.last_insert_id() as i64;

        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Applies a full-record update; returns the number of affected rows
    pub async fn update(
        pool: &MySqlPool,
        id: i64,
        data: UpdateLockKey,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE lock_keys
            SET company_id = ?, manager_id = ?, address = ?, owner_name = ?,
                owner_contact = ?, house_manager_name = ?, house_manager_contact = ?,
                key_location = ?, status = ?, notes = ?
            WHERE id = ?
            "#,
        )
        .bind(data.company_id)
        .bind(data.manager_id)
        .bind(&data.address)
        .bind(&data.owner_name)
        .bind(&data.owner_contact)
        .bind(&data.house_manager_name)
        .bind(&data.house_manager_contact)
        .bind(&data.key_location)
        .bind(data.status.as_str())
        .bind(&data.notes)
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Narrow status-only update; returns the number of affected rows
    pub async fn update_status(
        pool: &MySqlPool,
        id: i64,
        status: KeyStatus,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE lock_keys SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Deletes a key; returns the number of affected rows
    ///
    /// The store cascades to the key's shares.
    pub async fn delete(pool: &MySqlPool, id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM lock_keys WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Per-status key counts, optionally scoped to one owning company
    pub async fn stats(
        pool: &MySqlPool,
        company_id: Option<i64>,
    ) -> Result<KeyStats, sqlx::Error> {
        // COUNT over a CASE keeps the result a BIGINT even on empty tables
        let mut sql = String::from(
            "SELECT COUNT(*) AS total,
                    COUNT(CASE WHEN status = 'available' THEN 1 END) AS available,
                    COUNT(CASE WHEN status = 'borrowed' THEN 1 END) AS borrowed,
                    COUNT(CASE WHEN status = 'returned' THEN 1 END) AS returned,
                    COUNT(CASE WHEN status = 'lost' THEN 1 END) AS lost
             FROM lock_keys",
        );
        if company_id.is_some() {
            sql.push_str(" WHERE company_id = ?");
        }

        let mut query = sqlx::query_as::<_, KeyStats>(&sql);
        if let Some(company_id) = company_id {
            query = query.bind(company_id);
        }

        query.fetch_one(pool).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_status_roundtrip() {
        for status in [
            KeyStatus::Available,
            KeyStatus::Borrowed,
            KeyStatus::Returned,
            KeyStatus::Lost,
        ] {
            assert_eq!(KeyStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(KeyStatus::parse("misplaced"), None);
    }

    #[test]
    fn test_key_filter_deserializes_from_query() {
        let filter: KeyFilter =
            serde_json::from_str(r#"{"company_id": 3, "status": "borrowed"}"#).unwrap();
        assert_eq!(filter.company_id, Some(3));
        assert_eq!(filter.status, Some(KeyStatus::Borrowed));

        let empty: KeyFilter = serde_json::from_str("{}").unwrap();
        assert!(empty.company_id.is_none());
        assert!(empty.status.is_none());
    }

    #[test]
    fn test_key_with_company_serializes_flat() {
        let key = KeyWithCompany {
            key: LockKey {
                id: 10,
                entreprise_origine_id: 2,
                company_id: 2,
                manager_id: None,
                address: "12 rue de la République".to_string(),
                owner_name: "M. Bernard".to_string(),
                owner_contact: None,
                house_manager_name: None,
                house_manager_contact: None,
                key_location: None,
                status: "available".to_string(),
                notes: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            company_name: Some("Conciergerie Sud".to_string()),
        };

        let json = serde_json::to_value(&key).unwrap();
        // Flattened: key fields and company_name live at the same level
        assert_eq!(json["id"], 10);
        assert_eq!(json["company_name"], "Conciergerie Sud");
        assert!(json.get("key").is_none());
    }
}
