/// Key sharing ledger model and database operations
///
/// A share grants one company visibility of another company's key at a
/// permission level. At most one share exists per (key, company) pair:
/// sharing again overwrites the permission instead of duplicating the row
/// (single-statement upsert on the pair's unique index). Removing a share
/// that does not exist is a no-op.
///
/// # Example
///
/// ```no_run
/// use trousseau_shared::models::key_share::{KeyShare, SharePermission, UpsertKeyShare};
/// use sqlx::MySqlPool;
///
/// # async fn example(pool: MySqlPool) -> Result<(), sqlx::Error> {
/// let share = KeyShare::upsert(
///     &pool,
///     UpsertKeyShare {
///         key_id: 10,
///         shared_with_company_id: 1,
///         permissions: SharePermission::View,
///         shared_by_user_id: None,
///     },
/// )
/// .await?;
/// assert_eq!(share.permissions, "view");
///
/// // Same pair, new level: one row, latest permission wins.
/// let share = KeyShare::upsert(
///     &pool,
///     UpsertKeyShare {
///         key_id: 10,
///         shared_with_company_id: 1,
///         permissions: SharePermission::Edit,
///         shared_by_user_id: None,
///     },
/// )
/// .await?;
/// assert_eq!(share.permissions, "edit");
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;

use super::lock_key::KeyWithCompany;

/// Permission level granted by a share
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SharePermission {
    View,
    Edit,
    Full,
}

impl SharePermission {
    pub fn as_str(&self) -> &'static str {
        match self {
            SharePermission::View => "view",
            SharePermission::Edit => "edit",
            SharePermission::Full => "full",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "view" => Some(SharePermission::View),
            "edit" => Some(SharePermission::Edit),
            "full" => Some(SharePermission::Full),
            _ => None,
        }
    }
}

/// Key share row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct KeyShare {
    pub id: i64,
    pub key_id: i64,
    pub shared_with_company_id: i64,

    /// Person who granted the share, nulled if that person is removed
    pub shared_by_user_id: Option<i64>,

    /// 'view', 'edit' or 'full'
    pub permissions: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Share row joined with the target company's name
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ShareWithCompany {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub share: KeyShare,

    /// Name of the company the key is shared with
    pub company_name: Option<String>,
}

/// Company a key is shared with, including the grant's details
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SharedCompany {
    pub id: i64,
    pub name: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub company_type: String,
    pub status: String,
    pub permissions: String,
    pub shared_at: DateTime<Utc>,
}

/// Key visible to a company through a share, with the grant's details
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SharedKey {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub key: KeyWithCompany,

    /// Permission level of the grant
    pub permissions: String,

    /// When the share was created
    pub shared_at: DateTime<Utc>,
}

/// Input for creating or updating a share
#[derive(Debug, Clone)]
pub struct UpsertKeyShare {
    pub key_id: i64,
    pub shared_with_company_id: i64,
    pub permissions: SharePermission,
    pub shared_by_user_id: Option<i64>,
}

const SHARED_KEY_PROJECTION: &str = "k.id, k.entreprise_origine_id, k.company_id, k.manager_id, \
     k.address, k.owner_name, k.owner_contact, k.house_manager_name, \
     k.house_manager_contact, k.key_location, k.status, k.notes, \
     k.created_at, k.updated_at, c.name AS company_name";

impl KeyShare {
    /// Creates a share, or overwrites the permission level of an existing
    /// share for the same (key, company) pair
    ///
    /// The upsert is a single round trip against the pair's unique index,
    /// so concurrent grants cannot produce duplicates. Returns the share
    /// row as stored.
    pub async fn upsert(pool: &MySqlPool, data: UpsertKeyShare) -> Result<Self, sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO key_shares (key_id, shared_with_company_id, shared_by_user_id, permissions)
            VALUES (?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                permissions = VALUES(permissions),
                shared_by_user_id = VALUES(shared_by_user_id)
            "#,
        )
        .bind(data.key_id)
        .bind(data.shared_with_company_id)
        .bind(data.shared_by_user_id)
        .bind(data.permissions.as_str())
        .execute(pool)
        .await?;

        Self::find_pair(pool, data.key_id, data.shared_with_company_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Finds the share for a (key, company) pair
    pub async fn find_pair(
        pool: &MySqlPool,
        key_id: i64,
        shared_with_company_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, KeyShare>(
            r#"
            SELECT id, key_id, shared_with_company_id, shared_by_user_id,
                   permissions, created_at, updated_at
            FROM key_shares
            WHERE key_id = ? AND shared_with_company_id = ?
            "#,
        )
        .bind(key_id)
        .bind(shared_with_company_id)
        .fetch_optional(pool)
        .await
    }

    /// Removes the share for a (key, company) pair
    ///
    /// Removing a non-existent share is a no-op, not an error. Returns the
    /// number of affected rows (0 or 1).
    pub async fn remove(
        pool: &MySqlPool,
        key_id: i64,
        shared_with_company_id: i64,
    ) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM key_shares WHERE key_id = ? AND shared_with_company_id = ?")
                .bind(key_id)
                .bind(shared_with_company_id)
                .execute(pool)
                .await?;

        Ok(result.rows_affected())
    }

    /// Lists the shares of a key, newest first, with the target company's
    /// name joined in
    pub async fn list_for_key(
        pool: &MySqlPool,
        key_id: i64,
    ) -> Result<Vec<ShareWithCompany>, sqlx::Error> {
        sqlx::query_as::<_, ShareWithCompany>(
            r#"
            SELECT ks.id, ks.key_id, ks.shared_with_company_id, ks.shared_by_user_id,
                   ks.permissions, ks.created_at, ks.updated_at,
                   c.name AS company_name
            FROM key_shares ks
            LEFT JOIN companies c ON ks.shared_with_company_id = c.id
            WHERE ks.key_id = ?
            ORDER BY ks.created_at DESC
            "#,
        )
        .bind(key_id)
        .fetch_all(pool)
        .await
    }

    /// Lists the companies a key is shared with, alphabetically
    pub async fn companies_for_key(
        pool: &MySqlPool,
        key_id: i64,
    ) -> Result<Vec<SharedCompany>, sqlx::Error> {
        sqlx::query_as::<_, SharedCompany>(
            r#"
            SELECT c.id, c.name, c.type, c.status,
                   ks.permissions, ks.created_at AS shared_at
            FROM key_shares ks
            JOIN companies c ON ks.shared_with_company_id = c.id
            WHERE ks.key_id = ?
            ORDER BY c.name
            "#,
        )
        .bind(key_id)
        .fetch_all(pool)
        .await
    }

    /// Lists the keys shared with a company, newest grant first, carrying
    /// each grant's permission level and share timestamp
    pub async fn keys_shared_with(
        pool: &MySqlPool,
        company_id: i64,
    ) -> Result<Vec<SharedKey>, sqlx::Error> {
        let sql = format!(
            "SELECT {}, ks.permissions, ks.created_at AS shared_at
             FROM key_shares ks
             JOIN lock_keys k ON ks.key_id = k.id
             LEFT JOIN companies c ON k.company_id = c.id
             WHERE ks.shared_with_company_id = ?
             ORDER BY ks.created_at DESC",
            SHARED_KEY_PROJECTION
        );

        sqlx::query_as::<_, SharedKey>(&sql)
            .bind(company_id)
            .fetch_all(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_roundtrip() {
        for permission in [
            SharePermission::View,
            SharePermission::Edit,
            SharePermission::Full,
        ] {
            assert_eq!(SharePermission::parse(permission.as_str()), Some(permission));
        }
        assert_eq!(SharePermission::parse("admin"), None);
    }

    #[test]
    fn test_permission_serde_names() {
        assert_eq!(
            serde_json::to_string(&SharePermission::View).unwrap(),
            "\"view\""
        );
        let parsed: SharePermission = serde_json::from_str("\"full\"").unwrap();
        assert_eq!(parsed, SharePermission::Full);
    }
}
