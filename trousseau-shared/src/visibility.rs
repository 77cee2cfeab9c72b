/// Key visibility resolution
///
/// Computes which keys a company is entitled to see, and why. A key is
/// visible for one of three independent reasons:
///
/// - **owned**: the company is the key's current custodian
/// - **shared**: another company granted it via the sharing ledger
/// - **hierarchy**: the company is an agency and the key is owned by one of
///   its direct child conciergeries
///
/// The result is a reason-tagged multiset, not a deduplicated set: a key
/// visible for two reasons appears twice, once per reason, because callers
/// must be able to explain each grant. Sets are concatenated in the fixed
/// order owned, shared, hierarchy; within each set, rows are newest first
/// (shares by share time).
///
/// The key's provenance (`entreprise_origine_id`) never participates in
/// resolution, and hierarchy traversal is exactly one level deep.
///
/// # Example
///
/// ```no_run
/// use trousseau_shared::visibility::{resolve_visible_keys, VisibilityReason};
/// use sqlx::MySqlPool;
///
/// # async fn example(pool: MySqlPool) -> Result<(), Box<dyn std::error::Error>> {
/// let visible = resolve_visible_keys(&pool, 1).await?;
/// for entry in &visible {
///     println!("{} visible as {}", entry.key.key.id, entry.visibility.as_str());
/// }
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;

use crate::models::company::Company;
use crate::models::key_share::{KeyShare, SharedKey};
use crate::models::lock_key::{KeyFilter, KeyWithCompany, LockKey};
use chrono::{DateTime, Utc};

/// Why a key is visible to the requesting company
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityReason {
    Owned,
    Shared,
    Hierarchy,
}

impl VisibilityReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisibilityReason::Owned => "owned",
            VisibilityReason::Shared => "shared",
            VisibilityReason::Hierarchy => "hierarchy",
        }
    }
}

/// One entry of the visibility result: a key plus the reason it is visible
///
/// `permissions` and `shared_at` are populated only for shared entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisibleKey {
    #[serde(flatten)]
    pub key: KeyWithCompany,

    /// Reason tag, serialized as `visibility`
    pub visibility: VisibilityReason,

    /// Permission level of the grant (shared entries only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<String>,

    /// When the grant was created (shared entries only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_at: Option<DateTime<Utc>>,
}

/// Visibility resolution errors
#[derive(Debug, thiserror::Error)]
pub enum VisibilityError {
    /// The requesting company does not exist
    #[error("company {0} not found")]
    CompanyNotFound(i64),

    /// The relational store failed
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Resolves the keys visible to a company
///
/// Fails with [`VisibilityError::CompanyNotFound`] when `company_id` does
/// not reference an existing company; otherwise always succeeds (an empty
/// result is valid). Companies that are not agencies never receive a
/// hierarchy set.
///
/// The three legs are read-only and commute, so they are issued
/// concurrently; the fixed owned → shared → hierarchy order is imposed when
/// assembling the result.
pub async fn resolve_visible_keys(
    pool: &MySqlPool,
    company_id: i64,
) -> Result<Vec<VisibleKey>, VisibilityError> {
    let company = Company::find_by_id(pool, company_id)
        .await?
        .ok_or(VisibilityError::CompanyNotFound(company_id))?;

    let owned = LockKey::list(
        pool,
        KeyFilter {
            company_id: Some(company_id),
            status: None,
        },
    );
    let shared = KeyShare::keys_shared_with(pool, company_id);
    let hierarchy = hierarchy_keys(pool, &company);

    let (owned, shared, hierarchy) = tokio::try_join!(owned, shared, hierarchy)?;

    Ok(assemble(owned, shared, hierarchy))
}

/// Hierarchy leg: keys owned by direct child conciergeries, agencies only
async fn hierarchy_keys(
    pool: &MySqlPool,
    company: &Company,
) -> Result<Vec<KeyWithCompany>, sqlx::Error> {
    if company.is_agency() {
        LockKey::list_owned_by_children(pool, company.id).await
    } else {
        Ok(Vec::new())
    }
}

/// Tags and concatenates the three result sets in their fixed order
///
/// Pure so the order and multiset semantics can be tested without a
/// database. Duplicates across sets are preserved, one row per applicable
/// reason.
pub fn assemble(
    owned: Vec<KeyWithCompany>,
    shared: Vec<SharedKey>,
    hierarchy: Vec<KeyWithCompany>,
) -> Vec<VisibleKey> {
    let mut result = Vec::with_capacity(owned.len() + shared.len() + hierarchy.len());

    result.extend(owned.into_iter().map(|key| VisibleKey {
        key,
        visibility: VisibilityReason::Owned,
        permissions: None,
        shared_at: None,
    }));

    result.extend(shared.into_iter().map(|entry| VisibleKey {
        key: entry.key,
        visibility: VisibilityReason::Shared,
        permissions: Some(entry.permissions),
        shared_at: Some(entry.shared_at),
    }));

    result.extend(hierarchy.into_iter().map(|key| VisibleKey {
        key,
        visibility: VisibilityReason::Hierarchy,
        permissions: None,
        shared_at: None,
    }));

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::lock_key::LockKey as LockKeyRow;

    fn key(id: i64, company_id: i64) -> KeyWithCompany {
        KeyWithCompany {
            key: LockKeyRow {
                id,
                entreprise_origine_id: company_id,
                company_id,
                manager_id: None,
                address: format!("{} rue des Lilas", id),
                owner_name: "Mme Martin".to_string(),
                owner_contact: None,
                house_manager_name: None,
                house_manager_contact: None,
                key_location: None,
                status: "available".to_string(),
                notes: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            company_name: Some(format!("Company {}", company_id)),
        }
    }

    fn shared(id: i64, company_id: i64, permissions: &str) -> SharedKey {
        SharedKey {
            key: key(id, company_id),
            permissions: permissions.to_string(),
            shared_at: Utc::now(),
        }
    }

    #[test]
    fn test_assemble_preserves_set_order() {
        let result = assemble(
            vec![key(1, 10), key(2, 10)],
            vec![shared(3, 20, "view")],
            vec![key(4, 30)],
        );

        let tags: Vec<_> = result.iter().map(|v| v.visibility).collect();
        assert_eq!(
            tags,
            vec![
                VisibilityReason::Owned,
                VisibilityReason::Owned,
                VisibilityReason::Shared,
                VisibilityReason::Hierarchy,
            ]
        );
        let ids: Vec<_> = result.iter().map(|v| v.key.key.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_assemble_keeps_duplicates_across_sets() {
        // A key shared with an agency that also inherits it via hierarchy
        // appears once per reason. Deduplication would lose the provenance
        // of one of the grants.
        let result = assemble(vec![], vec![shared(10, 2, "edit")], vec![key(10, 2)]);

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].key.key.id, 10);
        assert_eq!(result[0].visibility, VisibilityReason::Shared);
        assert_eq!(result[1].key.key.id, 10);
        assert_eq!(result[1].visibility, VisibilityReason::Hierarchy);
    }

    #[test]
    fn test_assemble_shared_entries_carry_grant_details() {
        let result = assemble(vec![key(1, 10)], vec![shared(2, 20, "view")], vec![]);

        assert_eq!(result[0].permissions, None);
        assert_eq!(result[0].shared_at, None);
        assert_eq!(result[1].permissions.as_deref(), Some("view"));
        assert!(result[1].shared_at.is_some());
    }

    #[test]
    fn test_assemble_empty_sets() {
        assert!(assemble(vec![], vec![], vec![]).is_empty());
    }

    #[test]
    fn test_visible_key_serialization() {
        let entries = assemble(vec![key(10, 2)], vec![shared(11, 3, "view")], vec![]);

        let owned_json = serde_json::to_value(&entries[0]).unwrap();
        assert_eq!(owned_json["id"], 10);
        assert_eq!(owned_json["visibility"], "owned");
        assert!(owned_json.get("permissions").is_none());
        assert!(owned_json.get("shared_at").is_none());

        let shared_json = serde_json::to_value(&entries[1]).unwrap();
        assert_eq!(shared_json["visibility"], "shared");
        assert_eq!(shared_json["permissions"], "view");
        assert!(shared_json.get("shared_at").is_some());
    }

    #[test]
    fn test_reason_as_str() {
        assert_eq!(VisibilityReason::Owned.as_str(), "owned");
        assert_eq!(VisibilityReason::Shared.as_str(), "shared");
        assert_eq!(VisibilityReason::Hierarchy.as_str(), "hierarchy");
    }

    #[test]
    fn test_company_not_found_error_display() {
        let err = VisibilityError::CompanyNotFound(42);
        assert_eq!(err.to_string(), "company 42 not found");
    }
}
