/// Database models for Trousseau
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `company`: Companies (agencies and conciergeries) with a one-level
///   parent/child hierarchy
/// - `personnel`: Employees scoped to a company, with hashed credentials
/// - `lock_key`: Physical property keys owned by a company
/// - `key_share`: Explicit grants of a key to another company
///
/// # Example
///
/// ```no_run
/// use trousseau_shared::models::company::{Company, CompanyType, CreateCompany};
/// use trousseau_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let company = Company::create(
///     &pool,
///     CreateCompany {
///         name: "Agence du Port".to_string(),
///         company_type: CompanyType::Agency,
///         parent_id: None,
///         siret: None,
///         address: None,
///         phone: None,
///         email: None,
///         status: None,
///     },
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```

pub mod company;
pub mod key_share;
pub mod lock_key;
pub mod personnel;
