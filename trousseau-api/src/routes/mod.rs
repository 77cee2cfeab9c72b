/// API route handlers
///
/// Handlers are grouped per resource:
///
/// - `health`: Liveness and database connectivity
/// - `companies`: Agency / conciergerie directory and hierarchy
/// - `personnel`: Per-company staff, including login
/// - `keys`: Key registry, sharing ledger and visibility resolution

pub mod companies;
pub mod health;
pub mod keys;
pub mod personnel;
