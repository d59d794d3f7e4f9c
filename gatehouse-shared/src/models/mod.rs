/// Database models for Gatehouse
///
/// # Models
///
/// - `account`: account records and the per-account token collection
/// - `session`: server-side sessions with a fixed TTL
///
/// All operations take an explicit `&PgPool` handle; there is no global
/// connection state.

pub mod account;
pub mod session;
