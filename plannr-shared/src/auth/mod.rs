/// Authentication and authorization
///
/// Identity is owned by the auth provider. This module validates its tokens,
/// refreshes sessions, performs elevated lookups and applies tier checks.
///
/// # Modules
///
/// - [`jwt`]: local validation of provider access tokens
/// - [`session`]: session cookies and the provider refresh client
/// - [`admin`]: service-role client for admin-only identity lookups
/// - [`context`]: the resolved caller placed in request extensions
/// - [`authorization`]: tier-based access checks

pub mod admin;
pub mod authorization;
pub mod context;
pub mod jwt;
pub mod session;

pub use context::{AuthContext, AuthMethod};
