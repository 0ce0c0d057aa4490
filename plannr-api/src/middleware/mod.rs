/// Middleware modules for the API server
///
/// - `session_gate`: cookie session refresh and page redirects
/// - `security`: security response headers

pub mod security;
pub mod session_gate;
