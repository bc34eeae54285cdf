/// Middleware modules for the API server
///
/// - `security`: security response headers
/// - `session`: session resolution and the login redirect for protected pages

pub mod security;
pub mod session;
