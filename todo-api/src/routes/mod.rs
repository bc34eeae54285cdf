/// Route handlers
///
/// Organized by resource:
///
/// - `tasks`: task list, detail and form pages
/// - `auth`: login, logout and registration
/// - `health`: health check endpoint

pub mod auth;
pub mod health;
pub mod tasks;
