/// API route handlers
///
/// Organized by resource:
///
/// - `health`: liveness and database status
/// - `tasks`: planner tasks
/// - `profile`: profile settings and social links
/// - `competitors`: tracked competitor feeds
/// - `credits`: monthly AI credits, including the SSE stream
/// - `admin`: elevated user lookup

pub mod admin;
pub mod competitors;
pub mod credits;
pub mod health;
pub mod profile;
pub mod tasks;
