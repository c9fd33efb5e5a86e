/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `projects`: Projects, their members and activity
/// - `lists`: Lists within a project
/// - `tasks`: Tasks with their subtasks and comments
/// - `users`: User accounts
/// - `notifications`: A user's notification inbox

pub mod health;
pub mod lists;
pub mod notifications;
pub mod projects;
pub mod tasks;
pub mod users;
