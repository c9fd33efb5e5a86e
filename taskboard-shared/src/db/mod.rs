/// Database layer for Taskboard
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool with health checks
/// - `migrations`: schema migration runner
/// - `locks`: row locks taken by board writes, project first
/// - `ordering`: append-order assignment under a parent lock
///
/// Models and their queries live in the `models` module at crate root.

pub mod locks;
pub mod migrations;
pub mod ordering;
pub mod pool;
