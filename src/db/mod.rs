//! SQLite persistence.
//!
//! - [`db`]: connection management; every open runs pending migrations
//! - [`migrations`]: versioned schema changes
//! - [`tasks`]: task CRUD and the [`crate::libs::store::TaskStore`]
//!   implementation used by reconciliation
//!
//! ```rust,no_run
//! use agenda::db::tasks::Tasks;
//! use agenda::libs::task::{Task, TaskFilter};
//!
//! let mut tasks = Tasks::new()?;
//! tasks.insert(&Task::new("Review code", None), false)?;
//! let all = tasks.fetch(TaskFilter::All)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod db;
pub mod migrations;
pub mod tasks;
