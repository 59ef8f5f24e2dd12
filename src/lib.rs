//! # Agenda - Markdown and database task reconciliation
//!
//! Tasks live in SQLite. `agenda render` writes them to a Markdown agenda
//! grouped by date, the user edits that file by hand, and `agenda sync`
//! folds the edits back into the database.
//!
//! ## Features
//!
//! - **Parsing**: Date sections, checkbox lines, times, tags and `^task-<id>` anchors
//! - **Matching**: Fingerprints over normalized title and due date, with fallbacks
//! - **Dry runs**: A deterministic report of every change before anything is written
//! - **Collision guard**: Edits that would make two live tasks identical are skipped
//!
//! ## Usage
//!
//! ```rust,no_run
//! use agenda::commands::Cli;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Cli::menu().await
//! }
//! ```

pub mod commands;
pub mod db;
pub mod libs;
