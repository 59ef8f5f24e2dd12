//! Domain logic shared by the commands.
//!
//! The reconciliation engine is split into pure stages, leaves first:
//! [`normalizer`] (titles and fingerprints), [`parser`] (agenda files),
//! [`matcher`], [`diff`] and [`guard`]. [`reconciler`] drives them against a
//! [`store::TaskStore`]. [`renderer`] is the opposite direction.

pub mod config;
pub mod data_storage;
pub mod dates;
pub mod diff;
pub mod error;
pub mod guard;
pub mod matcher;
pub mod messages;
pub mod normalizer;
pub mod parser;
pub mod reconciler;
pub mod renderer;
pub mod store;
pub mod task;
pub mod view;
