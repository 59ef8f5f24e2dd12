use super::migrations::init_with_migrations;
use crate::libs::config::Config;
use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;

pub struct Db {
    pub conn: Connection,
}

impl Db {
    /// Opens the configured database and brings its schema up to date.
    pub fn new() -> Result<Db> {
        let path = Config::read()?.database_file()?;
        Self::open(&path)
    }

    pub fn open(path: &Path) -> Result<Db> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut conn = Connection::open(path)?;
        init_with_migrations(&mut conn)?;
        tracing::debug!(path = %path.display(), "database opened");

        Ok(Db { conn })
    }

    pub fn open_in_memory() -> Result<Db> {
        let mut conn = Connection::open_in_memory()?;
        init_with_migrations(&mut conn)?;
        Ok(Db { conn })
    }

    /// Raw connection to the configured database, schema untouched.
    pub fn new_without_migrations() -> Result<Connection> {
        let path = Config::read()?.database_file()?;
        Ok(Connection::open(path)?)
    }
}
