//! Interactive configuration setup.
//!
//! Asks for the agenda file, the database file and the render window, saves
//! `config.json` and creates (or migrates) the database.

use crate::{
    db::db::Db,
    libs::{config::Config, messages::Message},
    msg_info, msg_success,
};
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Remove the existing configuration instead of creating one
    #[arg(short, long)]
    delete: bool,
}

pub fn cmd(init_args: InitArgs) -> Result<()> {
    if init_args.delete {
        if Config::delete()? {
            msg_success!(Message::ConfigDeleted);
        } else {
            msg_info!(Message::ConfigNotFound);
        }
        return Ok(());
    }

    let config = Config::init()?;
    config.save()?;

    msg_success!(Message::ConfigSaved(Config::path()?.display().to_string()));

    let db_path = config.database_file()?;
    Db::open(&db_path)?;
    msg_info!(Message::DatabaseReady(db_path.display().to_string()));
    Ok(())
}
