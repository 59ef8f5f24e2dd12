use crate::{
    db::tasks::Tasks,
    libs::{
        config::Config,
        dates::resolve_date,
        messages::Message,
        renderer::{group_by_date, render_agenda, render_window},
        store::TaskStore,
    },
    msg_error_anyhow, msg_info, msg_success,
};
use anyhow::Result;
use chrono::Local;
use clap::Args;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Output file; defaults to the configured agenda file
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Reference date for D-day annotations and the render window
    #[arg(long)]
    today: Option<String>,
    /// Render every dated task, ignoring the configured window
    #[arg(long)]
    all: bool,
}

pub async fn cmd(args: RenderArgs) -> Result<()> {
    let config = Config::read()?;

    let today = match args.today.as_deref() {
        Some(text) => resolve_date(text, Local::now().date_naive())
            .ok()
            .flatten()
            .map(|dt| dt.date())
            .ok_or_else(|| msg_error_anyhow!(Message::InvalidDate(text.to_string())))?,
        None => Local::now().date_naive(),
    };

    let tasks = Tasks::open(&config.database_file()?)?.snapshot()?;
    let text = if args.all {
        render_agenda(&tasks, today)
    } else {
        render_window(&tasks, today, config.render.days_back, config.render.days_ahead)
    };

    if text.is_empty() {
        msg_info!(Message::NoTasksToRender);
    }

    let output = match args.output {
        Some(path) => path,
        None => config.agenda_file()?,
    };
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&output, &text)?;

    let count: usize = group_by_date(&tasks)
        .into_iter()
        .filter(|(date, _)| text.contains(&date.format("## %Y-%m-%d").to_string()))
        .map(|(_, day)| day.len())
        .sum();
    msg_success!(Message::AgendaRendered(output.display().to_string(), count));
    Ok(())
}
