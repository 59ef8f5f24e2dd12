use crate::{
    db::tasks::{InsertOutcome, Tasks},
    libs::{
        dates::resolve_date,
        error::StoreError,
        guard::GuardOutcome,
        messages::Message,
        store::TaskStore,
        task::{SortField, Task, TaskFilter, TaskPatch, TaskQuery, TaskStatus},
        view::View,
    },
    msg_error, msg_error_anyhow, msg_info, msg_print, msg_success, msg_warning,
};
use anyhow::Result;
use chrono::{Local, NaiveDateTime};
use clap::{Args, Subcommand};
use dialoguer::{theme::ColorfulTheme, Confirm};

#[derive(Debug, Args)]
pub struct TaskArgs {
    #[command(subcommand)]
    command: TaskCommand,
}

#[derive(Debug, Subcommand)]
enum TaskCommand {
    /// Create a task
    Add {
        title: String,
        /// Due date, e.g. "2024-06-01 10:30", "tomorrow", "fri 09:00"
        #[arg(short, long)]
        due: Option<String>,
        /// Task type, rendered as the first tag
        #[arg(short = 't', long = "type")]
        task_type: Option<String>,
        /// Comma separated tags
        #[arg(long)]
        tags: Option<String>,
        #[arg(short, long)]
        body: Option<String>,
        /// Create even if a task with the same title and due date exists
        #[arg(long)]
        force: bool,
    },
    /// List tasks
    List {
        #[arg(short, long)]
        status: Option<TaskStatus>,
        /// Only tasks due before this date; undated tasks are kept
        #[arg(long)]
        before: Option<String>,
        /// Only tasks due after this date; undated tasks are kept
        #[arg(long)]
        after: Option<String>,
        /// Maximum number of tasks to show
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
        #[arg(long, value_enum, default_value_t = SortField::DueDt)]
        sort: SortField,
        /// Sort ascending (default for every field except id)
        #[arg(long, conflicts_with = "desc")]
        asc: bool,
        /// Sort descending (default for id)
        #[arg(long)]
        desc: bool,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show one task
    Show { id: i32 },
    /// Change task fields
    Update {
        id: i32,
        #[arg(long)]
        title: Option<String>,
        /// New due date, or "none" to clear it
        #[arg(short, long)]
        due: Option<String>,
        #[arg(short, long)]
        status: Option<TaskStatus>,
        #[arg(short = 't', long = "type")]
        task_type: Option<String>,
        #[arg(long)]
        tags: Option<String>,
        #[arg(short, long)]
        body: Option<String>,
    },
    /// Mark tasks as done
    Done {
        #[arg(required = true)]
        ids: Vec<i32>,
    },
    /// Mark tasks as cancelled
    Cancel {
        #[arg(required = true)]
        ids: Vec<i32>,
    },
    /// Reopen tasks
    Todo {
        #[arg(required = true)]
        ids: Vec<i32>,
    },
    /// Delete tasks
    Delete {
        #[arg(required = true)]
        ids: Vec<i32>,
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

pub async fn cmd(args: TaskArgs) -> Result<()> {
    let mut tasks = Tasks::new()?;
    match args.command {
        TaskCommand::Add {
            title,
            due,
            task_type,
            tags,
            body,
            force,
        } => handle_add(&mut tasks, title, due, task_type, tags, body, force),
        TaskCommand::List {
            status,
            before,
            after,
            limit,
            sort,
            asc,
            desc,
            json,
        } => {
            let query = TaskQuery {
                status,
                due_before: before.as_deref().map(parse_due).transpose()?.flatten(),
                due_after: after.as_deref().map(parse_due).transpose()?.flatten(),
                sort,
                ascending: match (asc, desc) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
                limit: Some(limit),
            };
            handle_list(&mut tasks, query, json)
        }
        TaskCommand::Show { id } => handle_show(&tasks, id),
        TaskCommand::Update {
            id,
            title,
            due,
            status,
            task_type,
            tags,
            body,
        } => {
            let patch = TaskPatch {
                title,
                due_dt: due.as_deref().map(parse_due).transpose()?,
                status,
                body: body.map(non_empty),
                task_type: task_type.map(non_empty),
                tags: tags.map(non_empty),
            };
            handle_update(&mut tasks, id, patch)
        }
        TaskCommand::Done { ids } => handle_status(&mut tasks, ids, TaskStatus::Done),
        TaskCommand::Cancel { ids } => handle_status(&mut tasks, ids, TaskStatus::Cancelled),
        TaskCommand::Todo { ids } => handle_status(&mut tasks, ids, TaskStatus::Todo),
        TaskCommand::Delete { ids, yes } => handle_delete(&mut tasks, ids, yes),
    }
}

fn parse_due(text: &str) -> Result<Option<NaiveDateTime>> {
    resolve_date(text, Local::now().date_naive()).map_err(|_| msg_error_anyhow!(Message::InvalidDate(text.to_string())))
}

/// Empty strings clear optional text fields.
fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn handle_add(
    tasks: &mut Tasks,
    title: String,
    due: Option<String>,
    task_type: Option<String>,
    tags: Option<String>,
    body: Option<String>,
    force: bool,
) -> Result<()> {
    let due_dt = match due.as_deref() {
        Some(text) => parse_due(text)?,
        None => None,
    };

    let mut task = Task::new(title.trim(), due_dt).with_source("cli");
    task.task_type = task_type.and_then(non_empty);
    task.tags = tags.and_then(non_empty);
    task.body = body.and_then(non_empty);

    match tasks.insert(&task, force)? {
        InsertOutcome::Created(created) => {
            msg_success!(Message::TaskCreated(created.id.unwrap_or_default(), created.title));
        }
        InsertOutcome::Duplicate(existing) => {
            msg_warning!(Message::TaskDuplicate(existing.id.unwrap_or_default(), existing.title));
            msg_info!(Message::TaskDuplicateHint);
        }
    }
    Ok(())
}

fn handle_list(tasks: &mut Tasks, query: TaskQuery, json: bool) -> Result<()> {
    let list = tasks.fetch(TaskFilter::Query(query))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }
    if list.is_empty() {
        msg_info!(Message::TasksNotFound);
        return Ok(());
    }

    msg_print!(Message::TasksHeader, true);
    View::tasks(&list)
}

fn handle_show(tasks: &Tasks, id: i32) -> Result<()> {
    match tasks.get(id) {
        Ok(task) => {
            msg_print!(Message::TaskHeader(id), true);
            View::task(&task)
        }
        Err(StoreError::NotFound(_)) => {
            msg_error!(Message::TaskNotFound(id));
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn handle_update(tasks: &mut Tasks, id: i32, patch: TaskPatch) -> Result<()> {
    if patch.is_empty() {
        msg_info!(Message::NoChangesDetected);
        return Ok(());
    }

    match tasks.apply_guarded(id, &patch) {
        Ok(GuardOutcome::Applied { task }) => {
            msg_success!(Message::TaskUpdated(id));
            View::task(&task)?;
        }
        Ok(GuardOutcome::Collision { other_id }) => msg_error!(Message::TaskWouldDuplicate(id, other_id)),
        Err(StoreError::NotFound(_)) => msg_error!(Message::TaskNotFound(id)),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn handle_status(tasks: &mut Tasks, ids: Vec<i32>, status: TaskStatus) -> Result<()> {
    let patch = TaskPatch {
        status: Some(status),
        ..Default::default()
    };

    for id in ids {
        match tasks.update(id, &patch) {
            Ok(task) => msg_success!(Message::TaskStatusChanged(id, task.status.to_string())),
            Err(StoreError::NotFound(_)) => msg_error!(Message::TaskNotFound(id)),
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn handle_delete(tasks: &mut Tasks, ids: Vec<i32>, yes: bool) -> Result<()> {
    let found = tasks.fetch(TaskFilter::ByIds(ids.clone()))?;
    for id in ids.iter().filter(|id| !found.iter().any(|t| t.id == Some(**id))) {
        msg_error!(Message::TaskNotFound(*id));
    }
    if found.is_empty() {
        return Ok(());
    }

    msg_print!(Message::TasksToBeDeleted, true);
    View::tasks(&found)?;

    let confirmed = yes
        || Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::ConfirmDeleteTasks(found.len()).to_string())
            .default(false)
            .interact()?;
    if !confirmed {
        msg_info!(Message::OperationCancelled);
        return Ok(());
    }

    for task in found {
        let id = task.id.unwrap_or_default();
        tasks.delete(id)?;
        msg_success!(Message::TaskDeleted(id));
    }
    Ok(())
}
