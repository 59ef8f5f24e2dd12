use super::db::Db;
use crate::libs::error::StoreError;
use crate::libs::guard::{self, GuardOutcome};
use crate::libs::normalizer::Fingerprint;
use crate::libs::store::TaskStore;
use crate::libs::task::{SortField, Task, TaskFilter, TaskPatch, TaskStatus};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::Path;

const TASK_COLUMNS: &str = "id, title, body, due_dt, status, task_type, tags, source, created_at, updated_at";
const WHERE_LIVE: &str = "WHERE deleted_at IS NULL";
const ORDER_BY_DUE: &str = "ORDER BY due_dt IS NULL, due_dt, id";
const INSERT_TASK: &str = "INSERT INTO tasks (title, body, due_dt, status, task_type, tags, source) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";
const UPDATE_TASK: &str = "UPDATE tasks SET title = ?1, body = ?2, due_dt = ?3, status = ?4, task_type = ?5, tags = ?6, updated_at = datetime(CURRENT_TIMESTAMP, 'localtime') WHERE id = ?7 AND deleted_at IS NULL";
const SOFT_DELETE_TASK: &str = "UPDATE tasks SET deleted_at = datetime(CURRENT_TIMESTAMP, 'localtime') WHERE id = ?1 AND deleted_at IS NULL";

impl ToSql for TaskStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TaskStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

/// Result of [`Tasks::insert`].
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Created(Task),
    /// A live task already has the new task's fingerprint; nothing was written.
    Duplicate(Task),
}

fn task_from_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        body: row.get(2)?,
        due_dt: row.get(3)?,
        status: row.get(4)?,
        task_type: row.get(5)?,
        tags: row.get(6)?,
        source: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

/// Undated tasks stay last whichever way due dates are sorted.
fn order_by(sort: SortField, ascending: bool) -> String {
    let direction = if ascending { "ASC" } else { "DESC" };
    match sort {
        SortField::Id => format!("ORDER BY id {}", direction),
        SortField::DueDt => format!("ORDER BY due_dt IS NULL, due_dt {}, id", direction),
        SortField::Title => format!("ORDER BY lower(title) {}, id", direction),
        SortField::Status => format!("ORDER BY status {}, id", direction),
    }
}

fn store_error(err: rusqlite::Error) -> StoreError {
    match err {
        rusqlite::Error::FromSqlConversionFailure(..) | rusqlite::Error::InvalidColumnType(..) => {
            StoreError::Corrupt(err.to_string())
        }
        other => StoreError::Database(other),
    }
}

fn select_live(conn: &Connection) -> Result<Vec<Task>, StoreError> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM tasks {} {}", TASK_COLUMNS, WHERE_LIVE, ORDER_BY_DUE))?;
    let tasks = stmt
        .query_map([], task_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(store_error)?;
    Ok(tasks)
}

fn select_one(conn: &Connection, id: i32) -> Result<Task, StoreError> {
    conn.query_row(
        &format!("SELECT {} FROM tasks {} AND id = ?1", TASK_COLUMNS, WHERE_LIVE),
        params![id],
        task_from_row,
    )
    .optional()
    .map_err(store_error)?
    .ok_or(StoreError::NotFound(id))
}

fn write_task(conn: &Connection, id: i32, task: &Task) -> Result<(), StoreError> {
    let updated = conn.execute(
        UPDATE_TASK,
        params![task.title, task.body, task.due_dt, task.status, task.task_type, task.tags, id],
    )?;
    if updated == 0 {
        return Err(StoreError::NotFound(id));
    }
    Ok(())
}

pub struct Tasks {
    pub conn: Connection,
}

impl Tasks {
    pub fn new() -> anyhow::Result<Tasks> {
        Ok(Tasks { conn: Db::new()?.conn })
    }

    pub fn open(path: &Path) -> anyhow::Result<Tasks> {
        Ok(Tasks { conn: Db::open(path)?.conn })
    }

    pub fn from_db(db: Db) -> Tasks {
        Tasks { conn: db.conn }
    }

    /// Creates `task` unless a live task already has its fingerprint.
    /// `force` skips the duplicate check.
    pub fn insert(&mut self, task: &Task, force: bool) -> Result<InsertOutcome, StoreError> {
        let tx = self.conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !force {
            let fingerprint = Fingerprint::of_task(task);
            if let Some(existing) = select_live(&tx)?.into_iter().find(|t| Fingerprint::of_task(t) == fingerprint) {
                tracing::debug!(existing = ?existing.id, fingerprint = fingerprint.short(), "duplicate task refused");
                return Ok(InsertOutcome::Duplicate(existing));
            }
        }

        tx.execute(
            INSERT_TASK,
            params![task.title, task.body, task.due_dt, task.status, task.task_type, task.tags, task.source],
        )?;
        let id = i32::try_from(tx.last_insert_rowid()).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        let created = select_one(&tx, id)?;
        tx.commit()?;

        Ok(InsertOutcome::Created(created))
    }

    pub fn fetch(&mut self, filter: TaskFilter) -> Result<Vec<Task>, StoreError> {
        let tasks = match filter {
            TaskFilter::All => select_live(&self.conn)?,
            TaskFilter::Query(query) => {
                let mut sql = format!("SELECT {} FROM tasks {}", TASK_COLUMNS, WHERE_LIVE);
                let mut values: Vec<Box<dyn ToSql>> = Vec::new();
                if let Some(status) = query.status {
                    sql.push_str(" AND status = ?");
                    values.push(Box::new(status));
                }
                if let Some(before) = query.due_before {
                    sql.push_str(" AND (due_dt IS NULL OR due_dt < ?)");
                    values.push(Box::new(before));
                }
                if let Some(after) = query.due_after {
                    sql.push_str(" AND (due_dt IS NULL OR due_dt > ?)");
                    values.push(Box::new(after));
                }
                sql.push(' ');
                sql.push_str(&order_by(query.sort, query.is_ascending()));
                if let Some(limit) = query.limit {
                    sql.push_str(" LIMIT ?");
                    values.push(Box::new(i64::try_from(limit).unwrap_or(i64::MAX)));
                }

                let mut stmt = self.conn.prepare(&sql)?;
                let rows = stmt.query_map(params_from_iter(values.iter()), task_from_row)?;
                rows.collect::<rusqlite::Result<Vec<_>>>().map_err(store_error)?
            }
            TaskFilter::ByIds(ids) => {
                if ids.is_empty() {
                    return Ok(Vec::new());
                }
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {} FROM tasks {} AND id IN ({}) {}",
                    TASK_COLUMNS,
                    WHERE_LIVE,
                    vec!["?"; ids.len()].join(", "),
                    ORDER_BY_DUE
                ))?;
                let rows = stmt.query_map(params_from_iter(ids.iter()), task_from_row)?;
                rows.collect::<rusqlite::Result<Vec<_>>>().map_err(store_error)?
            }
        };

        Ok(tasks)
    }

    /// Unguarded write of the patched task. Used by the status commands;
    /// title or due changes go through [`TaskStore::apply_guarded`].
    pub fn update(&mut self, id: i32, patch: &TaskPatch) -> Result<Task, StoreError> {
        let tx = self.conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let next = patch.apply_to(&select_one(&tx, id)?);
        write_task(&tx, id, &next)?;
        let stored = select_one(&tx, id)?;
        tx.commit()?;
        Ok(stored)
    }

    /// Soft delete: the row stays but is invisible to every query here.
    pub fn delete(&mut self, id: i32) -> Result<(), StoreError> {
        let deleted = self.conn.execute(SOFT_DELETE_TASK, params![id])?;
        if deleted == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}

impl TaskStore for Tasks {
    fn snapshot(&self) -> Result<Vec<Task>, StoreError> {
        select_live(&self.conn)
    }

    fn get(&self, id: i32) -> Result<Task, StoreError> {
        select_one(&self.conn, id)
    }

    fn apply_guarded(&mut self, id: i32, patch: &TaskPatch) -> Result<GuardOutcome, StoreError> {
        let tx = self.conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current = select_one(&tx, id)?;

        if patch.changes_identity() {
            let live = select_live(&tx)?;
            if let Some(other_id) = guard::check(&current, patch, &live) {
                return Ok(GuardOutcome::Collision { other_id });
            }
        }

        write_task(&tx, id, &patch.apply_to(&current))?;
        let stored = select_one(&tx, id)?;
        tx.commit()?;

        Ok(GuardOutcome::Applied { task: stored })
    }
}
