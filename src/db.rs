use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::types::Type;
use rusqlite::{params, Connection, Result, Row, ToSql};
use time::Date;

use crate::config::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::dates::{date_key, now_unix, parse_date};
use crate::error::AppError;
use crate::models::{NewTask, RecurrenceScope, Task, TaskPage, TaskQuery, UpdateTask};

pub type DbPool = Arc<Mutex<Connection>>;

const TASK_COLUMNS: &str = "id, title, description, category, priority, date, status, is_daily, \
     recurrence_group_id, estimated_time, created_at, updated_at";

pub fn init_db(path: &Path) -> Result<DbPool> {
    let conn = Connection::open(path)?;
    init_schema(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

pub fn open_in_memory() -> Result<DbPool> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS tasks (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT,
            category TEXT,
            priority TEXT,
            date TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            is_daily INTEGER NOT NULL DEFAULT 0,
            recurrence_group_id TEXT,
            estimated_time INTEGER,
            created_at INTEGER DEFAULT (strftime('%s', 'now')),
            updated_at INTEGER DEFAULT (strftime('%s', 'now'))
        );
        ",
    )?;

    // Migration: databases created before recurrence groups existed
    for (column, definition) in [
        ("recurrence_group_id", "TEXT"),
        ("estimated_time", "INTEGER"),
    ] {
        let has_column = conn
            .prepare(&format!("SELECT {column} FROM tasks LIMIT 1"))
            .is_ok();
        if !has_column {
            conn.execute(
                &format!("ALTER TABLE tasks ADD COLUMN {column} {definition}"),
                [],
            )?;
        }
    }

    conn.execute_batch(
        "
        CREATE INDEX IF NOT EXISTS idx_tasks_date ON tasks (date);
        CREATE INDEX IF NOT EXISTS idx_tasks_title ON tasks (title);
        CREATE INDEX IF NOT EXISTS idx_tasks_recurrence_group ON tasks (recurrence_group_id);
        ",
    )?;

    Ok(())
}

fn task_from_row(row: &Row<'_>) -> Result<Task> {
    let raw_date: String = row.get(5)?;
    let date = parse_date(&raw_date)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;

    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        category: row.get(3)?,
        priority: row.get(4)?,
        date,
        status: row.get(6)?,
        is_daily: row.get::<_, i32>(7)? != 0,
        recurrence_group_id: row.get(8)?,
        estimated_time: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

pub fn insert_tasks(pool: &DbPool, tasks: &[NewTask]) -> Result<Vec<Task>, AppError> {
    let mut conn = pool.lock()?;
    let tx = conn.transaction()?;
    let now = now_unix();

    let mut ids = Vec::with_capacity(tasks.len());
    {
        let mut stmt = tx.prepare(
            "INSERT INTO tasks (title, description, category, priority, date, status, is_daily,
                recurrence_group_id, estimated_time, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
        )?;
        for task in tasks {
            stmt.execute(params![
                task.title,
                task.description,
                task.category,
                task.priority,
                date_key(task.date),
                task.status,
                task.is_daily,
                task.recurrence_group_id,
                task.estimated_time,
                now,
            ])?;
            ids.push(tx.last_insert_rowid());
        }
    }

    let mut created = Vec::with_capacity(ids.len());
    {
        let mut stmt = tx.prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"))?;
        for id in ids {
            created.push(stmt.query_row([id], task_from_row)?);
        }
    }

    tx.commit()?;
    Ok(created)
}

pub fn list_tasks(pool: &DbPool, query: &TaskQuery) -> Result<TaskPage, AppError> {
    let conn = pool.lock()?;

    let mut filters = Vec::new();
    let mut params: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(start) = query.start_date {
        filters.push("date >= ?");
        params.push(Box::new(date_key(start)));
    }
    if let Some(end) = query.end_date {
        filters.push("date <= ?");
        params.push(Box::new(date_key(end)));
    }
    if let Some(status) = query.status {
        filters.push("status = ?");
        params.push(Box::new(status));
    }

    let where_clause = if filters.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", filters.join(" AND "))
    };

    let params_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM tasks {where_clause}"),
        params_refs.as_slice(),
        |row| row.get(0),
    )?;

    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let page = query.page.unwrap_or(1).max(1);
    let limit_param = i64::from(limit);
    let offset = i64::from(page - 1) * limit_param;

    let mut page_params = params_refs;
    page_params.push(&limit_param);
    page_params.push(&offset);

    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks {where_clause} ORDER BY date ASC, id ASC LIMIT ? OFFSET ?"
    ))?;
    let tasks = stmt
        .query_map(page_params.as_slice(), task_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TaskPage {
        tasks,
        total,
        page,
        limit,
    })
}

pub fn tasks_between(pool: &DbPool, start: Date, end: Date) -> Result<Vec<Task>, AppError> {
    let conn = pool.lock()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE date >= ?1 AND date < ?2 ORDER BY date ASC, id ASC"
    ))?;
    let tasks = stmt
        .query_map([date_key(start), date_key(end)], task_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tasks)
}

pub fn get_task(pool: &DbPool, id: i64) -> Result<Option<Task>, AppError> {
    let conn = pool.lock()?;
    get_task_internal(&conn, id)
}

fn get_task_internal(conn: &Connection, id: i64) -> Result<Option<Task>, AppError> {
    let mut stmt = conn.prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"))?;
    let mut rows = stmt.query([id])?;

    if let Some(row) = rows.next()? {
        Ok(Some(task_from_row(row)?))
    } else {
        Ok(None)
    }
}

fn update_assignments(update: &UpdateTask) -> (Vec<&'static str>, Vec<Box<dyn ToSql>>) {
    let mut updates = Vec::new();
    let mut params: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(ref t) = update.title {
        updates.push("title = ?");
        params.push(Box::new(t.clone()));
    }
    if let Some(ref d) = update.description {
        updates.push("description = ?");
        params.push(Box::new(d.clone()));
    }
    if let Some(ref c) = update.category {
        updates.push("category = ?");
        params.push(Box::new(c.clone()));
    }
    if let Some(ref p) = update.priority {
        updates.push("priority = ?");
        params.push(Box::new(p.clone()));
    }
    if let Some(date) = update.date {
        updates.push("date = ?");
        params.push(Box::new(date_key(date)));
    }
    if let Some(status) = update.status {
        updates.push("status = ?");
        params.push(Box::new(status));
    }
    if let Some(minutes) = update.estimated_time {
        updates.push("estimated_time = ?");
        params.push(Box::new(minutes));
    }

    if !updates.is_empty() {
        updates.push("updated_at = strftime('%s', 'now')");
    }
    (updates, params)
}

pub fn update_task(pool: &DbPool, id: i64, update: &UpdateTask) -> Result<Option<Task>, AppError> {
    let conn = pool.lock()?;

    let (updates, mut params) = update_assignments(update);
    if updates.is_empty() {
        return get_task_internal(&conn, id);
    }
    params.push(Box::new(id));

    let query = format!("UPDATE tasks SET {} WHERE id = ?", updates.join(", "));
    let params_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
    conn.execute(&query, params_refs.as_slice())?;

    get_task_internal(&conn, id)
}

pub fn toggle_task(pool: &DbPool, id: i64) -> Result<Option<Task>, AppError> {
    let conn = pool.lock()?;
    conn.execute(
        "UPDATE tasks SET
            status = CASE status WHEN 'completed' THEN 'pending' ELSE 'completed' END,
            updated_at = strftime('%s', 'now')
         WHERE id = ?1",
        [id],
    )?;
    get_task_internal(&conn, id)
}

pub fn delete_task(pool: &DbPool, id: i64) -> Result<bool, AppError> {
    let conn = pool.lock()?;
    let rows = conn.execute("DELETE FROM tasks WHERE id = ?1", [id])?;
    Ok(rows > 0)
}

fn series_filter(task: &Task, scope: RecurrenceScope) -> (&'static str, String) {
    match (scope, &task.recurrence_group_id) {
        (RecurrenceScope::Title, _) => ("title = ?", task.title.clone()),
        (RecurrenceScope::Group, Some(group)) => ("recurrence_group_id = ?", group.clone()),
        (RecurrenceScope::Group, None) => {
            ("recurrence_group_id IS NULL AND title = ?", task.title.clone())
        }
    }
}

pub fn update_series(
    pool: &DbPool,
    id: i64,
    scope: RecurrenceScope,
    update: &UpdateTask,
) -> Result<usize, AppError> {
    let (updates, mut params) = update_assignments(update);
    if updates.is_empty() {
        return Err(AppError::BadRequest("Nothing to update"));
    }

    let mut conn = pool.lock()?;
    let tx = conn.transaction()?;

    let Some(anchor) = get_task_internal(&tx, id)? else {
        return Ok(0);
    };
    let (filter, key) = series_filter(&anchor, scope);

    params.push(Box::new(key));
    let query = format!("UPDATE tasks SET {} WHERE {filter}", updates.join(", "));
    let params_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let rows = tx.execute(&query, params_refs.as_slice())?;

    tx.commit()?;
    Ok(rows)
}

pub fn delete_series(pool: &DbPool, id: i64, scope: RecurrenceScope) -> Result<usize, AppError> {
    let mut conn = pool.lock()?;
    let tx = conn.transaction()?;

    let Some(anchor) = get_task_internal(&tx, id)? else {
        return Ok(0);
    };
    let (filter, key) = series_filter(&anchor, scope);
    let rows = tx.execute(&format!("DELETE FROM tasks WHERE {filter}"), [&key])?;

    tx.commit()?;
    Ok(rows)
}
