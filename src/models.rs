use std::collections::BTreeMap;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::dates::{serde_date, serde_date_option};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "completed" => Ok(TaskStatus::Completed),
            other => Err(format!("unknown task status {other:?}")),
        }
    }
}

impl ToSql for TaskStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TaskStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    #[serde(with = "serde_date")]
    pub date: Date,
    pub status: TaskStatus,
    pub is_daily: bool,
    pub recurrence_group_id: Option<String>,
    /// Minutes.
    pub estimated_time: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A task row that has not been inserted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub date: Date,
    pub status: TaskStatus,
    pub is_daily: bool,
    pub recurrence_group_id: Option<String>,
    pub estimated_time: Option<i64>,
}

/// Fields copied verbatim onto every generated instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskTemplate {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub estimated_time: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    #[serde(default, with = "serde_date_option")]
    pub date: Option<Date>,
    #[serde(default)]
    pub is_daily: bool,
    pub duration_months: Option<u32>,
    pub estimated_time: Option<i64>,
}

impl CreateTask {
    pub fn template(&self) -> TaskTemplate {
        TaskTemplate {
            title: self.title.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            priority: self.priority.clone(),
            estimated_time: self.estimated_time,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    #[serde(default, with = "serde_date_option")]
    pub date: Option<Date>,
    pub status: Option<TaskStatus>,
    pub estimated_time: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQuery {
    #[serde(default, with = "serde_date_option")]
    pub start_date: Option<Date>,
    #[serde(default, with = "serde_date_option")]
    pub end_date: Option<Date>,
    pub status: Option<TaskStatus>,
    pub limit: Option<u32>,
    pub page: Option<u32>,
}

/// Which rows count as "all recurring instances" of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceScope {
    /// Every row with the same exact title.
    #[default]
    Title,
    /// Only rows from the same daily submission. Ungrouped rows fall back to
    /// ungrouped rows with the same title.
    Group,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScope {
    #[serde(default)]
    pub update_all_recurring: bool,
    #[serde(default)]
    pub recurrence_scope: RecurrenceScope,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteScope {
    #[serde(default)]
    pub delete_all_recurring: bool,
    #[serde(default)]
    pub recurrence_scope: RecurrenceScope,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckbookQuery {
    #[serde(default, with = "serde_date_option")]
    pub week_start: Option<Date>,
    pub weeks_count: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedTasks {
    pub count: usize,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskPage {
    pub tasks: Vec<Task>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkResult {
    pub count: usize,
}

/// One column header of the checkbook grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayDescriptor {
    pub date: String,
    pub date_key: String,
    pub day_name: String,
    pub full_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckbookRow {
    pub description: Option<String>,
    pub days: BTreeMap<String, Option<Task>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckbookView {
    #[serde(with = "serde_date")]
    pub week_start: Date,
    #[serde(with = "serde_date")]
    pub week_end: Date,
    pub days: Vec<DayDescriptor>,
    pub tasks: BTreeMap<String, CheckbookRow>,
}
