use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::{http::StatusCode, Json};
use tracing::info;

use crate::checkbook;
use crate::config::DEFAULT_WEEKS_COUNT;
use crate::dates::{date_key, today};
use crate::db::{
    delete_series, delete_task, get_task, insert_tasks, list_tasks, tasks_between, toggle_task,
    update_series, update_task,
};
use crate::error::AppError;
use crate::models::{
    BulkResult, CheckbookQuery, CheckbookView, CreateTask, CreatedTasks, DeleteScope, Task,
    TaskPage, TaskQuery, UpdateScope, UpdateTask,
};
use crate::recurrence;
use crate::AppState;

pub async fn list_all_tasks(
    State(state): State<AppState>,
    Query(query): Query<TaskQuery>,
) -> Result<Json<TaskPage>, AppError> {
    let page = list_tasks(&state.db, &query)?;
    info!(count = page.tasks.len(), total = page.total, page = page.page, "Listed tasks");
    Ok(Json(page))
}

pub async fn create_new_tasks(
    State(state): State<AppState>,
    Json(req): Json<CreateTask>,
) -> Result<(StatusCode, Json<CreatedTasks>), AppError> {
    if req.title.trim().is_empty() {
        return Err(AppError::BadRequest("Title cannot be empty"));
    }
    let date = req.date.ok_or(AppError::BadRequest("Date is required"))?;

    let template = req.template();
    let new_tasks = if req.is_daily {
        let months = req
            .duration_months
            .ok_or(AppError::BadRequest("Duration in months is required for daily tasks"))?;
        recurrence::generate(&template, date, months)?
    } else {
        vec![recurrence::single(&template, date)?]
    };

    let tasks = insert_tasks(&state.db, &new_tasks)?;
    info!(
        count = tasks.len(),
        title = %template.title,
        is_daily = req.is_daily,
        start = %date_key(date),
        "Created tasks"
    );
    Ok((
        StatusCode::CREATED,
        Json(CreatedTasks {
            count: tasks.len(),
            tasks,
        }),
    ))
}

pub async fn get_single_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Task>, AppError> {
    match get_task(&state.db, id)? {
        Some(task) => Ok(Json(task)),
        None => Err(AppError::NotFound),
    }
}

pub async fn update_existing_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(scope): Query<UpdateScope>,
    Json(req): Json<UpdateTask>,
) -> Result<Response, AppError> {
    if let Some(ref title) = req.title {
        if title.trim().is_empty() {
            return Err(AppError::BadRequest("Title cannot be empty"));
        }
    }

    if scope.update_all_recurring {
        if req.date.is_some() {
            return Err(AppError::BadRequest(
                "Date cannot be changed for all recurring instances",
            ));
        }
        let count = update_series(&state.db, id, scope.recurrence_scope, &req)?;
        if count == 0 {
            return Err(AppError::NotFound);
        }
        info!(id, count, scope = ?scope.recurrence_scope, "Updated recurring tasks");
        return Ok(Json(BulkResult { count }).into_response());
    }

    match update_task(&state.db, id, &req)? {
        Some(task) => {
            info!(id = task.id, status = task.status.as_str(), "Updated task");
            Ok(Json(task).into_response())
        }
        None => Err(AppError::NotFound),
    }
}

pub async fn toggle_existing_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Task>, AppError> {
    match toggle_task(&state.db, id)? {
        Some(task) => {
            info!(id = task.id, status = task.status.as_str(), "Toggled task");
            Ok(Json(task))
        }
        None => Err(AppError::NotFound),
    }
}

pub async fn delete_existing_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(scope): Query<DeleteScope>,
) -> Result<Response, AppError> {
    if scope.delete_all_recurring {
        let count = delete_series(&state.db, id, scope.recurrence_scope)?;
        if count == 0 {
            return Err(AppError::NotFound);
        }
        info!(id, count, scope = ?scope.recurrence_scope, "Deleted recurring tasks");
        return Ok((StatusCode::OK, Json(BulkResult { count })).into_response());
    }

    if delete_task(&state.db, id)? {
        info!(id, "Deleted task");
        Ok(StatusCode::NO_CONTENT.into_response())
    } else {
        Err(AppError::NotFound)
    }
}

pub async fn weekly_checkbook(
    State(state): State<AppState>,
    Query(query): Query<CheckbookQuery>,
) -> Result<Json<CheckbookView>, AppError> {
    let from = query.week_start.unwrap_or_else(today);
    let weeks_count = query.weeks_count.unwrap_or(DEFAULT_WEEKS_COUNT);

    let (start, end) = checkbook::window(from, weeks_count)?;
    let tasks = tasks_between(&state.db, start, end)?;
    let view = checkbook::aggregate(from, weeks_count, &tasks)?;

    info!(
        week_start = %date_key(view.week_start),
        weeks_count,
        titles = view.tasks.len(),
        "Built weekly checkbook"
    );
    Ok(Json(view))
}
