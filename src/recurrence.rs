use rand::Rng;
use time::Date;

use crate::config::{DAYS_PER_MONTH, MAX_DURATION_MONTHS};
use crate::dates::add_days;
use crate::error::AppError;
use crate::models::{NewTask, TaskStatus, TaskTemplate};

pub fn generate_group_id() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..32)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

pub fn total_days(duration_months: u32) -> i64 {
    DAYS_PER_MONTH * i64::from(duration_months)
}

/// Builds `30 × duration_months` consecutive daily instances starting at
/// `start_date`, all sharing one fresh recurrence group.
pub fn generate(
    template: &TaskTemplate,
    start_date: Date,
    duration_months: u32,
) -> Result<Vec<NewTask>, AppError> {
    validate_title(template)?;
    if duration_months == 0 {
        return Err(AppError::BadRequest("Duration must be at least one month"));
    }
    if duration_months > MAX_DURATION_MONTHS {
        return Err(AppError::BadRequest("Duration is too long"));
    }

    let days = total_days(duration_months);
    add_days(start_date, days - 1)
        .ok_or(AppError::BadRequest("Recurring series runs past the last supported date"))?;

    let group_id = generate_group_id();
    (0..days)
        .map(|offset| {
            let date = add_days(start_date, offset)
                .ok_or(AppError::BadRequest("Recurring series runs past the last supported date"))?;
            Ok(instance(template, date, true, Some(group_id.clone())))
        })
        .collect()
}

pub fn single(template: &TaskTemplate, date: Date) -> Result<NewTask, AppError> {
    validate_title(template)?;
    Ok(instance(template, date, false, None))
}

fn validate_title(template: &TaskTemplate) -> Result<(), AppError> {
    if template.title.trim().is_empty() {
        return Err(AppError::BadRequest("Title cannot be empty"));
    }
    Ok(())
}

fn instance(
    template: &TaskTemplate,
    date: Date,
    is_daily: bool,
    recurrence_group_id: Option<String>,
) -> NewTask {
    NewTask {
        title: template.title.clone(),
        description: template.description.clone(),
        category: template.category.clone(),
        priority: template.priority.clone(),
        date,
        status: TaskStatus::Pending,
        is_daily,
        recurrence_group_id,
        estimated_time: template.estimated_time,
    }
}
