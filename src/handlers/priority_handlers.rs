// MindGarden/backend/src/handlers/priority_handlers.rs
use crate::db::{Table, Trackers};
use crate::error_handler::ServiceError;
use crate::handlers::csv_download;
use crate::models::{entries, find_entry, CreateTaskPayload, TaskEntry, TaskStatus, TrackedRecord};
use crate::schema::priorities;
use actix_web::{get, post, put, web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

pub const EXPORT_FILE_NAME: &str = "priorities.csv";

// Query parameters for filtering the task list
#[derive(Deserialize, Debug)]
pub struct TaskQueryParams {
    pub status: Option<TaskStatus>,
}

pub async fn add_task(
    trackers: &Trackers,
    payload: CreateTaskPayload,
) -> Result<(TaskEntry, Table), ServiceError> {
    let entry = TaskEntry::from(payload);
    let record = entry.to_record();

    let table = trackers
        .priorities
        .mutate(move |table| table.append(record))
        .await?;

    log::info!(
        "Added task {} ({}, urgency {}, importance {})",
        entry.id(),
        entry.task,
        entry.urgency,
        entry.importance
    );
    Ok((entry, table))
}

/// Status only moves pending -> done; completing a done task changes nothing.
pub async fn complete_task(
    trackers: &Trackers,
    task_id: Uuid,
) -> Result<(TaskEntry, Table), ServiceError> {
    let table = trackers
        .priorities
        .mutate(move |table| {
            let current: TaskEntry = find_entry(&table, task_id)?;
            if current.status == TaskStatus::Done {
                return Ok(table);
            }
            table.update_field(
                &task_id.to_string(),
                priorities::STATUS,
                TaskStatus::Done.label(),
            )
        })
        .await?;

    let entry: TaskEntry = find_entry(&table, task_id)?;
    log::info!("Task {} marked {}", task_id, entry.status);
    Ok((entry, table))
}

#[post("")]
pub async fn create_task_handler(
    trackers: web::Data<Trackers>,
    payload: web::Json<CreateTaskPayload>,
) -> Result<HttpResponse, ServiceError> {
    let (entry, _) = add_task(&trackers, payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(entry))
}

#[get("")]
pub async fn list_tasks_handler(
    trackers: web::Data<Trackers>,
    query: web::Query<TaskQueryParams>,
) -> Result<HttpResponse, ServiceError> {
    let table = trackers.priorities.read().await?;
    let mut items: Vec<TaskEntry> = entries(&table);

    if let Some(wanted) = query.status {
        items.retain(|task| task.status == wanted);
    }

    Ok(HttpResponse::Ok().json(items))
}

#[get("/export")]
pub async fn export_tasks_handler(
    trackers: web::Data<Trackers>,
) -> Result<HttpResponse, ServiceError> {
    let table = trackers.priorities.read().await?;
    csv_download(&table, EXPORT_FILE_NAME)
}

#[get("/{task_id_path}")]
pub async fn get_task_handler(
    trackers: web::Data<Trackers>,
    task_id_path: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let table = trackers.priorities.read().await?;
    let entry: TaskEntry = find_entry(&table, task_id_path.into_inner())?;
    Ok(HttpResponse::Ok().json(entry))
}

#[put("/{task_id_path}/complete")]
pub async fn complete_task_handler(
    trackers: web::Data<Trackers>,
    task_id_path: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let (entry, _) = complete_task(&trackers, task_id_path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(entry))
}
