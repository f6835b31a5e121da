// MindGarden/backend/src/handlers/ui_handlers.rs
// Dashboard form submissions. Each POST runs one load -> mutate -> persist
// cycle and answers with the dashboard rendered from what was just saved.

use crate::db::{Collection, Table, Trackers};
use crate::error_handler::ServiceError;
use crate::handlers::{emotion_handlers, medication_handlers, priority_handlers};
use crate::models::{
    entries, CreateMedicationPayload, CreateMoodPayload, CreateTaskPayload, MedicationEntry,
    MoodEntry, TaskEntry,
};
use crate::render::{render_dashboard, Dashboard, Flash};
use actix_web::http::StatusCode;
use actix_web::{get, post, web, HttpResponse, ResponseError};
use actix_web::Error as ActixError;
use chrono::Local;
use uuid::Uuid;

// Picks the freshly persisted table when it belongs to this collection,
// otherwise reads the current one from disk.
async fn current_table(
    collection: &Collection,
    fresh: &mut Option<Table>,
) -> Result<Table, ServiceError> {
    if let Some(table) = fresh.take() {
        if table.schema() == collection.store().schema() {
            return Ok(table);
        }
        *fresh = Some(table);
    }
    collection.read().await
}

async fn render_page(
    trackers: &Trackers,
    mut fresh: Option<Table>,
    flashes: Vec<Flash>,
    status: StatusCode,
) -> Result<HttpResponse, ServiceError> {
    let medications: Vec<MedicationEntry> =
        entries(&current_table(&trackers.medications, &mut fresh).await?);
    let moods: Vec<MoodEntry> = entries(&current_table(&trackers.emotions, &mut fresh).await?);
    let tasks: Vec<TaskEntry> = entries(&current_table(&trackers.priorities, &mut fresh).await?);

    let html = render_dashboard(&Dashboard {
        today: Local::now().date_naive(),
        medications: &medications,
        moods: &moods,
        tasks: &tasks,
        flashes: &flashes,
    });

    Ok(HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(html))
}

// Failed actions still show the page, with the reason on top.
async fn render_outcome(
    trackers: &Trackers,
    outcome: Result<(Table, Vec<Flash>), ServiceError>,
) -> Result<HttpResponse, ServiceError> {
    match outcome {
        Ok((table, flashes)) => render_page(trackers, Some(table), flashes, StatusCode::OK).await,
        Err(e) => {
            let status = e.status_code();
            log::warn!("Dashboard action failed ({}): {}", status, e);
            render_page(trackers, None, vec![Flash::error(e.user_message())], status).await
        }
    }
}

// Extraction failures arrive as ServiceError::BadRequest from the app's
// FormConfig. Reuse its message so the flash is not prefixed twice.
fn submitted<T>(form: Result<web::Form<T>, ActixError>) -> Result<T, ServiceError> {
    form.map(web::Form::into_inner)
        .map_err(|e| match e.as_error::<ServiceError>() {
            Some(ServiceError::BadRequest(msg)) => ServiceError::BadRequest(msg.clone()),
            _ => ServiceError::BadRequest(e.to_string()),
        })
}

#[get("/")]
pub async fn dashboard_handler(
    trackers: web::Data<Trackers>,
) -> Result<HttpResponse, ServiceError> {
    render_page(&trackers, None, Vec::new(), StatusCode::OK).await
}

#[post("/medications")]
pub async fn submit_medication_handler(
    trackers: web::Data<Trackers>,
    form: Result<web::Form<CreateMedicationPayload>, ActixError>,
) -> Result<HttpResponse, ServiceError> {
    let outcome = match submitted(form) {
        Ok(payload) => medication_handlers::add_medication(&trackers, payload)
            .await
            .map(|(_, table)| (table, vec![Flash::success("복약 정보가 추가되었습니다!")])),
        Err(e) => Err(e),
    };
    render_outcome(&trackers, outcome).await
}

#[post("/medications/{medication_id}/complete")]
pub async fn submit_medication_completion_handler(
    trackers: web::Data<Trackers>,
    medication_id: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let outcome = medication_handlers::complete_medication(&trackers, medication_id.into_inner())
        .await
        .map(|(entry, table)| {
            (table, vec![Flash::success(format!("{} 완료!", entry.drug_name))])
        });
    render_outcome(&trackers, outcome).await
}

#[post("/emotions")]
pub async fn submit_mood_handler(
    trackers: web::Data<Trackers>,
    form: Result<web::Form<CreateMoodPayload>, ActixError>,
) -> Result<HttpResponse, ServiceError> {
    let outcome = match submitted(form) {
        Ok(payload) => emotion_handlers::add_mood(&trackers, payload)
            .await
            .map(|(response, table)| {
                let mut flashes = vec![Flash::success("감정 기록이 추가되었습니다!")];
                if let Some(message) = response.message {
                    flashes.push(Flash::warning(message));
                }
                (table, flashes)
            }),
        Err(e) => Err(e),
    };
    render_outcome(&trackers, outcome).await
}

#[post("/priorities")]
pub async fn submit_task_handler(
    trackers: web::Data<Trackers>,
    form: Result<web::Form<CreateTaskPayload>, ActixError>,
) -> Result<HttpResponse, ServiceError> {
    let outcome = match submitted(form) {
        Ok(payload) => priority_handlers::add_task(&trackers, payload)
            .await
            .map(|(_, table)| (table, vec![Flash::success("작업이 추가되었습니다!")])),
        Err(e) => Err(e),
    };
    render_outcome(&trackers, outcome).await
}

#[post("/priorities/{task_id_path}/complete")]
pub async fn submit_task_completion_handler(
    trackers: web::Data<Trackers>,
    task_id_path: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let outcome = priority_handlers::complete_task(&trackers, task_id_path.into_inner())
        .await
        .map(|(entry, table)| (table, vec![Flash::success(format!("{} 완료!", entry.task))]));
    render_outcome(&trackers, outcome).await
}
