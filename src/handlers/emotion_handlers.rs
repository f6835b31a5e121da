// MindGarden/backend/src/handlers/emotion_handlers.rs
use crate::db::{Table, Trackers};
use crate::error_handler::ServiceError;
use crate::handlers::csv_download;
use crate::models::{
    entries, find_entry, CreateMoodPayload, MoodEntry, MoodEntryResponse, TrackedRecord,
};
use actix_web::{get, post, web, HttpResponse};
use uuid::Uuid;

pub const EXPORT_FILE_NAME: &str = "emotion_data.csv";

pub async fn add_mood(
    trackers: &Trackers,
    payload: CreateMoodPayload,
) -> Result<(MoodEntryResponse, Table), ServiceError> {
    let entry = MoodEntry::try_from(payload)?;
    let record = entry.to_record();

    let table = trackers
        .emotions
        .mutate(move |table| table.append(record))
        .await?;

    log::info!("Added mood entry {} ({})", entry.id(), entry.mood);
    Ok((MoodEntryResponse::from(entry), table))
}

#[post("")]
pub async fn create_mood_handler(
    trackers: web::Data<Trackers>,
    payload: web::Json<CreateMoodPayload>,
) -> Result<HttpResponse, ServiceError> {
    let (response, _) = add_mood(&trackers, payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(response))
}

#[get("")]
pub async fn list_moods_handler(
    trackers: web::Data<Trackers>,
) -> Result<HttpResponse, ServiceError> {
    let table = trackers.emotions.read().await?;
    let items: Vec<MoodEntryResponse> = entries::<MoodEntry>(&table)
        .into_iter()
        .map(MoodEntryResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(items))
}

#[get("/export")]
pub async fn export_moods_handler(
    trackers: web::Data<Trackers>,
) -> Result<HttpResponse, ServiceError> {
    let table = trackers.emotions.read().await?;
    csv_download(&table, EXPORT_FILE_NAME)
}

#[get("/{mood_id}")]
pub async fn get_mood_handler(
    trackers: web::Data<Trackers>,
    mood_id: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let table = trackers.emotions.read().await?;
    let entry: MoodEntry = find_entry(&table, mood_id.into_inner())?;
    Ok(HttpResponse::Ok().json(MoodEntryResponse::from(entry)))
}
