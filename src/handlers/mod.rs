// MindGarden/backend/src/handlers/mod.rs
pub mod analytics_handlers;
pub mod emotion_handlers;
pub mod medication_handlers;
pub mod priority_handlers;
pub mod ui_handlers;

use crate::db::Table;
use crate::error_handler::ServiceError;
use actix_web::http::header;
use actix_web::HttpResponse;

// Same bytes the store writes to disk, served as an attachment.
pub(crate) fn csv_download(table: &Table, file_name: &str) -> Result<HttpResponse, ServiceError> {
    let body = table.to_csv_bytes().map_err(|e| {
        log::error!("Failed to serialize {} for export: {}", file_name, e);
        ServiceError::InternalServerError(format!("Could not export {}", file_name))
    })?;

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name),
        ))
        .body(body))
}
