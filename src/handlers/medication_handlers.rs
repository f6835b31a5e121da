// MindGarden/backend/src/handlers/medication_handlers.rs
use crate::db::{Table, Trackers};
use crate::error_handler::ServiceError;
use crate::handlers::csv_download;
use crate::models::{
    entries, find_entry, CreateMedicationPayload, MedicationEntry, TrackedRecord,
};
use crate::schema::medications;
use actix_web::{get, post, put, web, HttpResponse};
use uuid::Uuid;

pub const EXPORT_FILE_NAME: &str = "medications.csv";

/// Appends a new, not yet taken dose and returns it with the persisted table.
pub async fn add_medication(
    trackers: &Trackers,
    payload: CreateMedicationPayload,
) -> Result<(MedicationEntry, Table), ServiceError> {
    let entry = MedicationEntry::from(payload);
    let record = entry.to_record();

    let table = trackers
        .medications
        .mutate(move |table| table.append(record))
        .await?;

    log::info!("Added medication {} ({})", entry.id(), entry.drug_name);
    Ok((entry, table))
}

/// Marks a dose as taken. Completion never resets, so a second call is a no-op.
pub async fn complete_medication(
    trackers: &Trackers,
    medication_id: Uuid,
) -> Result<(MedicationEntry, Table), ServiceError> {
    let table = trackers
        .medications
        .mutate(move |table| {
            let current: MedicationEntry = find_entry(&table, medication_id)?;
            if current.completed {
                return Ok(table);
            }
            table.update_field(&medication_id.to_string(), medications::COMPLETED, "true")
        })
        .await?;

    let entry: MedicationEntry = find_entry(&table, medication_id)?;
    log::info!("Medication {} marked completed", medication_id);
    Ok((entry, table))
}

#[post("")]
pub async fn create_medication_handler(
    trackers: web::Data<Trackers>,
    payload: web::Json<CreateMedicationPayload>,
) -> Result<HttpResponse, ServiceError> {
    let (entry, _) = add_medication(&trackers, payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(entry))
}

#[get("")]
pub async fn list_medications_handler(
    trackers: web::Data<Trackers>,
) -> Result<HttpResponse, ServiceError> {
    let table = trackers.medications.read().await?;
    let items: Vec<MedicationEntry> = entries(&table);
    Ok(HttpResponse::Ok().json(items))
}

#[get("/export")]
pub async fn export_medications_handler(
    trackers: web::Data<Trackers>,
) -> Result<HttpResponse, ServiceError> {
    let table = trackers.medications.read().await?;
    csv_download(&table, EXPORT_FILE_NAME)
}

#[get("/{medication_id}")]
pub async fn get_medication_handler(
    trackers: web::Data<Trackers>,
    medication_id: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let table = trackers.medications.read().await?;
    let entry: MedicationEntry = find_entry(&table, medication_id.into_inner())?;
    Ok(HttpResponse::Ok().json(entry))
}

#[put("/{medication_id}/complete")]
pub async fn complete_medication_handler(
    trackers: web::Data<Trackers>,
    medication_id: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let (entry, _) = complete_medication(&trackers, medication_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(entry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configure_routes;
    use crate::handlers::test_support::test_trackers;
    use actix_web::http::{header, StatusCode};
    use actix_web::{test, App};
    use serde_json::json;

    #[actix_web::test]
    async fn create_then_complete_round_trip() {
        let (_dir, trackers) = test_trackers();
        let app = test::init_service(
            App::new()
                .app_data(trackers.clone())
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/medications")
            .set_json(json!({"drug_name": "항우울제", "time": "09:00", "dosage": "50mg"}))
            .to_request();
        let created: MedicationEntry = test::call_and_read_body_json(&app, req).await;
        assert!(!created.completed);

        let req = test::TestRequest::put()
            .uri(&format!("/medications/{}/complete", created.id))
            .to_request();
        let completed: MedicationEntry = test::call_and_read_body_json(&app, req).await;
        assert!(completed.completed);
        assert_eq!(completed.drug_name, created.drug_name);
        assert_eq!(completed.time, created.time);
        assert_eq!(completed.dosage, created.dosage);

        // a second click keeps it completed
        let req = test::TestRequest::put()
            .uri(&format!("/medications/{}/complete", created.id))
            .to_request();
        let again: MedicationEntry = test::call_and_read_body_json(&app, req).await;
        assert!(again.completed);

        let on_disk = trackers.medications.store().load();
        assert_eq!(on_disk.len(), 1);
        assert_eq!(on_disk.rows()[0][4], "true");
    }

    #[actix_web::test]
    async fn list_keeps_insertion_order() {
        let (_dir, trackers) = test_trackers();
        let app = test::init_service(
            App::new()
                .app_data(trackers.clone())
                .configure(configure_routes),
        )
        .await;

        for name in ["아침약", "저녁약"] {
            let req = test::TestRequest::post()
                .uri("/medications")
                .set_json(json!({"drug_name": name, "dosage": "1정"}))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::CREATED);
        }

        let req = test::TestRequest::get().uri("/medications").to_request();
        let items: Vec<MedicationEntry> = test::call_and_read_body_json(&app, req).await;
        let names: Vec<&str> = items.iter().map(|m| m.drug_name.as_str()).collect();
        assert_eq!(names, vec!["아침약", "저녁약"]);
    }

    #[actix_web::test]
    async fn completing_unknown_id_is_not_found() {
        let (_dir, trackers) = test_trackers();
        let app = test::init_service(
            App::new()
                .app_data(trackers.clone())
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::put()
            .uri(&format!("/medications/{}/complete", Uuid::new_v4()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn export_matches_the_persisted_file() {
        let (_dir, trackers) = test_trackers();
        let app = test::init_service(
            App::new()
                .app_data(trackers.clone())
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/medications")
            .set_json(json!({"drug_name": "비타민, D", "time": "21:30", "dosage": "1000IU"}))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::get()
            .uri("/medications/export")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let disposition = resp
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains("medications.csv"));

        let body = test::read_body(resp).await;
        let on_disk = std::fs::read(trackers.medications.store().path()).unwrap();
        assert_eq!(body.as_ref(), on_disk.as_slice());
    }

    #[actix_web::test]
    async fn malformed_time_is_a_bad_request() {
        let (_dir, trackers) = test_trackers();
        let app = test::init_service(
            App::new()
                .app_data(trackers.clone())
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/medications")
            .set_json(json!({"drug_name": "항우울제", "time": "아침", "dosage": "50mg"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(trackers.medications.store().load().is_empty());
    }
}
