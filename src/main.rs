// MindGarden/backend/src/main.rs
mod config;
mod db;
mod error_handler;
mod handlers;
mod models;
mod render;
pub mod schema;
mod sentiment;

use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpResponse, HttpServer};
use config::AppConfig;
use db::Trackers;
use error_handler::ServiceError;
use handlers::{
    analytics_handlers, emotion_handlers, medication_handlers, priority_handlers, ui_handlers,
};
use std::io;

// Health check: the data directory must still be there
async fn health_check_handler(trackers: web::Data<Trackers>) -> Result<HttpResponse, ServiceError> {
    let data_dir = trackers.data_dir.clone();
    let present = web::block(move || data_dir.is_dir()).await?;

    if present {
        Ok(HttpResponse::Ok().json(serde_json::json!({
            "status": "healthy",
            "message": "Backend is running and data directory is accessible",
            "dataDir": trackers.data_dir.display().to_string()
        })))
    } else {
        log::error!(
            "Data directory {} is missing",
            trackers.data_dir.display()
        );
        Err(ServiceError::InternalServerError(
            "Data directory is not accessible".to_string(),
        ))
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        ServiceError::BadRequest(err.to_string()).into()
    }))
    .app_data(web::FormConfig::default().error_handler(|err, _req| {
        ServiceError::BadRequest(err.to_string()).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        ServiceError::BadRequest(err.to_string()).into()
    }))
    .service(web::resource("/health").route(web::get().to(health_check_handler)))
    .service(ui_handlers::dashboard_handler)
    .service(
        web::scope("/ui")
            .service(ui_handlers::submit_medication_handler)
            .service(ui_handlers::submit_medication_completion_handler)
            .service(ui_handlers::submit_mood_handler)
            .service(ui_handlers::submit_task_handler)
            .service(ui_handlers::submit_task_completion_handler),
    )
    .service(
        web::scope("/medications")
            .service(medication_handlers::create_medication_handler)
            .service(medication_handlers::list_medications_handler)
            .service(medication_handlers::export_medications_handler)
            .service(medication_handlers::get_medication_handler)
            .service(medication_handlers::complete_medication_handler),
    )
    .service(
        web::scope("/emotions")
            .service(emotion_handlers::create_mood_handler)
            .service(emotion_handlers::list_moods_handler)
            .service(emotion_handlers::export_moods_handler)
            .service(emotion_handlers::get_mood_handler),
    )
    .service(
        web::scope("/priorities")
            .service(priority_handlers::create_task_handler)
            .service(priority_handlers::list_tasks_handler)
            .service(priority_handlers::export_tasks_handler)
            .service(priority_handlers::get_task_handler)
            .service(priority_handlers::complete_task_handler),
    )
    .service(
        web::scope("/analytics")
            .service(analytics_handlers::get_mood_scores_handler)
            .service(analytics_handlers::get_task_status_handler),
    );
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init();

    // .env is a development convenience only
    if cfg!(debug_assertions) {
        match dotenvy::dotenv() {
            Ok(path) => log::info!(".env file loaded from path: {}", path.display()),
            Err(e) => log::warn!(
                "Could not load .env file: {}, using environment variables.",
                e
            ),
        }
    }

    let config = AppConfig::from_env().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;

    // Every table gets its header before the first request is served
    let trackers = db::create_trackers(&config.data_dir).map_err(|e| {
        log::error!(
            "Failed to initialize data files in {}: {}",
            config.data_dir.display(),
            e
        );
        io::Error::new(io::ErrorKind::Other, e)
    })?;
    let trackers = web::Data::new(trackers);

    log::info!(
        "🌱 Mind Garden starting, data in {}",
        config.data_dir.display()
    );
    log::info!("Server will start at http://{}", config.bind_address());

    let bind_address = config.bind_address();
    HttpServer::new(move || {
        let mut cors = Cors::default()
            .allowed_origin(&config.frontend_url_dev)
            .allowed_methods(vec!["GET", "POST", "PUT", "OPTIONS"])
            .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
            .max_age(3600);
        if let Some(prod) = &config.frontend_url_prod {
            cors = cors.allowed_origin(prod);
        }

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(trackers.clone())
            .configure(configure_routes)
    })
    .bind(bind_address)?
    .run()
    .await
}
