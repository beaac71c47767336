mod routes;
mod logger;
mod config;
mod response;
mod error;
mod models;
mod middleware;
mod state;
mod repository;
mod handler;
mod service;
mod pipeline;
mod geofence;
mod tracer;

use std::sync::Arc;
use dotenv::dotenv;
use log::{error, info};
use opentelemetry::global;
use tokio::signal;
use crate::logger::logger::setup_logger;
use config::settings::SETTINGS;
use crate::pipeline::recognition_pipeline::recognition_pipeline::RecognitionPipeline;
use crate::repository::attendance_repo::AttendanceRepository;
use crate::repository::enrollment_repo::EnrollmentRepository;
use crate::repository::face_gallery::FaceGallery;
use crate::routes::root::{root_routes, RouterState};
use crate::service::enrollment_service::EnrollmentService;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;
use crate::tracer::tracer::init_tracer_provider;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[tokio::main]
async fn main() {
    // Setup logger
    dotenv().ok();
    setup_logger();
    let addr = format!("0.0.0.0:{}", SETTINGS.server.http_port);

    // Setup pipeline and storage
    let recognition_pipeline = RecognitionPipeline::new()
        .unwrap_or_else(|e| panic!("Failed to init recognition pipeline: {}", e.to_string()));
    let recognition_pipeline = Arc::new(recognition_pipeline);

    let attendance_repository = AttendanceRepository::new(&SETTINGS.storage.attendance_file)
        .unwrap_or_else(|e| panic!("Failed to open attendance ledger: {}", e.to_string()));
    let attendance_repository = Arc::new(attendance_repository);

    let enrollment_repository = EnrollmentRepository::new(&SETTINGS.storage.known_faces_dir, &SETTINGS.storage.uids_file)
        .unwrap_or_else(|e| panic!("Failed to open enrollment storage: {}", e.to_string()));
    let enrollment_repository = Arc::new(enrollment_repository);

    let face_gallery = Arc::new(FaceGallery::new());

    // Rebuild the gallery from stored photos
    let enrollment_service = EnrollmentService::new(&recognition_pipeline, &enrollment_repository, &face_gallery);
    match enrollment_service.warm_up() {
        Ok(loaded) => info!("system ready: {loaded} enrolled faces loaded"),
        Err(e) => error!("failed to warm up face gallery: {e}"),
    }

    // Setup tracing
    let tracer_provider = init_tracer_provider().expect("Failed to initialize tracer provider.");
    global::set_tracer_provider(tracer_provider.clone());

    // Init server
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to create new listener: {}", e.to_string()));
    info!("starting api server on {:?}", addr);
    let router_state = RouterState::new(
        recognition_pipeline,
        face_gallery,
        attendance_repository,
        enrollment_repository,
    );

    axum::serve(listener, root_routes(router_state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap_or_else(|e| panic!("Failed to start api server: {}", e.to_string()));

    if let Err(e) = tracer_provider.shutdown() {
        error!("failed to shut down tracer provider: {e}");
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
