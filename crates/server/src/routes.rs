use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::{
    cors::CorsLayer,
    trace::{TraceLayer, DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, DefaultOnFailure},
};
use tracing::Level;

use crate::state::{StringDataState, UploadState};

pub mod string_data;
pub mod uploads;

/// Created entity echoed back with a confirmation message.
#[derive(Debug, Serialize)]
pub struct Saved<T> {
    #[serde(flatten)]
    pub record: T,
    pub message: &'static str,
}

impl<T> Saved<T> {
    pub fn new(record: T, message: &'static str) -> Self {
        Self { record, message }
    }
}

/// Router for the string data service.
pub fn build_string_data_router(state: StringDataState, cors: CorsLayer) -> Router {
    let app = Router::new()
        .route("/", get(string_data::root))
        .route("/save-data/", post(string_data::save_data))
        .route("/data/", get(string_data::list_data))
        .route("/data/:id", get(string_data::get_data))
        .with_state(state);
    with_http_layers(app, cors)
}

/// Router for the file upload service.
pub fn build_file_upload_router(state: UploadState, cors: CorsLayer) -> Router {
    let body_limit = state.body_limit();
    let app = Router::new()
        .route("/", get(uploads::root))
        .route(
            "/upload/",
            post(uploads::upload_file).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/files/", get(uploads::list_files))
        .route("/files/:id", get(uploads::get_file))
        .with_state(state);
    with_http_layers(app, cors)
}

fn with_http_layers(app: Router, cors: CorsLayer) -> Router {
    app.layer(cors).layer(
        TraceLayer::new_for_http()
            .make_span_with(
                DefaultMakeSpan::new()
                    .level(Level::INFO)
                    .include_headers(false),
            )
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(
                DefaultOnResponse::new()
                    .level(Level::INFO)
                    .include_headers(false),
            )
            .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
    )
}
