use std::{future::Future, net::SocketAddr, process::ExitCode};

use axum::Router;
use common::utils::logging::init_logging_from_env;
use configs::AppConfig;
use dotenvy::dotenv;
use service::file::{
    string_data::StringDataStore,
    uploads::{FileUploadStore, UploadLimit},
};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use uuid::Uuid;

use crate::routes;
use crate::state::{StringDataState, UploadState};

/// Which of the two HTTP services to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServiceKind {
    StringData,
    FileUpload,
}

impl ServiceKind {
    pub fn name(&self) -> &'static str {
        match self {
            ServiceKind::StringData => "string-data",
            ServiceKind::FileUpload => "file-upload",
        }
    }

    fn port(&self, cfg: &AppConfig) -> u16 {
        match self {
            ServiceKind::StringData => cfg.server.string_data_port,
            ServiceKind::FileUpload => cfg.server.file_upload_port,
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(kind: ServiceKind, cfg: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(format!("{}:{}", cfg.server.host, kind.port(cfg)).parse()?)
}

/// Open the stores named by `cfg` and build the router for `kind`.
pub async fn build_app(kind: ServiceKind, cfg: &AppConfig) -> anyhow::Result<Router> {
    let storage = &cfg.storage;
    let cors = build_cors();
    match kind {
        ServiceKind::StringData => {
            common::env::ensure_data_dirs(storage.data_dir.clone(), &[]).await?;
            let store = StringDataStore::new(storage.records_path()).await?;
            info!(path = %storage.records_path().display(), "string data store ready");
            let state = StringDataState { store };
            Ok(routes::build_string_data_router(state, cors))
        }
        ServiceKind::FileUpload => {
            common::env::ensure_data_dirs(storage.data_dir.clone(), &[storage.upload_path()]).await?;
            let limit = UploadLimit::new(storage.max_upload_bytes);
            let store = FileUploadStore::new(storage.files_path(), storage.upload_path(), limit).await?;
            info!(
                path = %storage.files_path().display(),
                upload_dir = %storage.upload_path().display(),
                max_upload_bytes = limit.max_bytes(),
                "upload store ready"
            );
            let state = UploadState { store, limit };
            Ok(routes::build_file_upload_router(state, cors))
        }
    }
}

/// Serve `app` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!(event = "shutdown_signal", "received Ctrl+C, shutting down");
}

/// Build the app for `kind` and run it until Ctrl+C.
pub async fn run(kind: ServiceKind, cfg: AppConfig) -> anyhow::Result<()> {
    let app = build_app(kind, &cfg).await?;
    let addr = bind_addr(kind, &cfg)?;
    let listener = TcpListener::bind(addr).await?;
    info!(service = kind.name(), %addr, "listening");
    serve(listener, app, ctrl_c()).await
}

/// Process entry shared by both binaries: logging, config, runtime, run.
pub fn launch(kind: ServiceKind) -> ExitCode {
    dotenv().ok();
    init_logging_from_env();
    info!(service = kind.name(), event = "logger_init", "tracing subscriber initialized");

    let service_id = Uuid::new_v4();
    let pid = std::process::id();
    let version = env!("CARGO_PKG_VERSION");

    std::panic::set_hook(Box::new(move |info| {
        error!(
            service = kind.name(),
            event = "panic",
            %service_id,
            pid,
            message = %info,
            "unhandled panic occurred"
        );
    }));

    let cfg = match AppConfig::load_and_validate() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(service = kind.name(), event = "config_invalid", error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(w) = cfg.server.worker_threads {
        builder.worker_threads(w);
    }
    let rt = match builder.build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = kind.name(), event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    info!(
        service = kind.name(),
        event = "start",
        %service_id,
        pid,
        version,
        threads = cfg.server.worker_threads.unwrap_or_default(),
        "service starting"
    );

    match rt.block_on(run(kind, cfg)) {
        Ok(()) => {
            info!(service = kind.name(), event = "stop", %service_id, pid, "service stopped normally");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(service = kind.name(), event = "run_failed", error = %e, "service returned error");
            ExitCode::FAILURE
        }
    }
}
