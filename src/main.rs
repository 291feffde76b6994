use std::{net::Ipv4Addr, process::ExitCode, sync::Arc};

use tracing::{error, info};

use taskbook::{config::Config, create_app, db, AppState};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("invalid configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    let db = match db::init_db(&config.db_path) {
        Ok(db) => db,
        Err(err) => {
            error!(path = %config.db_path.display(), "initializing database: {err}");
            return ExitCode::FAILURE;
        }
    };

    let state = AppState {
        db,
        base_path: Arc::new(config.base_path),
    };
    let app = create_app(state);
    let addr = (Ipv4Addr::UNSPECIFIED, config.port);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("failed to bind to port {}: {err}", config.port);
            return ExitCode::FAILURE;
        }
    };

    info!("running on {addr:?}");

    if let Err(err) = axum::serve(listener, app).await {
        error!("failed serving: {err}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
