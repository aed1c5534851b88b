use std::error::Error;
use std::sync::Arc;

use keepnote_core::{db::open_db, init_logging};
use keepnote_server::{create_router, AppState, ServerConfig};
use log::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = ServerConfig::from_env()?;
    init_logging(config.logging_settings()?)?;

    let conn = open_db(&config.db_path).map_err(|err| {
        error!(
            "event=db_open module=server status=error path={} error={err}",
            config.db_path.display()
        );
        err
    })?;
    let app = create_router(Arc::new(AppState::new(conn)));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(
        "event=server_start module=server status=ok addr={} db={} version={}",
        config.bind_addr,
        config.db_path.display(),
        keepnote_core::core_version()
    );
    axum::serve(listener, app).await?;
    Ok(())
}
