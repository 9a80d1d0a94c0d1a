use std::net::SocketAddr;
use std::path::PathBuf;

use axum_server::tls_rustls::RustlsConfig;
use project_desk::{config::app_port, create_app, db};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_env();
    init_tracing();

    let pool = db::init().await?;
    let app = create_app(pool).await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], app_port()));

    match tls_paths() {
        Some((cert, key)) => {
            let tls = RustlsConfig::from_pem_file(cert, key).await?;
            tracing::info!("listening on https://{}", addr);
            axum_server::bind_rustls(addr, tls)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            tracing::info!("listening on http://{}", addr);
            axum::serve(listener, app.into_make_service()).await?;
        }
    }

    Ok(())
}

fn tls_paths() -> Option<(PathBuf, PathBuf)> {
    let cert = std::env::var_os("CERT_PATH")?;
    let key = std::env::var_os("KEY_PATH")?;
    Some((PathBuf::from(cert), PathBuf::from(key)))
}

fn load_env() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    let _ = dotenvy::from_path(crate_env);
}

fn init_tracing() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
