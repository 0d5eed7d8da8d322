use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let access_id =
        std::env::var("CALX_ACCESS_ID").unwrap_or_else(|_| mock_server::DEFAULT_ACCESS_ID.to_string());
    let secret_key = std::env::var("CALX_SECRET_KEY")
        .unwrap_or_else(|_| mock_server::DEFAULT_SECRET_KEY.to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, %access_id, "mock CalX API listening");
    mock_server::run_with(listener, &access_id, &secret_key).await
}
