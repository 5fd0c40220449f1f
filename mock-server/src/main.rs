use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins, then `LUMO_LOG` as a level, then `info`.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = std::env::var("LUMO_LOG").unwrap_or_else(|_| "info".to_string());
        EnvFilter::new(format!("mock_server={level},warn"))
    })
}

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt().with_env_filter(env_filter()).init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    mock_server::run(listener).await
}
