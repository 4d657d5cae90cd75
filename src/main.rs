mod app;
mod config;
mod github;

use crate::app::App;
use crate::config::Config;
use crate::github::auth::load_private_key;
use crate::github::events::issues::{self, IssuesEvent};
use crate::github::signature::{self, SIGNATURE_HEADER};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let default_level = if cfg!(debug_assertions) {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    let key = load_private_key(&config.private_key_path)?;
    let address = format!("0.0.0.0:{}", config.port);

    let router = router(App::new(config, key));

    info!("Listening on {}", address);

    let listener = tokio::net::TcpListener::bind(address).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

fn router(app: App) -> Router {
    Router::new()
        .route("/webhook", post(github_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(app)
}

async fn github_webhook(State(app): State<App>, headers: HeaderMap, body: Bytes) -> Response {
    info!("Received webhook request");

    if let Some(secret) = app.config.webhook_secret.as_deref() {
        let header = headers.get(SIGNATURE_HEADER).and_then(|value| value.to_str().ok());

        if let Err(e) = signature::verify(secret, header, &body) {
            warn!(%e, "Rejecting webhook");
            return (StatusCode::UNAUTHORIZED, "Invalid signature").into_response();
        }
    }

    let event = match IssuesEvent::from_json(&body) {
        Ok(event) => event,
        Err(e) => {
            error!(%e, "Failed to decode webhook payload");
            return (StatusCode::BAD_REQUEST, "Invalid payload").into_response();
        },
    };

    let outcome = issues::handle(event, &app).await;
    info!(?outcome, "Webhook handled");

    StatusCode::OK.into_response()
}
