use axum::{
    extract::{FromRef, MatchedPath},
    http::Request,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::configuration::Settings;
use crate::email_client::EmailClient;
use crate::routes::{check_health, send_contact_notification, Mailer};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub mailer: Mailer,
}

pub fn get_app_state(configuration: &Settings) -> Result<AppState, reqwest::Error> {
    let mailer = match configuration.notification.credentials() {
        Ok(credentials) => Mailer::Configured {
            email_client: EmailClient::new(
                credentials.base_url.to_string(),
                credentials.sender,
                credentials.api_key,
                credentials.timeout,
            )?,
            recipient: credentials.recipient,
        },
        Err(error) => {
            tracing::warn!(%error, "Contact notifications are not configured");
            Mailer::Unconfigured(error)
        }
    };

    Ok(AppState { mailer })
}

pub async fn run(listener: TcpListener, app_state: AppState) -> Result<(), std::io::Error> {
    axum::serve(listener, router(app_state)).await
}

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/send-contact-notification", post(send_contact_notification))
        .route("/health_check", get(check_health))
        .with_state(app_state)
        .layer(
            // Refer to https://github.com/tokio-rs/axum/blob/main/examples/tracing-aka-logging/Cargo.toml
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let path = request
                    .extensions()
                    .get::<MatchedPath>()
                    .map(MatchedPath::as_str);
                tracing::info_span!(
                    "Starting HTTP request",
                    method = ?request.method(),
                    path,
                    request_id = %Uuid::new_v4(),
                )
            }),
        )
}
