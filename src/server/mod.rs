pub mod handlers;
pub mod types;

use crate::{
    Result, config::Config, controller::InteractionController, llm::create_model_client,
    prompt::PromptContext, session::SessionStore,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};
use handlers::AppState;
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::info;

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/sample-questions", get(handlers::sample_questions))
        .route("/api/sessions", post(handlers::create_session))
        .route(
            "/api/sessions/:session_id",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route("/api/sessions/:session_id/image", put(handlers::upload_image))
        .route(
            "/api/sessions/:session_id/messages",
            post(handlers::submit_message),
        )
        .route(
            "/api/sessions/:session_id/transcript",
            get(handlers::get_transcript),
        )
        .route(
            "/api/sessions/:session_id/events",
            get(handlers::session_events),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(config: Config) -> Result<()> {
    let prompt = Arc::new(PromptContext::with_system_instruction(
        config.llm.system_prompt.as_deref(),
    ));
    let model = create_model_client(config.llm.clone())?;

    let app_state = AppState {
        sessions: Arc::new(SessionStore::new()),
        controller: Arc::new(InteractionController::new(model, prompt)),
    };

    let app = router(app_state, config.server.max_upload_bytes);

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
