use super::types::{
    ErrorResponse, MessageRequest, MessageResponse, SampleQuestionsResponse,
    SessionCreatedResponse, UploadResponse,
};
use crate::{
    Error,
    controller::InteractionController,
    session::{SessionStore, SessionView},
    transcript::TranscriptEntry,
};
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{
        Html, Json,
        sse::{Event, KeepAlive, Sse},
    },
};
use futures::Stream;
use std::{convert::Infallible, sync::Arc};
use tracing::{error, info, warn};

const INDEX_HTML: &str = include_str!("../../static/index.html");

pub const IMAGE_FIELD: &str = "image";

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub controller: Arc<InteractionController>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn status_for(e: &Error) -> StatusCode {
    match e {
        Error::ImageDecode(_)
        | Error::UnsupportedFormat(_)
        | Error::MissingImage
        | Error::Upload(_) => StatusCode::BAD_REQUEST,
        Error::SessionNotFound { .. } => StatusCode::NOT_FOUND,
        Error::SessionBusy { .. } | Error::InvalidTransition { .. } => StatusCode::CONFLICT,
        Error::Llm(_) | Error::Network(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn api_error(e: Error) -> ApiError {
    let status = status_for(&e);
    let message = if e.is_remote() {
        format!("Error processing the input: {e}")
    } else {
        e.to_string()
    };
    (status, Json(ErrorResponse { error: message }))
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn sample_questions(State(state): State<AppState>) -> Json<SampleQuestionsResponse> {
    let prompt = state.controller.prompt();
    Json(SampleQuestionsResponse {
        questions: prompt.sample_questions.clone(),
        text: prompt.sample_questions_text(),
    })
}

pub async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionCreatedResponse>), ApiError> {
    let handle = state.sessions.create().map_err(api_error)?;
    Ok((
        StatusCode::CREATED,
        Json(SessionCreatedResponse {
            session_id: handle.id().to_string(),
        }),
    ))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    let handle = state.sessions.get(&session_id).map_err(api_error)?;
    Ok(Json(handle.view()))
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.sessions.remove(&session_id).map_err(api_error)?;
    info!("Session {} ended", session_id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_transcript(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<TranscriptEntry>>, ApiError> {
    let handle = state.sessions.get(&session_id).map_err(api_error)?;
    Ok(Json(handle.view().transcript))
}

pub async fn upload_image(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let handle = state.sessions.get(&session_id).map_err(api_error)?;
    let mut session = handle.try_lock().map_err(api_error)?;

    let multipart_error = |e: axum::extract::multipart::MultipartError| {
        warn!("Malformed upload for session {}: {}", session_id, e);
        (e.status(), Json(ErrorResponse { error: e.body_text() }))
    };

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;

        let image = state
            .controller
            .upload(&mut session, &bytes, file_name.as_deref())
            .map_err(api_error)?;

        return Ok(Json(UploadResponse {
            session_id: session_id.clone(),
            state: session.state(),
            image,
        }));
    }

    Err(api_error(Error::upload(format!(
        "multipart field '{IMAGE_FIELD}' is missing"
    ))))
}

pub async fn submit_message(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    info!("Received question for session {}: {}", session_id, request.input);

    let handle = state.sessions.get(&session_id).map_err(api_error)?;
    let mut session = handle.try_lock().map_err(api_error)?;
    let controller = Arc::clone(&state.controller);

    // The turn owns the session lock and runs to completion even if the client
    // disconnects and this handler is dropped.
    let turn = tokio::spawn(async move {
        let output = controller.submit(&mut session, &request.input).await?;
        Ok::<_, Error>((output, session.transcript().list().to_vec()))
    });

    let outcome = turn
        .await
        .map_err(|e| Error::internal(format!("Turn for session {session_id} aborted: {e}")))
        .and_then(|outcome| outcome);

    match outcome {
        Ok((output, transcript)) => Ok(Json(MessageResponse {
            session_id,
            output,
            transcript,
        })),
        Err(e) => {
            error!("Failed to process question for session {}: {}", session_id, e);
            Err(api_error(e))
        }
    }
}

/// Pushes a `session` event carrying the new [`SessionView`] after every
/// change, so the page can redraw without polling. Closing the last stream of
/// a session ends the session.
pub async fn session_events(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let subscription = state.sessions.subscribe(&session_id).map_err(api_error)?;
    info!("Session {} event stream opened", subscription.session_id());

    let stream = futures::stream::unfold(subscription, |mut subscription| async move {
        let view = subscription.next().await?;
        let event = Event::default()
            .event("session")
            .json_data(&view)
            .unwrap_or_else(|_| Event::default().event("session"));
        Some((Ok(event), subscription))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
