use crate::{controller::SessionState, session::ImageInfo, transcript::TranscriptEntry};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub input: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub session_id: String,
    pub output: String,
    pub transcript: Vec<TranscriptEntry>,
}

#[derive(Debug, Serialize)]
pub struct SessionCreatedResponse {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub session_id: String,
    pub state: SessionState,
    pub image: ImageInfo,
}

#[derive(Debug, Serialize)]
pub struct SampleQuestionsResponse {
    pub questions: Vec<String>,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
