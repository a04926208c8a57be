use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Model error: {0}")]
    Llm(String),

    #[error("Error loading the image: {0}")]
    ImageDecode(String),

    #[error("Error encoding the image: {0}")]
    ImageEncode(String),

    #[error("Unsupported image format: {0}. Allowed types: jpg, jpeg, png")]
    UnsupportedFormat(String),

    #[error("Please upload an image before entering the prompt.")]
    MissingImage,

    #[error("Session {session_id} is still processing a previous request")]
    SessionBusy { session_id: String },

    #[error("Session not found: {session_id}")]
    SessionNotFound { session_id: String },

    #[error("Invalid state transition: {current} -> {requested}")]
    InvalidTransition { current: String, requested: String },

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("HTTP error: {0}")]
    Http(#[from] axum::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Address parse error: {0}")]
    AddrParse(#[from] std::net::AddrParseError),

    #[error("UUID error: {0}")]
    Uuid(#[from] uuid::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm(msg.into())
    }

    pub fn image_decode(msg: impl Into<String>) -> Self {
        Self::ImageDecode(msg.into())
    }

    pub fn image_encode(msg: impl Into<String>) -> Self {
        Self::ImageEncode(msg.into())
    }

    pub fn upload(msg: impl Into<String>) -> Self {
        Self::Upload(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// True for failures of the remote model call (transport included).
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Llm(_) | Self::Network(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_image_message_is_user_facing() {
        assert_eq!(
            Error::MissingImage.to_string(),
            "Please upload an image before entering the prompt."
        );
    }

    #[test]
    fn test_remote_classification() {
        assert!(Error::llm("quota exceeded").is_remote());
        assert!(!Error::MissingImage.is_remote());
        assert!(!Error::image_decode("truncated").is_remote());
    }
}
