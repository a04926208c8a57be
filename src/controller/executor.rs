use super::fsm::SessionEvent;
use crate::{
    Error, Result, codec,
    llm::{GenerationRequest, ModelClient},
    prompt::PromptContext,
    session::{ImageInfo, Session},
    transcript::TranscriptEntry,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Reacts to the two user events of a session: image upload and question
/// submission. Holds no per-session state of its own.
pub struct InteractionController {
    model: Arc<dyn ModelClient>,
    prompt: Arc<PromptContext>,
}

impl InteractionController {
    pub fn new(model: Arc<dyn ModelClient>, prompt: Arc<PromptContext>) -> Self {
        Self { model, prompt }
    }

    pub fn prompt(&self) -> &PromptContext {
        &self.prompt
    }

    pub fn upload(
        &self,
        session: &mut Session,
        bytes: &[u8],
        file_name: Option<&str>,
    ) -> Result<ImageInfo> {
        debug!(
            "Session {} received upload {:?} ({} bytes)",
            session.id(),
            file_name,
            bytes.len()
        );

        match codec::decode_upload(bytes, file_name) {
            Ok(image) => {
                let info = ImageInfo {
                    width: image.width(),
                    height: image.height(),
                    file_name: file_name.map(str::to_string),
                };
                // The image is only replaced once the state machine accepts it.
                session.transition(SessionEvent::ImageUploaded)?;
                session.set_image(image, info.clone());
                session.publish();
                info!(
                    "Session {} image ready ({}x{})",
                    session.id(),
                    info.width,
                    info.height
                );
                Ok(info)
            }
            Err(e) => {
                warn!("Session {} upload rejected: {}", session.id(), e);
                session.transition(SessionEvent::UploadFailed)?;
                Err(e)
            }
        }
    }

    /// Runs one question/answer turn. The user entry stays in the transcript
    /// even when the model call fails; an assistant entry is only added on
    /// success. Dropping the returned future mid-call counts as a failed
    /// response.
    pub async fn submit(&self, session: &mut Session, query: &str) -> Result<String> {
        let encoded = match session.image() {
            Some(image) => codec::encode_png(image),
            None => {
                warn!(
                    "Session {} submitted a query without an image",
                    session.id()
                );
                return Err(Error::MissingImage);
            }
        };

        session.transition(SessionEvent::QuerySubmitted)?;
        session.append(TranscriptEntry::user(query.to_string()));
        session.publish();

        let mut turn = PendingTurn::new(session);

        let outcome = match encoded {
            Ok(image) => {
                let request = GenerationRequest::new(&image, query, &self.prompt);
                self.model.generate(request).await
            }
            Err(e) => Err(e),
        };

        turn.settle(outcome)
    }
}

/// A turn that has left `AwaitingResponse` only once it is settled. If it is
/// dropped unsettled the session is moved back to `ImageReady` as a failure.
struct PendingTurn<'a> {
    session: &'a mut Session,
    settled: bool,
}

impl<'a> PendingTurn<'a> {
    fn new(session: &'a mut Session) -> Self {
        Self {
            session,
            settled: false,
        }
    }

    fn settle(&mut self, outcome: Result<String>) -> Result<String> {
        self.settled = true;
        let session = &mut *self.session;

        match outcome {
            Ok(answer) => {
                session.transition(SessionEvent::ResponseReceived)?;
                session.append(TranscriptEntry::assistant(answer.clone()));
                session.publish();
                info!(
                    "Session {} turn complete, transcript has {} entries",
                    session.id(),
                    session.transcript().len()
                );
                Ok(answer)
            }
            Err(e) => {
                error!("Session {} failed to process the input: {}", session.id(), e);
                session.transition(SessionEvent::ResponseFailed)?;
                session.publish();
                Err(e)
            }
        }
    }
}

impl Drop for PendingTurn<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        warn!(
            "Session {} turn abandoned before the model answered",
            self.session.id()
        );
        if self.session.transition(SessionEvent::ResponseFailed).is_ok() {
            self.session.publish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::fsm::SessionState;
    use async_trait::async_trait;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use pretty_assertions::assert_eq;
    use std::io::Cursor;
    use uuid::Uuid;

    struct EchoModel;

    #[async_trait]
    impl ModelClient for EchoModel {
        async fn generate(&self, request: GenerationRequest) -> Result<String> {
            Ok(format!("{} parts", request.parts().len()))
        }
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(RgbImage::new(width, height))
            .write_to(&mut buffer, ImageFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    fn controller() -> InteractionController {
        InteractionController::new(Arc::new(EchoModel), Arc::new(PromptContext::default()))
    }

    #[test]
    fn test_rejected_upload_leaves_image_untouched() {
        let controller = controller();
        let mut session = Session::new(Uuid::new_v4());
        controller
            .upload(&mut session, &png(4, 4), Some("a.png"))
            .unwrap();

        // A turn is in flight, so a new image must not slip in underneath it
        session.transition(SessionEvent::QuerySubmitted).unwrap();
        let err = controller
            .upload(&mut session, &png(8, 8), Some("b.png"))
            .unwrap_err();

        assert!(matches!(err, Error::InvalidTransition { .. }));
        assert_eq!(session.state(), SessionState::AwaitingResponse);
        let info = session.image_info().unwrap();
        assert_eq!(info.file_name.as_deref(), Some("a.png"));
        assert_eq!((info.width, info.height), (4, 4));
    }

    #[tokio::test]
    async fn test_submit_settles_back_to_image_ready() {
        let controller = controller();
        let mut session = Session::new(Uuid::new_v4());
        controller.upload(&mut session, &png(4, 4), None).unwrap();

        let answer = controller.submit(&mut session, "count").await.unwrap();
        assert_eq!(answer, "3 parts");
        assert_eq!(session.state(), SessionState::ImageReady);
        assert_eq!(session.notifier().current().transcript.len(), 2);
    }
}
