mod store;

pub use store::{SessionHandle, SessionStore, Subscription};

use crate::{
    controller::fsm::{SessionEvent, SessionState, SessionStateMachine},
    transcript::{Transcript, TranscriptEntry},
    Result,
};
use image::DynamicImage;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub file_name: Option<String>,
}

/// Read-only snapshot published after every session mutation.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: String,
    pub state: SessionState,
    pub image: Option<ImageInfo>,
    pub transcript: Vec<TranscriptEntry>,
}

/// Broadcasts [`SessionView`] snapshots to renderers. Readers never need the
/// session lock, so they can observe a turn while it is in flight.
#[derive(Clone)]
pub struct SessionNotifier {
    tx: Arc<watch::Sender<SessionView>>,
}

impl SessionNotifier {
    fn new(initial: SessionView) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    fn publish(&self, view: SessionView) {
        self.tx.send_replace(view);
    }

    pub fn current(&self) -> SessionView {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Per-session context: state machine, uploaded image and transcript.
pub struct Session {
    id: Uuid,
    machine: SessionStateMachine,
    image: Option<(DynamicImage, ImageInfo)>,
    transcript: Transcript,
    notifier: SessionNotifier,
}

impl Session {
    pub fn new(id: Uuid) -> Self {
        let notifier = SessionNotifier::new(SessionView {
            session_id: id.to_string(),
            state: SessionState::Idle,
            image: None,
            transcript: Vec::new(),
        });

        Self {
            id,
            machine: SessionStateMachine::new(),
            image: None,
            transcript: Transcript::new(),
            notifier,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.machine.current_state()
    }

    pub fn image(&self) -> Option<&DynamicImage> {
        self.image.as_ref().map(|(image, _)| image)
    }

    pub fn image_info(&self) -> Option<&ImageInfo> {
        self.image.as_ref().map(|(_, info)| info)
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn notifier(&self) -> &SessionNotifier {
        &self.notifier
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            session_id: self.id.to_string(),
            state: self.state(),
            image: self.image_info().cloned(),
            transcript: self.transcript.list().to_vec(),
        }
    }

    pub(crate) fn transition(&mut self, event: SessionEvent) -> Result<SessionState> {
        self.machine.transition(event)
    }

    pub(crate) fn set_image(&mut self, image: DynamicImage, info: ImageInfo) {
        self.image = Some((image, info));
    }

    pub(crate) fn append(&mut self, entry: TranscriptEntry) {
        self.transcript.append(entry);
    }

    /// Emits the current snapshot to subscribers.
    pub(crate) fn publish(&self) {
        self.notifier.publish(self.view());
    }
}
