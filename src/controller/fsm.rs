use crate::{Error, Result};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    ImageReady,
    AwaitingResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    ImageUploaded,
    UploadFailed,
    QuerySubmitted,
    ResponseReceived,
    ResponseFailed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

pub struct SessionStateMachine {
    state: SessionState,
}

impl SessionStateMachine {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
        }
    }

    pub fn current_state(&self) -> SessionState {
        self.state
    }

    pub fn transition(&mut self, event: SessionEvent) -> Result<SessionState> {
        let old_state = self.state;

        let new_state = match (old_state, event) {
            (SessionState::Idle, SessionEvent::ImageUploaded) => SessionState::ImageReady,
            (SessionState::Idle, SessionEvent::UploadFailed) => SessionState::Idle,
            // A failed re-upload keeps the image already in place.
            (SessionState::ImageReady, SessionEvent::ImageUploaded)
            | (SessionState::ImageReady, SessionEvent::UploadFailed) => SessionState::ImageReady,
            (SessionState::ImageReady, SessionEvent::QuerySubmitted) => {
                SessionState::AwaitingResponse
            }
            (SessionState::AwaitingResponse, SessionEvent::ResponseReceived)
            | (SessionState::AwaitingResponse, SessionEvent::ResponseFailed) => {
                SessionState::ImageReady
            }
            _ => {
                warn!(
                    "Invalid session transition from {:?} with event {:?}",
                    old_state, event
                );
                return Err(Error::InvalidTransition {
                    current: old_state.to_string(),
                    requested: format!("{event:?}"),
                });
            }
        };

        if old_state != new_state {
            info!(
                "Session state transition: {:?} -> {:?} (event: {:?})",
                old_state, new_state, event
            );
        } else {
            debug!("Session staying in state {:?} after event {:?}", old_state, event);
        }

        self.state = new_state;
        Ok(new_state)
    }
}

impl Default for SessionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
