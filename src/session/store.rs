use super::{Session, SessionNotifier, SessionView};
use crate::{Error, Result};
use std::{
    collections::HashMap,
    sync::{Arc, RwLock, Weak},
};
use tokio::sync::{Mutex, OwnedMutexGuard, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Owns one session. The mutex serialises that session's event handlers; the
/// notifier is reachable without it.
pub struct SessionHandle {
    id: Uuid,
    session: Arc<Mutex<Session>>,
    notifier: SessionNotifier,
}

impl SessionHandle {
    fn new(id: Uuid) -> Self {
        let session = Session::new(id);
        let notifier = session.notifier().clone();
        Self {
            id,
            session: Arc::new(Mutex::new(session)),
            notifier,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Locks the session, failing immediately if another event for the same
    /// session is still being handled. The guard is owned so a turn can
    /// outlive the request that started it.
    pub fn try_lock(&self) -> Result<OwnedMutexGuard<Session>> {
        Arc::clone(&self.session)
            .try_lock_owned()
            .map_err(|_| Error::SessionBusy {
                session_id: self.id.to_string(),
            })
    }

    pub fn view(&self) -> SessionView {
        self.notifier.current()
    }

    pub fn notifier(&self) -> &SessionNotifier {
        &self.notifier
    }
}

#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Arc<SessionHandle>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self) -> Result<Arc<SessionHandle>> {
        let id = Uuid::new_v4();
        let handle = Arc::new(SessionHandle::new(id));

        let mut sessions = self
            .sessions
            .write()
            .map_err(|e| Error::internal(format!("Session store lock failed: {e}")))?;
        sessions.insert(id, Arc::clone(&handle));

        info!("Created session {} ({} active)", id, sessions.len());
        Ok(handle)
    }

    pub fn get(&self, session_id: &str) -> Result<Arc<SessionHandle>> {
        let not_found = || Error::SessionNotFound {
            session_id: session_id.to_string(),
        };
        let id = Uuid::parse_str(session_id).map_err(|_| not_found())?;

        let sessions = self
            .sessions
            .read()
            .map_err(|e| Error::internal(format!("Session store lock failed: {e}")))?;
        sessions.get(&id).cloned().ok_or_else(not_found)
    }

    /// Ends a session. Its image and transcript are dropped once the last
    /// in-flight handler releases its handle.
    pub fn remove(&self, session_id: &str) -> Result<()> {
        let handle = self.get(session_id)?;

        let mut sessions = self
            .sessions
            .write()
            .map_err(|e| Error::internal(format!("Session store lock failed: {e}")))?;
        sessions.remove(&handle.id());

        debug!("Removed session {} ({} active)", handle.id(), sessions.len());
        Ok(())
    }

    /// Follows a session's snapshots. When the last subscription of a session
    /// goes away the session is torn down.
    pub fn subscribe(self: &Arc<Self>, session_id: &str) -> Result<Subscription> {
        let handle = self.get(session_id)?;
        debug!(
            "Session {} gained a subscriber ({} before)",
            handle.id(),
            handle.notifier().subscriber_count()
        );

        Ok(Subscription {
            receiver: Some(handle.notifier().subscribe()),
            notifier: handle.notifier().clone(),
            store: Arc::downgrade(self),
            id: handle.id(),
        })
    }

    fn release(&self, subscription: &Subscription) {
        let Ok(mut sessions) = self.sessions.write() else {
            warn!("Session store lock poisoned, keeping session {}", subscription.id);
            return;
        };

        if subscription.notifier.subscriber_count() == 0
            && sessions.remove(&subscription.id).is_some()
        {
            info!(
                "Session {} lost its last subscriber and was torn down ({} active)",
                subscription.id,
                sessions.len()
            );
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A live feed of one session's [`SessionView`] snapshots.
pub struct Subscription {
    receiver: Option<watch::Receiver<SessionView>>,
    notifier: SessionNotifier,
    store: Weak<SessionStore>,
    id: Uuid,
}

impl Subscription {
    pub fn session_id(&self) -> Uuid {
        self.id
    }

    /// Waits for the next published snapshot. `None` once the session is gone.
    pub async fn next(&mut self) -> Option<SessionView> {
        let receiver = self.receiver.as_mut()?;
        receiver.changed().await.ok()?;
        Some(receiver.borrow_and_update().clone())
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // Release the receiver first so the count below excludes this one.
        self.receiver.take();
        if let Some(store) = self.store.upgrade() {
            store.release(self);
        }
    }
}
