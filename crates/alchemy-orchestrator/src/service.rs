//! Persistent, resumable sessions on top of the controller.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use alchemy_models::{SessionId, SessionRecord, SessionState};
use alchemy_persistence::{PersistenceError, SessionStore};
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::controller::SessionController;
use crate::error::{OrchestratorError, Result};

/// Default idle time after which a session is forgotten.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Creates, resumes and edits sessions, persisting each step.
///
/// Calls for the same session id are serialized; different sessions run
/// concurrently.
pub struct SessionService {
    controller: SessionController,
    store: Arc<dyn SessionStore>,
    locks: Mutex<HashMap<SessionId, Arc<Mutex<()>>>>,
    ttl: Option<chrono::Duration>,
}

impl SessionService {
    /// Create a service with the default session TTL.
    pub fn new(controller: SessionController, store: Arc<dyn SessionStore>) -> Self {
        Self {
            controller,
            store,
            locks: Mutex::new(HashMap::new()),
            ttl: chrono::Duration::from_std(DEFAULT_SESSION_TTL).ok(),
        }
    }

    /// Set the idle TTL. `None` keeps sessions forever.
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl.and_then(|ttl| chrono::Duration::from_std(ttl).ok());
        self
    }

    /// The underlying controller.
    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    /// Start a session for `description`.
    pub async fn create(&self, description: &str) -> Result<SessionState> {
        let description = description.trim();
        if description.is_empty() {
            return Err(OrchestratorError::InvalidRequest(
                "description must not be empty".into(),
            ));
        }

        let id = SessionId::new();
        let lock = self.lock_for(&id).await;
        let _guard = lock.lock().await;

        let state = self.controller.start(id, description).await;
        self.store.save(&SessionRecord::new(state.clone()))?;
        info!(session_id = %state.id, status = %state.status, "Session created");
        Ok(state)
    }

    /// Deliver a clarification reply and continue the session.
    pub async fn send_message(&self, id: &SessionId, message: &str) -> Result<SessionState> {
        let lock = self.lock_for(id).await;
        let _guard = lock.lock().await;

        let record = self.load_live(id)?;
        let state = self.controller.resume(record.state.clone(), message).await?;
        self.store.save(&record.update(state.clone()))?;
        Ok(state)
    }

    /// Current state of a session, without advancing it.
    pub async fn get(&self, id: &SessionId) -> Result<SessionState> {
        let lock = self.lock_for(id).await;
        let _guard = lock.lock().await;

        Ok(self.load_live(id)?.state)
    }

    /// Send reviewer-style feedback on a finished component.
    pub async fn edit(&self, id: &SessionId, feedback: &str) -> Result<SessionState> {
        let lock = self.lock_for(id).await;
        let _guard = lock.lock().await;

        let record = self.load_live(id)?;
        let state = self.controller.edit(record.state.clone(), feedback).await?;
        self.store.save(&record.update(state.clone()))?;
        Ok(state)
    }

    /// Remove every expired session. Returns how many were removed.
    pub async fn purge_expired(&self) -> Result<usize> {
        let Some(ttl) = self.ttl else {
            return Ok(0);
        };

        let now = Utc::now();
        let mut removed = 0;
        for id in self.store.list_ids()? {
            let lock = self.lock_for(&id).await;
            let _guard = lock.lock().await;

            match self.store.load(&id) {
                Ok(record) if record.is_expired(ttl, now) => {
                    self.store.delete(&id)?;
                    removed += 1;
                }
                Ok(_) | Err(PersistenceError::NotFound(_)) => {}
                Err(e) => warn!(session_id = %id, error = %e, "Skipping unreadable session"),
            }
        }

        if removed > 0 {
            info!(removed, "Purged expired sessions");
        }
        Ok(removed)
    }

    fn load_live(&self, id: &SessionId) -> Result<SessionRecord> {
        let record = match self.store.load(id) {
            Ok(record) => record,
            Err(PersistenceError::NotFound(_)) | Err(PersistenceError::InvalidId(_)) => {
                return Err(OrchestratorError::SessionNotFound(id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(ttl) = self.ttl {
            if record.is_expired(ttl, Utc::now()) {
                debug!(session_id = %id, "Session expired");
                self.store.delete(id)?;
                return Err(OrchestratorError::SessionNotFound(id.to_string()));
            }
        }
        Ok(record)
    }

    async fn lock_for(&self, id: &SessionId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        Arc::clone(
            locks
                .entry(id.clone())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ControllerConfig;
    use alchemy_agent::testing::{MockGateway, Reply};
    use alchemy_models::Status;
    use alchemy_persistence::{FileSessionStore, MemorySessionStore};
    use serde_json::json;
    use tempfile::tempdir;

    fn component_args() -> serde_json::Value {
        json!({
            "install_script": "npm install @mui/material",
            "imports": "import Button from '@mui/material/Button';",
            "code": "export default function MUIComponent() { return <Button>Save</Button>; }",
            "description": "A Save button",
        })
    }

    fn service(gateway: &Arc<MockGateway>, store: Arc<dyn SessionStore>) -> SessionService {
        let controller = SessionController::new(gateway.clone(), ControllerConfig::default());
        SessionService::new(controller, store)
    }

    #[tokio::test]
    async fn test_create_rejects_blank_description() {
        let gateway = Arc::new(MockGateway::default());
        let service = service(&gateway, Arc::new(MemorySessionStore::new()));

        let result = service.create("   ").await;
        assert!(matches!(result, Err(OrchestratorError::InvalidRequest(_))));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_session_not_found() {
        let gateway = Arc::new(MockGateway::default());
        let service = service(&gateway, Arc::new(MemorySessionStore::new()));

        let result = service
            .send_message(&SessionId::from("missing"), "hello")
            .await;
        assert!(matches!(result, Err(OrchestratorError::SessionNotFound(_))));

        let result = service.get(&SessionId::from("../etc")).await;
        assert!(matches!(result, Err(OrchestratorError::SessionNotFound(_))));
    }

    #[tokio::test]
    async fn test_resume_after_restart() {
        let dir = tempdir().unwrap();

        let first = Arc::new(MockGateway::new(vec![
            Reply::text("no"),
            Reply::text("What color should it be?"),
        ]));
        let state = service(&first, Arc::new(FileSessionStore::new(dir.path())))
            .create("Create a button")
            .await
            .unwrap();
        assert!(state.awaiting_input());

        // A fresh service over the same directory stands in for a new process.
        let second = Arc::new(MockGateway::new(vec![
            Reply::text("yes"),
            Reply::tool(component_args()),
            Reply::text("yes"),
        ]));
        let restarted = service(&second, Arc::new(FileSessionStore::new(dir.path())));
        let resumed = restarted
            .send_message(&state.id, "blue, rounded, says Save")
            .await
            .unwrap();

        assert_eq!(resumed.status, Status::Success);
        assert_eq!(
            resumed.component_request,
            "Create a button blue, rounded, says Save"
        );
        assert_eq!(resumed.conversation_history.len(), 1);

        let stored = restarted.get(&state.id).await.unwrap();
        assert_eq!(stored, resumed);
    }

    #[tokio::test]
    async fn test_expired_session_is_removed() {
        let gateway = Arc::new(MockGateway::new(vec![
            Reply::text("no"),
            Reply::text("Which data?"),
        ]));
        let store = Arc::new(MemorySessionStore::new());
        let service = service(&gateway, store.clone()).with_ttl(Some(Duration::ZERO));

        let state = service.create("Make a chart").await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        let result = service.get(&state.id).await;
        assert!(matches!(result, Err(OrchestratorError::SessionNotFound(_))));
        assert!(store.list_ids().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let gateway = Arc::new(MockGateway::new(vec![
            Reply::text("no"),
            Reply::text("Which data?"),
        ]));
        let store = Arc::new(MemorySessionStore::new());
        let service = service(&gateway, store.clone()).with_ttl(Some(Duration::ZERO));

        service.create("Make a chart").await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert_eq!(service.purge_expired().await.unwrap(), 1);
        assert!(store.list_ids().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_purge_skips_unreadable_files() {
        let dir = tempdir().unwrap();
        let sessions = dir.path().join("sessions");
        std::fs::create_dir_all(&sessions).unwrap();
        std::fs::write(sessions.join("notes copy.json"), "{}").unwrap();
        std::fs::write(sessions.join("corrupt.json"), "not json").unwrap();

        let gateway = Arc::new(MockGateway::new(vec![
            Reply::text("no"),
            Reply::text("Which data?"),
        ]));
        let store = Arc::new(FileSessionStore::new(dir.path()));
        let service = service(&gateway, store.clone()).with_ttl(Some(Duration::ZERO));

        service.create("Make a chart").await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert_eq!(service.purge_expired().await.unwrap(), 1);
        assert_eq!(store.list_ids().unwrap(), vec![SessionId::from("corrupt")]);
    }

    #[tokio::test]
    async fn test_edit_persists_new_round() {
        let gateway = Arc::new(MockGateway::new(vec![
            Reply::text("yes"),
            Reply::tool(component_args()),
            Reply::text("yes"),
            Reply::tool(component_args()),
            Reply::text("yes"),
        ]));
        let service = service(&gateway, Arc::new(MemorySessionStore::new()));

        let state = service.create("A blue Save button").await.unwrap();
        let edited = service.edit(&state.id, "Make it red").await.unwrap();

        assert_eq!(edited.status, Status::Success);
        assert_eq!(edited.validation_attempts, 2);
        assert_eq!(service.get(&state.id).await.unwrap(), edited);
    }

    #[tokio::test]
    async fn test_concurrent_replies_are_serialized() {
        let gateway = Arc::new(MockGateway::new(vec![
            Reply::text("no"),
            Reply::text("Which colors?"),
        ]));
        let service = Arc::new(service(&gateway, Arc::new(MemorySessionStore::new())));
        let state = service.create("Make a chart").await.unwrap();

        gateway.push(Reply::text("no"));
        gateway.push(Reply::text("Anything else?"));

        let a = tokio::spawn({
            let service = Arc::clone(&service);
            let id = state.id.clone();
            async move { service.send_message(&id, "pink").await }
        });
        let b = tokio::spawn({
            let service = Arc::clone(&service);
            let id = state.id.clone();
            async move { service.send_message(&id, "white").await }
        });

        let results = [a.await.unwrap(), b.await.unwrap()];
        let ok = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(ok, 2);

        let stored = service.get(&state.id).await.unwrap();
        assert_eq!(stored.conversation_history.len(), 2);
    }
}
