use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::NaiveDate;
use uuid::Uuid;

use sarovar_analysis::ModuleRegistry;
use sarovar_core::ports::ComputeBackend;
use sarovar_session::{Orchestrator, SessionOptions};

/// One dashboard session, locked while a blocking step runs.
pub type SharedSession = Arc<Mutex<Orchestrator>>;

#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn ComputeBackend>,
    pub registry: Arc<ModuleRegistry>,
    pub options: SessionOptions,
    /// Fixed date for parameter defaults; the local date otherwise.
    pub today: Option<NaiveDate>,
    sessions: Arc<RwLock<HashMap<Uuid, SharedSession>>>,
}

impl AppState {
    pub fn new(backend: Arc<dyn ComputeBackend>, registry: Arc<ModuleRegistry>, options: SessionOptions) -> Self {
        Self { backend, registry, options, today: None, sessions: Arc::default() }
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Open a fresh session and return its id.
    pub fn create_session(&self) -> Uuid {
        let mut orchestrator =
            Orchestrator::new(self.backend.clone(), self.registry.clone(), self.options.clone());
        if let Some(today) = self.today {
            orchestrator = orchestrator.with_today(today);
        }

        let id = Uuid::new_v4();
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(Mutex::new(orchestrator)));
        id
    }

    pub fn session(&self, id: Uuid) -> Option<SharedSession> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).get(&id).cloned()
    }

    /// Drop a session. Returns false if it did not exist.
    pub fn remove_session(&self, id: Uuid) -> bool {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner).remove(&id).is_some()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}
