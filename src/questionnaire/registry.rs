//! Session registry: live questionnaire sessions keyed by id.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::answers::CompletedAnswers;
use super::question::QuestionSet;
use super::session::{Operation, Questionnaire, SessionPhase, SessionView};
use crate::error::QuestionnaireError;

/// How often the prune task sweeps for idle sessions.
const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

struct Entry {
    questionnaire: Questionnaire,
    touched_at: Instant,
}

/// In-memory registry of questionnaire sessions.
///
/// Each session is mutated only while the write lock is held, so operations
/// on a session always run to completion one at a time.
pub struct SessionRegistry {
    questions: Arc<QuestionSet>,
    sessions: RwLock<HashMap<Uuid, Entry>>,
    idle_timeout: Duration,
}

impl SessionRegistry {
    pub fn new(questions: Arc<QuestionSet>, idle_timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            questions,
            sessions: RwLock::new(HashMap::new()),
            idle_timeout,
        })
    }

    pub fn questions(&self) -> &Arc<QuestionSet> {
        &self.questions
    }

    /// Create a new session in `NotStarted`.
    pub async fn create(&self) -> (Uuid, SessionView) {
        let id = Uuid::new_v4();
        let questionnaire = Questionnaire::new(Arc::clone(&self.questions));
        let view = questionnaire.view();
        self.sessions.write().await.insert(
            id,
            Entry {
                questionnaire,
                touched_at: Instant::now(),
            },
        );
        info!(session_id = %id, "Questionnaire session created");
        (id, view)
    }

    pub async fn view(&self, id: Uuid) -> Option<SessionView> {
        let sessions = self.sessions.read().await;
        sessions.get(&id).map(|e| e.questionnaire.view())
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Run one operation against a session and return its result with the
    /// resulting view. `None` if the session does not exist.
    ///
    /// Sessions that end in `Cancelled` are dropped from the registry.
    pub async fn apply<T>(
        &self,
        id: Uuid,
        op: impl FnOnce(&mut Questionnaire) -> Result<T, QuestionnaireError>,
    ) -> Option<(Result<T, QuestionnaireError>, SessionView)> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(&id)?;
        entry.touched_at = Instant::now();

        let result = op(&mut entry.questionnaire);
        let view = entry.questionnaire.view();

        match &result {
            Ok(_) => debug!(session_id = %id, phase = %view.phase, index = ?view.index, "Questionnaire updated"),
            Err(e) => debug!(session_id = %id, error = %e, "Questionnaire operation refused"),
        }

        if view.phase == SessionPhase::Cancelled {
            sessions.remove(&id);
            info!(session_id = %id, "Questionnaire session cancelled");
        }

        Some((result, view))
    }

    /// Remove a completed session and hand its answers off by value.
    ///
    /// A session that is not yet completed stays registered and the call
    /// fails with an invalid-transition fault.
    pub async fn take_completed(
        &self,
        id: Uuid,
    ) -> Option<Result<CompletedAnswers, QuestionnaireError>> {
        let mut sessions = self.sessions.write().await;
        let phase = sessions.get(&id)?.questionnaire.phase();
        if phase != SessionPhase::Completed {
            return Some(Err(QuestionnaireError::InvalidTransition {
                operation: Operation::TakeAnswers,
                phase,
            }));
        }
        let entry = sessions.remove(&id)?;
        info!(session_id = %id, "Questionnaire answers handed off");
        Some(entry.questionnaire.into_completed())
    }

    /// Drop sessions untouched for longer than the idle timeout, returning
    /// their ids. Answers held by a pruned session are discarded.
    pub async fn prune_idle(&self) -> Vec<Uuid> {
        let mut sessions = self.sessions.write().await;
        let timeout = self.idle_timeout;
        let stale: Vec<Uuid> = sessions
            .iter()
            .filter(|(_, e)| e.touched_at.elapsed() > timeout)
            .map(|(id, _)| *id)
            .collect();
        for id in &stale {
            if let Some(entry) = sessions.remove(id) {
                info!(
                    session_id = %id,
                    phase = %entry.questionnaire.phase(),
                    discarded_answers = entry.questionnaire.answered_count(),
                    "Pruned idle questionnaire session"
                );
            }
        }
        stale
    }
}

/// Spawn a background task that periodically prunes idle sessions.
pub fn spawn_prune_task(registry: Arc<SessionRegistry>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PRUNE_INTERVAL);
        loop {
            interval.tick().await;
            registry.prune_idle().await;
        }
    })
}
