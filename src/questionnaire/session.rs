//! Questionnaire state machine. Walks a fixed question set one answer at a time.
//!
//! Progresses NotStarted → Active(0) → … → Active(n-1) → Completed, with
//! `retreat` stepping back (Active(0) → NotStarted) and `cancel` abandoning
//! the session from any non-terminal state.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::answers::CompletedAnswers;
use super::question::{AnswerValue, Question, QuestionId, QuestionSet};
use crate::error::QuestionnaireError;

/// Observable state tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    NotStarted,
    Active,
    Completed,
    Cancelled,
}

impl SessionPhase {
    /// Whether this phase is terminal (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NotStarted => "not_started",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// Operations a caller can invoke. Named in invalid-transition faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Start,
    SetPendingValue,
    Advance,
    Retreat,
    Cancel,
    TakeAnswers,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Start => "start",
            Self::SetPendingValue => "set_pending_value",
            Self::Advance => "advance",
            Self::Retreat => "retreat",
            Self::Cancel => "cancel",
            Self::TakeAnswers => "take_answers",
        };
        write!(f, "{s}")
    }
}

/// Result of a successful `advance` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// Input failed coercion or validation; still on the same question.
    Rejected { message: String },
    /// Moved on to the question at `index`.
    Next { index: usize },
    /// Final question accepted.
    Completed,
}

/// Result of a successful `retreat` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetreatOutcome {
    Previous { index: usize },
    NotStarted,
}

#[derive(Debug, Clone)]
enum State {
    NotStarted,
    Active(usize),
    Completed(CompletedAnswers),
    Cancelled,
}

/// One questionnaire attempt.
///
/// Owns its answers exclusively; every read goes through the accessors and
/// every mutation through the transition methods.
#[derive(Debug, Clone)]
pub struct Questionnaire {
    questions: Arc<QuestionSet>,
    state: State,
    collected: HashMap<QuestionId, AnswerValue>,
    pending: String,
    last_error: Option<String>,
}

impl Questionnaire {
    pub fn new(questions: Arc<QuestionSet>) -> Self {
        Self {
            questions,
            state: State::NotStarted,
            collected: HashMap::new(),
            pending: String::new(),
            last_error: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        match self.state {
            State::NotStarted => SessionPhase::NotStarted,
            State::Active(_) => SessionPhase::Active,
            State::Completed(_) => SessionPhase::Completed,
            State::Cancelled => SessionPhase::Cancelled,
        }
    }

    /// Index of the displayed question, when active.
    pub fn current_index(&self) -> Option<usize> {
        match self.state {
            State::Active(i) => Some(i),
            _ => None,
        }
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.current_index().and_then(|i| self.questions.get(i))
    }

    pub fn questions(&self) -> &QuestionSet {
        &self.questions
    }

    pub fn pending_value(&self) -> &str {
        &self.pending
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// A committed answer, while the session is still collecting.
    pub fn answer(&self, id: QuestionId) -> Option<&AnswerValue> {
        self.collected.get(&id)
    }

    pub fn answered_count(&self) -> usize {
        self.collected.len()
    }

    pub fn completed(&self) -> Option<&CompletedAnswers> {
        match &self.state {
            State::Completed(answers) => Some(answers),
            _ => None,
        }
    }

    fn invalid(&self, operation: Operation) -> QuestionnaireError {
        QuestionnaireError::InvalidTransition {
            operation,
            phase: self.phase(),
        }
    }

    /// Raw form of the committed answer at `index`, or empty.
    fn restored_pending(&self, index: usize) -> String {
        self.questions
            .get(index)
            .and_then(|q| self.collected.get(&q.id))
            .map(AnswerValue::to_raw)
            .unwrap_or_default()
    }

    /// NotStarted → Active(0).
    pub fn start(&mut self) -> Result<(), QuestionnaireError> {
        match self.state {
            State::NotStarted => {
                self.pending = self.restored_pending(0);
                self.last_error = None;
                self.state = State::Active(0);
                Ok(())
            }
            _ => Err(self.invalid(Operation::Start)),
        }
    }

    /// Stage a raw value for the current question.
    pub fn set_pending_value(&mut self, raw: impl Into<String>) -> Result<(), QuestionnaireError> {
        match self.state {
            State::Active(_) => {
                self.pending = raw.into();
                self.last_error = None;
                Ok(())
            }
            _ => Err(self.invalid(Operation::SetPendingValue)),
        }
    }

    /// Validate and commit the pending value, then move forward.
    pub fn advance(&mut self) -> Result<AdvanceOutcome, QuestionnaireError> {
        let index = match self.state {
            State::Active(i) => i,
            _ => return Err(self.invalid(Operation::Advance)),
        };
        let Some(question) = self.questions.get(index) else {
            return Err(self.invalid(Operation::Advance));
        };

        let Some(value) = question.accept(&self.pending) else {
            let message = question.invalid_message.clone();
            self.last_error = Some(message.clone());
            return Ok(AdvanceOutcome::Rejected { message });
        };

        self.collected.insert(question.id, value);
        self.last_error = None;
        self.pending.clear();

        let next = index + 1;
        if next >= self.questions.len() {
            let values: BTreeMap<_, _> = self
                .questions
                .ids()
                .filter_map(|id| self.collected.remove(&id).map(|v| (id, v)))
                .collect();
            debug_assert_eq!(values.len(), self.questions.len());
            self.collected.clear();
            self.state = State::Completed(CompletedAnswers::new(values));
            return Ok(AdvanceOutcome::Completed);
        }

        self.pending = self.restored_pending(next);
        self.state = State::Active(next);
        Ok(AdvanceOutcome::Next { index: next })
    }

    /// Step back one question, or out to NotStarted from the first.
    ///
    /// Uncommitted edits on the current question are dropped; committed
    /// answers are kept.
    pub fn retreat(&mut self) -> Result<RetreatOutcome, QuestionnaireError> {
        let index = match self.state {
            State::Active(i) => i,
            _ => return Err(self.invalid(Operation::Retreat)),
        };
        self.last_error = None;

        if index == 0 {
            self.pending.clear();
            self.state = State::NotStarted;
            return Ok(RetreatOutcome::NotStarted);
        }

        let previous = index - 1;
        self.pending = self.restored_pending(previous);
        self.state = State::Active(previous);
        Ok(RetreatOutcome::Previous { index: previous })
    }

    /// Abandon the session, discarding every collected answer.
    pub fn cancel(&mut self) -> Result<(), QuestionnaireError> {
        match self.state {
            State::NotStarted | State::Active(_) => {
                self.collected.clear();
                self.pending.clear();
                self.last_error = None;
                self.state = State::Cancelled;
                Ok(())
            }
            _ => Err(self.invalid(Operation::Cancel)),
        }
    }

    /// Hand the completed answers off by value, consuming the session.
    pub fn into_completed(self) -> Result<CompletedAnswers, QuestionnaireError> {
        match self.state {
            State::Completed(answers) => Ok(answers),
            _ => Err(self.invalid(Operation::TakeAnswers)),
        }
    }

    /// Snapshot for the presentation surface.
    pub fn view(&self) -> SessionView {
        SessionView {
            phase: self.phase(),
            index: self.current_index(),
            total: self.questions.len(),
            question: self.current_question().cloned(),
            pending_value: self.pending.clone(),
            last_error: self.last_error.clone(),
            answers: self.completed().cloned(),
        }
    }
}

/// Serializable snapshot of a questionnaire.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub phase: SessionPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<Question>,
    pub pending_value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answers: Option<CompletedAnswers>,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// name (text, ≥2 chars) then age (16–80).
    fn two_questions() -> Arc<QuestionSet> {
        Arc::new(
            QuestionSet::new(vec![
                Question::text(QuestionId::Name, "Name?", 2, 50)
                    .with_invalid_message("Name too short"),
                Question::number(QuestionId::Age, "Age?", 16, 80)
                    .with_invalid_message("Age must be 16-80"),
            ])
            .unwrap(),
        )
    }

    fn started() -> Questionnaire {
        let mut q = Questionnaire::new(two_questions());
        q.start().unwrap();
        q
    }

    fn answer(q: &mut Questionnaire, raw: &str) -> AdvanceOutcome {
        q.set_pending_value(raw).unwrap();
        q.advance().unwrap()
    }

    #[test]
    fn initial_state() {
        let q = Questionnaire::new(two_questions());
        assert_eq!(q.phase(), SessionPhase::NotStarted);
        assert_eq!(q.current_index(), None);
        assert_eq!(q.pending_value(), "");
        assert!(q.last_error().is_none());
        assert_eq!(q.answered_count(), 0);
    }

    #[test]
    fn scenario_a_walks_to_completion() {
        let mut q = started();
        assert_eq!(q.phase(), SessionPhase::Active);
        assert_eq!(q.current_index(), Some(0));

        assert_eq!(answer(&mut q, "Al"), AdvanceOutcome::Next { index: 1 });
        assert_eq!(q.current_index(), Some(1));
        assert_eq!(q.answer(QuestionId::Name), Some(&AnswerValue::Text("Al".into())));
        assert_eq!(q.answered_count(), 1);

        let outcome = answer(&mut q, "15");
        assert_eq!(
            outcome,
            AdvanceOutcome::Rejected {
                message: "Age must be 16-80".into()
            }
        );
        assert_eq!(q.current_index(), Some(1));
        assert_eq!(q.last_error(), Some("Age must be 16-80"));
        assert_eq!(q.pending_value(), "15");

        assert_eq!(answer(&mut q, "20"), AdvanceOutcome::Completed);
        assert_eq!(q.phase(), SessionPhase::Completed);
        let done = q.completed().unwrap();
        assert_eq!(done.len(), 2);
        assert_eq!(done.get(QuestionId::Name), Some(&AnswerValue::Text("Al".into())));
        assert_eq!(done.get(QuestionId::Age), Some(&AnswerValue::Integer(20)));
    }

    #[test]
    fn scenario_b_short_name_is_rejected() {
        let mut q = started();
        let outcome = answer(&mut q, "A");
        assert!(matches!(outcome, AdvanceOutcome::Rejected { .. }));
        assert_eq!(q.current_index(), Some(0));
        assert_eq!(q.last_error(), Some("Name too short"));

        assert_eq!(answer(&mut q, "Anna"), AdvanceOutcome::Next { index: 1 });
        assert!(q.last_error().is_none());
    }

    #[test]
    fn scenario_c_retreat_restores_then_exits() {
        let mut q = started();
        answer(&mut q, "Al");
        assert_eq!(q.retreat().unwrap(), RetreatOutcome::Previous { index: 0 });
        assert_eq!(q.current_index(), Some(0));
        assert_eq!(q.pending_value(), "Al");

        assert_eq!(q.retreat().unwrap(), RetreatOutcome::NotStarted);
        assert_eq!(q.phase(), SessionPhase::NotStarted);
    }

    #[test]
    fn scenario_d_cancel_then_every_transition_faults() {
        let mut q = started();
        answer(&mut q, "Al");
        q.cancel().unwrap();
        assert_eq!(q.phase(), SessionPhase::Cancelled);
        assert_eq!(q.answered_count(), 0);

        let err = q.advance().unwrap_err();
        assert_eq!(
            err,
            QuestionnaireError::InvalidTransition {
                operation: Operation::Advance,
                phase: SessionPhase::Cancelled,
            }
        );
        assert!(matches!(
            q.retreat().unwrap_err(),
            QuestionnaireError::InvalidTransition {
                operation: Operation::Retreat,
                ..
            }
        ));
        assert!(q.start().is_err());
        assert!(q.set_pending_value("x").is_err());
        assert!(q.cancel().is_err());
    }

    #[test]
    fn cancel_from_not_started() {
        let mut q = Questionnaire::new(two_questions());
        q.cancel().unwrap();
        assert_eq!(q.phase(), SessionPhase::Cancelled);
    }

    #[test]
    fn operations_before_start_fault() {
        let mut q = Questionnaire::new(two_questions());
        assert!(matches!(
            q.advance(),
            Err(QuestionnaireError::InvalidTransition {
                operation: Operation::Advance,
                phase: SessionPhase::NotStarted,
            })
        ));
        assert!(q.retreat().is_err());
        assert!(q.set_pending_value("Al").is_err());
        assert_eq!(q.phase(), SessionPhase::NotStarted);
    }

    #[test]
    fn start_twice_faults() {
        let mut q = started();
        assert!(matches!(
            q.start(),
            Err(QuestionnaireError::InvalidTransition {
                operation: Operation::Start,
                phase: SessionPhase::Active,
            })
        ));
    }

    #[test]
    fn completed_state_rejects_further_navigation() {
        let mut q = started();
        answer(&mut q, "Al");
        answer(&mut q, "20");
        assert!(q.retreat().is_err());
        assert!(q.advance().is_err());
        assert!(q.cancel().is_err());
        assert!(q.set_pending_value("x").is_err());
        assert_eq!(q.phase(), SessionPhase::Completed);
    }

    #[test]
    fn only_last_pending_value_is_validated() {
        let mut q = started();
        q.set_pending_value("A").unwrap();
        q.set_pending_value("").unwrap();
        q.set_pending_value("Bob").unwrap();
        assert_eq!(q.advance().unwrap(), AdvanceOutcome::Next { index: 1 });
        assert_eq!(q.answer(QuestionId::Name), Some(&AnswerValue::Text("Bob".into())));

        q.set_pending_value("25").unwrap();
        q.set_pending_value("99").unwrap();
        assert!(matches!(q.advance().unwrap(), AdvanceOutcome::Rejected { .. }));
    }

    #[test]
    fn set_pending_value_clears_error() {
        let mut q = started();
        answer(&mut q, "A");
        assert!(q.last_error().is_some());
        q.set_pending_value("Ann").unwrap();
        assert!(q.last_error().is_none());
    }

    #[test]
    fn coercion_failure_is_a_validation_failure() {
        let mut q = started();
        answer(&mut q, "Al");
        let outcome = answer(&mut q, "twenty");
        assert_eq!(
            outcome,
            AdvanceOutcome::Rejected {
                message: "Age must be 16-80".into()
            }
        );
        assert_eq!(q.phase(), SessionPhase::Active);
        assert_eq!(q.pending_value(), "twenty");
    }

    #[test]
    fn retreat_then_advance_reproduces_committed_value() {
        let mut q = started();
        answer(&mut q, "Al");
        q.retreat().unwrap();
        assert_eq!(q.advance().unwrap(), AdvanceOutcome::Next { index: 1 });
        assert_eq!(q.answer(QuestionId::Name), Some(&AnswerValue::Text("Al".into())));
    }

    #[test]
    fn revisit_is_revalidated_after_edit() {
        let mut q = started();
        answer(&mut q, "Al");
        q.retreat().unwrap();
        let outcome = answer(&mut q, "A");
        assert!(matches!(outcome, AdvanceOutcome::Rejected { .. }));
        assert_eq!(q.current_index(), Some(0));
        // The earlier committed value stays until a valid replacement lands.
        assert_eq!(q.answer(QuestionId::Name), Some(&AnswerValue::Text("Al".into())));

        assert_eq!(answer(&mut q, "Alice"), AdvanceOutcome::Next { index: 1 });
        assert_eq!(q.answer(QuestionId::Name), Some(&AnswerValue::Text("Alice".into())));
    }

    #[test]
    fn advance_restores_later_answer_when_revisiting_forward() {
        let set = Arc::new(
            QuestionSet::new(vec![
                Question::text(QuestionId::Name, "Name?", 2, 50),
                Question::number(QuestionId::Age, "Age?", 16, 80),
                Question::text(QuestionId::College, "College?", 2, 100),
            ])
            .unwrap(),
        );
        let mut q = Questionnaire::new(set);
        q.start().unwrap();
        answer(&mut q, "Al");
        answer(&mut q, "30");
        q.retreat().unwrap();
        q.retreat().unwrap();
        assert_eq!(q.pending_value(), "Al");
        q.advance().unwrap();
        assert_eq!(q.pending_value(), "30");
    }

    #[test]
    fn restart_after_retreat_has_no_uncommitted_leakage() {
        let mut q = started();
        q.set_pending_value("Draft").unwrap();
        q.retreat().unwrap();
        assert_eq!(q.phase(), SessionPhase::NotStarted);
        q.start().unwrap();
        assert_eq!(q.current_index(), Some(0));
        assert_eq!(q.pending_value(), "");
    }

    #[test]
    fn retreat_clears_error() {
        let mut q = started();
        answer(&mut q, "Al");
        answer(&mut q, "5");
        assert!(q.last_error().is_some());
        q.retreat().unwrap();
        assert!(q.last_error().is_none());
    }

    #[test]
    fn last_question_goes_straight_to_completed() {
        let set = Arc::new(
            QuestionSet::new(vec![Question::number(QuestionId::Age, "Age?", 16, 80)]).unwrap(),
        );
        let mut q = Questionnaire::new(set);
        q.start().unwrap();
        assert_eq!(answer(&mut q, "40"), AdvanceOutcome::Completed);
        assert_eq!(q.current_index(), None);
        assert_eq!(q.phase(), SessionPhase::Completed);
    }

    #[test]
    fn into_completed_hands_off_answers() {
        let mut q = started();
        answer(&mut q, "Al");
        answer(&mut q, "20");
        let answers = q.into_completed().unwrap();
        assert_eq!(answers.len(), 2);
    }

    #[test]
    fn into_completed_before_completion_faults() {
        let q = started();
        assert!(matches!(
            q.into_completed(),
            Err(QuestionnaireError::InvalidTransition {
                operation: Operation::TakeAnswers,
                phase: SessionPhase::Active,
            })
        ));
    }

    #[test]
    fn full_walk_with_back_and_forth_yields_every_id() {
        let mut q = Questionnaire::new(QuestionSet::destiny());
        q.start().unwrap();
        answer(&mut q, "Priya");
        answer(&mut q, "22");
        q.retreat().unwrap();
        q.retreat().unwrap();
        q.advance().unwrap();
        q.advance().unwrap();
        answer(&mut q, "India");
        answer(&mut q, "IIT Delhi");
        q.retreat().unwrap();
        q.advance().unwrap();
        assert_eq!(answer(&mut q, "Data Scientist"), AdvanceOutcome::Completed);

        let set = QuestionSet::destiny();
        let done = q.completed().unwrap();
        assert_eq!(done.len(), set.len());
        for question in set.iter() {
            let value = done.get(question.id).unwrap();
            assert!(question.is_valid(value), "{} should be valid", question.id);
        }
    }

    #[test]
    fn view_reflects_state() {
        let mut q = started();
        q.set_pending_value("A").unwrap();
        q.advance().unwrap();
        let view = q.view();
        assert_eq!(view.phase, SessionPhase::Active);
        assert_eq!(view.index, Some(0));
        assert_eq!(view.total, 2);
        assert_eq!(view.question.as_ref().unwrap().id, QuestionId::Name);
        assert_eq!(view.last_error.as_deref(), Some("Name too short"));
        assert!(view.answers.is_none());

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["phase"], "active");
        assert_eq!(json["pending_value"], "A");
    }

    #[test]
    fn display_matches_serde() {
        for phase in [
            SessionPhase::NotStarted,
            SessionPhase::Active,
            SessionPhase::Completed,
            SessionPhase::Cancelled,
        ] {
            let json = serde_json::to_string(&phase).unwrap();
            assert_eq!(format!("\"{phase}\""), json);
        }
        assert!(SessionPhase::Completed.is_terminal());
        assert!(SessionPhase::Cancelled.is_terminal());
        assert!(!SessionPhase::Active.is_terminal());
    }
}
