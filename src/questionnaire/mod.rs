//! Destiny questionnaire.
//!
//! A fixed, ordered set of questions is answered one at a time. Each answer
//! is coerced and validated before the cursor moves on; once the final
//! question is accepted the collected answers are handed off exactly once as
//! a `CompletedAnswers` value that converts into a `PredictionRequest`.

pub mod answers;
pub mod question;
pub mod registry;
pub mod routes;
pub mod session;

pub use answers::CompletedAnswers;
pub use question::{
    AnswerValue, DESTINY_COUNTRIES, InputKind, Question, QuestionId, QuestionSet, Rule,
};
pub use registry::{SessionRegistry, spawn_prune_task};
pub use routes::{QuestionnaireRouteState, questionnaire_routes};
pub use session::{
    AdvanceOutcome, Operation, Questionnaire, RetreatOutcome, SessionPhase, SessionView,
};
