//! Completed questionnaire output.

use std::collections::BTreeMap;

use serde::Serialize;

use super::question::{AnswerValue, QuestionId};
use crate::error::QuestionnaireError;
use crate::oracle::PredictionRequest;

/// Fully-populated answers, one typed value per question of the set.
///
/// Only built by the state machine once the final question validates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CompletedAnswers {
    values: BTreeMap<QuestionId, AnswerValue>,
}

impl CompletedAnswers {
    pub(crate) fn new(values: BTreeMap<QuestionId, AnswerValue>) -> Self {
        Self { values }
    }

    pub fn get(&self, id: QuestionId) -> Option<&AnswerValue> {
        self.values.get(&id)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (QuestionId, &AnswerValue)> {
        self.values.iter().map(|(id, v)| (*id, v))
    }

    fn take_text(&mut self, id: QuestionId) -> Result<String, QuestionnaireError> {
        match self.values.remove(&id) {
            Some(AnswerValue::Text(s)) => Ok(s),
            _ => Err(QuestionnaireError::MissingAnswer(id)),
        }
    }
}

impl TryFrom<CompletedAnswers> for PredictionRequest {
    type Error = QuestionnaireError;

    fn try_from(mut answers: CompletedAnswers) -> Result<Self, Self::Error> {
        let age = answers
            .values
            .remove(&QuestionId::Age)
            .and_then(|v| v.as_integer())
            .and_then(|n| u32::try_from(n).ok())
            .ok_or(QuestionnaireError::MissingAnswer(QuestionId::Age))?;

        Ok(PredictionRequest {
            name: answers.take_text(QuestionId::Name)?,
            age,
            country: answers.take_text(QuestionId::Country)?,
            college: answers.take_text(QuestionId::College)?,
            aspiration: answers.take_text(QuestionId::Aspiration)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full() -> BTreeMap<QuestionId, AnswerValue> {
        BTreeMap::from([
            (QuestionId::Name, AnswerValue::Text("Alex".into())),
            (QuestionId::Age, AnswerValue::Integer(25)),
            (QuestionId::Country, AnswerValue::Text("USA".into())),
            (QuestionId::College, AnswerValue::Text("MIT".into())),
            (QuestionId::Aspiration, AnswerValue::Text("AI Scientist".into())),
        ])
    }

    #[test]
    fn converts_into_prediction_request() {
        let req = PredictionRequest::try_from(CompletedAnswers::new(full())).unwrap();
        assert_eq!(req.name, "Alex");
        assert_eq!(req.age, 25);
        assert_eq!(req.country, "USA");
        assert_eq!(req.college, "MIT");
        assert_eq!(req.aspiration, "AI Scientist");
    }

    #[test]
    fn partial_answers_do_not_convert() {
        let mut values = full();
        values.remove(&QuestionId::College);
        let err = PredictionRequest::try_from(CompletedAnswers::new(values)).unwrap_err();
        assert_eq!(err, QuestionnaireError::MissingAnswer(QuestionId::College));
    }

    #[test]
    fn serializes_as_flat_record() {
        let answers = CompletedAnswers::new(BTreeMap::from([
            (QuestionId::Name, AnswerValue::Text("Al".into())),
            (QuestionId::Age, AnswerValue::Integer(20)),
        ]));
        let json = serde_json::to_value(&answers).unwrap();
        assert_eq!(json, serde_json::json!({"name": "Al", "age": 20}));
    }
}
