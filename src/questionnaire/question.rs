//! Question descriptors, validation rules and the immutable question set.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::QuestionnaireError;

/// Which field of the completed answers a question populates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionId {
    Name,
    Age,
    Country,
    College,
    Aspiration,
}

impl QuestionId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Age => "age",
            Self::Country => "country",
            Self::College => "college",
            Self::Aspiration => "aspiration",
        }
    }
}

impl std::fmt::Display for QuestionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How raw input for a question is coerced before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Text,
    Number,
    Choice,
}

/// A committed, correctly-typed answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Integer(i64),
    Text(String),
}

impl AnswerValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Integer(_) => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    /// Render the value back into the raw form the presentation surface edits.
    pub fn to_raw(&self) -> String {
        match self {
            Self::Integer(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

/// Acceptance rule for a coerced answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Rule {
    /// Trimmed text length in characters, inclusive bounds.
    TextLength { min: usize, max: usize },
    /// Integer value, inclusive bounds.
    IntegerRange { min: i64, max: i64 },
    /// Exact match against the question's choice list.
    OneOf,
}

/// Static question descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    pub id: QuestionId,
    pub prompt: String,
    pub input_kind: InputKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
    pub rule: Rule,
    pub invalid_message: String,
}

impl Question {
    /// Free-text question accepting `min..=max` characters after trimming.
    pub fn text(id: QuestionId, prompt: impl Into<String>, min: usize, max: usize) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            input_kind: InputKind::Text,
            choices: None,
            rule: Rule::TextLength { min, max },
            invalid_message: format!("Please enter between {min} and {max} characters"),
        }
    }

    /// Integer question accepting `min..=max`.
    pub fn number(id: QuestionId, prompt: impl Into<String>, min: i64, max: i64) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            input_kind: InputKind::Number,
            choices: None,
            rule: Rule::IntegerRange { min, max },
            invalid_message: format!("Please enter a whole number between {min} and {max}"),
        }
    }

    /// Question whose answer must be one of `choices`.
    pub fn choice<I, S>(id: QuestionId, prompt: impl Into<String>, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id,
            prompt: prompt.into(),
            input_kind: InputKind::Choice,
            choices: Some(choices.into_iter().map(Into::into).collect()),
            rule: Rule::OneOf,
            invalid_message: "Please pick one of the listed options".to_string(),
        }
    }

    pub fn with_invalid_message(mut self, message: impl Into<String>) -> Self {
        self.invalid_message = message.into();
        self
    }

    /// Convert a raw string into the primitive this question expects.
    ///
    /// Returns `None` when the raw value cannot be coerced, which callers
    /// treat exactly like a failed `is_valid`.
    pub fn coerce(&self, raw: &str) -> Option<AnswerValue> {
        match self.input_kind {
            InputKind::Number => raw.trim().parse::<i64>().ok().map(AnswerValue::Integer),
            InputKind::Text | InputKind::Choice => Some(AnswerValue::Text(raw.to_string())),
        }
    }

    /// Pure acceptance predicate over an already-coerced value.
    pub fn is_valid(&self, value: &AnswerValue) -> bool {
        match (&self.rule, value) {
            (Rule::TextLength { min, max }, AnswerValue::Text(s)) => {
                let len = s.trim().chars().count();
                len >= *min && len <= *max
            }
            (Rule::IntegerRange { min, max }, AnswerValue::Integer(n)) => n >= min && n <= max,
            (Rule::OneOf, AnswerValue::Text(s)) => self
                .choices
                .as_ref()
                .is_some_and(|choices| choices.iter().any(|c| c == s)),
            _ => false,
        }
    }

    /// Coerce then validate. `None` means the input is rejected.
    pub fn accept(&self, raw: &str) -> Option<AnswerValue> {
        self.coerce(raw).filter(|value| self.is_valid(value))
    }
}

/// Fixed, ordered, non-empty list of questions with unique ids.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct QuestionSet {
    questions: Vec<Question>,
}

impl QuestionSet {
    /// Build a question set, rejecting empty sets, duplicate ids,
    /// choice questions without choices and empty numeric ranges.
    pub fn new(questions: Vec<Question>) -> Result<Self, QuestionnaireError> {
        if questions.is_empty() {
            return Err(QuestionnaireError::EmptyQuestionSet);
        }

        let mut seen = HashSet::new();
        for q in &questions {
            if !seen.insert(q.id) {
                return Err(QuestionnaireError::DuplicateQuestion(q.id));
            }
            if q.input_kind == InputKind::Choice
                && q.choices.as_ref().is_none_or(|c| c.is_empty())
            {
                return Err(QuestionnaireError::MissingChoices(q.id));
            }
            if let Rule::IntegerRange { min, max } = q.rule {
                if min > max {
                    return Err(QuestionnaireError::EmptyRange { id: q.id, min, max });
                }
            }
        }

        Ok(Self { questions })
    }

    /// The five-question set the crystal ball asks.
    pub fn destiny() -> Arc<Self> {
        let questions = vec![
            Question::text(QuestionId::Name, "What name shall the Oracle call you?", 2, 50)
                .with_invalid_message("Your name must be between 2 and 50 characters"),
            Question::number(QuestionId::Age, "How many years have you walked this earth?", 16, 80)
                .with_invalid_message("The Oracle reads destinies between the ages of 16 and 80"),
            Question::choice(
                QuestionId::Country,
                "In which land do you dwell?",
                DESTINY_COUNTRIES.iter().copied(),
            )
                .with_invalid_message("Choose your country from the list"),
            Question::text(QuestionId::College, "Which college or university shaped you?", 2, 100)
                .with_invalid_message("Your college name must be between 2 and 100 characters"),
            Question::text(QuestionId::Aspiration, "What career do you aspire to?", 2, 100)
                .with_invalid_message("Your aspiration must be between 2 and 100 characters"),
        ];
        // The built-in set is statically well formed.
        Arc::new(Self { questions })
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = QuestionId> + '_ {
        self.questions.iter().map(|q| q.id)
    }
}

/// Countries offered by the built-in country question.
pub const DESTINY_COUNTRIES: &[&str] = &[
    "USA",
    "India",
    "United Kingdom",
    "Canada",
    "Australia",
    "Germany",
    "France",
    "Japan",
    "Singapore",
    "China",
    "Brazil",
    "Mexico",
    "Nigeria",
    "Bangladesh",
    "Pakistan",
    "Other",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_rule_measures_trimmed_chars() {
        let q = Question::text(QuestionId::Name, "Name?", 2, 5);
        assert!(q.accept("Al").is_some());
        assert!(q.accept("  Al  ").is_some());
        assert!(q.accept("A").is_none());
        assert!(q.accept("   A ").is_none());
        assert!(q.accept("Alexandra").is_none());
        // multi-byte characters count once
        assert!(q.accept("Zoë").is_some());
    }

    #[test]
    fn text_coercion_is_identity() {
        let q = Question::text(QuestionId::College, "College?", 2, 100);
        assert_eq!(q.coerce(" MIT "), Some(AnswerValue::Text(" MIT ".to_string())));
    }

    #[test]
    fn number_coercion_failure_rejects() {
        let q = Question::number(QuestionId::Age, "Age?", 16, 80);
        assert_eq!(q.coerce("twenty"), None);
        assert_eq!(q.coerce("20.5"), None);
        assert_eq!(q.coerce(""), None);
        assert!(q.accept("abc").is_none());
    }

    #[test]
    fn number_range_is_inclusive() {
        let q = Question::number(QuestionId::Age, "Age?", 16, 80);
        assert_eq!(q.accept("16"), Some(AnswerValue::Integer(16)));
        assert_eq!(q.accept(" 80 "), Some(AnswerValue::Integer(80)));
        assert!(q.accept("15").is_none());
        assert!(q.accept("81").is_none());
        assert!(q.accept("-20").is_none());
    }

    #[test]
    fn choice_requires_exact_match() {
        let q = Question::choice(QuestionId::Country, "Country?", ["USA", "India"]);
        assert!(q.accept("India").is_some());
        assert!(q.accept("india").is_none());
        assert!(q.accept("Mars").is_none());
    }

    #[test]
    fn mismatched_value_type_is_invalid() {
        let q = Question::number(QuestionId::Age, "Age?", 16, 80);
        assert!(!q.is_valid(&AnswerValue::Text("20".into())));
        let t = Question::text(QuestionId::Name, "Name?", 1, 10);
        assert!(!t.is_valid(&AnswerValue::Integer(5)));
    }

    #[test]
    fn question_set_rejects_empty() {
        assert_eq!(
            QuestionSet::new(vec![]).unwrap_err(),
            QuestionnaireError::EmptyQuestionSet
        );
    }

    #[test]
    fn question_set_rejects_duplicate_ids() {
        let err = QuestionSet::new(vec![
            Question::text(QuestionId::Name, "Name?", 1, 10),
            Question::text(QuestionId::Name, "Name again?", 1, 10),
        ])
        .unwrap_err();
        assert_eq!(err, QuestionnaireError::DuplicateQuestion(QuestionId::Name));
    }

    #[test]
    fn question_set_rejects_choice_without_options() {
        let empty: [&str; 0] = [];
        let err = QuestionSet::new(vec![Question::choice(QuestionId::Country, "Where?", empty)])
            .unwrap_err();
        assert_eq!(err, QuestionnaireError::MissingChoices(QuestionId::Country));
    }

    #[test]
    fn question_set_rejects_inverted_range() {
        let err = QuestionSet::new(vec![Question::number(QuestionId::Age, "Age?", 80, 16)])
            .unwrap_err();
        assert!(matches!(err, QuestionnaireError::EmptyRange { .. }));
    }

    #[test]
    fn destiny_set_covers_every_field_once() {
        let set = QuestionSet::destiny();
        let ids: Vec<_> = set.ids().collect();
        assert_eq!(
            ids,
            vec![
                QuestionId::Name,
                QuestionId::Age,
                QuestionId::Country,
                QuestionId::College,
                QuestionId::Aspiration,
            ]
        );
        // Rebuilding through the checked constructor must succeed too.
        assert!(QuestionSet::new(set.iter().cloned().collect()).is_ok());
    }

    #[test]
    fn question_serializes_for_presentation() {
        let q = Question::choice(QuestionId::Country, "Where?", ["USA"]);
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["id"], "country");
        assert_eq!(json["input_kind"], "choice");
        assert_eq!(json["choices"][0], "USA");
        assert_eq!(json["rule"]["rule"], "one_of");

        let t = Question::text(QuestionId::Name, "Name?", 1, 10);
        let json = serde_json::to_value(&t).unwrap();
        assert!(json.get("choices").is_none());
    }

    #[test]
    fn destiny_country_question_offers_the_country_list() {
        let set = QuestionSet::destiny();
        let country = set.iter().find(|q| q.id == QuestionId::Country).unwrap();
        let choices = country.choices.as_ref().unwrap();
        assert_eq!(choices.len(), DESTINY_COUNTRIES.len());
        assert_eq!(choices[0], DESTINY_COUNTRIES[0]);
        assert!(country.accept("USA").is_some());
        assert!(country.accept("Atlantis").is_none());
    }
}
