use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::HashMap;

use super::domain::{Question, QuestionId, QuestionType};

/// One submitted answer. An omitted `value` deserializes as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseInput {
    pub question_id: QuestionId,
    #[serde(default)]
    pub value: Value,
}

impl ResponseInput {
    pub fn new(question_id: QuestionId, value: impl Into<Value>) -> Self {
        Self {
            question_id,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    UnknownQuestion,
    MissingRequiredValue,
    InvalidNumeric,
    InvalidMultiSelect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct ValidationError {
    pub question_id: QuestionId,
    pub kind: ValidationErrorKind,
    pub message: String,
}

/// Questions a response batch may reference, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct QuestionIndex {
    questions: HashMap<QuestionId, Question>,
}

impl QuestionIndex {
    pub fn new(questions: impl IntoIterator<Item = Question>) -> Self {
        Self {
            questions: questions
                .into_iter()
                .map(|question| (question.id, question))
                .collect(),
        }
    }

    pub fn get(&self, id: QuestionId) -> Option<&Question> {
        self.questions.get(&id)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Check a response batch against question types and required flags.
///
/// Every response is checked and every error is returned; an unknown id does not stop
/// the rest of the batch. Numeric answers that coerce are rewritten in place to a JSON
/// number, so callers persist the normalized value.
pub fn validate_responses(
    index: &QuestionIndex,
    responses: &mut [ResponseInput],
    require_all: bool,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for response in responses.iter_mut() {
        let Some(question) = index.get(response.question_id) else {
            errors.push(ValidationError {
                question_id: response.question_id,
                kind: ValidationErrorKind::UnknownQuestion,
                message: format!("Invalid question ID: {}", response.question_id),
            });
            continue;
        };

        if is_empty_value(&response.value) {
            if require_all && question.required {
                errors.push(ValidationError {
                    question_id: question.id,
                    kind: ValidationErrorKind::MissingRequiredValue,
                    message: format!("Missing value for required question: {}", question.text),
                });
            }
            continue;
        }

        if question.question_type == QuestionType::Numeric {
            match coerce_numeric(&response.value) {
                Some(number) => response.value = number,
                None => errors.push(ValidationError {
                    question_id: question.id,
                    kind: ValidationErrorKind::InvalidNumeric,
                    message: format!(
                        "Invalid numeric response for question: {}: {}",
                        question.text, response.value
                    ),
                }),
            }
        }

        if question.question_type.expects_list() && !response.value.is_array() {
            errors.push(ValidationError {
                question_id: question.id,
                kind: ValidationErrorKind::InvalidMultiSelect,
                message: format!(
                    "MultiSelect responses must be a list for question: {}",
                    question.text
                ),
            });
        }
    }

    errors
}

/// `null`, blank strings and empty lists count as unanswered. Numbers and booleans never do.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Bool(_) | Value::Number(_) | Value::Object(_) => false,
    }
}

fn coerce_numeric(value: &Value) -> Option<Value> {
    match value {
        Value::Number(_) => Some(value.clone()),
        Value::String(raw) => {
            let raw = raw.trim();
            if let Ok(integer) = raw.parse::<i64>() {
                return Some(Value::from(integer));
            }
            let float = raw.parse::<f64>().ok().filter(|float| float.is_finite())?;
            if float.fract() == 0.0 && float.abs() < i64::MAX as f64 {
                Some(Value::from(float as i64))
            } else {
                Number::from_f64(float).map(Value::Number)
            }
        }
        _ => None,
    }
}
