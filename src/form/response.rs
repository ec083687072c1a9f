//! Answering a quiz.

use futures::future::{self, BoxFuture, FutureExt};

use crate::model::{Answer, QuizResponse, QuizResponseErrors};

use super::Form;

/// One question of a [`QuizResponseForm`], by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuizResponseField(pub usize);

#[derive(Debug, Clone, PartialEq, Eq)]
struct Slot {
    question_id: String,
    choice_count: usize,
    choice: Option<usize>,
}

/// The answers chosen so far for one quiz.
///
/// Values are choice indices written as decimal text. Any edit re-checks the
/// whole answer set, since the server reports answer errors on a single
/// `answers` field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizResponseForm {
    quiz_id: String,
    slots: Vec<Slot>,
}

impl QuizResponseForm {
    /// Creates an unanswered form from `(question_id, choice_count)` pairs.
    #[must_use]
    pub fn new(quiz_id: impl Into<String>, questions: impl IntoIterator<Item = (String, usize)>) -> Self {
        Self {
            quiz_id: quiz_id.into(),
            slots: questions
                .into_iter()
                .map(|(question_id, choice_count)| Slot {
                    question_id,
                    choice_count,
                    choice: None,
                })
                .collect(),
        }
    }

    /// Returns the choice made for question `index`.
    #[must_use]
    pub fn choice(&self, index: usize) -> Option<usize> {
        self.slots.get(index).and_then(|slot| slot.choice)
    }

    /// Builds the submission from the answered questions.
    #[must_use]
    pub fn response(&self) -> QuizResponse {
        QuizResponse {
            quiz_id: self.quiz_id.clone(),
            answers: self
                .slots
                .iter()
                .filter_map(|slot| {
                    slot.choice.map(|choice| Answer {
                        question_id: slot.question_id.clone(),
                        choice,
                    })
                })
                .collect(),
        }
    }

    fn answer_error(&self) -> Option<String> {
        let unanswered = self.slots.iter().filter(|slot| slot.choice.is_none()).count();
        if unanswered > 0 {
            return Some(format!("{unanswered} question(s) still need an answer."));
        }
        self.slots
            .iter()
            .position(|slot| slot.choice.is_some_and(|choice| choice >= slot.choice_count))
            .map(|index| format!("Question {} has no such choice.", index + 1))
    }
}

impl Form for QuizResponseForm {
    type Field = QuizResponseField;
    type Errors = QuizResponseErrors;

    fn fields(&self) -> Vec<QuizResponseField> {
        (0..self.slots.len()).map(QuizResponseField).collect()
    }

    fn set(&mut self, field: QuizResponseField, value: String) {
        if let Some(slot) = self.slots.get_mut(field.0) {
            slot.choice = value.trim().parse().ok();
        } else {
            tracing::warn!(question = field.0, "Answer for unknown question ignored");
        }
    }

    fn check(&self, _field: QuizResponseField) -> BoxFuture<'static, Option<String>> {
        future::ready(self.answer_error()).boxed()
    }

    fn error_slot(_field: QuizResponseField) -> QuizResponseField {
        QuizResponseField(0)
    }

    fn record_error(errors: &mut QuizResponseErrors, _field: QuizResponseField, message: Option<String>) {
        errors.answers = message;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn form() -> QuizResponseForm {
        QuizResponseForm::new("q1", [("a".to_owned(), 3), ("b".to_owned(), 2)])
    }

    #[rstest]
    #[tokio::test]
    async fn unanswered_questions_are_reported(mut form: QuizResponseForm) {
        form.set(QuizResponseField(0), "1".to_owned());

        assert_eq!(
            form.check(QuizResponseField(0)).await.as_deref(),
            Some("1 question(s) still need an answer.")
        );
    }

    #[rstest]
    fn every_question_reports_into_one_slot() {
        assert_eq!(
            QuizResponseForm::error_slot(QuizResponseField(3)),
            QuizResponseForm::error_slot(QuizResponseField(0))
        );
    }

    #[rstest]
    #[tokio::test]
    async fn out_of_range_choice_is_reported(mut form: QuizResponseForm) {
        form.set(QuizResponseField(0), "0".to_owned());
        form.set(QuizResponseField(1), "5".to_owned());

        assert_eq!(
            form.check(QuizResponseField(1)).await.as_deref(),
            Some("Question 2 has no such choice.")
        );
    }

    #[rstest]
    fn unparsable_value_clears_the_choice(mut form: QuizResponseForm) {
        form.set(QuizResponseField(0), "2".to_owned());
        form.set(QuizResponseField(0), "two".to_owned());

        assert_eq!(form.choice(0), None);
    }

    #[rstest]
    fn response_lists_answered_questions(mut form: QuizResponseForm) {
        form.set(QuizResponseField(1), "1".to_owned());
        form.set(QuizResponseField(7), "1".to_owned());

        assert_eq!(
            form.response(),
            QuizResponse {
                quiz_id: "q1".to_owned(),
                answers: vec![Answer {
                    question_id: "b".to_owned(),
                    choice: 1,
                }],
            }
        );
    }
}
