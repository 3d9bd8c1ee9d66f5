// src/quiz/grading.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    config::{GOOD_PERCENTAGE, GREAT_PERCENTAGE},
    models::{
        question::{OptionId, Question},
        quiz_record::{NOT_ANSWERED, QuizResult, WrongAnswer},
    },
};

/// Classification of a percentage score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Band {
    Great,
    Good,
    Practice,
}

impl Band {
    /// Thresholds are inclusive.
    pub fn for_percentage(percentage: u32) -> Self {
        if percentage >= GREAT_PERCENTAGE {
            Band::Great
        } else if percentage >= GOOD_PERCENTAGE {
            Band::Good
        } else {
            Band::Practice
        }
    }
}

/// `round(score / total * 100)` with halves rounded up. Zero when `total` is zero.
pub fn percentage(score: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let (score, total) = (u64::from(score), u64::from(total));
    ((score * 200 + total) / (total * 2)) as u32
}

/// Grades an attempt against the questions in presentation order.
///
/// Answers for questions outside `questions` are ignored. A missed question
/// records the selected text (or `NOT_ANSWERED`) and the correct text as they
/// read right now.
pub fn grade(questions: &[Question], answers: &HashMap<i64, OptionId>) -> QuizResult {
    let mut score = 0;
    let mut wrong_answers = Vec::new();

    for question in questions {
        let selected = answers.get(&question.id).copied();
        if selected == Some(question.correct_option_id) {
            score += 1;
            continue;
        }

        let selected_option = selected
            .and_then(|id| question.option_text(id))
            .unwrap_or(NOT_ANSWERED)
            .to_string();
        let correct_option = question
            .option_text(question.correct_option_id)
            .unwrap_or_default()
            .to_string();

        wrong_answers.push(WrongAnswer {
            question_id: question.id,
            question_text: question.question.clone(),
            selected_option,
            correct_option,
        });
    }

    QuizResult {
        score,
        total: questions.len() as u32,
        wrong_answers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{class_level::ClassLevel, question::QuizOption};

    fn question(id: i64, texts: [&str; 3], correct: OptionId) -> Question {
        Question {
            id,
            question: format!("Question {id}"),
            options: OptionId::ALL
                .iter()
                .zip(texts)
                .map(|(opt, text)| QuizOption { id: *opt, text: text.to_string() })
                .collect(),
            correct_option_id: correct,
            class_level: ClassLevel::new(5).unwrap(),
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_grade_one_right_one_wrong() {
        let questions = vec![
            question(1, ["red", "blue", "green"], OptionId::B),
            question(2, ["cat", "dog", "cow"], OptionId::A),
        ];
        let answers = HashMap::from([(1, OptionId::B), (2, OptionId::C)]);

        let result = grade(&questions, &answers);
        assert_eq!(result.score, 1);
        assert_eq!(result.total, 2);
        assert_eq!(
            result.wrong_answers,
            vec![WrongAnswer {
                question_id: 2,
                question_text: "Question 2".to_string(),
                selected_option: "cow".to_string(),
                correct_option: "cat".to_string(),
            }]
        );
    }

    #[test]
    fn test_grade_unanswered_uses_sentinel() {
        let questions = vec![question(7, ["x", "y", "z"], OptionId::C)];
        let result = grade(&questions, &HashMap::new());
        assert_eq!(result.score, 0);
        assert_eq!(result.wrong_answers[0].selected_option, NOT_ANSWERED);
        assert_eq!(result.wrong_answers[0].correct_option, "z");
    }

    #[test]
    fn test_grade_ignores_foreign_answers() {
        let questions = vec![question(1, ["x", "y", "z"], OptionId::A)];
        let answers = HashMap::from([(1, OptionId::A), (99, OptionId::B)]);
        let result = grade(&questions, &answers);
        assert_eq!(result.score, 1);
        assert!(result.wrong_answers.is_empty());
    }

    #[test]
    fn test_score_plus_wrong_equals_total() {
        let questions: Vec<Question> = (1..=9)
            .map(|id| question(id, ["x", "y", "z"], OptionId::ALL[(id % 3) as usize]))
            .collect();
        let answers: HashMap<i64, OptionId> =
            (1..=9).filter(|id| id % 2 == 0).map(|id| (id, OptionId::A)).collect();
        let result = grade(&questions, &answers);
        assert!(result.score <= result.total);
        assert_eq!(result.wrong_answers.len() as u32, result.total - result.score);
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        assert_eq!(percentage(1, 2), 50);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 8), 13); // 12.5
        assert_eq!(percentage(3, 3), 100);
        assert_eq!(percentage(0, 0), 0);
    }

    #[test]
    fn test_band_thresholds_inclusive() {
        assert_eq!(Band::for_percentage(100), Band::Great);
        assert_eq!(Band::for_percentage(70), Band::Great);
        assert_eq!(Band::for_percentage(69), Band::Good);
        assert_eq!(Band::for_percentage(50), Band::Good);
        assert_eq!(Band::for_percentage(49), Band::Practice);
        assert_eq!(Band::for_percentage(0), Band::Practice);
    }
}
