use crate::error::{Error, Result};
use crate::models::mcq::{McqQuestion, McqOutcome, OPTIONS_PER_QUESTION};

/// Whole-number percentage, rounding halves up.
pub fn percentage(score: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (score * 200 + total) / (2 * total)
}

/// Scores one answer index per question against the stored key.
pub fn grade_mcq(questions: &[McqQuestion], answers: &[u8]) -> Result<McqOutcome> {
    if answers.len() != questions.len() {
        return Err(Error::Validation(format!(
            "Expected {} answers, got {}",
            questions.len(),
            answers.len()
        )));
    }
    if let Some((i, bad)) = answers
        .iter()
        .enumerate()
        .find(|(_, a)| usize::from(**a) >= OPTIONS_PER_QUESTION)
    {
        return Err(Error::Validation(format!(
            "Answer {} has option index {}, expected 0-{}",
            i + 1,
            bad,
            OPTIONS_PER_QUESTION - 1
        )));
    }

    let score = questions
        .iter()
        .zip(answers)
        .filter(|(q, a)| q.correct == **a)
        .count() as u32;
    let total = questions.len() as u32;

    Ok(McqOutcome {
        answers: answers.to_vec(),
        score,
        total,
        percentage: percentage(score, total),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(correct: u8) -> McqQuestion {
        McqQuestion {
            question: "Q".into(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct,
        }
    }

    #[test]
    fn two_of_three_rounds_to_67() {
        let questions = vec![question(1), question(0), question(1)];
        let outcome = grade_mcq(&questions, &[1, 1, 1]).unwrap();
        assert_eq!((outcome.score, outcome.total, outcome.percentage), (2, 3, 67));
    }

    #[test]
    fn perfect_and_empty_scores() {
        let questions = vec![question(3), question(2)];
        assert_eq!(grade_mcq(&questions, &[3, 2]).unwrap().percentage, 100);
        assert_eq!(grade_mcq(&questions, &[0, 0]).unwrap().percentage, 0);
    }

    #[test]
    fn mismatched_answer_count_is_a_validation_error() {
        let questions = vec![question(1), question(0)];
        assert!(matches!(grade_mcq(&questions, &[1]), Err(Error::Validation(_))));
        assert!(matches!(grade_mcq(&questions, &[1, 0, 2]), Err(Error::Validation(_))));
    }

    #[test]
    fn out_of_range_index_is_a_validation_error() {
        let questions = vec![question(1)];
        tokio_test::assert_ok!(grade_mcq(&questions, &[3]));
        let err = tokio_test::assert_err!(grade_mcq(&questions, &[4]));
        assert_eq!(err.kind(), "validation_failed");
    }

    #[test]
    fn halves_round_up() {
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(0, 0), 0);
    }
}
