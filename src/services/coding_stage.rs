use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::attempt::StageKind;
use crate::models::candidate::Candidate;
use crate::models::coding::{CodingOutcome, CodingProblem};
use crate::services::ai_service::{Assessor, QuestionGenerator};
use crate::services::code_runner::CodeExecutor;
use crate::services::stage::{Graded, Stage};

#[derive(Debug, Clone, Serialize)]
pub struct CodingView {
    pub problem: CodingProblem,
}

impl Graded for CodingOutcome {
    fn recorded_score(&self) -> i32 {
        self.score
    }

    fn recorded_feedback(&self) -> Option<String> {
        Some(self.feedback.clone())
    }
}

pub struct CodingStage {
    generator: Arc<dyn QuestionGenerator>,
    executor: Arc<dyn CodeExecutor>,
    assessor: Arc<dyn Assessor>,
}

impl CodingStage {
    pub fn new(
        generator: Arc<dyn QuestionGenerator>,
        executor: Arc<dyn CodeExecutor>,
        assessor: Arc<dyn Assessor>,
    ) -> Self {
        Self {
            generator,
            executor,
            assessor,
        }
    }
}

#[async_trait]
impl Stage for CodingStage {
    const KIND: StageKind = StageKind::Coding;

    type Payload = CodingProblem;
    type View = CodingView;
    type Submission = String;
    type Outcome = CodingOutcome;

    async fn generate(&self, candidate: &Candidate) -> Result<CodingProblem> {
        self.generator.generate_coding_problem(candidate).await
    }

    fn view(&self, problem: &CodingProblem) -> CodingView {
        CodingView {
            problem: problem.visible(),
        }
    }

    async fn score(&self, problem: &CodingProblem, solution: String) -> Result<CodingOutcome> {
        if solution.trim().is_empty() {
            return Err(Error::Validation("solution is required".to_string()));
        }

        // every case runs, hidden ones included
        let report = self.executor.run(&solution, &problem.test_cases).await?;
        let assessment = self
            .assessor
            .assess_solution(problem, &solution, &report)
            .await?;

        Ok(CodingOutcome {
            solution,
            passed: report.passed,
            total: report.total,
            score: assessment.score,
            feedback: assessment.feedback,
            results: report.results,
        })
    }
}
