use serde::{Deserialize, Serialize};

fn default_language() -> String {
    "javascript".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub input: String,
    pub expected_output: String,
    #[serde(default)]
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodingProblem {
    pub title: String,
    pub description: String,
    pub difficulty: String,
    #[serde(default = "default_language")]
    pub language: String,
    pub starter_code: String,
    pub test_cases: Vec<TestCase>,
}

impl CodingProblem {
    /// Copy of the problem with hidden test cases removed, for the candidate.
    pub fn visible(&self) -> Self {
        Self {
            test_cases: self
                .test_cases
                .iter()
                .filter(|tc| !tc.hidden)
                .cloned()
                .collect(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseResult {
    pub passed: bool,
    pub output: String,
    pub expected: String,
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub passed: u32,
    pub total: u32,
    pub results: Vec<CaseResult>,
}

impl ExecutionReport {
    pub fn from_results(results: Vec<CaseResult>) -> Self {
        let passed = results.iter().filter(|r| r.passed).count() as u32;
        Self {
            passed,
            total: results.len() as u32,
            results,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionAssessment {
    pub score: i32,
    pub feedback: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodingOutcome {
    pub solution: String,
    pub passed: u32,
    pub total: u32,
    pub score: i32,
    pub feedback: String,
    pub results: Vec<CaseResult>,
}
